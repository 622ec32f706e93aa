//! Error types for the wallet

use thiserror::Error;

/// Outcome class for a failed broadcast.
///
/// A send can fail before the transaction ever reaches the node, or after the
/// node may already have accepted it (e.g. a timeout while reading the
/// response). The two must never be conflated: resubmitting after an unknown
/// outcome risks a double spend on the same nonce.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BroadcastFailure {
    /// The transaction was definitely not submitted; retrying the whole flow
    /// is safe.
    NotSent,
    /// The node may have accepted the transaction despite the reported
    /// failure. Do not resubmit with the same nonce without checking.
    UnknownOutcome,
}

impl std::fmt::Display for BroadcastFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BroadcastFailure::NotSent => write!(f, "not sent"),
            BroadcastFailure::UnknownOutcome => write!(f, "unknown outcome"),
        }
    }
}

#[derive(Error, Debug)]
pub enum Error {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Account not found: {0}")]
    AccountNotFound(String),

    #[error("Malformed vault file")]
    MalformedVault,

    /// Covers both a wrong passphrase and a corrupted vault. The two are
    /// deliberately indistinguishable here.
    #[error("Vault authentication failed")]
    AuthenticationFailed,

    #[error("Cryptographic operation failed: {0}")]
    Crypto(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Gas estimation failed: {0}")]
    GasEstimation(String),

    #[error("Insufficient balance: required {required} wei, available {available} wei")]
    InsufficientBalance { required: String, available: String },

    #[error("Signing failed: {0}")]
    Signing(String),

    #[error("Broadcast failed ({outcome}): {reason}")]
    Broadcast {
        outcome: BroadcastFailure,
        reason: String,
    },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;

impl From<reqwest::Error> for Error {
    fn from(err: reqwest::Error) -> Self {
        Error::Network(err.to_string())
    }
}
