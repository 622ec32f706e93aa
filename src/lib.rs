//! etherkeep: local Ethereum wallet
//!
//! Custodies a secp256k1 signing key under password-derived encryption and
//! drives fiat-denominated transfers of ether and an ERC-20 token.
//!
//! # Security Model
//!
//! - Private keys live on disk only inside authenticated vault files
//!   (scrypt + AES-256-GCM); decrypted key material exists just long enough
//!   to sign and is zeroized afterwards
//! - Every validation (input, balance, fee confirmation) happens before
//!   the irreversible broadcast step
//! - Collaborators (node RPC, price oracle, passphrase prompt, confirmation)
//!   are injected as capabilities, so nothing in this crate requires a
//!   terminal or a live network to test

pub mod account;
pub mod asset;
pub mod config;
pub mod fee;
pub mod fiat;
pub mod node;
pub mod oracle;
pub mod transfer;
pub mod vault;
pub mod wallet;

mod error;

// Re-export commonly used types
pub use config::{Chain, NetworkProfile};
pub use error::{BroadcastFailure, Error, Result};
pub use transfer::{TransferOrchestrator, TransferOutcome, TransferRequest};
