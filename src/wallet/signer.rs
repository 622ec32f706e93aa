//! In-memory keypair built around alloy's local signer
//!
//! SECURITY: This is the ONLY place where private keys exist in usable form.
//! - Keys live inside alloy's `PrivateKeySigner`, which handles the curve math
//! - Keys are never serialized and never logged
//! - The address is always recomputed from the key, never stored elsewhere

use crate::{Error, Result};
use alloy::consensus::TxLegacy;
use alloy::network::TxSignerSync;
use alloy::primitives::Address;
use alloy::signers::local::PrivateKeySigner;
use alloy::signers::Signature;
use zeroize::Zeroizing;

/// A secp256k1 keypair ready to sign transactions.
pub struct Keypair {
    signer: PrivateKeySigner,
    /// Public address (safe to expose)
    address: Address,
}

impl Keypair {
    /// Generate a fresh random keypair.
    pub fn random() -> Self {
        let signer = PrivateKeySigner::random();
        let address = signer.address();
        Self { signer, address }
    }

    /// Reconstruct a keypair from raw private-key bytes, e.g. straight out of
    /// a decrypted vault file.
    pub fn from_raw_bytes(bytes: &[u8]) -> Result<Self> {
        let signer = PrivateKeySigner::from_slice(bytes)
            .map_err(|e| Error::InvalidInput(format!("invalid private key: {e}")))?;
        let address = signer.address();
        Ok(Self { signer, address })
    }

    /// Parse a hex-encoded private key (with or without `0x` prefix), used by
    /// the import flow.
    pub fn from_hex(key_hex: &str) -> Result<Self> {
        let key_hex = key_hex.trim().strip_prefix("0x").unwrap_or(key_hex.trim());
        let bytes = alloy::hex::decode(key_hex)
            .map_err(|e| Error::InvalidInput(format!("invalid private key hex: {e}")))?;
        Self::from_raw_bytes(&bytes)
    }

    /// Get the public address (safe to share).
    pub fn address(&self) -> Address {
        self.address
    }

    /// Raw private-key bytes, zeroized on drop. Used to seal the key into a
    /// vault file and to export it on explicit request.
    pub fn to_raw_bytes(&self) -> Zeroizing<Vec<u8>> {
        Zeroizing::new(self.signer.to_bytes().to_vec())
    }

    /// Hex encoding of the private key for the export-key flow.
    pub fn to_hex(&self) -> Zeroizing<String> {
        Zeroizing::new(alloy::hex::encode(self.signer.to_bytes()))
    }

    /// Sign a legacy transaction in place, returning the signature.
    pub fn sign_transaction(&self, tx: &mut TxLegacy) -> Result<Signature> {
        self.signer
            .sign_transaction_sync(tx)
            .map_err(|e| Error::Signing(e.to_string()))
    }
}

// Implement Debug manually to avoid exposing the signer
impl std::fmt::Debug for Keypair {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Keypair")
            .field("address", &self.address)
            .field("signer", &"[REDACTED]")
            .finish()
    }
}
