//! Signing key management
//!
//! This module handles the in-memory lifetime of a decrypted private key and
//! transaction signing. The key exists only between vault decryption and the
//! signature; it is never serialized, cached, or logged.

mod signer;

pub use signer::Keypair;
