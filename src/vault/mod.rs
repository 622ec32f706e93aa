//! Password-based key encryption
//!
//! A vault file holds one private key sealed under a passphrase-derived
//! AES-256-GCM key. The passphrase goes through scrypt (memory-hard, so
//! brute-forcing the file is expensive) with a fresh random salt per seal.
//!
//! On-disk layout: `salt[16] ‖ nonce[12] ‖ ciphertext‖tag`.
//!
//! SECURITY:
//! - Derived keys and decrypted plaintext are zeroized when dropped
//! - Passphrases arrive as `SecretString` and are never logged
//! - A wrong passphrase and a corrupted file fail identically

mod cipher;

pub use cipher::{open, seal, NONCE_LEN, SALT_LEN};
