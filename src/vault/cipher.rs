//! Seal/open primitives for vault files

use crate::{Error, Result};
use aes_gcm::aead::{Aead, KeyInit};
use aes_gcm::{Aes256Gcm, Nonce};
use rand::rngs::OsRng;
use rand::RngCore;
use scrypt::Params;
use secrecy::{ExposeSecret, SecretString};
use zeroize::Zeroizing;

/// Salt length prepended to every vault file.
pub const SALT_LEN: usize = 16;

/// AES-GCM nonce length following the salt.
pub const NONCE_LEN: usize = 12;

// scrypt cost parameters: N=32768 (2^15), r=8, p=1, 32-byte output. Changing
// these breaks every existing vault file, so they are fixed constants rather
// than configuration.
const SCRYPT_LOG_N: u8 = 15;
const SCRYPT_R: u32 = 8;
const SCRYPT_P: u32 = 1;
const KEY_LEN: usize = 32;

fn derive_key(passphrase: &SecretString, salt: &[u8]) -> Result<Zeroizing<[u8; KEY_LEN]>> {
    let params = Params::new(SCRYPT_LOG_N, SCRYPT_R, SCRYPT_P, KEY_LEN)
        .map_err(|e| Error::Crypto(format!("invalid scrypt parameters: {e}")))?;
    let mut key = Zeroizing::new([0u8; KEY_LEN]);
    scrypt::scrypt(
        passphrase.expose_secret().as_bytes(),
        salt,
        &params,
        key.as_mut(),
    )
    .map_err(|e| Error::Crypto(format!("key derivation failed: {e}")))?;
    Ok(key)
}

/// Encrypt `raw_key` under `passphrase`, returning the full vault file bytes.
///
/// Salt and nonce are freshly random on every call, so sealing the same key
/// twice never produces the same output. A randomness failure is fatal.
pub fn seal(raw_key: &[u8], passphrase: &SecretString) -> Result<Vec<u8>> {
    let mut salt = [0u8; SALT_LEN];
    OsRng
        .try_fill_bytes(&mut salt)
        .map_err(|e| Error::Crypto(format!("randomness unavailable: {e}")))?;
    let mut nonce = [0u8; NONCE_LEN];
    OsRng
        .try_fill_bytes(&mut nonce)
        .map_err(|e| Error::Crypto(format!("randomness unavailable: {e}")))?;

    let key = derive_key(passphrase, &salt)?;
    let aead = Aes256Gcm::new_from_slice(key.as_ref())
        .map_err(|e| Error::Crypto(format!("cipher init failed: {e}")))?;
    let ciphertext = aead
        .encrypt(Nonce::from_slice(&nonce), raw_key)
        .map_err(|e| Error::Crypto(format!("encryption failed: {e}")))?;

    let mut out = Vec::with_capacity(SALT_LEN + NONCE_LEN + ciphertext.len());
    out.extend_from_slice(&salt);
    out.extend_from_slice(&nonce);
    out.extend_from_slice(&ciphertext);
    Ok(out)
}

/// Decrypt a vault file, returning the raw private-key bytes.
///
/// Fails with [`Error::MalformedVault`] when the file is too short to contain
/// the salt and nonce, and with [`Error::AuthenticationFailed`] when the GCM
/// tag does not verify, which covers both a wrong passphrase and any
/// tampering with the ciphertext.
pub fn open(vault: &[u8], passphrase: &SecretString) -> Result<Zeroizing<Vec<u8>>> {
    if vault.len() < SALT_LEN + NONCE_LEN {
        return Err(Error::MalformedVault);
    }
    let (salt, rest) = vault.split_at(SALT_LEN);
    let (nonce, ciphertext) = rest.split_at(NONCE_LEN);

    let key = derive_key(passphrase, salt)?;
    let aead = Aes256Gcm::new_from_slice(key.as_ref())
        .map_err(|e| Error::Crypto(format!("cipher init failed: {e}")))?;
    let plaintext = aead
        .decrypt(Nonce::from_slice(nonce), ciphertext)
        .map_err(|_| Error::AuthenticationFailed)?;
    Ok(Zeroizing::new(plaintext))
}
