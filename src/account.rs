//! Account vault storage
//!
//! One vault file per account under a fixed root directory, named
//! `<account>.enc`. Writes are atomic: the file lands at a temporary sibling
//! path first and is renamed into place, so a crash mid-write never leaves a
//! truncated vault behind.

use crate::{Error, Result};
use std::path::{Path, PathBuf};

const VAULT_EXTENSION: &str = "enc";
const MAX_NAME_LEN: usize = 64;

/// Filesystem store mapping account names to vault files.
#[derive(Debug, Clone)]
pub struct AccountStore {
    root: PathBuf,
}

impl AccountStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Root directory holding the vault files.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Validate an account name before it is used to build a path.
    ///
    /// Names are restricted to ASCII alphanumerics, `-` and `_`, which rules
    /// out path traversal through `..`, separators, or hidden-file prefixes.
    pub fn validate_name(name: &str) -> Result<()> {
        if name.is_empty() || name.len() > MAX_NAME_LEN {
            return Err(Error::InvalidInput(format!(
                "account name must be 1-{MAX_NAME_LEN} characters"
            )));
        }
        if !name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
        {
            return Err(Error::InvalidInput(format!(
                "account name {name:?} contains invalid characters (allowed: a-z A-Z 0-9 - _)"
            )));
        }
        Ok(())
    }

    fn vault_path(&self, name: &str) -> Result<PathBuf> {
        Self::validate_name(name)?;
        Ok(self.root.join(format!("{name}.{VAULT_EXTENSION}")))
    }

    /// Whether a vault file already exists for this account.
    pub fn exists(&self, name: &str) -> Result<bool> {
        Ok(self.vault_path(name)?.exists())
    }

    /// Write a vault file for the account, overwriting any previous one.
    pub fn save(&self, name: &str, vault: &[u8]) -> Result<()> {
        let path = self.vault_path(name)?;
        std::fs::create_dir_all(&self.root)?;

        let tmp = path.with_extension(format!("{VAULT_EXTENSION}.tmp"));
        std::fs::write(&tmp, vault)?;
        std::fs::rename(&tmp, &path)?;

        tracing::info!(account = %name, path = %path.display(), "Saved vault file");
        Ok(())
    }

    /// Read the vault file for the account.
    pub fn load(&self, name: &str) -> Result<Vec<u8>> {
        let path = self.vault_path(name)?;
        match std::fs::read(&path) {
            Ok(bytes) => Ok(bytes),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(Error::AccountNotFound(name.to_string()))
            }
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_save_and_load_round_trip() {
        let dir = tempdir().unwrap();
        let store = AccountStore::new(dir.path());

        store.save("alice", b"vault-bytes").unwrap();
        assert_eq!(store.load("alice").unwrap(), b"vault-bytes");
    }

    #[test]
    fn test_save_overwrites_existing() {
        let dir = tempdir().unwrap();
        let store = AccountStore::new(dir.path());

        store.save("alice", b"first").unwrap();
        store.save("alice", b"second").unwrap();
        assert_eq!(store.load("alice").unwrap(), b"second");
    }

    #[test]
    fn test_load_missing_account() {
        let dir = tempdir().unwrap();
        let store = AccountStore::new(dir.path());

        assert!(matches!(
            store.load("nobody"),
            Err(Error::AccountNotFound(name)) if name == "nobody"
        ));
    }

    #[test]
    fn test_creates_root_directory() {
        let dir = tempdir().unwrap();
        let store = AccountStore::new(dir.path().join("nested/accounts"));

        store.save("bob", b"data").unwrap();
        assert_eq!(store.load("bob").unwrap(), b"data");
    }

    #[test]
    fn test_rejects_traversal_names() {
        let dir = tempdir().unwrap();
        let store = AccountStore::new(dir.path());

        for bad in ["../escape", "a/b", "", ".hidden", "name with space"] {
            assert!(
                matches!(store.save(bad, b"x"), Err(Error::InvalidInput(_))),
                "expected {bad:?} to be rejected"
            );
            assert!(matches!(store.load(bad), Err(Error::InvalidInput(_))));
        }
    }

    #[test]
    fn test_exists() {
        let dir = tempdir().unwrap();
        let store = AccountStore::new(dir.path());

        assert!(!store.exists("alice").unwrap());
        store.save("alice", b"v").unwrap();
        assert!(store.exists("alice").unwrap());
    }
}
