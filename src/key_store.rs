//! Named storage for generated key pairs.
//!
//! Nothing else in the crate persists keys; this is the seam a front end uses
//! to keep the output of [`crate::asymmetric::generate_key_pair`] around
//! between runs. Entries are stored in their exported JSON form.

use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::asymmetric::AsymmetricKeyPair;
use crate::error::{CipherdeckError, ErrorCategory, ErrorKind, Result};
use crate::file_ops::write_atomic;

/// File extension for key-pair files written by [`FileKeyStore`].
pub const KEY_FILE_EXTENSION: &str = "json";

/// Storage for key pairs by name.
pub trait KeyStore {
    /// Stores `pair` under `name`, replacing any existing entry.
    fn save(&mut self, name: &str, pair: &AsymmetricKeyPair) -> Result<()>;

    /// Returns the pair stored under `name`, or [`ErrorKind::KeyNotFound`].
    fn load(&self, name: &str) -> Result<AsymmetricKeyPair>;

    /// Names of all stored pairs in sorted order.
    fn list(&self) -> Result<Vec<String>>;

    /// Deletes the pair stored under `name`, or fails with [`ErrorKind::KeyNotFound`].
    fn remove(&mut self, name: &str) -> Result<()>;
}

/// Key names become file names, so only a conservative character set is allowed.
pub fn validate_name(name: &str) -> Result<()> {
    let valid = !name.is_empty()
        && name.len() <= 64
        && !name.starts_with('.')
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'));
    if valid {
        Ok(())
    } else {
        Err(CipherdeckError::user(
            ErrorKind::KeyEncoding,
            format!(
                "invalid key name '{name}': use 1-64 ASCII letters, digits, '-', '_' or '.', not starting with '.'"
            ),
        ))
    }
}

fn not_found(name: &str) -> CipherdeckError {
    CipherdeckError::user(ErrorKind::KeyNotFound, format!("no key named '{name}'"))
}

/// In-process store, mostly for tests and embedding.
#[derive(Debug, Default, Clone)]
pub struct MemoryKeyStore {
    pairs: BTreeMap<String, AsymmetricKeyPair>,
}

impl MemoryKeyStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyStore for MemoryKeyStore {
    fn save(&mut self, name: &str, pair: &AsymmetricKeyPair) -> Result<()> {
        validate_name(name)?;
        self.pairs.insert(name.to_owned(), pair.clone());
        Ok(())
    }

    fn load(&self, name: &str) -> Result<AsymmetricKeyPair> {
        self.pairs.get(name).cloned().ok_or_else(|| not_found(name))
    }

    fn list(&self) -> Result<Vec<String>> {
        Ok(self.pairs.keys().cloned().collect())
    }

    fn remove(&mut self, name: &str) -> Result<()> {
        self.pairs.remove(name).map(|_| ()).ok_or_else(|| not_found(name))
    }
}

/// One `<name>.json` file per key pair inside a directory.
///
/// Files are replaced atomically and with mode 0o600 on Unix. They hold
/// private keys in the clear.
#[derive(Debug, Clone)]
pub struct FileKeyStore {
    dir: PathBuf,
}

impl FileKeyStore {
    /// Opens a store rooted at `dir`, creating the directory if needed.
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir).map_err(|e| {
            CipherdeckError::with_kind_and_source(
                ErrorCategory::User,
                ErrorKind::Io,
                format!("failed to create key directory {}", dir.display()),
                e,
            )
        })?;
        debug!(dir = %dir.display(), "opened key store");
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, name: &str) -> Result<PathBuf> {
        validate_name(name)?;
        Ok(self.dir.join(format!("{name}.{KEY_FILE_EXTENSION}")))
    }
}

impl KeyStore for FileKeyStore {
    fn save(&mut self, name: &str, pair: &AsymmetricKeyPair) -> Result<()> {
        let path = self.path_for(name)?;
        let json = pair.to_json()?;

        write_atomic(&path, json.as_bytes())?;
        info!(name, path = %path.display(), "saved key pair");
        Ok(())
    }

    fn load(&self, name: &str) -> Result<AsymmetricKeyPair> {
        let path = self.path_for(name)?;
        let json = match fs::read_to_string(&path) {
            Ok(json) => json,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Err(not_found(name)),
            Err(e) => {
                return Err(CipherdeckError::with_kind_and_source(
                    ErrorCategory::Internal,
                    ErrorKind::Io,
                    format!("failed to read from {}", path.display()),
                    e,
                ));
            }
        };
        AsymmetricKeyPair::from_json(&json)
            .map_err(|e| e.with_context(format!("corrupt key file {}", path.display())))
    }

    fn list(&self) -> Result<Vec<String>> {
        let entries = fs::read_dir(&self.dir).map_err(|e| {
            CipherdeckError::with_kind_and_source(
                ErrorCategory::Internal,
                ErrorKind::Io,
                format!("failed to list {}", self.dir.display()),
                e,
            )
        })?;

        let mut names = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| {
                CipherdeckError::with_kind_and_source(
                    ErrorCategory::Internal,
                    ErrorKind::Io,
                    format!("failed to list {}", self.dir.display()),
                    e,
                )
            })?;
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some(KEY_FILE_EXTENSION) {
                continue;
            }
            // Leftover tempfiles and foreign files are skipped.
            if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                if validate_name(stem).is_ok() {
                    names.push(stem.to_owned());
                }
            }
        }
        names.sort();
        Ok(names)
    }

    fn remove(&mut self, name: &str) -> Result<()> {
        let path = self.path_for(name)?;
        match fs::remove_file(&path) {
            Ok(()) => {
                info!(name, "removed key pair");
                Ok(())
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => Err(not_found(name)),
            Err(e) => Err(CipherdeckError::with_kind_and_source(
                ErrorCategory::Internal,
                ErrorKind::Io,
                format!("failed to remove {}", path.display()),
                e,
            )),
        }
    }
}
