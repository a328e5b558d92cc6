//! File encryption/decryption operations
//!
//! This module provides high-level file operations for encrypting, decrypting,
//! and updating files as base64 symmetric envelopes. File contents are
//! treated as opaque bytes; only the encrypted side has to be text.

use crate::armor;
use crate::error::{CipherdeckError, ErrorCategory, ErrorKind, Result};
use crate::kdf::KdfParams;
use crate::passphrase::PassphraseReader;
use crate::secretcrypt;
use std::fs;
use std::io::{self, Write};
use std::path::Path;
use tracing::debug;

/// Encrypt a file with a password
///
/// Reads plaintext from `input_path`, encrypts it using a password from
/// `passphrase_reader`, and writes the base64 envelope to `output_path`.
///
/// The output file is created with mode 0o600 (read/write for owner only) on Unix systems.
pub fn encrypt_file(
    input_path: &Path,
    output_path: &Path,
    passphrase_reader: &mut dyn PassphraseReader,
    params: &KdfParams,
) -> Result<()> {
    let plaintext = fs::read(input_path).map_err(|e| read_error(input_path, e))?;
    let passphrase = passphrase_reader.read_passphrase()?;
    debug!(path = %input_path.display(), len = plaintext.len(), "encrypting file");
    let envelope = secretcrypt::seal(passphrase.as_bytes(), &plaintext, params)
        .map_err(|e| e.with_context("encryption failed"))?;
    write_file_secure(output_path, armor::wrap(&envelope).as_bytes())
        .map_err(|e| e.with_context(format!("failed to write to {}", output_path.display())))
}

/// Decrypt a file with a password
///
/// Reads a base64 envelope from `input_path`, decrypts it using a password from
/// `passphrase_reader`, and writes the plaintext to `output_path`. Nothing is
/// written if decryption fails.
///
/// The output file is created with mode 0o600 (read/write for owner only) on Unix systems.
pub fn decrypt_file(
    input_path: &Path,
    output_path: &Path,
    passphrase_reader: &mut dyn PassphraseReader,
    params: &KdfParams,
) -> Result<()> {
    let envelope = read_envelope(input_path)?;
    let passphrase = passphrase_reader.read_passphrase()?;
    debug!(path = %input_path.display(), len = envelope.len(), "decrypting file");
    let plaintext = secretcrypt::open(passphrase.as_bytes(), &envelope, params)
        .map_err(|e| e.with_context("failed to decrypt"))?;
    write_file_secure(output_path, &plaintext)
        .map_err(|e| e.with_context(format!("failed to write to {}", output_path.display())))
}

/// Update an encrypted file with new plaintext using the same password
///
/// This function:
/// 1. Decrypts the existing file at `crypt_path` to validate the password
/// 2. Reads new plaintext from `plain_path`
/// 3. Encrypts the new plaintext with the validated password
/// 4. Atomically writes to `crypt_path` (see [`write_atomic`])
///
/// The password validation prevents accidental password changes.
pub fn update_file(
    plain_path: &Path,
    crypt_path: &Path,
    passphrase_reader: &mut dyn PassphraseReader,
    params: &KdfParams,
) -> Result<()> {
    let existing = read_envelope(crypt_path)?;
    let passphrase = passphrase_reader.read_passphrase()?;

    // Validate password by decrypting existing file (discard plaintext)
    secretcrypt::open(passphrase.as_bytes(), &existing, params)
        .map_err(|e| e.with_context("failed to decrypt"))?;
    debug!(path = %crypt_path.display(), "password verified, replacing file");

    let new_plaintext = fs::read(plain_path).map_err(|e| read_error(plain_path, e))?;
    let envelope = secretcrypt::seal(passphrase.as_bytes(), &new_plaintext, params)
        .map_err(|e| e.with_context("failed to encrypt"))?;
    write_atomic(crypt_path, armor::wrap(&envelope).as_bytes())
}

/// Replace `path` with `contents` so that readers only ever see the old file
/// or the new one, never a partial write.
///
/// Writes a tempfile next to the target, fsyncs it, restricts it to 0o600 on
/// Unix, then renames it over the target.
pub(crate) fn write_atomic(path: &Path, contents: &[u8]) -> Result<()> {
    let dir = match path.parent() {
        Some(dir) if dir.as_os_str().is_empty() => Path::new("."),
        Some(dir) => dir,
        None => {
            return Err(CipherdeckError::with_kind(
                ErrorCategory::User,
                ErrorKind::Io,
                format!("{} has no parent directory", path.display()),
            ));
        }
    };
    let mut temp_file = tempfile::NamedTempFile::new_in(dir)
        .map_err(internal_io("failed to create tempfile"))?;

    temp_file
        .write_all(contents)
        .map_err(internal_io("failed to write to tempfile"))?;
    // Flush and fsync() such that the rename later, if it succeeds, will
    // always point to a valid file.
    temp_file
        .flush()
        .map_err(internal_io("failed to flush tempfile"))?;
    temp_file
        .as_file()
        .sync_all()
        .map_err(internal_io("failed to sync file prior to rename"))?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        temp_file
            .as_file()
            .set_permissions(fs::Permissions::from_mode(0o600))
            .map_err(internal_io("failed to set tempfile permissions"))?;
    }
    temp_file.persist(path).map_err(|e| {
        CipherdeckError::with_kind_and_source(
            ErrorCategory::Internal,
            ErrorKind::Io,
            format!("failed to rename to target file {}", path.display()),
            e,
        )
    })?;
    Ok(())
}

/// Reads a file holding one base64 envelope and returns the envelope bytes.
fn read_envelope(path: &Path) -> Result<Vec<u8>> {
    let armored = fs::read_to_string(path).map_err(|e| {
        if e.kind() == io::ErrorKind::InvalidData {
            CipherdeckError::with_kind_and_source(
                ErrorCategory::User,
                ErrorKind::Format,
                format!("{} is not a text envelope", path.display()),
                e,
            )
        } else {
            read_error(path, e)
        }
    })?;
    armor::unwrap(&armored).map_err(|e| e.with_context("failed to unarmor"))
}

/// Write file with secure permissions (0o600 on Unix)
fn write_file_secure(path: &Path, contents: &[u8]) -> Result<()> {
    #[cfg(unix)]
    let file = {
        use std::fs::OpenOptions;
        use std::os::unix::fs::OpenOptionsExt;

        OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .mode(0o600)
            .open(path)
    };
    #[cfg(not(unix))]
    let file = fs::File::create(path);

    let mut file = file.map_err(|e| {
        CipherdeckError::with_kind_and_source(
            ErrorCategory::User,
            ErrorKind::Io,
            format!("failed to open {}", path.display()),
            e,
        )
    })?;
    file.write_all(contents)
        .map_err(internal_io(format!("failed to write {}", path.display())))
}

fn internal_io(msg: impl Into<String>) -> impl FnOnce(io::Error) -> CipherdeckError {
    let msg = msg.into();
    move |e| CipherdeckError::with_kind_and_source(ErrorCategory::Internal, ErrorKind::Io, msg, e)
}

fn read_error(path: &Path, err: io::Error) -> CipherdeckError {
    let category = if err.kind() == io::ErrorKind::NotFound {
        ErrorCategory::User
    } else {
        ErrorCategory::Internal
    };
    CipherdeckError::with_kind_and_source(
        category,
        ErrorKind::Io,
        format!("failed to read from {}", path.display()),
        err,
    )
}
