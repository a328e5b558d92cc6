use std::error::Error as StdError;

use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum ErrorCategory {
    /// Any failure that cannot be confidently attributed to any other error
    /// category in this enum.
    ///
    /// In particular this means that use of Internal is never a guarantee
    /// the error is not, for example due to a user error - merely that it
    /// cannot be confidently determined by the code.
    Internal,

    /// The caller provided invalid input or requested an operation that is
    /// unsupported or impossible to complete. None of these are transient;
    /// retrying with the same input fails the same way.
    User,
}

/// Fine-grained condition flags for consumers that want to branch on error kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum ErrorKind {
    /// Malformed or undersized input blob (bad base64, envelope shorter
    /// than salt + nonce, plaintext not valid UTF-8).
    Format,
    /// Symmetric tag verification failed: wrong password, tampering or
    /// corruption. Deliberately not distinguished further.
    AuthenticationFailed,
    /// Public-key decryption failed. Never says which check failed.
    DecryptionFailed,
    /// Plaintext exceeds what the public-key scheme can carry for the
    /// modulus in use.
    PayloadTooLarge,
    /// Hybrid decryption was invoked without the paired encrypted session key.
    MissingSessionKey,
    /// A MAC was requested with an empty secret.
    EmptySecret,
    /// The password attached to a hidden payload did not match.
    WrongPassword,
    /// The hidden payload needs more pixel samples than the image provides.
    CapacityExceeded,
    /// Password based key derivation could not run (empty password,
    /// zero iterations).
    KeyDerivation,
    /// Generating a key pair failed.
    KeyGeneration,
    /// An exported key could not be decoded or encoded.
    KeyEncoding,
    /// An algorithm identifier is unknown or not valid for the operation.
    UnsupportedAlgorithm,
    /// A key store has no entry under the requested name.
    KeyNotFound,
    /// Passphrase could not be obtained from the configured reader.
    PassphraseUnavailable,
    /// Unexpected state reached within cipherdeck logic.
    InternalInvariant,
    /// Interaction with the filesystem, stdin/stdout, or other I/O failed.
    Io,
}

#[derive(Debug, Error)]
#[error("{msg}")]
pub struct CipherdeckError {
    /// Broad error category, always provided.
    pub category: ErrorCategory,
    /// Optional specific condition tag for consumers that need to
    /// branch their behavior. Any code consuming errors MUST handle
    /// the absence of a defined kind.
    pub kind: Option<ErrorKind>,
    #[source]
    source: Option<Box<dyn StdError + Send + Sync + 'static>>,
    msg: String,
}

impl CipherdeckError {
    /// Creates a new error with a required category and display message.
    pub fn new(category: ErrorCategory, msg: impl Into<String>) -> Self {
        Self {
            category,
            kind: None,
            source: None,
            msg: msg.into(),
        }
    }

    /// Creates a new error that also tags the failure with a kind.
    pub fn with_kind(category: ErrorCategory, kind: ErrorKind, msg: impl Into<String>) -> Self {
        Self {
            category,
            kind: Some(kind),
            source: None,
            msg: msg.into(),
        }
    }

    /// Creates a new error that retains the originating source error.
    pub fn with_source(
        category: ErrorCategory,
        msg: impl Into<String>,
        source: impl StdError + Send + Sync + 'static,
    ) -> Self {
        Self {
            category,
            kind: None,
            source: Some(Box::new(source)),
            msg: msg.into(),
        }
    }

    /// Creates a new error that carries both a kind tag and the originating source error.
    pub fn with_kind_and_source(
        category: ErrorCategory,
        kind: ErrorKind,
        msg: impl Into<String>,
        source: impl StdError + Send + Sync + 'static,
    ) -> Self {
        Self {
            category,
            kind: Some(kind),
            source: Some(Box::new(source)),
            msg: msg.into(),
        }
    }

    /// Shorthand for the common case of a caller-input failure with a kind.
    pub(crate) fn user(kind: ErrorKind, msg: impl Into<String>) -> Self {
        Self::with_kind(ErrorCategory::User, kind, msg)
    }

    /// The user-facing message carried by the error.
    pub fn message(&self) -> &str {
        &self.msg
    }

    /// Returns the preserved source error if present.
    pub fn source_error(&self) -> Option<&(dyn StdError + Send + Sync + 'static)> {
        self.source.as_deref()
    }

    /// Returns the kind of this error, or of the first error in the source
    /// chain that carries one.
    ///
    /// `with_context` keeps the kind on the wrapper, so this only differs
    /// from `self.kind` for errors wrapped with `with_source`.
    pub fn root_kind(&self) -> Option<ErrorKind> {
        if self.kind.is_some() {
            return self.kind;
        }
        self.source
            .as_deref()
            .and_then(|s| s.downcast_ref::<CipherdeckError>())
            .and_then(CipherdeckError::root_kind)
    }

    /// Wraps the current error with a higher-level message while preserving the original as source.
    pub fn with_context(self, msg: impl Into<String>) -> Self {
        let category = self.category;
        let kind = self.kind;
        Self {
            category,
            kind,
            source: Some(Box::new(self)),
            msg: msg.into(),
        }
    }
}

/// Convenience alias.
pub type Result<T> = std::result::Result<T, CipherdeckError>;
