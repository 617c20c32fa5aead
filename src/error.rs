use std::io;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum KeylogError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
    #[error("cannot read input device directory {}: {source}", path.display())]
    InputDirUnavailable { path: PathBuf, source: io::Error },
    #[error("no keyboard devices found")]
    NoDevicesFound,
    #[error("{} ({name}) is not a keyboard", path.display())]
    NotAKeyboard { path: PathBuf, name: String },
    #[error("unsupported event type: {0}")]
    UnsupportedEventType(u16),
    #[error("invalid key event: {0}")]
    InvalidKeyEvent(String),
    #[error("log cache overflow: {needed} bytes needed, capacity is {capacity}")]
    CacheOverflow { capacity: usize, needed: usize },
    #[error("failed to flush log to {}: {source}", path.display())]
    Flush { path: PathBuf, source: io::Error },
    #[error("waiting for input devices failed: {0}")]
    Poll(io::Error),
    #[error(transparent)]
    Crypto(#[from] CryptoError),
}

impl KeylogError {
    /// Whether the error happened before capture started (nothing was logged).
    pub fn is_startup_fatal(&self) -> bool {
        matches!(
            self,
            KeylogError::InputDirUnavailable { .. } | KeylogError::NoDevicesFound
        )
    }
}

/// Failures of the encrypted log container.
///
/// A wrong password and a corrupted ciphertext both surface as
/// [`CryptoError::DecryptionFailed`].
#[derive(Error, Debug, PartialEq, Eq)]
pub enum CryptoError {
    #[error("invalid envelope: {0}")]
    InvalidFormat(String),
    #[error("decryption failed (wrong password or corrupted data)")]
    DecryptionFailed,
}
