use clap::{ArgAction, Parser};
use keylog::{
    CaptureConfig, DEFAULT_CACHE_CAPACITY, DEFAULT_DEVICE_PREFIX, DEFAULT_INPUT_DIR,
    DEFAULT_LOG_PATH, DEFAULT_MAX_DEVICES,
};
use std::path::PathBuf;
use zeroize::Zeroizing;

#[derive(Parser, Debug)]
#[command(name = "keylog")]
#[command(version, long_about = None)]
#[command(about = "Log key presses from the keyboards attached to this machine")]
pub(crate) struct Cli {
    /// File the key log is written to
    #[arg(short = 'p', long = "path", value_name = "PATH", default_value = DEFAULT_LOG_PATH)]
    log_path: PathBuf,

    /// Encrypt the log with this password
    #[arg(short = 'e', long = "encrypt", value_name = "KEY")]
    password: Option<String>,

    /// Decrypt an encrypted log into OUTPUT and exit
    #[arg(
        short = 'd',
        long = "decrypt",
        num_args = 3,
        value_names = ["ENCRYPTED", "OUTPUT", "PASSWORD"],
        conflicts_with_all = ["log_path", "password", "max_devices", "cache_capacity", "input_dir"]
    )]
    decrypt: Option<Vec<String>>,

    /// Maximum number of keyboards to capture from
    #[arg(long, value_name = "N", default_value_t = DEFAULT_MAX_DEVICES)]
    max_devices: usize,

    /// Size of the in-memory log cache in bytes
    #[arg(long, value_name = "BYTES", default_value_t = DEFAULT_CACHE_CAPACITY)]
    cache_capacity: usize,

    /// Directory scanned for input devices
    #[arg(long, value_name = "DIR", default_value = DEFAULT_INPUT_DIR)]
    input_dir: PathBuf,

    /// More diagnostics on stderr (-v debug, -vv trace)
    #[arg(short, long, action = ArgAction::Count)]
    pub(crate) verbose: u8,
}

/// What a single invocation does.
pub(crate) enum Mode {
    Capture(CaptureConfig),
    Decrypt {
        input: PathBuf,
        output: PathBuf,
        password: Zeroizing<String>,
    },
}

impl Cli {
    pub(crate) fn into_mode(self) -> Mode {
        if let Some(mut args) = self.decrypt {
            // clap guarantees exactly three values
            let password = Zeroizing::new(args.pop().unwrap_or_default());
            let output = PathBuf::from(args.pop().unwrap_or_default());
            let input = PathBuf::from(args.pop().unwrap_or_default());

            return Mode::Decrypt {
                input,
                output,
                password,
            };
        }

        Mode::Capture(CaptureConfig {
            input_dir: self.input_dir,
            device_prefix: DEFAULT_DEVICE_PREFIX.into(),
            max_devices: self.max_devices,
            cache_capacity: self.cache_capacity,
            log_path: self.log_path,
            password: self.password.map(Zeroizing::new),
        })
    }
}
