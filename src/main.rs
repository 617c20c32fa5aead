mod cli;

use clap::Parser;
use cli::{Cli, Mode};
use keylog::KeylogResult;
use std::process::ExitCode;
use tracing::error;
use tracing_subscriber::EnvFilter;

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match run(cli.into_mode()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) if e.is_startup_fatal() => {
            error!("cannot start capturing: {e}");
            ExitCode::FAILURE
        }
        Err(e) => {
            error!("{e}");
            ExitCode::FAILURE
        }
    }
}

fn run(mode: Mode) -> KeylogResult<()> {
    match mode {
        Mode::Decrypt {
            input,
            output,
            password,
        } => keylog::decrypt_file(&input, &output, &password),
        Mode::Capture(config) => {
            let run_state = keylog::install_shutdown_handlers()?;

            keylog::capture(&config, run_state)
        }
    }
}

fn init_tracing(verbosity: u8) {
    let level = match verbosity {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(format!("keylog={level}"))),
        )
        .with_writer(std::io::stderr)
        .init();
}
