use realtime_cli::error::CliError;
use realtime_cli::logger::initialize as LoggerInitialize;
use realtime_cli::session;
use realtime_cli::settings::{self, Settings};

use std::fs::create_dir_all;
use std::process::ExitCode;

use log::{error, info};

#[tokio::main]
async fn main() -> ExitCode {
    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{e}");
            eprintln!("{e}");
            ExitCode::FAILURE
        }
    }
}

async fn run() -> Result<(), CliError> {
    // .env first so it can point at the config dir
    let env_file = settings::load_dotenv();

    let (config_dir, source) = settings::resolve_config_dir()?;
    create_dir_all(&config_dir).map_err(|e| {
        CliError::cli(format!(
            "Failed to create config directory {}: {e}",
            config_dir.display()
        ))
    })?;

    LoggerInitialize(&config_dir)?;

    info!("Realtime CLI starting");
    info!("Config directory: {} ({source})", config_dir.display());
    if let Some(path) = env_file {
        info!("Loaded .env from {}", path.display());
    }

    let settings = Settings::load(&config_dir)?;
    session::run(settings).await
}
