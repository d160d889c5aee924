//! Clinic CLI - sign in to the clinic API and call it with a managed session

mod commands;
mod config;
mod logging;

use anyhow::Result;
use clap::{Parser, ValueEnum};
use clinic_frontend_common::ClinicApp;
use clinic_frontend_common::auth::{FileStore, MemoryStore};
use commands::Commands;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::{Level, debug, error};

#[derive(Parser)]
#[command(name = "clinic")]
#[command(about = "Command-line client for the clinic site")]
#[command(version)]
struct Cli {
    /// Set logging level
    #[arg(short = 'l', long, global = true, default_value = "warn")]
    log_level: LogLevel,

    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    json_logs: bool,

    /// Configuration file (TOML or YAML); defaults plus CLINIC_* variables otherwise
    #[arg(short = 'c', long, global = true)]
    config: Option<PathBuf>,

    /// Directory holding the persisted session
    #[arg(short = 'd', long, global = true)]
    data_dir: Option<PathBuf>,

    /// API base URL, overriding the configuration
    #[arg(long, global = true, env = "CLINIC_BASE_URL")]
    base_url: Option<String>,

    /// Timeout for the whole command in seconds (0 = no timeout)
    #[arg(short = 't', long, global = true, default_value = "30")]
    timeout: u64,

    #[command(subcommand)]
    command: Commands,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    logging::init_logging(cli.log_level.into(), cli.json_logs)?;

    let config = config::load(cli.config.as_deref(), cli.data_dir, cli.base_url)?;
    debug!(base_url = %config.api.base_url, data_dir = %config.data_dir.display(), "Loaded configuration");

    // A process is one browsing session: remembered logins survive in the
    // file, the rest live only as long as the command.
    let app = ClinicApp::new(
        &config,
        Arc::new(FileStore::open(config.local_store_path())),
        Arc::new(MemoryStore::new()),
    )?;

    let run = cli.command.execute(&app);
    let outcome = if cli.timeout == 0 {
        run.await
    } else {
        match tokio::time::timeout(Duration::from_secs(cli.timeout), run).await {
            Ok(result) => result,
            Err(_) => {
                app.shutdown();
                error!("Command timed out after {} seconds", cli.timeout);
                std::process::exit(1);
            }
        }
    };

    if let Err(e) = outcome {
        error!("Command failed: {e:#}");
        eprintln!("error: {e}");
        std::process::exit(1);
    }

    Ok(())
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl From<LogLevel> for Level {
    fn from(log_level: LogLevel) -> Self {
        match log_level {
            LogLevel::Error => Self::ERROR,
            LogLevel::Warn => Self::WARN,
            LogLevel::Info => Self::INFO,
            LogLevel::Debug => Self::DEBUG,
            LogLevel::Trace => Self::TRACE,
        }
    }
}
