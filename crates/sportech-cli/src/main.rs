//! Sportech CLI - site data cache and admin tools for the Sportech API.
//!
//! Loads the public site collections through a 12 hour cache and exposes the
//! admin panel's operations (login, password reset, resource CRUD, policies)
//! as subcommands.

mod app;
mod cli;
mod render;

use std::io;
use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use tracing::info;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use app::App;
use cli::Cli;
use sportech_core::config::Config;

/// Log file name prefix inside the cache directory
const LOG_FILE_PREFIX: &str = "sportech.log";

/// Initialize the tracing subscriber for logging.
///
/// Logs go to stderr; with a log directory they are also written to a daily
/// rolling file. The returned guard must live until exit to flush that file.
fn init_tracing(log_dir: Option<PathBuf>) -> Option<WorkerGuard> {
    // Use RUST_LOG env var to control log level (e.g., RUST_LOG=debug)
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    let (file_layer, guard) = match log_dir {
        Some(dir) => {
            let appender = tracing_appender::rolling::daily(dir, LOG_FILE_PREFIX);
            let (writer, guard) = tracing_appender::non_blocking(appender);
            (
                Some(fmt::layer().with_ansi(false).with_writer(writer)),
                Some(guard),
            )
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(io::stderr))
        .with(file_layer)
        .with(filter)
        .init();

    guard
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env before parsing so SPORTECH_API_URL can come from it
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();

    let log_dir = if cli.log_file {
        Config::load().ok().and_then(|c| c.cache_dir().ok())
    } else {
        None
    };
    let _guard = init_tracing(log_dir);
    info!("Sportech CLI starting");

    let mut app = App::new(&cli)?;
    app.run(cli.command).await
}
