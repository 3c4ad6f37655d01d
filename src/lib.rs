pub mod chat;
pub mod cli;
pub mod transport;

use clap::Parser;
use tracing_subscriber::EnvFilter;

#[cfg(debug_assertions)]
fn log_level() -> log::LevelFilter {
    log::LevelFilter::Info
}

#[cfg(not(debug_assertions))]
fn log_level() -> log::LevelFilter {
    log::LevelFilter::Warn
}

/// Sends log records to stderr. `RUST_LOG` overrides the build's default level.
pub fn init_logging() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(log_level().as_str().to_ascii_lowercase()));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

pub fn run() -> anyhow::Result<()> {
    let args = cli::Args::parse();
    init_logging();

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;
    let result = runtime.block_on(cli::run(args));
    // stdin reads park a blocking thread that never finishes on its own
    runtime.shutdown_background();
    result
}
