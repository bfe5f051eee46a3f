use clap::Parser;
use crash_restarter::{Config, Supervisor};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Crash handler for game servers hosted on third-party panels.
#[derive(Parser, Debug)]
#[command(version, about)]
struct Args {
    /// Path to the JSON configuration file.
    #[arg(short, long)]
    config: PathBuf,
}

fn init_tracing(config: &Config) {
    // RUST_LOG wins; the config file's logLevel is only the fallback.
    let default_filter = config.log_level.clone().unwrap_or_else(|| "info".to_string());
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_filter));

    tracing_subscriber::fmt().with_env_filter(filter).init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let config = Config::from_file(&args.config)?;
    init_tracing(&config);

    let supervisor = Supervisor::new(config)?;
    supervisor.run().await?;

    Ok(())
}
