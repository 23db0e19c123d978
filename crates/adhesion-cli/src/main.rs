use clap::Parser;
use tracing_subscriber::{fmt, EnvFilter};
mod cli;
mod commands;
mod config;
mod pipeline;

fn main() -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let cli = cli::Cli::parse();
    cli.execute()?;
    Ok(())
}
