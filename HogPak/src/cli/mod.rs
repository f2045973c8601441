//! HogPak CLI - Command-line interface for HOGP archives

pub mod commands;
pub mod progress;

use clap::Parser;
use commands::Commands;

#[derive(Parser)]
#[command(name = "hogpak")]
#[command(version, about = "HogPak: pack and unpack HOGP game archives", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

/// Run the HogPak CLI
///
/// # Errors
/// Returns an error if the selected command fails.
pub fn run_cli() -> anyhow::Result<()> {
    // Setup logging; progress output goes to stdout
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::WARN)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    cli.command.execute()?;

    Ok(())
}
