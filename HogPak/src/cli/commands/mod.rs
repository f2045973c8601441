//! CLI command definitions and dispatch

use std::path::PathBuf;

use clap::Subcommand;

use crate::hog::PolicyKind;

pub mod info;
pub mod list;
pub mod pack;
pub mod unpack;

#[derive(Subcommand)]
pub enum Commands {
    /// Pack a directory into a HOGP archive
    Pack {
        /// Directory to pack
        source: PathBuf,

        /// Output archive
        destination: PathBuf,

        /// Compression policy (sidecar, auto, always, never)
        #[arg(short, long, default_value = "sidecar")]
        policy: PolicyKind,

        /// Sidecar mapping file name at the input root (default: hogpak.json)
        #[arg(long)]
        config: Option<String>,

        /// Suppress progress output
        #[arg(short, long)]
        quiet: bool,
    },

    /// Unpack a HOGP archive into a directory
    Unpack {
        /// Archive to unpack
        source: PathBuf,

        /// Output directory
        destination: PathBuf,

        /// Write a sidecar mapping recording each file's compression
        #[arg(long)]
        emit_config: bool,

        /// Suppress progress output
        #[arg(short, long)]
        quiet: bool,
    },

    /// List archive contents
    List {
        /// Archive file
        source: PathBuf,

        /// Show detailed info (sizes, chunks, compression ratio)
        #[arg(short, long)]
        detailed: bool,

        /// Only list files matching glob pattern (e.g., "*.dds")
        #[arg(long)]
        filter: Option<String>,

        /// Only show count of matching files
        #[arg(short, long)]
        count: bool,
    },

    /// Show aggregate info about an archive
    Info {
        /// Archive file
        source: PathBuf,
    },
}

impl Commands {
    /// Execute the selected command.
    ///
    /// # Errors
    /// Returns an error if the underlying command fails.
    pub fn execute(&self) -> anyhow::Result<()> {
        match self {
            Commands::Pack {
                source,
                destination,
                policy,
                config,
                quiet,
            } => pack::execute(source, destination, *policy, config.as_deref(), *quiet),
            Commands::Unpack {
                source,
                destination,
                emit_config,
                quiet,
            } => unpack::execute(source, destination, *emit_config, *quiet),
            Commands::List {
                source,
                detailed,
                filter,
                count,
            } => list::execute(source, *detailed, filter.as_deref(), *count),
            Commands::Info { source } => info::execute(source),
        }
    }
}
