//! # HogPak
//!
//! A pure-Rust library for HOGP game archives: a flat container that stores
//! each file either verbatim or as independently deflated 64 KiB chunks.
//!
//! ## Quick Start
//!
//! ```no_run
//! use hogpak::hog::HogOperations;
//!
//! // Pack a directory (per-file compression comes from `hogpak.json`)
//! let summary = HogOperations::pack("assets/", "assets.hogp")?;
//! println!("Packed {} files", summary.files);
//!
//! // List contents without extracting
//! for entry in HogOperations::list("assets.hogp")? {
//!     println!("{} ({} bytes)", entry.name, entry.size);
//! }
//!
//! // Unpack byte-for-byte
//! HogOperations::unpack("assets.hogp", "restored/")?;
//! # Ok::<(), hogpak::Error>(())
//! ```
//!
//! ### Working in memory
//!
//! ```
//! use std::io::Cursor;
//! use hogpak::prelude::*;
//!
//! let source = MemorySource::new().with_file("a.txt", b"hello hello hello".to_vec());
//! let (cursor, _, _) = encode(Cursor::new(Vec::new()), &source, &CompressAll, &|_| {})?;
//!
//! let mut sink = MemorySink::new();
//! HogReader::new(Cursor::new(cursor.into_inner())).extract_all(&mut sink, &|_| {})?;
//! assert_eq!(sink.get("a.txt"), Some(&b"hello hello hello"[..]));
//! # Ok::<(), hogpak::Error>(())
//! ```
//!
//! ## Feature Flags
//!
//! - `cli` - Enables the `hogpak` command-line binary

pub mod error;
pub mod hog;
pub mod utils;

// Re-exports for convenience
pub use error::{Error, ErrorKind, Result};

/// Prelude module for common imports
pub mod prelude {
    pub use crate::error::{Error, ErrorKind, Result};
    pub use crate::hog::{
        ArchiveInfo, AutoCompress, CompressAll, CompressNone, CompressionPolicy, ExtractOptions,
        ExtractReport, FileEntry, FileSink, FileSource, HogOperations, HogReader, HogWriter,
        MemorySink, MemorySource, PackOptions, PolicyKind, SidecarConfig, encode, encode_files,
    };
}

pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// CLI module (feature-gated)
#[cfg(feature = "cli")]
pub mod cli;
