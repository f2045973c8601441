//! Error types for `HogPak`

use std::path::PathBuf;

use thiserror::Error;

/// The error type for `HogPak` operations.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum Error {
    // ==================== IO Errors ====================
    /// IO error from file operations.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // ==================== Pack Input Errors ====================
    /// The directory to pack does not exist.
    #[error("input directory not found: {path}")]
    InputNotFound {
        /// The missing input directory.
        path: PathBuf,
    },

    /// Directory traversal error.
    #[error("directory walk error: {0}")]
    WalkDirError(String),

    /// Invalid file path.
    #[error("invalid path: {0}")]
    InvalidPath(String),

    // ==================== HOG Format Errors ====================
    /// The file is not a HOG archive (missing HOGP magic).
    #[error("invalid HOG magic: expected HOGP, found {0:?}")]
    InvalidHogMagic([u8; 4]),

    /// The archive version is not supported.
    #[error("unsupported HOG version: {version} (supported: 3)")]
    UnsupportedHogVersion {
        /// The version number found in the archive.
        version: i32,
    },

    /// The info table offset points outside the archive.
    #[error("info table offset {offset} is outside the archive ({len} bytes)")]
    InfoOffsetOutOfRange {
        /// Absolute offset computed from the header.
        offset: i64,
        /// Length of the archive stream.
        len: u64,
    },

    /// The info table is shorter than its size field or counts claim.
    #[error("truncated info table: {0}")]
    TruncatedTable(String),

    /// A file name does not fit the 16-bit length prefix.
    #[error("file name too long ({len} bytes, max 32767): {name}")]
    NameTooLong {
        /// The offending name.
        name: String,
        /// Its UTF-8 length.
        len: usize,
    },

    /// A file does not fit the 32-bit size fields.
    #[error("file {name} is too large: {size} bytes")]
    FileTooLarge {
        /// The offending name.
        name: String,
        /// Its size in bytes.
        size: u64,
    },

    /// Too many files or chunks for the 32-bit count fields.
    #[error("too many {what} for a HOG archive: {count}")]
    TooManyEntries {
        /// Which table overflowed.
        what: &'static str,
        /// The count that did not fit.
        count: usize,
    },

    // ==================== Entry Payload Errors ====================
    /// An entry's data range lies outside the archive.
    #[error("data for {name} is outside the archive (offset {offset}, {len} bytes)")]
    EntryOutOfBounds {
        /// The entry name.
        name: String,
        /// The entry's data offset.
        offset: i64,
        /// Bytes the entry claims to occupy.
        len: u32,
    },

    /// An entry's chunk range runs past the chunk-size table.
    #[error("chunk index {index} out of range for {name} (table has {len} chunks)")]
    ChunkIndexOutOfRange {
        /// The entry name.
        name: String,
        /// The chunk index that was requested.
        index: i64,
        /// Length of the chunk-size table.
        len: usize,
    },

    /// Deflate decompression failed.
    #[error("deflate decompression failed for {name}: {message}")]
    InflateFailed {
        /// The entry name.
        name: String,
        /// The error message.
        message: String,
    },

    /// A decompressed chunk has the wrong length.
    #[error("chunk {chunk} of {name} inflated to {actual} bytes, expected {expected}")]
    ChunkSizeMismatch {
        /// The entry name.
        name: String,
        /// Chunk number within the entry.
        chunk: usize,
        /// Expected window length.
        expected: usize,
        /// Bytes produced by the inflater.
        actual: usize,
    },

    /// An entry could not be written to its destination.
    #[error("failed to write {name}: {source}")]
    EntryWriteFailed {
        /// The entry name.
        name: String,
        /// The underlying IO error.
        #[source]
        source: std::io::Error,
    },

    /// Extraction completed but some entries failed.
    #[error("extraction failed for {failed} of {total} files: {first_error}")]
    ExtractionPartialFailure {
        /// Number of entries in the archive.
        total: usize,
        /// Number of failed entries.
        failed: usize,
        /// The first error message encountered.
        first_error: String,
    },

    // ==================== Sidecar Errors ====================
    /// The sidecar mapping document could not be parsed.
    #[error("malformed sidecar {path}: {message}")]
    MalformedSidecar {
        /// Path of the sidecar document.
        path: PathBuf,
        /// The parser error message.
        message: String,
    },

    /// JSON parsing or serialization error.
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),
}

/// Coarse classification of [`Error`] values.
///
/// Table-level structural errors abort a whole operation, per-entry errors
/// are isolated and reported as warnings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// The pack input root is missing.
    InputNotFound,
    /// The archive or its tables are structurally invalid.
    Format,
    /// A single entry could not be rebuilt or written.
    PerFileIo,
    /// The sidecar mapping was present but unparsable.
    MalformedSidecar,
}

impl Error {
    /// Classify this error.
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::InputNotFound { .. } => ErrorKind::InputNotFound,
            Self::EntryOutOfBounds { .. }
            | Self::ChunkIndexOutOfRange { .. }
            | Self::InflateFailed { .. }
            | Self::ChunkSizeMismatch { .. }
            | Self::EntryWriteFailed { .. }
            | Self::InvalidPath(_)
            | Self::ExtractionPartialFailure { .. } => ErrorKind::PerFileIo,
            Self::MalformedSidecar { .. } | Self::JsonError(_) => ErrorKind::MalformedSidecar,
            _ => ErrorKind::Format,
        }
    }

    /// Whether this error only affects a single archive entry.
    #[must_use]
    pub fn is_per_entry(&self) -> bool {
        self.kind() == ErrorKind::PerFileIo
    }
}

// Add conversion from walkdir::Error
impl From<walkdir::Error> for Error {
    fn from(err: walkdir::Error) -> Self {
        Error::WalkDirError(err.to_string())
    }
}

/// A specialized Result type for `HogPak` operations.
pub type Result<T> = std::result::Result<T, Error>;
