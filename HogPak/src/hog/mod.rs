//! HOGP archive format reader/writer
//!
//! Layout (all integers little-endian):
//!
//! ```text
//! Header:     magic[4]="HOGP", version:i32, info_offset:i64 (relative to byte 16)
//! DataBlock:  raw file bytes or deflate chunks, in file order
//! InfoTable:  info_size:u32, file_count:i32,
//!             file_count x { name_len:i16, name:utf8, size:u32,
//!                            compressed_size:u32, chunk_idx:i32, offset:i64 }
//! ChunkTable: chunk_count:i32, chunk_count x chunk_size:u16
//! ```

mod chunk;
mod operations;
mod options;
mod policy;
mod reader;
mod sidecar;
mod source;
mod types;
mod writer;

pub use chunk::{
    EncodedChunk, chunk_count, encode_window, inflate_chunk, reads_as_raw, stored_total, window_len,
};
pub use operations::{ArchiveInfo, HogOperations};
pub use options::{ExtractOptions, PackOptions, PolicyKind};
pub use policy::{AutoCompress, CompressAll, CompressNone, CompressionPolicy, SidecarPolicy};
pub use reader::{ExtractReport, HogReader};
pub use sidecar::{DEFAULT_SIDECAR_NAME, SidecarConfig, SidecarFile};
pub use source::{DirSink, DirSource, FileSink, FileSource, MemorySink, MemorySource};
pub use types::{FileEntry, HogHeader, HogIndex, HogPhase, HogProgress, ProgressCallback};
pub use writer::{HogWriter, PackSummary, encode, encode_files};

/// HOGP magic bytes
pub const MAGIC: [u8; 4] = *b"HOGP";

/// The only archive version this schema describes
pub const VERSION: i32 = 3;

/// Size of the fixed header; the info offset is relative to this position
pub const HEADER_SIZE: u64 = 16;

/// Byte position of the info offset field within the header
pub(crate) const INFO_OFFSET_POS: u64 = 8;

/// Uncompressed window size for chunked compression (64 KiB)
pub const CHUNK_SIZE: usize = 0x10000;

/// Chunk-size table value marking a chunk stored raw
pub const RAW_CHUNK: u16 = 0;

/// `chunk_idx` sentinel for zero-length files
pub const EMPTY_CHUNK_IDX: i32 = -1;

/// Longest name the signed 16-bit length prefix can describe
pub const MAX_NAME_LEN: usize = i16::MAX as usize;
