//! Per-window deflate compression for HOG file data

use std::io::{Read, Write};

use flate2::Compression;
use flate2::read::DeflateDecoder;
use flate2::write::DeflateEncoder;

use crate::error::Result;
use super::{CHUNK_SIZE, RAW_CHUNK};

/// First byte of a zlib stream header (deflate, 32K window)
const ZLIB_HEADER_BYTE: u8 = 0x78;

/// Length of the zlib stream header
const ZLIB_HEADER_LEN: usize = 2;

/// How a single window is stored in the data block
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EncodedChunk {
    /// Window stored verbatim; recorded as `0` in the chunk-size table
    Raw,
    /// Window stored as raw deflate data
    Compressed(Vec<u8>),
}

impl EncodedChunk {
    /// Value recorded in the chunk-size table
    #[must_use]
    pub fn table_size(&self) -> u16 {
        match self {
            Self::Raw => RAW_CHUNK,
            Self::Compressed(data) => data.len() as u16,
        }
    }

    /// Bytes this chunk occupies in the data block
    #[must_use]
    pub fn stored_len(&self, window: &[u8]) -> usize {
        match self {
            Self::Raw => window.len(),
            Self::Compressed(data) => data.len(),
        }
    }
}

/// Bytes a file's encoded windows occupy in the data block
#[must_use]
pub fn stored_total(chunks: &[EncodedChunk], data: &[u8]) -> u64 {
    chunks
        .iter()
        .zip(data.chunks(CHUNK_SIZE))
        .map(|(chunk, window)| chunk.stored_len(window) as u64)
        .sum()
}

/// Whether a chunked file would be mistaken for a raw one on read.
///
/// Readers treat `compressed_size == size` as a raw copy, which is only
/// correct when no window is actually compressed.
#[must_use]
pub fn reads_as_raw(chunks: &[EncodedChunk], data: &[u8]) -> bool {
    chunks.iter().any(|c| matches!(c, EncodedChunk::Compressed(_)))
        && stored_total(chunks, data) == data.len() as u64
}

/// Number of windows needed for `size` bytes
#[must_use]
pub fn chunk_count(size: u64) -> usize {
    size.div_ceil(CHUNK_SIZE as u64) as usize
}

/// Length of window `index` for a file of `size` bytes
#[must_use]
pub fn window_len(size: u64, index: usize) -> usize {
    let start = index as u64 * CHUNK_SIZE as u64;
    size.saturating_sub(start).min(CHUNK_SIZE as u64) as usize
}

/// Deflate a buffer at maximum compression, without zlib framing.
///
/// # Errors
/// Returns an error if the encoder fails.
pub fn deflate(data: &[u8]) -> Result<Vec<u8>> {
    let mut encoder = DeflateEncoder::new(Vec::with_capacity(data.len() / 2), Compression::best());
    encoder.write_all(data)?;
    Ok(encoder.finish()?)
}

/// Compress one window and apply the storage rule.
///
/// A full window is kept compressed only when that makes it strictly smaller.
/// A short trailing window always keeps its compressed form, even if it grew,
/// unless that form cannot be described by the 16-bit chunk-size field.
///
/// # Errors
/// Returns an error if the encoder fails.
pub fn encode_window(window: &[u8]) -> Result<EncodedChunk> {
    let compressed = deflate(window)?;

    let keep = if window.len() == CHUNK_SIZE {
        compressed.len() < CHUNK_SIZE
    } else {
        compressed.len() <= usize::from(u16::MAX)
    };

    if keep {
        Ok(EncodedChunk::Compressed(compressed))
    } else {
        Ok(EncodedChunk::Raw)
    }
}

/// Inflate one stored chunk, skipping a zlib header when one is present.
///
/// At most `expected + 1` bytes are produced so an oversized stream is caught
/// without inflating all of it.
///
/// # Errors
/// Returns an error if the deflate stream is corrupt.
pub fn inflate_chunk(data: &[u8], expected: usize) -> std::io::Result<Vec<u8>> {
    let body = if data.len() > ZLIB_HEADER_LEN && data[0] == ZLIB_HEADER_BYTE {
        &data[ZLIB_HEADER_LEN..]
    } else {
        data
    };

    let mut out = Vec::with_capacity(expected);
    DeflateDecoder::new(body)
        .take(expected as u64 + 1)
        .read_to_end(&mut out)?;
    Ok(out)
}
