//! HOGP archive writer
//!
//! Data is written in a single forward pass; the info offset in the header is
//! patched once the tables are in place.

use std::io::{Seek, SeekFrom, Write};

use byteorder::{LittleEndian, WriteBytesExt};
use rayon::prelude::*;

use crate::error::{Error, Result};
use super::chunk::{EncodedChunk, encode_window, reads_as_raw, stored_total};
use super::policy::CompressionPolicy;
use super::source::FileSource;
use super::types::{FileEntry, HogHeader, HogIndex, HogPhase, HogProgress, ProgressCallback};
use super::{CHUNK_SIZE, HEADER_SIZE, INFO_OFFSET_POS};

/// Totals from a finished pack
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PackSummary {
    /// Number of files written
    pub files: usize,
    /// Files stored chunk-compressed
    pub compressed_files: usize,
    /// Entries in the chunk-size table
    pub chunks: usize,
    /// Sum of uncompressed sizes
    pub total_size: u64,
    /// Bytes in the data block
    pub stored_size: u64,
    /// Final archive length
    pub archive_size: u64,
}

/// HOGP archive writer
pub struct HogWriter<W: Write + Seek> {
    writer: W,
    /// Data-block write cursor (absolute)
    position: u64,
    entries: Vec<FileEntry>,
    chunk_sizes: Vec<u16>,
    total_size: u64,
}

impl<W: Write + Seek> HogWriter<W> {
    /// Start an archive at the beginning of `writer`.
    ///
    /// # Errors
    /// Returns an error if the header placeholder cannot be written.
    pub fn new(mut writer: W) -> Result<Self> {
        writer.seek(SeekFrom::Start(0))?;
        // Info offset is patched in finish()
        HogHeader::new(0).write(&mut writer)?;

        Ok(Self {
            writer,
            position: HEADER_SIZE,
            entries: Vec::new(),
            chunk_sizes: Vec::new(),
            total_size: 0,
        })
    }

    /// Entries written so far
    pub fn entries(&self) -> &[FileEntry] {
        &self.entries
    }

    /// Chunk-size table built so far
    pub fn chunk_sizes(&self) -> &[u16] {
        &self.chunk_sizes
    }

    /// Append one file to the data block.
    ///
    /// # Errors
    /// Returns an error if the file is too large for the format or writing fails.
    pub fn add_file(&mut self, name: &str, data: &[u8], compress: bool) -> Result<&FileEntry> {
        let size = u32::try_from(data.len()).map_err(|_| Error::FileTooLarge {
            name: name.to_string(),
            size: data.len() as u64,
        })?;
        let offset = self.position as i64;

        let entry = if size == 0 {
            FileEntry::empty(name, offset)
        } else if compress {
            self.write_chunked(name, data, offset)?
        } else {
            self.write_raw(name, data, offset)?
        };

        tracing::debug!(
            "Packed {} ({} -> {} bytes, {})",
            entry.name,
            entry.size,
            entry.compressed_size,
            if entry.is_compressed() { "compressed" } else { "flat" }
        );

        self.total_size += u64::from(size);
        self.entries.push(entry);
        Ok(&self.entries[self.entries.len() - 1])
    }

    fn write_raw(&mut self, name: &str, data: &[u8], offset: i64) -> Result<FileEntry> {
        self.writer.write_all(data)?;
        self.position += data.len() as u64;
        Ok(FileEntry::raw(name, data.len() as u32, offset))
    }

    fn write_chunked(&mut self, name: &str, data: &[u8], offset: i64) -> Result<FileEntry> {
        // Windows compress in parallel; writeback below stays in window order
        let chunks = data
            .par_chunks(CHUNK_SIZE)
            .map(encode_window)
            .collect::<Result<Vec<_>>>()?;

        if reads_as_raw(&chunks, data) {
            tracing::debug!("{name}: chunked size equals raw size, storing flat");
            return self.write_raw(name, data, offset);
        }
        let stored = stored_total(&chunks, data);

        let compressed_size = u32::try_from(stored).map_err(|_| Error::FileTooLarge {
            name: name.to_string(),
            size: stored,
        })?;
        let chunk_idx = i32::try_from(self.chunk_sizes.len()).map_err(|_| Error::TooManyEntries {
            what: "chunks",
            count: self.chunk_sizes.len(),
        })?;

        for (chunk, window) in chunks.iter().zip(data.chunks(CHUNK_SIZE)) {
            match chunk {
                EncodedChunk::Raw => self.writer.write_all(window)?,
                EncodedChunk::Compressed(bytes) => self.writer.write_all(bytes)?,
            }
            self.chunk_sizes.push(chunk.table_size());
        }
        self.position += stored;

        Ok(FileEntry {
            name: name.to_string(),
            size: data.len() as u32,
            compressed_size,
            chunk_idx,
            offset,
        })
    }

    /// Write the info and chunk tables, patch the header, and return the
    /// underlying writer with the final index.
    ///
    /// # Errors
    /// Returns an error if a table does not fit its fields or writing fails.
    pub fn finish(mut self) -> Result<(W, HogIndex)> {
        let info_table_start = self.position;
        let tables = HogIndex::encode_tables(&self.entries, &self.chunk_sizes)?;
        let info_size = u32::try_from(tables.len()).map_err(|_| Error::TooManyEntries {
            what: "table bytes",
            count: tables.len(),
        })?;

        self.writer.write_u32::<LittleEndian>(info_size)?;
        self.writer.write_all(&tables)?;

        let header = HogHeader::new((info_table_start - HEADER_SIZE) as i64);
        self.writer.seek(SeekFrom::Start(INFO_OFFSET_POS))?;
        self.writer.write_i64::<LittleEndian>(header.info_offset)?;
        self.writer.seek(SeekFrom::End(0))?;
        self.writer.flush()?;

        let index = HogIndex {
            header,
            info_size,
            entries: self.entries,
            chunk_sizes: self.chunk_sizes,
        };
        Ok((self.writer, index))
    }

    fn summary(&self) -> PackSummary {
        PackSummary {
            files: self.entries.len(),
            compressed_files: self.entries.iter().filter(|e| e.is_compressed()).count(),
            chunks: self.chunk_sizes.len(),
            total_size: self.total_size,
            stored_size: self.position - HEADER_SIZE,
            archive_size: 0,
        }
    }
}

/// Pack every file from `source` into `writer`.
///
/// Files are written in the order the source enumerates them; `policy`
/// decides for each non-empty file whether it is chunk-compressed.
///
/// # Errors
/// Returns an error if reading a source file or writing the archive fails.
pub fn encode<W: Write + Seek>(
    writer: W,
    source: &dyn FileSource,
    policy: &dyn CompressionPolicy,
    progress: ProgressCallback,
) -> Result<(W, HogIndex, PackSummary)> {
    progress(&HogProgress::new(HogPhase::ScanningFiles, 0, 1));
    let names = source.enumerate()?;
    encode_files(writer, source, &names, policy, progress)
}

/// Pack the already enumerated `names` from `source` into `writer`.
///
/// # Errors
/// Returns an error if reading a source file or writing the archive fails.
pub fn encode_files<W: Write + Seek>(
    writer: W,
    source: &dyn FileSource,
    names: &[String],
    policy: &dyn CompressionPolicy,
    progress: ProgressCallback,
) -> Result<(W, HogIndex, PackSummary)> {
    let total = names.len();
    tracing::info!("Packing {total} files");

    let mut hog = HogWriter::new(writer)?;
    for (i, name) in names.iter().enumerate() {
        progress(&HogProgress::with_file(HogPhase::CompressingFiles, i + 1, total, name.as_str()));

        let data = source.read(name)?;
        let compress = !data.is_empty() && policy.should_compress(name, &data);
        hog.add_file(name, &data, compress)?;
    }

    progress(&HogProgress::new(HogPhase::WritingTable, total, total));
    let mut summary = hog.summary();
    let (writer, index) = hog.finish()?;
    summary.archive_size =
        index.info_table_offset() as u64 + 4 + u64::from(index.info_size);

    progress(&HogProgress::new(HogPhase::Complete, total, total));
    Ok((writer, index, summary))
}
