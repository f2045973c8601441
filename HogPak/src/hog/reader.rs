//! HOGP archive reader with progress callbacks and per-entry error recovery

use std::io::{BufReader, Read, Seek, SeekFrom};

use byteorder::{LittleEndian, ReadBytesExt};

use crate::error::{Error, Result};
use super::chunk::{inflate_chunk, window_len};
use super::source::FileSink;
use super::types::{FileEntry, HogHeader, HogIndex, HogPhase, HogProgress, ProgressCallback};
use super::{HEADER_SIZE, RAW_CHUNK};

/// Result of extracting an archive, with support for partial success
#[derive(Debug, Default)]
pub struct ExtractReport {
    /// Names of successfully rebuilt entries
    pub extracted: Vec<String>,
    /// Entries that failed (name, error message)
    pub errors: Vec<(String, String)>,
}

impl ExtractReport {
    /// Returns true if every entry was rebuilt
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.errors.is_empty()
    }

    /// Returns the total number of entries (successful + failed)
    #[must_use]
    pub fn total_files(&self) -> usize {
        self.extracted.len() + self.errors.len()
    }
}

/// HOGP archive reader
pub struct HogReader<R: Read + Seek> {
    reader: BufReader<R>,
    header: Option<HogHeader>,
    index: Option<HogIndex>,
    len: Option<u64>,
}

impl<R: Read + Seek> HogReader<R> {
    /// Create a new reader from a Read + Seek source
    pub fn new(reader: R) -> Self {
        Self {
            reader: BufReader::new(reader),
            header: None,
            index: None,
            len: None,
        }
    }

    fn stream_len(&mut self) -> Result<u64> {
        if let Some(len) = self.len {
            return Ok(len);
        }
        let len = self.reader.seek(SeekFrom::End(0))?;
        self.len = Some(len);
        Ok(len)
    }

    /// Read and validate the archive header
    ///
    /// # Errors
    /// Returns an error if reading fails, the magic is invalid, or the version
    /// is not supported.
    pub fn read_header(&mut self) -> Result<HogHeader> {
        self.reader.seek(SeekFrom::Start(0))?;
        let header = HogHeader::read(&mut self.reader)?;
        self.header = Some(header);
        Ok(header)
    }

    /// Read the info table and the chunk-size table
    ///
    /// # Errors
    /// Returns an error if the info offset is outside the archive or the
    /// tables are truncated.
    pub fn read_index(&mut self) -> Result<&HogIndex> {
        let header = match self.header {
            Some(header) => header,
            None => self.read_header()?,
        };
        let len = self.stream_len()?;

        let info_start = header.info_table_offset();
        let size_field_end = info_start.saturating_add(4);
        if info_start < HEADER_SIZE as i64 || size_field_end as u64 > len {
            return Err(Error::InfoOffsetOutOfRange {
                offset: info_start,
                len,
            });
        }

        self.reader.seek(SeekFrom::Start(info_start as u64))?;
        let info_size = self.reader.read_u32::<LittleEndian>()?;

        let available = len - size_field_end as u64;
        if u64::from(info_size) > available {
            return Err(Error::TruncatedTable(format!(
                "info table claims {info_size} bytes but only {available} remain"
            )));
        }

        let index = HogIndex::read_tables(&mut self.reader, header, info_size)?;
        tracing::debug!(
            "Read {} entries and {} chunk sizes",
            index.entries.len(),
            index.chunk_sizes.len()
        );

        Ok(self.index.insert(index))
    }

    /// The parsed index, reading it first if needed
    ///
    /// # Errors
    /// Returns an error if the header or tables cannot be read.
    pub fn index(&mut self) -> Result<&HogIndex> {
        if self.index.is_none() {
            self.read_index()?;
        }
        self.index.as_ref().ok_or(Error::TruncatedTable("index not read".to_string()))
    }

    /// List files in the archive without extracting them
    ///
    /// # Errors
    /// Returns an error if reading the tables fails.
    pub fn list_files(&mut self) -> Result<Vec<FileEntry>> {
        Ok(self.index()?.entries.clone())
    }

    /// Rebuild the contents of a single entry.
    ///
    /// Errors that only concern this entry (bad chunk range, corrupt deflate
    /// data, out-of-bounds offset) satisfy [`Error::is_per_entry`]; anything
    /// else means the archive stream itself failed.
    ///
    /// # Errors
    /// Returns an error if the entry cannot be rebuilt.
    pub fn read_entry(&mut self, entry: &FileEntry) -> Result<Vec<u8>> {
        if entry.is_empty() {
            return Ok(Vec::new());
        }

        let len = self.stream_len()?;
        let in_bounds = u64::try_from(entry.offset)
            .ok()
            .and_then(|start| start.checked_add(u64::from(entry.compressed_size)))
            .is_some_and(|end| end <= len);
        if !in_bounds {
            return Err(Error::EntryOutOfBounds {
                name: entry.name.clone(),
                offset: entry.offset,
                len: entry.compressed_size,
            });
        }

        self.reader.seek(SeekFrom::Start(entry.offset as u64))?;

        if !entry.is_compressed() {
            let mut data = vec![0u8; entry.size as usize];
            self.read_payload(entry, &mut data)?;
            return Ok(data);
        }

        let chunk_sizes = self.entry_chunks(entry)?;
        let size = u64::from(entry.size);
        let mut data = Vec::new();

        for (i, &chunk_size) in chunk_sizes.iter().enumerate() {
            let expected = window_len(size, i);
            data.reserve(expected);

            if chunk_size == RAW_CHUNK {
                // Raw chunk: only the bytes left in this window
                let start = data.len();
                data.resize(start + expected, 0);
                self.read_payload(entry, &mut data[start..])?;
                continue;
            }

            let mut compressed = vec![0u8; usize::from(chunk_size)];
            self.read_payload(entry, &mut compressed)?;

            let window = inflate_chunk(&compressed, expected).map_err(|e| Error::InflateFailed {
                name: entry.name.clone(),
                message: e.to_string(),
            })?;
            if window.len() != expected {
                return Err(Error::ChunkSizeMismatch {
                    name: entry.name.clone(),
                    chunk: i,
                    expected,
                    actual: window.len(),
                });
            }
            data.extend_from_slice(&window);
        }

        Ok(data)
    }

    /// Chunk sizes that run past the end of the archive only break this entry
    fn read_payload(&mut self, entry: &FileEntry, buf: &mut [u8]) -> Result<()> {
        self.reader.read_exact(buf).map_err(|e| {
            if e.kind() == std::io::ErrorKind::UnexpectedEof {
                Error::EntryOutOfBounds {
                    name: entry.name.clone(),
                    offset: entry.offset,
                    len: entry.compressed_size,
                }
            } else {
                Error::Io(e)
            }
        })
    }

    fn entry_chunks(&mut self, entry: &FileEntry) -> Result<Vec<u16>> {
        let index = self.index()?;
        index
            .chunks_for(entry)
            .map(<[u16]>::to_vec)
            .ok_or_else(|| Error::ChunkIndexOutOfRange {
                name: entry.name.clone(),
                index: i64::from(entry.chunk_idx) + entry.chunk_count() as i64 - 1,
                len: index.chunk_sizes.len(),
            })
    }

    /// Rebuild every entry into `sink`, in table order.
    ///
    /// Per-entry failures are logged and collected in the report; a failure
    /// reading the archive itself aborts the whole extraction.
    ///
    /// # Errors
    /// Returns an error if the tables cannot be read or the stream fails.
    pub fn extract_all(
        &mut self,
        sink: &mut dyn FileSink,
        progress: ProgressCallback,
    ) -> Result<ExtractReport> {
        progress(&HogProgress::new(HogPhase::ReadingHeader, 0, 1));
        self.read_header()?;

        progress(&HogProgress::new(HogPhase::ReadingTable, 0, 1));
        let entries = self.read_index()?.entries.clone();
        let total = entries.len();
        tracing::info!("Files found: {total}");

        let mut report = ExtractReport::default();

        for (i, entry) in entries.iter().enumerate() {
            progress(&HogProgress::with_file(
                HogPhase::WritingFiles,
                i + 1,
                total,
                entry.name.as_str(),
            ));

            let result = self
                .read_entry(entry)
                .and_then(|data| sink.write(&entry.name, &data));

            match result {
                Ok(()) => {
                    tracing::debug!("Extracted {}", entry.name);
                    report.extracted.push(entry.name.clone());
                }
                Err(e) if e.is_per_entry() => {
                    // Record error but continue with other files
                    tracing::warn!("Failed to extract {}: {}", entry.name, e);
                    report.errors.push((entry.name.clone(), e.to_string()));
                }
                Err(e) => return Err(e),
            }
        }

        progress(&HogProgress::new(HogPhase::Complete, total, total));
        Ok(report)
    }

    /// Get the archive version
    pub fn version(&self) -> Option<i32> {
        self.header.as_ref().map(|h| h.version)
    }

    /// Get the number of files in the archive
    pub fn file_count(&self) -> Option<usize> {
        self.index.as_ref().map(|i| i.entries.len())
    }
}
