//! Types for HOGP archive handling

use std::io::{self, Read, Write};

use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};

use crate::error::{Error, Result};
use super::chunk::chunk_count;
use super::{EMPTY_CHUNK_IDX, HEADER_SIZE, MAGIC, MAX_NAME_LEN, VERSION};

/// Smallest possible encoded file entry (empty name)
const MIN_ENTRY_LEN: u64 = 2 + 4 + 4 + 4 + 8;

/// Header of a HOGP archive
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HogHeader {
    /// Version number (always 3 once validated)
    pub version: i32,
    /// Offset of the info table, relative to the end of the header
    pub info_offset: i64,
}

impl HogHeader {
    #[must_use]
    pub fn new(info_offset: i64) -> Self {
        Self {
            version: VERSION,
            info_offset,
        }
    }

    /// Read and validate the 16-byte header.
    ///
    /// # Errors
    /// Returns an error if reading fails, the magic is not `HOGP`, or the
    /// version is not 3.
    pub fn read<R: Read>(reader: &mut R) -> Result<Self> {
        let mut magic = [0u8; 4];
        reader.read_exact(&mut magic)?;
        if magic != MAGIC {
            return Err(Error::InvalidHogMagic(magic));
        }

        let version = reader.read_i32::<LittleEndian>()?;
        if version != VERSION {
            return Err(Error::UnsupportedHogVersion { version });
        }

        let info_offset = reader.read_i64::<LittleEndian>()?;
        Ok(Self {
            version,
            info_offset,
        })
    }

    pub fn write<W: Write>(&self, writer: &mut W) -> Result<()> {
        writer.write_all(&MAGIC)?;
        writer.write_i32::<LittleEndian>(self.version)?;
        writer.write_i64::<LittleEndian>(self.info_offset)?;
        Ok(())
    }

    /// Absolute position of the info table's size field
    #[must_use]
    pub fn info_table_offset(&self) -> i64 {
        (HEADER_SIZE as i64).saturating_add(self.info_offset)
    }
}

/// Entry in the info table describing one archived file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileEntry {
    /// Relative path, forward-slash separated
    pub name: String,
    /// Uncompressed size
    pub size: u32,
    /// Bytes occupied in the data block (equals `size` for raw files)
    pub compressed_size: u32,
    /// Index of the first chunk in the chunk-size table (`-1` for empty files)
    pub chunk_idx: i32,
    /// Absolute position of the file's data
    pub offset: i64,
}

impl FileEntry {
    /// Entry for a zero-length file.
    #[must_use]
    pub fn empty(name: impl Into<String>, offset: i64) -> Self {
        Self {
            name: name.into(),
            size: 0,
            compressed_size: 0,
            chunk_idx: EMPTY_CHUNK_IDX,
            offset,
        }
    }

    /// Entry for a file stored verbatim.
    #[must_use]
    pub fn raw(name: impl Into<String>, size: u32, offset: i64) -> Self {
        Self {
            name: name.into(),
            size,
            compressed_size: size,
            chunk_idx: 0,
            offset,
        }
    }

    /// Returns true if the file has no payload
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.size == 0
    }

    /// Returns true if the payload is chunk-compressed.
    ///
    /// A chunked file whose stored size happens to equal its real size is
    /// indistinguishable from a raw one and is read as raw.
    #[must_use]
    pub fn is_compressed(&self) -> bool {
        self.size != self.compressed_size
    }

    /// Number of 64 KiB windows the file spans
    #[must_use]
    pub fn chunk_count(&self) -> usize {
        chunk_count(u64::from(self.size))
    }

    /// Encoded length of this entry in the info table
    #[must_use]
    pub fn encoded_len(&self) -> usize {
        MIN_ENTRY_LEN as usize + self.name.len()
    }

    /// Compression ratio in percent (stored / uncompressed)
    #[must_use]
    pub fn ratio(&self) -> f64 {
        if self.size == 0 {
            100.0
        } else {
            f64::from(self.compressed_size) / f64::from(self.size) * 100.0
        }
    }

    fn read<R: Read>(reader: &mut R) -> Result<Self> {
        let name_len = reader.read_i16::<LittleEndian>()?;
        let name_len = usize::try_from(name_len)
            .map_err(|_| Error::TruncatedTable(format!("negative name length {name_len}")))?;

        let mut name_bytes = vec![0u8; name_len];
        reader.read_exact(&mut name_bytes)?;
        // Use lossy UTF-8 conversion so one odd name cannot sink the whole table
        let name = String::from_utf8_lossy(&name_bytes).into_owned();

        Ok(Self {
            name,
            size: reader.read_u32::<LittleEndian>()?,
            compressed_size: reader.read_u32::<LittleEndian>()?,
            chunk_idx: reader.read_i32::<LittleEndian>()?,
            offset: reader.read_i64::<LittleEndian>()?,
        })
    }

    fn write<W: Write>(&self, writer: &mut W) -> Result<()> {
        let name_bytes = self.name.as_bytes();
        if name_bytes.len() > MAX_NAME_LEN {
            return Err(Error::NameTooLong {
                name: self.name.clone(),
                len: name_bytes.len(),
            });
        }

        writer.write_i16::<LittleEndian>(name_bytes.len() as i16)?;
        writer.write_all(name_bytes)?;
        writer.write_u32::<LittleEndian>(self.size)?;
        writer.write_u32::<LittleEndian>(self.compressed_size)?;
        writer.write_i32::<LittleEndian>(self.chunk_idx)?;
        writer.write_i64::<LittleEndian>(self.offset)?;
        Ok(())
    }
}

/// Parsed info table and chunk-size table of an archive
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HogIndex {
    pub header: HogHeader,
    /// Byte length of the tables after the size field
    pub info_size: u32,
    /// File entries in archive order
    pub entries: Vec<FileEntry>,
    /// Global chunk-size table (`0` = raw chunk)
    pub chunk_sizes: Vec<u16>,
}

impl HogIndex {
    /// Absolute position of the info table
    #[must_use]
    pub fn info_table_offset(&self) -> i64 {
        self.header.info_table_offset()
    }

    /// Chunk sizes belonging to a compressed entry, or `None` if its range
    /// is not inside the table.
    #[must_use]
    pub fn chunks_for(&self, entry: &FileEntry) -> Option<&[u16]> {
        let start = usize::try_from(entry.chunk_idx).ok()?;
        let end = start.checked_add(entry.chunk_count())?;
        self.chunk_sizes.get(start..end)
    }

    /// Number of entries stored chunk-compressed
    #[must_use]
    pub fn compressed_count(&self) -> usize {
        self.entries.iter().filter(|e| e.is_compressed()).count()
    }

    /// Serialize the tables that follow the info size field.
    ///
    /// # Errors
    /// Returns an error if a name or a count does not fit its field.
    pub fn encode_tables(entries: &[FileEntry], chunk_sizes: &[u16]) -> Result<Vec<u8>> {
        let file_count = i32::try_from(entries.len()).map_err(|_| Error::TooManyEntries {
            what: "files",
            count: entries.len(),
        })?;
        let chunk_count = i32::try_from(chunk_sizes.len()).map_err(|_| Error::TooManyEntries {
            what: "chunks",
            count: chunk_sizes.len(),
        })?;

        let entries_len: usize = entries.iter().map(FileEntry::encoded_len).sum();
        let mut table = Vec::with_capacity(8 + entries_len + chunk_sizes.len() * 2);

        table.write_i32::<LittleEndian>(file_count)?;
        for entry in entries {
            entry.write(&mut table)?;
        }

        table.write_i32::<LittleEndian>(chunk_count)?;
        for &size in chunk_sizes {
            table.write_u16::<LittleEndian>(size)?;
        }

        Ok(table)
    }

    /// Parse the tables that follow the info size field.
    ///
    /// `info_size` must already be validated against the stream length; it
    /// bounds every count before anything is allocated.
    ///
    /// # Errors
    /// Returns [`Error::TruncatedTable`] if a count is negative or the tables
    /// run past `info_size`.
    pub fn read_tables<R: Read>(reader: &mut R, header: HogHeader, info_size: u32) -> Result<Self> {
        let mut limited = reader.by_ref().take(u64::from(info_size));
        let result = Self::read_tables_inner(&mut limited, header, info_size);

        match result {
            Err(Error::Io(e)) if e.kind() == io::ErrorKind::UnexpectedEof => Err(
                Error::TruncatedTable(format!("tables run past the declared {info_size} bytes")),
            ),
            other => {
                if limited.limit() > 0 {
                    tracing::debug!("{} trailing bytes after chunk table", limited.limit());
                }
                other
            }
        }
    }

    fn read_tables_inner<R: Read>(reader: &mut R, header: HogHeader, info_size: u32) -> Result<Self> {
        let file_count = reader.read_i32::<LittleEndian>()?;
        let file_count = u64::try_from(file_count)
            .map_err(|_| Error::TruncatedTable(format!("negative file count {file_count}")))?;
        if file_count * MIN_ENTRY_LEN > u64::from(info_size) {
            return Err(Error::TruncatedTable(format!(
                "{file_count} entries cannot fit in {info_size} bytes"
            )));
        }

        let mut entries = Vec::with_capacity(file_count as usize);
        for _ in 0..file_count {
            entries.push(FileEntry::read(reader)?);
        }

        let chunk_count = reader.read_i32::<LittleEndian>()?;
        let chunk_count = u64::try_from(chunk_count)
            .map_err(|_| Error::TruncatedTable(format!("negative chunk count {chunk_count}")))?;
        if chunk_count * 2 > u64::from(info_size) {
            return Err(Error::TruncatedTable(format!(
                "{chunk_count} chunk sizes cannot fit in {info_size} bytes"
            )));
        }

        let mut chunk_sizes = vec![0u16; chunk_count as usize];
        reader.read_u16_into::<LittleEndian>(&mut chunk_sizes)?;

        Ok(Self {
            header,
            info_size,
            entries,
            chunk_sizes,
        })
    }
}

/// Progress callback type
pub type ProgressCallback<'a> = &'a dyn Fn(&HogProgress);

/// Progress information during HOG operations
#[derive(Debug, Clone)]
pub struct HogProgress {
    /// Current operation phase
    pub phase: HogPhase,
    /// Current item number (1-indexed)
    pub current: usize,
    /// Total number of items
    pub total: usize,
    /// Current file being processed (if applicable)
    pub current_file: Option<String>,
}

impl HogProgress {
    /// Create a new progress update
    #[must_use]
    pub fn new(phase: HogPhase, current: usize, total: usize) -> Self {
        Self {
            phase,
            current,
            total,
            current_file: None,
        }
    }

    /// Create a progress update with a file name
    #[must_use]
    pub fn with_file(phase: HogPhase, current: usize, total: usize, file: impl Into<String>) -> Self {
        Self {
            phase,
            current,
            total,
            current_file: Some(file.into()),
        }
    }

    /// Get the progress percentage (0.0 - 1.0)
    #[must_use]
    pub fn percentage(&self) -> f32 {
        if self.total == 0 {
            1.0
        } else {
            self.current as f32 / self.total as f32
        }
    }
}

/// Phase of a HOG operation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HogPhase {
    /// Scanning the input directory
    ScanningFiles,
    /// Compressing and writing file data
    CompressingFiles,
    /// Writing the info and chunk tables
    WritingTable,
    /// Reading the archive header
    ReadingHeader,
    /// Reading the info and chunk tables
    ReadingTable,
    /// Rebuilding files on disk
    WritingFiles,
    /// Operation complete
    Complete,
}

impl HogPhase {
    /// Get a human-readable description of this phase
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::ScanningFiles => "Scanning files",
            Self::CompressingFiles => "Compressing files",
            Self::WritingTable => "Writing file table",
            Self::ReadingHeader => "Reading header",
            Self::ReadingTable => "Reading file table",
            Self::WritingFiles => "Writing files",
            Self::Complete => "Complete",
        }
    }
}
