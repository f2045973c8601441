//! Core HOGP archive operations

use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

use tempfile::NamedTempFile;

use crate::error::{Error, Result};
use crate::utils::relative_path;
use super::options::{ExtractOptions, PackOptions};
use super::reader::{ExtractReport, HogReader};
use super::sidecar::SidecarConfig;
use super::source::{DirSink, DirSource, FileSource};
use super::types::{FileEntry, HogPhase, HogProgress, ProgressCallback};
use super::writer::{PackSummary, encode_files};
use super::HEADER_SIZE;

/// Aggregate statistics of an archive
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ArchiveInfo {
    pub version: i32,
    /// Number of file entries
    pub files: usize,
    /// Entries stored chunk-compressed
    pub compressed_files: usize,
    /// Entries in the chunk-size table
    pub chunks: usize,
    /// Chunk entries stored raw (size `0`)
    pub raw_chunks: usize,
    /// Sum of uncompressed sizes
    pub total_size: u64,
    /// Sum of stored sizes
    pub stored_size: u64,
    /// Absolute position of the info table (end of the data block)
    pub info_table_offset: u64,
    /// Byte length of the tables after the size field
    pub info_size: u32,
    /// Length of the archive file
    pub archive_size: u64,
}

impl ArchiveInfo {
    /// Length of the data block
    #[must_use]
    pub fn data_block_size(&self) -> u64 {
        self.info_table_offset.saturating_sub(HEADER_SIZE)
    }

    /// Stored size as a fraction of the original size
    #[must_use]
    pub fn ratio(&self) -> f64 {
        if self.total_size == 0 {
            1.0
        } else {
            self.stored_size as f64 / self.total_size as f64
        }
    }
}

/// High-level HOGP archive operations.
pub struct HogOperations;

impl HogOperations {
    /// Pack a directory into an archive using the default options
    ///
    /// # Errors
    ///
    /// Returns [`Error::InputNotFound`] if the input directory does not exist.
    /// Returns [`Error::Io`] or [`Error::WalkDirError`] if reading the input or writing the
    /// archive fails.
    pub fn pack<P: AsRef<Path>>(input_dir: P, output: P) -> Result<PackSummary> {
        Self::pack_with_options(input_dir, output, &PackOptions::default(), &|_| {})
    }

    /// Pack a directory into an archive.
    ///
    /// The archive is written to a temporary file next to `output` and moved
    /// into place once complete, so a failed pack leaves no partial archive.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InputNotFound`] if the input directory does not exist.
    /// Returns [`Error::Io`] or [`Error::WalkDirError`] if reading the input or writing the
    /// archive fails.
    /// Returns [`Error::NameTooLong`] or [`Error::FileTooLarge`] if a file does not fit
    /// the table fields.
    pub fn pack_with_options<P: AsRef<Path>>(
        input_dir: P,
        output: P,
        options: &PackOptions,
        progress: ProgressCallback,
    ) -> Result<PackSummary> {
        let input_dir = input_dir.as_ref();
        let output = output.as_ref();

        if !input_dir.is_dir() {
            return Err(Error::InputNotFound {
                path: input_dir.to_path_buf(),
            });
        }

        let sidecar = if options.policy.uses_sidecar() {
            SidecarConfig::load_or_default(&input_dir.join(&options.sidecar_name))
        } else {
            SidecarConfig::default()
        };
        let policy = options.policy.build(&sidecar);
        let mut source = DirSource::new(input_dir).excluding(options.sidecar_name.as_str());
        if let Some(name) = name_inside(output, input_dir)? {
            tracing::debug!("Excluding archive {name} from its own input");
            source = source.excluding(name);
        }

        tracing::info!(
            "Packing {} into {} (policy: {})",
            input_dir.display(),
            output.display(),
            options.policy
        );

        // The temp file may land inside the input, so list files first
        progress(&HogProgress::new(HogPhase::ScanningFiles, 0, 1));
        let names = source.enumerate()?;

        let parent = match output.parent() {
            Some(p) if !p.as_os_str().is_empty() => p,
            _ => Path::new("."),
        };
        std::fs::create_dir_all(parent)?;

        let temp = NamedTempFile::new_in(parent)?;
        let (writer, _, summary) =
            encode_files(BufWriter::new(temp), &source, &names, policy.as_ref(), progress)?;
        let temp = writer.into_inner().map_err(|e| Error::Io(e.into_error()))?;
        temp.persist(output).map_err(|e| Error::Io(e.error))?;

        tracing::info!(
            "Wrote {} files ({} compressed, {} chunks)",
            summary.files,
            summary.compressed_files,
            summary.chunks
        );
        Ok(summary)
    }

    /// Unpack an archive into a directory using the default options
    ///
    /// # Errors
    ///
    /// Returns [`Error::Io`] if the archive cannot be opened or read.
    /// Returns [`Error::InvalidHogMagic`] or [`Error::UnsupportedHogVersion`] if the file
    /// is not a supported archive.
    /// Returns [`Error::ExtractionPartialFailure`] if some entries could not be rebuilt.
    pub fn unpack<P: AsRef<Path>>(archive: P, output_dir: P) -> Result<ExtractReport> {
        Self::unpack_with_options(archive, output_dir, &ExtractOptions::default(), &|_| {})
    }

    /// Unpack an archive into a directory.
    ///
    /// Entries that fail are skipped and logged; the remaining entries are
    /// still written before [`Error::ExtractionPartialFailure`] is returned.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Io`] if the archive cannot be opened or read.
    /// Returns [`Error::InvalidHogMagic`] or [`Error::UnsupportedHogVersion`] if the file
    /// is not a supported archive.
    /// Returns [`Error::InfoOffsetOutOfRange`] or [`Error::TruncatedTable`] if the tables
    /// are damaged.
    /// Returns [`Error::ExtractionPartialFailure`] if some entries could not be rebuilt.
    pub fn unpack_with_options<P: AsRef<Path>>(
        archive: P,
        output_dir: P,
        options: &ExtractOptions,
        progress: ProgressCallback,
    ) -> Result<ExtractReport> {
        let archive = archive.as_ref();
        let output_dir = output_dir.as_ref();

        tracing::info!("Unpacking {} into {}", archive.display(), output_dir.display());

        let mut reader = HogReader::new(File::open(archive)?);
        std::fs::create_dir_all(output_dir)?;

        let mut sink = DirSink::new(output_dir);
        let report = reader.extract_all(&mut sink, progress)?;

        if options.emit_sidecar {
            let config = SidecarConfig::from_entries(&reader.index()?.entries);
            config.save(&output_dir.join(&options.sidecar_name))?;
            tracing::debug!("Wrote sidecar {}", options.sidecar_name);
        }

        if let Some((name, message)) = report.errors.first() {
            return Err(Error::ExtractionPartialFailure {
                total: report.total_files(),
                failed: report.errors.len(),
                first_error: format!("{name}: {message}"),
            });
        }

        tracing::info!("Unpacked {} files", report.extracted.len());
        Ok(report)
    }

    /// List the entries of an archive without extracting them
    ///
    /// # Errors
    ///
    /// Returns [`Error::Io`] if the archive cannot be opened.
    /// Returns [`Error::InvalidHogMagic`] if the file is not a valid archive.
    pub fn list<P: AsRef<Path>>(archive: P) -> Result<Vec<FileEntry>> {
        Self::list_with_progress(archive, &|_| {})
    }

    /// List the entries of an archive with progress callback
    ///
    /// # Errors
    ///
    /// Returns [`Error::Io`] if the archive cannot be opened.
    /// Returns [`Error::InvalidHogMagic`] if the file is not a valid archive.
    pub fn list_with_progress<P: AsRef<Path>>(
        archive: P,
        progress: ProgressCallback,
    ) -> Result<Vec<FileEntry>> {
        let mut reader = HogReader::new(File::open(archive.as_ref())?);

        progress(&HogProgress::new(HogPhase::ReadingTable, 1, 1));
        let entries = reader.list_files()?;

        progress(&HogProgress::new(HogPhase::Complete, entries.len(), entries.len()));
        Ok(entries)
    }

    /// Read aggregate statistics of an archive
    ///
    /// # Errors
    ///
    /// Returns [`Error::Io`] if the archive cannot be opened.
    /// Returns [`Error::InvalidHogMagic`] if the file is not a valid archive.
    pub fn info<P: AsRef<Path>>(archive: P) -> Result<ArchiveInfo> {
        let file = File::open(archive.as_ref())?;
        let archive_size = file.metadata()?.len();

        let mut reader = HogReader::new(file);
        let index = reader.index()?;

        Ok(ArchiveInfo {
            version: index.header.version,
            files: index.entries.len(),
            compressed_files: index.compressed_count(),
            chunks: index.chunk_sizes.len(),
            raw_chunks: index.chunk_sizes.iter().filter(|&&s| s == 0).count(),
            total_size: index.entries.iter().map(|e| u64::from(e.size)).sum(),
            stored_size: index.entries.iter().map(|e| u64::from(e.compressed_size)).sum(),
            info_table_offset: index.info_table_offset() as u64,
            info_size: index.info_size,
            archive_size,
        })
    }
}

/// Entry name `path` would get when packing `root`, if it lies inside it
fn name_inside(path: &Path, root: &Path) -> Result<Option<String>> {
    let path = std::path::absolute(path)?;
    let root = std::path::absolute(root)?;
    Ok(relative_path(path.as_path(), root.as_path()).filter(|name| !name.is_empty()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hog::{DEFAULT_SIDECAR_NAME, PolicyKind};
    use pretty_assertions::assert_eq;

    #[test]
    fn test_pack_missing_input_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("out.hogp");

        let err = HogOperations::pack(dir.path().join("missing"), output.clone()).unwrap_err();
        assert!(matches!(err, Error::InputNotFound { .. }));
        assert!(!output.exists());
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[test]
    fn test_pack_info_and_list() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("in");
        std::fs::create_dir_all(input.join("sub")).unwrap();
        std::fs::write(input.join("sub/zeros.bin"), vec![0u8; 1000]).unwrap();
        std::fs::write(input.join("note.txt"), b"note").unwrap();

        let output = dir.path().join("out.hogp");
        let options = PackOptions::new().with_policy(PolicyKind::Always);
        let summary =
            HogOperations::pack_with_options(&input, &output, &options, &|_| {}).unwrap();
        assert_eq!(summary.files, 2);
        assert_eq!(summary.archive_size, std::fs::metadata(&output).unwrap().len());

        let names: Vec<_> = HogOperations::list(&output)
            .unwrap()
            .into_iter()
            .map(|e| e.name)
            .collect();
        assert_eq!(names, vec!["note.txt", "sub/zeros.bin"]);

        let info = HogOperations::info(&output).unwrap();
        assert_eq!(info.version, 3);
        assert_eq!(info.files, 2);
        assert_eq!(info.total_size, 1004);
        assert_eq!(info.chunks, summary.chunks);
        assert_eq!(info.archive_size, summary.archive_size);
        assert_eq!(info.data_block_size(), summary.stored_size);
        assert!(info.ratio() < 1.0);
    }

    #[test]
    fn test_pack_into_input_directory() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("in");
        std::fs::create_dir_all(&input).unwrap();
        std::fs::write(input.join("a.txt"), b"alpha").unwrap();

        let output = input.join("out.hogp");
        HogOperations::pack(&input, &output).unwrap();
        let names: Vec<_> = HogOperations::list(&output)
            .unwrap()
            .into_iter()
            .map(|e| e.name)
            .collect();
        assert_eq!(names, vec!["a.txt"]);

        // Repacking over an existing archive must not pick it up either
        let summary = HogOperations::pack(&input, &output).unwrap();
        assert_eq!(summary.files, 1);
        assert_eq!(HogOperations::list(&output).unwrap().len(), 1);

        let unpacked = dir.path().join("out");
        let report = HogOperations::unpack(&output, &unpacked).unwrap();
        assert_eq!(report.extracted, vec!["a.txt"]);
        assert_eq!(std::fs::read_dir(&unpacked).unwrap().count(), 1);
    }

    #[test]
    fn test_name_inside() {
        let root = Path::new("/data/in");
        assert_eq!(
            name_inside(Path::new("/data/in/sub/out.hogp"), root).unwrap(),
            Some("sub/out.hogp".to_string())
        );
        assert_eq!(name_inside(Path::new("/data/out.hogp"), root).unwrap(), None);
        assert_eq!(name_inside(root, root).unwrap(), None);
    }

    #[test]
    fn test_unpack_emits_sidecar() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("in");
        std::fs::create_dir_all(&input).unwrap();
        std::fs::write(input.join("a.txt"), b"aaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa").unwrap();
        std::fs::write(
            input.join(DEFAULT_SIDECAR_NAME),
            r#"{"fileCount":1,"files":[{"path":"a.txt","isCompressed":true}]}"#,
        )
        .unwrap();

        let archive = dir.path().join("a.hogp");
        HogOperations::pack(&input, &archive).unwrap();

        let output = dir.path().join("out");
        let options = ExtractOptions::new().with_emit_sidecar(true);
        let report =
            HogOperations::unpack_with_options(&archive, &output, &options, &|_| {}).unwrap();
        assert_eq!(report.extracted, vec!["a.txt"]);

        let emitted = SidecarConfig::load(&output.join(DEFAULT_SIDECAR_NAME))
            .unwrap()
            .unwrap();
        assert_eq!(emitted.file_count, 1);
        assert!(emitted.files[0].is_compressed);
    }
}
