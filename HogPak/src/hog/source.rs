//! File enumeration and output capabilities used by the encoder and decoder

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use walkdir::WalkDir;

use crate::error::{Error, Result};
use crate::utils::{entry_path, relative_path};

/// Supplies the files to pack, in archive order
pub trait FileSource {
    /// Forward-slash names of every file to pack
    fn enumerate(&self) -> Result<Vec<String>>;

    /// Contents of one enumerated file
    fn read(&self, name: &str) -> Result<Vec<u8>>;
}

/// Receives rebuilt files during extraction
pub trait FileSink {
    /// Create (or replace) `name` with `data`
    fn write(&mut self, name: &str, data: &[u8]) -> Result<()>;
}

/// Files below a directory on disk
#[derive(Debug, Clone)]
pub struct DirSource {
    root: PathBuf,
    excluded: Vec<String>,
}

impl DirSource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            excluded: Vec::new(),
        }
    }

    /// Skip a root-relative name (such as the sidecar document)
    #[must_use]
    pub fn excluding(mut self, name: impl Into<String>) -> Self {
        self.excluded.push(name.into());
        self
    }

    /// Get the root path
    pub fn root(&self) -> &Path {
        &self.root
    }
}

impl FileSource for DirSource {
    fn enumerate(&self) -> Result<Vec<String>> {
        let mut names = Vec::new();

        for entry in WalkDir::new(&self.root)
            .follow_links(false)
            .sort_by_file_name()
        {
            let entry = entry?;

            // Skip symlinks and directories
            if !entry.file_type().is_file() {
                continue;
            }

            // Skip .DS_Store files
            if entry.file_name() == ".DS_Store" {
                continue;
            }

            let name = relative_path(entry.path(), self.root.as_path())
                .ok_or_else(|| Error::InvalidPath(entry.path().display().to_string()))?;

            if self.excluded.iter().any(|e| e == &name) {
                tracing::debug!("Excluding {name} from archive");
                continue;
            }

            names.push(name);
        }

        Ok(names)
    }

    fn read(&self, name: &str) -> Result<Vec<u8>> {
        Ok(std::fs::read(self.root.join(name))?)
    }
}

/// In-memory files, kept in insertion order
#[derive(Debug, Clone, Default)]
pub struct MemorySource {
    files: Vec<(String, Vec<u8>)>,
}

impl MemorySource {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a file (builder style)
    #[must_use]
    pub fn with_file(mut self, name: impl Into<String>, data: impl Into<Vec<u8>>) -> Self {
        self.add(name, data);
        self
    }

    pub fn add(&mut self, name: impl Into<String>, data: impl Into<Vec<u8>>) {
        self.files.push((name.into(), data.into()));
    }
}

impl FileSource for MemorySource {
    fn enumerate(&self) -> Result<Vec<String>> {
        Ok(self.files.iter().map(|(name, _)| name.clone()).collect())
    }

    fn read(&self, name: &str) -> Result<Vec<u8>> {
        self.files
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, data)| data.clone())
            .ok_or_else(|| Error::InvalidPath(name.to_string()))
    }
}

/// Writes files below an output directory, creating parents as needed
#[derive(Debug, Clone)]
pub struct DirSink {
    root: PathBuf,
}

impl DirSink {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Get the root path
    pub fn root(&self) -> &Path {
        &self.root
    }
}

impl FileSink for DirSink {
    fn write(&mut self, name: &str, data: &[u8]) -> Result<()> {
        let relative = entry_path(name).ok_or_else(|| Error::InvalidPath(name.to_string()))?;
        let output_path = self.root.join(relative);

        let write_failed = |source| Error::EntryWriteFailed {
            name: name.to_string(),
            source,
        };

        if let Some(parent) = output_path.parent() {
            std::fs::create_dir_all(parent).map_err(write_failed)?;
        }
        std::fs::write(&output_path, data).map_err(write_failed)
    }
}

/// Collects rebuilt files in memory, keyed by entry name
#[derive(Debug, Clone, Default)]
pub struct MemorySink {
    pub files: BTreeMap<String, Vec<u8>>,
}

impl MemorySink {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, name: &str) -> Option<&[u8]> {
        self.files.get(name).map(Vec::as_slice)
    }
}

impl FileSink for MemorySink {
    fn write(&mut self, name: &str, data: &[u8]) -> Result<()> {
        self.files.insert(name.to_string(), data.to_vec());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dir_source_enumerates_sorted_and_excludes() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        std::fs::create_dir_all(root.join("sub/deeper")).unwrap();
        std::fs::write(root.join("b.txt"), b"b").unwrap();
        std::fs::write(root.join("a.txt"), b"a").unwrap();
        std::fs::write(root.join("sub/deeper/c.bin"), b"c").unwrap();
        std::fs::write(root.join("hogpak.json"), b"{}").unwrap();
        std::fs::write(root.join(".DS_Store"), b"junk").unwrap();

        let source = DirSource::new(root).excluding("hogpak.json");
        let names = source.enumerate().unwrap();
        assert_eq!(names, vec!["a.txt", "b.txt", "sub/deeper/c.bin"]);
        assert_eq!(source.read("sub/deeper/c.bin").unwrap(), b"c");
    }

    #[test]
    fn test_memory_source_keeps_order() {
        let source = MemorySource::new()
            .with_file("z.bin", vec![1u8])
            .with_file("a.bin", vec![2u8]);
        assert_eq!(source.enumerate().unwrap(), vec!["z.bin", "a.bin"]);
        assert_eq!(source.read("a.bin").unwrap(), vec![2u8]);
        assert!(source.read("missing").is_err());
    }

    #[test]
    fn test_dir_sink_creates_parents() {
        let dir = tempfile::tempdir().unwrap();
        let mut sink = DirSink::new(dir.path());
        sink.write("levels/intro/map.bin", b"map").unwrap();
        sink.write("empty.dat", b"").unwrap();

        assert_eq!(
            std::fs::read(dir.path().join("levels").join("intro").join("map.bin")).unwrap(),
            b"map"
        );
        assert_eq!(std::fs::metadata(dir.path().join("empty.dat")).unwrap().len(), 0);
    }

    #[test]
    fn test_dir_sink_rejects_escaping_names() {
        let dir = tempfile::tempdir().unwrap();
        let mut sink = DirSink::new(dir.path().join("out"));
        let err = sink.write("../evil.txt", b"x").unwrap_err();
        assert!(err.is_per_entry());
        assert!(!dir.path().join("evil.txt").exists());
    }
}
