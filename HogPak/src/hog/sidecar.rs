//! Sidecar mapping document
//!
//! An optional JSON file at the root of a pack directory that tells the
//! encoder which files to chunk-compress:
//!
//! ```json
//! { "fileCount": 2, "files": [ { "path": "a.txt", "isCompressed": true },
//!                              { "path": "b.bin", "isCompressed": false } ] }
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::utils::normalize_path;
use super::FileEntry;

/// Default file name of the sidecar document
pub const DEFAULT_SIDECAR_NAME: &str = "hogpak.json";

/// One file record in the sidecar document
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SidecarFile {
    pub path: String,
    #[serde(default)]
    pub is_compressed: bool,
}

/// Per-file compression mapping
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SidecarConfig {
    /// Informational; the `files` array is authoritative
    #[serde(default)]
    pub file_count: usize,
    #[serde(default)]
    pub files: Vec<SidecarFile>,
}

impl SidecarConfig {
    /// Build a mapping that reproduces an archive's compression choices
    #[must_use]
    pub fn from_entries(entries: &[FileEntry]) -> Self {
        let files: Vec<_> = entries
            .iter()
            .map(|e| SidecarFile {
                path: e.name.clone(),
                is_compressed: e.is_compressed(),
            })
            .collect();

        Self {
            file_count: files.len(),
            files,
        }
    }

    /// Parse a sidecar document.
    ///
    /// # Errors
    /// Returns [`Error::JsonError`] if the document is not valid.
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Serialize to pretty-printed JSON.
    ///
    /// # Errors
    /// Returns [`Error::JsonError`] if serialization fails.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Load a sidecar document from disk.
    ///
    /// Returns `Ok(None)` when the file does not exist.
    ///
    /// # Errors
    /// Returns [`Error::MalformedSidecar`] if the file exists but cannot be
    /// read or parsed.
    pub fn load(path: &Path) -> Result<Option<Self>> {
        if !path.is_file() {
            return Ok(None);
        }

        let malformed = |message: String| Error::MalformedSidecar {
            path: path.to_path_buf(),
            message,
        };

        let json = std::fs::read_to_string(path).map_err(|e| malformed(e.to_string()))?;
        serde_json::from_str(&json)
            .map(Some)
            .map_err(|e| malformed(e.to_string()))
    }

    /// Load a sidecar document, treating a missing or malformed file as an
    /// empty mapping.
    #[must_use]
    pub fn load_or_default(path: &Path) -> Self {
        match Self::load(path) {
            Ok(Some(config)) => {
                tracing::debug!("Loaded sidecar {} ({} files)", path.display(), config.files.len());
                config
            }
            Ok(None) => Self::default(),
            Err(e) => {
                tracing::warn!("{e}; no files will be compressed");
                Self::default()
            }
        }
    }

    /// Write the document to disk.
    ///
    /// # Errors
    /// Returns an error if serialization or writing fails.
    pub fn save(&self, path: &Path) -> Result<()> {
        std::fs::write(path, self.to_json()?)?;
        Ok(())
    }

    /// Iterate `(normalized path, compress)` pairs
    pub fn flags(&self) -> impl Iterator<Item = (String, bool)> + '_ {
        self.files
            .iter()
            .map(|f| (normalize_path(&f.path), f.is_compressed))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_document() {
        let json = r#"{
            "fileCount": 2,
            "files": [
                { "path": "a.txt", "isCompressed": true },
                { "path": "sub\\b.bin", "isCompressed": false }
            ]
        }"#;
        let config = SidecarConfig::from_json(json).unwrap();
        assert_eq!(config.file_count, 2);
        assert_eq!(config.files.len(), 2);

        let flags: Vec<_> = config.flags().collect();
        assert_eq!(
            flags,
            vec![("a.txt".to_string(), true), ("sub/b.bin".to_string(), false)]
        );
    }

    #[test]
    fn test_missing_fields_default() {
        let config = SidecarConfig::from_json(r#"{ "files": [ { "path": "x" } ] }"#).unwrap();
        assert_eq!(config.file_count, 0);
        assert!(!config.files[0].is_compressed);
    }

    #[test]
    fn test_from_entries_roundtrip() {
        let entries = vec![
            FileEntry::raw("raw.bin", 10, 16),
            FileEntry {
                name: "packed.txt".to_string(),
                size: 100,
                compressed_size: 20,
                chunk_idx: 0,
                offset: 26,
            },
        ];
        let config = SidecarConfig::from_entries(&entries);
        assert_eq!(config.file_count, 2);
        assert!(!config.files[0].is_compressed);
        assert!(config.files[1].is_compressed);

        let json = config.to_json().unwrap();
        assert!(json.contains("\"isCompressed\": true"));
        assert_eq!(SidecarConfig::from_json(&json).unwrap(), config);
    }

    #[test]
    fn test_load_missing_and_malformed() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(DEFAULT_SIDECAR_NAME);

        assert!(SidecarConfig::load(&path).unwrap().is_none());

        std::fs::write(&path, "{ not json").unwrap();
        let err = SidecarConfig::load(&path).unwrap_err();
        assert!(matches!(err, Error::MalformedSidecar { .. }));
        assert_eq!(SidecarConfig::load_or_default(&path), SidecarConfig::default());
    }
}
