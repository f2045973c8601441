//! Compression policies: decide per file whether to chunk-compress it

use std::collections::HashMap;

use rayon::prelude::*;

use crate::utils::normalize_path;
use super::CHUNK_SIZE;
use super::chunk::deflate;
use super::sidecar::SidecarConfig;

/// Decides whether a file is chunk-compressed or stored raw.
pub trait CompressionPolicy: Send + Sync {
    /// `name` is the forward-slash entry name, `data` the file contents.
    fn should_compress(&self, name: &str, data: &[u8]) -> bool;
}

/// Flags taken from a sidecar mapping; unknown files are stored raw
#[derive(Debug, Clone, Default)]
pub struct SidecarPolicy {
    flags: HashMap<String, bool>,
}

impl SidecarPolicy {
    #[must_use]
    pub fn new(config: &SidecarConfig) -> Self {
        Self {
            flags: config.flags().collect(),
        }
    }

    /// Number of paths in the mapping
    #[must_use]
    pub fn len(&self) -> usize {
        self.flags.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.flags.is_empty()
    }
}

impl From<&SidecarConfig> for SidecarPolicy {
    fn from(config: &SidecarConfig) -> Self {
        Self::new(config)
    }
}

impl CompressionPolicy for SidecarPolicy {
    fn should_compress(&self, name: &str, _data: &[u8]) -> bool {
        self.flags
            .get(&normalize_path(name))
            .copied()
            .unwrap_or(false)
    }
}

/// Compress a file when at least one of its windows gets strictly smaller
#[derive(Debug, Clone, Copy, Default)]
pub struct AutoCompress;

impl CompressionPolicy for AutoCompress {
    fn should_compress(&self, _name: &str, data: &[u8]) -> bool {
        data.par_chunks(CHUNK_SIZE)
            .any(|window| deflate(window).is_ok_and(|c| c.len() < window.len()))
    }
}

/// Compress every non-empty file
#[derive(Debug, Clone, Copy, Default)]
pub struct CompressAll;

impl CompressionPolicy for CompressAll {
    fn should_compress(&self, _name: &str, _data: &[u8]) -> bool {
        true
    }
}

/// Store every file raw
#[derive(Debug, Clone, Copy, Default)]
pub struct CompressNone;

impl CompressionPolicy for CompressNone {
    fn should_compress(&self, _name: &str, _data: &[u8]) -> bool {
        false
    }
}
