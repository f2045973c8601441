//! Options for packing and unpacking HOGP archives
//!
//! ```no_run
//! use hogpak::hog::{PackOptions, PolicyKind};
//!
//! let options = PackOptions::new()
//!     .with_policy(PolicyKind::Auto)
//!     .with_sidecar_name("layout.json");
//! ```

use std::fmt;
use std::str::FromStr;

use super::policy::{AutoCompress, CompressAll, CompressNone, CompressionPolicy, SidecarPolicy};
use super::sidecar::{DEFAULT_SIDECAR_NAME, SidecarConfig};

/// Which compression policy the encoder uses
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum PolicyKind {
    /// Per-file flags from the sidecar mapping
    #[default]
    Sidecar,
    /// Compress files that get smaller
    Auto,
    /// Compress every non-empty file
    Always,
    /// Store every file raw
    Never,
}

impl PolicyKind {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Sidecar => "sidecar",
            Self::Auto => "auto",
            Self::Always => "always",
            Self::Never => "never",
        }
    }

    /// Whether this policy reads the sidecar mapping
    #[must_use]
    pub fn uses_sidecar(self) -> bool {
        self == Self::Sidecar
    }

    /// Build the policy; `sidecar` is only consulted for [`PolicyKind::Sidecar`]
    #[must_use]
    pub fn build(self, sidecar: &SidecarConfig) -> Box<dyn CompressionPolicy> {
        match self {
            Self::Sidecar => Box::new(SidecarPolicy::new(sidecar)),
            Self::Auto => Box::new(AutoCompress),
            Self::Always => Box::new(CompressAll),
            Self::Never => Box::new(CompressNone),
        }
    }
}

impl fmt::Display for PolicyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PolicyKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "sidecar" | "config" => Ok(Self::Sidecar),
            "auto" => Ok(Self::Auto),
            "always" | "all" => Ok(Self::Always),
            "never" | "none" => Ok(Self::Never),
            _ => Err(format!(
                "Invalid policy '{s}'. Valid values: sidecar, auto, always, never"
            )),
        }
    }
}

/// Options for packing a directory
#[derive(Debug, Clone)]
pub struct PackOptions {
    /// How to decide which files are chunk-compressed
    pub policy: PolicyKind,

    /// File name of the sidecar mapping at the input root.
    /// It is never packed, whatever the policy.
    pub sidecar_name: String,
}

impl Default for PackOptions {
    fn default() -> Self {
        Self::new()
    }
}

impl PackOptions {
    #[must_use]
    pub fn new() -> Self {
        Self {
            policy: PolicyKind::default(),
            sidecar_name: DEFAULT_SIDECAR_NAME.to_string(),
        }
    }

    #[must_use]
    pub fn with_policy(mut self, policy: PolicyKind) -> Self {
        self.policy = policy;
        self
    }

    #[must_use]
    pub fn with_sidecar_name(mut self, name: impl Into<String>) -> Self {
        self.sidecar_name = name.into();
        self
    }
}

/// Options for unpacking an archive
#[derive(Debug, Clone)]
pub struct ExtractOptions {
    /// Write a sidecar mapping that records each entry's compression state
    pub emit_sidecar: bool,

    /// File name of the emitted sidecar mapping
    pub sidecar_name: String,
}

impl Default for ExtractOptions {
    fn default() -> Self {
        Self::new()
    }
}

impl ExtractOptions {
    #[must_use]
    pub fn new() -> Self {
        Self {
            emit_sidecar: false,
            sidecar_name: DEFAULT_SIDECAR_NAME.to_string(),
        }
    }

    #[must_use]
    pub fn with_emit_sidecar(mut self, emit: bool) -> Self {
        self.emit_sidecar = emit;
        self
    }

    #[must_use]
    pub fn with_sidecar_name(mut self, name: impl Into<String>) -> Self {
        self.sidecar_name = name.into();
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_policy_parsing() {
        assert_eq!("sidecar".parse::<PolicyKind>(), Ok(PolicyKind::Sidecar));
        assert_eq!("AUTO".parse::<PolicyKind>(), Ok(PolicyKind::Auto));
        assert_eq!("none".parse::<PolicyKind>(), Ok(PolicyKind::Never));
        assert!("sometimes".parse::<PolicyKind>().is_err());
        assert_eq!(PolicyKind::Always.to_string(), "always");
    }

    #[test]
    fn test_built_policies() {
        let empty = SidecarConfig::default();
        assert!(!PolicyKind::Sidecar.build(&empty).should_compress("a", &[0u8; 100]));
        assert!(PolicyKind::Always.build(&empty).should_compress("a", b"x"));
        assert!(!PolicyKind::Never.build(&empty).should_compress("a", &[0u8; 100]));
        assert!(PolicyKind::Auto.build(&empty).should_compress("a", &[0u8; 100]));
    }

    #[test]
    fn test_option_builders() {
        let pack = PackOptions::new()
            .with_policy(PolicyKind::Never)
            .with_sidecar_name("layout.json");
        assert_eq!(pack.policy, PolicyKind::Never);
        assert_eq!(pack.sidecar_name, "layout.json");
        assert_eq!(PackOptions::default().sidecar_name, DEFAULT_SIDECAR_NAME);

        let extract = ExtractOptions::new().with_emit_sidecar(true);
        assert!(extract.emit_sidecar);
        assert_eq!(extract.sidecar_name, DEFAULT_SIDECAR_NAME);
    }
}
