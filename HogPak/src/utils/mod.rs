//! Utility functions

pub mod path;

pub use path::{entry_path, normalize_path, relative_path};
