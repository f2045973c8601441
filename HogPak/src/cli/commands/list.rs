//! CLI command for listing archive contents

use std::path::Path;

use crate::cli::progress::format_size;
use crate::hog::{FileEntry, HogOperations};

/// Simple glob pattern matching (supports * and ?)
fn matches_glob(pattern: &str, text: &str) -> bool {
    let pattern_chars: Vec<char> = pattern.chars().collect();
    let text_chars: Vec<char> = text.chars().collect();
    matches_glob_recursive(&pattern_chars, &text_chars, 0, 0)
}

fn matches_glob_recursive(pattern: &[char], text: &[char], pi: usize, ti: usize) -> bool {
    if pi == pattern.len() {
        return ti == text.len();
    }

    match pattern[pi] {
        '*' => (ti..=text.len()).any(|i| matches_glob_recursive(pattern, text, pi + 1, i)),
        '?' => ti < text.len() && matches_glob_recursive(pattern, text, pi + 1, ti + 1),
        // Entry names compare case-insensitively
        c => {
            ti < text.len()
                && text[ti].eq_ignore_ascii_case(&c)
                && matches_glob_recursive(pattern, text, pi + 1, ti + 1)
        }
    }
}

/// Match against the file name or the whole entry name
fn entry_matches(pattern: &str, entry: &FileEntry) -> bool {
    let file_name = entry.name.rsplit('/').next().unwrap_or(&entry.name);
    matches_glob(pattern, file_name) || matches_glob(pattern, &entry.name)
}

pub fn execute(
    source: &Path,
    detailed: bool,
    filter: Option<&str>,
    count: bool,
) -> anyhow::Result<()> {
    let entries = HogOperations::list(source)?;

    let filtered: Vec<_> = match filter {
        Some(pattern) => entries.iter().filter(|e| entry_matches(pattern, e)).collect(),
        None => entries.iter().collect(),
    };

    if count {
        println!("{}", filtered.len());
        return Ok(());
    }

    if !detailed {
        for entry in filtered {
            println!("{}", entry.name);
        }
        return Ok(());
    }

    println!(
        "{:>10}  {:>10}  {:>6}  {:>6}  PATH",
        "SIZE", "STORED", "RATIO", "CHUNKS"
    );

    for entry in &filtered {
        let chunks = if entry.is_compressed() {
            entry.chunk_count().to_string()
        } else {
            "-".to_string()
        };
        println!(
            "{:>10}  {:>10}  {:>5.1}%  {:>6}  {}",
            format_size(u64::from(entry.size)),
            format_size(u64::from(entry.compressed_size)),
            entry.ratio(),
            chunks,
            entry.name
        );
    }

    let total: u64 = filtered.iter().map(|e| u64::from(e.size)).sum();
    let stored: u64 = filtered.iter().map(|e| u64::from(e.compressed_size)).sum();
    let overall_ratio = if total > 0 {
        (stored as f64 / total as f64) * 100.0
    } else {
        100.0
    };

    println!();
    println!(
        "{} files, {} total ({} stored, {:.1}% ratio)",
        filtered.len(),
        format_size(total),
        format_size(stored),
        overall_ratio
    );

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_glob_matching() {
        assert!(matches_glob("*.dds", "wall.DDS"));
        assert!(matches_glob("lev?l*", "level01.bin"));
        assert!(!matches_glob("*.dds", "wall.png"));
        assert!(!matches_glob("a?", "a"));
    }

    #[test]
    fn test_entry_matches_file_name_or_path() {
        let entry = FileEntry::raw("textures/wall.dds", 4, 16);
        assert!(entry_matches("wall.*", &entry));
        assert!(entry_matches("textures/*", &entry));
        assert!(!entry_matches("maps/*", &entry));
    }
}
