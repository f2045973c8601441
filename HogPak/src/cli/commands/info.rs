//! CLI command for archive statistics

use std::path::Path;

use crate::cli::progress::format_size;
use crate::hog::HogOperations;

/// Show aggregate info about an archive
pub fn execute(source: &Path) -> anyhow::Result<()> {
    let info = HogOperations::info(source)?;
    let entries = HogOperations::list(source)?;

    println!("HOGP Information: {}", source.display());
    println!();
    println!("Version: {}", info.version);
    println!(
        "Total files: {} ({} compressed, {} raw)",
        info.files,
        info.compressed_files,
        info.files - info.compressed_files
    );
    println!("Chunks: {} ({} stored raw)", info.chunks, info.raw_chunks);
    println!(
        "Total size (original): {} ({} bytes)",
        format_size(info.total_size),
        info.total_size
    );
    println!(
        "Total size (stored): {} ({} bytes)",
        format_size(info.stored_size),
        info.stored_size
    );
    if info.stored_size > 0 {
        let ratio = info.total_size as f64 / info.stored_size as f64;
        println!("Compression ratio: {ratio:.2}x");
    }
    println!();
    println!("Data block: 16..{}", info.info_table_offset);
    println!("Info table: {} bytes at {}", u64::from(info.info_size) + 4, info.info_table_offset);
    println!("Archive size: {} bytes", info.archive_size);
    println!();

    // Print largest files
    let mut largest: Vec<_> = entries.iter().collect();
    largest.sort_by_key(|e| std::cmp::Reverse(e.size));

    println!("Largest files:");
    for entry in largest.iter().take(10) {
        println!(
            "  {:>10}  {}",
            format_size(u64::from(entry.size)),
            entry.name
        );
    }

    Ok(())
}
