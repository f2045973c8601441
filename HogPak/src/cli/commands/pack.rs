//! CLI command for packing a directory

use std::path::Path;
use std::time::Instant;

use crate::cli::progress::{
    DISK, LOOKING_GLASS, PACKAGE, format_size, print_done, print_step, simple_bar, update_bar,
};
use crate::hog::{HogOperations, HogPhase, PackOptions, PolicyKind};

pub fn execute(
    source: &Path,
    destination: &Path,
    policy: PolicyKind,
    config: Option<&str>,
    quiet: bool,
) -> anyhow::Result<()> {
    let started = Instant::now();

    let mut options = PackOptions::new().with_policy(policy);
    if let Some(name) = config {
        options = options.with_sidecar_name(name);
    }

    if !quiet {
        print_step(1, 3, LOOKING_GLASS, &format!("Scanning {}...", source.display()));
    }

    let pb = simple_bar(0, quiet);
    let summary = HogOperations::pack_with_options(source, destination, &options, &|progress| {
        match progress.phase {
            HogPhase::CompressingFiles => {
                if progress.current == 1 && !quiet {
                    pb.println(format!("[2/3] {PACKAGE}Packing files (policy: {policy})..."));
                }
                update_bar(&pb, progress);
            }
            HogPhase::WritingTable => {
                pb.finish_and_clear();
                if !quiet {
                    print_step(3, 3, DISK, "Writing file table...");
                }
            }
            _ => {}
        }
    })?;
    pb.finish_and_clear();

    if !quiet {
        println!(
            "Packed {} files ({} compressed) into {}: {} -> {}",
            summary.files,
            summary.compressed_files,
            destination.display(),
            format_size(summary.total_size),
            format_size(summary.archive_size)
        );
        print_done(started.elapsed());
    }

    Ok(())
}
