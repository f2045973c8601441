//! CLI command for unpacking an archive

use std::path::Path;
use std::time::Instant;

use crate::cli::progress::{DISK, LOOKING_GLASS, print_done, print_step, simple_bar, update_bar};
use crate::hog::{ExtractOptions, HogOperations, HogPhase};

pub fn execute(source: &Path, destination: &Path, emit_config: bool, quiet: bool) -> anyhow::Result<()> {
    let started = Instant::now();
    let options = ExtractOptions::new().with_emit_sidecar(emit_config);

    if !quiet {
        print_step(1, 2, LOOKING_GLASS, &format!("Reading {}...", source.display()));
    }

    let pb = simple_bar(0, quiet);
    let result = HogOperations::unpack_with_options(source, destination, &options, &|progress| {
        if progress.phase == HogPhase::WritingFiles {
            if progress.current == 1 && !quiet {
                pb.println(format!("[2/2] {DISK}Writing files..."));
            }
            update_bar(&pb, progress);
        }
    });
    pb.finish_and_clear();

    let report = result?;
    if !quiet {
        println!(
            "Unpacked {} files into {}",
            report.extracted.len(),
            destination.display()
        );
        print_done(started.elapsed());
    }

    Ok(())
}
