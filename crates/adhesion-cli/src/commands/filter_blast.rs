use adhesion_io::blast::filter_blast_hits;
use anyhow::{bail, Result};
use clap::Args;
use std::fs::File;
use std::io::{self, BufReader, Write};
use std::path::PathBuf;
use tracing::error;

#[derive(Args, Debug)]
pub struct FilterBlastArgs {
    /// BLAST tabular (-outfmt 6) files
    #[arg(required = true)]
    input_files: Vec<PathBuf>,
    /// Keep hits with percent identity above this value
    #[arg(long = "percent_id", visible_alias = "percent-id", default_value_t = 90.0)]
    percent_id: f64,
}

/// Print `query subject identity evalue` for every kept hit.
///
/// Files that cannot be read are reported and the rest still processed; the
/// command fails at the end if any were skipped.
pub fn execute(args: FilterBlastArgs) -> Result<()> {
    let stdout = io::stdout();
    let mut out = stdout.lock();
    let mut failed = 0usize;
    for path in &args.input_files {
        let source = path.display().to_string();
        let hits = File::open(path)
            .and_then(|file| filter_blast_hits(BufReader::new(file), args.percent_id, &source));
        match hits {
            Ok(hits) => {
                for hit in hits {
                    writeln!(out, "{}", hit)?;
                }
            }
            Err(e) => {
                error!("Cannot read {}: {}", source, e);
                failed += 1;
            }
        }
    }
    if failed > 0 {
        bail!("{} of {} input file(s) could not be read", failed, args.input_files.len());
    }
    Ok(())
}
