use adhesion_io::find_files_with_suffix;
use adhesion_io::sampling::{
    read_fasta_ids, read_ignored_ids, sample_ids, sampled_ids_path, write_id_list,
};
use anyhow::{bail, Context, Result};
use clap::Args;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use std::num::NonZeroUsize;
use std::path::PathBuf;
use tracing::warn;

#[derive(Args, Debug)]
pub struct SampleIdsArgs {
    /// Root directory to search for input files
    #[arg(long, default_value = ".")]
    input_dir: PathBuf,
    /// Directory to write sampled id files
    #[arg(long, default_value = ".")]
    output_dir: PathBuf,
    /// Pattern for tab files listing ids to skip
    #[arg(long, default_value = "*.FASTA.tab")]
    tab_pattern: String,
    /// Pattern for FASTA files to sample from
    #[arg(long, default_value = "*_AnnotatedProteins.fasta")]
    fasta_pattern: String,
    /// 1-based column holding the ids in tab files
    #[arg(long, default_value = "2")]
    tab_column: NonZeroUsize,
    /// Number of ids to sample per FASTA file
    #[arg(long, default_value = "100")]
    num_ids: NonZeroUsize,
    /// Seed for reproducible sampling [default: random]
    #[arg(long)]
    seed: Option<u64>,
}

/// `*_AnnotatedProteins.fasta` matches names ending in `_AnnotatedProteins.fasta`.
fn pattern_suffix(pattern: &str) -> &str {
    pattern.trim_start_matches('*')
}

pub fn execute(args: SampleIdsArgs) -> Result<()> {
    let tab_files = find_files_with_suffix(&args.input_dir, pattern_suffix(&args.tab_pattern));
    let fasta_files =
        find_files_with_suffix(&args.input_dir, pattern_suffix(&args.fasta_pattern));
    if fasta_files.is_empty() {
        bail!("No FASTA files found");
    }

    let ignored = read_ignored_ids(&tab_files, args.tab_column);
    let mut rng = match args.seed {
        Some(seed) => ChaCha8Rng::seed_from_u64(seed),
        None => ChaCha8Rng::from_entropy(),
    };
    std::fs::create_dir_all(&args.output_dir)
        .with_context(|| format!("Failed to create {}", args.output_dir.display()))?;

    for fasta in &fasta_files {
        let ids = match read_fasta_ids(fasta) {
            Ok(ids) => ids,
            Err(e) => {
                warn!("Skipping {}: {}", fasta.display(), e);
                continue;
            }
        };
        let sampled = sample_ids(ids, &ignored, args.num_ids.get(), &mut rng);
        let output = sampled_ids_path(&args.output_dir, fasta);
        write_id_list(&output, &sampled)?;
        println!("Wrote {} IDs to {}", sampled.len(), output.display());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pattern_suffix() {
        assert_eq!(pattern_suffix("*.FASTA.tab"), ".FASTA.tab");
        assert_eq!(pattern_suffix("genome.fasta"), "genome.fasta");
    }
}
