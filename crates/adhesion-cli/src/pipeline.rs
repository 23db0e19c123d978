//! Steps shared by the train, predict and evaluate commands.
use adhesion_core::{Label, SequenceRecord};
use adhesion_io::{load_sequences_from_path, LoadOptions};
use adhesion_plms::{
    select_device, BatchSize, EmbedderKind, Embeddings, Extractor, ExtractorConfig,
    DEFAULT_REPR_LAYER,
};
use anyhow::{bail, Result};
use clap::Args;
use std::io::IsTerminal;
use std::path::Path;

/// Embedding options common to every command that extracts features.
#[derive(Args, Debug, Clone)]
pub struct EmbedArgs {
    /// Sequences per batch, or `auto` to size batches by model and device
    #[arg(long, default_value_t = BatchSize::default())]
    pub batch_size: BatchSize,
    /// Memory budget in GB for `--batch-size auto` [default: queried from the CUDA device]
    #[arg(long)]
    pub memory_gb: Option<f64>,
    /// ESM-2 layer whose output is pooled
    #[arg(long, default_value_t = DEFAULT_REPR_LAYER)]
    pub repr_layer: usize,
    /// Run on the CPU even if an accelerator is available
    #[arg(long)]
    pub cpu: bool,
    /// Worker threads for reading FASTA files (default: one per core)
    #[arg(long)]
    pub workers: Option<usize>,
}

impl EmbedArgs {
    pub fn extractor(&self, kind: EmbedderKind) -> Extractor {
        let device = if kind.is_pretrained() {
            select_device(self.cpu)
        } else {
            select_device(true)
        };
        Extractor::new(
            ExtractorConfig {
                kind,
                batch_size: self.batch_size,
                repr_layer: self.repr_layer,
                memory_gb: self.memory_gb,
                progress: std::io::stderr().is_terminal(),
            },
            device,
        )
    }

    pub fn load_options(&self) -> LoadOptions {
        LoadOptions {
            max_workers: self.workers,
        }
    }
}

pub fn banner(title: &str) {
    println!("{}", "=".repeat(50));
    println!("{}", title);
    println!("{}", "=".repeat(50));
}

/// Positives then negatives, each record carrying its label.
///
/// Either set being empty is fatal.
pub fn load_labeled(
    positive_dir: &Path,
    negative_dir: &Path,
    options: &LoadOptions,
) -> Result<Vec<SequenceRecord>> {
    println!("Loading sequences...");
    let positives = load_sequences_from_path(positive_dir, options);
    let negatives = load_sequences_from_path(negative_dir, options);
    println!("  Positive samples: {}", positives.len());
    println!("  Negative samples: {}", negatives.len());

    if positives.is_empty() {
        bail!("No sequences found in {}", positive_dir.display());
    }
    if negatives.is_empty() {
        bail!("No sequences found in {}", negative_dir.display());
    }
    Ok(positives
        .into_iter()
        .map(|r| r.with_label(Label::Adhesion))
        .chain(negatives.into_iter().map(|r| r.with_label(Label::NonAdhesion)))
        .collect())
}

pub fn extract(extractor: &mut Extractor, records: &[SequenceRecord]) -> Result<Embeddings> {
    println!(
        "Extracting embeddings using {}...",
        extractor.config().kind
    );
    let embeddings = extractor.embed(records)?;
    if embeddings.is_empty() {
        bail!("No embeddings extracted");
    }
    println!("  Embedding shape: ({}, {})", embeddings.len(), embeddings.dim());
    Ok(embeddings)
}

/// Labels of the records behind each embedding row, matched by record index.
pub fn labels_for(records: &[SequenceRecord], embeddings: &Embeddings) -> Result<Vec<u8>> {
    embeddings
        .rows()
        .iter()
        .map(|row| match records.get(row.index).and_then(|r| r.label) {
            Some(label) => Ok(label.as_index()),
            None => bail!("Sequence {} has no label", row.id),
        })
        .collect()
}
