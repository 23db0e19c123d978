use crate::batching::BatchSize;
use crate::cache::{CachePolicy, ModelCache};
use crate::composition::CompositionEncoder;
use crate::device::{accelerator_memory_gb, DeviceKey};
use crate::encoder::{Esm2Encoder, SequenceEncoder, DEFAULT_REPR_LAYER};
use crate::error::EmbedError;
use crate::esm2::model::ESM2;
use crate::EmbedderKind;
use adhesion_core::SequenceRecord;
use candle_core::Device;
use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};
use ndarray::Array2;
use tracing::{info, warn};

/// Builds an ESM-2 model for a kind on a device.
pub type ModelLoader = fn(EmbedderKind, &Device) -> Result<ESM2, EmbedError>;

/// Reports the memory, in GB, available to batches on a device.
pub type MemoryProbe = fn(&Device) -> Option<f64>;

/// One surviving embedding. `index` is the position of the record in the
/// slice handed to [`Extractor::embed`].
#[derive(Debug, Clone, PartialEq)]
pub struct EmbeddingRow {
    pub index: usize,
    pub id: String,
    pub vector: Vec<f32>,
}

/// Embedding rows in input order, minus the records of failed batches.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Embeddings {
    dim: usize,
    rows: Vec<EmbeddingRow>,
}

impl Embeddings {
    pub fn dim(&self) -> usize {
        self.dim
    }
    pub fn len(&self) -> usize {
        self.rows.len()
    }
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
    pub fn rows(&self) -> &[EmbeddingRow] {
        &self.rows
    }
    pub fn indices(&self) -> Vec<usize> {
        self.rows.iter().map(|row| row.index).collect()
    }
    pub fn ids(&self) -> Vec<&str> {
        self.rows.iter().map(|row| row.id.as_str()).collect()
    }

    /// `[rows, dim]` feature matrix.
    pub fn to_array(&self) -> Array2<f32> {
        Array2::from_shape_fn((self.rows.len(), self.dim), |(i, j)| self.rows[i].vector[j])
    }
}

#[derive(Debug, Clone)]
pub struct ExtractorConfig {
    pub kind: EmbedderKind,
    pub batch_size: BatchSize,
    pub repr_layer: usize,
    /// Memory budget for [`BatchSize::Auto`]; queried from the device when unset.
    pub memory_gb: Option<f64>,
    pub progress: bool,
}

impl Default for ExtractorConfig {
    fn default() -> Self {
        Self {
            kind: EmbedderKind::default(),
            batch_size: BatchSize::default(),
            repr_layer: DEFAULT_REPR_LAYER,
            memory_gb: None,
            progress: true,
        }
    }
}

/// Turns sequence records into embeddings, keeping loaded models around
/// between calls.
pub struct Extractor {
    config: ExtractorConfig,
    device: Device,
    cache: ModelCache<ESM2>,
    loader: ModelLoader,
    memory_probe: MemoryProbe,
}

impl Extractor {
    pub fn new(config: ExtractorConfig, device: Device) -> Self {
        Self {
            config,
            device,
            cache: ModelCache::new(CachePolicy::default()),
            loader: ESM2::load_from_huggingface,
            memory_probe: accelerator_memory_gb,
        }
    }

    pub fn with_cache_policy(mut self, policy: CachePolicy) -> Self {
        self.cache = ModelCache::new(policy);
        self
    }

    /// Replace the HuggingFace download with another way of building models.
    pub fn with_loader(mut self, loader: ModelLoader) -> Self {
        self.loader = loader;
        self
    }

    pub fn with_memory_probe(mut self, probe: MemoryProbe) -> Self {
        self.memory_probe = probe;
        self
    }

    pub fn config(&self) -> &ExtractorConfig {
        &self.config
    }
    pub fn device(&self) -> &Device {
        &self.device
    }
    pub fn cache(&self) -> &ModelCache<ESM2> {
        &self.cache
    }
    pub fn cache_mut(&mut self) -> &mut ModelCache<ESM2> {
        &mut self.cache
    }

    pub fn set_kind(&mut self, kind: EmbedderKind) {
        self.config.kind = kind;
    }

    /// Sequences per batch. `auto` uses the configured memory budget, else
    /// whatever the device reports.
    pub fn batch_size(&self) -> usize {
        let memory_gb = match self.config.batch_size {
            BatchSize::Auto => self
                .config
                .memory_gb
                .or_else(|| (self.memory_probe)(&self.device)),
            BatchSize::Fixed(_) => None,
        };
        self.config.batch_size.resolve(self.config.kind, memory_gb)
    }

    /// Encoder for the configured kind, loading the model on first use.
    pub fn encoder(&mut self) -> Result<Box<dyn SequenceEncoder>, EmbedError> {
        let kind = self.config.kind;
        if !kind.is_pretrained() {
            return Ok(Box::new(CompositionEncoder));
        }
        let key = (kind, DeviceKey::from(&self.device));
        let device = &self.device;
        let loader = self.loader;
        let model = self
            .cache
            .get_or_try_insert_with(key, || loader(kind, device))?;
        Ok(Box::new(Esm2Encoder::new(model, self.config.repr_layer)?))
    }

    /// Embed `records` in batches.
    ///
    /// Only a model that cannot be loaded is an error. A batch that fails
    /// to encode is logged and its records are left out.
    pub fn embed(&mut self, records: &[SequenceRecord]) -> Result<Embeddings, EmbedError> {
        let batch_size = self.batch_size();
        let show_progress = self.config.progress;
        let encoder = self.encoder()?;
        info!(
            "Extracting {} embeddings for {} sequences (batch size {})",
            self.config.kind,
            records.len(),
            batch_size
        );
        Ok(embed_with(encoder.as_ref(), records, batch_size, show_progress))
    }
}

fn progress_bar(batches: usize, show: bool) -> ProgressBar {
    let bar = ProgressBar::with_draw_target(Some(batches as u64), ProgressDrawTarget::stderr());
    if !show {
        bar.set_draw_target(ProgressDrawTarget::hidden());
    }
    if let Ok(style) =
        ProgressStyle::default_bar().template("{msg} [{bar:40.cyan/blue}] {pos}/{len} batches")
    {
        bar.set_style(style.progress_chars("=> "));
    }
    bar.set_message("Embedding");
    bar
}

/// Run `encoder` over `records` in chunks of `batch_size`.
///
/// Rows keep the position of their record in `records`. A batch that errors,
/// or returns the wrong number or width of rows, contributes nothing.
pub fn embed_with(
    encoder: &dyn SequenceEncoder,
    records: &[SequenceRecord],
    batch_size: usize,
    show_progress: bool,
) -> Embeddings {
    let batch_size = batch_size.max(1);
    let dim = encoder.dim();
    let bar = progress_bar(records.len().div_ceil(batch_size), show_progress);
    let mut rows = Vec::with_capacity(records.len());

    for (batch_idx, chunk) in records.chunks(batch_size).enumerate() {
        let start = batch_idx * batch_size;
        let sequences: Vec<&str> = chunk.iter().map(|r| r.sequence.as_str()).collect();
        match encoder.encode(&sequences) {
            Ok(vectors)
                if vectors.len() == chunk.len() && vectors.iter().all(|v| v.len() == dim) =>
            {
                rows.extend(chunk.iter().zip(vectors).enumerate().map(
                    |(offset, (record, vector))| EmbeddingRow {
                        index: start + offset,
                        id: record.id.clone(),
                        vector,
                    },
                ));
            }
            Ok(vectors) => warn!(
                "Batch {} returned {} malformed rows for {} sequences, skipping",
                batch_idx,
                vectors.len(),
                chunk.len()
            ),
            Err(e) => warn!(
                "Error processing batch {} (sequences {}..{}): {}",
                batch_idx,
                start,
                start + chunk.len(),
                e
            ),
        }
        bar.inc(1);
    }
    bar.finish_and_clear();

    if rows.len() < records.len() {
        warn!(
            "{} of {} sequences produced no embedding",
            records.len() - rows.len(),
            records.len()
        );
    }
    Embeddings { dim, rows }
}
