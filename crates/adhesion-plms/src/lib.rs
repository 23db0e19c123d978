//! adhesion-plms
//!
//! Fixed-length sequence representations for the adhesion classifier.
//!
//! - amino acid composition: 20 frequencies plus scaled length
//! - [ESM-2](https://github.com/facebookresearch/esm) mean-pooled hidden states, run with candle
//!
//! ```shell
//! cargo test -p adhesion-plms
//! cargo test -p adhesion-plms --features metal -- --ignored
//! ```
//!
//!
pub use batching::{auto_batch_size, BatchSize, DEFAULT_BATCH_SIZE};
pub use cache::{CacheKey, CachePolicy, ModelCache};
pub use composition::{composition_features, CompositionEncoder, COMPOSITION_DIM, LENGTH_SCALE};
pub use device::{accelerator_memory_gb, select_device, DeviceKey};
pub use encoder::{Esm2Encoder, SequenceEncoder, DEFAULT_REPR_LAYER};
pub use error::EmbedError;
pub use esm2::config::ESM2Config;
pub use esm2::model::ESM2;
pub use esm2::tokenizer::{EsmTokenizer, MAX_RESIDUES};
pub use extractor::{
    embed_with, EmbeddingRow, Embeddings, Extractor, ExtractorConfig, MemoryProbe, ModelLoader,
};
pub use kind::EmbedderKind;

pub mod esm2;
mod batching;
mod cache;
mod composition;
mod device;
mod encoder;
mod error;
mod extractor;
mod kind;
