use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ClassifierError {
    #[error(transparent)]
    Candle(#[from] candle_core::Error),
    #[error("invalid model file: {0}")]
    Safetensors(#[from] safetensors::SafeTensorError),
    #[error("model file not found at {}", path.display())]
    ModelNotFound { path: PathBuf },
    #[error("failed to access {}: {source}", path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("invalid model metadata: {0}")]
    Metadata(String),
    #[error("model expects {expected} features per sample, got {found}")]
    DimensionMismatch { expected: usize, found: usize },
    #[error("{samples} samples but {labels} labels")]
    LengthMismatch { samples: usize, labels: usize },
    #[error("no training samples")]
    Empty,
    #[error("training labels contain a single class")]
    SingleClass,
    #[error("class {label} has {count} samples, at least {needed} are needed")]
    TooFewSamples {
        label: u8,
        count: usize,
        needed: usize,
    },
    #[error("test size must lie strictly between 0 and 1, got {0}")]
    TestSize(f64),
}
