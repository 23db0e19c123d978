use thiserror::Error;

#[derive(Debug, Error)]
pub enum EmbedError {
    #[error(transparent)]
    Candle(#[from] candle_core::Error),
    #[error("model download failed: {0}")]
    Hub(#[from] hf_hub::api::sync::ApiError),
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error("invalid model config: {0}")]
    Config(#[from] serde_json::Error),
    #[error("tokenizer error: {0}")]
    Tokenizer(String),
    #[error("{kind} has no pretrained weights")]
    NotPretrained { kind: crate::EmbedderKind },
    #[error("representation layer {requested} out of range, model has {available} layers")]
    ReprLayer { requested: usize, available: usize },
}
