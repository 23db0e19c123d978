use crate::error::EmbedError;
use crate::esm2::config::ESM2Config;
use crate::esm2::model::{masked_mean_pool, ESM2};
use crate::esm2::tokenizer::EsmTokenizer;
use crate::EmbedderKind;
use candle_core::{DType, Device};
use candle_nn::VarBuilder;
use hf_hub::{api::sync::Api, Repo, RepoType};
use std::sync::Arc;
use tracing::info;

/// Hidden layer whose output is pooled into the embedding.
pub const DEFAULT_REPR_LAYER: usize = 6;

/// Turns a batch of residue strings into one vector each.
pub trait SequenceEncoder {
    /// Length of every returned vector.
    fn dim(&self) -> usize;
    /// One row per input, in input order. Errors apply to the whole batch.
    fn encode(&self, sequences: &[&str]) -> Result<Vec<Vec<f32>>, EmbedError>;
}

impl ESM2 {
    /// Fetch `config.json` and the weights of `kind` from the HuggingFace hub.
    ///
    /// `model.safetensors` is preferred; checkpoints that only publish
    /// `pytorch_model.bin` are read through candle's pickle loader.
    pub fn load_from_huggingface(kind: EmbedderKind, device: &Device) -> Result<Self, EmbedError> {
        let model_id = kind.repo_id().ok_or(EmbedError::NotPretrained { kind })?;
        info!("Loading ESM-2 model: {}...", model_id);
        let repo = Repo::with_revision(model_id, RepoType::Model, "main".to_string());
        let api = Api::new()?;
        let api = api.repo(repo);
        let config_filename = api.get("config.json")?;
        let config: ESM2Config = serde_json::from_str(&std::fs::read_to_string(config_filename)?)?;

        let vb = match api.get("model.safetensors") {
            Ok(weights) => unsafe {
                VarBuilder::from_mmaped_safetensors(&[weights], DType::F32, device)?
            },
            Err(e) => {
                info!("No safetensors weights ({}), trying pytorch_model.bin", e);
                let weights = api.get("pytorch_model.bin")?;
                VarBuilder::from_pth(weights, DType::F32, device)?
            }
        };
        Ok(ESM2::load(vb, &config)?)
    }
}

/// Mean-pooled ESM-2 hidden states.
///
/// The mean runs over the non-padding positions of each row (`<cls>`, the
/// residues and `<eos>`). fair-esm scripts that call `.mean(dim=1)` on a
/// padded batch also average the `<pad>` columns, so their vectors differ
/// from these for every sequence shorter than the longest in its batch.
#[derive(Clone)]
pub struct Esm2Encoder {
    model: Arc<ESM2>,
    tokenizer: EsmTokenizer,
    repr_layer: usize,
}

impl Esm2Encoder {
    /// Fails when `repr_layer` is deeper than the model.
    pub fn new(model: Arc<ESM2>, repr_layer: usize) -> Result<Self, EmbedError> {
        if repr_layer > model.num_layers() {
            return Err(EmbedError::ReprLayer {
                requested: repr_layer,
                available: model.num_layers(),
            });
        }
        Ok(Self {
            model,
            tokenizer: EsmTokenizer::load()?,
            repr_layer,
        })
    }
}

impl SequenceEncoder for Esm2Encoder {
    fn dim(&self) -> usize {
        self.model.config().hidden_size
    }

    fn encode(&self, sequences: &[&str]) -> Result<Vec<Vec<f32>>, EmbedError> {
        if sequences.is_empty() {
            return Ok(Vec::new());
        }
        let tokens = self
            .tokenizer
            .encode_batch(sequences, self.model.device())?;
        let hidden = self.model.forward(&tokens, self.repr_layer)?;
        let mask = self.model.attention_mask(&tokens)?;
        let pooled = masked_mean_pool(&hidden, &mask)?;
        Ok(pooled.to_dtype(DType::F32)?.to_vec2()?)
    }
}
