use serde::{Deserialize, Serialize};

/// Hyper-parameters read from the checkpoint's `config.json`.
///
/// Only the fields the encoder needs are kept; unknown keys are ignored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ESM2Config {
    pub vocab_size: usize,
    pub hidden_size: usize,
    pub num_hidden_layers: usize,
    pub num_attention_heads: usize,
    pub intermediate_size: usize,
    #[serde(default = "default_layer_norm_eps")]
    pub layer_norm_eps: f64,
    #[serde(default = "default_max_position_embeddings")]
    pub max_position_embeddings: usize,
    #[serde(default = "default_token_dropout")]
    pub token_dropout: bool,
    #[serde(default)]
    pub emb_layer_norm_before: Option<bool>,
    #[serde(default = "default_pad_token_id")]
    pub pad_token_id: u32,
    #[serde(default = "default_mask_token_id")]
    pub mask_token_id: u32,
}

fn default_layer_norm_eps() -> f64 {
    1e-5
}
fn default_max_position_embeddings() -> usize {
    1026
}
fn default_token_dropout() -> bool {
    true
}
fn default_pad_token_id() -> u32 {
    1
}
fn default_mask_token_id() -> u32 {
    32
}

impl Default for ESM2Config {
    /// `esm2_t6_8M_UR50D`
    fn default() -> Self {
        Self {
            vocab_size: 33,
            hidden_size: 320,
            num_hidden_layers: 6,
            num_attention_heads: 20,
            intermediate_size: 1280,
            layer_norm_eps: default_layer_norm_eps(),
            max_position_embeddings: default_max_position_embeddings(),
            token_dropout: default_token_dropout(),
            emb_layer_norm_before: Some(false),
            pad_token_id: default_pad_token_id(),
            mask_token_id: default_mask_token_id(),
        }
    }
}

impl ESM2Config {
    pub fn head_dim(&self) -> usize {
        self.hidden_size / self.num_attention_heads
    }
}
