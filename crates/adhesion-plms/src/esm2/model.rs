use super::config::ESM2Config;
use super::rotary::RotaryEmbedding;
use candle_core::{bail, DType, Device, Module, Result, Tensor, D};
use candle_nn::{
    embedding, layer_norm, linear, ops::softmax_last_dim, Embedding, LayerNorm, Linear, VarBuilder,
};

// fraction of tokens masked during pretraining (15% selected, 80% of those masked)
const MASK_RATIO_TRAIN: f64 = 0.15 * 0.8;
// additive attention bias for padding keys
const PAD_BIAS: f64 = -1e9;

#[derive(Debug)]
struct EsmSelfAttention {
    query: Linear,
    key: Linear,
    value: Linear,
    dense: Linear,
    layer_norm: LayerNorm,
    num_heads: usize,
    head_dim: usize,
}

impl EsmSelfAttention {
    fn load(vb: VarBuilder, config: &ESM2Config) -> Result<Self> {
        let hidden = config.hidden_size;
        if hidden % config.num_attention_heads != 0 {
            bail!(
                "hidden size {} is not divisible by {} attention heads",
                hidden,
                config.num_attention_heads
            );
        }
        Ok(Self {
            query: linear(hidden, hidden, vb.pp("self.query"))?,
            key: linear(hidden, hidden, vb.pp("self.key"))?,
            value: linear(hidden, hidden, vb.pp("self.value"))?,
            dense: linear(hidden, hidden, vb.pp("output.dense"))?,
            layer_norm: layer_norm(hidden, config.layer_norm_eps, vb.pp("LayerNorm"))?,
            num_heads: config.num_attention_heads,
            head_dim: config.head_dim(),
        })
    }

    fn split_heads(&self, x: &Tensor) -> Result<Tensor> {
        let (b, l, _) = x.dims3()?;
        x.reshape((b, l, self.num_heads, self.head_dim))?
            .transpose(1, 2)?
            .contiguous()
    }

    /// Pre-norm attention with residual. `pad_bias` is `[batch, 1, 1, seq_len]`.
    fn forward(&self, x: &Tensor, pad_bias: &Tensor, rotary: &RotaryEmbedding) -> Result<Tensor> {
        let (b, l, hidden) = x.dims3()?;
        let normed = self.layer_norm.forward(x)?;
        let q = (self.split_heads(&self.query.forward(&normed)?)?
            * (self.head_dim as f64).powf(-0.5))?;
        let k = self.split_heads(&self.key.forward(&normed)?)?;
        let v = self.split_heads(&self.value.forward(&normed)?)?;
        let (q, k) = rotary.forward(&q, &k)?;

        let scores = q
            .matmul(&k.transpose(D::Minus2, D::Minus1)?.contiguous()?)?
            .broadcast_add(pad_bias)?;
        let probs = softmax_last_dim(&scores)?;
        let context = probs
            .matmul(&v)?
            .transpose(1, 2)?
            .reshape((b, l, hidden))?;
        self.dense.forward(&context)?.add(x)
    }
}

#[derive(Debug)]
struct EsmLayer {
    attention: EsmSelfAttention,
    layer_norm: LayerNorm,
    intermediate: Linear,
    output: Linear,
}

impl EsmLayer {
    fn load(vb: VarBuilder, config: &ESM2Config) -> Result<Self> {
        let hidden = config.hidden_size;
        Ok(Self {
            attention: EsmSelfAttention::load(vb.pp("attention"), config)?,
            layer_norm: layer_norm(hidden, config.layer_norm_eps, vb.pp("LayerNorm"))?,
            intermediate: linear(
                hidden,
                config.intermediate_size,
                vb.pp("intermediate.dense"),
            )?,
            output: linear(config.intermediate_size, hidden, vb.pp("output.dense"))?,
        })
    }

    fn forward(&self, x: &Tensor, pad_bias: &Tensor, rotary: &RotaryEmbedding) -> Result<Tensor> {
        let x = self.attention.forward(x, pad_bias, rotary)?;
        let h = self.layer_norm.forward(&x)?;
        let h = self.intermediate.forward(&h)?.gelu_erf()?;
        self.output.forward(&h)?.add(&x)
    }
}

/// The ESM-2 encoder stack, without the language-model and contact heads.
///
/// - [HF modeling_esm](https://github.com/huggingface/transformers/blob/main/src/transformers/models/esm/modeling_esm.py)
/// - [fair-esm esm2.py](https://github.com/facebookresearch/esm/blob/main/esm/model/esm2.py)
///
#[derive(Debug)]
pub struct ESM2 {
    word_embeddings: Embedding,
    emb_layer_norm_before: Option<LayerNorm>,
    layers: Vec<EsmLayer>,
    emb_layer_norm_after: LayerNorm,
    rotary: RotaryEmbedding,
    config: ESM2Config,
}

impl ESM2 {
    /// Load from a `transformers` checkpoint. Both the `EsmForMaskedLM`
    /// layout (`esm.` prefix) and the bare `EsmModel` layout are accepted.
    pub fn load(vb: VarBuilder, config: &ESM2Config) -> Result<Self> {
        let vb = if vb.contains_tensor("esm.embeddings.word_embeddings.weight") {
            vb.pp("esm")
        } else {
            vb
        };
        let hidden = config.hidden_size;
        let word_embeddings = embedding(
            config.vocab_size,
            hidden,
            vb.pp("embeddings.word_embeddings"),
        )?;
        let emb_layer_norm_before = match config.emb_layer_norm_before {
            Some(true) => Some(layer_norm(
                hidden,
                config.layer_norm_eps,
                vb.pp("embeddings.layer_norm"),
            )?),
            _ => None,
        };
        let vb_layers = vb.pp("encoder.layer");
        let layers = (0..config.num_hidden_layers)
            .map(|i| EsmLayer::load(vb_layers.pp(i), config))
            .collect::<Result<Vec<_>>>()?;
        let emb_layer_norm_after = layer_norm(
            hidden,
            config.layer_norm_eps,
            vb.pp("encoder.emb_layer_norm_after"),
        )?;
        let rotary = RotaryEmbedding::new(config.head_dim(), vb.device())?;
        Ok(Self {
            word_embeddings,
            emb_layer_norm_before,
            layers,
            emb_layer_norm_after,
            rotary,
            config: config.clone(),
        })
    }

    pub fn config(&self) -> &ESM2Config {
        &self.config
    }

    pub fn num_layers(&self) -> usize {
        self.layers.len()
    }

    pub fn device(&self) -> &Device {
        self.word_embeddings.embeddings().device()
    }

    /// `1.0` at real tokens and `0.0` at padding, shape `[batch, seq_len]`.
    pub fn attention_mask(&self, tokens: &Tensor) -> Result<Tensor> {
        tokens.ne(self.config.pad_token_id)?.to_dtype(DType::F32)
    }

    fn embed(&self, tokens: &Tensor, attention_mask: &Tensor) -> Result<Tensor> {
        let mut x = self.word_embeddings.forward(tokens)?;
        if self.config.token_dropout {
            // masked positions are zeroed and the rest rescaled to the
            // pretraining mask ratio
            let is_mask = tokens.eq(self.config.mask_token_id)?.to_dtype(DType::F32)?;
            x = x.broadcast_mul(&is_mask.affine(-1.0, 1.0)?.unsqueeze(2)?)?;
            let observed = is_mask
                .sum_keepdim(1)?
                .div(&attention_mask.sum_keepdim(1)?)?;
            let scale = observed
                .affine(-1.0, 1.0)?
                .recip()?
                .affine(1.0 - MASK_RATIO_TRAIN, 0.0)?;
            x = x.broadcast_mul(&scale.unsqueeze(2)?)?;
        }
        if let Some(ln) = &self.emb_layer_norm_before {
            x = ln.forward(&x)?;
        }
        x.broadcast_mul(&attention_mask.unsqueeze(2)?)
    }

    /// Hidden states after `repr_layer` transformer layers, `[batch, seq_len, hidden]`.
    ///
    /// Layer 0 is the embedding output. The final layer norm is applied only
    /// when `repr_layer` is the last layer, matching the representations
    /// reported by fair-esm.
    pub fn forward(&self, tokens: &Tensor, repr_layer: usize) -> Result<Tensor> {
        if repr_layer > self.layers.len() {
            bail!(
                "repr_layer {} exceeds the {} layers of the model",
                repr_layer,
                self.layers.len()
            );
        }
        let attention_mask = self.attention_mask(tokens)?;
        let pad_bias = attention_mask
            .affine(-PAD_BIAS, PAD_BIAS)?
            .unsqueeze(1)?
            .unsqueeze(1)?;
        let mut x = self.embed(tokens, &attention_mask)?;
        for layer in self.layers.iter().take(repr_layer) {
            x = layer.forward(&x, &pad_bias, &self.rotary)?;
        }
        if repr_layer == self.layers.len() {
            x = self.emb_layer_norm_after.forward(&x)?;
        }
        Ok(x)
    }
}

/// Mean over the positions where `attention_mask` is one.
///
/// `hidden_states` is `[batch, seq_len, hidden]` and `attention_mask`
/// `[batch, seq_len]`; the result is `[batch, hidden]`.
pub fn masked_mean_pool(hidden_states: &Tensor, attention_mask: &Tensor) -> Result<Tensor> {
    let mask = attention_mask.to_dtype(hidden_states.dtype())?.unsqueeze(2)?;
    let summed = hidden_states.broadcast_mul(&mask)?.sum(1)?;
    let counts = (mask.sum(1)? + 1e-9)?;
    summed.broadcast_div(&counts)
}

#[cfg(test)]
mod tests {
    use super::*;
    use candle_nn::VarMap;

    fn tiny_config() -> ESM2Config {
        ESM2Config {
            hidden_size: 8,
            num_hidden_layers: 2,
            num_attention_heads: 2,
            intermediate_size: 16,
            ..ESM2Config::default()
        }
    }

    fn tiny_model() -> Result<(ESM2, VarMap)> {
        let varmap = VarMap::new();
        let vb = VarBuilder::from_varmap(&varmap, DType::F32, &Device::Cpu);
        let model = ESM2::load(vb, &tiny_config())?;
        Ok((model, varmap))
    }

    #[test]
    fn test_forward_shapes() -> Result<()> {
        let (model, _varmap) = tiny_model()?;
        // <cls> M K <eos> / <cls> A <eos> <pad>
        let tokens = Tensor::new(&[[0u32, 20, 15, 2], [0, 5, 2, 1]], &Device::Cpu)?;
        for layer in 0..=model.num_layers() {
            let hidden = model.forward(&tokens, layer)?;
            assert_eq!(hidden.dims(), &[2, 4, 8]);
        }
        assert!(model.forward(&tokens, 3).is_err());
        Ok(())
    }

    #[test]
    fn test_padding_does_not_change_pooled_output() -> Result<()> {
        let (model, _varmap) = tiny_model()?;
        let dev = Device::Cpu;
        let alone = Tensor::new(&[[0u32, 5, 7, 2]], &dev)?;
        let padded = Tensor::new(&[[0u32, 5, 7, 2, 1, 1]], &dev)?;

        let pool = |tokens: &Tensor| -> Result<Vec<f32>> {
            let hidden = model.forward(tokens, model.num_layers())?;
            let mask = model.attention_mask(tokens)?;
            masked_mean_pool(&hidden, &mask)?.squeeze(0)?.to_vec1()
        };
        let a = pool(&alone)?;
        let b = pool(&padded)?;
        for (x, y) in a.iter().zip(b.iter()) {
            assert!((x - y).abs() < 1e-4, "{} vs {}", x, y);
        }
        Ok(())
    }

    #[test]
    fn test_masked_mean_pool() -> Result<()> {
        let dev = Device::Cpu;
        let hidden = Tensor::new(&[[[1f32, 2.], [3., 4.], [100., 100.]]], &dev)?;
        let mask = Tensor::new(&[[1f32, 1., 0.]], &dev)?;
        let pooled: Vec<Vec<f32>> = masked_mean_pool(&hidden, &mask)?.to_vec2()?;
        assert!((pooled[0][0] - 2.0).abs() < 1e-6);
        assert!((pooled[0][1] - 3.0).abs() < 1e-6);
        Ok(())
    }
}
