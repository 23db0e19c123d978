use candle_core::{DType, Device, Result, Tensor, D};

/// Rotary position embedding over the head dimension.
///
/// Frequencies follow the half-split layout: the first half of each head is
/// paired with the second half, not interleaved.
#[derive(Debug, Clone)]
pub struct RotaryEmbedding {
    inv_freq: Tensor,
}

impl RotaryEmbedding {
    pub fn new(head_dim: usize, device: &Device) -> Result<Self> {
        let inv_freq: Vec<f32> = (0..head_dim)
            .step_by(2)
            .map(|i| 1f32 / 10000f32.powf(i as f32 / head_dim as f32))
            .collect();
        let inv_freq = Tensor::new(inv_freq, device)?;
        Ok(Self { inv_freq })
    }

    /// `cos` and `sin` tables of shape `[seq_len, head_dim]`.
    fn cos_sin(&self, seq_len: usize) -> Result<(Tensor, Tensor)> {
        let t = Tensor::arange(0u32, seq_len as u32, self.inv_freq.device())?
            .to_dtype(DType::F32)?;
        let freqs = t.unsqueeze(1)?.matmul(&self.inv_freq.unsqueeze(0)?)?;
        let emb = Tensor::cat(&[&freqs, &freqs], D::Minus1)?;
        Ok((emb.cos()?, emb.sin()?))
    }

    /// Rotate queries and keys shaped `[batch, heads, seq_len, head_dim]`.
    pub fn forward(&self, q: &Tensor, k: &Tensor) -> Result<(Tensor, Tensor)> {
        let (cos, sin) = self.cos_sin(k.dim(D::Minus2)?)?;
        Ok((
            apply_rotary_pos_emb(q, &cos, &sin)?,
            apply_rotary_pos_emb(k, &cos, &sin)?,
        ))
    }
}

fn rotate_half(x: &Tensor) -> Result<Tensor> {
    let half = x.dim(D::Minus1)? / 2;
    let x1 = x.narrow(D::Minus1, 0, half)?;
    let x2 = x.narrow(D::Minus1, half, half)?;
    Tensor::cat(&[&x2.neg()?, &x1], D::Minus1)
}

fn apply_rotary_pos_emb(x: &Tensor, cos: &Tensor, sin: &Tensor) -> Result<Tensor> {
    let x_cos = x.broadcast_mul(cos)?;
    let x_sin = rotate_half(x)?.broadcast_mul(sin)?;
    x_cos.add(&x_sin)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_position_is_identity() -> Result<()> {
        let dev = Device::Cpu;
        let rotary = RotaryEmbedding::new(4, &dev)?;
        let q = Tensor::arange(0f32, 24f32, &dev)?.reshape((1, 2, 3, 4))?;
        let (q_rot, k_rot) = rotary.forward(&q, &q)?;
        assert_eq!(q_rot.dims(), &[1, 2, 3, 4]);

        let first: Vec<f32> = q_rot.narrow(2, 0, 1)?.flatten_all()?.to_vec1()?;
        let expected: Vec<f32> = q.narrow(2, 0, 1)?.flatten_all()?.to_vec1()?;
        for (a, b) in first.iter().zip(expected.iter()) {
            assert!((a - b).abs() < 1e-6);
        }
        let diff = q_rot.sub(&k_rot)?.abs()?.sum_all()?.to_scalar::<f32>()?;
        assert_eq!(diff, 0.0);
        Ok(())
    }

    #[test]
    fn test_rotation_preserves_norm() -> Result<()> {
        let dev = Device::Cpu;
        let rotary = RotaryEmbedding::new(8, &dev)?;
        let x = Tensor::ones((1, 1, 5, 8), DType::F32, &dev)?;
        let (rot, _) = rotary.forward(&x, &x)?;
        let norms: Vec<f32> = rot.sqr()?.sum(D::Minus1)?.flatten_all()?.to_vec1()?;
        for norm in norms {
            assert!((norm - 8.0).abs() < 1e-4);
        }
        Ok(())
    }
}
