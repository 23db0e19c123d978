//! The 33-token ESM alphabet.
//!
//! The vocabulary ships with the crate as `tokenizer.json` and is loaded from
//! memory. Residues are fed to the tokenizer one per word, then framed as
//! `<cls> residues <eos>` and right padded with `<pad>`.
use crate::error::EmbedError;
use candle_core::{Device, Tensor};
use itertools::Itertools;
use tokenizers::Tokenizer;

/// Residues kept per sequence. Two more positions go to `<cls>` and `<eos>`.
pub const MAX_RESIDUES: usize = 1022;

#[derive(Clone)]
pub struct EsmTokenizer {
    tokenizer: Tokenizer,
    cls_id: u32,
    eos_id: u32,
    pad_id: u32,
}

impl EsmTokenizer {
    pub fn load() -> Result<Self, EmbedError> {
        let tokenizer_bytes = include_bytes!("tokenizer.json");
        let tokenizer = Tokenizer::from_bytes(tokenizer_bytes)
            .map_err(|e| EmbedError::Tokenizer(format!("Failed to load tokenizer: {}", e)))?;
        let special = |token: &str| {
            tokenizer
                .token_to_id(token)
                .ok_or_else(|| EmbedError::Tokenizer(format!("Missing {} token", token)))
        };
        let cls_id = special("<cls>")?;
        let eos_id = special("<eos>")?;
        let pad_id = special("<pad>")?;
        Ok(Self {
            tokenizer,
            cls_id,
            eos_id,
            pad_id,
        })
    }

    pub fn pad_id(&self) -> u32 {
        self.pad_id
    }

    pub fn vocab_size(&self) -> usize {
        self.tokenizer.get_vocab_size(true)
    }

    /// Token ids of one sequence, truncated to [`MAX_RESIDUES`] and framed.
    pub fn encode(&self, sequence: &str) -> Result<Vec<u32>, EmbedError> {
        let spaced = sequence
            .chars()
            .take(MAX_RESIDUES)
            .map(|c| c.to_ascii_uppercase())
            .join(" ");
        let encoding = self
            .tokenizer
            .encode(spaced, false)
            .map_err(|e| EmbedError::Tokenizer(e.to_string()))?;
        let mut ids = Vec::with_capacity(encoding.len() + 2);
        ids.push(self.cls_id);
        ids.extend_from_slice(encoding.get_ids());
        ids.push(self.eos_id);
        Ok(ids)
    }

    /// `[batch, longest]` tensor of token ids, padded on the right.
    pub fn encode_batch(&self, sequences: &[&str], device: &Device) -> Result<Tensor, EmbedError> {
        let encoded = sequences
            .iter()
            .map(|seq| self.encode(seq))
            .collect::<Result<Vec<_>, _>>()?;
        let width = encoded.iter().map(Vec::len).max().unwrap_or(0);
        let flat: Vec<u32> = encoded
            .into_iter()
            .flat_map(|mut ids| {
                ids.resize(width, self.pad_id);
                ids
            })
            .collect();
        Ok(Tensor::from_vec(flat, (sequences.len(), width), device)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_alphabet() {
        let tokenizer = EsmTokenizer::load().unwrap();
        assert_eq!(tokenizer.vocab_size(), 33);
        assert_eq!(tokenizer.pad_id(), 1);
        // <cls> M S E Q <eos>
        assert_eq!(tokenizer.encode("MSEQ").unwrap(), vec![0, 20, 8, 9, 16, 2]);
        assert_eq!(tokenizer.encode("mseq").unwrap(), vec![0, 20, 8, 9, 16, 2]);
        assert_eq!(tokenizer.encode("").unwrap(), vec![0, 2]);
        // unknown symbols map to <unk>
        assert_eq!(tokenizer.encode("1").unwrap(), vec![0, 3, 2]);
    }

    #[test]
    fn test_truncation() {
        let tokenizer = EsmTokenizer::load().unwrap();
        let long = "A".repeat(MAX_RESIDUES + 50);
        let ids = tokenizer.encode(&long).unwrap();
        assert_eq!(ids.len(), MAX_RESIDUES + 2);
        assert_eq!(ids.last(), Some(&2));
    }

    #[test]
    fn test_batch_padding() {
        let tokenizer = EsmTokenizer::load().unwrap();
        let batch = tokenizer
            .encode_batch(&["MK", "MKLV"], &Device::Cpu)
            .unwrap();
        assert_eq!(batch.dims(), &[2, 6]);
        let rows: Vec<Vec<u32>> = batch.to_vec2().unwrap();
        assert_eq!(rows[0], vec![0, 20, 15, 2, 1, 1]);
        assert_eq!(rows[1], vec![0, 20, 15, 4, 7, 2]);
    }
}
