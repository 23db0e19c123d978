//! ESM-2
//!
//! Candle port of the ESM-2 protein language model encoder, loading the
//! HuggingFace `transformers` checkpoints.
//!
//! - [GH fair-esm](https://github.com/facebookresearch/esm)
//! - [HF - 8M Model](https://huggingface.co/facebook/esm2_t6_8M_UR50D)
//! - [Paper](https://www.science.org/doi/10.1126/science.ade2574)
//!
pub mod config;
pub mod model;
pub mod rotary;
pub mod tokenizer;
