use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString, IntoStaticStr};

/// The embedding strategies that can back a classifier.
///
/// The string forms are the model names used on the command line and stored
/// in saved classifiers.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Default,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    EnumIter,
    IntoStaticStr,
    clap::ValueEnum,
)]
#[allow(non_camel_case_types)]
pub enum EmbedderKind {
    #[strum(serialize = "composition")]
    #[serde(rename = "composition")]
    #[value(name = "composition")]
    Composition,
    #[default]
    #[strum(serialize = "esm2_t6_8M_UR50D")]
    #[serde(rename = "esm2_t6_8M_UR50D")]
    #[value(name = "esm2_t6_8M_UR50D")]
    ESM2_T6_8M,
    #[strum(serialize = "esm2_t12_35M_UR50D")]
    #[serde(rename = "esm2_t12_35M_UR50D")]
    #[value(name = "esm2_t12_35M_UR50D")]
    ESM2_T12_35M,
    #[strum(serialize = "esm2_t30_150M_UR50D")]
    #[serde(rename = "esm2_t30_150M_UR50D")]
    #[value(name = "esm2_t30_150M_UR50D")]
    ESM2_T30_150M,
    #[strum(serialize = "esm2_t33_650M_UR50D")]
    #[serde(rename = "esm2_t33_650M_UR50D")]
    #[value(name = "esm2_t33_650M_UR50D")]
    ESM2_T33_650M,
}

impl EmbedderKind {
    pub fn name(&self) -> &'static str {
        self.into()
    }
    pub fn is_pretrained(&self) -> bool {
        !matches!(self, EmbedderKind::Composition)
    }
    /// HuggingFace repository holding the weights.
    pub fn repo_id(&self) -> Option<String> {
        self.is_pretrained()
            .then(|| format!("facebook/{}", self.name()))
    }
    pub fn num_layers(&self) -> usize {
        match self {
            EmbedderKind::Composition => 0,
            EmbedderKind::ESM2_T6_8M => 6,
            EmbedderKind::ESM2_T12_35M => 12,
            EmbedderKind::ESM2_T30_150M => 30,
            EmbedderKind::ESM2_T33_650M => 33,
        }
    }
    /// Length of the vectors this strategy produces.
    pub fn dim(&self) -> usize {
        match self {
            EmbedderKind::Composition => crate::COMPOSITION_DIM,
            EmbedderKind::ESM2_T6_8M => 320,
            EmbedderKind::ESM2_T12_35M => 480,
            EmbedderKind::ESM2_T30_150M => 640,
            EmbedderKind::ESM2_T33_650M => 1280,
        }
    }
}
