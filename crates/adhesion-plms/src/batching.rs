use crate::EmbedderKind;
use std::fmt;
use std::str::FromStr;

pub const DEFAULT_BATCH_SIZE: usize = 8;

// memory the base table is sized for
const REFERENCE_MEMORY_GB: f64 = 8.0;

/// How many sequences go through the encoder at once.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BatchSize {
    Fixed(usize),
    /// Chosen per model and device by [`auto_batch_size`].
    Auto,
}

impl Default for BatchSize {
    fn default() -> Self {
        BatchSize::Fixed(DEFAULT_BATCH_SIZE)
    }
}

impl FromStr for BatchSize {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.eq_ignore_ascii_case("auto") {
            return Ok(BatchSize::Auto);
        }
        match s.parse::<usize>() {
            Ok(0) => Err("batch size must be at least 1".to_string()),
            Ok(n) => Ok(BatchSize::Fixed(n)),
            Err(_) => Err(format!("expected a positive integer or `auto`, got `{}`", s)),
        }
    }
}

impl fmt::Display for BatchSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BatchSize::Fixed(n) => write!(f, "{}", n),
            BatchSize::Auto => write!(f, "auto"),
        }
    }
}

impl BatchSize {
    pub fn resolve(&self, kind: EmbedderKind, memory_gb: Option<f64>) -> usize {
        match self {
            BatchSize::Fixed(n) => (*n).max(1),
            BatchSize::Auto => auto_batch_size(kind, memory_gb),
        }
    }
}

fn base_batch_size(kind: EmbedderKind) -> usize {
    match kind {
        EmbedderKind::Composition => 1024,
        EmbedderKind::ESM2_T6_8M => 64,
        EmbedderKind::ESM2_T12_35M => 32,
        EmbedderKind::ESM2_T30_150M => 16,
        EmbedderKind::ESM2_T33_650M => 4,
    }
}

/// Batch size heuristic: smaller models get larger batches.
///
/// Without a memory figure (the CPU, or an accelerator that cannot be
/// queried) the base table is used as is. Otherwise it is scaled by
/// `memory_gb / 8`, never below one.
pub fn auto_batch_size(kind: EmbedderKind, memory_gb: Option<f64>) -> usize {
    let base = base_batch_size(kind);
    match memory_gb {
        Some(gb) if gb > 0.0 => {
            ((base as f64 * gb / REFERENCE_MEMORY_GB).floor() as usize).max(1)
        }
        _ => base,
    }
}
