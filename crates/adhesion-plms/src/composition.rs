//! Amino acid composition features.
use crate::encoder::SequenceEncoder;
use crate::error::EmbedError;
use adhesion_core::aa_to_index;

/// 20 residue frequencies followed by the scaled length.
pub const COMPOSITION_DIM: usize = 21;

/// Divisor applied to the sequence length feature.
pub const LENGTH_SCALE: f32 = 1000.0;

/// Composition vector of one sequence.
///
/// Frequencies are per [`STANDARD_AMINO_ACIDS`](adhesion_core::STANDARD_AMINO_ACIDS)
/// position and use the full length as denominator, so non-standard residues
/// dilute every bucket without landing in any. An empty sequence is all zeros.
pub fn composition_features(sequence: &str) -> [f32; COMPOSITION_DIM] {
    let mut features = [0f32; COMPOSITION_DIM];
    let length = sequence.chars().count();
    if length == 0 {
        return features;
    }
    for aa in sequence.chars() {
        if let Some(idx) = aa_to_index(aa.to_ascii_uppercase()) {
            features[idx] += 1.0;
        }
    }
    for count in features.iter_mut().take(COMPOSITION_DIM - 1) {
        *count /= length as f32;
    }
    features[COMPOSITION_DIM - 1] = length as f32 / LENGTH_SCALE;
    features
}

/// [`SequenceEncoder`] over [`composition_features`]. Never fails.
#[derive(Debug, Clone, Copy, Default)]
pub struct CompositionEncoder;

impl SequenceEncoder for CompositionEncoder {
    fn dim(&self) -> usize {
        COMPOSITION_DIM
    }
    fn encode(&self, sequences: &[&str]) -> Result<Vec<Vec<f32>>, EmbedError> {
        Ok(sequences
            .iter()
            .map(|seq| composition_features(seq).to_vec())
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_poly_alanine() {
        let features = composition_features("AAAA");
        assert_eq!(features[0], 1.0);
        assert!(features[1..20].iter().all(|&f| f == 0.0));
        assert_eq!(features[20], 4.0 / 1000.0);
    }

    #[test]
    fn test_empty_is_zero() {
        assert_eq!(composition_features(""), [0f32; COMPOSITION_DIM]);
    }

    #[test]
    fn test_nonstandard_residues_ignored() {
        let features = composition_features("AXBZ");
        assert_eq!(features[0], 0.25);
        let total: f32 = features[..20].iter().sum();
        assert!((total - 0.25).abs() < 1e-6);
        assert_eq!(features[20], 0.004);
    }

    #[test]
    fn test_lowercase_counts() {
        assert_eq!(composition_features("mk"), composition_features("MK"));
    }

    #[test]
    fn test_encoder_rows() {
        let rows = CompositionEncoder.encode(&["MK", "", "W"]).unwrap();
        assert_eq!(rows.len(), 3);
        assert!(rows.iter().all(|r| r.len() == CompositionEncoder.dim()));
        assert_eq!(rows[2][18], 1.0);
    }
}
