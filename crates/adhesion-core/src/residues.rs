//! Amino acid alphabet and sequence cleanup.

/// The 20 standard amino acids, alphabetical by one-letter code.
pub const STANDARD_AMINO_ACIDS: [char; 20] = [
    'A', 'C', 'D', 'E', 'F', 'G', 'H', 'I', 'K', 'L', 'M', 'N', 'P', 'Q', 'R', 'S', 'T', 'V', 'W',
    'Y',
];

#[rustfmt::skip]
/// Position of a residue in [`STANDARD_AMINO_ACIDS`]. Expects upper case.
pub fn aa_to_index(aa: char) -> Option<usize> {
    match aa {
        'A' => Some(0),  'C' => Some(1),  'D' => Some(2),
        'E' => Some(3),  'F' => Some(4),  'G' => Some(5),
        'H' => Some(6),  'I' => Some(7),  'K' => Some(8),
        'L' => Some(9),  'M' => Some(10), 'N' => Some(11),
        'P' => Some(12), 'Q' => Some(13), 'R' => Some(14),
        'S' => Some(15), 'T' => Some(16), 'V' => Some(17),
        'W' => Some(18), 'Y' => Some(19), _   => None,
    }
}

/// Clean a raw sequence as read from disk.
///
/// `J` (leucine or isoleucine) becomes `L` and stop symbols (`*`) are dropped.
/// Everything else, including case, is left alone.
pub fn normalize_residues(sequence: &str) -> String {
    sequence
        .chars()
        .filter(|&c| c != '*')
        .map(|c| match c {
            'J' | 'j' => 'L',
            other => other,
        })
        .collect()
}
