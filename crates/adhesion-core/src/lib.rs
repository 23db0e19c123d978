//! # adhesion-core
//!
//! Shared types for the adhesion prediction pipeline.
//!
//! * [`SequenceRecord`] - a protein sequence as read from a FASTA file, optionally labeled.
//! * [`Label`] - the two classes the classifier distinguishes.
//! * [`Prediction`] - a scored classification of one sequence.
//!
//! Residue handling (the amino acid alphabet and the cleanup applied to every
//! sequence on load) lives in [`residues`].
//!
mod record;
pub mod residues;

pub use self::record::{Label, Prediction, SequenceRecord};
pub use self::residues::{aa_to_index, normalize_residues, STANDARD_AMINO_ACIDS};
