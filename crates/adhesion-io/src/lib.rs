//! # adhesion-io
//!
//! Reading protein sequences from disk and writing predictions back out.
//!
//! * [`find_fasta_files`] - recursive, case-insensitive discovery of FASTA files
//!   (plain or gzipped) by extension.
//! * [`load_fasta_file`] / [`load_sequences`] - tolerant parsing into
//!   [`SequenceRecord`](adhesion_core::SequenceRecord)s. A bad file is logged and
//!   contributes nothing; it never stops the rest of the batch.
//! * [`write_predictions_csv`] - the `id,prediction,probability_adhesion` report.
//!
//! The [`sampling`] and [`blast`] modules hold the helpers used to stage
//! negative training sets.
//!
mod discovery;
mod error;
mod fasta;
mod loader;
mod report;

pub mod blast;
pub mod sampling;

pub use self::discovery::{
    find_fasta_files, find_files_with_suffix, is_fasta_path, FASTA_EXTENSIONS,
};
pub use self::error::LoadError;
pub use self::fasta::{load_fasta_file, read_fasta, read_fasta_from};
pub use self::loader::{load_sequences, load_sequences_from_path, LoadOptions};
pub use self::report::{predictions_frame, write_predictions_csv, CSV_HEADER};
