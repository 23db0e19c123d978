//! adhesion-test-data
//!
//! A module to provide test files embedded in the crate for use in testing.
//! Small FASTA fixtures (plain and gzipped), a labeled training set and a
//! BLAST tabular report are included in the crate distribution.
//!
//! The test files are represented as `TestFile` objects which package the raw binary data
//! and create temporary files for programs to operate on.
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::{Builder, NamedTempFile};

#[derive(Debug)]
/// Test File
///
/// Example usage:
///
/// ```ignore
/// // returns (filepath, _tempfile_handle).
/// // _handle ensures the tempfile remains in scope
/// use adhesion_test_data::TestFile;
/// let (fasta_file, _temp) = TestFile::fasta_two_records().create_temp().unwrap();
/// ```
pub struct TestFile {
    filebinary: &'static [u8],
    suffix: &'static str,
}

impl TestFile {
    /// `>seq1 MSEQ` and `>seq2 MPQRS`.
    pub fn fasta_two_records() -> Self {
        Self {
            filebinary: include_bytes!("../data/fasta/two_records.faa"),
            suffix: "faa",
        }
    }
    /// Same records as [`TestFile::fasta_two_records`], gzip compressed.
    pub fn fasta_two_records_gz() -> Self {
        Self {
            filebinary: include_bytes!("../data/fasta/two_records.faa.gz"),
            suffix: "faa.gz",
        }
    }
    /// Wrapped sequence lines, a UniProt style header, `J` residues and a stop symbol.
    pub fn fasta_multiline() -> Self {
        Self {
            filebinary: include_bytes!("../data/fasta/multiline.fasta"),
            suffix: "fasta",
        }
    }
    /// Text without any `>` header.
    pub fn fasta_no_header() -> Self {
        Self {
            filebinary: include_bytes!("../data/fasta/no_header.faa"),
            suffix: "faa",
        }
    }
    /// Five Ser/Thr/Gly/Asn/Pro rich sequences standing in for adhesins.
    pub fn training_positive() -> Self {
        Self {
            filebinary: include_bytes!("../data/training/positive.faa"),
            suffix: "faa",
        }
    }
    /// Five Leu/Lys/Glu/Ile/Arg rich sequences standing in for non-adhesins.
    pub fn training_negative() -> Self {
        Self {
            filebinary: include_bytes!("../data/training/negative.faa"),
            suffix: "faa",
        }
    }
    /// BLAST tabular (outfmt 6) hits, including a short row and a non-numeric identity.
    pub fn blast_hits() -> Self {
        Self {
            filebinary: include_bytes!("../data/blast/hits.tsv"),
            suffix: "tsv",
        }
    }

    pub fn bytes(&self) -> &'static [u8] {
        self.filebinary
    }

    pub fn create_temp(&self) -> std::io::Result<(String, NamedTempFile)> {
        let temp = Builder::new()
            .suffix(&format!(".{}", self.suffix))
            .tempfile()?;

        fs::write(&temp, self.filebinary)?;
        let path = temp.path().to_string_lossy().into_owned();

        Ok((path, temp))
    }

    /// Write the file into `dir` as `<stem>.<suffix>`.
    ///
    /// Used to lay out directory trees for discovery tests; the caller owns
    /// the directory (usually a `tempfile::TempDir`).
    pub fn create_in(&self, dir: &Path, stem: &str) -> std::io::Result<PathBuf> {
        let path = dir.join(format!("{}.{}", stem, self.suffix));
        fs::write(&path, self.filebinary)?;
        Ok(path)
    }
}
