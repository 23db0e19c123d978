use crate::discovery::is_gzip_path;
use crate::error::LoadError;
use adhesion_core::{normalize_residues, SequenceRecord};
use bio::io::fasta;
use flate2::read::GzDecoder;
use std::fs::File;
use std::io::{self, BufRead, BufReader, Cursor, Read};
use std::path::Path;
use tracing::{debug, info, warn};

/// Parse FASTA records from any reader.
///
/// Record ids are the first word of the header line. Residues go through
/// [`normalize_residues`]. Lines before the first `>` header are skipped.
/// Blank input yields no records; text without any header is an error.
pub fn read_fasta_from<R: Read>(reader: R) -> io::Result<Vec<SequenceRecord>> {
    let mut reader = BufReader::new(reader);
    let mut line = Vec::new();
    let mut skipped = 0usize;
    let mut skipped_text = false;
    loop {
        line.clear();
        if reader.read_until(b'\n', &mut line)? == 0 {
            if skipped_text {
                return Err(io::Error::new(
                    io::ErrorKind::InvalidData,
                    "no FASTA header ('>') found",
                ));
            }
            return Ok(Vec::new());
        }
        if line.starts_with(b">") {
            break;
        }
        skipped_text |= !line.iter().all(u8::is_ascii_whitespace);
        skipped += 1;
    }
    if skipped > 0 {
        debug!("Skipped {} line(s) before the first FASTA header", skipped);
    }

    fasta::Reader::new(Cursor::new(line).chain(reader))
        .records()
        .map(|record| {
            let record = record?;
            let sequence = String::from_utf8_lossy(record.seq());
            Ok(SequenceRecord::new(
                record.id(),
                normalize_residues(&sequence),
            ))
        })
        .collect()
}

/// Strictly read one FASTA file, decompressing `.gz` files on the fly.
pub fn read_fasta<P: AsRef<Path>>(path: P) -> Result<Vec<SequenceRecord>, LoadError> {
    let path = path.as_ref();
    let file = File::open(path).map_err(|source| LoadError::Open {
        path: path.to_path_buf(),
        source,
    })?;
    let reader: Box<dyn Read> = if is_gzip_path(path) {
        debug!("Reading gzipped file: {}", path.display());
        Box::new(GzDecoder::new(file))
    } else {
        Box::new(file)
    };
    read_fasta_from(reader).map_err(|source| LoadError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

/// Read one FASTA file, logging and swallowing any failure.
///
/// A file that cannot be opened, decompressed or parsed contributes zero
/// records so that one bad file never blocks the rest of a batch.
pub fn load_fasta_file<P: AsRef<Path>>(path: P) -> Vec<SequenceRecord> {
    let path = path.as_ref();
    info!("Processing file: {}", path.display());
    match read_fasta(path) {
        Ok(records) => {
            info!("  Found {} sequences.", records.len());
            records
        }
        Err(e) => {
            warn!("Error reading {}: {}", path.display(), e);
            Vec::new()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use adhesion_test_data::TestFile;

    #[test]
    fn test_two_records() {
        let (path, _handle) = TestFile::fasta_two_records().create_temp().unwrap();
        let records = load_fasta_file(&path);
        assert_eq!(
            records,
            vec![
                SequenceRecord::new("seq1", "MSEQ"),
                SequenceRecord::new("seq2", "MPQRS"),
            ]
        );
    }

    #[test]
    fn test_gzipped_matches_plain() {
        let (plain, _h1) = TestFile::fasta_two_records().create_temp().unwrap();
        let (gz, _h2) = TestFile::fasta_two_records_gz().create_temp().unwrap();
        assert_eq!(load_fasta_file(&plain), load_fasta_file(&gz));
    }

    #[test]
    fn test_multiline_header_words_and_normalization() {
        let (path, _handle) = TestFile::fasta_multiline().create_temp().unwrap();
        let records = read_fasta(&path).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].id, "sp|P0A1|ADHA_TEST");
        assert_eq!(
            records[0].sequence,
            "MKTAYIAKQRLQISFVKSHFSRQLEERLGLIEVQAPILSRVGDGTQDNLSGAEKAVQVKVKALPDAQ"
        );
        assert_eq!(records[1], SequenceRecord::new("short", "ML"));
    }

    #[test]
    fn test_empty_file_yields_nothing() {
        let records = read_fasta_from(&b""[..]).unwrap();
        assert!(records.is_empty());
    }

    #[test]
    fn test_missing_header_is_tolerated() {
        let (path, _handle) = TestFile::fasta_no_header().create_temp().unwrap();
        assert!(read_fasta(&path).is_err());
        assert!(load_fasta_file(&path).is_empty());
    }

    #[test]
    fn test_text_before_first_header_is_skipped() {
        let expected = vec![
            SequenceRecord::new("seq1", "MSEQ"),
            SequenceRecord::new("seq2", "MPQRS"),
        ];
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("leading_blank.faa");
        std::fs::write(&path, "\n>seq1\nMSEQ\n>seq2\nMPQRS\n").unwrap();
        assert_eq!(load_fasta_file(&path), expected);

        let preamble = b"exported 2024-01-01\n\n>seq1 first\nMSEQ\n>seq2\nMPQRS";
        assert_eq!(read_fasta_from(&preamble[..]).unwrap(), expected);
        assert!(read_fasta_from(&b"\n  \n"[..]).unwrap().is_empty());
    }

    #[test]
    fn test_missing_file_is_tolerated() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("missing.faa");
        assert!(matches!(
            read_fasta(&missing),
            Err(LoadError::Open { .. })
        ));
        assert!(load_fasta_file(&missing).is_empty());
    }

    #[test]
    fn test_corrupt_gzip_is_tolerated() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.faa.gz");
        std::fs::write(&path, b">seq1\nMSEQ\n").unwrap();
        assert!(load_fasta_file(&path).is_empty());
    }

    #[test]
    fn test_duplicate_ids_are_kept() {
        let records = read_fasta_from(&b">a\nMK\n>a\nML\n"[..]).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].id, records[1].id);
    }
}
