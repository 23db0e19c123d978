//! Filtering of BLAST tabular output (`-outfmt 6`) by percent identity.
use std::fmt;
use std::io::{self, BufRead};
use tracing::warn;

// query..evalue; the trailing bitscore column is optional
const MIN_COLUMNS: usize = 11;

#[derive(Debug, Clone, PartialEq)]
pub struct BlastHit {
    pub query: String,
    pub subject: String,
    /// Identity as written in the report, so output reproduces the input text.
    pub percent_identity_text: String,
    pub percent_identity: f64,
    pub evalue: String,
}

impl fmt::Display for BlastHit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}\t{}\t{}\t{}",
            self.query, self.subject, self.percent_identity_text, self.evalue
        )
    }
}

/// Keep hits whose identity is strictly above `min_identity`.
///
/// Blank lines are ignored. Rows with fewer than 11 columns or a non-numeric
/// identity are warned about and skipped; only I/O errors abort.
pub fn filter_blast_hits<R: BufRead>(
    reader: R,
    min_identity: f64,
    source: &str,
) -> io::Result<Vec<BlastHit>> {
    let mut hits = Vec::new();
    for (idx, line) in reader.lines().enumerate() {
        let line = line?;
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let fields: Vec<&str> = line.split('\t').collect();
        if fields.len() < MIN_COLUMNS {
            warn!(
                "{}:{} has fewer than {} columns, skipping",
                source,
                idx + 1,
                MIN_COLUMNS
            );
            continue;
        }
        let Ok(identity) = fields[2].trim().parse::<f64>() else {
            warn!(
                "{}:{} has invalid percent identity value '{}', skipping",
                source,
                idx + 1,
                fields[2]
            );
            continue;
        };
        if identity > min_identity {
            hits.push(BlastHit {
                query: fields[0].to_string(),
                subject: fields[1].to_string(),
                percent_identity_text: fields[2].to_string(),
                percent_identity: identity,
                evalue: fields[10].to_string(),
            });
        }
    }
    Ok(hits)
}
