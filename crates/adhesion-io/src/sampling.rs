//! Random id sampling for negative training sets.
//!
//! Ids listed in tabular annotation files are excluded, the remaining FASTA
//! ids are shuffled and the first `n` kept.
use crate::discovery::is_gzip_path;
use crate::error::LoadError;
use flate2::read::GzDecoder;
use rand::seq::SliceRandom;
use rand::Rng;
use std::collections::HashSet;
use std::fs::File;
use std::io::{self, BufRead, BufReader, Read, Write};
use std::num::NonZeroUsize;
use std::path::{Path, PathBuf};
use tracing::warn;

/// Ids that must never be sampled.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IgnoredIds(HashSet<String>);

impl IgnoredIds {
    pub fn contains(&self, id: &str) -> bool {
        self.0.contains(id)
    }
    pub fn len(&self) -> usize {
        self.0.len()
    }
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
    pub fn extend(&mut self, other: IgnoredIds) {
        self.0.extend(other.0);
    }
}

impl<S: Into<String>> FromIterator<S> for IgnoredIds {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self(iter.into_iter().map(Into::into).collect())
    }
}

/// Collect one column (1-based) of a tab separated table.
///
/// Blank lines and `#` comments are skipped, as are rows too short to have
/// the column. `source` only labels warnings.
pub fn parse_ignored_ids<R: BufRead>(
    reader: R,
    column: NonZeroUsize,
    source: &str,
) -> io::Result<IgnoredIds> {
    let mut ids = HashSet::new();
    for (idx, line) in reader.lines().enumerate() {
        let line = line?;
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        match line.split('\t').nth(column.get() - 1) {
            Some(id) => {
                ids.insert(id.to_string());
            }
            None => warn!(
                "{}:{} has fewer than {} columns, skipping",
                source,
                idx + 1,
                column
            ),
        }
    }
    Ok(IgnoredIds(ids))
}

/// Union of [`parse_ignored_ids`] over several files. Unreadable files are skipped.
pub fn read_ignored_ids(tab_files: &[PathBuf], column: NonZeroUsize) -> IgnoredIds {
    let mut ignored = IgnoredIds::default();
    for path in tab_files {
        let source = path.display().to_string();
        let parsed = File::open(path)
            .and_then(|file| parse_ignored_ids(BufReader::new(file), column, &source));
        match parsed {
            Ok(ids) => ignored.extend(ids),
            Err(e) => warn!("Could not read {}: {}", source, e),
        }
    }
    ignored
}

/// Header ids of a FASTA file in file order, first occurrence only.
///
/// Only `>` lines are looked at, so the sequence body is never validated.
pub fn read_fasta_ids<P: AsRef<Path>>(path: P) -> Result<Vec<String>, LoadError> {
    let path = path.as_ref();
    let file = File::open(path).map_err(|source| LoadError::Open {
        path: path.to_path_buf(),
        source,
    })?;
    let reader: Box<dyn Read> = if is_gzip_path(path) {
        Box::new(GzDecoder::new(file))
    } else {
        Box::new(file)
    };

    let mut seen = HashSet::new();
    let mut ids = Vec::new();
    for line in BufReader::new(reader).lines() {
        let line = line.map_err(|source| LoadError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        let Some(header) = line.strip_prefix('>') else {
            continue;
        };
        let Some(id) = header.split_whitespace().next() else {
            continue;
        };
        if seen.insert(id.to_string()) {
            ids.push(id.to_string());
        }
    }
    Ok(ids)
}

/// Drop ignored ids, shuffle the rest and keep at most `n`.
pub fn sample_ids<R: Rng + ?Sized>(
    ids: Vec<String>,
    ignored: &IgnoredIds,
    n: usize,
    rng: &mut R,
) -> Vec<String> {
    let mut candidates: Vec<String> = ids
        .into_iter()
        .filter(|id| !ignored.contains(id))
        .collect();
    candidates.shuffle(rng);
    if candidates.len() < n {
        warn!(
            "{} ids left after filtering, fewer than the {} requested; keeping all",
            candidates.len(),
            n
        );
    }
    candidates.truncate(n);
    candidates
}

/// `<out_dir>/<fasta name without .fasta>.sampled_ids.txt`
pub fn sampled_ids_path(out_dir: &Path, fasta: &Path) -> PathBuf {
    let name = fasta
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let base = name.strip_suffix(".fasta").unwrap_or(&name);
    out_dir.join(format!("{}.sampled_ids.txt", base))
}

/// Write one id per line.
pub fn write_id_list(path: &Path, ids: &[String]) -> Result<(), LoadError> {
    let to_err = |source: io::Error| LoadError::Write {
        path: path.to_path_buf(),
        source,
    };
    let mut file = File::create(path).map_err(to_err)?;
    for id in ids {
        writeln!(file, "{}", id).map_err(to_err)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn col(n: usize) -> NonZeroUsize {
        NonZeroUsize::new(n).unwrap()
    }

    #[test]
    fn test_parse_ignored_column() {
        let table = "# header\nA\tid1\tx\n\nB\tid2\nC\n";
        let ids = parse_ignored_ids(table.as_bytes(), col(2), "table").unwrap();
        assert_eq!(ids.len(), 2);
        assert!(ids.contains("id1"));
        assert!(ids.contains("id2"));
        assert!(!ids.contains("C"));
    }

    #[test]
    fn test_read_ignored_skips_missing_files() {
        let dir = tempfile::tempdir().unwrap();
        let tab = dir.path().join("a.FASTA.tab");
        std::fs::write(&tab, "x\tdrop_me\n").unwrap();
        let ids = read_ignored_ids(&[dir.path().join("missing.tab"), tab], col(2));
        assert_eq!(ids, IgnoredIds::from_iter(["drop_me"]));
    }

    #[test]
    fn test_fasta_ids_first_word_deduplicated() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("g_AnnotatedProteins.fasta");
        std::fs::write(&path, ">b desc\nMK\n>a\nML\n>b again\nMM\n>\n").unwrap();
        assert_eq!(read_fasta_ids(&path).unwrap(), vec!["b", "a"]);
    }

    #[test]
    fn test_sample_excludes_ignored_and_is_seeded() {
        let ids: Vec<String> = (0..50).map(|i| format!("id{}", i)).collect();
        let ignored = IgnoredIds::from_iter(["id3", "id7"]);

        let first = sample_ids(ids.clone(), &ignored, 10, &mut ChaCha8Rng::seed_from_u64(42));
        let second = sample_ids(ids, &ignored, 10, &mut ChaCha8Rng::seed_from_u64(42));
        assert_eq!(first, second);
        assert_eq!(first.len(), 10);
        assert!(first.iter().all(|id| !ignored.contains(id)));
    }

    #[test]
    fn test_sample_short_supply_keeps_all() {
        let ids = vec!["a".to_string(), "b".to_string(), "c".to_string()];
        let ignored = IgnoredIds::from_iter(["b"]);
        let mut sampled = sample_ids(ids, &ignored, 100, &mut ChaCha8Rng::seed_from_u64(1));
        sampled.sort();
        assert_eq!(sampled, vec!["a", "c"]);
    }

    #[test]
    fn test_sampled_ids_path() {
        let out = Path::new("out");
        assert_eq!(
            sampled_ids_path(out, Path::new("x/g1_AnnotatedProteins.fasta")),
            out.join("g1_AnnotatedProteins.sampled_ids.txt")
        );
        assert_eq!(
            sampled_ids_path(out, Path::new("g2.faa")),
            out.join("g2.faa.sampled_ids.txt")
        );
    }

    #[test]
    fn test_write_id_list() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ids.txt");
        write_id_list(&path, &["a".to_string(), "b".to_string()]).unwrap();
        assert_eq!(std::fs::read_to_string(path).unwrap(), "a\nb\n");
    }
}
