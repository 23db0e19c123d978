use std::fs;
use std::path::{Path, PathBuf};
use tracing::warn;

#[rustfmt::skip]
/// Recognized FASTA suffixes, plain and gzip compressed. Matched case-insensitively.
pub const FASTA_EXTENSIONS: [&str; 12] = [
    ".aa", ".faa", ".pep", ".fa", ".fas", ".fasta",
    ".aa.gz", ".faa.gz", ".pep.gz", ".fa.gz", ".fas.gz", ".fasta.gz",
];

/// True when the file name ends in one of [`FASTA_EXTENSIONS`], ignoring case.
pub fn is_fasta_path(path: &Path) -> bool {
    let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
        return false;
    };
    let name = name.to_ascii_lowercase();
    FASTA_EXTENSIONS
        .iter()
        .any(|ext| name.len() > ext.len() && name.ends_with(ext))
}

pub(crate) fn is_gzip_path(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("gz"))
}

/// Recursively collect FASTA files below `root`.
///
/// Each file is returned once, in sorted path order. A `root` that is itself a
/// FASTA file yields just that file; anything else that is not a directory
/// yields nothing.
pub fn find_fasta_files<P: AsRef<Path>>(root: P) -> Vec<PathBuf> {
    walk_files(root.as_ref(), &is_fasta_path)
}

/// Recursively collect files whose name ends with `suffix` (case-sensitive).
pub fn find_files_with_suffix<P: AsRef<Path>>(root: P, suffix: &str) -> Vec<PathBuf> {
    walk_files(root.as_ref(), &|path: &Path| {
        path.file_name()
            .and_then(|n| n.to_str())
            .is_some_and(|n| n.ends_with(suffix))
    })
}

fn walk_files(root: &Path, keep: &dyn Fn(&Path) -> bool) -> Vec<PathBuf> {
    let mut found = Vec::new();
    if root.is_file() {
        if keep(root) {
            found.push(root.to_path_buf());
        }
        return found;
    }
    let mut pending = vec![root.to_path_buf()];
    while let Some(dir) = pending.pop() {
        let entries = match fs::read_dir(&dir) {
            Ok(entries) => entries,
            Err(e) => {
                warn!("Skipping unreadable directory {}: {}", dir.display(), e);
                continue;
            }
        };
        for entry in entries.flatten() {
            let path = entry.path();
            // symlinked directories are not followed
            let Ok(file_type) = entry.file_type() else {
                continue;
            };
            if file_type.is_dir() {
                pending.push(path);
            } else if path.is_file() && keep(&path) {
                found.push(path);
            }
        }
    }
    found.sort();
    found.dedup();
    found
}

#[cfg(test)]
mod tests {
    use super::*;

    fn touch(dir: &Path, name: &str) -> PathBuf {
        let path = dir.join(name);
        fs::write(&path, ">seq1\nMSEQ\n").unwrap();
        path
    }

    #[test]
    fn test_every_extension_found_once() {
        for ext in FASTA_EXTENSIONS {
            for ext in [ext.to_string(), ext.to_uppercase()] {
                let dir = tempfile::tempdir().unwrap();
                touch(dir.path(), &format!("test{}", ext));
                let found = find_fasta_files(dir.path());
                assert_eq!(found.len(), 1, "extension {}", ext);
            }
        }
    }

    #[test]
    fn test_unrecognized_extensions_ignored() {
        let dir = tempfile::tempdir().unwrap();
        touch(dir.path(), "test.txt");
        touch(dir.path(), "notes.fasta.bak");
        touch(dir.path(), "archive.gz");
        touch(dir.path(), ".faa");
        assert!(find_fasta_files(dir.path()).is_empty());
    }

    #[test]
    fn test_nested_directories() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("a").join("b");
        fs::create_dir_all(&nested).unwrap();
        touch(&nested, "nested.faa");
        touch(dir.path(), "top.fasta");
        touch(dir.path(), "proteins.pep");

        let found = find_fasta_files(dir.path());
        assert_eq!(found.len(), 3);
        assert!(found.iter().any(|p| p.ends_with("a/b/nested.faa")));
    }

    #[test]
    fn test_mixed_case_and_compound_suffix() {
        assert!(is_fasta_path(Path::new("x.Faa")));
        assert!(is_fasta_path(Path::new("genome.pep.fa")));
        assert!(is_fasta_path(Path::new("reads.FASTA.GZ")));
        assert!(!is_fasta_path(Path::new("reads.fastq")));
    }

    #[test]
    fn test_root_file_and_missing_root() {
        let dir = tempfile::tempdir().unwrap();
        let file = touch(dir.path(), "single.faa");
        assert_eq!(find_fasta_files(&file), vec![file]);
        assert!(find_fasta_files(dir.path().join("missing")).is_empty());
        assert!(find_fasta_files(tempfile::tempdir().unwrap().path()).is_empty());
    }

    #[test]
    fn test_suffix_match_is_case_sensitive() {
        let dir = tempfile::tempdir().unwrap();
        touch(dir.path(), "genome_AnnotatedProteins.fasta");
        touch(dir.path(), "genome_annotatedproteins.fasta");
        let found = find_files_with_suffix(dir.path(), "_AnnotatedProteins.fasta");
        assert_eq!(found.len(), 1);
    }
}
