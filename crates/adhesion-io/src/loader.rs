//! Multi-file loading.
//!
//! Files are parsed on a dedicated rayon pool. Each file owns a result slot;
//! if the pool cannot be built or a worker dies, the files whose slots are
//! still empty are parsed once more on the calling thread. Files that already
//! finished are never parsed twice.
use crate::discovery::find_fasta_files;
use crate::fasta::load_fasta_file;
use adhesion_core::SequenceRecord;
use rayon::prelude::*;
use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use tracing::{info, warn};

#[derive(Debug, Clone, Default)]
pub struct LoadOptions {
    /// Upper bound on worker threads. Defaults to the number of cores.
    pub max_workers: Option<usize>,
}

impl LoadOptions {
    pub fn sequential() -> Self {
        Self {
            max_workers: Some(1),
        }
    }
    fn workers_for(&self, n_files: usize) -> usize {
        let cores = std::thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(1);
        self.max_workers.unwrap_or(cores).min(n_files).max(1)
    }
}

type Slot = OnceLock<Vec<SequenceRecord>>;

/// Load every file, concatenating records in file order.
///
/// Files that contribute no records are counted and reported once at the end.
pub fn load_sequences(files: &[PathBuf], options: &LoadOptions) -> Vec<SequenceRecord> {
    if files.is_empty() {
        return Vec::new();
    }
    let workers = options.workers_for(files.len());
    let per_file = if workers == 1 {
        files.iter().map(|path| load_isolated(path)).collect()
    } else {
        load_per_file(files, workers)
    };
    let empty = count_empty(&per_file);
    if empty > 0 {
        warn!(
            "{} of {} file(s) contributed no sequences",
            empty,
            files.len()
        );
    }
    per_file.into_iter().flatten().collect()
}

fn count_empty(per_file: &[Vec<SequenceRecord>]) -> usize {
    per_file.iter().filter(|records| records.is_empty()).count()
}

/// Records of each file, in file order, read on a pool of `workers` threads.
fn load_per_file(files: &[PathBuf], workers: usize) -> Vec<Vec<SequenceRecord>> {
    info!(
        "Processing {} files using {} workers...",
        files.len(),
        workers
    );
    let slots: Vec<Slot> = files.iter().map(|_| OnceLock::new()).collect();
    if let Err(reason) = load_parallel(files, &slots, workers) {
        let outstanding = slots.iter().filter(|slot| slot.get().is_none()).count();
        warn!(
            "Error in parallel processing ({}), processing {} remaining files sequentially",
            reason, outstanding
        );
    }

    let per_file: Vec<Vec<SequenceRecord>> = files
        .iter()
        .zip(slots)
        .map(|(path, slot)| slot.into_inner().unwrap_or_else(|| load_isolated(path)))
        .collect();
    info!(
        "Parallel processing completed. Total sequences: {}",
        per_file.iter().map(Vec::len).sum::<usize>()
    );
    per_file
}

/// Discover FASTA files under `root` and load them all.
pub fn load_sequences_from_path<P: AsRef<Path>>(
    root: P,
    options: &LoadOptions,
) -> Vec<SequenceRecord> {
    let files = find_fasta_files(root);
    load_sequences(&files, options)
}

fn load_parallel(files: &[PathBuf], slots: &[Slot], workers: usize) -> Result<(), String> {
    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(workers)
        .build()
        .map_err(|e| e.to_string())?;
    panic::catch_unwind(AssertUnwindSafe(|| {
        pool.install(|| {
            files
                .par_iter()
                .zip(slots.par_iter())
                .for_each(|(path, slot)| {
                    let _ = slot.set(load_isolated(path));
                });
        })
    }))
    .map_err(panic_message)
}

/// A panic while parsing one file counts against that file only.
fn load_isolated(path: &Path) -> Vec<SequenceRecord> {
    panic::catch_unwind(|| load_fasta_file(path)).unwrap_or_else(|payload| {
        warn!(
            "Error processing {}: {}",
            path.display(),
            panic_message(payload)
        );
        Vec::new()
    })
}

fn panic_message(payload: Box<dyn Any + Send>) -> String {
    if let Some(msg) = payload.downcast_ref::<&str>() {
        msg.to_string()
    } else if let Some(msg) = payload.downcast_ref::<String>() {
        msg.clone()
    } else {
        "worker panicked".to_string()
    }
}
