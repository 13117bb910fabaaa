use std::path::Path;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use ntlm_verifier::Dataset;
use tracing::debug;

use crate::candidates::Candidate;
use crate::error::Error;

/// Worker that checks a contiguous run of candidates against its own dataset
/// handle. Stops early once `abort` is raised by another worker's failure.
pub fn worker<'a>(
    dataset_path: &Path,
    candidates: &'a [Candidate],
    progress: &AtomicU64,
    abort: &AtomicBool,
) -> Result<Vec<&'a Candidate>, Error> {
    let dataset_error =
        |source| Error::Dataset { path: dataset_path.to_path_buf(), source };

    let mut dataset = Dataset::open(dataset_path).map_err(dataset_error)?;
    let mut matched = Vec::new();

    for candidate in candidates {
        if abort.load(Ordering::Relaxed) {
            break;
        }
        if dataset.contains(&candidate.hash).map_err(dataset_error)? {
            debug!(identifier = %candidate.identifier, line = candidate.line_number, "pwned");
            matched.push(candidate);
        }
        progress.fetch_add(1, Ordering::Relaxed);
    }

    Ok(matched)
}

/// Checks every candidate, splitting the list across `jobs` threads with one
/// dataset handle each. Matches come back in input order.
///
/// The first failure raises a shared abort flag and is returned once all workers
/// have stopped.
pub fn audit<'a>(
    dataset_path: &Path,
    candidates: &'a [Candidate],
    jobs: usize,
    progress: &AtomicU64,
) -> Result<Vec<&'a Candidate>, Error> {
    if candidates.is_empty() {
        return Ok(Vec::new());
    }

    let chunk_size = candidates.len().div_ceil(jobs.max(1));
    let abort = AtomicBool::new(false);

    std::thread::scope(|s| {
        let abort = &abort;
        let handles: Vec<_> = candidates
            .chunks(chunk_size)
            .map(|chunk| {
                s.spawn(move || {
                    let result = worker(dataset_path, chunk, progress, abort);
                    if result.is_err() {
                        abort.store(true, Ordering::Relaxed);
                    }
                    result
                })
            })
            .collect();

        // Wait for all workers to complete
        let mut matched = Vec::new();
        let mut first_error: Option<Error> = None;
        for handle in handles {
            match handle.join() {
                Ok(Ok(found)) => matched.extend(found),
                Ok(Err(e)) => {
                    if first_error.is_none() {
                        first_error = Some(e);
                    }
                }
                Err(_) => {
                    abort.store(true, Ordering::Relaxed);
                    if first_error.is_none() {
                        first_error = Some(Error::WorkerPanicked);
                    }
                }
            }
        }

        match first_error {
            Some(e) => Err(e),
            None => Ok(matched),
        }
    })
}
