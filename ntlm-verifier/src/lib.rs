//! Breached password checker for the NTLM "ordered by hash" Pwned Passwords dataset.
//!
//! The dataset is a flat text file of `HASH` or `HASH:FREQUENCY` lines, sorted by
//! hash and often tens of gigabytes. This library answers "is this hash in it?"
//! without loading or indexing the file: it binary searches byte offsets at a fixed
//! 34-byte stride and realigns each probe onto a whole record, so every lookup costs
//! `O(log n)` small positioned reads.
//!
//! ```no_run
//! use std::path::Path;
//!
//! let found = ntlm_verifier::lookup(
//!     "8846F7EAEE8FB117AD06BDD830B7586C",
//!     Path::new("pwned-passwords-ntlm-ordered-by-hash.txt"),
//! )?;
//! # Ok::<(), ntlm_verifier::Error>(())
//! ```
//!
//! A [`Dataset`] handle owns one file cursor. Concurrent lookups each need their own
//! handle onto the same file; the file is never written.

use std::fs::File;
use std::path::{Path, PathBuf};

pub mod error;
pub mod hash;
pub mod locate;
pub mod realign;
pub mod source;

pub use error::Error;
pub use hash::{HASH_LEN, HEX_CHARS, NtlmHash};
pub use locate::RecordLocator;
pub use realign::{Boundary, NOMINAL_STRIDE, Probe, RecoveredHash, WINDOW_LEN, recover};
pub use source::RecordSource;

/// Environment variable name for specifying the dataset file.
pub const NTLM_DATASET_ENV: &str = "NTLM_DATASET";

/// File name the dataset is published under.
pub const DEFAULT_DATASET_FILE: &str = "pwned-passwords-ntlm-ordered-by-hash.txt";

/// Returns the dataset path from the NTLM_DATASET environment variable,
/// or falls back to the default file name beside the workspace.
pub fn dataset_path_from_env() -> PathBuf {
    std::env::var_os(NTLM_DATASET_ENV).map(PathBuf::from).unwrap_or_else(|| {
        let manifest_dir = Path::new(env!("CARGO_MANIFEST_DIR"));
        manifest_dir.parent().unwrap_or(manifest_dir).join(DEFAULT_DATASET_FILE)
    })
}

/// Checks a single hash, opening the dataset read-only for the duration of the call.
///
/// The hash may be in either case. Returns `Ok(false)` when it is absent; an error
/// means the answer is unknown.
pub fn lookup(hash: &str, dataset_path: &Path) -> Result<bool, Error> {
    let key = NtlmHash::parse(hash)?;
    Dataset::open(dataset_path)?.contains(&key)
}

/// Async version of [`lookup`]. The blocking search runs on tokio's blocking pool.
#[cfg(feature = "tokio")]
pub async fn lookup_async(hash: &str, dataset_path: &Path) -> Result<bool, Error> {
    let key = NtlmHash::parse(hash)?;
    let path = dataset_path.to_path_buf();
    tokio::task::spawn_blocking(move || Dataset::open(&path)?.contains(&key))
        .await
        .map_err(|e| Error::DatasetUnreadable(std::io::Error::other(e)))?
}

/// An open dataset file, reusable for any number of sequential lookups.
///
/// Lookups take `&mut self`: the handle's file cursor belongs to one search at a
/// time.
pub struct Dataset {
    path: PathBuf,
    locator: RecordLocator<File>,
}

impl Dataset {
    /// Opens the dataset read-only.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, Error> {
        let path = path.as_ref().to_path_buf();
        let file = File::open(&path)?;
        Ok(Self { path, locator: RecordLocator::new(file) })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Checks whether the dataset contains `hash`.
    pub fn contains(&mut self, hash: &NtlmHash) -> Result<bool, Error> {
        self.locator.search(hash)
    }

    /// Parses `hash` (either case) and checks it.
    pub fn contains_str(&mut self, hash: &str) -> Result<bool, Error> {
        let key = NtlmHash::parse(hash)?;
        self.contains(&key)
    }

    /// Checks if the given password has been found in a data breach.
    ///
    /// Returns `Ok(true)` if the password's NTLM hash is in the dataset,
    /// `Ok(false)` if it was not found, or an error if the lookup failed.
    pub fn is_breached(&mut self, password: &str) -> Result<bool, Error> {
        self.contains(&NtlmHash::from_password(password))
    }

    /// Async version of [`Dataset::contains`]. The handle moves onto tokio's
    /// blocking pool for the search and is handed back with the answer.
    #[cfg(feature = "tokio")]
    pub async fn contains_async(mut self, hash: NtlmHash) -> Result<(Self, bool), Error> {
        tokio::task::spawn_blocking(move || {
            let found = self.contains(&hash)?;
            Ok::<_, Error>((self, found))
        })
        .await
        .map_err(|e| Error::DatasetUnreadable(std::io::Error::other(e)))?
    }
}
