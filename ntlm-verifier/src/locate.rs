use std::cmp::Ordering;

use tracing::{debug, trace};

use crate::error::Error;
use crate::hash::{HASH_LEN, NtlmHash};
use crate::realign::{NOMINAL_STRIDE, recover};
use crate::source::RecordSource;

const STRIDE: usize = NOMINAL_STRIDE as usize;

/// Binary searches a sorted `HASH[:FREQ]` text dataset by byte offset.
///
/// Probe `i` looks at offset `i * 34` and the realigner turns whatever it lands on
/// into a whole hash. Nothing is indexed up front; every search is `O(log n)`
/// bounded reads against the source.
pub struct RecordLocator<S> {
    source: S,
}

impl<S: RecordSource> RecordLocator<S> {
    pub fn new(source: S) -> Self {
        Self { source }
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    pub fn into_inner(self) -> S {
        self.source
    }

    /// Returns `Ok(true)` if `key` is one of the dataset's hashes.
    ///
    /// Any read failure aborts the search with [`Error::DatasetUnreadable`]; a
    /// negative answer is only ever `Ok(false)`.
    pub fn search(&self, key: &NtlmHash) -> Result<bool, Error> {
        let total_bytes = self.source.byte_len()?;

        // Records are never shorter than 33 bytes and only grow with a frequency
        // suffix, so no record starts beyond this probe.
        let mut lower = 0u64;
        let mut upper = total_bytes / NOMINAL_STRIDE;
        let mut probes = 0u32;

        while lower <= upper {
            let mid = (lower + upper + 1) / 2;
            probes += 1;

            match recover(&self.source, mid)?.cmp_key(key) {
                Ordering::Equal => {
                    debug!(%key, probes, "found");
                    return Ok(true);
                }
                Ordering::Less => lower = mid + 1,
                Ordering::Greater => match mid.checked_sub(1) {
                    Some(m) => upper = m,
                    None => break,
                },
            }
        }

        // Every probe before `lower` recovered a smaller hash and every probe from
        // `lower` on a larger one. A record between the two was skipped over by the
        // stride; it can only start inside the gap after the last smaller probe.
        let found = match lower.checked_sub(1) {
            Some(below) => self.sweep_gap(below, key)?,
            None => false,
        };
        debug!(%key, probes, found, "bisection exhausted");
        Ok(found)
    }

    /// Compares every record that starts strictly between probe `below` and the
    /// probe after it.
    fn sweep_gap(&self, below: u64, key: &NtlmHash) -> Result<bool, Error> {
        let start = below.saturating_mul(NOMINAL_STRIDE);
        let mut buf = [0u8; STRIDE + HASH_LEN];
        let n = self.source.read_at(start, &mut buf)?;
        let gap = &buf[..n];

        let hit = gap
            .iter()
            .take(STRIDE - 1)
            .enumerate()
            .filter(|&(_, &b)| b == b'\n')
            .map(|(i, _)| &gap[i + 1..])
            .any(|record| record.len() >= HASH_LEN && record[..HASH_LEN] == key.as_bytes()[..]);

        if hit {
            trace!(%key, offset = start, "matched inside probe gap");
        }
        Ok(hit)
    }
}
