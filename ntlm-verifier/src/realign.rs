//! Recovers a whole hash from a probe offset that may land anywhere in a record.
//!
//! Records are `HASH[:FREQ]` followed by `\n` or `\r\n`, so their length varies and a
//! probe at `index * NOMINAL_STRIDE` is only approximately on a boundary. A 32-byte
//! window is read at the probe, classified by what it contains, and each
//! [`Boundary`] is repaired with its own bounded read:
//!
//! - inside the hash of a record with a frequency suffix (a `:` shows up before the
//!   line break), or on that `:` itself: the record containing the probe;
//! - anywhere else past a record's first byte: the record that follows.
//!
//! This keeps the recovered hash non-decreasing as the offset grows, which is the
//! only property bisection needs.

use std::cmp::Ordering;

use tracing::trace;

use crate::error::Error;
use crate::hash::{HASH_LEN, NtlmHash};
use crate::source::RecordSource;

/// Distance between probe offsets: a 32-character hash plus `\r\n`.
pub const NOMINAL_STRIDE: u64 = 34;

/// Bytes read at every probe offset.
pub const WINDOW_LEN: usize = HASH_LEN;

/// What a raw window read at a probe offset contains.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Boundary {
    /// The window is exactly one hash: the probe sat on a record start.
    Clean,
    /// The probe sat inside a hash (or on its `:`). Only the last `old_hash_len`
    /// characters of that hash are in the window; the rest precede the probe.
    SuffixBefore { old_hash_len: usize },
    /// The window crosses a `\n`. The next record starts at `next_start` within the
    /// window and is cut short by the end of the window.
    NextLineShort { next_start: usize },
    /// The window ends on the `\r` of a `\r\n`; the next record starts one byte
    /// past the window.
    NextLineShortWithCr,
    /// Nothing left to read, or only the unterminated tail of the final record.
    EndOfData,
}

impl Boundary {
    /// Classifies a window whose trailing NUL padding has already been stripped.
    pub fn classify(window: &[u8]) -> Self {
        if window.is_empty() {
            return Self::EndOfData;
        }

        let newline = window.iter().position(|&b| b == b'\n');
        let head = &window[..newline.unwrap_or(window.len())];
        if let Some(colon) = head.iter().position(|&b| b == b':') {
            return Self::SuffixBefore { old_hash_len: colon };
        }

        match newline {
            Some(n) => Self::NextLineShort { next_start: n + 1 },
            None if window.last() == Some(&b'\r') => Self::NextLineShortWithCr,
            None if window.len() == WINDOW_LEN => Self::Clean,
            None => Self::EndOfData,
        }
    }
}

/// A hash recovered from the dataset, as stored (NUL bytes removed).
///
/// Usually exactly [`HASH_LEN`] bytes; shorter only when the dataset itself ends
/// in a truncated record.
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct RecoveredHash {
    buf: [u8; HASH_LEN],
    len: usize,
}

impl RecoveredHash {
    fn from_parts(head: &[u8], tail: &[u8]) -> Self {
        let mut buf = [0u8; HASH_LEN];
        let mut len = 0;
        for &b in head.iter().chain(tail).filter(|&&b| b != 0).take(HASH_LEN) {
            buf[len] = b;
            len += 1;
        }
        Self { buf, len }
    }

    #[inline]
    pub fn as_bytes(&self) -> &[u8] {
        &self.buf[..self.len]
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}

impl std::fmt::Debug for RecoveredHash {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "RecoveredHash({})", String::from_utf8_lossy(self.as_bytes()))
    }
}

/// The comparison key a probe yields.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Probe {
    Record(RecoveredHash),
    /// Past the last record. Sorts after every key.
    EndOfData,
}

impl Probe {
    /// Orders the probed record relative to `key`, ordinally.
    #[inline]
    pub fn cmp_key(&self, key: &NtlmHash) -> Ordering {
        match self {
            Self::Record(hash) => hash.as_bytes().cmp(key.as_bytes().as_slice()),
            Self::EndOfData => Ordering::Greater,
        }
    }

    fn from_recovered(hash: RecoveredHash) -> Self {
        if hash.is_empty() { Self::EndOfData } else { Self::Record(hash) }
    }
}

/// Recovers the hash "at" an approximate record index. The index is only a probe
/// position (`index * NOMINAL_STRIDE`), never a claim about the record's rank.
pub fn recover<S: RecordSource + ?Sized>(source: &S, approx_index: u64) -> Result<Probe, Error> {
    recover_at(source, approx_index.saturating_mul(NOMINAL_STRIDE))
}

/// Recovers the hash for an arbitrary byte offset.
pub fn recover_at<S: RecordSource + ?Sized>(source: &S, offset: u64) -> Result<Probe, Error> {
    let mut buf = [0u8; WINDOW_LEN];
    let n = source.read_at(offset, &mut buf)?;
    let window = trim_nul(&buf[..n]);
    let boundary = Boundary::classify(window);
    trace!(offset, ?boundary, "probe window");

    let past_window = offset.saturating_add(n as u64);
    match boundary {
        Boundary::Clean => Ok(Probe::Record(RecoveredHash::from_parts(window, &[]))),
        Boundary::SuffixBefore { old_hash_len } => {
            read_preceding(source, offset, &window[..old_hash_len])
        }
        Boundary::NextLineShort { next_start } => {
            read_remainder(source, past_window, &window[next_start..])
        }
        Boundary::NextLineShortWithCr => read_remainder(source, past_window.saturating_add(1), &[]),
        Boundary::EndOfData => Ok(Probe::EndOfData),
    }
}

/// Rebuilds the record containing `offset` from the characters of its hash that
/// precede the probe.
fn read_preceding<S: RecordSource + ?Sized>(
    source: &S,
    offset: u64,
    old_hash: &[u8],
) -> Result<Probe, Error> {
    let missing = HASH_LEN - old_hash.len();
    let start = offset.checked_sub(missing as u64).ok_or(Error::MalformedRecord { offset })?;

    let mut head = [0u8; HASH_LEN];
    let n = source.read_at(start, &mut head[..missing])?;
    Ok(Probe::from_recovered(RecoveredHash::from_parts(&head[..n], old_hash)))
}

/// Completes the next record from the `carried` part already in the window plus
/// the bytes starting at `resume_at`.
fn read_remainder<S: RecordSource + ?Sized>(
    source: &S,
    resume_at: u64,
    carried: &[u8],
) -> Result<Probe, Error> {
    let missing = HASH_LEN.saturating_sub(carried.len());

    let mut tail = [0u8; HASH_LEN];
    let n = source.read_at(resume_at, &mut tail[..missing])?;
    Ok(Probe::from_recovered(RecoveredHash::from_parts(carried, trim_nul(&tail[..n]))))
}

#[inline]
fn trim_nul(bytes: &[u8]) -> &[u8] {
    let end = bytes.iter().rposition(|&b| b != 0).map_or(0, |i| i + 1);
    &bytes[..end]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn token(c: char) -> String {
        c.to_string().repeat(HASH_LEN)
    }

    fn record(probe: Probe) -> String {
        match probe {
            Probe::Record(hash) => String::from_utf8(hash.as_bytes().to_vec()).unwrap(),
            Probe::EndOfData => panic!("expected a record, got EndOfData"),
        }
    }

    #[test]
    fn test_classify() {
        let a = token('A');
        assert_eq!(Boundary::classify(a.as_bytes()), Boundary::Clean);
        assert_eq!(Boundary::classify(b""), Boundary::EndOfData);
        assert_eq!(Boundary::classify(b"AAAA"), Boundary::EndOfData);

        let into_hash = format!("{}:12\nBB", &a[..27]);
        assert_eq!(
            Boundary::classify(into_hash.as_bytes()),
            Boundary::SuffixBefore { old_hash_len: 27 }
        );

        let on_colon = format!(":3\n{}", &a[..29]);
        assert_eq!(
            Boundary::classify(on_colon.as_bytes()),
            Boundary::SuffixBefore { old_hash_len: 0 }
        );

        let in_freq = format!("45\r\n{}", &a[..28]);
        assert_eq!(
            Boundary::classify(in_freq.as_bytes()),
            Boundary::NextLineShort { next_start: 4 }
        );

        let straddle = format!("{}\r", &a[..31]);
        assert_eq!(Boundary::classify(straddle.as_bytes()), Boundary::NextLineShortWithCr);
    }

    #[test]
    fn test_colon_after_newline_is_next_line() {
        // The ':' belongs to the next record, not to the one the probe sat in.
        let window = format!("{}\n{}:", &token('A')[..5], &token('B')[..25]);
        assert_eq!(
            Boundary::classify(window.as_bytes()),
            Boundary::NextLineShort { next_start: 6 }
        );
    }

    #[test]
    fn test_recover_clean_and_suffix_before() {
        // A (0..33) | B:5 (33..68) | C (68..101)
        let data = format!("{}\n{}:5\n{}\n", token('A'), token('B'), token('C'));
        let data = data.as_bytes();

        assert_eq!(record(recover(data, 0).unwrap()), token('A'));
        // Offset 34 is one character into B's hash.
        assert_eq!(record(recover(data, 1).unwrap()), token('B'));
        assert_eq!(record(recover(data, 2).unwrap()), token('C'));
        assert_eq!(recover(data, 3).unwrap(), Probe::EndOfData);
    }

    #[test]
    fn test_recover_next_line_from_frequency_tail() {
        // A:12345 (0..40) | B (40..74)
        let data = format!("{}:12345\r\n{}\r\n", token('A'), token('B'));
        let data = data.as_bytes();

        // Offset 34 is inside "12345"; the window carries 26 bytes of B.
        assert_eq!(record(recover(data, 1).unwrap()), token('B'));
    }

    #[test]
    fn test_recover_next_line_after_split_crlf() {
        // A (0..33, LF) | B (33..67, CRLF) | C (67..101)
        let data = format!("{}\n{}\r\n{}\r\n", token('A'), token('B'), token('C'));
        let data = data.as_bytes();

        // Offset 34 is one character into B; the window ends on B's '\r'.
        let window = &data[34..34 + WINDOW_LEN];
        assert_eq!(Boundary::classify(window), Boundary::NextLineShortWithCr);
        assert_eq!(record(recover(data, 1).unwrap()), token('C'));
    }

    #[test]
    fn test_recover_past_last_record() {
        let data = format!("{}:5\n", token('A'));
        // Offset 34 is the final '\n'; nothing follows.
        assert_eq!(recover(data.as_bytes(), 1).unwrap(), Probe::EndOfData);
        assert_eq!(recover(data.as_bytes(), 100).unwrap(), Probe::EndOfData);
        assert_eq!(recover(data.as_bytes(), u64::MAX).unwrap(), Probe::EndOfData);
    }

    #[test]
    fn test_recover_strips_nul_padding() {
        let mut data = format!("{}\n", token('A')).into_bytes();
        data.extend_from_slice(&[0u8; 40]);

        assert_eq!(record(recover(data.as_slice(), 0).unwrap()), token('A'));
        assert_eq!(recover(data.as_slice(), 1).unwrap(), Probe::EndOfData);
    }

    #[test]
    fn test_suffix_before_start_of_file_is_malformed() {
        let data = format!(":7\n{}\n", token('A'));
        assert!(matches!(
            recover(data.as_bytes(), 0),
            Err(Error::MalformedRecord { offset: 0 })
        ));
    }

    #[test]
    fn test_end_of_data_sorts_last() {
        let key = NtlmHash::parse(&token('F')).unwrap();
        assert_eq!(Probe::EndOfData.cmp_key(&key), Ordering::Greater);

        let data = format!("{}\n", token('A'));
        let probe = recover(data.as_bytes(), 0).unwrap();
        assert_eq!(probe.cmp_key(&key), Ordering::Less);
    }

    /// Every byte offset of a mixed dataset recovers a whole hash of the dataset,
    /// and the recovered hashes never decrease as the offset grows.
    #[test]
    fn test_every_offset_recovers_a_whole_adjacent_hash() {
        let hashes = ['1', '3', '5', '7', '9', 'B', 'D', 'F'].map(token);
        let data = format!(
            "{}\n{}:1\r\n{}\r\n{}:987654321\n{}:42\n{}\n{}:3\r\n{}",
            hashes[0], hashes[1], hashes[2], hashes[3], hashes[4], hashes[5], hashes[6], hashes[7]
        );
        let data = data.as_bytes();

        let mut previous: Option<String> = None;
        let mut seen_end = false;
        for offset in 0..=data.len() as u64 + 2 {
            match recover_at(data, offset).unwrap() {
                Probe::Record(hash) => {
                    assert!(!seen_end, "record after EndOfData at offset {offset}");
                    let hash = String::from_utf8(hash.as_bytes().to_vec()).unwrap();
                    assert!(hashes.contains(&hash), "spliced hash {hash:?} at offset {offset}");
                    if let Some(prev) = &previous {
                        assert!(prev <= &hash, "went backwards at offset {offset}");
                    }
                    previous = Some(hash);
                }
                Probe::EndOfData => seen_end = true,
            }
        }
        assert!(seen_end);
    }
}
