use std::io::BufRead;

use compact_str::CompactString;
use ntlm_verifier::NtlmHash;
use tracing::warn;

use crate::error::Error;

/// One account to check: who it belongs to and its NTLM hash.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candidate {
    /// 1-based line in the candidate list.
    pub line_number: usize,
    pub identifier: CompactString,
    pub hash: NtlmHash,
}

/// Parses `identifier:HASH`, or a pwdump line `identifier:RID:LMHASH:NTHASH:::`
/// where the NT hash is the fourth field.
pub fn parse_line(line_number: usize, line: &str) -> Result<Candidate, Error> {
    let line = line.trim_end_matches(['\r', '\n']);
    let malformed = |reason: String| Error::MalformedCandidateLine { line_number, reason };

    let Some((identifier, rest)) = line.split_once(':') else {
        return Err(malformed("missing ':' separator".into()));
    };

    let fields: Vec<&str> = rest.split(':').collect();
    let hash_field = if fields.len() >= 3 { fields[2] } else { fields[0] };

    let hash = NtlmHash::parse(hash_field).map_err(|e| malformed(e.to_string()))?;
    Ok(Candidate { line_number, identifier: CompactString::from(identifier), hash })
}

/// Reads candidates until end of input or the first blank line.
///
/// A malformed line stops the read with [`Error::MalformedCandidateLine`] unless
/// `skip_malformed` is set, in which case it is logged and skipped.
pub fn read_candidates<R: BufRead>(reader: R, skip_malformed: bool) -> Result<Vec<Candidate>, Error> {
    let mut candidates = Vec::new();

    for (index, line) in reader.lines().enumerate() {
        let line = line?;
        if line.trim_end_matches('\r').is_empty() {
            break;
        }

        match parse_line(index + 1, &line) {
            Ok(candidate) => candidates.push(candidate),
            Err(e) if skip_malformed => warn!(error = %e, "skipping candidate"),
            Err(e) => return Err(e),
        }
    }

    Ok(candidates)
}
