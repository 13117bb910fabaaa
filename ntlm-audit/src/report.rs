use std::io::{self, Write};

use crate::candidates::Candidate;

/// Writes one `<identifier> has a pwned password` line per match.
pub fn write_report<W: Write>(mut out: W, matched: &[&Candidate]) -> io::Result<()> {
    for candidate in matched {
        writeln!(out, "{} has a pwned password", candidate.identifier)?;
    }
    out.flush()
}
