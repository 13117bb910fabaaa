//! Cross-references a list of user NTLM hashes against the Pwned Passwords NTLM
//! dataset and reports the accounts whose password appears in it.
//!
//! The lookups themselves live in [ntlm-verifier](ntlm_verifier); this crate is the
//! glue around them: reading the candidate list, fanning lookups out over worker
//! threads (one dataset handle each) and writing the report.
//!
//! # Usage
//!
//! ```sh
//! ntlm-audit pwned-passwords-ntlm-ordered-by-hash.txt users.txt pwned.txt
//! ```
//!
//! `users.txt` holds one `identifier:HASH` per line (pwdump
//! `identifier:RID:LMHASH:NTHASH:::` lines work too) and is read up to the first
//! blank line. `pwned.txt` receives one `<identifier> has a pwned password` line
//! per match, in input order.

pub mod candidates;
pub mod error;
pub mod report;
pub mod worker;

pub use candidates::{Candidate, parse_line, read_candidates};
pub use error::Error;
pub use report::write_report;
pub use worker::{audit, worker};
