use std::fmt;
use std::str::FromStr;

use md4::{Digest, Md4};

use crate::error::Error;

/// The length of an NTLM hash rendered as hex (16 bytes -> 32 characters).
pub const HASH_LEN: usize = 32;

/// Hex lookup table for digest conversion. Uppercase to match the dataset collation.
pub const HEX_CHARS: &[u8; 16] = b"0123456789ABCDEF";

/// A normalized search key: 32 uppercase ASCII hex characters, stored inline.
///
/// Ordering is ordinal over the bytes, which is the order the Pwned Passwords
/// "ordered by hash" files are sorted in.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NtlmHash([u8; HASH_LEN]);

impl NtlmHash {
    /// Parses a hex hash, uppercasing it.
    ///
    /// Surrounding ASCII whitespace is ignored, so a line read with its `\r`
    /// still attached parses fine.
    pub fn parse(input: &str) -> Result<Self, Error> {
        let trimmed = input.trim_ascii();
        if trimmed.len() != HASH_LEN {
            return Err(Error::InvalidHash {
                input: input.to_owned(),
                reason: "expected 32 hex characters",
            });
        }

        let mut out = [0u8; HASH_LEN];
        for (dst, &b) in out.iter_mut().zip(trimmed.as_bytes()) {
            if !b.is_ascii_hexdigit() {
                return Err(Error::InvalidHash {
                    input: input.to_owned(),
                    reason: "non-hex character",
                });
            }
            *dst = b.to_ascii_uppercase();
        }

        Ok(Self(out))
    }

    /// Computes the NTLM hash of a password: MD4 over its UTF-16LE encoding.
    pub fn from_password(password: &str) -> Self {
        let mut hasher = Md4::new();
        for unit in password.encode_utf16() {
            hasher.update(unit.to_le_bytes());
        }
        let digest: [u8; 16] = hasher.finalize().into();
        Self::from_digest(&digest)
    }

    /// Hex-encodes a raw 16-byte digest.
    #[inline]
    pub fn from_digest(digest: &[u8; 16]) -> Self {
        let mut out = [0u8; HASH_LEN];
        for (i, byte) in digest.iter().enumerate() {
            out[i * 2] = HEX_CHARS[(byte >> 4) as usize];
            out[i * 2 + 1] = HEX_CHARS[(byte & 0x0f) as usize];
        }
        Self(out)
    }

    #[inline]
    pub fn as_bytes(&self) -> &[u8; HASH_LEN] {
        &self.0
    }

    #[inline]
    pub fn as_str(&self) -> &str {
        // SAFETY: constructed only from ASCII hex digits.
        unsafe { std::str::from_utf8_unchecked(&self.0) }
    }
}

impl FromStr for NtlmHash {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for NtlmHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Debug for NtlmHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "NtlmHash({})", self.as_str())
    }
}
