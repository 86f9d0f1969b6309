// src/fingerprint.rs
use sha2::{Digest, Sha256};
use std::fmt;

/// Dedup key of a listing: lowercase hex SHA-256 of its exact URL bytes.
///
/// No URL canonicalisation happens here. Two URLs differing only by a
/// tracking parameter are two different listings.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Fingerprint(String);

impl Fingerprint {
    pub fn of_url(url: &str) -> Self {
        let digest = Sha256::digest(url.as_bytes());
        let mut out = String::with_capacity(digest.len() * 2);
        for b in digest.iter() {
            use std::fmt::Write as _;
            let _ = write!(&mut out, "{:02x}", b);
        }
        Self(out)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// First 12 hex chars, enough to correlate log lines.
    pub fn short(&self) -> &str {
        &self.0[..12]
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

pub fn fingerprint(url: &str) -> Fingerprint {
    Fingerprint::of_url(url)
}
