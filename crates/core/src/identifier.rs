//! Document identifiers and their shard paths.
//!
//! A document is stored under a random version-4-shaped UUID string. The
//! first eight hex characters are split into a four-level folder path so the
//! store tree stays shallow and evenly spread.
//!
//! Identifiers come from a non-cryptographic generator (`rand::rng()`).
//! They are only meant to be collision-unlikely; since they double as the
//! storage path, anyone who can read the store listing can enumerate them.

use std::fmt;

use rand::Rng;

/// Separator used between store path segments.
pub const PATH_SEPARATOR: char = '/';

/// Number of two-character shard levels.
pub const SHARD_DEPTH: usize = 4;

/// Length of a formatted identifier (`8-4-4-4-12`).
pub const ID_LEN: usize = 36;

const HYPHEN_POSITIONS: [usize; 4] = [8, 13, 18, 23];

/// A version-4-shaped document identifier in lowercase hex.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DocumentId(String);

impl DocumentId {
    /// Generate a fresh identifier from the thread-local generator.
    pub fn generate() -> Self {
        Self::from_rng(&mut rand::rng())
    }

    /// Generate an identifier from the given generator.
    pub fn from_rng<R: Rng>(rng: &mut R) -> Self {
        let groups: [u16; 8] = std::array::from_fn(|_| rng.random());
        Self::from_groups(groups)
    }

    fn from_groups(g: [u16; 8]) -> Self {
        let version = (g[3] & 0x0fff) | 0x4000;
        let variant = (g[4] & 0x3fff) | 0x8000;
        Self(format!(
            "{:04x}{:04x}-{:04x}-{:04x}-{:04x}-{:04x}{:04x}{:04x}",
            g[0], g[1], g[2], version, variant, g[5], g[6], g[7]
        ))
    }

    /// Parse an identifier, checking the `8-4-4-4-12` layout, lowercase hex,
    /// the version nibble and the variant bits.
    pub fn parse(s: &str) -> Option<Self> {
        if s.len() != ID_LEN {
            return None;
        }

        for (i, c) in s.char_indices() {
            let ok = if HYPHEN_POSITIONS.contains(&i) {
                c == '-'
            } else {
                matches!(c, '0'..='9' | 'a'..='f')
            };
            if !ok {
                return None;
            }
        }

        let bytes = s.as_bytes();
        if bytes[14] != b'4' || !matches!(bytes[19], b'8' | b'9' | b'a' | b'b') {
            return None;
        }

        Some(Self(s.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Shard folder for this identifier: `aa/bb/cc/dd/`.
    pub fn shard_path(&self) -> String {
        let prefix = &self.0[..SHARD_DEPTH * 2];
        let mut path = String::with_capacity(SHARD_DEPTH * 3);
        for i in 0..SHARD_DEPTH {
            path.push_str(&prefix[i * 2..i * 2 + 2]);
            path.push(PATH_SEPARATOR);
        }
        path
    }

    /// Full retrieval path: shard path followed by the identifier.
    pub fn cache_path(&self) -> String {
        format!("{}{}", self.shard_path(), self.0)
    }
}

impl fmt::Display for DocumentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for DocumentId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
