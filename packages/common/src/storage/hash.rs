use std::fmt;

use sha2::{Digest, Sha256};

/// SHA-256 digest of an uploaded file's contents.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct ContentHash([u8; 32]);

impl ContentHash {
    /// Number of hex characters of the digest kept in stored file names.
    pub const PREFIX_LEN: usize = 16;

    pub fn compute(data: &[u8]) -> Self {
        Self(Sha256::digest(data).into())
    }

    pub fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    /// The full digest as 64 lowercase hex characters.
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// The leading [`Self::PREFIX_LEN`] hex characters, used to keep
    /// same-named uploads with different contents apart.
    pub fn prefix(&self) -> String {
        hex::encode(&self.0[..Self::PREFIX_LEN / 2])
    }
}

impl fmt::Debug for ContentHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ContentHash({})", self.to_hex())
    }
}

impl fmt::Display for ContentHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}
