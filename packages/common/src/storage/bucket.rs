use std::fmt;
use std::path::PathBuf;

use super::error::StorageError;
use super::hash::ContentHash;

/// Top-level directory an upload is filed under.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Bucket {
    /// Files attached to submissions by participants.
    Submissions,
    /// Evaluation sheets attached to scores by judges.
    JudgeEvaluations,
}

impl Bucket {
    pub const ALL: &'static [Bucket] = &[Self::Submissions, Self::JudgeEvaluations];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Submissions => "submissions",
            Self::JudgeEvaluations => "judge_evaluations",
        }
    }

    fn from_dir(dir: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|b| b.as_str() == dir)
    }
}

impl fmt::Display for Bucket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Relative location of a stored file:
/// `{bucket}/{hash prefix}-{upload id}-{filename}`.
///
/// Every upload gets its own id, so no two rows ever share a file and deleting
/// one never affects another. This string is what the database keeps; it never contains `..` or nested
/// directories, so joining it onto a storage root cannot escape that root.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StoredPath {
    bucket: Bucket,
    name: String,
}

impl StoredPath {
    /// Fresh stored path for a file with the given name and digest.
    ///
    /// `filename` must already be a validated flat file name.
    pub fn new(bucket: Bucket, hash: &ContentHash, filename: &str) -> Self {
        Self {
            bucket,
            name: format!(
                "{}-{}-{}",
                hash.prefix(),
                uuid::Uuid::new_v4().simple(),
                filename
            ),
        }
    }

    /// Parse a path previously produced by [`StoredPath::new`].
    pub fn parse(path: &str) -> Result<Self, StorageError> {
        let invalid = || StorageError::InvalidPath(path.to_string());
        let (dir, name) = path.split_once('/').ok_or_else(invalid)?;
        let bucket = Bucket::from_dir(dir).ok_or_else(invalid)?;
        if name.is_empty()
            || name.contains(['/', '\\', '\0'])
            || name.starts_with('.')
        {
            return Err(invalid());
        }
        Ok(Self {
            bucket,
            name: name.to_string(),
        })
    }

    pub fn bucket(&self) -> Bucket {
        self.bucket
    }

    /// File name without the digest and upload id, as originally uploaded.
    pub fn original_filename(&self) -> &str {
        let rest = match self.name.split_once('-') {
            Some((prefix, rest)) if prefix.len() == ContentHash::PREFIX_LEN => rest,
            _ => return &self.name,
        };
        match rest.split_once('-') {
            Some((id, name)) if is_upload_id(id) => name,
            _ => rest,
        }
    }

    /// Location of this file beneath `root`.
    pub fn resolve(&self, root: &std::path::Path) -> PathBuf {
        root.join(self.bucket.as_str()).join(&self.name)
    }
}

fn is_upload_id(s: &str) -> bool {
    s.len() == UPLOAD_ID_LEN && s.bytes().all(|b| b.is_ascii_hexdigit())
}

/// Hex length of a simple-format v4 UUID.
const UPLOAD_ID_LEN: usize = 32;

impl fmt::Display for StoredPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.bucket, self.name)
    }
}
