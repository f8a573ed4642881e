use std::io::Cursor;

use async_trait::async_trait;
use tokio::io::{AsyncRead, AsyncReadExt};

use super::bucket::{Bucket, StoredPath};
use super::error::StorageError;

/// Type alias for a boxed async reader.
pub type BoxReader = Box<dyn AsyncRead + Unpin + Send>;

/// Result of storing one upload.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StoredFile {
    pub path: StoredPath,
    pub size: u64,
}

/// Opaque storage for uploaded files, addressed by bucket-relative path.
#[async_trait]
pub trait FileStore: Send + Sync {
    /// Store bytes under `bucket`, keeping `filename` recognisable in the path.
    async fn put(
        &self,
        bucket: Bucket,
        filename: &str,
        data: &[u8],
    ) -> Result<StoredFile, StorageError> {
        let reader: BoxReader = Box::new(Cursor::new(data.to_vec()));
        self.put_stream(bucket, filename, reader).await
    }

    /// Store data from an async reader.
    async fn put_stream(
        &self,
        bucket: Bucket,
        filename: &str,
        reader: BoxReader,
    ) -> Result<StoredFile, StorageError>;

    /// Read a whole stored file into memory.
    async fn get(&self, path: &StoredPath) -> Result<Vec<u8>, StorageError> {
        let mut reader = self.get_stream(path).await?;
        let mut buf = Vec::new();
        reader.read_to_end(&mut buf).await?;
        Ok(buf)
    }

    /// Open a stored file for streaming.
    async fn get_stream(&self, path: &StoredPath) -> Result<BoxReader, StorageError>;

    /// Remove a stored file. Returns `false` if it was already gone.
    async fn delete(&self, path: &StoredPath) -> Result<bool, StorageError>;
}
