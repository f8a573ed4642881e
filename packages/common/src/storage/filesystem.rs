use std::path::PathBuf;

use async_trait::async_trait;
use sha2::{Digest, Sha256};
use tokio::fs;
use tokio::io::{AsyncReadExt, AsyncWriteExt, BufReader};

use super::bucket::{Bucket, StoredPath};
use super::error::StorageError;
use super::hash::ContentHash;
use super::traits::{BoxReader, FileStore, StoredFile};

/// Local-directory file store.
///
/// Files land at `{root}/{bucket}/{hash prefix}-{upload id}-{filename}`. Writes go to
/// `{root}/.tmp` first and are renamed into place once complete, so readers
/// never observe a partial upload.
pub struct FilesystemFileStore {
    root: PathBuf,
    max_size: u64,
}

impl FilesystemFileStore {
    pub async fn new(root: PathBuf, max_size: u64) -> Result<Self, StorageError> {
        fs::create_dir_all(root.join(".tmp")).await?;
        for bucket in Bucket::ALL {
            fs::create_dir_all(root.join(bucket.as_str())).await?;
        }
        Ok(Self { root, max_size })
    }

    fn temp_path(&self) -> PathBuf {
        self.root.join(".tmp").join(uuid::Uuid::new_v4().to_string())
    }

    async fn discard(path: &PathBuf) {
        if let Err(e) = fs::remove_file(path).await {
            tracing::warn!(path = %path.display(), error = %e, "Failed to remove temporary upload");
        }
    }
}

#[async_trait]
impl FileStore for FilesystemFileStore {
    async fn put_stream(
        &self,
        bucket: Bucket,
        filename: &str,
        mut reader: BoxReader,
    ) -> Result<StoredFile, StorageError> {
        let temp_path = self.temp_path();
        let mut hasher = Sha256::new();
        let mut total_bytes: u64 = 0;

        let mut buf = vec![0u8; 64 * 1024];
        let mut temp_file = fs::File::create(&temp_path).await?;

        loop {
            let n = match reader.read(&mut buf).await {
                Ok(n) => n,
                Err(e) => {
                    drop(temp_file);
                    Self::discard(&temp_path).await;
                    return Err(e.into());
                }
            };
            if n == 0 {
                break;
            }

            total_bytes += n as u64;
            if total_bytes > self.max_size {
                drop(temp_file);
                Self::discard(&temp_path).await;
                return Err(StorageError::SizeLimitExceeded {
                    actual: total_bytes,
                    limit: self.max_size,
                });
            }

            hasher.update(&buf[..n]);
            temp_file.write_all(&buf[..n]).await?;
        }

        temp_file.flush().await?;
        drop(temp_file);

        let hash = ContentHash::from_bytes(hasher.finalize().into());
        let path = StoredPath::new(bucket, &hash, filename);
        let target = path.resolve(&self.root);

        if let Err(e) = fs::rename(&temp_path, &target).await {
            Self::discard(&temp_path).await;
            return Err(e.into());
        }

        Ok(StoredFile {
            path,
            size: total_bytes,
        })
    }

    async fn get_stream(&self, path: &StoredPath) -> Result<BoxReader, StorageError> {
        match fs::File::open(path.resolve(&self.root)).await {
            Ok(file) => Ok(Box::new(BufReader::new(file))),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(StorageError::NotFound(path.to_string()))
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn delete(&self, path: &StoredPath) -> Result<bool, StorageError> {
        match fs::remove_file(path.resolve(&self.root)).await {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }
}
