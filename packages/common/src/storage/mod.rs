mod bucket;
mod error;
mod hash;
mod traits;

pub mod filesystem;

pub use bucket::{Bucket, StoredPath};
pub use error::StorageError;
pub use hash::ContentHash;
pub use traits::{BoxReader, FileStore, StoredFile};
