use axum::body::Body;
use axum::extract::Multipart;
use axum::http::{StatusCode, header};
use axum::response::Response;
use common::storage::{Bucket, FileStore, StoredFile, StoredPath};
use tokio_util::io::ReaderStream;

use crate::error::AppError;
use crate::utils::filename::{attachment_disposition, validate_flat_filename};

/// Read the `file` part of a multipart body and hand it to the file store.
///
/// Other parts are ignored. The whole part is buffered, bounded by `max_size`.
pub async fn store_multipart_file(
    mut multipart: Multipart,
    store: &dyn FileStore,
    bucket: Bucket,
    max_size: u64,
) -> Result<StoredFile, AppError> {
    while let Some(mut field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::Validation(format!("Multipart error: {e}")))?
    {
        if field.name() != Some("file") {
            continue;
        }

        let raw_name = field
            .file_name()
            .map(str::to_string)
            .ok_or_else(|| AppError::Validation("File field must have a filename".into()))?;
        let filename = validate_flat_filename(&raw_name)
            .map_err(|e| AppError::Validation(e.message().into()))?
            .to_string();

        let mut data = Vec::new();
        while let Some(chunk) = field
            .chunk()
            .await
            .map_err(|e| AppError::Validation(format!("Upload read error: {e}")))?
        {
            if (data.len() + chunk.len()) as u64 > max_size {
                return Err(AppError::Validation(format!(
                    "File exceeds maximum size of {max_size} bytes"
                )));
            }
            data.extend_from_slice(&chunk);
        }

        return Ok(store.put(bucket, &filename, &data).await?);
    }

    Err(AppError::Validation("Missing 'file' field".into()))
}

/// Stream a stored file back as a download.
pub async fn file_response(store: &dyn FileStore, stored: &str) -> Result<Response, AppError> {
    let path = StoredPath::parse(stored)?;
    let reader = store.get_stream(&path).await?;
    let filename = path.original_filename();
    let content_type = mime_guess::from_path(filename)
        .first_or_octet_stream()
        .to_string();

    Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, content_type)
        .header(header::CONTENT_DISPOSITION, attachment_disposition(filename))
        .header(header::CACHE_CONTROL, "private, max-age=3600")
        .body(Body::from_stream(ReaderStream::new(reader)))
        .map_err(|e| AppError::Internal(format!("Failed to build response: {e}")))
}

/// Remove files whose rows are gone. Failures are logged, not returned.
pub async fn release_files(store: &dyn FileStore, files: &[String]) {
    for stored in files {
        let result = match StoredPath::parse(stored) {
            Ok(path) => store.delete(&path).await.map(|_| ()),
            Err(e) => Err(e),
        };
        if let Err(e) = result {
            tracing::warn!(path = %stored, error = %e, "Failed to remove stored file");
        }
    }
}
