//! Request intake: shared-secret gate and multipart upload validation.

use super::API_KEY_HEADER;
use crate::adapters::fs::{TempFiles, TempStorage};
use crate::domain::assets::{MediaRole, UploadedAsset, ValidatedUpload};
use crate::error::{PipelineError, StorageError, ValidationError};
use axum::{body::Bytes, extract::Multipart, http::HeaderMap, BoxError};
use futures::{Stream, TryStreamExt};
use std::io;
use std::path::Path;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::{fs::File, io::BufWriter};
use tokio_util::io::StreamReader;

/// Exact match of the `x-api-key` header against the configured secret.
pub fn check_api_key(headers: &HeaderMap, expected: &str) -> Result<(), PipelineError> {
    let provided = headers
        .get(API_KEY_HEADER)
        .and_then(|value| value.to_str().ok());
    match provided {
        Some(key) if key == expected => Ok(()),
        _ => Err(PipelineError::Auth),
    }
}

/// Store the `video` and `audio` files of a multipart body.
///
/// On any failure, files already written for this request are removed
/// before the error is returned.
pub async fn receive(
    multipart: &mut Multipart,
    storage: &TempStorage,
    max_bytes: u64,
) -> Result<ValidatedUpload, PipelineError> {
    let mut files = TempFiles::new();
    match collect(multipart, storage, max_bytes, &mut files).await {
        Ok(upload) => {
            // Ownership of the stored files passes to the orchestrator.
            files.release();
            Ok(upload)
        }
        Err(e) => {
            files.cleanup().await;
            Err(e)
        }
    }
}

async fn collect(
    multipart: &mut Multipart,
    storage: &TempStorage,
    max_bytes: u64,
    files: &mut TempFiles,
) -> Result<ValidatedUpload, PipelineError> {
    storage.ensure_root().await?;

    let mut video: Option<UploadedAsset> = None;
    let mut audio: Option<UploadedAsset> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ValidationError::Malformed(e.body_text()))?
    {
        let Some(role) = field.name().and_then(MediaRole::from_field_name) else {
            tracing::debug!(field = ?field.name(), "ignoring unknown field");
            continue;
        };

        let slot = match role {
            MediaRole::Video => &mut video,
            MediaRole::Audio => &mut audio,
        };
        if slot.is_some() {
            return Err(ValidationError::DuplicateField(role).into());
        }

        let original_name = match field.file_name() {
            Some(name) if !name.is_empty() => name.to_owned(),
            _ => return Err(ValidationError::MissingFileName(role).into()),
        };
        if !role.accepts(&original_name) {
            return Err(ValidationError::unsupported_extension(role, &original_name).into());
        }

        let stored_path = storage.upload_path(&original_name);
        files.track(&stored_path);

        let size_bytes = stream_to_file(&stored_path, field, max_bytes)
            .await
            .map_err(|e| match e {
                UploadError::TooLarge => {
                    PipelineError::from(ValidationError::TooLarge {
                        role,
                        limit: max_bytes,
                    })
                }
                UploadError::Body(e) => ValidationError::Malformed(e.to_string()).into(),
                UploadError::Io(e) => StorageError::Io(e).into(),
            })?;

        tracing::info!(
            role = %role,
            file_name = %original_name,
            size_bytes,
            path = %stored_path.display(),
            "stored upload"
        );
        *slot = Some(UploadedAsset {
            role,
            stored_path,
            original_name,
            size_bytes,
        });
    }

    let video = video.ok_or(ValidationError::MissingField(MediaRole::Video))?;
    let audio = audio.ok_or(ValidationError::MissingField(MediaRole::Audio))?;
    Ok(ValidatedUpload { video, audio })
}

#[derive(Debug)]
enum UploadError {
    TooLarge,
    /// The client's body stream failed.
    Body(io::Error),
    /// Writing to disk failed.
    Io(io::Error),
}

// Save a `Stream` to a file, refusing more than `limit` bytes.
async fn stream_to_file<S, E>(path: &Path, stream: S, limit: u64) -> Result<u64, UploadError>
where
    S: Stream<Item = Result<Bytes, E>>,
    E: Into<BoxError>,
{
    let body_with_io_error = stream.map_err(|err| io::Error::new(io::ErrorKind::InvalidData, err));
    let body_reader = StreamReader::new(body_with_io_error);
    futures::pin_mut!(body_reader);
    let mut limited = body_reader.take(limit + 1);

    let mut file = BufWriter::new(File::create(path).await.map_err(UploadError::Io)?);
    let written = tokio::io::copy(&mut limited, &mut file)
        .await
        .map_err(|err| match err.kind() {
            io::ErrorKind::InvalidData => UploadError::Body(err),
            _ => UploadError::Io(err),
        })?;
    file.flush().await.map_err(UploadError::Io)?;

    if written > limit {
        return Err(UploadError::TooLarge);
    }
    Ok(written)
}
