//! Error taxonomy for the merge pipeline.

use crate::domain::assets::MediaRole;
use std::io;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("Missing required file field: {0}")]
    MissingField(MediaRole),
    #[error("Only one {0} file is allowed")]
    DuplicateField(MediaRole),
    #[error("The {0} field must carry a file name")]
    MissingFileName(MediaRole),
    #[error("Invalid {role} file type: {file_name} (allowed: {allowed})")]
    UnsupportedExtension {
        role: MediaRole,
        file_name: String,
        allowed: String,
    },
    #[error("The {role} file exceeds the maximum size of {limit} bytes")]
    TooLarge { role: MediaRole, limit: u64 },
    #[error("Malformed multipart body: {0}")]
    Malformed(String),
}

impl ValidationError {
    pub fn unsupported_extension(role: MediaRole, file_name: &str) -> Self {
        ValidationError::UnsupportedExtension {
            role,
            file_name: file_name.to_owned(),
            allowed: role.allowed_extensions().join(", "),
        }
    }
}

#[derive(Debug, Error)]
pub enum MergeError {
    #[error("could not start {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: io::Error,
    },
    /// Tool ran and reported failure; `message` is its diagnostic output.
    #[error("{message}")]
    Failed { code: Option<i32>, message: String },
}

#[derive(Debug, Error)]
pub enum PublishError {
    #[error("could not read merged file {path:?}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("request to content API failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("content API responded {status}: {message}")]
    Rejected { status: u16, message: String },
}

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("could not create directory {path:?}: {source}")]
    CreateDir {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error(transparent)]
    Io(#[from] io::Error),
}

/// Every failure a request can end with.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("Unauthorized: missing or invalid API key")]
    Auth,
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error("merge failed: {0}")]
    Merge(#[from] MergeError),
    #[error("publish failed: {0}")]
    Publish(#[from] PublishError),
    #[error("storage failure: {0}")]
    Storage(#[from] StorageError),
}
