use crate::domain::jobs::MergeJob;
use crate::error::StorageError;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};
use uuid::Uuid;

/// Extension of merge output files.
pub const OUTPUT_EXTENSION: &str = "mp4";

/// Longest stem kept from a client file name, in bytes.
const MAX_STEM_BYTES: usize = 100;
/// Longest extension kept from a client file name, in bytes.
const MAX_EXTENSION_BYTES: usize = 16;

/// Create `path` and its parents if absent. Succeeds when it already exists.
pub async fn ensure_dir(path: &Path) -> Result<(), StorageError> {
    tokio::fs::create_dir_all(path)
        .await
        .map_err(|source| StorageError::CreateDir {
            path: path.to_path_buf(),
            source,
        })
}

/// Hands out collision-free paths inside the shared working directory.
#[derive(Debug)]
pub struct TempStorage {
    root: PathBuf,
    counter: AtomicU64,
}

impl TempStorage {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            counter: AtomicU64::new(0),
        }
    }

    pub async fn ensure_root(&self) -> Result<(), StorageError> {
        ensure_dir(&self.root).await
    }

    /// `{millis}-{counter}-{name}`. Only the final component of the client's
    /// file name is kept, with its stem shortened so the result stays well
    /// under filesystem name limits.
    pub fn upload_path(&self, original_name: &str) -> PathBuf {
        let millis = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis())
            .unwrap_or_default();
        let seq = self.counter.fetch_add(1, Ordering::Relaxed);
        self.root
            .join(format!("{}-{}-{}", millis, seq, sanitize_file_name(original_name)))
    }

    pub fn output_path(&self, job_id: Uuid) -> PathBuf {
        self.root.join(format!("{}.{}", job_id, OUTPUT_EXTENSION))
    }

    /// Builds a job with a fresh id for the given inputs.
    pub fn new_job(&self, video_path: PathBuf, audio_path: PathBuf) -> MergeJob {
        let id = Uuid::new_v4();
        MergeJob {
            id,
            video_path,
            audio_path,
            output_path: self.output_path(id),
        }
    }
}

fn sanitize_file_name(name: &str) -> String {
    let base = name
        .rsplit(|c| c == '/' || c == '\\')
        .next()
        .unwrap_or_default();
    let base = match base {
        "" | "." | ".." => return String::from("upload"),
        other => other,
    };
    match base.rsplit_once('.') {
        Some((stem, ext)) if !stem.is_empty() => format!(
            "{}.{}",
            truncate_at_char_boundary(stem, MAX_STEM_BYTES),
            truncate_at_char_boundary(ext, MAX_EXTENSION_BYTES)
        ),
        _ => truncate_at_char_boundary(base, MAX_STEM_BYTES).to_owned(),
    }
}

fn truncate_at_char_boundary(s: &str, max: usize) -> &str {
    if s.len() <= max {
        return s;
    }
    let mut end = max;
    while !s.is_char_boundary(end) {
        end -= 1;
    }
    &s[..end]
}

/// Remove a file, logging instead of failing. A missing file is not an error.
pub async fn remove_best_effort(path: &Path) -> bool {
    match tokio::fs::remove_file(path).await {
        Ok(()) => {
            tracing::debug!(path = %path.display(), "removed temporary file");
            true
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => true,
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "failed to remove temporary file");
            false
        }
    }
}

/// Temporary files owned by one request.
///
/// `cleanup` removes them asynchronously. Anything still tracked when the
/// guard is dropped (e.g. the request future was cancelled) is removed
/// synchronously in `Drop`.
#[derive(Debug, Default)]
pub struct TempFiles {
    paths: Vec<PathBuf>,
}

impl TempFiles {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn track(&mut self, path: impl Into<PathBuf>) {
        self.paths.push(path.into());
    }

    /// Stop tracking without deleting; ownership moves to the caller.
    pub fn release(mut self) -> Vec<PathBuf> {
        std::mem::take(&mut self.paths)
    }

    /// Each removal is independent; one failure does not stop the rest.
    pub async fn cleanup(mut self) {
        for path in std::mem::take(&mut self.paths) {
            remove_best_effort(&path).await;
        }
    }
}

impl Drop for TempFiles {
    fn drop(&mut self) {
        for path in self.paths.drain(..) {
            match std::fs::remove_file(&path) {
                Ok(()) => {}
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                Err(e) => {
                    tracing::warn!(path = %path.display(), error = %e, "failed to remove temporary file on drop")
                }
            }
        }
    }
}
