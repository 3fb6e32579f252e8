use crate::domain::jobs::MergeJob;
use crate::error::MergeError;
use async_trait::async_trait;

/// Muxes a job's video and audio into its output path.
///
/// Resolves exactly once: `Ok` when the output file is fully written,
/// `Err` carrying the tool's diagnostic otherwise.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait MergerPort: Send + Sync {
    async fn merge(&self, job: &MergeJob) -> Result<(), MergeError>;
}
