use crate::domain::jobs::PublishResult;
use crate::error::PublishError;
use async_trait::async_trait;
use std::path::Path;
use uuid::Uuid;

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PublisherPort: Send + Sync {
    /// Upload the merged file at `output_path` under the job's remote path
    async fn publish(&self, output_path: &Path, job_id: Uuid)
        -> Result<PublishResult, PublishError>;
}
