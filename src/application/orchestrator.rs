use crate::adapters::fs::{TempFiles, TempStorage};
use crate::domain::assets::ValidatedUpload;
use crate::domain::jobs::{MergeJob, PublishResult, Stage};
use crate::error::PipelineError;
use crate::ports::merger::MergerPort;
use crate::ports::publisher::PublisherPort;
use std::sync::Arc;

/// Drives one request from validated upload to published video.
pub struct MergeService<M, P> {
    storage: Arc<TempStorage>,
    merger: M,
    publisher: P,
}

impl<M, P> MergeService<M, P>
where
    M: MergerPort,
    P: PublisherPort,
{
    pub fn new(storage: Arc<TempStorage>, merger: M, publisher: P) -> Self {
        Self {
            storage,
            merger,
            publisher,
        }
    }

    pub fn storage(&self) -> &Arc<TempStorage> {
        &self.storage
    }

    /// Merge and publish. Both inputs and the merge output are deleted
    /// before this returns, whatever the outcome.
    pub async fn process(&self, upload: ValidatedUpload) -> Result<PublishResult, PipelineError> {
        let job = self
            .storage
            .new_job(upload.video.stored_path, upload.audio.stored_path);

        let mut files = TempFiles::new();
        files.track(&job.video_path);
        files.track(&job.audio_path);
        files.track(&job.output_path);

        tracing::info!(job_id = %job.id, stage = %Stage::Validated, "job created");
        let result = self.run(&job).await;

        files.cleanup().await;
        match &result {
            Ok(published) => tracing::info!(
                job_id = %job.id,
                stage = %Stage::Done,
                url = %published.public_url,
                "job finished"
            ),
            Err(e) => tracing::error!(job_id = %job.id, error = %e, "job failed"),
        }
        result
    }

    async fn run(&self, job: &MergeJob) -> Result<PublishResult, PipelineError> {
        tracing::info!(job_id = %job.id, stage = %Stage::Merging, "merging video and audio");
        self.merger.merge(job).await?;

        tracing::info!(job_id = %job.id, stage = %Stage::Publishing, "publishing merged video");
        let published = self.publisher.publish(&job.output_path, job.id).await?;
        Ok(published)
    }
}
