use std::fmt;
use std::path::PathBuf;
use uuid::Uuid;

/// Directory inside the content repository that receives merged videos.
pub const REMOTE_VIDEO_DIR: &str = "videos";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MergeJob {
    pub id: Uuid,
    pub video_path: PathBuf,
    pub audio_path: PathBuf,
    pub output_path: PathBuf,
}

pub fn remote_path(job_id: Uuid) -> String {
    format!("{}/{}.mp4", REMOTE_VIDEO_DIR, job_id)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublishResult {
    pub remote_path: String,
    pub public_url: String,
}

impl PublishResult {
    /// Derives the remote path and the GitHub Pages URL for a job.
    /// Reachability of the URL is not checked.
    pub fn for_job(owner: &str, repo: &str, job_id: Uuid) -> Self {
        let remote_path = remote_path(job_id);
        let public_url = format!("https://{}.github.io/{}/{}", owner, repo, remote_path);
        Self {
            remote_path,
            public_url,
        }
    }
}

/// Request lifecycle, used to tag logs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Received,
    Validated,
    Merging,
    Publishing,
    Done,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Received => "received",
            Stage::Validated => "validated",
            Stage::Merging => "merging",
            Stage::Publishing => "publishing",
            Stage::Done => "done",
        };
        f.write_str(name)
    }
}
