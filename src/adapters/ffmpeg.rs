use crate::domain::jobs::MergeJob;
use crate::error::MergeError;
use crate::ports::merger::MergerPort;
use async_trait::async_trait;
use std::ffi::OsString;
use std::path::PathBuf;
use std::process::Stdio;
use tokio::process::Command;

/// Runs the ffmpeg CLI to mux a job's inputs.
#[derive(Debug, Clone)]
pub struct FfmpegMerger {
    program: PathBuf,
}

impl FfmpegMerger {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
        }
    }

    /// Copy the video stream, transcode audio to AAC, allow experimental
    /// codecs, and only report errors.
    pub fn merge_args(job: &MergeJob) -> Vec<OsString> {
        let mut args: Vec<OsString> = Vec::new();
        args.push("-y".into());
        args.push("-i".into());
        args.push(job.video_path.clone().into());
        args.push("-i".into());
        args.push(job.audio_path.clone().into());
        for option in [
            "-map", "0:v:0", "-map", "1:a:0", "-c:v", "copy", "-c:a", "aac", "-strict",
            "experimental", "-loglevel", "error",
        ] {
            args.push(option.into());
        }
        args.push(job.output_path.clone().into());
        args
    }
}

#[async_trait]
impl MergerPort for FfmpegMerger {
    async fn merge(&self, job: &MergeJob) -> Result<(), MergeError> {
        tracing::debug!(job_id = %job.id, program = %self.program.display(), "starting ffmpeg");

        // `output()` resolves once, after the process exits.
        let output = Command::new(&self.program)
            .args(Self::merge_args(job))
            .stdin(Stdio::null())
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|source| MergeError::Spawn {
                program: self.program.display().to_string(),
                source,
            })?;

        if output.status.success() {
            return Ok(());
        }

        let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
        let message = if stderr.is_empty() {
            format!("ffmpeg exited with {}", output.status)
        } else {
            stderr
        };
        Err(MergeError::Failed {
            code: output.status.code(),
            message,
        })
    }
}
