use std::fmt;
use std::path::PathBuf;

/// Per-file upload ceiling (150 MiB).
pub const MAX_UPLOAD_BYTES: u64 = 150 * 1024 * 1024;

const VIDEO_EXTENSIONS: &[&str] = &["mp4", "mov", "avi", "m4s"];
const AUDIO_EXTENSIONS: &[&str] = &["mp3", "wav", "m4a", "m4s"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MediaRole {
    Video,
    Audio,
}

impl MediaRole {
    /// Maps a multipart field name to the role it carries.
    pub fn from_field_name(name: &str) -> Option<Self> {
        match name {
            "video" => Some(MediaRole::Video),
            "audio" => Some(MediaRole::Audio),
            _ => None,
        }
    }

    pub fn field_name(&self) -> &'static str {
        match self {
            MediaRole::Video => "video",
            MediaRole::Audio => "audio",
        }
    }

    pub fn allowed_extensions(&self) -> &'static [&'static str] {
        match self {
            MediaRole::Video => VIDEO_EXTENSIONS,
            MediaRole::Audio => AUDIO_EXTENSIONS,
        }
    }

    /// Case-insensitive suffix match against the role's allow-list.
    pub fn accepts(&self, file_name: &str) -> bool {
        let lower = file_name.to_ascii_lowercase();
        self.allowed_extensions()
            .iter()
            .any(|ext| lower.ends_with(&format!(".{}", ext)))
    }
}

impl fmt::Display for MediaRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.field_name())
    }
}

/// A file received for one role, stored in the working directory for the
/// lifetime of a single request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadedAsset {
    pub role: MediaRole,
    pub stored_path: PathBuf,
    pub original_name: String,
    pub size_bytes: u64,
}

/// Both assets of a request, after authentication and validation.
#[derive(Debug, Clone)]
pub struct ValidatedUpload {
    pub video: UploadedAsset,
    pub audio: UploadedAsset,
}
