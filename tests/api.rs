use async_trait::async_trait;
use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use mergecast::adapters::fs::TempStorage;
use mergecast::domain::jobs::{MergeJob, PublishResult};
use mergecast::error::{MergeError, PublishError};
use mergecast::http::{router, AppState};
use mergecast::ports::{merger::MergerPort, publisher::PublisherPort};
use mergecast::MergeService;
use serde_json::Value;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tempfile::{tempdir, TempDir};
use tower::ServiceExt;
use uuid::Uuid;

const API_KEY: &str = "test-secret";
const BOUNDARY: &str = "mergecast-test-boundary";

#[derive(Clone, Default)]
struct FakeMerger {
    failure: Option<String>,
    calls: Arc<AtomicUsize>,
    jobs: Arc<Mutex<Vec<MergeJob>>>,
}

#[async_trait]
impl MergerPort for FakeMerger {
    async fn merge(&self, job: &MergeJob) -> Result<(), MergeError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        assert!(job.video_path.exists(), "video input missing");
        assert!(job.audio_path.exists(), "audio input missing");
        self.jobs.lock().unwrap().push(job.clone());
        // Yield so concurrent requests interleave.
        tokio::task::yield_now().await;

        if let Some(message) = &self.failure {
            return Err(MergeError::Failed {
                code: Some(1),
                message: message.clone(),
            });
        }
        tokio::fs::write(&job.output_path, b"merged").await.unwrap();
        Ok(())
    }
}

#[derive(Clone, Default)]
struct FakePublisher {
    fail: bool,
    calls: Arc<AtomicUsize>,
    saw_output: Arc<AtomicBool>,
}

#[async_trait]
impl PublisherPort for FakePublisher {
    async fn publish(
        &self,
        output_path: &Path,
        job_id: Uuid,
    ) -> Result<PublishResult, PublishError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.saw_output
            .store(output_path.exists(), Ordering::SeqCst);
        if self.fail {
            return Err(PublishError::Rejected {
                status: 401,
                message: String::from("Bad credentials"),
            });
        }
        Ok(PublishResult::for_job("octo", "clips", job_id))
    }
}

struct Harness {
    _dir: TempDir,
    upload_dir: PathBuf,
    merger: FakeMerger,
    publisher: FakePublisher,
    app: Router,
}

impl Harness {
    fn new(merger: FakeMerger, publisher: FakePublisher) -> Self {
        Self::with_limit(merger, publisher, 150 * 1024 * 1024)
    }

    fn with_limit(merger: FakeMerger, publisher: FakePublisher, max_upload_bytes: u64) -> Self {
        let dir = tempdir().unwrap();
        let upload_dir = dir.path().join("uploads");
        let storage = Arc::new(TempStorage::new(&upload_dir));
        let service = MergeService::new(storage, merger.clone(), publisher.clone());
        let app = router(AppState::new(service, API_KEY, max_upload_bytes));
        Self {
            _dir: dir,
            upload_dir,
            merger,
            publisher,
            app,
        }
    }

    /// Files left in the working directory.
    fn leftovers(&self) -> Vec<PathBuf> {
        match std::fs::read_dir(&self.upload_dir) {
            Ok(entries) => entries.map(|e| e.unwrap().path()).collect(),
            Err(_) => Vec::new(),
        }
    }

    fn merge_calls(&self) -> usize {
        self.merger.calls.load(Ordering::SeqCst)
    }

    fn publish_calls(&self) -> usize {
        self.publisher.calls.load(Ordering::SeqCst)
    }

    async fn send(&self, request: Request<Body>) -> (StatusCode, Value) {
        let response = self.app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }
}

fn multipart_body(parts: &[(&str, &str, &str)]) -> Vec<u8> {
    let mut body = Vec::new();
    for (field, file_name, data) in parts {
        body.extend_from_slice(format!("--{}\r\n", BOUNDARY).as_bytes());
        body.extend_from_slice(
            format!(
                "Content-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\n",
                field, file_name
            )
            .as_bytes(),
        );
        body.extend_from_slice(b"Content-Type: application/octet-stream\r\n\r\n");
        body.extend_from_slice(data.as_bytes());
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{}--\r\n", BOUNDARY).as_bytes());
    body
}

fn merge_request(api_key: Option<&str>, parts: &[(&str, &str, &str)]) -> Request<Body> {
    let mut builder = Request::builder()
        .method("POST")
        .uri("/merge")
        .header(
            "content-type",
            format!("multipart/form-data; boundary={}", BOUNDARY),
        );
    if let Some(key) = api_key {
        builder = builder.header("x-api-key", key);
    }
    builder.body(Body::from(multipart_body(parts))).unwrap()
}

fn valid_parts() -> Vec<(&'static str, &'static str, &'static str)> {
    vec![
        ("video", "clip.mp4", "fake video bytes"),
        ("audio", "track.MP3", "fake audio bytes"),
    ]
}

#[tokio::test]
async fn test_health() {
    let harness = Harness::new(FakeMerger::default(), FakePublisher::default());
    let request = Request::builder()
        .uri("/health")
        .body(Body::empty())
        .unwrap();

    let (status, body) = harness.send(request).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    assert!(body["message"].is_string());
}

#[tokio::test]
async fn test_merge_success() {
    let harness = Harness::new(FakeMerger::default(), FakePublisher::default());

    let (status, body) = harness
        .send(merge_request(Some(API_KEY), &valid_parts()))
        .await;

    assert_eq!(status, StatusCode::OK, "body: {}", body);
    assert_eq!(body["status"], "success");
    assert!(body["message"].is_string());

    let url = body["videoUrl"].as_str().unwrap();
    let id = url
        .strip_prefix("https://octo.github.io/clips/videos/")
        .and_then(|rest| rest.strip_suffix(".mp4"))
        .unwrap();
    assert!(Uuid::parse_str(id).is_ok());

    assert_eq!(harness.merge_calls(), 1);
    assert_eq!(harness.publish_calls(), 1);
    assert!(harness.publisher.saw_output.load(Ordering::SeqCst));
    assert!(harness.leftovers().is_empty());
}

#[tokio::test]
async fn test_long_file_name_is_accepted() {
    let harness = Harness::new(FakeMerger::default(), FakePublisher::default());
    let long_name = format!("{}.mp4", "a".repeat(245));
    let parts: Vec<(&str, &str, &str)> = vec![
        ("video", long_name.as_str(), "fake video bytes"),
        ("audio", "track.mp3", "fake audio bytes"),
    ];

    let (status, body) = harness.send(merge_request(Some(API_KEY), &parts)).await;

    assert_eq!(status, StatusCode::OK, "body: {}", body);
    assert_eq!(body["status"], "success");

    let jobs = harness.merger.jobs.lock().unwrap();
    let stored = jobs[0].video_path.file_name().unwrap().to_str().unwrap();
    assert!(stored.len() < 255, "stored name too long: {}", stored.len());
    assert!(stored.ends_with(".mp4"));
    drop(jobs);

    assert_eq!(harness.merge_calls(), 1);
    assert!(harness.leftovers().is_empty());
}

#[tokio::test]
async fn test_missing_api_key() {
    let harness = Harness::new(FakeMerger::default(), FakePublisher::default());

    let (status, body) = harness.send(merge_request(None, &valid_parts())).await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert!(body["error"].is_string());
    assert_eq!(harness.merge_calls(), 0);
    assert!(!harness.upload_dir.exists());
}

#[tokio::test]
async fn test_wrong_api_key() {
    let harness = Harness::new(FakeMerger::default(), FakePublisher::default());

    let (status, _) = harness
        .send(merge_request(Some("not-the-secret"), &valid_parts()))
        .await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(harness.merge_calls(), 0);
    assert!(!harness.upload_dir.exists());
}

#[tokio::test]
async fn test_audio_with_bad_extension() {
    let harness = Harness::new(FakeMerger::default(), FakePublisher::default());
    let parts: Vec<(&str, &str, &str)> = vec![
        ("video", "clip.mp4", "fake video bytes"),
        ("audio", "setup.exe", "MZ"),
    ];

    let (status, body) = harness.send(merge_request(Some(API_KEY), &parts)).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("audio"));
    assert_eq!(harness.merge_calls(), 0);
    assert!(harness.leftovers().is_empty());
}

#[tokio::test]
async fn test_missing_audio_removes_video() {
    let harness = Harness::new(FakeMerger::default(), FakePublisher::default());
    let parts: Vec<(&str, &str, &str)> = vec![("video", "clip.mp4", "fake video bytes")];

    let (status, body) = harness.send(merge_request(Some(API_KEY), &parts)).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("audio"));
    assert_eq!(harness.merge_calls(), 0);
    assert!(harness.upload_dir.exists());
    assert!(harness.leftovers().is_empty());
}

#[tokio::test]
async fn test_duplicate_video_field() {
    let harness = Harness::new(FakeMerger::default(), FakePublisher::default());
    let parts: Vec<(&str, &str, &str)> = vec![
        ("video", "one.mp4", "first"),
        ("video", "two.mp4", "second"),
        ("audio", "track.mp3", "audio"),
    ];

    let (status, _) = harness.send(merge_request(Some(API_KEY), &parts)).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(harness.merge_calls(), 0);
    assert!(harness.leftovers().is_empty());
}

#[tokio::test]
async fn test_unknown_fields_are_ignored() {
    let harness = Harness::new(FakeMerger::default(), FakePublisher::default());
    let parts: Vec<(&str, &str, &str)> = vec![
        ("title", "notes.txt", "hello"),
        ("video", "clip.mov", "fake video bytes"),
        ("audio", "track.wav", "fake audio bytes"),
    ];

    let (status, _) = harness.send(merge_request(Some(API_KEY), &parts)).await;

    assert_eq!(status, StatusCode::OK);
    assert!(harness.leftovers().is_empty());
}

#[tokio::test]
async fn test_oversized_file() {
    let harness = Harness::with_limit(FakeMerger::default(), FakePublisher::default(), 8);

    let (status, body) = harness
        .send(merge_request(Some(API_KEY), &valid_parts()))
        .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("maximum size"));
    assert_eq!(harness.merge_calls(), 0);
    assert!(harness.leftovers().is_empty());
}

#[tokio::test]
async fn test_non_multipart_body() {
    let harness = Harness::new(FakeMerger::default(), FakePublisher::default());
    let request = Request::builder()
        .method("POST")
        .uri("/merge")
        .header("content-type", "application/json")
        .header("x-api-key", API_KEY)
        .body(Body::from("{}"))
        .unwrap();

    let (status, body) = harness.send(request).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].is_string());
}

#[tokio::test]
async fn test_merge_failure() {
    let merger = FakeMerger {
        failure: Some(String::from("Invalid data found when processing input")),
        ..Default::default()
    };
    let harness = Harness::new(merger, FakePublisher::default());

    let (status, body) = harness
        .send(merge_request(Some(API_KEY), &valid_parts()))
        .await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    let error = body["error"].as_str().unwrap();
    assert!(error.contains("merge"));
    assert!(error.contains("Invalid data found"));
    assert!(body.get("videoUrl").is_none());
    assert_eq!(harness.publish_calls(), 0);
    assert!(harness.leftovers().is_empty());
}

#[tokio::test]
async fn test_publish_failure_removes_merged_file() {
    let publisher = FakePublisher {
        fail: true,
        ..Default::default()
    };
    let harness = Harness::new(FakeMerger::default(), publisher);

    let (status, body) = harness
        .send(merge_request(Some(API_KEY), &valid_parts()))
        .await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(body["error"].as_str().unwrap().contains("publish"));
    assert!(body.get("videoUrl").is_none());
    assert!(harness.publisher.saw_output.load(Ordering::SeqCst));
    assert!(harness.leftovers().is_empty());
}

#[tokio::test]
async fn test_concurrent_requests_use_distinct_paths() {
    let harness = Harness::new(FakeMerger::default(), FakePublisher::default());

    let (first, second) = tokio::join!(
        harness.send(merge_request(Some(API_KEY), &valid_parts())),
        harness.send(merge_request(Some(API_KEY), &valid_parts())),
    );

    assert_eq!(first.0, StatusCode::OK);
    assert_eq!(second.0, StatusCode::OK);
    assert_ne!(first.1["videoUrl"], second.1["videoUrl"]);

    let jobs = harness.merger.jobs.lock().unwrap();
    assert_eq!(jobs.len(), 2);
    assert_ne!(jobs[0].id, jobs[1].id);
    assert_ne!(jobs[0].video_path, jobs[1].video_path);
    assert_ne!(jobs[0].audio_path, jobs[1].audio_path);
    assert_ne!(jobs[0].output_path, jobs[1].output_path);
    drop(jobs);
    assert!(harness.leftovers().is_empty());
}
