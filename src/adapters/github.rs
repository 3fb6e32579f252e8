//! Publisher backed by the GitHub repository contents API.

use crate::domain::jobs::{remote_path, PublishResult};
use crate::error::PublishError;
use crate::ports::publisher::PublisherPort;
use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use reqwest::{header, Client, Response};
use serde::{Deserialize, Serialize};
use std::path::Path;
use uuid::Uuid;

const USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"));
const API_VERSION: &str = "2022-11-28";

#[derive(Debug, Clone)]
pub struct GithubPublisher {
    client: Client,
    api_url: String,
    owner: String,
    repo: String,
    branch: String,
    token: String,
}

#[derive(Debug, Serialize)]
struct PutContentsRequest<'a> {
    message: String,
    content: String,
    branch: &'a str,
}

#[derive(Debug, Deserialize)]
struct ApiMessage {
    message: String,
}

impl GithubPublisher {
    pub fn new(
        client: Client,
        api_url: impl Into<String>,
        owner: impl Into<String>,
        repo: impl Into<String>,
        branch: impl Into<String>,
        token: impl Into<String>,
    ) -> Self {
        Self {
            client,
            api_url: api_url.into().trim_end_matches('/').to_string(),
            owner: owner.into(),
            repo: repo.into(),
            branch: branch.into(),
            token: token.into(),
        }
    }

    pub fn from_config(config: &crate::config::Config) -> Self {
        Self::new(
            Client::new(),
            &config.github_api_url,
            &config.github_owner,
            &config.github_repo,
            &config.github_branch,
            &config.github_token,
        )
    }

    fn contents_url(&self, path: &str) -> String {
        format!(
            "{}/repos/{}/{}/contents/{}",
            self.api_url, self.owner, self.repo, path
        )
    }

    fn put(&self, url: &str) -> reqwest::RequestBuilder {
        self.client
            .put(url)
            .bearer_auth(&self.token)
            .header(header::USER_AGENT, USER_AGENT)
            .header(header::ACCEPT, "application/vnd.github+json")
            .header("X-GitHub-Api-Version", API_VERSION)
    }
}

async fn ensure_success(response: Response) -> Result<Response, PublishError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    let message = serde_json::from_str::<ApiMessage>(&body)
        .map(|m| m.message)
        .unwrap_or(body);
    Err(PublishError::Rejected {
        status: status.as_u16(),
        message,
    })
}

#[async_trait]
impl PublisherPort for GithubPublisher {
    async fn publish(
        &self,
        output_path: &Path,
        job_id: Uuid,
    ) -> Result<PublishResult, PublishError> {
        let bytes = tokio::fs::read(output_path)
            .await
            .map_err(|source| PublishError::Read {
                path: output_path.to_path_buf(),
                source,
            })?;
        let path = remote_path(job_id);

        tracing::info!(
            job_id = %job_id,
            path = %path,
            bytes = bytes.len(),
            "uploading merged video"
        );

        let body = PutContentsRequest {
            message: format!("Add merged video {}", job_id),
            content: STANDARD.encode(&bytes),
            branch: &self.branch,
        };
        // Single create call; job ids are fresh, so an existing file is a
        // conflict reported by the API.
        let response = self
            .put(&self.contents_url(&path))
            .json(&body)
            .send()
            .await?;
        ensure_success(response).await?;

        Ok(PublishResult::for_job(&self.owner, &self.repo, job_id))
    }
}
