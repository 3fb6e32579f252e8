use super::{ingress, AppState};
use crate::domain::jobs::Stage;
use crate::error::{PipelineError, ValidationError};
use crate::ports::{merger::MergerPort, publisher::PublisherPort};
use axum::{
    extract::{multipart::MultipartRejection, Multipart, State},
    http::HeaderMap,
    Json,
};
use serde::Serialize;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MergeResponse {
    pub status: &'static str,
    pub message: &'static str,
    pub video_url: String,
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub message: &'static str,
}

/// `POST /merge`. The key is checked before any of the body is read.
pub async fn merge<M, P>(
    State(state): State<AppState<M, P>>,
    headers: HeaderMap,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<MergeResponse>, PipelineError>
where
    M: MergerPort + 'static,
    P: PublisherPort + 'static,
{
    ingress::check_api_key(&headers, &state.api_key).map_err(|e| {
        tracing::warn!("rejected request with missing or invalid API key");
        e
    })?;
    tracing::info!(stage = %Stage::Received, "merge request accepted");

    let mut multipart = multipart.map_err(|e| ValidationError::Malformed(e.body_text()))?;
    let upload = ingress::receive(
        &mut multipart,
        state.service.storage(),
        state.max_upload_bytes,
    )
    .await?;

    let published = state.service.process(upload).await?;

    Ok(Json(MergeResponse {
        status: "success",
        message: "Video and audio merged successfully",
        video_url: published.public_url,
    }))
}

/// `GET /health`
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        message: "Server is running",
    })
}
