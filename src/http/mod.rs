//! HTTP inbound adapter.
//!
//! - `POST /merge`: authenticated multipart upload of a `video` and an `audio` file
//! - `GET /health`: liveness probe

pub mod error;
pub mod handlers;
pub mod ingress;

use crate::application::orchestrator::MergeService;
use crate::ports::{merger::MergerPort, publisher::PublisherPort};
use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

/// Header carrying the shared secret.
pub const API_KEY_HEADER: &str = "x-api-key";

pub struct AppState<M, P> {
    pub service: Arc<MergeService<M, P>>,
    pub api_key: Arc<str>,
    pub max_upload_bytes: u64,
}

impl<M, P> Clone for AppState<M, P> {
    fn clone(&self) -> Self {
        Self {
            service: self.service.clone(),
            api_key: self.api_key.clone(),
            max_upload_bytes: self.max_upload_bytes,
        }
    }
}

impl<M, P> AppState<M, P> {
    pub fn new(service: MergeService<M, P>, api_key: &str, max_upload_bytes: u64) -> Self {
        Self {
            service: Arc::new(service),
            api_key: Arc::from(api_key),
            max_upload_bytes,
        }
    }
}

pub fn router<M, P>(state: AppState<M, P>) -> Router
where
    M: MergerPort + 'static,
    P: PublisherPort + 'static,
{
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/merge", post(handlers::merge::<M, P>))
        .route("/health", get(handlers::health))
        // Size is enforced per file while streaming.
        .layer(DefaultBodyLimit::disable())
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
