//! Mergecast - Audio/Video merge and publish service
//!
//! Hexagonal Architecture:
//! - domain/: Pure types (assets, jobs, stages)
//! - ports/: Trait definitions for the merge and publish capabilities
//! - adapters/: Concrete implementations (filesystem, ffmpeg, GitHub)
//! - application/: Request orchestration
//! - http/: Inbound HTTP adapter (axum)
//! - config: Environment configuration

pub mod adapters;
pub mod application;
pub mod config;
pub mod domain;
pub mod error;
pub mod http;
pub mod ports;

pub use application::orchestrator::MergeService;
pub use config::Config;
pub use error::PipelineError;
