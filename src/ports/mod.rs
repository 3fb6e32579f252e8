//! Ports - Capability traits the orchestrator depends on.

pub mod merger;
pub mod publisher;
