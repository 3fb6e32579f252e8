//! Domain layer - Pure types shared by every stage of a request.

pub mod assets;
pub mod jobs;
