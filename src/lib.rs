//! DubForge Library
//!
//! Sizes local videos to a dubbing service's upload ceiling with a two-pass
//! encode, then submits, polls and downloads remote dubbing jobs.

pub mod adapters;
pub mod cli;
pub mod config_initialization;
pub mod domain;
pub mod dubbing;
pub mod engine;
pub mod error;
pub mod planner;
pub mod ports;
pub mod probe;
pub mod utils;

// Re-export commonly used types
pub use domain::model::{CompressionParams, DubbingConfig, DubbingJob, DubbingStatus, VideoInfo};
pub use dubbing::DubbingClient;
pub use engine::TwoPassCompressor;
pub use error::{DubForgeError, DubForgeResult, EncodePass};
pub use planner::CompressionPlanner;
pub use ports::{CommandOutput, ProcessPort};
pub use probe::VideoInspector;
