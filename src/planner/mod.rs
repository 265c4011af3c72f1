//! Size-constrained encode planning module

pub mod strategy;

pub use strategy::CompressionPlanner;

/// Hard upload ceiling of the remote dubbing service (1 GiB)
pub const MAX_FILE_SIZE_BYTES: u64 = 1 << 30;

/// Size the compressor aims for, leaving margin below the ceiling (900 MiB)
pub const TARGET_SIZE_BYTES: u64 = 900 * 1024 * 1024;

/// Audio bitrate reserved out of the total budget, in bits per second
pub const AUDIO_BITRATE: i64 = 128_000;

/// Below this video bitrate the picture is fitted into 1080p
pub const HD_FALLBACK_BITRATE: i64 = 2_000_000;

/// Below this video bitrate quality is expected to be poor even at 1080p
pub const MIN_VIDEO_BITRATE: i64 = 500_000;
