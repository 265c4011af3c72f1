//! Error handling module for DubForge

use std::fmt;
use std::path::{Path, PathBuf};

use thiserror::Error;

/// Which encoder pass an operation belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EncodePass {
    /// Analysis pass that writes the pass log
    Analysis,
    /// Final pass that writes the compressed file
    Final,
}

impl EncodePass {
    /// Value passed to the encoder's `-pass` flag
    pub fn number(self) -> u8 {
        match self {
            EncodePass::Analysis => 1,
            EncodePass::Final => 2,
        }
    }
}

impl fmt::Display for EncodePass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "pass {}", self.number())
    }
}

/// Main error type for DubForge operations
#[derive(Error, Debug)]
pub enum DubForgeError {
    /// Source file does not exist
    #[error("File not found: {path}")]
    FileNotFound { path: String },

    /// External binary is not on the execution path
    #[error("Required tool not found: {tool}")]
    ToolNotFound { tool: String },

    /// Encoder exited non-zero
    #[error("Compression failed during {pass}: {stderr}")]
    CompressionFailed { pass: EncodePass, stderr: String },

    /// Planned video bitrate leaves nothing for the picture
    #[error("Planned video bitrate {bitrate} bps is not encodable")]
    BitrateTooLow { bitrate: i64 },

    /// Duration cannot be used to size an encode
    #[error("Invalid duration for compression planning: {duration}")]
    InvalidDuration { duration: f64 },

    /// A subprocess exited non-zero outside the encoder passes
    #[error("{program} exited with code {code:?}: {stderr}")]
    CommandFailed {
        program: String,
        code: Option<i32>,
        stderr: String,
    },

    /// Inspection report could not be understood
    #[error("Failed to parse probe output: {message}")]
    ProbeParse { message: String },

    /// Remote API rejected the key (HTTP 401)
    #[error("Invalid API key")]
    InvalidApiKey,

    /// Remote resource does not exist (HTTP 404)
    #[error("Dubbing not found: {context}")]
    DubbingNotFound { context: String },

    /// Download attempted before the job reached a terminal state
    #[error("Dubbing {id} is still in progress")]
    DubbingInProgress { id: String },

    /// Job reached the failed terminal state
    #[error("Dubbing {id} failed: {}", .message.as_deref().unwrap_or("no error message supplied"))]
    DubbingFailed { id: String, message: Option<String> },

    /// Any other non-2xx answer from the remote API
    #[error("{context} returned HTTP {status}: {message}")]
    Api {
        context: String,
        status: u16,
        message: String,
    },

    /// Transport-level HTTP failure
    #[error("{context}: {source}")]
    Http {
        context: String,
        #[source]
        source: reqwest::Error,
    },

    /// JSON decoding failure
    #[error("{context}: {source}")]
    Json {
        context: String,
        #[source]
        source: serde_json::Error,
    },

    /// I/O error with the step that produced it
    #[error("{context}: {source}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },

    /// Upload body producer failed
    #[error("Upload stream failed: {message}")]
    Upload { message: String },

    /// Settings are missing or malformed
    #[error("Configuration error: {message}")]
    Config { message: String },

    /// Caller cancelled the operation
    #[error("Operation cancelled")]
    Cancelled,

    /// Lower-level failure tagged with the step and the file it concerned
    #[error("Failed to {step} {}: {source}", .path.display())]
    Step {
        step: &'static str,
        path: PathBuf,
        #[source]
        source: Box<DubForgeError>,
    },
}

impl DubForgeError {
    /// Wrap an I/O error with the step it happened in
    pub fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            context: context.into(),
            source,
        }
    }

    /// Wrap a transport error with the HTTP verb and path
    pub fn http(context: impl Into<String>, source: reqwest::Error) -> Self {
        Self::Http {
            context: context.into(),
            source,
        }
    }

    /// Wrap a JSON error with the step it happened in
    pub fn json(context: impl Into<String>, source: serde_json::Error) -> Self {
        Self::Json {
            context: context.into(),
            source,
        }
    }

    pub fn file_not_found(path: &Path) -> Self {
        Self::FileNotFound {
            path: path.display().to_string(),
        }
    }

    /// Tag the error with the step and file it happened in.
    ///
    /// Cancellation, a missing file and a missing tool pass through unchanged,
    /// as does an error that already carries a step.
    pub fn in_step(self, step: &'static str, path: &Path) -> Self {
        match self {
            Self::Cancelled | Self::FileNotFound { .. } | Self::ToolNotFound { .. } | Self::Step { .. } => self,
            other => Self::Step {
                step,
                path: path.to_path_buf(),
                source: Box::new(other),
            },
        }
    }

    /// Innermost error beneath any step tags
    pub fn root(&self) -> &DubForgeError {
        match self {
            Self::Step { source, .. } => source.root(),
            other => other,
        }
    }
}

/// Result type alias for DubForge operations
pub type DubForgeResult<T> = std::result::Result<T, DubForgeError>;
