// Adapters - External system implementations

#[cfg(any(test, feature = "testing"))]
pub mod mock_process;
pub mod process_tokio;
pub mod toml_config;
pub mod tracing_log;

// Re-export adapters
#[cfg(any(test, feature = "testing"))]
pub use mock_process::MockProcessAdapter;
pub use process_tokio::TokioProcessAdapter;
pub use toml_config::{FileConfigAdapter, Settings};
pub use tracing_log::{init_logging, LogFormat, LoggingConfig};
