//! Subprocess adapter backed by `tokio::process`
//!
//! Children are killed when their future is dropped, which is how a cancelled
//! probe or encoder pass stops the external tool.

use std::io;
use std::process::Stdio;

use async_trait::async_trait;
use tokio::process::Command;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::error::{DubForgeError, DubForgeResult};
use crate::ports::{CommandOutput, ProcessPort};

/// Spawn-error messages that mean the binary is missing on platforms or
/// wrappers that do not report `ErrorKind::NotFound`
const NOT_FOUND_MARKERS: &[&str] = &[
    "executable file not found",
    "no such file or directory",
    "cannot find the file",
    "not found",
];

/// Turn a spawn failure into a domain error.
///
/// Missing binaries are recognised by error kind first and by message as a
/// fallback.
pub fn classify_spawn_error(tool: &str, err: io::Error) -> DubForgeError {
    if err.kind() == io::ErrorKind::NotFound {
        return DubForgeError::ToolNotFound {
            tool: tool.to_string(),
        };
    }

    let message = err.to_string().to_lowercase();
    if NOT_FOUND_MARKERS.iter().any(|marker| message.contains(marker)) {
        return DubForgeError::ToolNotFound {
            tool: tool.to_string(),
        };
    }

    DubForgeError::io(format!("failed to start {}", tool), err)
}

/// Process adapter that runs real binaries resolved through `PATH`
#[derive(Debug, Clone, Default)]
pub struct TokioProcessAdapter;

impl TokioProcessAdapter {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl ProcessPort for TokioProcessAdapter {
    async fn execute_capturing_stderr(
        &self,
        program: &str,
        args: &[String],
        cancel: &CancellationToken,
    ) -> DubForgeResult<CommandOutput> {
        if cancel.is_cancelled() {
            return Err(DubForgeError::Cancelled);
        }

        debug!(program, ?args, "Spawning process");

        let child = Command::new(program)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| classify_spawn_error(program, e))?;

        let output = tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                debug!(program, "Process cancelled, killing child");
                return Err(DubForgeError::Cancelled);
            }
            output = child.wait_with_output() => {
                output.map_err(|e| DubForgeError::io(format!("failed waiting for {}", program), e))?
            }
        };

        Ok(CommandOutput {
            exit_code: output.status.code(),
            stdout: output.stdout,
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        })
    }
}
