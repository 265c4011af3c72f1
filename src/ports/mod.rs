// Ports - Interface definitions (contracts)

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use crate::error::{DubForgeError, DubForgeResult};

/// Captured result of a finished subprocess
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandOutput {
    /// Exit code, `None` when the process was terminated by a signal
    pub exit_code: Option<i32>,
    pub stdout: Vec<u8>,
    pub stderr: String,
}

impl CommandOutput {
    pub fn success(&self) -> bool {
        self.exit_code == Some(0)
    }
}

/// Port for running external tools.
///
/// Constructed by the caller and handed to every component that spawns a
/// process, so tests can substitute a scripted implementation.
#[async_trait]
pub trait ProcessPort: Send + Sync {
    /// Run `program` to completion and capture both output streams.
    ///
    /// A non-zero exit is reported through [`CommandOutput::exit_code`], not as
    /// an error. Spawn failures and cancellation are errors.
    async fn execute_capturing_stderr(
        &self,
        program: &str,
        args: &[String],
        cancel: &CancellationToken,
    ) -> DubForgeResult<CommandOutput>;

    /// Run `program` and return its standard output, failing on non-zero exit
    async fn execute(
        &self,
        program: &str,
        args: &[String],
        cancel: &CancellationToken,
    ) -> DubForgeResult<Vec<u8>> {
        let output = self.execute_capturing_stderr(program, args, cancel).await?;
        if output.success() {
            Ok(output.stdout)
        } else {
            Err(DubForgeError::CommandFailed {
                program: program.to_string(),
                code: output.exit_code,
                stderr: output.stderr,
            })
        }
    }
}
