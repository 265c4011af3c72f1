// Mock process adapter - Scripted subprocess results for tests

use std::collections::VecDeque;
use std::io;
use std::path::PathBuf;
use std::sync::Mutex;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use crate::adapters::process_tokio::classify_spawn_error;
use crate::error::{DubForgeError, DubForgeResult};
use crate::ports::{CommandOutput, ProcessPort};

/// One scripted answer, consumed in call order
#[derive(Debug, Clone, Default)]
pub struct MockResponse {
    exit_code: Option<i32>,
    stdout: Vec<u8>,
    stderr: String,
    spawn_error: Option<io::ErrorKind>,
    files: Vec<PathBuf>,
    write_last_arg: bool,
}

impl MockResponse {
    /// Exit 0 with the given standard output
    pub fn stdout(bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            exit_code: Some(0),
            stdout: bytes.into(),
            ..Default::default()
        }
    }

    /// Exit 0 with no output
    pub fn success() -> Self {
        Self::stdout(Vec::new())
    }

    /// Exit with `code` and the given stderr text
    pub fn failure(code: i32, stderr: impl Into<String>) -> Self {
        Self {
            exit_code: Some(code),
            stderr: stderr.into(),
            ..Default::default()
        }
    }

    /// Fail to spawn with the given error kind
    pub fn spawn_error(kind: io::ErrorKind) -> Self {
        Self {
            spawn_error: Some(kind),
            ..Default::default()
        }
    }

    /// Create an empty file at `path` when this response is consumed
    pub fn creating(mut self, path: impl Into<PathBuf>) -> Self {
        self.files.push(path.into());
        self
    }

    /// Create a file at the path given as the last argument
    pub fn writing_output(mut self) -> Self {
        self.write_last_arg = true;
        self
    }
}

/// A call received by the mock
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedCall {
    pub program: String,
    pub args: Vec<String>,
}

/// Process adapter that replays scripted responses and records every call
#[derive(Debug, Default)]
pub struct MockProcessAdapter {
    responses: Mutex<VecDeque<MockResponse>>,
    calls: Mutex<Vec<RecordedCall>>,
}

impl MockProcessAdapter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a response (builder form)
    pub fn with_response(self, response: MockResponse) -> Self {
        self.push(response);
        self
    }

    /// Queue a response
    pub fn push(&self, response: MockResponse) {
        self.responses
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push_back(response);
    }

    /// Calls received so far
    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap_or_else(|e| e.into_inner()).len()
    }
}

#[async_trait]
impl ProcessPort for MockProcessAdapter {
    async fn execute_capturing_stderr(
        &self,
        program: &str,
        args: &[String],
        cancel: &CancellationToken,
    ) -> DubForgeResult<CommandOutput> {
        if cancel.is_cancelled() {
            return Err(DubForgeError::Cancelled);
        }

        self.calls
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(RecordedCall {
                program: program.to_string(),
                args: args.to_vec(),
            });

        let response = self
            .responses
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .pop_front()
            .ok_or_else(|| DubForgeError::CommandFailed {
                program: program.to_string(),
                code: None,
                stderr: "MockProcessAdapter: no scripted response left".to_string(),
            })?;

        if let Some(kind) = response.spawn_error {
            return Err(classify_spawn_error(program, io::Error::from(kind)));
        }

        let mut files = response.files.clone();
        if response.write_last_arg {
            if let Some(last) = args.last() {
                files.push(PathBuf::from(last));
            }
        }
        for file in files {
            tokio::fs::write(&file, b"mock output")
                .await
                .map_err(|e| DubForgeError::io(format!("mock could not create {}", file.display()), e))?;
        }

        Ok(CommandOutput {
            exit_code: response.exit_code,
            stdout: response.stdout,
            stderr: response.stderr,
        })
    }
}
