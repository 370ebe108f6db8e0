//! External-tool invocation.
//!
//! Both pipeline tools (the FFmpeg remux and the FFprobe analysis) run
//! through the [`ToolRunner`] trait so callers and tests can substitute a
//! canned implementation instead of depending on the real binaries.

use std::io::ErrorKind;
use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use tokio::process::Command;
use tracing::{debug, warn};

use crate::error::{MediaError, MediaResult};

/// Captured result of a finished external process.
#[derive(Debug, Clone)]
pub struct ToolOutput {
    pub stdout: Vec<u8>,
    pub stderr: String,
    pub exit_code: Option<i32>,
}

impl ToolOutput {
    /// Whether the process exited with status zero.
    pub fn success(&self) -> bool {
        self.exit_code == Some(0)
    }
}

/// Capability to spawn an external tool and await its exit.
///
/// The caller observes only the exit status and the two captured output
/// streams after the process terminates.
#[async_trait]
pub trait ToolRunner: Send + Sync {
    async fn run(&self, program: &str, args: &[String]) -> MediaResult<ToolOutput>;
}

/// [`ToolRunner`] backed by real process spawning, with a hard timeout.
///
/// A stalled tool is killed when the timeout elapses (`kill_on_drop` reaps
/// the child once the await is abandoned) and surfaces as
/// [`MediaError::Timeout`].
pub struct SystemToolRunner {
    timeout: Duration,
}

impl SystemToolRunner {
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }
}

#[async_trait]
impl ToolRunner for SystemToolRunner {
    async fn run(&self, program: &str, args: &[String]) -> MediaResult<ToolOutput> {
        which::which(program).map_err(|_| MediaError::ToolNotFound(program.to_string()))?;

        debug!("Running {} {}", program, args.join(" "));

        let mut cmd = Command::new(program);
        cmd.args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        let output = match tokio::time::timeout(self.timeout, cmd.output()).await {
            Ok(result) => result.map_err(|e| {
                if e.kind() == ErrorKind::NotFound {
                    MediaError::ToolNotFound(program.to_string())
                } else {
                    MediaError::Io(e)
                }
            })?,
            Err(_) => {
                warn!(
                    tool = program,
                    timeout_secs = self.timeout.as_secs(),
                    "External tool timed out, killing process"
                );
                return Err(MediaError::Timeout {
                    tool: program.to_string(),
                    secs: self.timeout.as_secs(),
                });
            }
        };

        Ok(ToolOutput {
            stdout: output.stdout,
            stderr: String::from_utf8_lossy(&output.stderr).to_string(),
            exit_code: output.status.code(),
        })
    }
}
