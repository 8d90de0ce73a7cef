//! Base command execution abstraction
//!
//! Provides the foundational trait for executing external programs (the
//! agent CLI, template renderer, compilers), enabling dependency injection
//! for testing.

use std::path::PathBuf;
use std::process::Stdio;

use async_trait::async_trait;
use thiserror::Error;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tracing::debug;

#[cfg(any(test, feature = "testing"))]
use mockall::automock;

/// A program invocation: program, arguments, optional stdin and working
/// directory.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CommandSpec {
    pub program: String,
    pub args: Vec<String>,
    pub stdin: Option<String>,
    pub current_dir: Option<PathBuf>,
}

impl CommandSpec {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            ..Default::default()
        }
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    pub fn stdin(mut self, input: impl Into<String>) -> Self {
        self.stdin = Some(input.into());
        self
    }

    pub fn current_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.current_dir = Some(dir.into());
        self
    }

    /// Shell-like rendering for log lines and error messages.
    pub fn display(&self) -> String {
        std::iter::once(self.program.as_str())
            .chain(self.args.iter().map(String::as_str))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandOutput {
    pub status_code: i32,
    pub stdout: String,
    pub stderr: String,
}

impl CommandOutput {
    pub fn success(&self) -> bool {
        self.status_code == 0
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CommandError {
    #[error("Command not found: {command}")]
    CommandNotFound { command: String },
    #[error("IO error running {command}: {message}")]
    Io { command: String, message: String },
}

/// Trait for executing external commands
///
/// This abstraction allows the rest of the codebase to execute commands
/// without directly depending on tokio::process::Command, enabling testing
/// with mock implementations.
#[cfg_attr(any(test, feature = "testing"), automock)]
#[async_trait]
pub trait CommandExecutor: Send + Sync {
    async fn execute(&self, spec: &CommandSpec) -> Result<CommandOutput, CommandError>;
}

/// Real implementation using tokio::process::Command
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessCommandExecutor;

#[async_trait]
impl CommandExecutor for ProcessCommandExecutor {
    async fn execute(&self, spec: &CommandSpec) -> Result<CommandOutput, CommandError> {
        let io_error = |e: std::io::Error| {
            if e.kind() == std::io::ErrorKind::NotFound {
                CommandError::CommandNotFound {
                    command: spec.program.clone(),
                }
            } else {
                CommandError::Io {
                    command: spec.display(),
                    message: e.to_string(),
                }
            }
        };

        let mut command = Command::new(&spec.program);
        command
            .args(&spec.args)
            .stdin(if spec.stdin.is_some() { Stdio::piped() } else { Stdio::null() })
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        if let Some(dir) = &spec.current_dir {
            command.current_dir(dir);
        }

        debug!(command = %spec.display(), "Spawning external command");
        let mut child = command.spawn().map_err(io_error)?;

        // Stdin is fed from its own task so stdout and stderr keep draining
        // while a large input is still being written.
        let writer = match (spec.stdin.clone(), child.stdin.take()) {
            (Some(input), Some(mut stdin)) => Some(tokio::spawn(async move {
                let written = stdin.write_all(input.as_bytes()).await;
                // Dropping stdin closes the pipe so the child sees EOF.
                drop(stdin);
                match written {
                    Err(e) if e.kind() == std::io::ErrorKind::BrokenPipe => Ok(()),
                    other => other,
                }
            })),
            _ => None,
        };

        let output = child.wait_with_output().await.map_err(io_error)?;

        if let Some(writer) = writer {
            writer
                .await
                .map_err(|e| CommandError::Io {
                    command: spec.display(),
                    message: format!("stdin writer failed: {e}"),
                })?
                .map_err(io_error)?;
        }

        Ok(CommandOutput {
            status_code: output.status.code().unwrap_or(-1),
            stdout: String::from_utf8_lossy(&output.stdout).to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).to_string(),
        })
    }
}
