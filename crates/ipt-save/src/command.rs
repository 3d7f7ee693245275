use crate::stream::parse_stream;
use ipt_core::{CommandConfig, SaveError, Tables};
use std::process::{ExitStatus, Stdio};
use thiserror::Error;
use tokio::io::AsyncReadExt;
use tokio::process::Command;
use tokio::sync::oneshot;
use tracing::{debug, info};

#[derive(Debug, Error)]
pub enum CollectError {
    #[error("failed to start {command}: {source}")]
    Spawn {
        command: String,
        source: std::io::Error,
    },

    #[error("{command} has no stdout pipe")]
    MissingStdout { command: String },

    /// Reading or parsing the command's output failed
    #[error("{command}: {source}")]
    Stream {
        command: String,
        source: SaveError,
    },

    /// The command ran but did not exit cleanly
    #[error("{command} exited with {status}: {stderr}")]
    Exit {
        command: String,
        status: ExitStatus,
        stderr: String,
    },

    #[error("failed to wait for {command}: {source}")]
    Wait {
        command: String,
        source: std::io::Error,
    },

    #[error("{command}: parser task ended without a result")]
    ParserGone { command: String },
}

/// A save command such as `iptables-save -c`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SaveCommand {
    program: String,
    args: Vec<String>,
}

impl SaveCommand {
    pub fn new(program: &str, args: &[&str]) -> Self {
        Self {
            program: program.to_string(),
            args: args.iter().map(|a| a.to_string()).collect(),
        }
    }

    pub fn iptables() -> Self {
        Self::new("iptables-save", &["-c"])
    }

    pub fn ip6tables() -> Self {
        Self::new("ip6tables-save", &["-c"])
    }

    /// Value of the `command` metric label
    pub fn label(&self) -> &str {
        &self.program
    }

    /// Run the command and parse its output while it is still running.
    ///
    /// Stdout is parsed on one task and stderr drained on another; the parse
    /// result comes back over a oneshot channel before the exit status is
    /// awaited. A failed exit is reported as [`CollectError::Exit`] even when
    /// the output itself parsed.
    pub async fn collect(&self) -> Result<Tables, CollectError> {
        info!(command = %self.program, "running save command");

        let mut child = Command::new(&self.program)
            .args(&self.args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|source| CollectError::Spawn {
                command: self.program.clone(),
                source,
            })?;

        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| CollectError::MissingStdout {
                command: self.program.clone(),
            })?;

        let (tx, rx) = oneshot::channel();
        tokio::spawn(async move {
            let _ = tx.send(parse_stream(stdout).await);
        });

        let stderr_task = child.stderr.take().map(|mut stderr| {
            tokio::spawn(async move {
                let mut buf = String::new();
                let _ = stderr.read_to_string(&mut buf).await;
                buf
            })
        });

        let parsed = rx.await.map_err(|_| CollectError::ParserGone {
            command: self.program.clone(),
        })?;

        let status = child.wait().await.map_err(|source| CollectError::Wait {
            command: self.program.clone(),
            source,
        })?;

        let stderr = match stderr_task {
            Some(task) => task.await.unwrap_or_default(),
            None => String::new(),
        };

        if !status.success() {
            return Err(CollectError::Exit {
                command: self.program.clone(),
                status,
                stderr: stderr.trim().to_string(),
            });
        }

        let tables = parsed.map_err(|source| CollectError::Stream {
            command: self.program.clone(),
            source,
        })?;

        debug!(command = %self.program, tables = tables.len(), "parsed save output");
        Ok(tables)
    }
}

impl From<&CommandConfig> for SaveCommand {
    fn from(config: &CommandConfig) -> Self {
        Self {
            program: config.program.clone(),
            args: config.args.clone(),
        }
    }
}
