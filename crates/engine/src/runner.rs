// SPDX-License-Identifier: MIT

//! The abstract "runner" collaborator (spec §6): given a command path,
//! argument list, working directory, and optional log sink, execute it and
//! report success/failure. The engine depends only on [`Runner`]; process
//! launching lives in [`ProcessRunner`] so tests can substitute a fake.

use std::path::{Path, PathBuf};
use std::process::Stdio;

use async_trait::async_trait;
use tokio::fs::OpenOptions;
use tokio::process::Command;

/// What to execute and how, assembled by [`crate::job::Job`] from its own
/// fields plus the owning tree's `cwd` and current iteration argument.
#[derive(Debug, Clone)]
pub struct RunRequest {
    pub command_path: String,
    pub args: Vec<String>,
    pub cwd: PathBuf,
    pub log_path: Option<PathBuf>,
}

/// Abstracts "launch this command and wait for it to finish" so the engine
/// never depends on `std::process` directly.
#[async_trait]
pub trait Runner: Send + Sync {
    async fn run(&self, request: RunRequest) -> std::io::Result<bool>;
}

/// Launches the command as a real child process via `tokio::process`.
#[derive(Debug, Default, Clone, Copy)]
pub struct ProcessRunner;

#[async_trait]
impl Runner for ProcessRunner {
    async fn run(&self, request: RunRequest) -> std::io::Result<bool> {
        let mut command = Command::new(&request.command_path);
        command.args(&request.args).current_dir(&request.cwd);

        match log_stdio(request.log_path.as_deref()).await? {
            Some((out, err)) => {
                command.stdout(out).stderr(err);
            }
            None => {
                command.stdout(Stdio::inherit()).stderr(Stdio::inherit());
            }
        }

        let status = command.status().await?;
        Ok(status.success())
    }
}

async fn log_stdio(log_path: Option<&Path>) -> std::io::Result<Option<(Stdio, Stdio)>> {
    let Some(path) = log_path else {
        return Ok(None);
    };
    let file = OpenOptions::new().create(true).append(true).open(path).await?;
    let std_file = file.into_std().await;
    let err_file = std_file.try_clone()?;
    Ok(Some((Stdio::from(std_file), Stdio::from(err_file))))
}

#[cfg(test)]
#[path = "runner_tests.rs"]
mod tests;
