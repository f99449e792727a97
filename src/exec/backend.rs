// src/exec/backend.rs

//! Pluggable command runner abstraction.
//!
//! The dispatcher talks to a `CommandRunner` instead of spawning processes
//! itself. This makes it easy to swap in a fake runner in tests.
//!
//! - [`ProcessRunner`] is the production implementation, built on
//!   `tokio::process::Command`.
//! - [`DryRunRunner`] only logs what would have been run (`--dry-run`).

use std::future::Future;
use std::io::Read;
use std::path::PathBuf;
use std::pin::Pin;
use std::process::Stdio;

use anyhow::Context;
use tokio::process::Command;
use tracing::{debug, info};

use crate::errors::Result;

/// What a finished command produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandOutput {
    pub success: bool,
    /// Exit code, `None` if the process was killed by a signal.
    pub code: Option<i32>,
    /// stdout and stderr interleaved in the order they were written.
    pub combined: Vec<u8>,
}

impl CommandOutput {
    pub fn combined_lossy(&self) -> String {
        String::from_utf8_lossy(&self.combined).into_owned()
    }
}

/// Trait abstracting how a batch command is executed.
pub trait CommandRunner: Send {
    /// Run `template[0]` with `template[1..]` followed by `paths` as
    /// arguments, and wait for it to finish.
    fn run_command(
        &mut self,
        template: &[String],
        paths: &[PathBuf],
    ) -> Pin<Box<dyn Future<Output = Result<CommandOutput>> + Send + '_>>;
}

/// Runs commands as real child processes.
#[derive(Debug, Clone, Default)]
pub struct ProcessRunner;

impl CommandRunner for ProcessRunner {
    fn run_command(
        &mut self,
        template: &[String],
        paths: &[PathBuf],
    ) -> Pin<Box<dyn Future<Output = Result<CommandOutput>> + Send + '_>> {
        let template = template.to_vec();
        let paths = paths.to_vec();

        Box::pin(async move {
            let (program, args) = template
                .split_first()
                .context("command template is empty")?;

            // stdout and stderr share one pipe so the output keeps the order
            // the command wrote it in.
            let (mut reader, writer) = std::io::pipe().context("creating output pipe")?;
            let mut cmd = Command::new(program);
            cmd.args(args)
                .args(&paths)
                .stdin(Stdio::null())
                .stdout(writer.try_clone().context("cloning output pipe")?)
                .stderr(writer)
                .kill_on_drop(true);

            debug!(program = %program, ?args, paths = paths.len(), "spawning command");

            let mut child = cmd
                .spawn()
                .with_context(|| format!("running command '{}'", program))?;
            // `cmd` still holds our copies of the write end; the reader only
            // sees EOF once they are closed.
            drop(cmd);

            let reading = tokio::task::spawn_blocking(move || {
                let mut buf = Vec::new();
                reader.read_to_end(&mut buf).map(|_| buf)
            });
            let status = child
                .wait()
                .await
                .with_context(|| format!("waiting for command '{}'", program))?;
            let combined = reading
                .await
                .context("command output reader stopped")?
                .with_context(|| format!("reading output of '{}'", program))?;

            Ok(CommandOutput {
                success: status.success(),
                code: status.code(),
                combined,
            })
        })
    }
}

/// Logs the command line instead of running it.
#[derive(Debug, Clone, Default)]
pub struct DryRunRunner;

impl CommandRunner for DryRunRunner {
    fn run_command(
        &mut self,
        template: &[String],
        paths: &[PathBuf],
    ) -> Pin<Box<dyn Future<Output = Result<CommandOutput>> + Send + '_>> {
        info!(command = ?template, ?paths, "dry-run: command not executed");
        Box::pin(async move {
            Ok(CommandOutput {
                success: true,
                code: Some(0),
                combined: Vec::new(),
            })
        })
    }
}
