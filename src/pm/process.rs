//! Running the package manager executable

use std::fmt;
use std::future::Future;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::sync::Arc;

use colored::Colorize;
use parking_lot::Mutex;
use tokio::process::Command;

use super::error::{InstallerError, InstallerResult};

/// A fully-built package manager invocation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PmCommand {
    pub program: String,
    pub args: Vec<String>,
}

impl PmCommand {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
        }
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }
}

impl fmt::Display for PmCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.program)?;
        for arg in &self.args {
            write!(f, " {}", arg)?;
        }
        Ok(())
    }
}

/// Spawns a command and resolves once it has exited
pub trait ProcessRunner {
    fn run(&self, command: &PmCommand, cwd: &Path) -> impl Future<Output = InstallerResult<()>>;
}

impl<R: ProcessRunner + ?Sized> ProcessRunner for &R {
    fn run(&self, command: &PmCommand, cwd: &Path) -> impl Future<Output = InstallerResult<()>> {
        (**self).run(command, cwd)
    }
}

/// Runs commands with `tokio::process`, sharing the parent's stdio
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioRunner;

impl ProcessRunner for TokioRunner {
    async fn run(&self, command: &PmCommand, cwd: &Path) -> InstallerResult<()> {
        let mut child = Command::new(&command.program)
            .args(&command.args)
            .current_dir(cwd)
            .stdin(Stdio::inherit())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit())
            .spawn()
            .map_err(|source| launch_error(command, source))?;

        let status = child
            .wait()
            .await
            .map_err(|source| launch_error(command, source))?;
        if status.success() {
            Ok(())
        } else {
            Err(InstallerError::ProcessExit {
                command: command.to_string(),
                code: status.code(),
            })
        }
    }
}

/// Launching or waiting on the child failed before an exit status was known
fn launch_error(command: &PmCommand, source: std::io::Error) -> InstallerError {
    InstallerError::ProcessSpawn {
        program: command.program.clone(),
        source,
    }
}

/// Records commands instead of running them
///
/// Clones share the same log, so a caller can hand one clone to an installer
/// and read the commands back through another.
#[derive(Debug, Clone, Default)]
pub struct DryRunRunner {
    calls: Arc<Mutex<Vec<(PmCommand, PathBuf)>>>,
    echo: bool,
}

impl DryRunRunner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Also print each command to stdout as it is recorded
    pub fn echoing() -> Self {
        Self {
            echo: true,
            ..Self::default()
        }
    }

    /// Commands seen so far, in call order
    pub fn calls(&self) -> Vec<PmCommand> {
        self.calls.lock().iter().map(|(cmd, _)| cmd.clone()).collect()
    }

    /// Commands seen so far with the directory each would have run in
    pub fn invocations(&self) -> Vec<(PmCommand, PathBuf)> {
        self.calls.lock().clone()
    }
}

impl ProcessRunner for DryRunRunner {
    async fn run(&self, command: &PmCommand, cwd: &Path) -> InstallerResult<()> {
        if self.echo {
            println!(
                "{} {} {}",
                "would run".dimmed(),
                command.to_string().bold(),
                format!("(in {})", cwd.display()).dimmed()
            );
        }
        self.calls.lock().push((command.clone(), cwd.to_path_buf()));
        Ok(())
    }
}
