//! Subprocess plumbing for CLI-based backends.
//!
//! [`run_command`] executes a tool and returns its stdout. Backends do not
//! call it directly: they go through a [`CommandRunner`], so tests can
//! substitute a scripted runner for the real `op` binary.

use crate::{Result, VaultorgError};
use async_trait::async_trait;
use std::process::Stdio;
use tokio::process::Command;
use tracing::debug;

/// Executes a command and returns stdout as a string.
///
/// The child is killed if the returned future is dropped, so cancelling an
/// operation also stops the subprocess.
///
/// # Arguments
///
/// - `program`: Command to execute (e.g. "op")
/// - `args`: Command arguments, passed as argv (no shell involved)
/// - `env`: Extra environment variables (e.g. session tokens)
///
/// # Errors
///
/// - [`VaultorgError::BackendNotInstalled`] if the program is not on PATH
/// - [`VaultorgError::CommandFailed`] on spawn failure, non-zero exit (with
///   the tool's stderr), or non UTF-8 output
pub async fn run_command<S: AsRef<str>>(
    program: &str,
    args: &[S],
    env: &[(String, String)],
) -> Result<String> {
    let mut cmd = Command::new(program);
    cmd.args(args.iter().map(|a| a.as_ref()));
    cmd.stdin(Stdio::null());
    cmd.stdout(Stdio::piped());
    cmd.stderr(Stdio::piped());
    cmd.kill_on_drop(true);

    for (key, value) in env {
        cmd.env(key, value);
    }

    // Only verb and noun: later arguments may carry secret field values.
    let summary = args
        .iter()
        .take(2)
        .map(|a| a.as_ref())
        .collect::<Vec<_>>()
        .join(" ");
    debug!(program, command = %summary, "running command");

    let output = cmd.output().await.map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            VaultorgError::BackendNotInstalled(format!("{} command not found", program))
        } else {
            VaultorgError::CommandFailed(format!("{} could not be started: {}", program, e))
        }
    })?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(VaultorgError::CommandFailed(format!(
            "{} failed with exit code {}: {}",
            program,
            output.status.code().unwrap_or(-1),
            stderr.trim()
        )));
    }

    String::from_utf8(output.stdout).map_err(|e| {
        VaultorgError::CommandFailed(format!("invalid UTF-8 in {} output: {}", program, e))
    })
}

/// Checks if a command-line tool is available in PATH.
///
/// # Example
///
/// ```no_run
/// use vaultorg::cli::check_command_exists;
///
/// #[tokio::main]
/// async fn main() -> vaultorg::Result<()> {
///     if !check_command_exists("op").await? {
///         println!("1Password CLI is not installed");
///     }
///     Ok(())
/// }
/// ```
pub async fn check_command_exists(program: &str) -> Result<bool> {
    let status = Command::new("which")
        .arg(program)
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .await
        .map_err(|e| VaultorgError::CommandFailed(format!("which could not be started: {}", e)))?;

    Ok(status.success())
}

/// Runs one tool invocation and returns its stdout.
#[async_trait]
pub trait CommandRunner: Send + Sync {
    /// Runs the tool with `args`.
    async fn run(&self, args: &[String]) -> Result<String>;
}

/// [`CommandRunner`] that spawns a real program.
#[derive(Debug, Clone)]
pub struct ProcessRunner {
    program: String,
    env: Vec<(String, String)>,
}

impl ProcessRunner {
    /// Creates a runner for `program` (a name on PATH or an absolute path).
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            env: Vec::new(),
        }
    }

    /// Adds an environment variable to every invocation.
    pub fn with_env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.push((key.into(), value.into()));
        self
    }

    /// Program this runner spawns.
    pub fn program(&self) -> &str {
        &self.program
    }
}

#[async_trait]
impl CommandRunner for ProcessRunner {
    async fn run(&self, args: &[String]) -> Result<String> {
        run_command(&self.program, args, &self.env).await
    }
}
