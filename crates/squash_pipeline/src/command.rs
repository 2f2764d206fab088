//! External-command plugin executor.
//!
//! Each plugin is a program that reads the input on stdin and writes the
//! transformed bytes to stdout. Lines written to stderr by a successful run
//! become warnings.

use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use squash_config::PluginSpec;
use tracing::debug;

use crate::error::PipelineError;
use crate::executor::{PluginExecutor, PluginOutput};

/// Runs plugins as external programs found on `PATH` or in a tools directory.
#[derive(Debug, Clone, Default)]
pub struct CommandExecutor {
    tools_dir: Option<PathBuf>,
}

impl CommandExecutor {
    /// Resolves plugin commands on `PATH`.
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolves plugin commands only inside `dir`.
    pub fn with_tools_dir(dir: impl Into<PathBuf>) -> Self {
        Self {
            tools_dir: Some(dir.into()),
        }
    }

    fn resolve(&self, command: &str) -> Result<PathBuf, PipelineError> {
        let found = match &self.tools_dir {
            Some(dir) => {
                let cwd = std::env::current_dir().unwrap_or_else(|_| dir.clone());
                which::which_in(command, Some(dir), cwd)
            }
            None => which::which(command),
        };
        found.map_err(|e| PipelineError::CommandNotFound {
            command: command.to_string(),
            reason: e.to_string(),
        })
    }

    fn run(
        program: &Path,
        input: &[u8],
        plugin: &PluginSpec,
    ) -> Result<PluginOutput, PipelineError> {
        let mut child = Command::new(program)
            .args(&plugin.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|source| PipelineError::Spawn {
                command: plugin.command.clone(),
                source,
            })?;

        let mut stdin = child
            .stdin
            .take()
            .ok_or_else(|| PipelineError::Failed("plugin stdin unavailable".to_string()))?;

        // Feed stdin from a second thread so a plugin that writes before it
        // finishes reading cannot deadlock on a full stdout pipe.
        let (written, output) = std::thread::scope(|scope| {
            let writer = scope.spawn(move || stdin.write_all(input));
            let output = child.wait_with_output();
            (writer.join(), output)
        });
        let output = output?;

        match written {
            Ok(Ok(())) => {}
            Ok(Err(e)) if e.kind() == ErrorKind::BrokenPipe => {}
            Ok(Err(e)) => return Err(PipelineError::Io(e)),
            Err(_) => return Err(PipelineError::Failed("stdin writer panicked".to_string())),
        }

        let stderr = String::from_utf8_lossy(&output.stderr);
        if !output.status.success() {
            return Err(PipelineError::ExitStatus {
                command: plugin.command.clone(),
                status: output.status.to_string(),
                stderr: stderr.trim().to_string(),
            });
        }

        Ok(PluginOutput {
            data: output.stdout,
            warnings: stderr
                .lines()
                .map(str::trim)
                .filter(|line| !line.is_empty())
                .map(str::to_string)
                .collect(),
        })
    }
}

impl PluginExecutor for CommandExecutor {
    fn probe(&self) -> Result<(), PipelineError> {
        match &self.tools_dir {
            Some(dir) if !dir.is_dir() => Err(PipelineError::Unavailable {
                reason: format!("tools directory {} does not exist", dir.display()),
            }),
            _ => Ok(()),
        }
    }

    fn execute(&self, input: &[u8], plugin: &PluginSpec) -> Result<PluginOutput, PipelineError> {
        let program = self.resolve(&plugin.command)?;
        debug!(plugin = %plugin, program = %program.display(), "running plugin command");
        Self::run(&program, input, plugin)
    }
}
