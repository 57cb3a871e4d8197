//! Running external build tools (composer, php-scoper) in the output tree.

use std::path::{Path, PathBuf};
use std::process::{Command, Output};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ExecError {
    #[error("Tool not found on PATH: {tool}")]
    ToolNotFound { tool: String },

    #[error("Failed to execute {tool}: {source}")]
    Spawn {
        tool: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{tool} failed (exit {code}): {stderr}")]
    Failed {
        tool: String,
        code: i32,
        stderr: String,
    },
}

/// Result of a command execution.
#[derive(Debug)]
pub struct ExecResult {
    pub stdout: String,
    pub stderr: String,
    pub success: bool,
    pub code: Option<i32>,
}

impl From<Output> for ExecResult {
    fn from(output: Output) -> Self {
        Self {
            stdout: String::from_utf8_lossy(&output.stdout).to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).to_string(),
            success: output.status.success(),
            code: output.status.code(),
        }
    }
}

/// An external program resolved to a concrete path
#[derive(Debug, Clone)]
pub struct Tool {
    name: String,
    path: PathBuf,
}

impl Tool {
    /// Resolve `name` (a bare command or a path) via `which`
    pub fn locate(name: &str) -> Result<Self, ExecError> {
        let path = which::which(name).map_err(|_| ExecError::ToolNotFound {
            tool: name.to_string(),
        })?;
        Ok(Self {
            name: name.to_string(),
            path,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Run the tool in `dir`. Fails if it exits non-zero.
    pub fn run_in<S: AsRef<str>>(&self, dir: &Path, args: &[S]) -> Result<ExecResult, ExecError> {
        let mut cmd = Command::new(&self.path);
        cmd.args(args.iter().map(AsRef::as_ref)).current_dir(dir);

        tracing::debug!(tool = %self.name, dir = %dir.display(), "running");
        let output = cmd.output().map_err(|source| ExecError::Spawn {
            tool: self.name.clone(),
            source,
        })?;

        let result = ExecResult::from(output);
        if !result.success {
            return Err(ExecError::Failed {
                tool: self.name.clone(),
                code: result.code.unwrap_or(-1),
                stderr: result.stderr.trim().to_string(),
            });
        }
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_locate_missing_tool() {
        let err = Tool::locate("wpbundle-no-such-tool-xyz").unwrap_err();
        assert!(matches!(err, ExecError::ToolNotFound { tool } if tool == "wpbundle-no-such-tool-xyz"));
    }

    #[cfg(unix)]
    #[test]
    fn test_run_in_directory() {
        let dir = TempDir::new().unwrap();
        let tool = Tool::locate("pwd").unwrap();

        let result = tool.run_in::<&str>(dir.path(), &[]).unwrap();

        let reported = std::fs::canonicalize(result.stdout.trim()).unwrap();
        assert_eq!(reported, std::fs::canonicalize(dir.path()).unwrap());
        assert_eq!(result.code, Some(0));
    }

    #[cfg(unix)]
    #[test]
    fn test_run_failure() {
        let dir = TempDir::new().unwrap();
        let tool = Tool::locate("sh").unwrap();

        let err = tool
            .run_in(dir.path(), &["-c", "echo broken >&2; exit 3"])
            .unwrap_err();

        match err {
            ExecError::Failed { tool, code, stderr } => {
                assert_eq!(tool, "sh");
                assert_eq!(code, 3);
                assert_eq!(stderr, "broken");
            }
            other => panic!("unexpected error: {other}"),
        }
    }
}
