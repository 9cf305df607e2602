mod backends;
mod executor;
mod factory;
mod language;
mod result;
mod stage;
mod supervisor;
mod traits;
mod workspace;

use std::process::ExitStatus;

pub use backends::{entry_type, CppBackend, JavaBackend, PythonBackend};
pub use executor::Sandbox;
pub use factory::{available_backends, create_backend, BackendInfo};
pub use language::{ExecutionModel, ExecutionRequest, Language, Mode};
pub use result::{ExecutionReport, ExecutionResult, SyntaxReport, NO_OUTPUT_MESSAGE, SYNTAX_OK_MESSAGE};
pub use stage::{Stage, StageTracker};
pub use supervisor::{run_supervised, with_timeout, Limits, Step};
pub use traits::{LanguageBackend, Toolchain};
pub use workspace::{Workspace, WorkspaceManager};

/// Result of running one supervised process to completion.
#[derive(Debug)]
pub struct CommandResult {
    pub stdout: String,
    pub stderr: String,
    /// `None` when the process was terminated by a signal
    pub exit_code: Option<i32>,
    pub signal: Option<i32>,
}

impl CommandResult {
    pub fn new(stdout: String, stderr: String, status: ExitStatus) -> Self {
        #[cfg(unix)]
        let signal = std::os::unix::process::ExitStatusExt::signal(&status);
        #[cfg(not(unix))]
        let signal = None;

        Self {
            stdout,
            stderr,
            exit_code: status.code(),
            signal,
        }
    }

    pub fn success(&self) -> bool {
        self.exit_code == Some(0)
    }

    /// Stdout, followed by stderr under an `Errors:` label when present.
    pub fn combined_output(&self) -> String {
        if self.stderr.is_empty() {
            self.stdout.clone()
        } else {
            format!("{}\nErrors:\n{}", self.stdout, self.stderr)
        }
    }

    /// Last non-blank stderr line, typically the exception summary.
    pub fn last_error_line(&self) -> Option<&str> {
        self.stderr
            .lines()
            .map(str::trim)
            .rev()
            .find(|line| !line.is_empty())
    }

    /// Short description of an abnormal exit.
    pub fn exit_description(&self) -> String {
        match (self.exit_code, self.signal) {
            (_, Some(signal)) => format!("Process terminated by signal {}", signal),
            (Some(code), None) => format!("Process exited with status {}", code),
            (None, None) => "Process exited abnormally".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn result(stdout: &str, stderr: &str) -> CommandResult {
        CommandResult {
            stdout: stdout.to_string(),
            stderr: stderr.to_string(),
            exit_code: Some(0),
            signal: None,
        }
    }

    #[test]
    fn test_combined_output_labels_stderr() {
        assert_eq!(result("hi\n", "").combined_output(), "hi\n");
        assert_eq!(
            result("hi\n", "warn\n").combined_output(),
            "hi\n\nErrors:\nwarn\n"
        );
    }

    #[test]
    fn test_last_error_line() {
        let r = result(
            "",
            "Traceback (most recent call last):\n  File \"<string>\", line 1\nZeroDivisionError: division by zero\n\n",
        );
        assert_eq!(
            r.last_error_line(),
            Some("ZeroDivisionError: division by zero")
        );
        assert_eq!(result("", "  \n").last_error_line(), None);
    }
}
