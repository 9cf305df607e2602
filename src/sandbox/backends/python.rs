use std::path::Path;

use async_trait::async_trait;
use tokio::process::Command;
use tracing::{debug, info};

use crate::config::types::ToolchainConfig;
use crate::error::{CoderunError, Result};
use crate::sandbox::language::Language;
use crate::sandbox::supervisor::{run_supervised, Limits, Step};
use crate::sandbox::traits::{LanguageBackend, Toolchain};
use crate::sandbox::workspace::Workspace;
use crate::sandbox::CommandResult;

/// Prefix written to stderr when the source fails to compile.
const SYNTAX_MARKER: &str = "__coderun_syntax_error__";

/// Exit status reported together with [`SYNTAX_MARKER`].
const SYNTAX_EXIT_CODE: i32 = 3;

/// Compiles the file named in argv[1]; with argv[2] == "run" it then executes
/// the compiled unit as `__main__`. A syntax error is written to stderr after
/// the marker in argv[3] and ends the process with the status in argv[4].
const LAUNCHER: &str = r#"import sys
path, mode, marker, status = sys.argv[1], sys.argv[2], sys.argv[3], int(sys.argv[4])
with open(path, encoding="utf-8") as handle:
    source = handle.read()
try:
    unit = compile(source, "<string>", "exec")
except (SyntaxError, ValueError) as exc:
    sys.stderr.write("%s%s\n%s" % (marker, getattr(exc, "lineno", None) or "", exc))
    sys.stderr.flush()
    sys.exit(status)
if mode == "run":
    sys.argv = [path]
    exec(unit, {"__name__": "__main__", "__builtins__": __builtins__})
"#;

/// Interpreted backend for Python 3.
///
/// Both syntax checks and runs happen in an interpreter subprocess, so a
/// runaway program is always killable.
pub struct PythonBackend {
    interpreter: Toolchain,
    limits: Limits,
}

impl PythonBackend {
    pub fn new(toolchains: &ToolchainConfig, limits: Limits) -> Self {
        Self {
            interpreter: Toolchain::new("Python interpreter", &toolchains.python, "Python 3"),
            limits,
        }
    }

    fn command(&self, source: &Path, dir: &Path, mode: &str) -> Command {
        let mut cmd = self.interpreter.command();
        cmd.arg("-B")
            .arg("-c")
            .arg(LAUNCHER)
            .arg(source)
            .arg(mode)
            .arg(SYNTAX_MARKER)
            .arg(SYNTAX_EXIT_CODE.to_string())
            .current_dir(dir);
        cmd
    }

    async fn launch(&self, workspace: &Workspace, mode: &str, step: Step) -> Result<CommandResult> {
        let cmd = self.command(workspace.source_path(), workspace.dir(), mode);
        let result = run_supervised(cmd, Some(&self.interpreter), step, self.limits.for_step(step)).await?;

        if let Some(err) = syntax_error(&result) {
            debug!(mode = mode, "Python source failed to compile");
            return Err(err);
        }
        Ok(result)
    }
}

/// Recognize the launcher's syntax report.
fn syntax_error(result: &CommandResult) -> Option<CoderunError> {
    if result.exit_code != Some(SYNTAX_EXIT_CODE) {
        return None;
    }
    let report = result.stderr.strip_prefix(SYNTAX_MARKER)?;
    let (line, message) = report.split_once('\n').unwrap_or((report, ""));

    Some(CoderunError::Syntax {
        line: line.trim().parse().ok(),
        message: message.trim().to_string(),
    })
}

#[async_trait]
impl LanguageBackend for PythonBackend {
    fn name(&self) -> &str {
        "python"
    }

    fn language(&self) -> Language {
        Language::Python
    }

    fn toolchains(&self) -> Vec<Toolchain> {
        vec![self.interpreter.clone()]
    }

    async fn check_syntax(&self, workspace: &Workspace) -> Result<()> {
        let result = self.launch(workspace, "check", Step::SyntaxCheck).await?;
        if result.success() {
            return Ok(());
        }

        // The launcher itself failed (unreadable file, broken interpreter)
        Err(CoderunError::Syntax {
            line: None,
            message: result
                .last_error_line()
                .map(str::to_string)
                .unwrap_or_else(|| result.exit_description()),
        })
    }

    async fn run(&self, workspace: &Workspace) -> Result<String> {
        let result = self.launch(workspace, "run", Step::Run).await?;
        if result.success() {
            info!(stdout_len = result.stdout.len(), "Python program finished");
            return Ok(result.combined_output());
        }

        let message = match (result.signal, result.last_error_line()) {
            (None, Some(line)) => line.to_string(),
            _ => result.exit_description(),
        };
        Err(CoderunError::Runtime { message })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn interpreter_output(exit_code: i32, stderr: &str) -> CommandResult {
        CommandResult {
            stdout: String::new(),
            stderr: stderr.to_string(),
            exit_code: Some(exit_code),
            signal: None,
        }
    }

    #[test]
    fn test_marker_passed_as_arguments() {
        assert!(!LAUNCHER.contains(SYNTAX_MARKER));

        let backend = PythonBackend::new(&ToolchainConfig::default(), Limits::default());
        let cmd = backend.command(Path::new("/ws/main.py"), Path::new("/ws"), "check");
        let args: Vec<_> = cmd
            .as_std()
            .get_args()
            .map(|arg| arg.to_string_lossy().into_owned())
            .collect();

        let expected = ["/ws/main.py", "check", SYNTAX_MARKER, "3"];
        assert_eq!(args[3..], expected);
    }

    #[test]
    fn test_parse_syntax_report() {
        let stderr = format!("{}1\ninvalid syntax (<string>, line 1)", SYNTAX_MARKER);
        let err = syntax_error(&interpreter_output(SYNTAX_EXIT_CODE, &stderr)).unwrap();
        assert_eq!(err.to_string(), "Line 1: invalid syntax (<string>, line 1)");
    }

    #[test]
    fn test_syntax_report_without_line() {
        let stderr = format!("{}\nsource code string cannot contain null bytes", SYNTAX_MARKER);
        let err = syntax_error(&interpreter_output(SYNTAX_EXIT_CODE, &stderr)).unwrap();
        assert!(matches!(err, CoderunError::Syntax { line: None, .. }));
    }

    #[test]
    fn test_program_exit_three_is_not_syntax() {
        assert!(syntax_error(&interpreter_output(SYNTAX_EXIT_CODE, "")).is_none());
        let stderr = format!("{}1\nx", SYNTAX_MARKER);
        assert!(syntax_error(&interpreter_output(1, &stderr)).is_none());
    }
}
