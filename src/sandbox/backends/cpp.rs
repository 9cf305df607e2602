use async_trait::async_trait;
use tokio::process::Command;
use tracing::{debug, info};

use crate::config::types::ToolchainConfig;
use crate::error::{CoderunError, Result};
use crate::sandbox::language::Language;
use crate::sandbox::stage::{Stage, StageTracker};
use crate::sandbox::supervisor::{run_supervised, Limits, Step};
use crate::sandbox::traits::{LanguageBackend, Toolchain};
use crate::sandbox::workspace::Workspace;

/// Compiled-native backend driving a GCC-compatible C++ compiler.
pub struct CppBackend {
    compiler: Toolchain,
    flags: Vec<String>,
    limits: Limits,
}

impl CppBackend {
    pub fn new(toolchains: &ToolchainConfig, limits: Limits) -> Self {
        Self {
            compiler: Toolchain::new("C++ compiler", &toolchains.cxx, "g++"),
            flags: toolchains.cxx_flags.clone(),
            limits,
        }
    }

    fn compiler_command(&self, workspace: &Workspace) -> Command {
        let mut cmd = self.compiler.command();
        cmd.args(&self.flags).current_dir(workspace.dir());
        cmd
    }
}

#[async_trait]
impl LanguageBackend for CppBackend {
    fn name(&self) -> &str {
        "cpp"
    }

    fn language(&self) -> Language {
        Language::Cpp
    }

    fn toolchains(&self) -> Vec<Toolchain> {
        vec![self.compiler.clone()]
    }

    async fn check_syntax(&self, workspace: &Workspace) -> Result<()> {
        let mut cmd = self.compiler_command(workspace);
        cmd.arg("-fsyntax-only").arg(workspace.source_path());

        let result = run_supervised(
            cmd,
            Some(&self.compiler),
            Step::SyntaxCheck,
            self.limits.for_step(Step::SyntaxCheck),
        )
        .await?;

        if result.success() {
            Ok(())
        } else {
            Err(CoderunError::Syntax {
                line: None,
                message: result.stderr,
            })
        }
    }

    async fn run(&self, workspace: &Workspace) -> Result<String> {
        let mut stages = StageTracker::new("cpp");
        let binary = workspace.derived_path(std::env::consts::EXE_SUFFIX);

        stages.advance(Stage::Compiling);
        let mut cmd = self.compiler_command(workspace);
        cmd.arg(workspace.source_path()).arg("-o").arg(&binary);
        let compiled = run_supervised(
            cmd,
            Some(&self.compiler),
            Step::Compile,
            self.limits.for_step(Step::Compile),
        )
        .await;
        stages.finish_compile(compiled)?;
        debug!(binary = %binary.display(), "Compiled C++ source");

        stages.advance(Stage::Running);
        let mut cmd = Command::new(&binary);
        cmd.current_dir(workspace.dir());
        let ran = run_supervised(cmd, None, Step::Run, self.limits.for_step(Step::Run))
            .await
            .and_then(|result| match result.signal {
                // A crash (segfault, abort) is a runtime failure; a plain
                // nonzero exit still reports the program's output.
                Some(_) => Err(CoderunError::Runtime {
                    message: result.exit_description(),
                }),
                None => Ok(result),
            });
        let result = stages.finish_run(ran)?;

        info!(exit_code = ?result.exit_code, "C++ program finished");
        Ok(result.combined_output())
    }
}
