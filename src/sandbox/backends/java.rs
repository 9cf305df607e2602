use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex::Regex;
use tokio::process::Command;
use tracing::{debug, info};

use crate::config::types::ToolchainConfig;
use crate::error::{CoderunError, Result};
use crate::sandbox::language::Language;
use crate::sandbox::stage::{Stage, StageTracker};
use crate::sandbox::supervisor::{run_supervised, Limits, Step};
use crate::sandbox::traits::{LanguageBackend, Toolchain};
use crate::sandbox::workspace::Workspace;

static PUBLIC_TYPE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"\bpublic\s+(?:(?:abstract|final|strictfp|sealed|non-sealed|static)\s+)*(?:class|interface|enum|record|@\s*interface)\s+([A-Za-z_$][A-Za-z0-9_$]*)",
    )
    .unwrap()
});

/// Compiled-bytecode backend for Java.
///
/// The source must declare exactly one `public` top-level type. Its name
/// becomes the source file name (as javac requires) and the entry point.
pub struct JavaBackend {
    compiler: Toolchain,
    runtime: Toolchain,
    limits: Limits,
}

impl JavaBackend {
    pub fn new(toolchains: &ToolchainConfig, limits: Limits) -> Self {
        Self {
            compiler: Toolchain::new("Java compiler", &toolchains.javac, "JDK"),
            runtime: Toolchain::new("Java runtime", &toolchains.java, "JDK"),
            limits,
        }
    }

    fn compile_command(&self, workspace: &Workspace) -> Command {
        let mut cmd = self.compiler.command();
        cmd.arg("-encoding")
            .arg("UTF-8")
            .arg("-d")
            .arg(workspace.dir())
            .arg(workspace.source_path())
            .current_dir(workspace.dir());
        cmd
    }
}

/// Name of the single public top-level type declared in `source`.
pub fn entry_type(source: &str) -> Result<String> {
    let top_level = top_level_text(source);
    let mut names: Vec<String> = Vec::new();
    for captures in PUBLIC_TYPE.captures_iter(&top_level) {
        let name = captures[1].to_string();
        if !names.contains(&name) {
            names.push(name);
        }
    }

    match names.len() {
        0 => Err(CoderunError::MissingEntryPoint),
        1 => Ok(names.remove(0)),
        _ => Err(CoderunError::AmbiguousEntryPoint {
            names: names.join(", "),
        }),
    }
}

/// Source text outside any `{}` block, with comments and literals blanked.
fn top_level_text(source: &str) -> String {
    let chars: Vec<char> = source.chars().collect();
    let len = chars.len();
    let at = |i: usize| chars.get(i).copied();

    let mut out = String::with_capacity(source.len());
    let mut depth = 0usize;
    let mut i = 0;

    while i < len {
        let c = chars[i];
        match c {
            '/' if at(i + 1) == Some('/') => {
                while i < len && chars[i] != '\n' {
                    i += 1;
                }
                out.push(' ');
                continue;
            }
            '/' if at(i + 1) == Some('*') => {
                i += 2;
                while i < len && !(chars[i] == '*' && at(i + 1) == Some('/')) {
                    i += 1;
                }
                i += 2;
                out.push(' ');
                continue;
            }
            '"' if at(i + 1) == Some('"') && at(i + 2) == Some('"') => {
                i += 3;
                while i < len && !(chars[i] == '"' && at(i + 1) == Some('"') && at(i + 2) == Some('"')) {
                    i += if chars[i] == '\\' { 2 } else { 1 };
                }
                i += 3;
                out.push(' ');
                continue;
            }
            '"' | '\'' => {
                i += 1;
                while i < len && chars[i] != c && chars[i] != '\n' {
                    i += if chars[i] == '\\' { 2 } else { 1 };
                }
                i += 1;
                out.push(' ');
                continue;
            }
            '{' => {
                depth += 1;
                out.push(' ');
            }
            '}' => {
                depth = depth.saturating_sub(1);
                out.push(' ');
            }
            _ if depth == 0 => out.push(c),
            _ => {}
        }
        i += 1;
    }

    out
}

#[async_trait]
impl LanguageBackend for JavaBackend {
    fn name(&self) -> &str {
        "java"
    }

    fn language(&self) -> Language {
        Language::Java
    }

    fn toolchains(&self) -> Vec<Toolchain> {
        vec![self.compiler.clone(), self.runtime.clone()]
    }

    fn source_stem(&self, code: &str) -> Result<Option<String>> {
        let name = entry_type(code)?;
        debug!(entry = %name, "Resolved Java entry type");
        Ok(Some(name))
    }

    async fn check_syntax(&self, workspace: &Workspace) -> Result<()> {
        let result = run_supervised(
            self.compile_command(workspace),
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
        let mut stages = StageTracker::new("java");

        stages.advance(Stage::Compiling);
        let compiled = run_supervised(
            self.compile_command(workspace),
            Some(&self.compiler),
            Step::Compile,
            self.limits.for_step(Step::Compile),
        )
        .await;
        stages.finish_compile(compiled)?;
        debug!(class = %workspace.derived_path(".class").display(), "Compiled Java source");

        stages.advance(Stage::Running);
        let mut cmd = self.runtime.command();
        cmd.arg("-Dfile.encoding=UTF-8")
            .arg("-cp")
            .arg(workspace.dir())
            .arg(workspace.stem())
            .current_dir(workspace.dir());
        let ran = run_supervised(
            cmd,
            Some(&self.runtime),
            Step::Run,
            self.limits.for_step(Step::Run),
        )
        .await;

        // Any completed run is reported with its output, whatever the exit status
        let result = stages.finish_run(ran)?;
        info!(exit_code = ?result.exit_code, "Java program finished");
        Ok(result.combined_output())
    }
}
