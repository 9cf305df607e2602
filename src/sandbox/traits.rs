use std::path::PathBuf;

use async_trait::async_trait;
use tokio::process::Command;

use crate::error::{CoderunError, Result};
use crate::sandbox::language::{ExecutionModel, Language};
use crate::sandbox::workspace::Workspace;

/// An external executable a backend depends on.
#[derive(Debug, Clone)]
pub struct Toolchain {
    /// Human-facing role, e.g. "C++ compiler"
    pub tool: &'static str,
    /// Executable name or path
    pub program: String,
    /// What the user should install when `program` is missing
    pub package: &'static str,
}

impl Toolchain {
    pub fn new(tool: &'static str, program: impl Into<String>, package: &'static str) -> Self {
        Self {
            tool,
            program: program.into(),
            package,
        }
    }

    pub fn command(&self) -> Command {
        Command::new(&self.program)
    }

    /// Resolve the executable on `PATH` (or as given, if it is a path).
    pub fn locate(&self) -> Option<PathBuf> {
        which::which(&self.program).ok()
    }

    pub fn unavailable(&self) -> CoderunError {
        CoderunError::ToolchainUnavailable {
            tool: self.tool.to_string(),
            program: self.program.clone(),
            package: self.package.to_string(),
        }
    }
}

/// Trait for language execution backends.
///
/// Each backend owns its toolchain invocation; the only shared machinery is
/// the timeout supervisor and the workspace it is handed.
#[async_trait]
pub trait LanguageBackend: Send + Sync {
    /// Returns the backend name (e.g., "python", "cpp")
    fn name(&self) -> &str;

    fn language(&self) -> Language;

    fn model(&self) -> ExecutionModel {
        self.language().model()
    }

    /// Executables this backend needs on the host
    fn toolchains(&self) -> Vec<Toolchain>;

    /// Stem for the source file, or `None` for a fresh unique one.
    /// Validation that must happen before any file is written belongs here.
    fn source_stem(&self, _code: &str) -> Result<Option<String>> {
        Ok(None)
    }

    /// Parse or compile without running anything
    async fn check_syntax(&self, workspace: &Workspace) -> Result<()>;

    /// Build if needed, then run; returns the combined output
    async fn run(&self, workspace: &Workspace) -> Result<String>;
}
