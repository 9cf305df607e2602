use std::sync::Arc;
use std::time::Instant;

use tracing::{debug, info};

use crate::config::types::{CoderunConfig, ToolchainConfig};
use crate::error::{CoderunError, Result};
use crate::sandbox::factory::create_backend;
use crate::sandbox::language::{ExecutionRequest, Language, Mode};
use crate::sandbox::result::{ExecutionReport, ExecutionResult, SyntaxReport, SYNTAX_OK_MESSAGE};
use crate::sandbox::supervisor::Limits;
use crate::sandbox::workspace::WorkspaceManager;

/// Front door of the sandbox.
///
/// Validates requests, picks the backend, owns the workspace for the length
/// of one call and folds every error into an [`ExecutionResult`]. Cloning is
/// cheap and clones share no mutable state, so concurrent calls are
/// independent.
#[derive(Debug, Clone)]
pub struct Sandbox {
    toolchains: Arc<ToolchainConfig>,
    limits: Limits,
    workspaces: WorkspaceManager,
}

impl Sandbox {
    pub fn new(config: &CoderunConfig) -> Self {
        Self {
            toolchains: Arc::new(config.toolchains.clone()),
            limits: Limits::from(&config.sandbox),
            workspaces: WorkspaceManager::new(config.sandbox.workspace_root.clone()),
        }
    }

    pub fn limits(&self) -> Limits {
        self.limits
    }

    /// Check syntax without running anything.
    pub async fn check_syntax(&self, code: &str, language: &str) -> SyntaxReport {
        self.dispatch(code, language, Mode::SyntaxCheck).await.into()
    }

    /// Compile (if needed) and run.
    pub async fn execute(&self, code: &str, language: &str) -> ExecutionReport {
        self.dispatch(code, language, Mode::Execute).await.into()
    }

    /// Validate and process a request given by language identifier.
    pub async fn dispatch(&self, code: &str, language: &str, mode: Mode) -> ExecutionResult {
        match validate(code, language, mode) {
            Ok(request) => self.process(&request).await,
            Err(e) => {
                debug!(language = %language, error = %e, "Rejected request");
                ExecutionResult::failure(&e)
            }
        }
    }

    /// Process an already validated request.
    pub async fn process(&self, request: &ExecutionRequest) -> ExecutionResult {
        let started = Instant::now();
        let outcome = self.run_request(request).await;
        let elapsed_ms = started.elapsed().as_millis() as u64;

        match &outcome {
            Ok(_) => info!(
                language = %request.language(),
                mode = ?request.mode(),
                elapsed_ms = elapsed_ms,
                "Request succeeded"
            ),
            Err(e) => info!(
                language = %request.language(),
                mode = ?request.mode(),
                kind = ?e.kind(),
                elapsed_ms = elapsed_ms,
                "Request failed"
            ),
        }

        ExecutionResult::from(outcome)
    }

    async fn run_request(&self, request: &ExecutionRequest) -> Result<String> {
        let language = request.language();
        let backend = create_backend(language, &self.toolchains, self.limits);
        let extension = language.source_extension();

        let workspace = match backend.source_stem(request.code())? {
            Some(stem) => {
                self.workspaces
                    .acquire_named(request.code(), &stem, extension)
                    .await?
            }
            None => self.workspaces.acquire(request.code(), extension).await?,
        };

        debug!(
            backend = backend.name(),
            model = %backend.model(),
            source = %workspace.source_path().display(),
            "Dispatching to backend"
        );

        let outcome = match request.mode() {
            Mode::SyntaxCheck => backend
                .check_syntax(&workspace)
                .await
                .map(|()| SYNTAX_OK_MESSAGE.to_string()),
            Mode::Execute => backend.run(&workspace).await,
        };

        workspace.release();
        outcome
    }
}

impl Default for Sandbox {
    fn default() -> Self {
        Self::new(&CoderunConfig::default())
    }
}

/// Empty code is rejected before the language is even looked at.
fn validate(code: &str, language: &str, mode: Mode) -> Result<ExecutionRequest> {
    if code.trim().is_empty() {
        return Err(CoderunError::EmptyInput);
    }
    let language: Language = language.parse()?;
    ExecutionRequest::new(code, language, mode)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    #[tokio::test]
    async fn test_empty_code_rejected() {
        let sandbox = Sandbox::default();
        let report = sandbox.execute("   \n", "python").await;
        assert!(!report.success);
        assert_eq!(report.error.as_deref(), Some("Code cannot be empty"));

        let report = sandbox.check_syntax("", "c++").await;
        assert!(!report.success);
        assert_eq!(report.error.as_deref(), Some("Code cannot be empty"));
    }

    #[tokio::test]
    async fn test_empty_code_wins_over_unknown_language() {
        let result = Sandbox::default().dispatch("", "cobol", Mode::Execute).await;
        assert_eq!(result.error_kind(), Some(ErrorKind::EmptyInput));
    }

    #[tokio::test]
    async fn test_unknown_language_fails_closed() {
        let root = tempfile::tempdir().unwrap();
        let mut config = CoderunConfig::default();
        config.sandbox.workspace_root = Some(root.path().to_path_buf());

        let result = Sandbox::new(&config)
            .dispatch("print(1)", "cobol", Mode::Execute)
            .await;
        assert_eq!(result.error_kind(), Some(ErrorKind::UnsupportedLanguage));
        assert_eq!(std::fs::read_dir(root.path()).unwrap().count(), 0);
    }

    #[tokio::test]
    async fn test_missing_entry_point_touches_nothing() {
        let root = tempfile::tempdir().unwrap();
        let mut config = CoderunConfig::default();
        config.sandbox.workspace_root = Some(root.path().join("ws"));
        config.toolchains.javac = "no-such-javac".to_string();

        let report = Sandbox::new(&config)
            .execute("class Hidden { }", "java")
            .await;
        assert!(!report.success);
        assert_eq!(report.error_kind, Some(ErrorKind::MissingEntryPoint));
        assert!(!root.path().join("ws").exists());
    }

    #[tokio::test]
    async fn test_missing_toolchain_reported() {
        let root = tempfile::tempdir().unwrap();
        let mut config = CoderunConfig::default();
        config.sandbox.workspace_root = Some(root.path().to_path_buf());
        config.toolchains.cxx = "no-such-cxx-compiler".to_string();

        let report = Sandbox::new(&config)
            .check_syntax("int main() { return 0; }", "c++")
            .await;
        assert_eq!(report.error_kind, Some(ErrorKind::ToolchainUnavailable));
        assert_eq!(
            report.error.as_deref(),
            Some("C++ compiler (no-such-cxx-compiler) not found. Please install g++.")
        );
        assert_eq!(std::fs::read_dir(root.path()).unwrap().count(), 0);
    }

    #[tokio::test]
    async fn test_unusable_workspace_root_is_io_error() {
        let root = tempfile::tempdir().unwrap();
        let blocker = root.path().join("not-a-dir");
        std::fs::write(&blocker, b"occupied").unwrap();

        let mut config = CoderunConfig::default();
        config.sandbox.workspace_root = Some(blocker.clone());
        // Reaching the backend would report this toolchain as missing instead.
        config.toolchains.python = "no-such-python".to_string();

        let report = Sandbox::new(&config).execute("print('hi')", "python").await;
        assert!(!report.success);
        assert_eq!(report.error_kind, Some(ErrorKind::IoError));
        let detail = report.error.unwrap();
        assert!(detail.starts_with("IO error: "), "{}", detail);
        assert_eq!(std::fs::read(&blocker).unwrap(), b"occupied");
    }
}
