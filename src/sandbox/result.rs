use serde::Serialize;

use crate::error::{CoderunError, ErrorKind, Result};

/// Reported instead of an empty string when a program ran but printed nothing.
pub const NO_OUTPUT_MESSAGE: &str = "Program executed successfully (no output)";

pub const SYNTAX_OK_MESSAGE: &str = "Syntax is correct";

/// Uniform outcome of a syntax check or execution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExecutionResult {
    Success { output: String },
    Failure { kind: ErrorKind, detail: String },
}

impl ExecutionResult {
    pub fn success(output: impl Into<String>) -> Self {
        let output = output.into();
        if output.trim().is_empty() {
            Self::Success {
                output: NO_OUTPUT_MESSAGE.to_string(),
            }
        } else {
            Self::Success { output }
        }
    }

    pub fn failure(error: &CoderunError) -> Self {
        Self::Failure {
            kind: error.kind(),
            detail: error.to_string(),
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success { .. })
    }

    pub fn output(&self) -> Option<&str> {
        match self {
            Self::Success { output } => Some(output),
            Self::Failure { .. } => None,
        }
    }

    pub fn error_kind(&self) -> Option<ErrorKind> {
        match self {
            Self::Success { .. } => None,
            Self::Failure { kind, .. } => Some(*kind),
        }
    }

    pub fn detail(&self) -> Option<&str> {
        match self {
            Self::Success { .. } => None,
            Self::Failure { detail, .. } => Some(detail),
        }
    }
}

impl From<Result<String>> for ExecutionResult {
    fn from(outcome: Result<String>) -> Self {
        match outcome {
            Ok(output) => Self::success(output),
            Err(e) => Self::failure(&e),
        }
    }
}

/// Boundary shape of `execute`: `{success, output?, error?}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExecutionReport {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_kind: Option<ErrorKind>,
}

impl From<ExecutionResult> for ExecutionReport {
    fn from(result: ExecutionResult) -> Self {
        match result {
            ExecutionResult::Success { output } => Self {
                success: true,
                output: Some(output),
                error: None,
                error_kind: None,
            },
            ExecutionResult::Failure { kind, detail } => Self {
                success: false,
                output: None,
                error: Some(detail),
                error_kind: Some(kind),
            },
        }
    }
}

/// Boundary shape of `check_syntax`: `{success, message?, error?}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SyntaxReport {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_kind: Option<ErrorKind>,
}

impl From<ExecutionResult> for SyntaxReport {
    fn from(result: ExecutionResult) -> Self {
        match result {
            ExecutionResult::Success { output } => Self {
                success: true,
                message: Some(output),
                error: None,
                error_kind: None,
            },
            ExecutionResult::Failure { kind, detail } => Self {
                success: false,
                message: None,
                error: Some(detail),
                error_kind: Some(kind),
            },
        }
    }
}
