use serde::Serialize;
use thiserror::Error;

use crate::sandbox::Step;

#[derive(Error, Debug)]
pub enum CoderunError {
    // Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("TOML parse error: {0}")]
    TomlParse(String),

    // Request validation errors
    #[error("Code cannot be empty")]
    EmptyInput,

    #[error("Unsupported language: {language}")]
    UnsupportedLanguage { language: String },

    #[error("No public class found. Java code must contain a public class.")]
    MissingEntryPoint,

    #[error("Multiple public top-level types found ({names}). Java code must contain exactly one public class.")]
    AmbiguousEntryPoint { names: String },

    // Toolchain errors
    #[error("{tool} ({program}) not found. Please install {package}.")]
    ToolchainUnavailable {
        tool: String,
        program: String,
        package: String,
    },

    #[error("{}", format_syntax(.line, .message))]
    Syntax { line: Option<u32>, message: String },

    #[error("Compilation Error:\n{stderr}")]
    Compile { stderr: String },

    #[error("Runtime Error: {message}")]
    Runtime { message: String },

    #[error("{}", format_timeout(.step, .seconds))]
    Timeout { step: Step, seconds: u64 },

    // IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // Serialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    // Generic wrapper
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

fn format_syntax(line: &Option<u32>, message: &str) -> String {
    match line {
        Some(line) => format!("Line {}: {}", line, message),
        None => message.to_string(),
    }
}

fn format_timeout(step: &Step, seconds: &u64) -> String {
    step.timeout_message(*seconds)
}

/// Coarse classification of a failure, stable across detail wording.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    EmptyInput,
    UnsupportedLanguage,
    SyntaxError,
    ToolchainUnavailable,
    CompileError,
    RuntimeError,
    TimeoutError,
    MissingEntryPoint,
    IoError,
    Internal,
}

impl CoderunError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::EmptyInput => ErrorKind::EmptyInput,
            Self::UnsupportedLanguage { .. } => ErrorKind::UnsupportedLanguage,
            Self::MissingEntryPoint | Self::AmbiguousEntryPoint { .. } => {
                ErrorKind::MissingEntryPoint
            }
            Self::ToolchainUnavailable { .. } => ErrorKind::ToolchainUnavailable,
            Self::Syntax { .. } => ErrorKind::SyntaxError,
            Self::Compile { .. } => ErrorKind::CompileError,
            Self::Runtime { .. } => ErrorKind::RuntimeError,
            Self::Timeout { .. } => ErrorKind::TimeoutError,
            Self::Io(_) => ErrorKind::IoError,
            Self::Config(_) | Self::TomlParse(_) | Self::Json(_) | Self::Other(_) => {
                ErrorKind::Internal
            }
        }
    }
}

pub type Result<T> = std::result::Result<T, CoderunError>;
