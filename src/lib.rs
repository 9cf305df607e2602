pub mod cli;
pub mod config;
pub mod error;
pub mod sandbox;

pub use error::{CoderunError, ErrorKind, Result};
pub use sandbox::{ExecutionReport, ExecutionResult, Sandbox, SyntaxReport};
