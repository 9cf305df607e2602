//! Lifecycle of a compile-then-run request.

use std::fmt;

use tracing::debug;

use crate::error::{CoderunError, Result};
use crate::sandbox::CommandResult;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Idle,
    Compiling,
    CompileFailed,
    Compiled,
    Running,
    Succeeded,
    RuntimeFailed,
    TimedOut,
}

impl Stage {
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            Self::CompileFailed | Self::Succeeded | Self::RuntimeFailed | Self::TimedOut
        )
    }

    pub fn can_advance_to(self, next: Stage) -> bool {
        use Stage::*;
        matches!(
            (self, next),
            (Idle, Compiling)
                | (Compiling, CompileFailed)
                | (Compiling, Compiled)
                | (Compiling, TimedOut)
                | (Compiled, Running)
                | (Running, Succeeded)
                | (Running, RuntimeFailed)
                | (Running, TimedOut)
        )
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// Walks a compiled backend through [`Stage`]s, logging each transition.
#[derive(Debug)]
pub struct StageTracker {
    backend: &'static str,
    stage: Stage,
}

impl StageTracker {
    pub fn new(backend: &'static str) -> Self {
        Self {
            backend,
            stage: Stage::Idle,
        }
    }

    pub fn stage(&self) -> Stage {
        self.stage
    }

    pub fn advance(&mut self, next: Stage) {
        debug_assert!(
            self.stage.can_advance_to(next),
            "invalid stage transition {} -> {}",
            self.stage,
            next
        );
        debug!(backend = self.backend, from = %self.stage, to = %next, "Stage transition");
        self.stage = next;
    }

    /// Settle the compile step. A completed compiler run with a nonzero exit
    /// becomes [`CoderunError::Compile`].
    pub fn finish_compile(&mut self, outcome: Result<CommandResult>) -> Result<CommandResult> {
        match outcome {
            Ok(result) if result.success() => {
                self.advance(Stage::Compiled);
                Ok(result)
            }
            Ok(result) => {
                self.advance(Stage::CompileFailed);
                Err(CoderunError::Compile {
                    stderr: result.stderr,
                })
            }
            Err(err @ CoderunError::Timeout { .. }) => {
                self.advance(Stage::TimedOut);
                Err(err)
            }
            Err(err) => {
                self.advance(Stage::CompileFailed);
                Err(err)
            }
        }
    }

    pub fn finish_run<T>(&mut self, outcome: Result<T>) -> Result<T> {
        let next = match &outcome {
            Ok(_) => Stage::Succeeded,
            Err(CoderunError::Timeout { .. }) => Stage::TimedOut,
            Err(_) => Stage::RuntimeFailed,
        };
        self.advance(next);
        outcome
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sandbox::Step;

    #[test]
    fn test_terminal_stages_do_not_advance() {
        for stage in [
            Stage::CompileFailed,
            Stage::Succeeded,
            Stage::RuntimeFailed,
            Stage::TimedOut,
        ] {
            assert!(stage.is_terminal());
            assert!(!stage.can_advance_to(Stage::Running));
        }
    }

    #[test]
    fn test_run_requires_successful_compile() {
        assert!(!Stage::Idle.can_advance_to(Stage::Running));
        assert!(!Stage::Compiling.can_advance_to(Stage::Running));
        assert!(Stage::Compiled.can_advance_to(Stage::Running));
    }

    #[test]
    fn test_compile_timeout_is_terminal() {
        let mut tracker = StageTracker::new("cpp");
        tracker.advance(Stage::Compiling);
        let err = tracker
            .finish_compile(Err(CoderunError::Timeout {
                step: Step::Compile,
                seconds: 10,
            }))
            .unwrap_err();
        assert!(matches!(err, CoderunError::Timeout { .. }));
        assert_eq!(tracker.stage(), Stage::TimedOut);
    }

    #[test]
    fn test_run_failure_stage() {
        let mut tracker = StageTracker::new("java");
        tracker.advance(Stage::Compiling);
        tracker.advance(Stage::Compiled);
        tracker.advance(Stage::Running);
        let outcome: Result<String> = Err(CoderunError::Runtime {
            message: "boom".to_string(),
        });
        assert!(tracker.finish_run(outcome).is_err());
        assert_eq!(tracker.stage(), Stage::RuntimeFailed);
    }
}
