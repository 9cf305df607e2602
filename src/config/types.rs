use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CoderunConfig {
    pub sandbox: SandboxConfig,
    pub toolchains: ToolchainConfig,
}

/// Wall-clock budgets and workspace placement.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SandboxConfig {
    /// Bounds each run step (interpreter, binary, bytecode runtime)
    pub run_timeout_seconds: u64,
    /// Bounds each compile step (g++, javac)
    pub compile_timeout_seconds: u64,
    /// Bounds syntax-only checks; unbounded when unset
    pub syntax_timeout_seconds: Option<u64>,
    /// Directory under which per-request workspaces are created
    /// (defaults to the system temp directory)
    pub workspace_root: Option<PathBuf>,
}

impl Default for SandboxConfig {
    fn default() -> Self {
        Self {
            run_timeout_seconds: 5,
            compile_timeout_seconds: 10,
            syntax_timeout_seconds: None,
            workspace_root: None,
        }
    }
}

impl SandboxConfig {
    pub fn run_timeout(&self) -> Duration {
        Duration::from_secs(self.run_timeout_seconds)
    }

    pub fn compile_timeout(&self) -> Duration {
        Duration::from_secs(self.compile_timeout_seconds)
    }

    pub fn syntax_timeout(&self) -> Option<Duration> {
        self.syntax_timeout_seconds.map(Duration::from_secs)
    }
}

/// Executables the backends invoke. Bare names are resolved on `PATH`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ToolchainConfig {
    /// Python 3 interpreter
    pub python: String,
    /// C++ compiler driver
    pub cxx: String,
    /// Extra flags passed to every C++ compiler invocation (e.g. "-std=c++17")
    pub cxx_flags: Vec<String>,
    /// Java compiler
    pub javac: String,
    /// Java runtime
    pub java: String,
}

impl Default for ToolchainConfig {
    fn default() -> Self {
        Self {
            python: "python3".to_string(),
            cxx: "g++".to_string(),
            cxx_flags: Vec::new(),
            javac: "javac".to_string(),
            java: "java".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_file_keeps_defaults() {
        let config: CoderunConfig = toml::from_str(
            r#"
            [sandbox]
            run_timeout_seconds = 2

            [toolchains]
            cxx_flags = ["-std=c++17"]
            "#,
        )
        .unwrap();

        assert_eq!(config.sandbox.run_timeout(), Duration::from_secs(2));
        assert_eq!(config.sandbox.compile_timeout(), Duration::from_secs(10));
        assert!(config.sandbox.syntax_timeout().is_none());
        assert_eq!(config.toolchains.cxx, "g++");
        assert_eq!(config.toolchains.cxx_flags, vec!["-std=c++17"]);
    }

    #[test]
    fn test_defaults_round_trip_through_toml() {
        let rendered = toml::to_string_pretty(&CoderunConfig::default()).unwrap();
        let parsed: CoderunConfig = toml::from_str(&rendered).unwrap();
        assert_eq!(parsed.sandbox.run_timeout_seconds, 5);
        assert_eq!(parsed.toolchains.java, "java");
    }
}
