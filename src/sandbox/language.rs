use std::fmt;
use std::str::FromStr;

use serde::Serialize;

use crate::error::{CoderunError, Result};

/// How a language turns source text into a running process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ExecutionModel {
    /// Source is handed straight to an interpreter
    Interpreted,
    /// Source is compiled to a native executable, then executed
    CompiledNative,
    /// Source is compiled to bytecode, then executed by a runtime
    CompiledBytecode,
}

impl fmt::Display for ExecutionModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Interpreted => "interpreted",
            Self::CompiledNative => "compiled-native",
            Self::CompiledBytecode => "compiled-bytecode",
        };
        f.write_str(name)
    }
}

/// A concrete language the sandbox knows how to check and run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    Python,
    Cpp,
    Java,
}

impl Language {
    pub const ALL: [Language; 3] = [Language::Python, Language::Cpp, Language::Java];

    pub fn model(self) -> ExecutionModel {
        match self {
            Self::Python => ExecutionModel::Interpreted,
            Self::Cpp => ExecutionModel::CompiledNative,
            Self::Java => ExecutionModel::CompiledBytecode,
        }
    }

    /// Canonical identifier accepted by [`Language::from_str`].
    pub fn id(self) -> &'static str {
        match self {
            Self::Python => "python",
            Self::Cpp => "c++",
            Self::Java => "java",
        }
    }

    pub fn display_name(self) -> &'static str {
        match self {
            Self::Python => "Python",
            Self::Cpp => "C++",
            Self::Java => "Java",
        }
    }

    pub fn source_extension(self) -> &'static str {
        match self {
            Self::Python => ".py",
            Self::Cpp => ".cpp",
            Self::Java => ".java",
        }
    }

    /// Skeleton program shown to users before they start typing.
    pub fn starter_template(self) -> &'static str {
        match self {
            Self::Python => "def solution():\n    # Write your code here\n    pass\n",
            Self::Cpp => {
                "#include <iostream>\nusing namespace std;\n\nint main() {\n    // Write your code here\n    return 0;\n}\n"
            }
            Self::Java => {
                "public class Solution {\n    public static void main(String[] args) {\n        // Write your code here\n    }\n}\n"
            }
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

impl FromStr for Language {
    type Err = CoderunError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "python" | "python3" | "py" => Ok(Self::Python),
            "c++" | "cpp" | "cxx" | "cc" => Ok(Self::Cpp),
            "java" => Ok(Self::Java),
            _ => Err(CoderunError::UnsupportedLanguage {
                language: s.to_string(),
            }),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    SyntaxCheck,
    Execute,
}

/// A validated unit of work: non-empty source bound to a language and mode.
#[derive(Debug, Clone)]
pub struct ExecutionRequest {
    code: String,
    language: Language,
    mode: Mode,
}

impl ExecutionRequest {
    /// Rejects whitespace-only source before any backend sees it.
    pub fn new(code: impl Into<String>, language: Language, mode: Mode) -> Result<Self> {
        let code = code.into();
        if code.trim().is_empty() {
            return Err(CoderunError::EmptyInput);
        }
        Ok(Self {
            code,
            language,
            mode,
        })
    }

    pub fn code(&self) -> &str {
        &self.code
    }

    pub fn language(&self) -> Language {
        self.language
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_identifiers() {
        assert_eq!("python".parse::<Language>().unwrap(), Language::Python);
        assert_eq!("Python".parse::<Language>().unwrap(), Language::Python);
        assert_eq!("C++".parse::<Language>().unwrap(), Language::Cpp);
        assert_eq!("cpp".parse::<Language>().unwrap(), Language::Cpp);
        assert_eq!(" java ".parse::<Language>().unwrap(), Language::Java);
    }

    #[test]
    fn test_unknown_language_fails_closed() {
        let err = "rust".parse::<Language>().unwrap_err();
        assert!(matches!(err, CoderunError::UnsupportedLanguage { .. }));
    }

    #[test]
    fn test_models() {
        assert_eq!(Language::Python.model(), ExecutionModel::Interpreted);
        assert_eq!(Language::Cpp.model(), ExecutionModel::CompiledNative);
        assert_eq!(Language::Java.model(), ExecutionModel::CompiledBytecode);
    }

    #[test]
    fn test_request_rejects_blank_code() {
        let err = ExecutionRequest::new(" \n\t ", Language::Python, Mode::Execute).unwrap_err();
        assert!(matches!(err, CoderunError::EmptyInput));

        let request = ExecutionRequest::new("print(1)", Language::Python, Mode::Execute).unwrap();
        assert_eq!(request.code(), "print(1)");
    }
}
