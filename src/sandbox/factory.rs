use crate::config::types::ToolchainConfig;
use crate::sandbox::backends::{CppBackend, JavaBackend, PythonBackend};
use crate::sandbox::language::{ExecutionModel, Language};
use crate::sandbox::supervisor::Limits;
use crate::sandbox::traits::LanguageBackend;

/// Create the backend for a language.
///
/// Toolchains are not looked up here; a missing executable surfaces when the
/// backend first tries to spawn it.
pub fn create_backend(
    language: Language,
    toolchains: &ToolchainConfig,
    limits: Limits,
) -> Box<dyn LanguageBackend> {
    match language {
        Language::Python => Box::new(PythonBackend::new(toolchains, limits)),
        Language::Cpp => Box::new(CppBackend::new(toolchains, limits)),
        Language::Java => Box::new(JavaBackend::new(toolchains, limits)),
    }
}

/// Get information about every backend and whether its toolchain is installed.
pub fn available_backends(toolchains: &ToolchainConfig) -> Vec<BackendInfo> {
    Language::ALL
        .iter()
        .map(|&language| {
            let backend = create_backend(language, toolchains, Limits::default());
            let missing: Vec<String> = backend
                .toolchains()
                .iter()
                .filter(|toolchain| toolchain.locate().is_none())
                .map(|toolchain| toolchain.unavailable().to_string())
                .collect();

            BackendInfo {
                language,
                model: language.model(),
                programs: backend
                    .toolchains()
                    .into_iter()
                    .map(|toolchain| toolchain.program)
                    .collect(),
                available: missing.is_empty(),
                unavailable_reason: if missing.is_empty() {
                    None
                } else {
                    Some(missing.join(" "))
                },
            }
        })
        .collect()
}

/// Information about a language backend.
#[derive(Debug, Clone, serde::Serialize)]
pub struct BackendInfo {
    pub language: Language,
    pub model: ExecutionModel,
    pub programs: Vec<String>,
    pub available: bool,
    pub unavailable_reason: Option<String>,
}
