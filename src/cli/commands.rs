use std::path::Path;

use tokio::io::AsyncReadExt;
use tracing::info;

use crate::cli::args::{
    CheckArgs, ConfigAction, ConfigArgs, ExecArgs, InitArgs, OutputFormat, TemplateArgs,
};
use crate::config::loader::get_config_path;
use crate::config::types::CoderunConfig;
use crate::error::{CoderunError, Result};
use crate::sandbox::{available_backends, ExecutionReport, Language, Sandbox, SyntaxReport};

// ============================================================================
// Sandbox Commands
// ============================================================================

/// Check source code for syntax errors
pub async fn check(args: CheckArgs, config: CoderunConfig, format: OutputFormat) -> Result<()> {
    info!(language = %args.language, "Checking syntax");

    let code = read_source(args.file.as_deref()).await?;
    let report = Sandbox::new(&config).check_syntax(&code, &args.language).await;

    output_syntax_report(&report, format)
}

/// Compile (if needed) and run source code
pub async fn exec(args: ExecArgs, mut config: CoderunConfig, format: OutputFormat) -> Result<()> {
    info!(language = %args.language, "Executing code");

    if let Some(seconds) = args.run_timeout {
        config.sandbox.run_timeout_seconds = seconds;
    }
    if let Some(seconds) = args.compile_timeout {
        config.sandbox.compile_timeout_seconds = seconds;
    }

    let code = read_source(args.file.as_deref()).await?;
    let report = Sandbox::new(&config).execute(&code, &args.language).await;

    output_execution_report(&report, format)
}

/// List supported languages
pub async fn languages(config: CoderunConfig, format: OutputFormat) -> Result<()> {
    let backends = available_backends(&config.toolchains);

    match format {
        OutputFormat::Text => {
            println!(
                "{:<8} {:<18} {:<16} STATUS",
                "LANGUAGE", "MODEL", "TOOLCHAIN"
            );
            println!("{}", "-".repeat(60));

            for backend in backends {
                let status = if backend.available {
                    "available".to_string()
                } else {
                    backend
                        .unavailable_reason
                        .unwrap_or_else(|| "unavailable".to_string())
                };
                println!(
                    "{:<8} {:<18} {:<16} {}",
                    backend.language.id(),
                    backend.model.to_string(),
                    backend.programs.join(", "),
                    status
                );
            }
        }
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&backends)?);
        }
    }

    Ok(())
}

/// Print a starter program
pub async fn template(args: TemplateArgs, format: OutputFormat) -> Result<()> {
    let language: Language = args.language.parse()?;

    match format {
        OutputFormat::Text => print!("{}", language.starter_template()),
        OutputFormat::Json => {
            println!(
                "{}",
                serde_json::json!({
                    "language": language,
                    "template": language.starter_template(),
                })
            );
        }
    }

    Ok(())
}

// ============================================================================
// Config Commands
// ============================================================================

pub async fn init(args: InitArgs) -> Result<()> {
    let config_path = get_config_path();

    if config_path.exists() && !args.force {
        println!("Configuration already exists at: {}", config_path.display());
        println!("Use --force to overwrite");
        return Ok(());
    }

    // Create parent directories if needed
    if let Some(parent) = config_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    // Write default configuration
    let default_config = CoderunConfig::default();
    let toml_str = toml::to_string_pretty(&default_config)
        .map_err(|e| CoderunError::Config(e.to_string()))?;

    std::fs::write(&config_path, toml_str)?;

    println!("Created configuration at: {}", config_path.display());
    println!("\nQuick start:");
    println!("  # Check a file for syntax errors");
    println!("  coderun check --lang python solution.py");
    println!();
    println!("  # Compile and run a program");
    println!("  coderun exec --lang c++ main.cpp");
    println!();
    println!("  # Read the program from stdin");
    println!("  echo 'print(42)' | coderun exec --lang python");

    Ok(())
}

pub async fn config(args: ConfigArgs, config: CoderunConfig) -> Result<()> {
    match args.action {
        ConfigAction::Show => {
            let toml_str = toml::to_string_pretty(&config)
                .map_err(|e| CoderunError::Config(e.to_string()))?;
            println!("{}", toml_str);
        }
        ConfigAction::Path => {
            println!("{}", get_config_path().display());
        }
    }
    Ok(())
}

// ============================================================================
// Helper Functions
// ============================================================================

async fn read_source(file: Option<&Path>) -> Result<String> {
    match file {
        Some(path) if path != Path::new("-") => Ok(tokio::fs::read_to_string(path).await?),
        _ => {
            let mut code = String::new();
            tokio::io::stdin().read_to_string(&mut code).await?;
            Ok(code)
        }
    }
}

fn output_execution_report(report: &ExecutionReport, format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Text => {
            if let Some(output) = &report.output {
                print!("{}", output);
            }
            if let Some(error) = &report.error {
                eprintln!("{}", error);
            }
        }
        OutputFormat::Json => println!("{}", serde_json::to_string(report)?),
    }

    if !report.success {
        std::process::exit(1);
    }
    Ok(())
}

fn output_syntax_report(report: &SyntaxReport, format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Text => {
            if let Some(message) = &report.message {
                println!("{}", message);
            }
            if let Some(error) = &report.error {
                eprintln!("{}", error);
            }
        }
        OutputFormat::Json => println!("{}", serde_json::to_string(report)?),
    }

    if !report.success {
        std::process::exit(1);
    }
    Ok(())
}
