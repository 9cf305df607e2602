use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[clap(name = "coderun")]
#[clap(version, about = "Check and run Python, C++ and Java code under time limits")]
#[clap(propagate_version = true)]
pub struct Cli {
    #[clap(flatten)]
    pub global_opts: GlobalOpts,

    #[clap(subcommand)]
    pub command: Commands,
}

#[derive(Args, Debug)]
pub struct GlobalOpts {
    /// Configuration file path
    #[clap(short, long, global = true, env = "CODERUN_CONFIG")]
    pub config: Option<PathBuf>,

    /// Verbosity level (-v, -vv, -vvv)
    #[clap(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Output format
    #[clap(long, global = true, default_value = "text", value_enum)]
    pub format: OutputFormat,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Check source code for syntax errors without running it
    Check(CheckArgs),

    /// Compile (if needed) and run source code
    Exec(ExecArgs),

    /// List supported languages and whether their toolchains are installed
    Languages,

    /// Print a starter program for a language
    Template(TemplateArgs),

    /// Initialize a new coderun configuration
    Init(InitArgs),

    /// Manage configuration
    Config(ConfigArgs),
}

// ============================================================================
// Sandbox Commands
// ============================================================================

#[derive(Args, Debug)]
pub struct CheckArgs {
    /// Language identifier (python, c++, java)
    #[clap(long = "lang", short = 'l')]
    pub language: String,

    /// Source file to check; reads stdin when omitted or "-"
    pub file: Option<PathBuf>,
}

#[derive(Args, Debug)]
pub struct ExecArgs {
    /// Language identifier (python, c++, java)
    #[clap(long = "lang", short = 'l')]
    pub language: String,

    /// Source file to run; reads stdin when omitted or "-"
    pub file: Option<PathBuf>,

    /// Override the run timeout in seconds
    #[clap(long)]
    pub run_timeout: Option<u64>,

    /// Override the compile timeout in seconds
    #[clap(long)]
    pub compile_timeout: Option<u64>,
}

#[derive(Args, Debug)]
pub struct TemplateArgs {
    /// Language identifier (python, c++, java)
    #[clap(long = "lang", short = 'l')]
    pub language: String,
}

// ============================================================================
// Config Commands
// ============================================================================

#[derive(Args, Debug)]
pub struct InitArgs {
    /// Force overwrite existing configuration
    #[clap(short, long)]
    pub force: bool,
}

#[derive(Args, Debug)]
pub struct ConfigArgs {
    #[clap(subcommand)]
    pub action: ConfigAction,
}

#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Show current configuration
    Show,
    /// Show configuration file path
    Path,
}

// ============================================================================
// Common Types
// ============================================================================

#[derive(Debug, Clone, Default, ValueEnum)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_exec() {
        let cli = Cli::try_parse_from([
            "coderun",
            "exec",
            "--lang",
            "c++",
            "main.cpp",
            "--run-timeout",
            "2",
            "--format",
            "json",
        ])
        .unwrap();

        assert!(matches!(cli.global_opts.format, OutputFormat::Json));
        match cli.command {
            Commands::Exec(args) => {
                assert_eq!(args.language, "c++");
                assert_eq!(args.file, Some(PathBuf::from("main.cpp")));
                assert_eq!(args.run_timeout, Some(2));
                assert_eq!(args.compile_timeout, None);
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_check_reads_stdin_by_default() {
        let cli = Cli::try_parse_from(["coderun", "check", "-l", "python"]).unwrap();
        match cli.command {
            Commands::Check(args) => assert!(args.file.is_none()),
            other => panic!("unexpected command: {:?}", other),
        }
    }
}
