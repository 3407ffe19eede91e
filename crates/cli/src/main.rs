// stainplan CLI - staining plan tables to instrument run documents

mod exit_codes;
mod generate;
mod run_setting;

use std::process::ExitCode;

use clap::{Parser, Subcommand};
use stainplan_config::ConfigError;
use stainplan_engine::EngineError;
use stainplan_io::{GenerateError, LoadError};

use exit_codes::{
    EXIT_CONFIG, EXIT_ERROR, EXIT_INPUT_MISSING, EXIT_SUCCESS, EXIT_TABLE, EXIT_TEMPLATE,
    EXIT_USAGE, EXIT_WRITE,
};
use generate::GenerateArgs;
use run_setting::RunSettingCommands;

#[derive(Parser)]
#[command(name = "stainplan")]
#[command(about = "Generate instrument run documents from staining plan spreadsheets")]
#[command(long_version = long_version())]
#[command(version)]
struct Cli {
    /// More log output (-v info, -vv debug); RUST_LOG takes precedence
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build the run document for a plan table
    #[command(after_help = "\
Examples:
  stainplan generate plan.xlsx
  stainplan generate plan.xlsx -C ~/runs/lung --preset multi-sheet --sheet Plan
  stainplan generate plan.csv --template base.xml --mapper dyes.json -o run.xml
  stainplan generate plan.xlsx --dry-run --json

Relative paths resolve against --workdir. Without --template/--mapper the
files template_base.xml and mapper.json are looked up in the working
directory, then in the stainplan config directory.")]
    Generate(GenerateArgs),

    /// Show or edit the persisted run setting
    #[command(subcommand)]
    #[command(after_help = "\
Examples:
  stainplan run-setting show
  stainplan run-setting set --step-count 4 --visual-field-count 3
  stainplan run-setting set --field 5:5 --field 3:8
  stainplan run-setting show --template template_base.xml
  stainplan run-setting reset")]
    RunSetting(RunSettingCommands),
}

fn long_version() -> &'static str {
    concat!(
        env!("CARGO_PKG_VERSION"),
        " (", env!("STAINPLAN_GIT_REV"), ")",
        "\nengine:  stainplan-engine ", env!("CARGO_PKG_VERSION"),
        "\ntarget:  ", env!("STAINPLAN_TARGET"),
    )
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp(None)
        .init();
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let result = match cli.command {
        Commands::Generate(args) => generate::cmd_generate(args),
        Commands::RunSetting(command) => run_setting::cmd_run_setting(command),
    };

    match result {
        Ok(()) => ExitCode::from(EXIT_SUCCESS),
        Err(CliError { code, message, hint }) => {
            if !message.is_empty() {
                eprintln!("error: {}", message);
            }
            if let Some(hint) = hint {
                eprintln!("hint:  {}", hint);
            }
            ExitCode::from(code)
        }
    }
}

#[derive(Debug)]
pub struct CliError {
    pub code: u8,
    pub message: String,
    pub hint: Option<String>,
}

impl CliError {
    fn new(code: u8, msg: impl Into<String>) -> Self {
        Self { code, message: msg.into(), hint: None }
    }

    pub fn usage(msg: impl Into<String>) -> Self {
        Self::new(EXIT_USAGE, msg)
    }

    pub fn missing(msg: impl Into<String>) -> Self {
        Self::new(EXIT_INPUT_MISSING, msg)
    }

    pub fn config(msg: impl Into<String>) -> Self {
        Self::new(EXIT_CONFIG, msg)
    }

    pub fn write(msg: impl Into<String>) -> Self {
        Self::new(EXIT_WRITE, msg)
    }

    /// Map a pipeline failure to its exit code, with a hint where the fix is
    /// usually on the command line.
    pub fn generate(err: GenerateError) -> Self {
        let message = err.to_string();
        match &err {
            GenerateError::TemplateNotFound(_) => Self::missing(message)
                .with_hint("pass --template, or put template_base.xml in the working directory"),
            GenerateError::MapperNotFound(_) => Self::missing(message)
                .with_hint("pass --mapper, or put mapper.json in the working directory"),
            GenerateError::Table(LoadError::NotFound(_)) => Self::missing(message),
            GenerateError::Table(LoadError::UnsupportedFormat { .. }) => Self::new(EXIT_TABLE, message)
                .with_hint("supported: .xlsx .xlsm .xls .xlsb .ods .csv .tsv .txt"),
            GenerateError::Table(LoadError::SheetNotFound { .. }) => Self::new(EXIT_TABLE, message)
                .with_hint("pass --sheet with one of the available sheet names"),
            GenerateError::Table(_) => Self::new(EXIT_TABLE, message),
            GenerateError::Plan { source, .. } => {
                let err = Self::new(EXIT_TABLE, message);
                match source {
                    EngineError::InvalidNumber { .. }
                    | EngineError::MissingValue { .. }
                    | EngineError::InvalidStepKey { .. } => {
                        err.with_hint("check that --preset/--layout matches the sheet's columns")
                    }
                    _ => err,
                }
            }
            GenerateError::Template { .. } => Self::new(EXIT_TEMPLATE, message),
            GenerateError::MapperRead { .. } | GenerateError::Mapper { .. } => Self::config(message),
            GenerateError::Write { .. } => Self::write(message),
        }
    }

    /// Add a hint to an existing error.
    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }
}

impl From<ConfigError> for CliError {
    fn from(err: ConfigError) -> Self {
        match err {
            ConfigError::Io { .. } => Self::write(err.to_string()),
            ConfigError::Encode(_) => Self::new(EXIT_ERROR, err.to_string()),
        }
    }
}
