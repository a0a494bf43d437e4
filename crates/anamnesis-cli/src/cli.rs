//! CLI command definitions and argument parsing.

use clap::{ArgAction, Parser, Subcommand};
use std::path::PathBuf;

/// Anamnesis CLI - Turn free-text patient histories into structured records.
#[derive(Debug, Parser)]
#[command(name = "anamnesis")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Output format
    #[arg(short, long, value_enum, global = true)]
    pub format: Option<CliFormat>,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Configuration file path
    #[arg(short, long, global = true, env = "ANAMNESIS_CONFIG")]
    pub config: Option<PathBuf>,

    /// Increase log verbosity (-v info, -vv debug)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Option<Command>,
}

/// Output format options.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum CliFormat {
    /// Table format (default)
    Table,
    /// JSON format
    Json,
}

/// CLI commands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Extract a record from a patient history and print it
    Extract(InputArgs),

    /// Extract a record and deliver it to the webhook
    Run(InputArgs),

    /// Deliver a previously saved record
    Deliver(DeliverArgs),

    /// Print the extraction template
    Template,

    /// Show or initialize the configuration file
    Config(ConfigArgs),

    /// Enter interactive REPL mode
    Repl,
}

/// Where the patient history comes from, and how to read it.
#[derive(Debug, Parser)]
pub struct InputArgs {
    /// Patient history text
    pub text: Option<String>,

    /// Read the history from a file
    #[arg(long, conflicts_with_all = ["text", "stdin"])]
    pub file: Option<PathBuf>,

    /// Read the history from stdin
    #[arg(long, conflicts_with = "text")]
    pub stdin: bool,

    /// Input is questionnaire-style (adds an HDA rewrite pass)
    #[arg(short, long)]
    pub questionnaire: bool,

    /// Input mixes narrative and questionnaire (takes precedence)
    #[arg(short, long)]
    pub mixed: bool,

    /// Also save the record as JSON to this file
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

/// Arguments for the deliver command.
#[derive(Debug, Parser)]
pub struct DeliverArgs {
    /// JSON record file (template shape, as written by `extract --output`)
    #[arg(long)]
    pub file: PathBuf,
}

/// Arguments for configuration management.
#[derive(Debug, Parser)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub action: ConfigAction,
}

/// Configuration actions.
#[derive(Debug, Subcommand)]
pub enum ConfigAction {
    /// Print the effective configuration (credential masked)
    Show,

    /// Write a default configuration file
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },

    /// Print the configuration file path
    Path,
}

impl From<CliFormat> for crate::config::OutputFormat {
    fn from(format: CliFormat) -> Self {
        match format {
            CliFormat::Table => crate::config::OutputFormat::Table,
            CliFormat::Json => crate::config::OutputFormat::Json,
        }
    }
}
