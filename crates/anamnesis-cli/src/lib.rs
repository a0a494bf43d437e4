//! Anamnesis CLI library.
//!
//! Configuration, the session that holds the current record, command
//! execution, the REPL, and output formatting for the `anamnesis` binary.

pub mod cli;
pub mod commands;
pub mod config;
pub mod error;
pub mod output;
pub mod repl;
pub mod session;

pub use cli::{Cli, Command};
pub use config::Config;
pub use error::{CliError, Result};
pub use output::Formatter;
pub use session::{read_record_file, AppSession, CurrentRecord, Session};
