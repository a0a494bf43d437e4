//! Interactive REPL (Read-Eval-Print Loop) mode.
//!
//! The session keeps the last record between commands, so a failed
//! `deliver` can simply be typed again.

use crate::config::Config;
use crate::error::{CliError, Result};
use crate::output::Formatter;
use crate::session::{read_record_file, CurrentRecord, Session};
use anamnesis_delivery::DeliveryError;
use anamnesis_domain::traits::{LlmProvider, RecordSink};
use rustyline::error::ReadlineError;
use rustyline::history::DefaultHistory;
use rustyline::{Config as EditorConfig, Editor};
use std::path::PathBuf;

type ReplEditor = Editor<(), DefaultHistory>;

/// Line that ends a multi-line paste
const PASTE_TERMINATOR: &str = ".";

/// Run the interactive REPL.
pub async fn run_repl<L, S>(
    session: &mut Session<L, S>,
    config: &Config,
    formatter: &Formatter,
) -> Result<()>
where
    L: LlmProvider,
    S: RecordSink<Error = DeliveryError>,
{
    println!(
        "{}",
        formatter.info("Anamnesis REPL - Type 'help' for commands, 'exit' to quit")
    );
    if !session.can_deliver() {
        println!(
            "{}",
            formatter.warning("No webhook configured; 'deliver' is disabled.")
        );
    }
    println!();

    let editor_config = EditorConfig::builder()
        .max_history_size(config.settings.history_size)
        .map_err(|e| CliError::Config(format!("Invalid history size: {}", e)))?
        .build();
    let mut editor = ReplEditor::with_config(editor_config)
        .map_err(|e| CliError::Io(std::io::Error::other(format!("Failed to initialize editor: {}", e))))?;

    let history_path = history_path()?;
    let _ = editor.load_history(&history_path);

    loop {
        match editor.readline(&prompt(session)) {
            Ok(line) => {
                let line = line.trim();
                if line.is_empty() {
                    continue;
                }
                editor.add_history_entry(line).ok();

                match parse_repl_command(line) {
                    Ok(ReplCommand::Exit) => {
                        println!("{}", formatter.info("Goodbye!"));
                        break;
                    }
                    Ok(ReplCommand::Help) => print_help(formatter),
                    Ok(ReplCommand::Paste) => {
                        let text = read_paste(&mut editor);
                        if text.trim().is_empty() {
                            println!("{}", formatter.warning("Nothing pasted."));
                        } else {
                            let chars = text.chars().count();
                            session.set_text(text);
                            println!(
                                "{}",
                                formatter.success(&format!("History stored ({} chars)", chars))
                            );
                        }
                    }
                    Ok(cmd) => {
                        if let Err(e) = execute_repl_command(cmd, session, formatter).await {
                            eprintln!("{}", formatter.error(&e.to_string()));
                        }
                    }
                    Err(e) => {
                        eprintln!("{}", formatter.error(&e.to_string()));
                    }
                }
            }
            Err(ReadlineError::Interrupted) => {
                println!("{}", formatter.info("Use 'exit' to quit"));
            }
            Err(ReadlineError::Eof) => {
                break;
            }
            Err(err) => {
                eprintln!("{}", formatter.error(&format!("Error: {}", err)));
                break;
            }
        }
    }

    editor.save_history(&history_path).ok();

    Ok(())
}

/// REPL command type.
#[derive(Debug, Clone, PartialEq)]
pub enum ReplCommand {
    Paste,
    Questionnaire(bool),
    Mixed(bool),
    Extract,
    Deliver,
    Show,
    Save(PathBuf),
    Load(PathBuf),
    Folder,
    Status,
    Help,
    Exit,
}

/// Parse a REPL command line.
pub fn parse_repl_command(line: &str) -> Result<ReplCommand> {
    let parts: Vec<&str> = line.split_whitespace().collect();

    if parts.is_empty() {
        return Err(CliError::InvalidInput("Empty command".to_string()));
    }

    match parts[0] {
        "exit" | "quit" | "q" => Ok(ReplCommand::Exit),
        "help" | "?" => Ok(ReplCommand::Help),
        "paste" => Ok(ReplCommand::Paste),
        "questionnaire" => Ok(ReplCommand::Questionnaire(parse_toggle(&parts[1..])?)),
        "mixed" => Ok(ReplCommand::Mixed(parse_toggle(&parts[1..])?)),
        "extract" => Ok(ReplCommand::Extract),
        "deliver" => Ok(ReplCommand::Deliver),
        "show" => Ok(ReplCommand::Show),
        "save" => match parts.get(1) {
            Some(_) => Ok(ReplCommand::Save(PathBuf::from(parts[1..].join(" ")))),
            None => Err(CliError::InvalidInput("Usage: save <file>".to_string())),
        },
        "load" => match parts.get(1) {
            Some(_) => Ok(ReplCommand::Load(PathBuf::from(parts[1..].join(" ")))),
            None => Err(CliError::InvalidInput("Usage: load <file>".to_string())),
        },
        "folder" => Ok(ReplCommand::Folder),
        "status" => Ok(ReplCommand::Status),
        _ => Err(CliError::InvalidInput(format!(
            "Unknown command: {}. Type 'help' for available commands.",
            parts[0]
        ))),
    }
}

fn parse_toggle(args: &[&str]) -> Result<bool> {
    match args {
        ["on"] => Ok(true),
        ["off"] => Ok(false),
        _ => Err(CliError::InvalidInput("Usage: <toggle> on|off".to_string())),
    }
}

/// Execute a REPL command against the session.
async fn execute_repl_command<L, S>(
    cmd: ReplCommand,
    session: &mut Session<L, S>,
    formatter: &Formatter,
) -> Result<()>
where
    L: LlmProvider,
    S: RecordSink<Error = DeliveryError>,
{
    match cmd {
        ReplCommand::Questionnaire(on) => {
            session.set_questionnaire(on);
            println!("{}", formatter.info(&format!("Mode: {}", session.mode())));
        }
        ReplCommand::Mixed(on) => {
            session.set_mixed(on);
            println!("{}", formatter.info(&format!("Mode: {}", session.mode())));
        }
        ReplCommand::Extract => {
            println!(
                "{}",
                formatter.info(&format!("Extracting ({} mode)...", session.mode()))
            );
            let outcome = session.extract().await?;
            println!("{}", formatter.format_outcome(&outcome)?);
        }
        ReplCommand::Deliver => {
            let receipt = session.deliver().await?;
            println!(
                "{}",
                formatter.delivery_receipt(&receipt, session.folder_url())
            );
        }
        ReplCommand::Show => match session.current() {
            Some(CurrentRecord::Extracted(outcome)) => {
                println!("{}", formatter.format_outcome(outcome)?);
            }
            Some(CurrentRecord::Loaded(record)) => {
                println!("{}", formatter.format_record(record)?);
            }
            None => return Err(CliError::NoRecord),
        },
        ReplCommand::Save(path) => {
            session.save_record(&path)?;
            println!(
                "{}",
                formatter.success(&format!("Record saved to {}", path.display()))
            );
        }
        ReplCommand::Load(path) => {
            session.load_record(read_record_file(&path)?);
            println!(
                "{}",
                formatter.success(&format!("Record loaded from {}", path.display()))
            );
        }
        ReplCommand::Folder => match session.folder_url() {
            Some(url) => println!("{}", url),
            None => println!("{}", formatter.warning("No slides folder configured.")),
        },
        ReplCommand::Status => print_status(session, formatter),
        ReplCommand::Paste | ReplCommand::Help | ReplCommand::Exit => {}
    }

    Ok(())
}

/// Read lines until the terminator or end of input.
fn read_paste(editor: &mut ReplEditor) -> String {
    println!("Paste the patient history. End with a line containing only '.'");
    let mut lines = Vec::new();
    loop {
        match editor.readline("| ") {
            Ok(line) if line.trim() == PASTE_TERMINATOR => break,
            Ok(line) => lines.push(line),
            Err(_) => break,
        }
    }
    lines.join("\n")
}

fn prompt<L, S>(session: &Session<L, S>) -> String
where
    L: LlmProvider,
    S: RecordSink<Error = DeliveryError>,
{
    let marker = if session.current().is_some() { "*" } else { "" };
    format!("anamnesis [{}]{}> ", session.mode(), marker)
}

fn print_status<L, S>(session: &Session<L, S>, formatter: &Formatter)
where
    L: LlmProvider,
    S: RecordSink<Error = DeliveryError>,
{
    let text = session
        .text()
        .map(|t| format!("{} chars", t.chars().count()))
        .unwrap_or_else(|| "none".to_string());
    let record = match session.current() {
        Some(CurrentRecord::Extracted(_)) => "extracted",
        Some(CurrentRecord::Loaded(_)) => "loaded from file",
        None => "none",
    };

    println!("{}", formatter.info("Session:"));
    println!("  mode:     {}", session.mode());
    println!("  history:  {}", text);
    println!("  record:   {}", record);
    println!(
        "  delivery: {}",
        if session.can_deliver() { "configured" } else { "disabled" }
    );
}

fn history_path() -> Result<PathBuf> {
    let dir = Config::home_dir()?;
    std::fs::create_dir_all(&dir)?;
    Ok(dir.join("history.txt"))
}

fn print_help(formatter: &Formatter) {
    println!("{}", formatter.info("Available commands:"));
    println!();
    println!("  paste                      - Enter a patient history (end with '.')");
    println!("  questionnaire on|off       - Questionnaire input (adds HDA rewrite)");
    println!("  mixed on|off               - Narrative plus questionnaire (wins over questionnaire)");
    println!("  extract                    - Extract a record from the history");
    println!("  show                       - Show the current record");
    println!("  deliver                    - Send the current record to the webhook");
    println!("  save <file>                - Save the current record as JSON");
    println!("  load <file>                - Load a saved record (e.g. to deliver it again)");
    println!("  folder                     - Show the slides folder URL");
    println!("  status                     - Show session state");
    println!("  help, ?                    - Show this help");
    println!("  exit, quit, q              - Exit REPL");
    println!();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_simple_commands() {
        assert_eq!(parse_repl_command("paste").unwrap(), ReplCommand::Paste);
        assert_eq!(parse_repl_command("extract").unwrap(), ReplCommand::Extract);
        assert_eq!(parse_repl_command("deliver").unwrap(), ReplCommand::Deliver);
        assert_eq!(parse_repl_command("  q  ").unwrap(), ReplCommand::Exit);
        assert_eq!(parse_repl_command("?").unwrap(), ReplCommand::Help);
    }

    #[test]
    fn test_parse_toggles() {
        assert_eq!(
            parse_repl_command("questionnaire on").unwrap(),
            ReplCommand::Questionnaire(true)
        );
        assert_eq!(
            parse_repl_command("mixed off").unwrap(),
            ReplCommand::Mixed(false)
        );
        assert!(parse_repl_command("mixed").is_err());
        assert!(parse_repl_command("mixed yes").is_err());
    }

    #[test]
    fn test_parse_save() {
        assert_eq!(
            parse_repl_command("save paciente joao.json").unwrap(),
            ReplCommand::Save(PathBuf::from("paciente joao.json"))
        );
        assert!(matches!(
            parse_repl_command("save"),
            Err(CliError::InvalidInput(_))
        ));
    }

    #[test]
    fn test_parse_load() {
        assert_eq!(
            parse_repl_command("load record.json").unwrap(),
            ReplCommand::Load(PathBuf::from("record.json"))
        );
        assert!(parse_repl_command("load").is_err());
    }

    #[test]
    fn test_parse_unknown() {
        assert!(matches!(
            parse_repl_command("slides"),
            Err(CliError::InvalidInput(_))
        ));
    }
}
