//! Anamnesis CLI - Structured patient records from free-text histories.

use anamnesis_cli::commands;
use anamnesis_cli::repl;
use anamnesis_cli::{AppSession, Cli, Command, Config, Formatter};
use clap::Parser;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

async fn run() -> anamnesis_cli::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let config_path = match cli.config.clone() {
        Some(path) => path,
        None => Config::path()?,
    };
    let mut config = Config::load_from(&config_path)?;
    let applied = config.apply_env();
    if !applied.is_empty() {
        tracing::debug!(variables = ?applied, "Environment overrides applied");
    }

    let format = cli
        .format
        .map(Into::into)
        .unwrap_or(config.settings.format);
    let color_enabled = !cli.no_color && config.settings.color;
    let formatter = Formatter::new(format, color_enabled);

    match cli.command {
        Some(Command::Template) => {
            commands::execute_template()?;
        }
        Some(Command::Config(args)) => {
            commands::execute_config(args, &config, &config_path, &formatter)?;
        }
        Some(Command::Deliver(args)) => {
            let sink = commands::webhook_from_config(&config)?;
            let folder_url = config.delivery.folder_url.as_deref();
            commands::execute_deliver(args, &sink, folder_url, &formatter).await?;
        }
        cmd => {
            // Everything else needs a configured provider
            let mut session = AppSession::from_config(&config)?;

            match cmd {
                None | Some(Command::Repl) => {
                    repl::run_repl(&mut session, &config, &formatter).await?;
                }
                Some(Command::Extract(args)) => {
                    commands::execute_extract(args, &mut session, &formatter).await?;
                }
                Some(Command::Run(args)) => {
                    commands::execute_run(args, &mut session, &formatter).await?;
                }
                Some(Command::Template) | Some(Command::Config(_)) | Some(Command::Deliver(_)) => {
                    unreachable!()
                }
            }
        }
    }

    Ok(())
}

/// Log to stderr. `RUST_LOG` wins over `-v`.
fn init_tracing(verbose: u8) {
    let default_level = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(filter)
        .with_target(false)
        .init();
}
