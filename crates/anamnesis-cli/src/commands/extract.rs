//! Extract and run command implementations.

use crate::cli::InputArgs;
use crate::error::{CliError, Result};
use crate::output::Formatter;
use crate::session::Session;
use anamnesis_delivery::DeliveryError;
use anamnesis_domain::traits::{LlmProvider, RecordSink};
use std::fs;
use std::io::{self, Read};

/// Read the patient history from `--file`, `--stdin` or the positional text.
pub fn read_input(args: &InputArgs) -> Result<String> {
    let text = if args.stdin {
        let mut buffer = String::new();
        io::stdin().read_to_string(&mut buffer)?;
        buffer
    } else if let Some(path) = &args.file {
        fs::read_to_string(path)?
    } else if let Some(text) = &args.text {
        text.clone()
    } else {
        return Err(CliError::InvalidInput(
            "Provide the history as text, --file or --stdin".to_string(),
        ));
    };

    Ok(text)
}

/// Execute the extract command.
pub async fn execute_extract<L, S>(
    args: InputArgs,
    session: &mut Session<L, S>,
    formatter: &Formatter,
) -> Result<()>
where
    L: LlmProvider,
    S: RecordSink<Error = DeliveryError>,
{
    extract_and_print(&args, session, formatter).await
}

/// Execute the run command: extract, print, then deliver once.
pub async fn execute_run<L, S>(
    args: InputArgs,
    session: &mut Session<L, S>,
    formatter: &Formatter,
) -> Result<()>
where
    L: LlmProvider,
    S: RecordSink<Error = DeliveryError>,
{
    extract_and_print(&args, session, formatter).await?;

    match session.deliver().await {
        Ok(receipt) => {
            println!(
                "{}",
                formatter.delivery_receipt(&receipt, session.folder_url())
            );
            Ok(())
        }
        Err(e) => {
            if args.output.is_none() {
                eprintln!(
                    "{}",
                    formatter.warning("Record not saved. Re-run with --output to keep it for 'deliver'.")
                );
            }
            Err(e)
        }
    }
}

async fn extract_and_print<L, S>(
    args: &InputArgs,
    session: &mut Session<L, S>,
    formatter: &Formatter,
) -> Result<()>
where
    L: LlmProvider,
    S: RecordSink<Error = DeliveryError>,
{
    let text = read_input(args)?;
    session.set_questionnaire(args.questionnaire);
    session.set_mixed(args.mixed);

    let outcome = session.extract_text(text).await?;
    println!("{}", formatter.format_outcome(&outcome)?);

    if let Some(path) = &args.output {
        session.save_record(path)?;
        eprintln!(
            "{}",
            formatter.success(&format!("Record saved to {}", path.display()))
        );
    }

    Ok(())
}
