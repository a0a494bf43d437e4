//! Deliver command implementation.

use crate::cli::DeliverArgs;
use crate::config::Config;
use crate::error::Result;
use crate::output::Formatter;
use crate::session::read_record_file;
use anamnesis_delivery::{DeliveryError, WebhookClient};
use anamnesis_domain::traits::RecordSink;
use anamnesis_domain::RecordPayload;

/// Build the webhook client alone; a saved record needs no provider.
pub fn webhook_from_config(config: &Config) -> Result<WebhookClient> {
    Ok(WebhookClient::new(config.delivery.clone())?)
}

/// Execute the deliver command on a saved record.
pub async fn execute_deliver<S>(
    args: DeliverArgs,
    sink: &S,
    folder_url: Option<&str>,
    formatter: &Formatter,
) -> Result<()>
where
    S: RecordSink<Error = DeliveryError>,
{
    let record = read_record_file(&args.file)?;
    let receipt = sink.deliver(&RecordPayload::new(record)).await?;
    println!("{}", formatter.delivery_receipt(&receipt, folder_url));

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CliError;

    #[test]
    fn test_webhook_without_provider_key() {
        let mut config = Config::default();
        config.delivery.webhook_url = "https://script.example.com/exec".to_string();

        assert!(config.validate().is_err());
        assert!(webhook_from_config(&config).is_ok());
    }

    #[test]
    fn test_webhook_requires_url() {
        let config = Config::default();
        assert!(matches!(
            webhook_from_config(&config),
            Err(CliError::Delivery(DeliveryError::Config(_)))
        ));
    }
}
