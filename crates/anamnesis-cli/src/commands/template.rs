//! Template command implementation.

use crate::error::Result;
use anamnesis_domain::template::template_json_pretty;

/// Print the extraction template.
pub fn execute_template() -> Result<()> {
    println!("{}", template_json_pretty());
    Ok(())
}
