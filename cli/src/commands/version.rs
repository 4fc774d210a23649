//! `ferry version`

use anyhow::Result;

use crate::app::OutputMode;
use crate::output::json::to_pretty;

/// Prints the crate version.
///
/// # Errors
///
/// Returns an error if JSON serialization fails.
pub fn run(mode: OutputMode) -> Result<()> {
    let version = env!("CARGO_PKG_VERSION");
    match mode {
        OutputMode::Json => println!("{}", to_pretty(&serde_json::json!({ "version": version }))?),
        OutputMode::Human => println!("ferry {version}"),
    }
    Ok(())
}
