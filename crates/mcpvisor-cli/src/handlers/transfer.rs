//! Export and import command handlers.

use std::path::Path;

use anyhow::{Context, Result};

use crate::bootstrap::CliContext;
use crate::error::CliError;

/// Write a snapshot of every provider to `output`, or stdout.
pub async fn export(ctx: &CliContext, output: Option<&Path>) -> Result<()> {
    let snapshot = ctx.store().export().await;
    let json = snapshot.to_json().context("Failed to serialize snapshot")?;

    match output {
        Some(path) => {
            tokio::fs::write(path, json).await.map_err(CliError::from)?;
            eprintln!(
                "Exported {} provider(s) to {}",
                snapshot.providers.len(),
                path.display()
            );
        }
        None => println!("{json}"),
    }
    Ok(())
}

/// Replace every provider with the contents of a snapshot file.
pub async fn import(ctx: &CliContext, file: &Path) -> Result<()> {
    let json = tokio::fs::read_to_string(file)
        .await
        .map_err(CliError::from)
        .with_context(|| format!("Failed to read {}", file.display()))?;

    let outcome = ctx.store().import(&json).await.map_err(CliError::from)?;
    println!(
        "Imported {} provider(s), replacing {}",
        outcome.current.len(),
        outcome.previous.len()
    );
    Ok(())
}
