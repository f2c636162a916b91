//! Remove command handler.

use anyhow::Result;

use crate::bootstrap::CliContext;
use crate::error::CliError;
use crate::handlers::resolve_provider;

/// Delete a provider from the store.
pub async fn execute(ctx: &CliContext, identifier: &str) -> Result<()> {
    let provider = resolve_provider(ctx.store(), identifier).await?;
    ctx.store()
        .remove(&provider.id)
        .await
        .map_err(CliError::from)?;

    println!("Removed provider '{}' ({})", provider.name, provider.id);
    Ok(())
}
