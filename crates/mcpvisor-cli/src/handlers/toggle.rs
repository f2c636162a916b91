//! Enable and disable command handlers.

use anyhow::Result;
use mcpvisor_core::UpdateProvider;

use crate::bootstrap::CliContext;
use crate::error::CliError;
use crate::handlers::resolve_provider;

/// Set a provider's enabled flag.
pub async fn execute(ctx: &CliContext, identifier: &str, enabled: bool) -> Result<()> {
    let provider = resolve_provider(ctx.store(), identifier).await?;
    if provider.enabled == enabled {
        println!(
            "Provider '{}' is already {}",
            provider.name,
            if enabled { "enabled" } else { "disabled" }
        );
        return Ok(());
    }

    let patch = UpdateProvider {
        enabled: Some(enabled),
        ..UpdateProvider::default()
    };
    let updated = ctx
        .store()
        .update(&provider.id, &patch)
        .await
        .map_err(CliError::from)?;

    println!(
        "{} provider '{}'",
        if enabled { "Enabled" } else { "Disabled" },
        updated.name
    );
    Ok(())
}
