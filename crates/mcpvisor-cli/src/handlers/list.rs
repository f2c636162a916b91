//! List command handler.

use anyhow::Result;

use crate::bootstrap::CliContext;
use crate::presentation::{command_line, print_separator, truncate_string, yes_no};

/// Print every registered provider.
pub async fn execute(ctx: &CliContext) -> Result<()> {
    let providers = ctx.store().get_all().await;

    if providers.is_empty() {
        println!("No providers registered.");
        println!("Use 'mcpvisor add <name> <command>' or 'mcpvisor add-template <id>' to add one.");
        return Ok(());
    }

    println!("Found {} provider(s):\n", providers.len());
    println!(
        "{:<36} {:<20} {:<12} {:<5} {:<8} Command",
        "ID", "Name", "Type", "Auto", "Enabled"
    );
    print_separator(110);

    for provider in providers {
        println!(
            "{:<36} {:<20} {:<12} {:<5} {:<8} {}",
            provider.id,
            truncate_string(&provider.name, 19),
            truncate_string(&provider.provider_type, 11),
            yes_no(provider.auto_start),
            yes_no(provider.enabled),
            command_line(&provider)
        );
    }

    Ok(())
}
