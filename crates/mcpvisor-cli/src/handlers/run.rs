//! Run command handler.
//!
//! Supervises the auto-start providers in the foreground and prints every
//! lifecycle event as a JSON line.

use anyhow::{Context, Result};
use mcpvisor_mcp::Subscription;
use tracing::info;

use crate::bootstrap::CliContext;
use crate::error::CliError;
use crate::presentation::event_line;

/// Run until Ctrl-C, then stop every provider.
pub async fn execute(ctx: &CliContext) -> Result<()> {
    let manager = ctx.manager();
    let mut events = manager.subscribe();
    manager.init().await.map_err(CliError::from)?;

    let stats = manager.get_stats().await;
    info!(
        store = %ctx.store_path().display(),
        total = stats.total,
        running = stats.running,
        "Supervising providers, press Ctrl-C to stop"
    );

    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);
    loop {
        tokio::select! {
            event = events.recv() => match event {
                Some(event) => print_event(&event)?,
                None => break,
            },
            signal = &mut ctrl_c => {
                signal.context("Failed to listen for Ctrl-C")?;
                info!("Received Ctrl-C, shutting down");
                break;
            }
        }
    }

    manager.shutdown().await;
    flush(&mut events)
}

fn flush(events: &mut Subscription) -> Result<()> {
    while let Some(event) = events.try_recv() {
        print_event(&event)?;
    }
    Ok(())
}

fn print_event(event: &mcpvisor_core::ProviderEvent) -> Result<()> {
    println!("{}", event_line(event).context("Failed to serialize event")?);
    Ok(())
}
