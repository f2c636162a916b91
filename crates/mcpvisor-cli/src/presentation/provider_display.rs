//! Rendering of providers, probe results and events.

use mcpvisor_core::{ProviderConfig, ProviderEvent, ProviderTestResult};

use super::tables::format_optional;

/// Command and arguments as a single shell-like line.
pub fn command_line(provider: &ProviderConfig) -> String {
    std::iter::once(provider.command.as_str())
        .chain(provider.args.iter().map(String::as_str))
        .collect::<Vec<_>>()
        .join(" ")
}

/// One JSON line per event, for `mcpvisor run`.
pub fn event_line(event: &ProviderEvent) -> serde_json::Result<String> {
    serde_json::to_string(event)
}

/// Print a probe result for a human.
pub fn print_test_result(provider: &ProviderConfig, result: &ProviderTestResult) {
    if result.success {
        println!("✓ {} responded in {} ms", provider.name, result.duration);
        println!("  Version: {}", format_optional(result.version.as_ref(), "unknown"));
        match result.tool_count {
            Some(0) | None => println!("  Tools:   none"),
            Some(count) => println!("  Tools:   {count} ({})", result.tools.join(", ")),
        }
    } else {
        println!(
            "✗ {} failed after {} ms: {}",
            provider.name,
            result.duration,
            result.error.as_deref().unwrap_or("unknown error")
        );
    }
}
