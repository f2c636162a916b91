//! Common test utilities.
//!
//! Managers wired to scripted fakes, event collection, and a shell script
//! that speaks just enough MCP to pass a handshake.

#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use mcpvisor::mcpvisor_mcp::testing::{ScriptedController, ScriptedProbe};
use mcpvisor::{
    HealthProbe, InMemoryRepository, ManagerSettings, NewProvider, ProviderEvent, ProviderManager,
    ProviderManagerDeps, ProviderRepository, Subscription,
};

/// Settings with short timings so tests finish quickly.
pub fn fast_settings() -> ManagerSettings {
    ManagerSettings {
        stop_grace_ms: 300,
        probe_timeout_ms: 5_000,
        startup_check_ms: 50,
        ..ManagerSettings::default()
    }
}

/// Manager over an in-memory repository and the given fakes.
pub fn scripted_manager(
    controller: &ScriptedController,
    probe: Arc<dyn HealthProbe>,
) -> ProviderManager {
    manager_with_repository(Arc::new(InMemoryRepository::new()), controller, probe)
}

pub fn manager_with_repository(
    repository: Arc<dyn ProviderRepository>,
    controller: &ScriptedController,
    probe: Arc<dyn HealthProbe>,
) -> ProviderManager {
    ProviderManager::new(
        ProviderManagerDeps {
            repository,
            controller: Arc::new(controller.clone()),
            probe,
        },
        fast_settings(),
    )
}

pub fn passing_probe() -> Arc<dyn HealthProbe> {
    Arc::new(ScriptedProbe::passing())
}

/// Names of every event already buffered on `sub`.
pub fn drain_names(sub: &mut Subscription) -> Vec<&'static str> {
    std::iter::from_fn(|| sub.try_recv())
        .map(|event| event.event_name())
        .collect()
}

/// Wait for the next event, failing the test after two seconds.
pub async fn next_event(sub: &mut Subscription) -> ProviderEvent {
    tokio::time::timeout(Duration::from_secs(2), sub.recv())
        .await
        .expect("timed out waiting for an event")
        .expect("event bus closed")
}

const FAKE_MCP_SERVER: &str = r#"
while IFS= read -r line; do
  id=$(printf '%s\n' "$line" | sed -n 's/.*"id":\([0-9][0-9]*\).*/\1/p')
  case "$line" in
    *'"method":"initialize"'*)
      printf '{"jsonrpc":"2.0","id":%s,"result":{"protocolVersion":"2024-11-05","serverInfo":{"name":"fake","version":"0.1.0"},"capabilities":{"tools":{}}}}\n' "$id" ;;
    *'"method":"tools/list"'*)
      printf '{"jsonrpc":"2.0","id":%s,"result":{"tools":[{"name":"echo"},{"name":"add"}]}}\n' "$id" ;;
    *'"method":"ping"'*)
      printf '{"jsonrpc":"2.0","id":%s,"result":{}}\n' "$id" ;;
  esac
done
"#;

/// Draft of a provider running a shell loop that answers `initialize`,
/// `tools/list` and `ping`.
pub fn fake_mcp_server(name: &str) -> NewProvider {
    NewProvider::new(name, "sh")
        .with_args(["-c", FAKE_MCP_SERVER])
        .with_auto_start(false)
}

/// Draft of a provider running `sh -c <script>`.
pub fn shell_provider(name: &str, script: &str) -> NewProvider {
    NewProvider::new(name, "sh")
        .with_args(["-c", script])
        .with_auto_start(false)
}
