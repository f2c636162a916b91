//! MCP handshake health probe.
//!
//! A running provider is probed over the channel attached to its handle.
//! Without a handle, a transient process is launched through the same
//! controller, probed and stopped again. The transient process is never
//! registered anywhere, and dropping its handle kills it, so it cannot
//! outlive the probe even when the probe itself is cancelled.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use mcpvisor_core::{
    HandshakeReport, HealthProbe, ProbeFailure, ProcessController, ProcessHandle, ProviderConfig,
    ProviderError, ProviderTestResult,
};
use tokio::time::{Instant, timeout_at};
use tracing::debug;

/// Grace given to a transient probe process before it is killed.
pub(crate) const TRANSIENT_STOP_GRACE: Duration = Duration::from_millis(500);

/// Health probe speaking the MCP handshake.
pub struct McpHealthProbe {
    controller: Arc<dyn ProcessController>,
    timeout: Duration,
}

impl McpHealthProbe {
    /// `timeout` bounds the whole probe, including a transient launch.
    pub fn new(controller: Arc<dyn ProcessController>, timeout: Duration) -> Self {
        Self {
            controller,
            timeout,
        }
    }

    async fn probe_handle(handle: &ProcessHandle) -> Result<HandshakeReport, ProbeFailure> {
        if let Some(exit) = handle.exit_status() {
            return Err(ProbeFailure::Exited(exit.to_string()));
        }
        let Some(channel) = handle.channel() else {
            return Err(ProbeFailure::Handshake(
                "process has no stdio channel".to_string(),
            ));
        };

        tokio::select! {
            result = channel.handshake() => result,
            exit = handle.wait() => Err(ProbeFailure::Exited(exit.to_string())),
        }
    }

    async fn probe_transient(
        &self,
        config: &ProviderConfig,
        deadline: Instant,
    ) -> Result<HandshakeReport, ProbeFailure> {
        let handle = match timeout_at(deadline, self.controller.start(config)).await {
            Ok(Ok(handle)) => handle,
            Ok(Err(e)) => return Err(ProbeFailure::Spawn(e.to_string())),
            Err(_) => return Err(ProbeFailure::Timeout),
        };
        debug!(
            provider_id = %config.id,
            pid = handle.pid(),
            "Launched transient probe process"
        );

        let outcome = timeout_at(deadline, Self::probe_handle(&handle))
            .await
            .unwrap_or(Err(ProbeFailure::Timeout));

        self.controller.stop(&handle, TRANSIENT_STOP_GRACE).await;
        outcome
    }
}

#[async_trait]
impl HealthProbe for McpHealthProbe {
    async fn test(
        &self,
        config: &ProviderConfig,
        running: Option<&ProcessHandle>,
    ) -> Result<ProviderTestResult, ProviderError> {
        if config.command.trim().is_empty() {
            return Err(ProviderError::InvalidConfig(
                "cannot probe a provider without a command".to_string(),
            ));
        }

        let started = Instant::now();
        let deadline = started + self.timeout;
        let outcome = match running {
            Some(handle) => timeout_at(deadline, Self::probe_handle(handle))
                .await
                .unwrap_or(Err(ProbeFailure::Timeout)),
            None => self.probe_transient(config, deadline).await,
        };
        let duration = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);

        debug!(
            provider_id = %config.id,
            live = running.is_some(),
            duration_ms = duration,
            success = outcome.is_ok(),
            "Health probe finished"
        );

        Ok(match outcome {
            Ok(report) => ProviderTestResult::passed(duration, report),
            Err(failure) => ProviderTestResult::failed(duration, failure.to_string()),
        })
    }
}
