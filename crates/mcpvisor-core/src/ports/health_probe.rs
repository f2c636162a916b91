//! Health probe port.
//!
//! A probe is bounded and read-only: it never changes the run state of the
//! provider it tests. Ordinary failures (unreachable, non-responsive, bad
//! handshake) come back as a failed `ProviderTestResult`; only contract
//! violations such as an unusable configuration are returned as errors.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::{ProcessHandle, ProviderError};
use crate::domain::{ProviderConfig, ProviderTestResult};

/// What a provider reported about itself during a handshake.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HandshakeReport {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub server_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub protocol_version: Option<String>,
    /// Tool names, empty when the provider exposes none.
    #[serde(default)]
    pub tools: Vec<String>,
}

/// Why a probe did not succeed.
///
/// Rendered into `ProviderTestResult::error`, never propagated.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProbeFailure {
    /// The probe ran out of time.
    #[error("timeout")]
    Timeout,

    /// The process exited before or during the probe.
    #[error("process exited: {0}")]
    Exited(String),

    /// The provider answered, but not with a valid handshake.
    #[error("handshake failed: {0}")]
    Handshake(String),

    /// A transient probe process could not be launched.
    #[error("failed to launch: {0}")]
    Spawn(String),
}

/// Conversation channel to a running provider.
///
/// Attached to a `ProcessHandle` by controllers that keep the provider's
/// stdio open. Calling `handshake` more than once is allowed.
#[async_trait]
pub trait ProviderChannel: Send + Sync {
    /// Perform (or repeat) the protocol handshake and list tools.
    async fn handshake(&self) -> Result<HandshakeReport, ProbeFailure>;
}

/// Bounded, side-effect-free connectivity check.
#[async_trait]
pub trait HealthProbe: Send + Sync {
    /// Probe a provider.
    ///
    /// With `running` set, the live instance is probed. Without it the
    /// implementation may launch a transient process, which must be cleaned
    /// up before returning, including on timeout.
    ///
    /// # Errors
    ///
    /// `ProviderError::InvalidConfig` if the configuration cannot be probed
    /// at all. Everything else is a failed result.
    async fn test(
        &self,
        config: &ProviderConfig,
        running: Option<&ProcessHandle>,
    ) -> Result<ProviderTestResult, ProviderError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_timeout_renders_as_plain_word() {
        assert_eq!(ProbeFailure::Timeout.to_string(), "timeout");
    }

    #[test]
    fn test_failures_render_cause() {
        let failure = ProbeFailure::Exited("exit code 1".to_string());
        assert_eq!(failure.to_string(), "process exited: exit code 1");
    }
}
