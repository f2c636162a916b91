//! Constructors and payload types for provider events.

use serde::{Deserialize, Serialize};

use super::ProviderEvent;
use crate::domain::{ProviderConfig, ProviderId, ProviderTestResult};
use crate::ports::ProviderErrorInfo;

/// Lightweight provider description for event payloads.
///
/// Environment values are deliberately absent; they may hold credentials.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProviderSummary {
    pub name: String,
    #[serde(rename = "type")]
    pub provider_type: String,
    pub command: String,
    pub args: Vec<String>,
    pub auto_start: bool,
    pub enabled: bool,
}

impl From<&ProviderConfig> for ProviderSummary {
    fn from(config: &ProviderConfig) -> Self {
        Self {
            name: config.name.clone(),
            provider_type: config.provider_type.clone(),
            command: config.command.clone(),
            args: config.args.clone(),
            auto_start: config.auto_start,
            enabled: config.enabled,
        }
    }
}

impl ProviderEvent {
    /// Create a provider added event.
    pub fn added(config: &ProviderConfig) -> Self {
        Self::ProviderAdded {
            provider_id: config.id.clone(),
            provider: config.into(),
        }
    }

    /// Create a provider updated event.
    pub fn updated(config: &ProviderConfig, restart_required: bool) -> Self {
        Self::ProviderUpdated {
            provider_id: config.id.clone(),
            provider: config.into(),
            restart_required,
        }
    }

    /// Create a provider removed event.
    pub const fn removed(provider_id: ProviderId) -> Self {
        Self::ProviderRemoved { provider_id }
    }

    /// Create a provider started event.
    pub fn started(provider_id: ProviderId, provider_name: impl Into<String>, process_id: u32) -> Self {
        Self::ProviderStarted {
            provider_id,
            provider_name: provider_name.into(),
            process_id,
        }
    }

    /// Create a provider stopped event.
    pub fn stopped(provider_id: ProviderId, provider_name: impl Into<String>, forced: bool) -> Self {
        Self::ProviderStopped {
            provider_id,
            provider_name: provider_name.into(),
            forced,
        }
    }

    /// Create a provider error event.
    pub const fn error(provider_id: ProviderId, error: ProviderErrorInfo) -> Self {
        Self::ProviderError { provider_id, error }
    }

    /// Create a test completed event.
    pub const fn test_completed(provider_id: ProviderId, result: ProviderTestResult) -> Self {
        Self::ProviderTestCompleted {
            provider_id,
            result,
        }
    }
}
