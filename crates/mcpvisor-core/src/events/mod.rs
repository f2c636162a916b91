//! Closed union of provider lifecycle events.
//!
//! Every transition of the provider state machine publishes exactly one
//! variant. Each variant carries the `providerId` plus a typed payload.
//!
//! # Wire Format
//!
//! Events are serialized with a `type` tag:
//!
//! ```json
//! { "type": "provider_started", "providerId": "6f1c...", "providerName": "fs-tools", "processId": 4242 }
//! ```

mod provider;

use serde::{Deserialize, Serialize};

use crate::domain::{ProviderId, ProviderTestResult};
use crate::ports::ProviderErrorInfo;

pub use provider::ProviderSummary;

/// Provider lifecycle events.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ProviderEvent {
    /// A provider was registered.
    ProviderAdded {
        #[serde(rename = "providerId")]
        provider_id: ProviderId,
        provider: ProviderSummary,
    },

    /// A provider's configuration changed.
    ProviderUpdated {
        #[serde(rename = "providerId")]
        provider_id: ProviderId,
        provider: ProviderSummary,
        /// The launch spec changed while a process was live; the running
        /// process keeps the old spec until the next start.
        #[serde(rename = "restartRequired")]
        restart_required: bool,
    },

    /// A provider was deleted, after its process (if any) stopped.
    ProviderRemoved {
        #[serde(rename = "providerId")]
        provider_id: ProviderId,
    },

    /// A provider process is running.
    ProviderStarted {
        #[serde(rename = "providerId")]
        provider_id: ProviderId,
        #[serde(rename = "providerName")]
        provider_name: String,
        #[serde(rename = "processId")]
        process_id: u32,
    },

    /// A provider process stopped on request.
    ProviderStopped {
        #[serde(rename = "providerId")]
        provider_id: ProviderId,
        #[serde(rename = "providerName")]
        provider_name: String,
        /// The grace period elapsed and the process was killed.
        forced: bool,
    },

    /// A start failed or a running process exited unexpectedly.
    ProviderError {
        #[serde(rename = "providerId")]
        provider_id: ProviderId,
        error: ProviderErrorInfo,
    },

    /// A health probe finished.
    ProviderTestCompleted {
        #[serde(rename = "providerId")]
        provider_id: ProviderId,
        result: ProviderTestResult,
    },
}

impl ProviderEvent {
    /// Provider the event concerns.
    pub const fn provider_id(&self) -> &ProviderId {
        match self {
            Self::ProviderAdded { provider_id, .. }
            | Self::ProviderUpdated { provider_id, .. }
            | Self::ProviderRemoved { provider_id }
            | Self::ProviderStarted { provider_id, .. }
            | Self::ProviderStopped { provider_id, .. }
            | Self::ProviderError { provider_id, .. }
            | Self::ProviderTestCompleted { provider_id, .. } => provider_id,
        }
    }

    /// Get the event name for routing.
    pub const fn event_name(&self) -> &'static str {
        match self {
            Self::ProviderAdded { .. } => "provider:added",
            Self::ProviderUpdated { .. } => "provider:updated",
            Self::ProviderRemoved { .. } => "provider:removed",
            Self::ProviderStarted { .. } => "provider:started",
            Self::ProviderStopped { .. } => "provider:stopped",
            Self::ProviderError { .. } => "provider:error",
            Self::ProviderTestCompleted { .. } => "provider:test_completed",
        }
    }
}
