//! Runtime status and health probe result types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::provider::ProviderId;
use crate::ports::HandshakeReport;

/// Lifecycle state of a provider process.
///
/// ```text
/// stopped -> starting -> running -> stopping -> stopped
///               |           |           |
///               +---------> error <-----+
/// ```
///
/// `error` is retriable: a later start goes back through `starting`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderState {
    /// No process.
    #[default]
    Stopped,
    /// Spawn requested, liveness not yet confirmed.
    Starting,
    /// Process alive.
    Running,
    /// Termination requested, waiting for exit.
    Stopping,
    /// Last start or run failed. See `ProviderStatus::last_error`.
    Error,
}

impl ProviderState {
    /// Whether a process may exist in this state.
    pub const fn is_live(self) -> bool {
        matches!(self, Self::Starting | Self::Running | Self::Stopping)
    }

    /// Lowercase wire name.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Stopped => "stopped",
            Self::Starting => "starting",
            Self::Running => "running",
            Self::Stopping => "stopping",
            Self::Error => "error",
        }
    }
}

impl std::fmt::Display for ProviderState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Point-in-time view of a provider's runtime state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProviderStatus {
    /// Provider this status belongs to.
    pub provider_id: ProviderId,

    /// Current lifecycle state.
    pub status: ProviderState,

    /// OS process ID, present only while a process is alive.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub process_id: Option<u32>,

    /// Seconds since the transition into `running`, computed at read time.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub uptime: Option<u64>,

    /// Most recent start attempt, stop attempt, or probe.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_check: Option<DateTime<Utc>>,

    /// Last fatal error, cleared on a successful (re)start.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_error: Option<String>,
}

impl ProviderStatus {
    /// Status of a provider that has never been observed.
    pub const fn stopped(provider_id: ProviderId) -> Self {
        Self {
            provider_id,
            status: ProviderState::Stopped,
            process_id: None,
            uptime: None,
            last_check: None,
            last_error: None,
        }
    }
}

/// Aggregate counts over all providers.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProviderStats {
    pub total: usize,
    pub stopped: usize,
    pub starting: usize,
    pub running: usize,
    pub stopping: usize,
    pub error: usize,
    /// Mean uptime in seconds over running providers (0 when none run).
    pub average_uptime: f64,
}

impl ProviderStats {
    /// Summarize a set of statuses.
    #[allow(clippy::cast_precision_loss)]
    pub fn from_statuses(statuses: &[ProviderStatus]) -> Self {
        let mut stats = Self {
            total: statuses.len(),
            ..Self::default()
        };
        let mut uptime_sum = 0u64;

        for status in statuses {
            match status.status {
                ProviderState::Stopped => stats.stopped += 1,
                ProviderState::Starting => stats.starting += 1,
                ProviderState::Running => {
                    stats.running += 1;
                    uptime_sum += status.uptime.unwrap_or(0);
                }
                ProviderState::Stopping => stats.stopping += 1,
                ProviderState::Error => stats.error += 1,
            }
        }

        if stats.running > 0 {
            stats.average_uptime = uptime_sum as f64 / stats.running as f64;
        }
        stats
    }
}

/// Outcome of a health probe run.
///
/// Only the most recent result per provider is kept.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProviderTestResult {
    pub success: bool,

    /// Milliseconds spent probing.
    pub duration: u64,

    /// Failure reason, present only if `success` is false.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,

    /// Version reported by the provider during the handshake.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,

    /// Number of tools the provider exposes, when it answered `tools/list`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tool_count: Option<usize>,

    /// Tool names, in the order the provider listed them.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tools: Vec<String>,

    /// When the probe completed.
    pub tested_at: DateTime<Utc>,
}

impl ProviderTestResult {
    /// A successful probe.
    pub fn passed(duration: u64, report: HandshakeReport) -> Self {
        Self {
            success: true,
            duration,
            error: None,
            version: report.version,
            tool_count: Some(report.tools.len()),
            tools: report.tools,
            tested_at: Utc::now(),
        }
    }

    /// A failed probe.
    pub fn failed(duration: u64, error: impl Into<String>) -> Self {
        Self {
            success: false,
            duration,
            error: Some(error.into()),
            version: None,
            tool_count: None,
            tools: Vec::new(),
            tested_at: Utc::now(),
        }
    }
}
