//! Provider manager settings and validation.
//!
//! Pure domain types with no infrastructure dependencies.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Default grace period between graceful and forced termination.
pub const DEFAULT_STOP_GRACE_MS: u64 = 5_000;

/// Default hard timeout for a health probe.
pub const DEFAULT_PROBE_TIMEOUT_MS: u64 = 10_000;

/// Default wait after spawning before a process is declared running.
pub const DEFAULT_STARTUP_CHECK_MS: u64 = 250;

/// Default broadcast buffer for lifecycle events.
pub const DEFAULT_EVENT_CAPACITY: usize = 256;

const MAX_STOP_GRACE_MS: u64 = 10 * 60 * 1_000;

/// Tunables of the provider manager.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct ManagerSettings {
    /// Milliseconds a process gets to exit after a graceful request.
    pub stop_grace_ms: u64,

    /// Milliseconds before a health probe reports `timeout`.
    pub probe_timeout_ms: u64,

    /// Milliseconds `start` waits after spawning to catch immediate exits.
    pub startup_check_ms: u64,

    /// Events buffered per subscriber before slow subscribers lag.
    pub event_capacity: usize,
}

impl ManagerSettings {
    /// Create settings with sensible defaults.
    #[must_use]
    pub const fn with_defaults() -> Self {
        Self {
            stop_grace_ms: DEFAULT_STOP_GRACE_MS,
            probe_timeout_ms: DEFAULT_PROBE_TIMEOUT_MS,
            startup_check_ms: DEFAULT_STARTUP_CHECK_MS,
            event_capacity: DEFAULT_EVENT_CAPACITY,
        }
    }

    pub const fn stop_grace(&self) -> Duration {
        Duration::from_millis(self.stop_grace_ms)
    }

    pub const fn probe_timeout(&self) -> Duration {
        Duration::from_millis(self.probe_timeout_ms)
    }

    pub const fn startup_check(&self) -> Duration {
        Duration::from_millis(self.startup_check_ms)
    }

    /// Merge a partial update, only touching fields that are set.
    pub fn merge(&mut self, update: &SettingsUpdate) {
        if let Some(ms) = update.stop_grace_ms {
            self.stop_grace_ms = ms;
        }
        if let Some(ms) = update.probe_timeout_ms {
            self.probe_timeout_ms = ms;
        }
        if let Some(ms) = update.startup_check_ms {
            self.startup_check_ms = ms;
        }
        if let Some(capacity) = update.event_capacity {
            self.event_capacity = capacity;
        }
    }
}

impl Default for ManagerSettings {
    fn default() -> Self {
        Self::with_defaults()
    }
}

/// Partial settings update. `None` leaves a field unchanged.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SettingsUpdate {
    pub stop_grace_ms: Option<u64>,
    pub probe_timeout_ms: Option<u64>,
    pub startup_check_ms: Option<u64>,
    pub event_capacity: Option<usize>,
}

/// Settings validation error.
#[derive(Debug, Clone, thiserror::Error)]
pub enum SettingsError {
    #[error("Probe timeout must be greater than zero")]
    ZeroProbeTimeout,

    #[error("Event capacity must be greater than zero")]
    ZeroEventCapacity,

    #[error("Stop grace period must be at most 600000 ms, got {0}")]
    StopGraceTooLong(u64),
}

/// Validate settings values.
pub const fn validate_settings(settings: &ManagerSettings) -> Result<(), SettingsError> {
    if settings.probe_timeout_ms == 0 {
        return Err(SettingsError::ZeroProbeTimeout);
    }

    if settings.event_capacity == 0 {
        return Err(SettingsError::ZeroEventCapacity);
    }

    if settings.stop_grace_ms > MAX_STOP_GRACE_MS {
        return Err(SettingsError::StopGraceTooLong(settings.stop_grace_ms));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_settings() {
        let settings = ManagerSettings::default();
        assert_eq!(settings.stop_grace(), Duration::from_secs(5));
        assert_eq!(settings.probe_timeout(), Duration::from_secs(10));
        assert!(validate_settings(&settings).is_ok());
    }

    #[test]
    fn test_partial_deserialization_uses_defaults() {
        let settings: ManagerSettings = serde_json::from_str(r#"{"stop_grace_ms":100}"#).unwrap();
        assert_eq!(settings.stop_grace_ms, 100);
        assert_eq!(settings.event_capacity, DEFAULT_EVENT_CAPACITY);
    }

    #[test]
    fn test_merge_only_touches_set_fields() {
        let mut settings = ManagerSettings::default();
        settings.merge(&SettingsUpdate {
            probe_timeout_ms: Some(500),
            ..Default::default()
        });
        assert_eq!(settings.probe_timeout_ms, 500);
        assert_eq!(settings.stop_grace_ms, DEFAULT_STOP_GRACE_MS);
    }

    #[test]
    fn test_validation_rejects_bad_values() {
        let zero_probe = ManagerSettings {
            probe_timeout_ms: 0,
            ..ManagerSettings::default()
        };
        assert!(matches!(
            validate_settings(&zero_probe),
            Err(SettingsError::ZeroProbeTimeout)
        ));

        let long_grace = ManagerSettings {
            stop_grace_ms: MAX_STOP_GRACE_MS + 1,
            ..ManagerSettings::default()
        };
        assert!(matches!(
            validate_settings(&long_grace),
            Err(SettingsError::StopGraceTooLong(_))
        ));
    }
}
