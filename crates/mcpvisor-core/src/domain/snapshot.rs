//! Export/import document for provider configurations.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::provider::{NewProvider, ProviderConfig, ProviderId};
use crate::ports::ImportValidationError;

/// Current snapshot format version.
pub const SNAPSHOT_VERSION: u32 = 1;

/// A serialized set of provider configurations, without runtime status.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProviderSnapshot {
    pub version: u32,
    pub exported_at: DateTime<Utc>,
    pub providers: Vec<SnapshotEntry>,
}

/// One provider inside a snapshot.
///
/// The ID is informational: on import it is honored only when it names a
/// provider that currently exists.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SnapshotEntry {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<ProviderId>,

    #[serde(flatten)]
    pub provider: NewProvider,
}

impl ProviderSnapshot {
    /// Capture the given configurations in order.
    pub fn capture(providers: &[ProviderConfig]) -> Self {
        Self {
            version: SNAPSHOT_VERSION,
            exported_at: Utc::now(),
            providers: providers
                .iter()
                .map(|p| SnapshotEntry {
                    id: Some(p.id.clone()),
                    provider: p.to_draft(),
                })
                .collect(),
        }
    }

    /// Serialize to pretty JSON.
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }

    /// Parse and validate every entry of a snapshot document.
    ///
    /// Accepts either a full snapshot object or a bare array of entries.
    /// Validation is all-or-nothing: the first malformed entry rejects the
    /// whole document and reports its zero-based index.
    pub fn parse(json: &str) -> Result<Vec<SnapshotEntry>, ImportValidationError> {
        let document: Value = serde_json::from_str(json)
            .map_err(|e| ImportValidationError::Format(e.to_string()))?;

        let raw_entries = match document {
            Value::Array(entries) => entries,
            Value::Object(mut map) => {
                if let Some(version) = map.get("version").and_then(Value::as_u64) {
                    if version > u64::from(SNAPSHOT_VERSION) {
                        return Err(ImportValidationError::Format(format!(
                            "unsupported snapshot version {version}"
                        )));
                    }
                }
                match map.remove("providers") {
                    Some(Value::Array(entries)) => entries,
                    _ => {
                        return Err(ImportValidationError::Format(
                            "missing 'providers' array".to_string(),
                        ));
                    }
                }
            }
            _ => {
                return Err(ImportValidationError::Format(
                    "expected an object or an array".to_string(),
                ));
            }
        };

        let mut entries: Vec<SnapshotEntry> = Vec::with_capacity(raw_entries.len());
        for (index, raw) in raw_entries.into_iter().enumerate() {
            let entry: SnapshotEntry = serde_json::from_value(raw)
                .map_err(|e| ImportValidationError::entry(index, e.to_string()))?;

            entry
                .provider
                .validate()
                .map_err(|reason| ImportValidationError::entry(index, reason))?;

            if let Some(ref id) = entry.id {
                if entries.iter().any(|e| e.id.as_ref() == Some(id)) {
                    return Err(ImportValidationError::entry(
                        index,
                        format!("duplicate id '{id}'"),
                    ));
                }
            }

            if entry.provider.enabled {
                if let Some(other) = entries.iter().position(|e| {
                    e.provider.enabled
                        && e.provider.name == entry.provider.name
                        && e.provider.command == entry.provider.command
                }) {
                    return Err(ImportValidationError::entry(
                        index,
                        format!("duplicates entry {other} (same name and command)"),
                    ));
                }
            }

            entries.push(entry);
        }

        Ok(entries)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn provider(name: &str, command: &str) -> ProviderConfig {
        ProviderConfig::from_draft(
            ProviderId::generate(),
            NewProvider::new(name, command).with_env("TOKEN", "abc"),
        )
    }

    #[test]
    fn test_capture_then_parse_preserves_fields() {
        let providers = vec![provider("fs", "mcp-fs"), provider("git", "mcp-git")];
        let json = ProviderSnapshot::capture(&providers).to_json().unwrap();

        let entries = ProviderSnapshot::parse(&json).unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].id.as_ref(), Some(&providers[0].id));
        assert_eq!(entries[1].provider, providers[1].to_draft());
    }

    #[test]
    fn test_parse_accepts_bare_array() {
        let json = r#"[{"name":"fs","command":"mcp-fs","args":["--port","9000"]}]"#;
        let entries = ProviderSnapshot::parse(json).unwrap();
        assert_eq!(entries.len(), 1);
        assert!(entries[0].id.is_none());
        assert!(entries[0].provider.auto_start);
    }

    #[test]
    fn test_parse_reports_index_of_malformed_entry() {
        let json = r#"{"version":1,"providers":[
            {"name":"a","command":"a"},
            {"name":"b","command":"b"},
            {"name":"c","args":"not-a-list"},
            {"name":"d","command":"d"},
            {"name":"e","command":"e"}
        ]}"#;

        let err = ProviderSnapshot::parse(json).unwrap_err();
        assert!(matches!(err, ImportValidationError::Entry { index: 2, .. }));
    }

    #[test]
    fn test_parse_rejects_invalid_command() {
        let json = r#"[{"name":"a","command":"npx -y thing"}]"#;
        let err = ProviderSnapshot::parse(json).unwrap_err();
        assert!(matches!(err, ImportValidationError::Entry { index: 0, .. }));
    }

    #[test]
    fn test_parse_rejects_duplicate_enabled_entries() {
        let json = r#"[{"name":"a","command":"x"},{"name":"a","command":"x"}]"#;
        let err = ProviderSnapshot::parse(json).unwrap_err();
        assert!(matches!(err, ImportValidationError::Entry { index: 1, .. }));

        let disabled = r#"[{"name":"a","command":"x"},{"name":"a","command":"x","enabled":false}]"#;
        assert!(ProviderSnapshot::parse(disabled).is_ok());
    }

    #[test]
    fn test_parse_rejects_garbage_and_future_versions() {
        assert!(matches!(
            ProviderSnapshot::parse("not json"),
            Err(ImportValidationError::Format(_))
        ));
        assert!(matches!(
            ProviderSnapshot::parse(r#"{"version":99,"providers":[]}"#),
            Err(ImportValidationError::Format(_))
        ));
        assert!(matches!(
            ProviderSnapshot::parse(r#"{"version":1}"#),
            Err(ImportValidationError::Format(_))
        ));
    }
}
