//! Provider configuration types.
//!
//! These types are shared between the Rust backend and the admin console.

use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Category tag used when a draft does not name one.
pub const DEFAULT_PROVIDER_TYPE: &str = "custom";

fn default_provider_type() -> String {
    DEFAULT_PROVIDER_TYPE.to_string()
}

const fn default_true() -> bool {
    true
}

/// Opaque, never-reused identifier of a registered provider.
///
/// IDs are random UUIDs so a provider that is deleted and recreated with the
/// same name never inherits events or runtime state of its predecessor.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProviderId(String);

impl ProviderId {
    /// Generate a fresh identifier.
    #[must_use]
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    /// Borrow the identifier as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ProviderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ProviderId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for ProviderId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// A registered MCP provider: identity plus launch specification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProviderConfig {
    /// Assigned at registration, immutable.
    pub id: ProviderId,

    /// Human label. Unique by convention only.
    pub name: String,

    /// Category tag, usually the template family the provider came from.
    #[serde(rename = "type")]
    pub provider_type: String,

    /// Executable name or path.
    pub command: String,

    /// Positional arguments, passed in order.
    #[serde(default)]
    pub args: Vec<String>,

    /// Environment overrides merged over the manager's own environment.
    #[serde(default)]
    pub env: BTreeMap<String, String>,

    /// Start this provider when the manager initializes.
    pub auto_start: bool,

    /// Free text.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Disabled providers are never auto-started and skipped by bulk sweeps.
    pub enabled: bool,

    /// When the provider was registered.
    pub created_at: DateTime<Utc>,

    /// When the configuration last changed.
    pub updated_at: DateTime<Utc>,
}

impl ProviderConfig {
    /// Materialize a draft under the given identifier.
    pub fn from_draft(id: ProviderId, draft: NewProvider) -> Self {
        let now = Utc::now();
        Self {
            id,
            name: draft.name,
            provider_type: draft.provider_type,
            command: draft.command,
            args: draft.args,
            env: draft.env,
            auto_start: draft.auto_start,
            description: draft.description,
            enabled: draft.enabled,
            created_at: now,
            updated_at: now,
        }
    }

    /// Whether `other` would launch a different process than `self`.
    pub fn launch_spec_differs(&self, other: &Self) -> bool {
        self.command != other.command || self.args != other.args || self.env != other.env
    }

    /// Whether this provider collides with `other` under the duplicate rule
    /// (same name and same command).
    pub fn collides_with(&self, name: &str, command: &str) -> bool {
        self.name == name && self.command == command
    }

    /// Convert back into a draft, dropping identity and timestamps.
    pub fn to_draft(&self) -> NewProvider {
        NewProvider {
            name: self.name.clone(),
            provider_type: self.provider_type.clone(),
            command: self.command.clone(),
            args: self.args.clone(),
            env: self.env.clone(),
            auto_start: self.auto_start,
            description: self.description.clone(),
            enabled: self.enabled,
        }
    }
}

/// A provider to be registered (no ID yet).
///
/// After registration the store returns a `ProviderConfig` with the
/// assigned ID.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewProvider {
    /// Human label (required).
    pub name: String,

    /// Category tag.
    #[serde(rename = "type", default = "default_provider_type")]
    pub provider_type: String,

    /// Executable name or path (required).
    pub command: String,

    /// Positional arguments.
    #[serde(default)]
    pub args: Vec<String>,

    /// Environment overrides.
    #[serde(default)]
    pub env: BTreeMap<String, String>,

    /// Start automatically. Defaults to true.
    #[serde(default = "default_true")]
    pub auto_start: bool,

    /// Free text.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Defaults to true.
    #[serde(default = "default_true")]
    pub enabled: bool,
}

impl NewProvider {
    /// Create a draft with the required fields and defaults for the rest.
    pub fn new(name: impl Into<String>, command: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            provider_type: default_provider_type(),
            command: command.into(),
            args: Vec::new(),
            env: BTreeMap::new(),
            auto_start: true,
            description: None,
            enabled: true,
        }
    }

    /// Replace the argument list.
    #[must_use]
    pub fn with_args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args = args.into_iter().map(Into::into).collect();
        self
    }

    /// Add an environment variable.
    #[must_use]
    pub fn with_env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.insert(key.into(), value.into());
        self
    }

    /// Set the category tag.
    #[must_use]
    pub fn with_type(mut self, provider_type: impl Into<String>) -> Self {
        self.provider_type = provider_type.into();
        self
    }

    /// Set the description.
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Set auto-start.
    #[must_use]
    pub const fn with_auto_start(mut self, auto_start: bool) -> Self {
        self.auto_start = auto_start;
        self
    }

    /// Set enabled status.
    #[must_use]
    pub const fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    /// Validate the draft.
    ///
    /// Returns a human-readable reason for the first problem found.
    pub fn validate(&self) -> Result<(), String> {
        if self.name.trim().is_empty() {
            return Err("Provider name cannot be empty".to_string());
        }

        if self.command.trim().is_empty() {
            return Err("Provider command cannot be empty".to_string());
        }

        // Flags and arguments belong in `args`
        if self.command.contains(char::is_whitespace) {
            return Err(format!(
                "Command must be an executable name/path only (got '{}'). \
                 Put flags and arguments in 'args'.",
                self.command
            ));
        }

        if let Some(key) = self
            .env
            .keys()
            .find(|k| k.is_empty() || k.contains('=') || k.contains('\0'))
        {
            return Err(format!("Invalid environment variable name: '{key}'"));
        }

        Ok(())
    }
}

/// Partial update for an existing provider.
///
/// All fields are optional - only provided fields are updated. The ID can
/// never be changed. `description` uses `Option<Option<_>>` so callers can
/// clear it explicitly.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProvider {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub provider_type: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub command: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub args: Option<Vec<String>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub env: Option<BTreeMap<String, String>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub auto_start: Option<bool>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<Option<String>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enabled: Option<bool>,
}

impl UpdateProvider {
    /// Whether applying this patch to `current` changes what gets launched.
    pub fn changes_launch_spec(&self, current: &ProviderConfig) -> bool {
        self.command.as_ref().is_some_and(|c| *c != current.command)
            || self.args.as_ref().is_some_and(|a| *a != current.args)
            || self.env.as_ref().is_some_and(|e| *e != current.env)
    }

    /// Produce the merged configuration without touching `current`.
    pub fn apply(&self, current: &ProviderConfig) -> ProviderConfig {
        let mut merged = current.clone();
        if let Some(ref name) = self.name {
            merged.name.clone_from(name);
        }
        if let Some(ref provider_type) = self.provider_type {
            merged.provider_type.clone_from(provider_type);
        }
        if let Some(ref command) = self.command {
            merged.command.clone_from(command);
        }
        if let Some(ref args) = self.args {
            merged.args.clone_from(args);
        }
        if let Some(ref env) = self.env {
            merged.env.clone_from(env);
        }
        if let Some(auto_start) = self.auto_start {
            merged.auto_start = auto_start;
        }
        if let Some(ref description) = self.description {
            merged.description.clone_from(description);
        }
        if let Some(enabled) = self.enabled {
            merged.enabled = enabled;
        }
        merged.updated_at = Utc::now();
        merged
    }
}
