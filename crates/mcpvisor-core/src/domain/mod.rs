//! MCP provider domain types.
//!
//! These types represent MCP providers in the system, independent of any
//! infrastructure concerns (persistence, process management, etc.).
//!
//! # Design
//!
//! - `ProviderConfig` - A registered provider with an assigned ID
//! - `NewProvider` - A provider draft to be registered (no ID yet)
//! - `UpdateProvider` - Partial update applied to an existing provider
//! - `ProviderState` / `ProviderStatus` - Runtime state, one per provider
//! - `ProviderTestResult` - Outcome of a health probe
//! - `ProviderSnapshot` - Export/import document
//! - `Template` / `TemplateCatalog` - Read-only presets for new providers

mod provider;
mod snapshot;
mod status;
mod template;

pub use provider::{DEFAULT_PROVIDER_TYPE, NewProvider, ProviderConfig, ProviderId, UpdateProvider};
pub use snapshot::{ProviderSnapshot, SNAPSHOT_VERSION, SnapshotEntry};
pub use status::{ProviderState, ProviderStats, ProviderStatus, ProviderTestResult};
pub use template::{Template, TemplateCatalog, TemplateEnvVar};
