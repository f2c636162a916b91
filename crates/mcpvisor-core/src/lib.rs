//! Core domain types and port definitions for mcpvisor.
//!
//! This crate holds everything about MCP providers that is independent of
//! how processes are spawned or where configuration is persisted:
//!
//! - `domain` - provider configurations, runtime status, test results, templates
//! - `events` - the closed union of lifecycle events
//! - `ports` - traits implemented by adapters (repository, process controller,
//!   health probe, event emitter) and the error types crossing them
//! - `settings` - tunables for the provider manager

#![deny(unused_crate_dependencies)]

pub mod domain;
pub mod events;
pub mod ports;
pub mod settings;

// Re-export commonly used types for convenience
pub use domain::{
    DEFAULT_PROVIDER_TYPE, NewProvider, ProviderConfig, ProviderId, ProviderSnapshot,
    ProviderState, ProviderStats, ProviderStatus, ProviderTestResult, SNAPSHOT_VERSION,
    SnapshotEntry, Template, TemplateCatalog, TemplateEnvVar, UpdateProvider,
};
pub use events::{ProviderEvent, ProviderSummary};
pub use ports::{
    ErrorCategory, EventEmitter, HandshakeReport, HealthProbe, ImportValidationError, ProbeFailure,
    ProcessController, ProcessError, ProcessExit, ProcessHandle, ProviderChannel, ProviderError,
    ProviderErrorInfo, ProviderRepository, RepositoryError, StopOutcome, Termination,
};
pub use settings::{ManagerSettings, SettingsError, SettingsUpdate, validate_settings};
