//! Process management and orchestration of MCP providers.
//!
//! This crate implements the ports defined in `mcpvisor-core`:
//!
//! - `TokioProcessController` spawns providers as child processes and
//!   supervises them
//! - `McpHealthProbe` checks a provider by speaking the MCP handshake over
//!   its stdio
//! - `JsonFileRepository` persists configurations to a JSON document
//!
//! `ProviderManager` ties them together and publishes lifecycle events on
//! an `EventBus`.

#![deny(unsafe_code)]
#![deny(unused_crate_dependencies)]

pub mod bus;
pub mod client;
pub mod manager;
pub(crate) mod path;
pub mod probe;
pub mod process;
pub mod repository;
pub mod store;

#[cfg(any(test, feature = "test-utils"))]
pub mod testing;

// Re-export domain types from core for convenience
pub use mcpvisor_core::{
    ManagerSettings, NewProvider, ProviderConfig, ProviderError, ProviderEvent, ProviderId,
    ProviderSnapshot, ProviderState, ProviderStats, ProviderStatus, ProviderTestResult,
    UpdateProvider,
};

// Re-export this crate's public types
pub use bus::{EventBus, ListenerHandle, Subscription};
pub use client::{McpClient, McpClientError, PROTOCOL_VERSION};
pub use manager::{ProviderManager, ProviderManagerDeps, ProviderUpdate};
pub use probe::McpHealthProbe;
pub use process::TokioProcessController;
pub use repository::{InMemoryRepository, JsonFileRepository};
pub use store::{ImportOutcome, ProviderStore};
