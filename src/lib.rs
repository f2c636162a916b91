//! # mcpvisor
//!
//! Lifecycle manager for MCP provider processes.
//!
//! This package re-exports the workspace crates so applications can depend
//! on one name:
//!
//! - [`mcpvisor_core`] - domain types, events, ports and settings
//! - [`mcpvisor_mcp`] - process controller, MCP health probe, repositories,
//!   event bus and the `ProviderManager`
//!
//! ```rust,no_run
//! use std::sync::Arc;
//!
//! use mcpvisor::{JsonFileRepository, ManagerSettings, NewProvider, ProviderManager};
//!
//! # async fn demo() -> Result<(), mcpvisor::ProviderError> {
//! let repository = Arc::new(JsonFileRepository::new("providers.json"));
//! let manager = ProviderManager::with_defaults(repository, ManagerSettings::default());
//! manager.init().await?;
//!
//! let fs = manager
//!     .add_provider(NewProvider::new("fs-tools", "mcp-server-filesystem").with_args(["/tmp"]))
//!     .await?;
//! let result = manager.test_provider(&fs.id).await?;
//! println!("healthy: {}", result.success);
//!
//! manager.shutdown().await;
//! # Ok(())
//! # }
//! ```

pub use mcpvisor_core;
pub use mcpvisor_mcp;

pub use mcpvisor_core::{
    ErrorCategory, EventEmitter, HealthProbe, ImportValidationError, ManagerSettings, NewProvider,
    ProcessController, ProviderConfig, ProviderError, ProviderErrorInfo, ProviderEvent, ProviderId,
    ProviderRepository, ProviderSnapshot, ProviderState, ProviderStats, ProviderStatus,
    ProviderTestResult, Template, TemplateCatalog, UpdateProvider,
};
pub use mcpvisor_mcp::{
    EventBus, InMemoryRepository, JsonFileRepository, ListenerHandle, McpHealthProbe,
    ProviderManager, ProviderManagerDeps, ProviderUpdate, Subscription, TokioProcessController,
};
