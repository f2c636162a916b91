//! Provider manager error types.
//!
//! `ProviderError` is returned synchronously by store and manager
//! operations. Asynchronous lifecycle failures (spawn, unexpected exit) are
//! never returned to a caller; they are recorded in status and published as
//! `ProviderErrorInfo` inside a `provider_error` event.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::RepositoryError;
use crate::domain::ProviderId;

/// Errors surfaced to callers of provider operations.
#[derive(Debug, Error)]
pub enum ProviderError {
    /// An enabled provider with the same name and command already exists.
    #[error("Provider '{name}' with command '{command}' already exists")]
    Duplicate { name: String, command: String },

    /// The operation referenced an unknown provider ID.
    #[error("Provider not found: {0}")]
    NotFound(ProviderId),

    /// Draft or patch failed validation.
    #[error("Invalid provider configuration: {0}")]
    InvalidConfig(String),

    /// Snapshot rejected; nothing was applied.
    #[error(transparent)]
    Import(#[from] ImportValidationError),

    /// Persistence collaborator failed; in-memory state is unchanged.
    #[error(transparent)]
    Repository(#[from] RepositoryError),

    /// The manager has been shut down.
    #[error("Provider manager is shutting down")]
    ShuttingDown,

    /// Internal error.
    #[error("Internal provider error: {0}")]
    Internal(String),
}

/// Malformed snapshot on import.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ImportValidationError {
    /// The document itself could not be understood.
    #[error("Invalid snapshot: {0}")]
    Format(String),

    /// One entry is malformed. `index` is zero-based.
    #[error("Invalid snapshot entry {index}: {reason}")]
    Entry { index: usize, reason: String },
}

impl ImportValidationError {
    /// Build an entry error.
    pub fn entry(index: usize, reason: impl Into<String>) -> Self {
        Self::Entry {
            index,
            reason: reason.into(),
        }
    }
}

/// User-safe error information carried by `provider_error` events.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProviderErrorInfo {
    /// Name of the provider at the time of the failure.
    pub provider_name: String,

    /// Human-readable cause, also stored as `lastError`.
    pub message: String,

    /// Error category for UI handling.
    pub category: ErrorCategory,
}

/// Categories of lifecycle errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCategory {
    /// The process could not be launched.
    Spawn,
    /// The process exited while it was expected to run.
    Exit,
    /// Termination failed or had to be forced.
    Stop,
    /// Configuration problem found at start time.
    Configuration,
    /// Anything else.
    Unknown,
}

impl ProviderErrorInfo {
    fn new(
        provider_name: impl Into<String>,
        message: impl Into<String>,
        category: ErrorCategory,
    ) -> Self {
        Self {
            provider_name: provider_name.into(),
            message: message.into(),
            category,
        }
    }

    /// Launch failure.
    pub fn spawn(provider_name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(provider_name, message, ErrorCategory::Spawn)
    }

    /// Unexpected exit.
    pub fn exit(provider_name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(provider_name, message, ErrorCategory::Exit)
    }

    /// Stop failure.
    pub fn stop(provider_name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(provider_name, message, ErrorCategory::Stop)
    }

    /// Configuration problem.
    pub fn configuration(provider_name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(provider_name, message, ErrorCategory::Configuration)
    }
}
