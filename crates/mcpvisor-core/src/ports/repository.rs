//! Persistence port for provider configurations.

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::{ProviderConfig, ProviderId};

/// Failures of the persistence collaborator.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// Underlying storage could not be read or written.
    #[error("Storage I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Stored data could not be encoded or decoded.
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Any other backend failure.
    #[error("Storage error: {0}")]
    Internal(String),
}

impl From<serde_json::Error> for RepositoryError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

/// Durable storage for provider configurations.
///
/// The store is the owner of in-memory state; a repository only has to
/// complete or fail. Every write is whole-record: `upsert` replaces the
/// provider with the same ID, `replace_all` swaps the entire set.
///
/// # Errors
///
/// All methods return `RepositoryError` on backend failure. A failed call
/// must leave previously persisted data readable.
#[async_trait]
pub trait ProviderRepository: Send + Sync {
    /// Load every stored provider in insertion order.
    async fn load_all(&self) -> Result<Vec<ProviderConfig>, RepositoryError>;

    /// Insert or replace one provider.
    async fn upsert(&self, provider: &ProviderConfig) -> Result<(), RepositoryError>;

    /// Delete a provider. Deleting an unknown ID is not an error.
    async fn delete(&self, id: &ProviderId) -> Result<(), RepositoryError>;

    /// Replace the full set in one step.
    async fn replace_all(&self, providers: &[ProviderConfig]) -> Result<(), RepositoryError>;
}
