//! Authoritative in-memory table of provider configurations.
//!
//! Every mutation persists through the repository first and only then
//! touches memory, under one write lock. A failing repository therefore
//! leaves the store exactly as it was.

use std::sync::Arc;

use mcpvisor_core::{
    ImportValidationError, NewProvider, ProviderConfig, ProviderError, ProviderId,
    ProviderRepository, ProviderSnapshot, UpdateProvider,
};
use tokio::sync::RwLock;
use tracing::debug;

/// Result of a committed import.
#[derive(Debug, Clone)]
pub struct ImportOutcome {
    /// Providers before the import, in their previous order.
    pub previous: Vec<ProviderConfig>,
    /// Providers after the import, in snapshot order.
    pub current: Vec<ProviderConfig>,
}

/// Provider configurations in insertion order.
pub struct ProviderStore {
    repository: Arc<dyn ProviderRepository>,
    providers: RwLock<Vec<ProviderConfig>>,
}

impl ProviderStore {
    pub fn new(repository: Arc<dyn ProviderRepository>) -> Self {
        Self {
            repository,
            providers: RwLock::new(Vec::new()),
        }
    }

    /// Replace memory with what the repository holds.
    pub async fn load(&self) -> Result<usize, ProviderError> {
        let mut providers = self.providers.write().await;
        *providers = self.repository.load_all().await?;
        Ok(providers.len())
    }

    /// Register a draft under a fresh ID.
    ///
    /// # Errors
    ///
    /// - `InvalidConfig` if the draft fails validation
    /// - `Duplicate` if an enabled provider has the same name and command
    /// - `Repository` if persistence fails
    pub async fn add(&self, draft: NewProvider) -> Result<ProviderConfig, ProviderError> {
        draft.validate().map_err(ProviderError::InvalidConfig)?;

        let mut providers = self.providers.write().await;
        if providers
            .iter()
            .any(|p| p.enabled && p.collides_with(&draft.name, &draft.command))
        {
            return Err(ProviderError::Duplicate {
                name: draft.name,
                command: draft.command,
            });
        }

        let config = ProviderConfig::from_draft(ProviderId::generate(), draft);
        self.repository.upsert(&config).await?;
        providers.push(config.clone());

        debug!(provider_id = %config.id, provider_name = %config.name, "Stored provider");
        Ok(config)
    }

    /// Merge a patch into an existing provider. The ID never changes.
    pub async fn update(
        &self,
        id: &ProviderId,
        patch: &UpdateProvider,
    ) -> Result<ProviderConfig, ProviderError> {
        let mut providers = self.providers.write().await;
        let index = providers
            .iter()
            .position(|p| &p.id == id)
            .ok_or_else(|| ProviderError::NotFound(id.clone()))?;

        let merged = patch.apply(&providers[index]);
        merged
            .to_draft()
            .validate()
            .map_err(ProviderError::InvalidConfig)?;
        if merged.enabled
            && providers.iter().any(|p| {
                &p.id != id && p.enabled && p.collides_with(&merged.name, &merged.command)
            })
        {
            return Err(ProviderError::Duplicate {
                name: merged.name,
                command: merged.command,
            });
        }

        self.repository.upsert(&merged).await?;
        providers[index] = merged.clone();
        Ok(merged)
    }

    /// Delete a provider. Process management is the caller's concern.
    pub async fn remove(&self, id: &ProviderId) -> Result<ProviderConfig, ProviderError> {
        let mut providers = self.providers.write().await;
        let index = providers
            .iter()
            .position(|p| &p.id == id)
            .ok_or_else(|| ProviderError::NotFound(id.clone()))?;

        self.repository.delete(id).await?;
        Ok(providers.remove(index))
    }

    pub async fn get(&self, id: &ProviderId) -> Option<ProviderConfig> {
        self.providers
            .read()
            .await
            .iter()
            .find(|p| &p.id == id)
            .cloned()
    }

    pub async fn contains(&self, id: &ProviderId) -> bool {
        self.providers.read().await.iter().any(|p| &p.id == id)
    }

    /// All providers in insertion order.
    pub async fn get_all(&self) -> Vec<ProviderConfig> {
        self.providers.read().await.clone()
    }

    /// Snapshot of all configurations, without runtime state.
    pub async fn export(&self) -> ProviderSnapshot {
        ProviderSnapshot::capture(&self.providers.read().await)
    }

    /// Replace the full set with the providers of a snapshot document.
    ///
    /// All-or-nothing: every entry is validated before anything is
    /// persisted, and memory is swapped only after the repository accepted
    /// the new set. An entry whose ID names an existing provider keeps that
    /// ID and its creation time; every other entry gets a fresh ID.
    pub async fn import(&self, json: &str) -> Result<ImportOutcome, ProviderError> {
        let entries = ProviderSnapshot::parse(json)?;

        let mut providers = self.providers.write().await;
        let mut imported: Vec<ProviderConfig> = Vec::with_capacity(entries.len());
        for (index, entry) in entries.into_iter().enumerate() {
            let existing = entry
                .id
                .as_ref()
                .and_then(|id| providers.iter().find(|p| &p.id == id));

            let config = match existing {
                Some(existing) => {
                    if imported.iter().any(|p| p.id == existing.id) {
                        return Err(ImportValidationError::entry(
                            index,
                            format!("duplicate id '{}'", existing.id),
                        )
                        .into());
                    }
                    let mut config =
                        ProviderConfig::from_draft(existing.id.clone(), entry.provider);
                    config.created_at = existing.created_at;
                    config
                }
                None => ProviderConfig::from_draft(ProviderId::generate(), entry.provider),
            };
            imported.push(config);
        }

        self.repository.replace_all(&imported).await?;
        let previous = std::mem::replace(&mut *providers, imported.clone());

        debug!(
            previous = previous.len(),
            current = imported.len(),
            "Imported provider snapshot"
        );
        Ok(ImportOutcome {
            previous,
            current: imported,
        })
    }
}
