//! Provider repository implementations.
//!
//! - `InMemoryRepository` - ephemeral, for tests and throwaway managers
//! - `JsonFileRepository` - whole-file JSON document, written atomically

use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

use async_trait::async_trait;
use mcpvisor_core::{ProviderConfig, ProviderId, ProviderRepository, RepositoryError};
use serde::{Deserialize, Serialize};
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::debug;

/// Format version of the JSON store document.
const STORE_VERSION: u32 = 1;

/// Repository keeping providers in memory only.
#[derive(Debug, Default)]
pub struct InMemoryRepository {
    providers: Mutex<Vec<ProviderConfig>>,
}

impl InMemoryRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start with existing providers.
    pub fn with_providers(providers: Vec<ProviderConfig>) -> Self {
        Self {
            providers: Mutex::new(providers),
        }
    }

    /// Copy of everything currently stored.
    pub fn snapshot(&self) -> Vec<ProviderConfig> {
        self.providers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn with_lock<T>(&self, f: impl FnOnce(&mut Vec<ProviderConfig>) -> T) -> T {
        let mut providers = self.providers.lock().unwrap_or_else(PoisonError::into_inner);
        f(&mut providers)
    }
}

#[async_trait]
impl ProviderRepository for InMemoryRepository {
    async fn load_all(&self) -> Result<Vec<ProviderConfig>, RepositoryError> {
        Ok(self.snapshot())
    }

    async fn upsert(&self, provider: &ProviderConfig) -> Result<(), RepositoryError> {
        self.with_lock(|providers| upsert_into(providers, provider));
        Ok(())
    }

    async fn delete(&self, id: &ProviderId) -> Result<(), RepositoryError> {
        self.with_lock(|providers| providers.retain(|p| &p.id != id));
        Ok(())
    }

    async fn replace_all(&self, providers: &[ProviderConfig]) -> Result<(), RepositoryError> {
        self.with_lock(|stored| *stored = providers.to_vec());
        Ok(())
    }
}

fn upsert_into(providers: &mut Vec<ProviderConfig>, provider: &ProviderConfig) {
    match providers.iter_mut().find(|p| p.id == provider.id) {
        Some(existing) => existing.clone_from(provider),
        None => providers.push(provider.clone()),
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct StoreDocument {
    version: u32,
    #[serde(default)]
    providers: Vec<ProviderConfig>,
}

/// Repository persisting all providers to one JSON file.
///
/// Every write rewrites the whole document through a temp file and a
/// rename, so readers never see a partial file. The file and its parent
/// directory are created on first write; a missing file loads as empty.
#[derive(Debug)]
pub struct JsonFileRepository {
    path: PathBuf,
    write_lock: tokio::sync::Mutex<()>,
}

impl JsonFileRepository {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: tokio::sync::Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn read(&self) -> Result<Vec<ProviderConfig>, RepositoryError> {
        let contents = match fs::read_to_string(&self.path).await {
            Ok(contents) => contents,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };
        if contents.trim().is_empty() {
            return Ok(Vec::new());
        }

        let document: StoreDocument = serde_json::from_str(&contents)?;
        if document.version > STORE_VERSION {
            return Err(RepositoryError::Serialization(format!(
                "unsupported store version {} in {}",
                document.version,
                self.path.display()
            )));
        }
        Ok(document.providers)
    }

    async fn write(&self, providers: Vec<ProviderConfig>) -> Result<(), RepositoryError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).await?;
        }

        let document = StoreDocument {
            version: STORE_VERSION,
            providers,
        };
        let json = serde_json::to_string_pretty(&document)?;

        // Atomic write: temp file, then rename
        let temp_path = self.path.with_extension("json.tmp");
        {
            let mut file = fs::File::create(&temp_path).await?;
            file.write_all(json.as_bytes()).await?;
            file.sync_all().await?;
        }
        fs::rename(&temp_path, &self.path).await?;

        debug!(
            path = %self.path.display(),
            providers = document.providers.len(),
            "Wrote provider store"
        );
        Ok(())
    }
}

#[async_trait]
impl ProviderRepository for JsonFileRepository {
    async fn load_all(&self) -> Result<Vec<ProviderConfig>, RepositoryError> {
        self.read().await
    }

    async fn upsert(&self, provider: &ProviderConfig) -> Result<(), RepositoryError> {
        let _guard = self.write_lock.lock().await;
        let mut providers = self.read().await?;
        upsert_into(&mut providers, provider);
        self.write(providers).await
    }

    async fn delete(&self, id: &ProviderId) -> Result<(), RepositoryError> {
        let _guard = self.write_lock.lock().await;
        let mut providers = self.read().await?;
        providers.retain(|p| &p.id != id);
        self.write(providers).await
    }

    async fn replace_all(&self, providers: &[ProviderConfig]) -> Result<(), RepositoryError> {
        let _guard = self.write_lock.lock().await;
        self.write(providers.to_vec()).await
    }
}
