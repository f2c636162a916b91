//! CLI bootstrap, the composition root.
//!
//! Wires the JSON file repository, the provider store and the manager
//! together. Handlers receive a `CliContext` and never build
//! infrastructure themselves.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use mcpvisor_core::{
    ManagerSettings, ProviderRepository, SettingsUpdate, TemplateCatalog, validate_settings,
};
use mcpvisor_mcp::{JsonFileRepository, ProviderManager, ProviderStore};
use tracing::debug;

use crate::error::CliError;
use crate::parser::Cli;

/// File name of the provider store inside the data directory.
const STORE_FILE: &str = "providers.json";

/// Bootstrap configuration for the CLI.
#[derive(Debug, Clone)]
pub struct CliConfig {
    /// JSON file holding provider configurations.
    pub store_path: PathBuf,
    /// Manager tunables.
    pub settings: ManagerSettings,
}

impl CliConfig {
    /// Resolve configuration from parsed arguments (flags and environment).
    pub fn from_cli(cli: &Cli) -> Result<Self, CliError> {
        let store_path = match &cli.store {
            Some(path) => path.clone(),
            None => default_store_path()?,
        };

        let mut settings = ManagerSettings::with_defaults();
        settings.merge(&SettingsUpdate {
            stop_grace_ms: cli.stop_grace_ms,
            probe_timeout_ms: cli.probe_timeout_ms,
            ..SettingsUpdate::default()
        });
        validate_settings(&settings)?;

        Ok(Self {
            store_path,
            settings,
        })
    }
}

/// `<data dir>/mcpvisor/providers.json`.
pub fn default_store_path() -> Result<PathBuf, CliError> {
    dirs::data_dir()
        .map(|dir| dir.join("mcpvisor").join(STORE_FILE))
        .ok_or_else(|| {
            CliError::Config(
                "could not determine the data directory; pass --store or set MCPVISOR_STORE"
                    .to_string(),
            )
        })
}

/// Composed application context for CLI commands.
pub struct CliContext {
    store: ProviderStore,
    repository: Arc<dyn ProviderRepository>,
    settings: ManagerSettings,
    store_path: PathBuf,
    catalog: TemplateCatalog,
}

impl CliContext {
    /// Loaded provider configurations. Editing them never starts anything.
    pub const fn store(&self) -> &ProviderStore {
        &self.store
    }

    pub const fn catalog(&self) -> &TemplateCatalog {
        &self.catalog
    }

    pub fn store_path(&self) -> &Path {
        &self.store_path
    }

    pub const fn settings(&self) -> &ManagerSettings {
        &self.settings
    }

    /// A provider manager over the same store.
    ///
    /// Nothing is loaded or started; call `load` or `init` on it.
    pub fn manager(&self) -> ProviderManager {
        ProviderManager::with_defaults(Arc::clone(&self.repository), self.settings.clone())
    }
}

/// Bootstrap the CLI application.
pub async fn bootstrap(config: CliConfig) -> Result<CliContext, CliError> {
    let repository: Arc<dyn ProviderRepository> =
        Arc::new(JsonFileRepository::new(&config.store_path));
    let store = ProviderStore::new(Arc::clone(&repository));
    let count = store.load().await?;

    debug!(
        store = %config.store_path.display(),
        providers = count,
        "Loaded provider store"
    );

    Ok(CliContext {
        store,
        repository,
        settings: config.settings,
        store_path: config.store_path,
        catalog: TemplateCatalog::builtin(),
    })
}

#[cfg(test)]
mod tests {
    use clap::Parser;

    use super::*;

    #[test]
    fn test_config_from_flags() {
        let cli = Cli::parse_from([
            "mcpvisor",
            "--store",
            "/tmp/p.json",
            "--probe-timeout-ms",
            "2500",
            "list",
        ]);
        let config = CliConfig::from_cli(&cli).unwrap();
        assert_eq!(config.store_path, PathBuf::from("/tmp/p.json"));
        assert_eq!(config.settings.probe_timeout_ms, 2500);
        assert_eq!(
            config.settings.stop_grace_ms,
            mcpvisor_core::settings::DEFAULT_STOP_GRACE_MS
        );
    }

    #[test]
    fn test_zero_probe_timeout_is_config_error() {
        let cli = Cli::parse_from(["mcpvisor", "--store", "/tmp/p.json", "--probe-timeout-ms", "0"]);
        let err = CliConfig::from_cli(&cli).unwrap_err();
        assert_eq!(err.exit_code(), 78);
    }

    #[tokio::test]
    async fn test_bootstrap_with_missing_store() {
        let dir = tempfile::tempdir().unwrap();
        let config = CliConfig {
            store_path: dir.path().join("providers.json"),
            settings: ManagerSettings::with_defaults(),
        };

        let ctx = bootstrap(config).await.unwrap();
        assert!(ctx.store().get_all().await.is_empty());
        assert!(!ctx.store_path().exists());
    }
}
