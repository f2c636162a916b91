//! Command handlers.
//!
//! Handlers follow one pattern:
//! - Signature: `pub async fn execute(ctx: &CliContext, ...) -> Result<()>`
//! - Thin wrappers that resolve CLI input, call the store or the manager,
//!   and format output for the terminal

pub mod add;
pub mod list;
pub mod remove;
pub mod run;
pub mod templates;
pub mod toggle;
pub mod transfer;

use mcpvisor_core::ProviderConfig;
use mcpvisor_mcp::ProviderStore;

use crate::error::CliError;

/// Find a provider by ID, or by name when exactly one provider has it.
pub async fn resolve_provider(
    store: &ProviderStore,
    identifier: &str,
) -> Result<ProviderConfig, CliError> {
    let providers = store.get_all().await;
    if let Some(provider) = providers.iter().find(|p| p.id.as_str() == identifier) {
        return Ok(provider.clone());
    }

    let by_name: Vec<&ProviderConfig> = providers.iter().filter(|p| p.name == identifier).collect();
    match by_name.as_slice() {
        [provider] => Ok((*provider).clone()),
        [] => Err(CliError::NotFound(identifier.to_string())),
        many => Err(CliError::Arguments(format!(
            "'{identifier}' matches {} providers, use the ID instead",
            many.len()
        ))),
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use mcpvisor_core::NewProvider;
    use mcpvisor_mcp::InMemoryRepository;

    use super::*;

    #[test]
    fn test_resolve_by_id_or_unique_name() {
        tokio_test::block_on(async {
            let store = ProviderStore::new(Arc::new(InMemoryRepository::new()));
            let fs = store.add(NewProvider::new("fs", "mcp-fs")).await.unwrap();
            store.add(NewProvider::new("git", "mcp-git")).await.unwrap();
            store.add(NewProvider::new("git", "mcp-git2")).await.unwrap();

            assert_eq!(resolve_provider(&store, fs.id.as_str()).await.unwrap(), fs);
            assert_eq!(resolve_provider(&store, "fs").await.unwrap(), fs);
            assert!(matches!(
                resolve_provider(&store, "git").await,
                Err(CliError::Arguments(_))
            ));
            assert!(matches!(
                resolve_provider(&store, "nope").await,
                Err(CliError::NotFound(_))
            ));
        });
    }
}
