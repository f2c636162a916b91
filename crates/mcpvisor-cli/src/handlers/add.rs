//! Add and add-template command handlers.

use std::collections::BTreeMap;

use anyhow::Result;
use mcpvisor_core::NewProvider;

use crate::bootstrap::CliContext;
use crate::error::CliError;
use crate::presentation::command_line;

/// Arguments of `mcpvisor add`.
pub struct AddArgs {
    pub name: String,
    pub command: String,
    pub args: Vec<String>,
    pub env: Vec<(String, String)>,
    pub provider_type: Option<String>,
    pub description: Option<String>,
    pub auto_start: bool,
}

impl AddArgs {
    fn into_draft(self) -> NewProvider {
        let mut draft = NewProvider::new(self.name, self.command)
            .with_args(self.args)
            .with_auto_start(self.auto_start);
        draft.env.extend(self.env);
        if let Some(provider_type) = self.provider_type {
            draft = draft.with_type(provider_type);
        }
        if let Some(description) = self.description {
            draft = draft.with_description(description);
        }
        draft
    }
}

/// Register a provider.
pub async fn execute(ctx: &CliContext, args: AddArgs) -> Result<()> {
    register(ctx, args.into_draft()).await
}

/// Register a provider from a built-in template.
pub async fn from_template(
    ctx: &CliContext,
    template_id: &str,
    name: Option<String>,
    extra_args: Vec<String>,
    env: Vec<(String, String)>,
) -> Result<()> {
    let template = ctx.catalog().get(template_id).ok_or_else(|| {
        CliError::Arguments(format!(
            "Unknown template '{template_id}'. Run 'mcpvisor templates' to list them."
        ))
    })?;

    let values: BTreeMap<String, String> = env.into_iter().collect();
    let mut draft = template.to_draft(&values).map_err(CliError::Arguments)?;
    if let Some(name) = name {
        draft.name = name;
    }
    draft.args.extend(extra_args);

    register(ctx, draft).await
}

async fn register(ctx: &CliContext, draft: NewProvider) -> Result<()> {
    let provider = ctx.store().add(draft).await.map_err(CliError::from)?;

    println!("Added provider '{}'", provider.name);
    println!("  ID:      {}", provider.id);
    println!("  Command: {}", command_line(&provider));
    if provider.auto_start {
        println!("  Starts automatically with 'mcpvisor run'");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_into_draft_keeps_everything() {
        let draft = AddArgs {
            name: "fs".to_string(),
            command: "npx".to_string(),
            args: vec!["-y".to_string(), "server".to_string()],
            env: vec![("TOKEN".to_string(), "abc".to_string())],
            provider_type: Some("filesystem".to_string()),
            description: None,
            auto_start: false,
        }
        .into_draft();

        assert_eq!(draft.args, ["-y", "server"]);
        assert_eq!(draft.env.get("TOKEN").map(String::as_str), Some("abc"));
        assert_eq!(draft.provider_type, "filesystem");
        assert!(!draft.auto_start);
        assert!(draft.enabled);
    }
}
