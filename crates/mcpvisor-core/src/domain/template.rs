//! Read-only catalog of provider presets.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::provider::NewProvider;

/// An environment variable a template expects.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TemplateEnvVar {
    pub name: String,
    pub required: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl TemplateEnvVar {
    fn required(name: &str, description: &str) -> Self {
        Self {
            name: name.to_string(),
            required: true,
            description: Some(description.to_string()),
        }
    }
}

/// A named preset used to pre-fill a new provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Template {
    pub id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub provider_type: String,
    pub category: String,
    pub description: String,
    pub command: String,
    pub args: Vec<String>,
    pub env_vars: Vec<TemplateEnvVar>,
    pub auto_start: bool,
}

impl Template {
    /// Copy this template into a new provider draft.
    ///
    /// `values` supplies environment variable values. Every required
    /// variable must be present and non-empty; optional ones are copied when
    /// given. Extra values are passed through unchanged. The draft keeps no
    /// link to the template.
    pub fn to_draft(&self, values: &BTreeMap<String, String>) -> Result<NewProvider, String> {
        if let Some(missing) = self.env_vars.iter().find(|var| {
            var.required && values.get(&var.name).is_none_or(|v| v.trim().is_empty())
        }) {
            return Err(format!(
                "Template '{}' requires environment variable {}",
                self.id, missing.name
            ));
        }

        let mut draft = NewProvider::new(self.name.clone(), self.command.clone())
            .with_type(self.provider_type.clone())
            .with_args(self.args.iter().cloned())
            .with_description(self.description.clone())
            .with_auto_start(self.auto_start);
        for (key, value) in values {
            draft = draft.with_env(key.clone(), value.clone());
        }
        Ok(draft)
    }
}

/// Collection of templates, in presentation order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TemplateCatalog {
    templates: Vec<Template>,
}

impl TemplateCatalog {
    /// Build a catalog from explicit templates.
    pub const fn new(templates: Vec<Template>) -> Self {
        Self { templates }
    }

    /// The presets shipped with mcpvisor.
    #[must_use]
    pub fn builtin() -> Self {
        Self::new(vec![
            preset(
                "filesystem",
                "Filesystem",
                "files",
                "Read, write and search files under an allowed directory",
                "npx",
                &["-y", "@modelcontextprotocol/server-filesystem", "."],
                vec![],
            ),
            preset(
                "git",
                "Git",
                "development",
                "Inspect and manipulate a local git repository",
                "uvx",
                &["mcp-server-git"],
                vec![],
            ),
            preset(
                "github",
                "GitHub",
                "development",
                "Issues, pull requests and repository contents via the GitHub API",
                "npx",
                &["-y", "@modelcontextprotocol/server-github"],
                vec![TemplateEnvVar::required(
                    "GITHUB_PERSONAL_ACCESS_TOKEN",
                    "Token with repo scope",
                )],
            ),
            preset(
                "fetch",
                "Fetch",
                "web",
                "Fetch URLs and convert pages to markdown",
                "uvx",
                &["mcp-server-fetch"],
                vec![],
            ),
            preset(
                "brave-search",
                "Brave Search",
                "web",
                "Web and local search through the Brave Search API",
                "npx",
                &["-y", "@modelcontextprotocol/server-brave-search"],
                vec![TemplateEnvVar::required("BRAVE_API_KEY", "Brave Search API key")],
            ),
            preset(
                "memory",
                "Memory",
                "knowledge",
                "Knowledge-graph based persistent memory",
                "npx",
                &["-y", "@modelcontextprotocol/server-memory"],
                vec![],
            ),
            preset(
                "sqlite",
                "SQLite",
                "data",
                "Query and analyze a SQLite database",
                "uvx",
                &["mcp-server-sqlite", "--db-path", "data.db"],
                vec![],
            ),
            preset(
                "time",
                "Time",
                "utilities",
                "Current time and timezone conversion",
                "uvx",
                &["mcp-server-time"],
                vec![],
            ),
        ])
    }

    /// All templates.
    pub fn all(&self) -> &[Template] {
        &self.templates
    }

    /// Look up a template by ID.
    pub fn get(&self, id: &str) -> Option<&Template> {
        self.templates.iter().find(|t| t.id == id)
    }

    /// Templates in a category.
    pub fn by_category<'a>(&'a self, category: &'a str) -> impl Iterator<Item = &'a Template> {
        self.templates.iter().filter(move |t| t.category == category)
    }

    /// Distinct categories, in first-seen order.
    pub fn categories(&self) -> Vec<&str> {
        let mut seen: Vec<&str> = Vec::new();
        for template in &self.templates {
            if !seen.contains(&template.category.as_str()) {
                seen.push(&template.category);
            }
        }
        seen
    }
}

fn preset(
    id: &str,
    name: &str,
    category: &str,
    description: &str,
    command: &str,
    args: &[&str],
    env_vars: Vec<TemplateEnvVar>,
) -> Template {
    Template {
        id: id.to_string(),
        name: name.to_string(),
        provider_type: id.to_string(),
        category: category.to_string(),
        description: description.to_string(),
        command: command.to_string(),
        args: args.iter().map(|a| (*a).to_string()).collect(),
        env_vars,
        auto_start: false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_ids_are_unique() {
        let catalog = TemplateCatalog::builtin();
        let mut ids: Vec<&str> = catalog.all().iter().map(|t| t.id.as_str()).collect();
        let before = ids.len();
        ids.sort_unstable();
        ids.dedup();
        assert_eq!(ids.len(), before);
    }

    #[test]
    fn test_builtin_drafts_validate() {
        let catalog = TemplateCatalog::builtin();
        for template in catalog.all() {
            let values: BTreeMap<String, String> = template
                .env_vars
                .iter()
                .map(|v| (v.name.clone(), "value".to_string()))
                .collect();
            let draft = template.to_draft(&values).unwrap();
            assert!(draft.validate().is_ok(), "template {} invalid", template.id);
        }
    }

    #[test]
    fn test_to_draft_requires_env() {
        let catalog = TemplateCatalog::builtin();
        let github = catalog.get("github").unwrap();

        let err = github.to_draft(&BTreeMap::new()).unwrap_err();
        assert!(err.contains("GITHUB_PERSONAL_ACCESS_TOKEN"));

        let values = BTreeMap::from([(
            "GITHUB_PERSONAL_ACCESS_TOKEN".to_string(),
            "ghp_123".to_string(),
        )]);
        let draft = github.to_draft(&values).unwrap();
        assert_eq!(draft.provider_type, "github");
        assert_eq!(draft.env["GITHUB_PERSONAL_ACCESS_TOKEN"], "ghp_123");
        assert!(!draft.auto_start);
    }

    #[test]
    fn test_categories_and_filter() {
        let catalog = TemplateCatalog::builtin();
        let categories = catalog.categories();
        assert!(categories.contains(&"web"));

        let web: Vec<&str> = catalog.by_category("web").map(|t| t.id.as_str()).collect();
        assert_eq!(web, vec!["fetch", "brave-search"]);
    }

    #[test]
    fn test_unknown_template() {
        assert!(TemplateCatalog::builtin().get("nope").is_none());
    }
}
