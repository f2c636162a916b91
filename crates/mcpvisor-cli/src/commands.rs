//! Subcommands.

use std::path::PathBuf;

use clap::Subcommand;

use crate::parser::parse_env_pair;

/// Available commands.
///
/// Providers are addressed by ID or, when unambiguous, by name.
#[derive(Subcommand)]
pub enum Commands {
    /// List registered providers
    List,

    /// Show the built-in provider templates
    Templates {
        /// Only show templates in this category
        #[arg(short, long)]
        category: Option<String>,
    },

    /// Register a provider
    Add {
        /// Display name
        name: String,
        /// Executable name or path
        command: String,
        /// Arguments passed to the executable
        #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
        args: Vec<String>,
        /// Environment variable (KEY=VALUE), repeatable
        #[arg(short, long = "env", value_parser = parse_env_pair)]
        env: Vec<(String, String)>,
        /// Category tag
        #[arg(long = "type")]
        provider_type: Option<String>,
        /// Free-text description
        #[arg(short, long)]
        description: Option<String>,
        /// Do not start the provider with `mcpvisor run`
        #[arg(long)]
        no_auto_start: bool,
    },

    /// Register a provider from a built-in template
    AddTemplate {
        /// Template ID (see `mcpvisor templates`)
        template: String,
        /// Extra arguments appended to the template's
        #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
        args: Vec<String>,
        /// Display name, defaults to the template's
        #[arg(short, long)]
        name: Option<String>,
        /// Environment variable (KEY=VALUE), repeatable
        #[arg(short, long = "env", value_parser = parse_env_pair)]
        env: Vec<(String, String)>,
    },

    /// Delete a provider
    Remove {
        /// Provider ID or name
        provider: String,
    },

    /// Enable a provider
    Enable {
        /// Provider ID or name
        provider: String,
    },

    /// Disable a provider
    Disable {
        /// Provider ID or name
        provider: String,
    },

    /// Probe a provider with an MCP handshake
    Test {
        /// Provider ID or name
        provider: String,
    },

    /// Write all provider configurations as a snapshot
    Export {
        /// Output file, stdout when omitted
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Replace all providers with the contents of a snapshot
    Import {
        /// Snapshot file
        file: PathBuf,
    },

    /// Start auto-start providers and supervise them until Ctrl-C
    Run,
}
