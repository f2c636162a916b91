//! Main CLI parser and global options.

use std::path::PathBuf;

use clap::Parser;

use crate::commands::Commands;

/// Manage and supervise MCP provider processes.
#[derive(Parser)]
#[command(name = "mcpvisor")]
#[command(about = "Manage and supervise MCP provider processes")]
#[command(version)]
pub struct Cli {
    /// Provider store (JSON file)
    #[arg(long, env = "MCPVISOR_STORE", global = true)]
    pub store: Option<PathBuf>,

    /// Milliseconds a provider gets to exit before it is killed
    #[arg(long, env = "MCPVISOR_STOP_GRACE_MS", global = true)]
    pub stop_grace_ms: Option<u64>,

    /// Hard timeout for a health probe, in milliseconds
    #[arg(long, env = "MCPVISOR_PROBE_TIMEOUT_MS", global = true)]
    pub probe_timeout_ms: Option<u64>,

    /// Enable verbose/debug output
    #[arg(short = 'v', long = "verbose", global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Parse a `KEY=VALUE` pair.
pub fn parse_env_pair(raw: &str) -> Result<(String, String), String> {
    match raw.split_once('=') {
        Some((key, value)) if !key.is_empty() => Ok((key.to_string(), value.to_string())),
        _ => Err(format!("expected KEY=VALUE, got '{raw}'")),
    }
}
