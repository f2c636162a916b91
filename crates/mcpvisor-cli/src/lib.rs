//! `mcpvisor` command-line interface.
//!
//! Registers MCP providers in a JSON store and supervises them. Config
//! commands (`add`, `remove`, `enable`, `import`, ...) only edit the store;
//! `run` starts the auto-start providers and keeps them supervised until
//! Ctrl-C.

#![deny(unsafe_code)]
#![deny(unused_crate_dependencies)]

// Used by the binary only
use dotenvy as _;
use tracing_subscriber as _;

pub mod bootstrap;
pub mod commands;
pub mod error;
pub mod handlers;
pub mod parser;
pub mod presentation;

// Re-export primary types for convenient access
pub use bootstrap::{CliConfig, CliContext, bootstrap};
pub use commands::Commands;
pub use error::CliError;
pub use parser::Cli;
