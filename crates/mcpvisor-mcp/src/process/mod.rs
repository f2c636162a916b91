//! Tokio-based process controller.
//!
//! Each spawned provider gets a supervisor task (see `reaper`) that owns the
//! `Child`. The returned `ProcessHandle` talks to it over channels and
//! carries an MCP client attached to the child's stdio.

mod reaper;

use std::ffi::OsStr;
use std::process::Stdio;
use std::sync::Arc;

use async_trait::async_trait;
use mcpvisor_core::{
    ProcessController, ProcessError, ProcessHandle, ProviderChannel, ProviderConfig, ProviderId,
};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::{ChildStderr, Command};
use tokio::sync::{mpsc, watch};
use tracing::{debug, info};

use crate::client::McpClient;
use crate::path::{build_effective_path, resolve_command};

/// Spawns providers as local child processes.
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioProcessController;

impl TokioProcessController {
    pub const fn new() -> Self {
        Self
    }
}

#[async_trait]
impl ProcessController for TokioProcessController {
    async fn start(&self, config: &ProviderConfig) -> Result<ProcessHandle, ProcessError> {
        let spawn_error = |reason: String| ProcessError::Spawn {
            command: config.command.clone(),
            reason,
        };

        let provider_path = config.env.get("PATH").map(OsStr::new);
        let exe = resolve_command(&config.command, provider_path).map_err(spawn_error)?;
        let effective_path = build_effective_path(&exe, provider_path);

        let mut command = Command::new(&exe);
        command
            .args(&config.args)
            .envs(config.env.iter().filter(|(key, _)| key.as_str() != "PATH"))
            .env("PATH", &effective_path)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        let mut child = command.spawn().map_err(|e| spawn_error(e.to_string()))?;
        let Some(pid) = child.id() else {
            return Err(spawn_error("process exited before it was assigned a pid".to_string()));
        };

        let channel: Option<Arc<dyn ProviderChannel>> = match (child.stdin.take(), child.stdout.take()) {
            (Some(stdin), Some(stdout)) => Some(Arc::new(McpClient::attach(stdin, stdout))),
            _ => None,
        };
        if let Some(stderr) = child.stderr.take() {
            tokio::spawn(drain_stderr(stderr, config.id.clone()));
        }

        let (exit_tx, exit_rx) = watch::channel(None);
        let (control_tx, control_rx) = mpsc::unbounded_channel();
        tokio::spawn(reaper::supervise(child, control_rx, exit_tx, config.id.clone()));

        info!(
            provider_id = %config.id,
            provider_name = %config.name,
            pid,
            exe = %exe.display(),
            "Spawned provider process"
        );

        let handle = ProcessHandle::new(pid, exit_rx, control_tx);
        Ok(match channel {
            Some(channel) => handle.with_channel(channel),
            None => handle,
        })
    }
}

/// Forward a provider's stderr to the log.
async fn drain_stderr(stderr: ChildStderr, provider_id: ProviderId) {
    let mut lines = BufReader::new(stderr).lines();
    while let Ok(Some(line)) = lines.next_line().await {
        debug!(provider_id = %provider_id, line = %line, "provider stderr");
    }
}
