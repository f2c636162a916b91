//! Process controller port.
//!
//! A controller owns the OS-level lifecycle of one external process per
//! provider. Exit is pushed to the owner through the handle's completion
//! signal; nobody has to poll for it.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;
use tokio::sync::{mpsc, watch};
use tracing::{debug, warn};

use super::ProviderChannel;
use crate::domain::ProviderConfig;

/// How long to wait for the exit notification after a forced kill.
const FORCED_EXIT_WAIT: Duration = Duration::from_secs(5);

/// Domain-specific errors for process control.
#[derive(Debug, Error)]
pub enum ProcessError {
    /// The executable could not be located or launched.
    #[error("Failed to spawn '{command}': {reason}")]
    Spawn { command: String, reason: String },
}

/// How a process ended.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ProcessExit {
    /// Exit code, when the process exited normally.
    pub code: Option<i32>,
    /// Terminating signal, when killed by one (Unix only).
    pub signal: Option<i32>,
}

impl ProcessExit {
    /// Exit details could not be collected.
    pub const fn unknown() -> Self {
        Self {
            code: None,
            signal: None,
        }
    }

    /// Normal exit with a code.
    pub const fn with_code(code: i32) -> Self {
        Self {
            code: Some(code),
            signal: None,
        }
    }

    /// Killed by a signal.
    pub const fn with_signal(signal: i32) -> Self {
        Self {
            code: None,
            signal: Some(signal),
        }
    }

    /// Whether the process exited with code 0.
    pub const fn success(self) -> bool {
        matches!(self.code, Some(0))
    }
}

impl fmt::Display for ProcessExit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.code, self.signal) {
            (Some(code), _) => write!(f, "exit code {code}"),
            (None, Some(signal)) => write!(f, "killed by signal {signal}"),
            (None, None) => f.write_str("unknown exit status"),
        }
    }
}

/// Termination request delivered to the task that owns a child process.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Termination {
    /// Ask the process to exit (SIGTERM on Unix).
    Graceful,
    /// Kill the process immediately.
    Forced,
}

/// Handle to a spawned process.
///
/// Clones share the same process. The process is killed once every clone
/// has been dropped, so a handle that goes out of scope never leaks a child.
#[derive(Clone)]
pub struct ProcessHandle {
    pid: u32,
    started_at: DateTime<Utc>,
    exit: watch::Receiver<Option<ProcessExit>>,
    control: mpsc::UnboundedSender<Termination>,
    channel: Option<Arc<dyn ProviderChannel>>,
}

impl ProcessHandle {
    /// Wrap the channels of a supervised process.
    ///
    /// `exit` must receive `Some` exactly once when the process ends;
    /// `control` carries termination requests to the supervisor.
    pub fn new(
        pid: u32,
        exit: watch::Receiver<Option<ProcessExit>>,
        control: mpsc::UnboundedSender<Termination>,
    ) -> Self {
        Self {
            pid,
            started_at: Utc::now(),
            exit,
            control,
            channel: None,
        }
    }

    /// Attach a conversation channel to the process.
    #[must_use]
    pub fn with_channel(mut self, channel: Arc<dyn ProviderChannel>) -> Self {
        self.channel = Some(channel);
        self
    }

    pub const fn pid(&self) -> u32 {
        self.pid
    }

    pub const fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    pub fn channel(&self) -> Option<&Arc<dyn ProviderChannel>> {
        self.channel.as_ref()
    }

    /// Exit details, if the process has already ended. Non-blocking.
    pub fn exit_status(&self) -> Option<ProcessExit> {
        *self.exit.borrow()
    }

    pub fn has_exited(&self) -> bool {
        self.exit_status().is_some()
    }

    /// Send a termination request.
    ///
    /// Returns false if the supervisor is gone (the process already ended).
    pub fn signal(&self, termination: Termination) -> bool {
        self.control.send(termination).is_ok()
    }

    /// Wait until the process ends.
    pub async fn wait(&self) -> ProcessExit {
        self.exit_signal().await
    }

    /// Completion signal detached from the handle.
    ///
    /// Unlike `wait`, the returned future holds no control channel, so it
    /// does not keep the process alive once every handle is dropped.
    pub fn exit_signal(&self) -> impl Future<Output = ProcessExit> + Send + 'static {
        let mut rx = self.exit.clone();
        async move {
            let observed = rx.wait_for(Option::is_some).await.map(|exit| *exit);
            match observed {
                Ok(Some(exit)) => exit,
                // Supervisor vanished without reporting
                _ => (*rx.borrow()).unwrap_or_else(ProcessExit::unknown),
            }
        }
    }
}

impl fmt::Debug for ProcessHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProcessHandle")
            .field("pid", &self.pid)
            .field("started_at", &self.started_at)
            .field("exit", &self.exit_status())
            .field("has_channel", &self.channel.is_some())
            .finish()
    }
}

/// Result of a stop request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopOutcome {
    /// Process had already exited; nothing was sent.
    AlreadyExited(ProcessExit),
    /// Process exited within the grace period.
    Graceful(ProcessExit),
    /// Grace period elapsed and the process was killed.
    Forced(ProcessExit),
}

impl StopOutcome {
    pub const fn exit(self) -> ProcessExit {
        match self {
            Self::AlreadyExited(exit) | Self::Graceful(exit) | Self::Forced(exit) => exit,
        }
    }

    pub const fn was_forced(self) -> bool {
        matches!(self, Self::Forced(_))
    }
}

/// Spawns, signals and reaps provider processes.
///
/// Only `start` has to be implemented; termination is expressed through the
/// handle's control channel, so `stop`, `kill` and `is_alive` have shared
/// default implementations.
#[async_trait]
pub trait ProcessController: Send + Sync {
    /// Spawn `command` with `args`, merging `env` over the current
    /// environment.
    ///
    /// # Errors
    ///
    /// `ProcessError::Spawn` if the executable cannot be located or launched.
    async fn start(&self, config: &ProviderConfig) -> Result<ProcessHandle, ProcessError>;

    /// Request graceful termination, escalating to a kill after `grace`.
    ///
    /// Idempotent: stopping an exited handle returns `AlreadyExited`.
    async fn stop(&self, handle: &ProcessHandle, grace: Duration) -> StopOutcome {
        if let Some(exit) = handle.exit_status() {
            return StopOutcome::AlreadyExited(exit);
        }
        if !handle.signal(Termination::Graceful) {
            return StopOutcome::AlreadyExited(handle.wait().await);
        }

        if let Ok(exit) = tokio::time::timeout(grace, handle.wait()).await {
            return StopOutcome::Graceful(exit);
        }

        debug!(
            pid = handle.pid(),
            grace_ms = grace.as_millis(),
            "Grace period elapsed, forcing termination"
        );
        StopOutcome::Forced(self.kill(handle).await)
    }

    /// Kill immediately and wait for the exit notification.
    async fn kill(&self, handle: &ProcessHandle) -> ProcessExit {
        if let Some(exit) = handle.exit_status() {
            return exit;
        }
        handle.signal(Termination::Forced);
        if let Ok(exit) = tokio::time::timeout(FORCED_EXIT_WAIT, handle.wait()).await {
            exit
        } else {
            warn!(pid = handle.pid(), "Process did not report exit after kill");
            ProcessExit::unknown()
        }
    }

    /// Non-blocking liveness check.
    fn is_alive(&self, handle: &ProcessHandle) -> bool {
        !handle.has_exited()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Controller whose processes are simulated by a task reacting to
    /// termination requests.
    struct SimulatedController {
        honors_graceful: bool,
    }

    #[async_trait]
    impl ProcessController for SimulatedController {
        async fn start(&self, _config: &ProviderConfig) -> Result<ProcessHandle, ProcessError> {
            let (exit_tx, exit_rx) = watch::channel(None);
            let (control_tx, mut control_rx) = mpsc::unbounded_channel();
            let honors_graceful = self.honors_graceful;
            tokio::spawn(async move {
                while let Some(request) = control_rx.recv().await {
                    match request {
                        Termination::Graceful if honors_graceful => {
                            exit_tx.send_replace(Some(ProcessExit::with_signal(15)));
                            return;
                        }
                        Termination::Graceful => {}
                        Termination::Forced => {
                            exit_tx.send_replace(Some(ProcessExit::with_signal(9)));
                            return;
                        }
                    }
                }
            });
            Ok(ProcessHandle::new(4242, exit_rx, control_tx))
        }
    }

    fn config() -> ProviderConfig {
        ProviderConfig::from_draft(
            crate::domain::ProviderId::from("p-1"),
            crate::domain::NewProvider::new("fs", "mcp-fs"),
        )
    }

    #[tokio::test]
    async fn test_graceful_stop() {
        let controller = SimulatedController {
            honors_graceful: true,
        };
        let handle = controller.start(&config()).await.unwrap();
        assert!(controller.is_alive(&handle));

        let outcome = controller.stop(&handle, Duration::from_secs(1)).await;
        assert_eq!(outcome, StopOutcome::Graceful(ProcessExit::with_signal(15)));
        assert!(!controller.is_alive(&handle));
    }

    #[tokio::test]
    async fn test_stop_escalates_when_graceful_ignored() {
        let controller = SimulatedController {
            honors_graceful: false,
        };
        let handle = controller.start(&config()).await.unwrap();

        let outcome = controller.stop(&handle, Duration::from_millis(50)).await;
        assert!(outcome.was_forced());
        assert_eq!(outcome.exit(), ProcessExit::with_signal(9));
    }

    #[tokio::test]
    async fn test_stop_is_idempotent() {
        let controller = SimulatedController {
            honors_graceful: true,
        };
        let handle = controller.start(&config()).await.unwrap();
        controller.stop(&handle, Duration::from_secs(1)).await;

        let again = controller.stop(&handle, Duration::from_secs(1)).await;
        assert!(matches!(again, StopOutcome::AlreadyExited(_)));
    }

    #[test]
    fn test_wait_pending_until_exit_reported() {
        let (exit_tx, exit_rx) = watch::channel(None);
        let (control_tx, _control_rx) = mpsc::unbounded_channel();
        let handle = ProcessHandle::new(7, exit_rx, control_tx);

        let mut wait = tokio_test::task::spawn(handle.wait());
        tokio_test::assert_pending!(wait.poll());

        exit_tx.send_replace(Some(ProcessExit::with_code(3)));
        assert!(wait.is_woken());
        tokio_test::assert_ready_eq!(wait.poll(), ProcessExit::with_code(3));
    }

    #[test]
    fn test_vanished_supervisor_reports_unknown_exit() {
        let (exit_tx, exit_rx) = watch::channel(None);
        let (control_tx, control_rx) = mpsc::unbounded_channel();
        let handle = ProcessHandle::new(7, exit_rx, control_tx);
        drop(control_rx);
        drop(exit_tx);

        assert!(!handle.signal(Termination::Graceful));
        assert_eq!(tokio_test::block_on(handle.wait()), ProcessExit::unknown());
    }

    #[test]
    fn test_exit_display() {
        assert_eq!(ProcessExit::with_code(1).to_string(), "exit code 1");
        assert_eq!(ProcessExit::with_signal(9).to_string(), "killed by signal 9");
        assert!(ProcessExit::with_code(0).success());
    }
}
