//! Scripted fakes of the process and probe ports.
//!
//! Available to this crate's tests and, with the `test-utils` feature, to
//! downstream crates.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use async_trait::async_trait;
use mcpvisor_core::{
    HandshakeReport, HealthProbe, ProbeFailure, ProcessController, ProcessError, ProcessExit,
    ProcessHandle, ProviderChannel, ProviderConfig, ProviderError, ProviderId, ProviderRepository,
    ProviderTestResult, RepositoryError, Termination,
};
use tokio::sync::{mpsc, watch};

use crate::repository::InMemoryRepository;

/// How scripted processes react.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Behavior {
    /// Exits on the first graceful request.
    Cooperative,
    /// Ignores graceful requests, only dies when killed.
    IgnoreGraceful,
    /// `start` fails with a spawn error.
    FailSpawn,
    /// Exits with the given code right after spawning.
    ExitImmediately(i32),
}

type ExitSender = Arc<watch::Sender<Option<ProcessExit>>>;

struct ScriptState {
    behavior: Behavior,
    spawn_delay: Duration,
    channel: Option<Arc<dyn ProviderChannel>>,
    next_pid: u32,
    spawns: usize,
    processes: HashMap<u32, ExitSender>,
}

/// In-memory process controller with scripted behavior.
///
/// Clones share state, so a test can keep one clone for assertions while
/// the manager owns another.
#[derive(Clone)]
pub struct ScriptedController {
    state: Arc<Mutex<ScriptState>>,
}

impl Default for ScriptedController {
    fn default() -> Self {
        Self::new()
    }
}

impl ScriptedController {
    pub fn new() -> Self {
        Self {
            state: Arc::new(Mutex::new(ScriptState {
                behavior: Behavior::Cooperative,
                spawn_delay: Duration::ZERO,
                channel: None,
                next_pid: 1000,
                spawns: 0,
                processes: HashMap::new(),
            })),
        }
    }

    #[must_use]
    pub fn with_behavior(self, behavior: Behavior) -> Self {
        self.set_behavior(behavior);
        self
    }

    /// Delay every spawn, widening the window for concurrent starts.
    #[must_use]
    pub fn with_spawn_delay(self, delay: Duration) -> Self {
        self.lock().spawn_delay = delay;
        self
    }

    /// Attach `channel` to every spawned handle.
    #[must_use]
    pub fn with_channel(self, channel: Arc<dyn ProviderChannel>) -> Self {
        self.lock().channel = Some(channel);
        self
    }

    /// Change behavior for subsequent spawns.
    pub fn set_behavior(&self, behavior: Behavior) {
        self.lock().behavior = behavior;
    }

    /// Number of `start` calls that reached the spawn step.
    pub fn spawn_count(&self) -> usize {
        self.lock().spawns
    }

    /// Processes that have not exited.
    pub fn live_count(&self) -> usize {
        self.lock()
            .processes
            .values()
            .filter(|exit| exit.borrow().is_none())
            .count()
    }

    /// Make a live process exit with `code`. Returns false if unknown or
    /// already exited.
    pub fn crash(&self, pid: u32, code: i32) -> bool {
        let state = self.lock();
        let Some(exit) = state.processes.get(&pid) else {
            return false;
        };
        if exit.borrow().is_some() {
            return false;
        }
        exit.send_replace(Some(ProcessExit::with_code(code)));
        true
    }

    fn lock(&self) -> MutexGuard<'_, ScriptState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[async_trait]
impl ProcessController for ScriptedController {
    async fn start(&self, config: &ProviderConfig) -> Result<ProcessHandle, ProcessError> {
        let delay = self.lock().spawn_delay;
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }

        let mut state = self.lock();
        state.spawns += 1;
        if state.behavior == Behavior::FailSpawn {
            return Err(ProcessError::Spawn {
                command: config.command.clone(),
                reason: "scripted spawn failure".to_string(),
            });
        }

        let pid = state.next_pid;
        state.next_pid += 1;

        let (exit_tx, exit_rx) = watch::channel(None);
        let exit_tx = Arc::new(exit_tx);
        let (control_tx, control_rx) = mpsc::unbounded_channel();
        let honors_graceful = state.behavior != Behavior::IgnoreGraceful;
        if let Behavior::ExitImmediately(code) = state.behavior {
            exit_tx.send_replace(Some(ProcessExit::with_code(code)));
        }
        tokio::spawn(run_fake_process(
            control_rx,
            Arc::clone(&exit_tx),
            honors_graceful,
        ));
        state.processes.insert(pid, exit_tx);

        let handle = ProcessHandle::new(pid, exit_rx, control_tx);
        Ok(match &state.channel {
            Some(channel) => handle.with_channel(Arc::clone(channel)),
            None => handle,
        })
    }
}

async fn run_fake_process(
    mut control: mpsc::UnboundedReceiver<Termination>,
    exit: ExitSender,
    honors_graceful: bool,
) {
    while let Some(request) = control.recv().await {
        if exit.borrow().is_some() {
            return;
        }
        match request {
            Termination::Graceful if honors_graceful => {
                exit.send_replace(Some(ProcessExit::with_signal(15)));
                return;
            }
            Termination::Graceful => {}
            Termination::Forced => {
                exit.send_replace(Some(ProcessExit::with_signal(9)));
                return;
            }
        }
    }

    // Every handle dropped
    if exit.borrow().is_none() {
        exit.send_replace(Some(ProcessExit::with_signal(9)));
    }
}

/// Channel answering handshakes with a fixed outcome.
pub struct ScriptedChannel {
    outcome: Result<HandshakeReport, ProbeFailure>,
    delay: Duration,
    calls: AtomicUsize,
}

impl ScriptedChannel {
    /// Successful handshake listing `tools`.
    pub fn healthy(tools: &[&str]) -> Self {
        Self {
            outcome: Ok(HandshakeReport {
                server_name: Some("scripted".to_string()),
                version: Some("1.0.0".to_string()),
                protocol_version: Some("2024-11-05".to_string()),
                tools: tools.iter().map(|t| (*t).to_string()).collect(),
            }),
            delay: Duration::ZERO,
            calls: AtomicUsize::new(0),
        }
    }

    /// Handshake that always fails with `failure`.
    pub fn failing(failure: ProbeFailure) -> Self {
        Self {
            outcome: Err(failure),
            delay: Duration::ZERO,
            calls: AtomicUsize::new(0),
        }
    }

    #[must_use]
    pub const fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ProviderChannel for ScriptedChannel {
    async fn handshake(&self) -> Result<HandshakeReport, ProbeFailure> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        self.outcome.clone()
    }
}

/// Health probe returning a fixed outcome, recording what it was given.
pub struct ScriptedProbe {
    success: bool,
    delays: Mutex<Vec<Duration>>,
    seen_pids: Mutex<Vec<Option<u32>>>,
}

impl ScriptedProbe {
    pub fn passing() -> Self {
        Self::new(true)
    }

    pub fn failing() -> Self {
        Self::new(false)
    }

    fn new(success: bool) -> Self {
        Self {
            success,
            delays: Mutex::new(Vec::new()),
            seen_pids: Mutex::new(Vec::new()),
        }
    }

    /// Delays applied to successive calls, in order. Calls beyond the list
    /// complete immediately.
    #[must_use]
    pub fn with_delays(self, delays: &[Duration]) -> Self {
        *self.delays.lock().unwrap_or_else(PoisonError::into_inner) =
            delays.iter().rev().copied().collect();
        self
    }

    /// PID of the running handle passed to each call (`None` for transient).
    pub fn seen_pids(&self) -> Vec<Option<u32>> {
        self.seen_pids
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

#[async_trait]
impl HealthProbe for ScriptedProbe {
    async fn test(
        &self,
        _config: &ProviderConfig,
        running: Option<&ProcessHandle>,
    ) -> Result<ProviderTestResult, ProviderError> {
        self.seen_pids
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(running.map(ProcessHandle::pid));
        let delay = self
            .delays
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .pop()
            .unwrap_or_default();
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }

        let millis = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX);
        Ok(if self.success {
            ProviderTestResult::passed(millis, HandshakeReport::default())
        } else {
            ProviderTestResult::failed(millis, "scripted failure")
        })
    }
}

/// In-memory repository whose writes can be switched to fail.
#[derive(Debug, Default)]
pub struct FlakyRepository {
    inner: InMemoryRepository,
    fail_writes: AtomicBool,
}

impl FlakyRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    pub fn snapshot(&self) -> Vec<ProviderConfig> {
        self.inner.snapshot()
    }

    fn check(&self) -> Result<(), RepositoryError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(RepositoryError::Internal("scripted write failure".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl ProviderRepository for FlakyRepository {
    async fn load_all(&self) -> Result<Vec<ProviderConfig>, RepositoryError> {
        self.inner.load_all().await
    }

    async fn upsert(&self, provider: &ProviderConfig) -> Result<(), RepositoryError> {
        self.check()?;
        self.inner.upsert(provider).await
    }

    async fn delete(&self, id: &ProviderId) -> Result<(), RepositoryError> {
        self.check()?;
        self.inner.delete(id).await
    }

    async fn replace_all(&self, providers: &[ProviderConfig]) -> Result<(), RepositoryError> {
        self.check()?;
        self.inner.replace_all(providers).await
    }
}
