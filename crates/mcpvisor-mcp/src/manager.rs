//! Provider lifecycle orchestration.
//!
//! `ProviderManager` is the single owner of provider processes. It joins the
//! configuration store with per-provider runtime state and turns every
//! transition into exactly one event on the bus.
//!
//! Concurrency model:
//!
//! - each provider has a slot with an async operation lock; start, stop,
//!   restart and remove hold it for their whole duration, so lifecycle
//!   operations on one provider never interleave, while different providers
//!   proceed in parallel
//! - a test that has to launch a transient instance holds the same lock, so
//!   it never overlaps a real start
//! - runtime state sits behind a short-lived sync lock, and every event is
//!   published while that lock is held, so subscribers see transitions in the
//!   order they happened
//! - unexpected exits are observed by a watcher task per running process,
//!   tagged with a generation so a watcher from an older run never touches a
//!   newer one

use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use futures_util::future::join_all;
use mcpvisor_core::{
    ErrorCategory, EventEmitter, HealthProbe, ManagerSettings, NewProvider, ProcessController, ProcessHandle,
    ProviderConfig, ProviderError, ProviderErrorInfo, ProviderEvent, ProviderId,
    ProviderRepository, ProviderSnapshot, ProviderState, ProviderStats, ProviderStatus,
    ProviderTestResult, TemplateCatalog, Termination, UpdateProvider,
};
use tracing::{debug, info, warn};

use crate::bus::{EventBus, ListenerHandle, Subscription};
use crate::probe::{McpHealthProbe, TRANSIENT_STOP_GRACE};
use crate::process::TokioProcessController;
use crate::store::ProviderStore;

/// Time a probe gets past its own timeout to tear down a transient process:
/// the stop grace plus the wait for a forced kill to be reported.
const PROBE_CLEANUP_MARGIN: Duration =
    TRANSIENT_STOP_GRACE.saturating_add(Duration::from_secs(5));

/// Adapters the manager is built from.
pub struct ProviderManagerDeps {
    pub repository: Arc<dyn ProviderRepository>,
    pub controller: Arc<dyn ProcessController>,
    pub probe: Arc<dyn HealthProbe>,
}

/// Result of `update_provider`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderUpdate {
    /// The configuration as stored after the update.
    pub provider: ProviderConfig,
    /// The provider is running with the old launch spec; the new one takes
    /// effect on the next start.
    pub restart_required: bool,
}

#[derive(Debug, Default)]
struct RuntimeState {
    name: String,
    status: ProviderState,
    handle: Option<ProcessHandle>,
    generation: u64,
    running_since: Option<Instant>,
    last_check: Option<DateTime<Utc>>,
    last_error: Option<String>,
    last_test: Option<ProviderTestResult>,
}

impl RuntimeState {
    fn snapshot(&self, id: &ProviderId) -> ProviderStatus {
        let live = self.status.is_live();
        ProviderStatus {
            provider_id: id.clone(),
            status: self.status,
            process_id: self
                .handle
                .as_ref()
                .filter(|_| live)
                .map(ProcessHandle::pid),
            uptime: self
                .running_since
                .filter(|_| self.status == ProviderState::Running)
                .map(|since| since.elapsed().as_secs()),
            last_check: self.last_check,
            last_error: self.last_error.clone(),
        }
    }

    /// Drop the process and record why.
    fn fail(&mut self, message: String) {
        self.status = ProviderState::Error;
        self.handle = None;
        self.running_since = None;
        self.last_error = Some(message);
        self.last_check = Some(Utc::now());
    }
}

struct ProviderSlot {
    id: ProviderId,
    op_lock: tokio::sync::Mutex<()>,
    state: Mutex<RuntimeState>,
}

impl ProviderSlot {
    fn new(config: &ProviderConfig) -> Self {
        Self {
            id: config.id.clone(),
            op_lock: tokio::sync::Mutex::new(()),
            state: Mutex::new(RuntimeState {
                name: config.name.clone(),
                ..RuntimeState::default()
            }),
        }
    }

    fn lock_state(&self) -> MutexGuard<'_, RuntimeState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Registry and supervisor of MCP provider processes.
pub struct ProviderManager {
    store: ProviderStore,
    controller: Arc<dyn ProcessController>,
    probe: Arc<dyn HealthProbe>,
    bus: EventBus,
    settings: ManagerSettings,
    catalog: TemplateCatalog,
    slots: Mutex<HashMap<ProviderId, Arc<ProviderSlot>>>,
    initialized: AtomicBool,
    shutting_down: AtomicBool,
}

impl ProviderManager {
    pub fn new(deps: ProviderManagerDeps, settings: ManagerSettings) -> Self {
        Self {
            store: ProviderStore::new(deps.repository),
            controller: deps.controller,
            probe: deps.probe,
            bus: EventBus::new(settings.event_capacity),
            settings,
            catalog: TemplateCatalog::builtin(),
            slots: Mutex::new(HashMap::new()),
            initialized: AtomicBool::new(false),
            shutting_down: AtomicBool::new(false),
        }
    }

    /// Manager spawning local processes and probing them over MCP stdio.
    pub fn with_defaults(repository: Arc<dyn ProviderRepository>, settings: ManagerSettings) -> Self {
        let controller: Arc<dyn ProcessController> = Arc::new(TokioProcessController::new());
        let probe = Arc::new(McpHealthProbe::new(
            Arc::clone(&controller),
            settings.probe_timeout(),
        ));
        Self::new(
            ProviderManagerDeps {
                repository,
                controller,
                probe,
            },
            settings,
        )
    }

    /// Hand every event to `emitter` as well as to the bus subscribers.
    #[must_use]
    pub fn with_emitter(mut self, emitter: Arc<dyn EventEmitter>) -> Self {
        self.bus = self.bus.clone().with_forward(emitter);
        self
    }

    pub const fn settings(&self) -> &ManagerSettings {
        &self.settings
    }

    // =========================================================================
    // Startup and shutdown
    // =========================================================================

    /// Load persisted providers and start those marked auto-start.
    ///
    /// Idempotent: later calls return immediately. Individual start
    /// failures are recorded on the provider and do not fail `init`.
    pub async fn init(&self) -> Result<(), ProviderError> {
        if self.initialized.swap(true, Ordering::SeqCst) {
            return Ok(());
        }

        let count = match self.store.load().await {
            Ok(count) => count,
            Err(e) => {
                self.initialized.store(false, Ordering::SeqCst);
                return Err(e);
            }
        };

        let auto: Vec<ProviderConfig> = self
            .store
            .get_all()
            .await
            .into_iter()
            .filter(|p| p.enabled && p.auto_start)
            .collect();
        self.start_each(&auto).await;

        info!(
            providers = count,
            auto_started = auto.len(),
            "Provider manager initialized"
        );
        Ok(())
    }

    /// Load persisted providers without starting any.
    pub async fn load(&self) -> Result<usize, ProviderError> {
        self.store.load().await
    }

    /// Stop every running provider and refuse further lifecycle operations.
    pub async fn shutdown(&self) {
        if !self.shutting_down.swap(true, Ordering::SeqCst) {
            info!("Shutting down provider manager");
        }

        let slots: Vec<Arc<ProviderSlot>> = self.lock_slots().values().cloned().collect();
        join_all(slots.iter().map(|slot| async move {
            let _op = slot.op_lock.lock().await;
            self.stop_locked(slot).await
        }))
        .await;

        info!("Provider manager shut down");
    }

    pub fn is_shutting_down(&self) -> bool {
        self.shutting_down.load(Ordering::SeqCst)
    }

    // =========================================================================
    // Configuration
    // =========================================================================

    /// Register a provider, starting it right away if it is enabled and
    /// marked auto-start.
    ///
    /// A failed auto-start is recorded on the provider; the registration
    /// itself still succeeds.
    pub async fn add_provider(&self, draft: NewProvider) -> Result<ProviderConfig, ProviderError> {
        self.ensure_active()?;
        let config = self.store.add(draft).await?;

        let slot = self.slot_for(&config);
        {
            let _state = slot.lock_state();
            self.bus.publish(ProviderEvent::added(&config));
        }
        info!(provider_id = %config.id, provider_name = %config.name, "Added provider");

        if config.enabled && config.auto_start {
            self.start_provider(&config.id).await?;
        }
        Ok(config)
    }

    /// Merge `patch` into a provider's configuration.
    ///
    /// A running process keeps its old launch spec; `restart_required` tells
    /// the caller a restart is needed to pick the change up.
    pub async fn update_provider(
        &self,
        id: &ProviderId,
        patch: &UpdateProvider,
    ) -> Result<ProviderUpdate, ProviderError> {
        let current = self.require(id).await?;
        let updated = self.store.update(id, patch).await?;

        let slot = self.slot_for(&updated);
        let restart_required = {
            let mut state = slot.lock_state();
            let restart_required = state.status.is_live() && patch.changes_launch_spec(&current);
            state.name.clone_from(&updated.name);
            self.bus
                .publish(ProviderEvent::updated(&updated, restart_required));
            restart_required
        };

        if restart_required {
            info!(
                provider_id = %id,
                "Launch spec changed while running, takes effect on next start"
            );
        }
        Ok(ProviderUpdate {
            provider: updated,
            restart_required,
        })
    }

    /// Stop the provider if it runs, then delete it.
    pub async fn remove_provider(&self, id: &ProviderId) -> Result<ProviderConfig, ProviderError> {
        let config = self.require(id).await?;
        let slot = self.slot_for(&config);
        let _op = slot.op_lock.lock().await;
        self.ensure_registered(&slot).await?;

        self.stop_locked(&slot).await;
        let removed = self.store.remove(id).await?;
        self.discard_slot(&slot);
        {
            let _state = slot.lock_state();
            self.bus.publish(ProviderEvent::removed(id.clone()));
        }

        info!(provider_id = %id, provider_name = %removed.name, "Removed provider");
        Ok(removed)
    }

    pub async fn get_all_providers(&self) -> Vec<ProviderConfig> {
        self.store.get_all().await
    }

    pub async fn get_provider(&self, id: &ProviderId) -> Result<ProviderConfig, ProviderError> {
        self.require(id).await
    }

    /// Configuration snapshot of every provider, without runtime state.
    pub async fn export_providers(&self) -> ProviderSnapshot {
        self.store.export().await
    }

    /// Replace all providers with the contents of a snapshot document.
    ///
    /// Nothing changes unless every entry validates. Afterwards, running
    /// providers that were dropped or whose launch spec changed are stopped,
    /// and auto-start providers that are not running are started.
    pub async fn import_providers(&self, json: &str) -> Result<Vec<ProviderConfig>, ProviderError> {
        self.ensure_active()?;
        let outcome = self.store.import(json).await?;

        let current: HashMap<&ProviderId, &ProviderConfig> =
            outcome.current.iter().map(|p| (&p.id, p)).collect();

        for previous in &outcome.previous {
            match current.get(&previous.id) {
                None => {
                    if let Some(slot) = self.slot(&previous.id) {
                        let _op = slot.op_lock.lock().await;
                        self.stop_locked(&slot).await;
                        self.discard_slot(&slot);
                    }
                    self.bus
                        .publish(ProviderEvent::removed(previous.id.clone()));
                }
                Some(next) => {
                    let material = previous.launch_spec_differs(next) || !next.enabled;
                    let slot = self.slot_for(next);
                    if material {
                        let _op = slot.op_lock.lock().await;
                        self.stop_locked(&slot).await;
                    }
                    let mut state = slot.lock_state();
                    state.name.clone_from(&next.name);
                    if previous.to_draft() != next.to_draft() {
                        self.bus.publish(ProviderEvent::updated(next, false));
                    }
                }
            }
        }

        let previous_ids: Vec<&ProviderId> = outcome.previous.iter().map(|p| &p.id).collect();
        for config in &outcome.current {
            if !previous_ids.contains(&&config.id) {
                let slot = self.slot_for(config);
                let _state = slot.lock_state();
                self.bus.publish(ProviderEvent::added(config));
            }
        }

        let auto: Vec<ProviderConfig> = outcome
            .current
            .iter()
            .filter(|p| p.enabled && p.auto_start)
            .cloned()
            .collect();
        self.start_each(&auto).await;

        info!(
            previous = outcome.previous.len(),
            current = outcome.current.len(),
            "Imported providers"
        );
        Ok(outcome.current)
    }

    // =========================================================================
    // Templates
    // =========================================================================

    pub const fn templates(&self) -> &TemplateCatalog {
        &self.catalog
    }

    /// Draft a provider from a built-in template and supplied variables.
    pub fn draft_from_template(
        &self,
        template_id: &str,
        values: &BTreeMap<String, String>,
    ) -> Result<NewProvider, ProviderError> {
        let template = self
            .catalog
            .get(template_id)
            .ok_or_else(|| ProviderError::InvalidConfig(format!("Unknown template: {template_id}")))?;
        template.to_draft(values).map_err(ProviderError::InvalidConfig)
    }

    // =========================================================================
    // Lifecycle
    // =========================================================================

    /// Start a provider.
    ///
    /// Starting a provider that is already starting waits for that attempt;
    /// starting a running one returns its status. A spawn failure is not an
    /// error of this call: it is returned as an `error` status and emitted
    /// as a `provider:error` event.
    pub async fn start_provider(&self, id: &ProviderId) -> Result<ProviderStatus, ProviderError> {
        self.ensure_active()?;
        let config = self.require(id).await?;
        let slot = self.slot_for(&config);
        let _op = slot.op_lock.lock().await;
        self.start_locked(&slot).await
    }

    /// Stop a provider. Stopping one that is not running is a no-op.
    pub async fn stop_provider(&self, id: &ProviderId) -> Result<ProviderStatus, ProviderError> {
        let config = self.require(id).await?;
        let slot = self.slot_for(&config);
        let _op = slot.op_lock.lock().await;
        self.ensure_registered(&slot).await?;
        Ok(self.stop_locked(&slot).await)
    }

    /// Stop then start, without letting another operation in between.
    pub async fn restart_provider(&self, id: &ProviderId) -> Result<ProviderStatus, ProviderError> {
        self.ensure_active()?;
        let config = self.require(id).await?;
        let slot = self.slot_for(&config);
        let _op = slot.op_lock.lock().await;
        self.stop_locked(&slot).await;
        self.start_locked(&slot).await
    }

    /// Probe a provider over MCP.
    ///
    /// A live process is probed in place and keeps running; otherwise a
    /// transient instance is launched for the probe and torn down after.
    /// Lifecycle operations on the provider wait for a transient probe to
    /// finish. The provider's status is never changed by a test.
    pub async fn test_provider(&self, id: &ProviderId) -> Result<ProviderTestResult, ProviderError> {
        let config = self.require(id).await?;
        let slot = self.slot_for(&config);

        // Waits out an in-flight start or stop
        let op = slot.op_lock.lock().await;
        self.ensure_registered(&slot).await?;
        let handle = slot.lock_state().handle.clone();
        let transient = handle.is_none().then_some(op);

        // The probe enforces the timeout itself; this only bounds a probe
        // that never returns, and leaves room for transient cleanup
        let limit = self.settings.probe_timeout() + PROBE_CLEANUP_MARGIN;
        let started = Instant::now();
        let result = match tokio::time::timeout(limit, self.probe.test(&config, handle.as_ref())).await
        {
            Ok(result) => result?,
            Err(_) => ProviderTestResult::failed(
                u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX),
                "timeout",
            ),
        };
        drop(handle);
        drop(transient);

        {
            let mut state = slot.lock_state();
            state.last_check = Some(Utc::now());
            if state
                .last_test
                .as_ref()
                .is_none_or(|previous| previous.tested_at <= result.tested_at)
            {
                state.last_test = Some(result.clone());
            }
            let registered = self
                .lock_slots()
                .get(id)
                .is_some_and(|current| Arc::ptr_eq(current, &slot));
            if registered {
                self.bus
                    .publish(ProviderEvent::test_completed(id.clone(), result.clone()));
            }
        }

        debug!(provider_id = %id, success = result.success, duration_ms = result.duration, "Tested provider");
        Ok(result)
    }

    /// Probe every enabled provider concurrently.
    pub async fn test_all_providers(&self) -> Vec<(ProviderId, ProviderTestResult)> {
        let enabled: Vec<ProviderConfig> = self
            .store
            .get_all()
            .await
            .into_iter()
            .filter(|p| p.enabled)
            .collect();

        join_all(enabled.iter().map(|config| async move {
            match self.test_provider(&config.id).await {
                Ok(result) => Some((config.id.clone(), result)),
                Err(e) => {
                    warn!(provider_id = %config.id, error = %e, "Provider test failed to run");
                    None
                }
            }
        }))
        .await
        .into_iter()
        .flatten()
        .collect()
    }

    // =========================================================================
    // Status
    // =========================================================================

    pub async fn get_provider_status(&self, id: &ProviderId) -> Result<ProviderStatus, ProviderError> {
        self.require(id).await?;
        Ok(self.status_of(id))
    }

    /// Status of every provider, in registration order.
    pub async fn get_all_provider_statuses(&self) -> Vec<ProviderStatus> {
        self.store
            .get_all()
            .await
            .iter()
            .map(|p| self.status_of(&p.id))
            .collect()
    }

    pub async fn get_stats(&self) -> ProviderStats {
        ProviderStats::from_statuses(&self.get_all_provider_statuses().await)
    }

    /// Most recent probe result, if the provider was ever tested.
    pub fn last_test_result(&self, id: &ProviderId) -> Option<ProviderTestResult> {
        self.slot(id).and_then(|slot| slot.lock_state().last_test.clone())
    }

    // =========================================================================
    // Events
    // =========================================================================

    pub const fn events(&self) -> &EventBus {
        &self.bus
    }

    pub fn subscribe(&self) -> Subscription {
        self.bus.subscribe()
    }

    pub fn on<F>(&self, listener: F) -> ListenerHandle
    where
        F: Fn(ProviderEvent) + Send + 'static,
    {
        self.bus.on(listener)
    }

    pub fn off(&self, handle: ListenerHandle) {
        self.bus.off(handle);
    }

    // =========================================================================
    // Internals
    // =========================================================================

    fn ensure_active(&self) -> Result<(), ProviderError> {
        if self.is_shutting_down() {
            return Err(ProviderError::ShuttingDown);
        }
        Ok(())
    }

    async fn require(&self, id: &ProviderId) -> Result<ProviderConfig, ProviderError> {
        self.store
            .get(id)
            .await
            .ok_or_else(|| ProviderError::NotFound(id.clone()))
    }

    fn lock_slots(&self) -> MutexGuard<'_, HashMap<ProviderId, Arc<ProviderSlot>>> {
        self.slots.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn slot(&self, id: &ProviderId) -> Option<Arc<ProviderSlot>> {
        self.lock_slots().get(id).cloned()
    }

    /// Drop `slot` and fail when its provider was removed while the caller
    /// was waiting for it.
    async fn ensure_registered(&self, slot: &Arc<ProviderSlot>) -> Result<(), ProviderError> {
        if self.store.contains(&slot.id).await {
            return Ok(());
        }
        self.discard_slot(slot);
        Err(ProviderError::NotFound(slot.id.clone()))
    }

    fn slot_for(&self, config: &ProviderConfig) -> Arc<ProviderSlot> {
        Arc::clone(
            self.lock_slots()
                .entry(config.id.clone())
                .or_insert_with(|| Arc::new(ProviderSlot::new(config))),
        )
    }

    /// Forget a slot, unless it has already been replaced.
    fn discard_slot(&self, slot: &Arc<ProviderSlot>) {
        let mut slots = self.lock_slots();
        if slots.get(&slot.id).is_some_and(|s| Arc::ptr_eq(s, slot)) {
            slots.remove(&slot.id);
        }
    }

    fn status_of(&self, id: &ProviderId) -> ProviderStatus {
        self.slot(id).map_or_else(
            || ProviderStatus::stopped(id.clone()),
            |slot| slot.lock_state().snapshot(id),
        )
    }

    async fn start_each(&self, configs: &[ProviderConfig]) {
        let results = join_all(configs.iter().map(|c| self.start_provider(&c.id))).await;
        for (config, result) in configs.iter().zip(results) {
            if let Err(e) = result {
                warn!(provider_id = %config.id, error = %e, "Auto-start failed");
            }
        }
    }

    /// Caller holds the slot's operation lock.
    async fn start_locked(&self, slot: &Arc<ProviderSlot>) -> Result<ProviderStatus, ProviderError> {
        self.ensure_active()?;
        // Re-read: the provider may have changed or gone while we waited
        let Some(config) = self.store.get(&slot.id).await else {
            self.discard_slot(slot);
            return Err(ProviderError::NotFound(slot.id.clone()));
        };

        {
            let mut state = slot.lock_state();
            if matches!(state.status, ProviderState::Starting | ProviderState::Running) {
                return Ok(state.snapshot(&slot.id));
            }
            state.status = ProviderState::Starting;
            state.name.clone_from(&config.name);
            state.last_error = None;
            state.last_check = Some(Utc::now());
        }
        info!(
            provider_id = %config.id,
            provider_name = %config.name,
            command = %config.command,
            "Starting provider"
        );

        let handle = match self.controller.start(&config).await {
            Ok(handle) => handle,
            Err(e) => {
                return Ok(self.fail_start(slot, e.to_string(), ErrorCategory::Spawn));
            }
        };
        slot.lock_state().handle = Some(handle.clone());

        if let Ok(exit) = tokio::time::timeout(self.settings.startup_check(), handle.wait()).await {
            return Ok(self.fail_start(
                slot,
                format!("Process exited during startup ({exit})"),
                ErrorCategory::Exit,
            ));
        }

        let (status, generation) = {
            let mut state = slot.lock_state();
            state.status = ProviderState::Running;
            state.generation += 1;
            state.running_since = Some(Instant::now());
            state.last_check = Some(Utc::now());
            self.bus.publish(ProviderEvent::started(
                slot.id.clone(),
                config.name.clone(),
                handle.pid(),
            ));
            (state.snapshot(&slot.id), state.generation)
        };
        self.watch_exit(slot, &handle, generation);

        info!(
            provider_id = %config.id,
            provider_name = %config.name,
            pid = handle.pid(),
            "Provider running"
        );
        Ok(status)
    }

    fn fail_start(&self, slot: &ProviderSlot, message: String, category: ErrorCategory) -> ProviderStatus {
        let mut state = slot.lock_state();
        state.fail(message.clone());
        warn!(
            provider_id = %slot.id,
            provider_name = %state.name,
            error = %message,
            "Provider failed to start"
        );
        let info = ProviderErrorInfo {
            provider_name: state.name.clone(),
            message,
            category,
        };
        self.bus.publish(ProviderEvent::error(slot.id.clone(), info));
        state.snapshot(&slot.id)
    }

    /// Turn an exit nobody asked for into an `error` status.
    fn watch_exit(&self, slot: &Arc<ProviderSlot>, handle: &ProcessHandle, generation: u64) {
        let exited = handle.exit_signal();
        let slot = Arc::clone(slot);
        let bus = self.bus.clone();

        tokio::spawn(async move {
            let exit = exited.await;
            let mut state = slot.lock_state();
            if state.generation != generation || state.status != ProviderState::Running {
                return;
            }

            let message = format!("Process exited unexpectedly ({exit})");
            warn!(
                provider_id = %slot.id,
                provider_name = %state.name,
                %exit,
                "Provider process exited"
            );
            state.fail(message.clone());
            bus.publish(ProviderEvent::error(
                slot.id.clone(),
                ProviderErrorInfo::exit(state.name.clone(), message),
            ));
        });
    }

    /// Caller holds the slot's operation lock.
    async fn stop_locked(&self, slot: &ProviderSlot) -> ProviderStatus {
        let (handle, name) = {
            let mut state = slot.lock_state();
            if state.status != ProviderState::Running {
                return state.snapshot(&slot.id);
            }
            let Some(handle) = state.handle.clone() else {
                state.status = ProviderState::Stopped;
                return state.snapshot(&slot.id);
            };
            state.status = ProviderState::Stopping;
            state.last_check = Some(Utc::now());
            (handle, state.name.clone())
        };
        info!(provider_id = %slot.id, provider_name = %name, pid = handle.pid(), "Stopping provider");

        let outcome = self
            .controller
            .stop(&handle, self.settings.stop_grace())
            .await;
        drop(handle);

        let mut state = slot.lock_state();
        state.status = ProviderState::Stopped;
        state.handle = None;
        state.running_since = None;
        state.last_check = Some(Utc::now());
        if outcome.was_forced() {
            warn!(
                provider_id = %slot.id,
                grace_ms = self.settings.stop_grace_ms,
                "Provider ignored graceful stop and was killed"
            );
        }
        self.bus.publish(ProviderEvent::stopped(
            slot.id.clone(),
            state.name.clone(),
            outcome.was_forced(),
        ));
        info!(provider_id = %slot.id, exit = %outcome.exit(), "Provider stopped");
        state.snapshot(&slot.id)
    }
}

impl Drop for ProviderManager {
    fn drop(&mut self) {
        let slots = self.slots.get_mut().unwrap_or_else(PoisonError::into_inner);
        for slot in slots.values() {
            if let Some(handle) = slot.lock_state().handle.take() {
                handle.signal(Termination::Forced);
            }
        }
    }
}
