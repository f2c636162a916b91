//! Integration tests for provider lifecycle orchestration.
//!
//! These run the manager against scripted process and probe fakes, so they
//! exercise ordering and concurrency without spawning anything.

mod common;

use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use futures_util::future::join_all;
use mcpvisor::mcpvisor_mcp::testing::{Behavior, ScriptedController, ScriptedProbe};
use mcpvisor::{
    ErrorCategory, NewProvider, ProviderError, ProviderEvent, ProviderId, ProviderState,
    UpdateProvider,
};

use common::{drain_names, next_event, passing_probe, scripted_manager};

#[tokio::test]
async fn test_register_and_auto_start() {
    let controller = ScriptedController::new();
    let manager = scripted_manager(&controller, passing_probe());
    let mut events = manager.subscribe();

    let config = manager
        .add_provider(NewProvider::new("fs-tools", "mcp-fs").with_auto_start(true))
        .await
        .unwrap();

    match next_event(&mut events).await {
        ProviderEvent::ProviderAdded { provider_id, provider } => {
            assert_eq!(provider_id, config.id);
            assert_eq!(provider.name, "fs-tools");
        }
        other => panic!("expected provider_added, got {other:?}"),
    }
    match next_event(&mut events).await {
        ProviderEvent::ProviderStarted {
            provider_id,
            process_id,
            ..
        } => {
            assert_eq!(provider_id, config.id);
            let status = manager.get_provider_status(&config.id).await.unwrap();
            assert_eq!(status.status, ProviderState::Running);
            assert_eq!(status.process_id, Some(process_id));
        }
        other => panic!("expected provider_started, got {other:?}"),
    }
}

#[tokio::test]
async fn test_disabled_provider_is_not_auto_started() {
    let controller = ScriptedController::new();
    let manager = scripted_manager(&controller, passing_probe());

    let config = manager
        .add_provider(NewProvider::new("fs", "mcp-fs").with_enabled(false))
        .await
        .unwrap();

    assert_eq!(controller.spawn_count(), 0);
    assert_eq!(
        manager.get_provider_status(&config.id).await.unwrap().status,
        ProviderState::Stopped
    );
}

#[tokio::test]
async fn test_duplicate_registration_is_rejected() {
    let manager = scripted_manager(&ScriptedController::new(), passing_probe());
    manager
        .add_provider(NewProvider::new("fs", "mcp-fs").with_auto_start(false))
        .await
        .unwrap();
    let mut events = manager.subscribe();

    let err = manager
        .add_provider(NewProvider::new("fs", "mcp-fs"))
        .await
        .unwrap_err();
    assert!(matches!(err, ProviderError::Duplicate { .. }));
    assert!(drain_names(&mut events).is_empty());
    assert_eq!(manager.get_all_providers().await.len(), 1);
}

#[tokio::test]
async fn test_unknown_provider_operations() {
    let manager = scripted_manager(&ScriptedController::new(), passing_probe());
    let mut events = manager.subscribe();
    let unknown = ProviderId::from("unknown");

    assert!(matches!(
        manager.start_provider(&unknown).await,
        Err(ProviderError::NotFound(_))
    ));
    assert!(matches!(
        manager.remove_provider(&unknown).await,
        Err(ProviderError::NotFound(_))
    ));
    assert!(matches!(
        manager
            .update_provider(&unknown, &UpdateProvider::default())
            .await,
        Err(ProviderError::NotFound(_))
    ));
    assert!(matches!(
        manager.get_provider_status(&unknown).await,
        Err(ProviderError::NotFound(_))
    ));
    assert!(drain_names(&mut events).is_empty());
}

#[tokio::test]
async fn test_many_concurrent_starts_spawn_once() {
    let controller = ScriptedController::new().with_spawn_delay(Duration::from_millis(30));
    let manager = scripted_manager(&controller, passing_probe());
    let config = manager
        .add_provider(NewProvider::new("fs", "mcp-fs").with_auto_start(false))
        .await
        .unwrap();
    let mut events = manager.subscribe();

    let results = join_all((0..10).map(|_| manager.start_provider(&config.id))).await;

    assert_eq!(controller.spawn_count(), 1);
    let pids: Vec<Option<u32>> = results
        .into_iter()
        .map(|r| r.unwrap().process_id)
        .collect();
    assert!(pids.iter().all(|pid| pid.is_some() && *pid == pids[0]));
    assert_eq!(drain_names(&mut events), ["provider:started"]);
}

#[tokio::test]
async fn test_forced_stop_is_bounded_by_grace() {
    let controller = ScriptedController::new().with_behavior(Behavior::IgnoreGraceful);
    let manager = scripted_manager(&controller, passing_probe());
    let config = manager
        .add_provider(NewProvider::new("stubborn", "mcp-stubborn"))
        .await
        .unwrap();
    let mut events = manager.subscribe();

    let grace = manager.settings().stop_grace();
    let started = Instant::now();
    let status = manager.stop_provider(&config.id).await.unwrap();
    let elapsed = started.elapsed();

    assert_eq!(status.status, ProviderState::Stopped);
    assert!(elapsed >= grace);
    assert!(elapsed < grace + Duration::from_secs(2));
    match next_event(&mut events).await {
        ProviderEvent::ProviderStopped { forced, .. } => assert!(forced),
        other => panic!("expected provider_stopped, got {other:?}"),
    }
}

#[tokio::test]
async fn test_crash_then_restart_clears_error() {
    let controller = ScriptedController::new();
    let manager = scripted_manager(&controller, passing_probe());
    let config = manager
        .add_provider(NewProvider::new("fs", "mcp-fs"))
        .await
        .unwrap();
    let pid = manager
        .get_provider_status(&config.id)
        .await
        .unwrap()
        .process_id
        .unwrap();
    let mut events = manager.subscribe();

    controller.crash(pid, 137);
    match next_event(&mut events).await {
        ProviderEvent::ProviderError { error, .. } => {
            assert_eq!(error.category, ErrorCategory::Exit);
            assert_eq!(error.provider_name, "fs");
        }
        other => panic!("expected provider_error, got {other:?}"),
    }

    let status = manager.start_provider(&config.id).await.unwrap();
    assert_eq!(status.status, ProviderState::Running);
    assert!(status.last_error.is_none());
    assert_ne!(status.process_id, Some(pid));
}

#[tokio::test]
async fn test_stop_racing_crash_reports_one_outcome() {
    let controller = ScriptedController::new();
    let manager = scripted_manager(&controller, passing_probe());
    let config = manager
        .add_provider(NewProvider::new("fs", "mcp-fs"))
        .await
        .unwrap();
    let pid = manager
        .get_provider_status(&config.id)
        .await
        .unwrap()
        .process_id
        .unwrap();
    let mut events = manager.subscribe();

    let (stopped, _) = tokio::join!(manager.stop_provider(&config.id), async {
        controller.crash(pid, 1)
    });
    let stopped = stopped.unwrap();

    assert!(matches!(
        stopped.status,
        ProviderState::Stopped | ProviderState::Error
    ));
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert_eq!(drain_names(&mut events).len(), 1);
}

#[tokio::test]
async fn test_remove_running_provider() {
    let controller = ScriptedController::new();
    let manager = scripted_manager(&controller, passing_probe());
    let config = manager
        .add_provider(NewProvider::new("fs", "mcp-fs"))
        .await
        .unwrap();
    let mut events = manager.subscribe();

    manager.remove_provider(&config.id).await.unwrap();

    assert_eq!(
        drain_names(&mut events),
        ["provider:stopped", "provider:removed"]
    );
    assert_eq!(controller.live_count(), 0);
    assert!(manager.get_all_provider_statuses().await.is_empty());
}

#[tokio::test]
async fn test_rename_does_not_require_restart() {
    let manager = scripted_manager(&ScriptedController::new(), passing_probe());
    let config = manager
        .add_provider(NewProvider::new("fs", "mcp-fs"))
        .await
        .unwrap();
    let mut events = manager.subscribe();

    let patch = UpdateProvider {
        name: Some("files".to_string()),
        ..UpdateProvider::default()
    };
    let update = manager.update_provider(&config.id, &patch).await.unwrap();

    assert!(!update.restart_required);
    assert_eq!(update.provider.id, config.id);
    match next_event(&mut events).await {
        ProviderEvent::ProviderUpdated {
            provider,
            restart_required,
            ..
        } => {
            assert_eq!(provider.name, "files");
            assert!(!restart_required);
        }
        other => panic!("expected provider_updated, got {other:?}"),
    }
}

#[tokio::test]
async fn test_listener_registration() {
    let manager = scripted_manager(&ScriptedController::new(), passing_probe());
    let seen = Arc::new(Mutex::new(Vec::new()));

    let sink = Arc::clone(&seen);
    let handle = manager.on(move |event| {
        sink.lock().unwrap().push(event.event_name());
    });

    manager
        .add_provider(NewProvider::new("fs", "mcp-fs"))
        .await
        .unwrap();
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert_eq!(
        *seen.lock().unwrap(),
        ["provider:added", "provider:started"]
    );

    manager.off(handle);
    tokio::task::yield_now().await;
    manager
        .add_provider(NewProvider::new("git", "mcp-git"))
        .await
        .unwrap();
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert_eq!(seen.lock().unwrap().len(), 2);
}

#[tokio::test]
async fn test_probe_failure_does_not_touch_status() {
    let controller = ScriptedController::new();
    let manager = scripted_manager(&controller, Arc::new(ScriptedProbe::failing()));
    let config = manager
        .add_provider(NewProvider::new("fs", "mcp-fs"))
        .await
        .unwrap();
    let before = manager.get_provider_status(&config.id).await.unwrap();

    let result = manager.test_provider(&config.id).await.unwrap();
    assert!(!result.success);
    assert!(result.error.is_some());

    let after = manager.get_provider_status(&config.id).await.unwrap();
    assert_eq!(after.status, ProviderState::Running);
    assert_eq!(after.process_id, before.process_id);
}

#[tokio::test]
async fn test_stats_reflect_mixed_states() {
    let controller = ScriptedController::new();
    let manager = scripted_manager(&controller, passing_probe());
    manager
        .add_provider(NewProvider::new("a", "mcp-a"))
        .await
        .unwrap();
    manager
        .add_provider(NewProvider::new("b", "mcp-b").with_auto_start(false))
        .await
        .unwrap();
    controller.set_behavior(Behavior::FailSpawn);
    manager
        .add_provider(NewProvider::new("c", "mcp-c"))
        .await
        .unwrap();

    let stats = manager.get_stats().await;
    assert_eq!(stats.total, 3);
    assert_eq!(stats.running, 1);
    assert_eq!(stats.stopped, 1);
    assert_eq!(stats.error, 1);
}
