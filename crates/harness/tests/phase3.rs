use refhist_core::{CancellationToken, DescriptorFlags, DescriptorProxy};
use refhist_engine::{
    EngineError, HistoryCoordinator, HistoryEventKind, HistoryQuery, OperationEvent, ResourceEvent,
};
use refhist_harness::{TestBench, flagged, rename};
use refhist_storage::StoreProvider;

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .with_test_writer()
        .try_init();
}

fn proxies(bench: &TestBench, project: &str) -> Result<Vec<DescriptorProxy>, Box<dyn std::error::Error>> {
    let history = bench
        .coordinator
        .get_project_history(project, HistoryQuery::all(), &CancellationToken::new())?
        .completed()
        .ok_or("cancelled")?;
    Ok(history.descriptors().to_vec())
}

// ============================================================================
// Connect / disconnect lifecycle (3 tests)
// ============================================================================

#[test]
fn reference_counted_connection() -> Result<(), Box<dyn std::error::Error>> {
    init_tracing();
    let bench = TestBench::new()?;
    assert_eq!(bench.coordinator.reference_count(), 1);
    assert_eq!(bench.bus.subscriber_count(), 1);

    bench.coordinator.connect();
    assert_eq!(bench.coordinator.reference_count(), 2);
    // Only the first reference subscribes
    assert_eq!(bench.bus.subscriber_count(), 1);

    bench.coordinator.disconnect()?;
    assert!(bench.coordinator.is_connected());
    assert_eq!(bench.bus.subscriber_count(), 1);

    bench.coordinator.disconnect()?;
    assert!(!bench.coordinator.is_connected());
    assert_eq!(bench.bus.subscriber_count(), 0);

    assert!(matches!(bench.coordinator.disconnect(), Err(EngineError::NotConnected)));
    assert!(matches!(bench.coordinator.undo_depth(), Err(EngineError::NotConnected)));
    assert!(matches!(
        bench.coordinator.handle_operation_event(OperationEvent::Done),
        Err(EngineError::NotConnected)
    ));
    Ok(())
}

#[test]
fn reconnect_starts_empty_but_keeps_logs() -> Result<(), Box<dyn std::error::Error>> {
    let bench = TestBench::new()?;
    bench.add_project("P")?;
    let pushed = bench.perform(rename(Some("P"), "a"))?;
    bench.coordinator.disconnect()?;

    // Notifications while disconnected go nowhere
    let _ = bench.perform_unknown();

    bench.coordinator.connect();
    assert_eq!(bench.coordinator.undo_depth()?, 0);
    assert_eq!(bench.coordinator.redo_depth()?, 0);
    assert!(bench.coordinator.cached_locations()?.is_empty());
    assert_eq!(proxies(&bench, "P")?, vec![pushed]);
    Ok(())
}

#[test]
fn connection_guard_disconnects_on_drop() -> Result<(), Box<dyn std::error::Error>> {
    let bench = TestBench::new()?;
    {
        let _guard = bench.coordinator.connection();
        assert_eq!(bench.coordinator.reference_count(), 2);
    }
    assert_eq!(bench.coordinator.reference_count(), 1);

    let clone: HistoryCoordinator = bench.coordinator.clone();
    clone.disconnect()?;
    assert!(!bench.coordinator.is_connected());
    Ok(())
}

// ============================================================================
// Resource lifecycle (2 tests)
// ============================================================================

#[test]
fn project_delete_clears_undo_and_redo_for_all_projects() -> Result<(), Box<dyn std::error::Error>> {
    let bench = TestBench::new()?;
    bench.add_project("P")?;
    bench.add_project("Q")?;
    bench.perform(rename(Some("P"), "a"))?;
    let in_q = bench.perform(rename(Some("Q"), "b"))?;
    bench.perform(rename(Some("Q"), "c"))?;
    bench.undo();
    assert!(bench.provider.exists(&bench.shared_location("P")));

    bench.delete_project("P");

    assert_eq!(bench.coordinator.undo_depth()?, 0);
    assert_eq!(bench.coordinator.redo_depth()?, 0);
    assert!(!bench.provider.exists(&bench.shared_location("P")));
    assert!(!bench.coordinator.cached_locations()?.contains(&bench.shared_location("P")));
    assert_eq!(proxies(&bench, "Q")?, vec![in_q]);
    Ok(())
}

#[test]
fn project_close_clears_stacks_and_keeps_log() -> Result<(), Box<dyn std::error::Error>> {
    let bench = TestBench::new()?;
    bench.add_project("P")?;
    bench.add_project("Q")?;
    let pushed = bench.perform(rename(Some("P"), "a"))?;
    bench.perform(rename(Some("Q"), "b"))?;
    bench.undo();

    // Closing Q wipes entries that belong to P as well
    bench.close_project("Q");
    assert_eq!(bench.coordinator.undo_depth()?, 0);
    assert_eq!(bench.coordinator.redo_depth()?, 0);
    assert_eq!(proxies(&bench, "P")?, vec![pushed]);
    Ok(())
}

// ============================================================================
// Deleting history (4 tests)
// ============================================================================

#[test]
fn delete_descriptors_honours_confirmation() -> Result<(), Box<dyn std::error::Error>> {
    let bench = TestBench::new()?;
    bench.add_project("P")?;
    let first = bench.perform(rename(Some("P"), "a"))?;
    let second = bench.perform(rename(Some("P"), "b"))?;
    let third = bench.perform(rename(Some("P"), "c"))?;
    bench.recorder.clear();
    let monitor = CancellationToken::new();

    let all = proxies(&bench, "P")?;
    let mut asked = Vec::new();
    let deleted = bench
        .coordinator
        .delete_descriptors(
            &all,
            |proxy| {
                asked.push(proxy.clone());
                *proxy == second
            },
            &monitor,
        )?
        .completed()
        .ok_or("cancelled")?;

    assert_eq!(deleted, 1);
    assert_eq!(asked.len(), 3);
    assert_eq!(proxies(&bench, "P")?, vec![third, first]);
    let history = bench.recorder.history_events();
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].kind, HistoryEventKind::Deleted);
    assert_eq!(history[0].proxy, second);

    let none = bench
        .coordinator
        .delete_descriptors(&all, |_| false, &monitor)?
        .completed()
        .ok_or("cancelled")?;
    assert_eq!(none, 0);

    monitor.cancel();
    assert!(bench.coordinator.delete_descriptors(&all, |_| true, &monitor)?.is_cancelled());
    assert_eq!(proxies(&bench, "P")?.len(), 2);
    Ok(())
}

#[test]
fn deleting_without_a_reachable_log_announces_nothing() -> Result<(), Box<dyn std::error::Error>> {
    let bench = TestBench::new()?;
    bench.add_project("P")?;
    let pushed = bench.perform(rename(Some("P"), "a"))?;
    bench.close_project("P");
    bench.recorder.clear();

    let deleted = bench
        .coordinator
        .delete_descriptors(&[pushed], |_| true, &CancellationToken::new())?
        .completed()
        .ok_or("cancelled")?;
    assert_eq!(deleted, 0);
    assert!(bench.recorder.history_events().is_empty());

    // The closed project's log is left as it was
    bench.workspace.set_open("P", true);
    assert_eq!(proxies(&bench, "P")?.len(), 1);
    Ok(())
}

#[test]
fn delete_project_history_removes_shared_and_local_logs() -> Result<(), Box<dyn std::error::Error>> {
    let bench = TestBench::new()?;
    bench.add_project("P")?;
    bench.perform(rename(Some("P"), "a"))?;
    bench.perform(rename(None, "b"))?;
    let monitor = CancellationToken::new();

    assert!(!bench.coordinator.delete_project_history("P", &monitor)?.is_cancelled());
    assert!(proxies(&bench, "P")?.is_empty());
    assert!(!bench.provider.exists(&bench.shared_location("P")));

    let workspace = bench.coordinator.locations().workspace();
    assert!(bench.provider.exists(&workspace));
    bench.coordinator.delete_project_history(".workspace", &monitor)?;
    assert!(!bench.provider.exists(&workspace));

    bench.workspace.set_open("P", false);
    assert!(matches!(
        bench.coordinator.delete_project_history("P", &monitor),
        Err(EngineError::ProjectUnavailable(_))
    ));
    Ok(())
}

#[test]
fn failed_log_delete_is_reported() -> Result<(), Box<dyn std::error::Error>> {
    let bench = TestBench::new()?;
    bench.add_project("P")?;
    bench.perform(rename(Some("P"), "a"))?;
    bench.provider.fail_location(bench.shared_location("P"));

    let result = bench
        .coordinator
        .delete_project_history("P", &CancellationToken::new());
    assert!(matches!(result, Err(EngineError::Storage(_))));
    Ok(())
}

// ============================================================================
// Concurrent notifications (1 test)
// ============================================================================

#[test]
fn project_delete_racing_undo_redo_keeps_stacks_consistent() -> Result<(), Box<dyn std::error::Error>> {
    init_tracing();
    let bench = TestBench::new()?;
    bench.add_project("P")?;
    bench.add_project("Q")?;
    let bus = &bench.bus;

    std::thread::scope(|scope| {
        let deleter = scope.spawn(|| {
            for _ in 0..100 {
                bus.emit_resource(ResourceEvent::ProjectAboutToBeDeleted("Q".to_string()));
            }
        });
        // Rejected undo/redo after a concurrent clear are logged by the sink
        for index in 0..100 {
            bus.emit_operation(OperationEvent::AboutToExecute(Some(rename(Some("P"), &format!("e{index}")))));
            bus.emit_operation(OperationEvent::Done);
            if index % 3 == 0 {
                bus.emit_operation(OperationEvent::AboutToUndo);
                bus.emit_operation(OperationEvent::Undone);
            }
            if index % 6 == 0 {
                bus.emit_operation(OperationEvent::AboutToRedo);
                bus.emit_operation(OperationEvent::Redone);
            }
        }
        assert!(deleter.join().is_ok());
    });

    assert!(bench.coordinator.is_connected());
    let undo = bench.undo_stamps()?;
    let redo = bench.redo_stamps()?;
    assert!(undo.len() <= 5);
    assert!(undo.windows(2).all(|pair| pair[0] > pair[1]));
    if let Some(newest_undo) = undo.first() {
        assert!(redo.iter().all(|stamp| stamp > newest_undo));
    }

    // Undo entries are in the log, redo entries are not
    let logged: Vec<u64> = proxies(&bench, "P")?.iter().map(DescriptorProxy::timestamp).collect();
    assert!(undo.iter().all(|stamp| logged.contains(stamp)));
    assert!(redo.iter().all(|stamp| !logged.contains(stamp)));

    bench.perform(rename(Some("P"), "after"))?;
    assert_eq!(bench.coordinator.undo_depth()?, undo.len().min(4) + 1);
    Ok(())
}

// ============================================================================
// Storage mode (2 tests)
// ============================================================================

#[test]
fn enabling_project_history_moves_log_into_project() -> Result<(), Box<dyn std::error::Error>> {
    let bench = TestBench::new()?;
    bench.add_project("P")?;
    let pushed = bench.perform(rename(Some("P"), "a"))?;
    let monitor = CancellationToken::new();
    let shared = bench.shared_location("P");
    let local = bench.local_location("P").ok_or("no project folder")?;
    assert!(!bench.coordinator.has_project_history("P"));

    let moved = bench
        .coordinator
        .set_project_history_mode("P", true, &monitor)?
        .completed()
        .ok_or("cancelled")?;
    assert!(moved);
    assert!(bench.coordinator.has_project_history("P"));
    assert!(bench.provider.exists(&local));
    assert!(!bench.provider.exists(&shared));
    assert_eq!(proxies(&bench, "P")?, vec![pushed.clone()]);

    let moved_back = bench
        .coordinator
        .set_project_history_mode("P", false, &monitor)?
        .completed()
        .ok_or("cancelled")?;
    assert!(moved_back);
    assert!(bench.provider.exists(&shared));
    assert!(!bench.provider.exists(&local));
    assert_eq!(proxies(&bench, "P")?, vec![pushed]);
    Ok(())
}

#[test]
fn storage_mode_needs_an_open_project() -> Result<(), Box<dyn std::error::Error>> {
    let bench = TestBench::new()?;
    bench.add_project("P")?;
    let monitor = CancellationToken::new();

    // Nothing recorded yet, so nothing moves
    let moved = bench
        .coordinator
        .set_project_history_mode("P", true, &monitor)?
        .completed()
        .ok_or("cancelled")?;
    assert!(!moved);
    assert!(bench.coordinator.has_project_history("P"));

    bench.workspace.set_open("P", false);
    assert!(matches!(
        bench.coordinator.set_project_history_mode("P", false, &monitor),
        Err(EngineError::ProjectUnavailable(_))
    ));
    Ok(())
}

// ============================================================================
// Sessions (2 tests)
// ============================================================================

#[test]
fn written_session_reads_back_with_filter() -> Result<(), Box<dyn std::error::Error>> {
    let bench = TestBench::new()?;
    bench.add_project("P")?;
    let plain = rename(Some("P"), "a");
    let breaking = flagged(Some("P"), "run", DescriptorFlags::BREAKING_CHANGE);
    let plain_proxy = bench.perform(plain.clone())?;
    let breaking_proxy = bench.perform(breaking.clone())?;
    let missing = DescriptorProxy::new(Some("P"), "never performed", 7);
    let monitor = CancellationToken::new();

    let mut buffer = Vec::new();
    let written = bench
        .coordinator
        .write_descriptors(
            &[plain_proxy.clone(), breaking_proxy.clone(), missing],
            &mut buffer,
            DescriptorFlags::NONE,
            &monitor,
        )?
        .completed()
        .ok_or("cancelled")?;
    assert_eq!(written, 2);

    let read = HistoryCoordinator::read_session(&buffer[..], DescriptorFlags::NONE)?;
    assert_eq!(
        read,
        vec![
            plain.stamped(plain_proxy.timestamp()),
            breaking.clone().stamped(breaking_proxy.timestamp())
        ]
    );

    let only_breaking = HistoryCoordinator::read_session(&buffer[..], DescriptorFlags::BREAKING_CHANGE)?;
    assert_eq!(only_breaking, vec![breaking.stamped(breaking_proxy.timestamp())]);

    let history = HistoryCoordinator::read_session_history(&buffer[..], DescriptorFlags::NONE)?;
    assert_eq!(history.descriptors(), &[plain_proxy, breaking_proxy]);
    Ok(())
}

#[test]
fn writing_connects_for_the_duration_of_the_call() -> Result<(), Box<dyn std::error::Error>> {
    let bench = TestBench::new()?;
    bench.add_project("P")?;
    let plain_proxy = bench.perform(rename(Some("P"), "a"))?;
    let breaking_proxy = bench.perform(flagged(Some("P"), "run", DescriptorFlags::BREAKING_CHANGE))?;
    bench.coordinator.disconnect()?;
    assert!(!bench.coordinator.is_connected());

    let mut buffer = Vec::new();
    let written = bench
        .coordinator
        .write_descriptors(
            &[plain_proxy, breaking_proxy.clone()],
            &mut buffer,
            DescriptorFlags::BREAKING_CHANGE,
            &CancellationToken::new(),
        )?
        .completed()
        .ok_or("cancelled")?;

    assert_eq!(written, 1);
    assert_eq!(bench.coordinator.reference_count(), 0);
    let history = HistoryCoordinator::read_session_history(&buffer[..], DescriptorFlags::NONE)?;
    assert_eq!(history.descriptors(), &[breaking_proxy]);

    assert!(HistoryCoordinator::read_session(&b"not a session"[..], DescriptorFlags::NONE).is_err());
    Ok(())
}
