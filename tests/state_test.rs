use daytally::accumulator::{Duration, History};
use daytally::state::{State, with_state_lock};
use std::thread;
use std::time::Duration as StdDuration;
use tempfile::tempdir;

#[test]
fn test_state_creation() {
    let dir = tempdir().unwrap();
    let state_path = dir.path().join("state.json");

    let state = State::default();
    state.save(&state_path).unwrap();

    let loaded = State::load(&state_path).unwrap();
    assert!(loaded.active_timer.is_none());
    assert!(loaded.saved_timers.is_empty());
    assert_eq!(loaded.version, "1.0.0");
}

#[test]
fn test_state_uses_storage_keys() {
    let dir = tempdir().unwrap();
    let state_path = dir.path().join("state.json");

    let state = State {
        active_timer: Some(Duration::new(3, 2, 1, "JAN|18|2023")),
        saved_timers: History::from(vec![Duration::new(10, 22, 3, "JAN|17|2023")]),
        ..State::default()
    };
    state.save(&state_path).unwrap();

    let raw: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&state_path).unwrap()).unwrap();
    assert_eq!(raw["activeTimer"]["date"], "JAN|18|2023");
    assert_eq!(raw["savedTimers"][0]["minutes"], 22);

    assert_eq!(State::load(&state_path).unwrap(), state);
}

#[test]
fn test_concurrent_lock() {
    let dir = tempdir().unwrap();
    let state_path = dir.path().join("state.json");
    let lock_path = dir.path().join("state.lock");

    State::default().save(&state_path).unwrap();

    let lock_path_clone = lock_path.clone();
    let state_path_clone = state_path.clone();

    // Spawn a thread that holds the lock for 500ms
    let handle = thread::spawn(move || {
        with_state_lock(&lock_path_clone, &state_path_clone, |state| {
            state.version = "locked".to_string();
            thread::sleep(StdDuration::from_millis(500));
            Ok(())
        })
        .unwrap();
    });

    thread::sleep(StdDuration::from_millis(100));

    let start = std::time::Instant::now();
    with_state_lock(&lock_path, &state_path, |state| {
        assert_eq!(state.version, "locked");
        state.version = "updated".to_string();
        Ok(())
    })
    .unwrap();

    assert!(
        start.elapsed().as_millis() >= 400,
        "Should have waited for lock"
    );

    handle.join().unwrap();

    let final_state = State::load(&state_path).unwrap();
    assert_eq!(final_state.version, "updated");
}

#[test]
fn test_failed_closure_does_not_save() {
    let dir = tempdir().unwrap();
    let state_path = dir.path().join("state.json");
    let lock_path = dir.path().join("state.lock");

    let result: anyhow::Result<()> = with_state_lock(&lock_path, &state_path, |state| {
        state.running = true;
        anyhow::bail!("nope")
    });

    assert!(result.is_err());
    assert!(!State::load(&state_path).unwrap().running);
}
