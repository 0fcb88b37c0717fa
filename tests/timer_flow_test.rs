use chrono::NaiveDate;
use daytally::OutputFormat;
use daytally::accumulator::{DayKey, Duration, History, Reconciliation};
use daytally::commands::{history, timer};
use daytally::commands::timer::{SaveOutcome, StartOutcome};
use daytally::config::Config;
use daytally::state::State;
use daytally::ticker::TickerExit;
use daytally::utils::clock::FixedClock;
use tempfile::TempDir;

fn create_test_config(dir: &TempDir) -> Config {
    let mut config = Config::default();
    config.state.state_dir_override = Some(dir.path().to_path_buf());
    config.timer.tick_interval_ms = 5;
    config
}

fn day(d: u32) -> FixedClock {
    FixedClock(NaiveDate::from_ymd_opt(2023, 1, d).unwrap())
}

fn load_state(dir: &TempDir) -> State {
    State::load(dir.path().join("state.json")).unwrap()
}

fn seed_state(dir: &TempDir, state: &State) {
    state.save(dir.path().join("state.json")).unwrap();
}

#[tokio::test]
async fn test_start_reset_save_merges_same_day() {
    let dir = TempDir::new().unwrap();
    let config = create_test_config(&dir);
    let clock = day(17);

    let outcome = timer::start(&config, &clock, Some(3)).await.unwrap();
    assert_eq!(outcome, StartOutcome::Ran(TickerExit::LimitReached));

    let report = timer::status(&config, OutputFormat::Text).unwrap();
    assert_eq!(report.active, Some(Duration::new(3, 0, 0, "JAN|17|2023")));
    assert!(!report.running);

    assert!(timer::reset(&config).unwrap());
    assert!(load_state(&dir).awaiting_decision);

    // Starting is refused until the decision is made.
    let outcome = timer::start(&config, &clock, Some(1)).await.unwrap();
    assert_eq!(outcome, StartOutcome::AwaitingDecision);

    let saved = timer::save(&config).unwrap();
    assert_eq!(saved, SaveOutcome::Saved(Reconciliation::Started));

    timer::start(&config, &clock, Some(2)).await.unwrap();
    let saved = timer::save(&config).unwrap();
    assert_eq!(saved, SaveOutcome::Saved(Reconciliation::Merged));

    let entries = history::list(&config, OutputFormat::Json, None).unwrap();
    assert_eq!(entries, vec![Duration::new(5, 0, 0, "JAN|17|2023")]);

    let state = load_state(&dir);
    assert!(state.active_timer.is_none());
    assert!(!state.awaiting_decision);
}

#[tokio::test]
async fn test_stale_day_prompts_then_starts_new_entry() {
    let dir = TempDir::new().unwrap();
    let config = create_test_config(&dir);

    seed_state(
        &dir,
        &State {
            active_timer: Some(Duration::new(40, 10, 0, "JAN|17|2023")),
            saved_timers: History::from(vec![Duration::new(0, 0, 2, "JAN|16|2023")]),
            ..State::default()
        },
    );

    let outcome = timer::start(&config, &day(18), Some(1)).await.unwrap();
    assert_eq!(
        outcome,
        StartOutcome::StaleDay {
            day: DayKey::from("JAN|17|2023")
        }
    );
    let state = load_state(&dir);
    assert!(state.awaiting_decision);
    assert_eq!(
        state.active_timer,
        Some(Duration::new(40, 10, 0, "JAN|17|2023")),
        "a stale timer must not tick"
    );

    let saved = timer::save(&config).unwrap();
    assert_eq!(
        saved,
        SaveOutcome::Saved(Reconciliation::NewDay {
            previous: DayKey::from("JAN|16|2023")
        })
    );

    let entries = history::list(&config, OutputFormat::Text, None).unwrap();
    assert_eq!(
        entries,
        vec![
            Duration::new(40, 10, 0, "JAN|17|2023"),
            Duration::new(0, 0, 2, "JAN|16|2023"),
        ]
    );

    // A fresh timer for the new day can start now.
    let outcome = timer::start(&config, &day(18), Some(1)).await.unwrap();
    assert_eq!(outcome, StartOutcome::Ran(TickerExit::LimitReached));
    assert_eq!(
        load_state(&dir).active_timer,
        Some(Duration::new(1, 0, 0, "JAN|18|2023"))
    );
}

#[test]
fn test_rejected_save_keeps_active_timer() {
    let dir = TempDir::new().unwrap();
    let config = create_test_config(&dir);
    let head = Duration::new(0, 0, 10, "JAN|17|2023");
    let active = Duration::new(0, 0, 20, "JAN|17|2023");

    seed_state(
        &dir,
        &State {
            active_timer: Some(active.clone()),
            saved_timers: History::from(vec![head.clone()]),
            awaiting_decision: true,
            ..State::default()
        },
    );

    let saved = timer::save(&config).unwrap();
    assert!(matches!(
        saved,
        SaveOutcome::Saved(Reconciliation::Rejected(_))
    ));

    let state = load_state(&dir);
    assert_eq!(state.active_timer, Some(active));
    assert_eq!(state.saved_timers.head(), Some(&head));
    assert_eq!(state.saved_timers.len(), 1);
    assert!(state.awaiting_decision);

    assert!(timer::dismiss(&config).unwrap());
    let state = load_state(&dir);
    assert!(state.active_timer.is_none());
    assert!(!state.awaiting_decision);
    assert_eq!(state.saved_timers.len(), 1);
}

#[test]
fn test_cancel_keeps_active_timer() {
    let dir = TempDir::new().unwrap();
    let config = create_test_config(&dir);
    let active = Duration::new(5, 5, 0, "JAN|17|2023");

    seed_state(
        &dir,
        &State {
            active_timer: Some(active.clone()),
            ..State::default()
        },
    );

    assert!(timer::reset(&config).unwrap());
    timer::cancel(&config).unwrap();

    let state = load_state(&dir);
    assert_eq!(state.active_timer, Some(active));
    assert!(!state.awaiting_decision);
    assert!(state.saved_timers.is_empty());
}

#[test]
fn test_commands_without_active_timer() {
    let dir = TempDir::new().unwrap();
    let config = create_test_config(&dir);

    assert!(!timer::pause(&config).unwrap());
    assert!(!timer::reset(&config).unwrap());
    assert!(!timer::dismiss(&config).unwrap());
    assert_eq!(timer::save(&config).unwrap(), SaveOutcome::NothingToSave);
    assert!(history::list(&config, OutputFormat::Text, None).unwrap().is_empty());
}

#[test]
fn test_history_limit() {
    let dir = TempDir::new().unwrap();
    let config = create_test_config(&dir);

    seed_state(
        &dir,
        &State {
            saved_timers: History::from(vec![
                Duration::new(10, 22, 3, "JAN|17|2023"),
                Duration::new(50, 12, 1, "JAN|16|2023"),
                Duration::new(5, 34, 10, "JAN|15|2023"),
            ]),
            ..State::default()
        },
    );

    let entries = history::list(&config, OutputFormat::Text, Some(2)).unwrap();
    assert_eq!(entries.len(), 2);
    assert_eq!(entries[0].day.as_str(), "JAN|17|2023");
    assert_eq!(entries[1].day.as_str(), "JAN|16|2023");
}

#[test]
fn test_pause_after_ticker_died() {
    let dir = TempDir::new().unwrap();
    let config = create_test_config(&dir);

    // A ticker killed without Ctrl-C leaves `running` set.
    seed_state(
        &dir,
        &State {
            active_timer: Some(Duration::new(12, 0, 0, "JAN|17|2023")),
            running: true,
            ..State::default()
        },
    );

    let report = timer::status(&config, OutputFormat::Json).unwrap();
    assert!(!report.running);

    assert!(!timer::pause(&config).unwrap());
    assert!(!load_state(&dir).running);
}
