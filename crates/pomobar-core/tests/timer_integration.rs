//! Integration tests for the session timer.
//!
//! These drive a real engine against the manual clock and check the
//! observable contract: transitions, the long-break cadence, the
//! notification seam and the derived display signals.

use pomobar_core::{
    DurationProvider, Event, FixedDurations, ManualClock, MemoryStore, RecordingNotifier,
    SessionKind, Settings, TimerEngine,
};
use proptest::prelude::*;

fn engine_with<D: DurationProvider>(durations: D) -> (TimerEngine<D>, ManualClock, RecordingNotifier) {
    let clock = ManualClock::new();
    let notifier = RecordingNotifier::new();
    let engine = TimerEngine::new(durations, Box::new(clock.clone()), Box::new(notifier.clone()));
    (engine, clock, notifier)
}

/// Deliver `n` one-second ticks through the active clock subscription.
fn tick<D: DurationProvider>(engine: &mut TimerEngine<D>, clock: &ManualClock, n: u32) -> Vec<Event> {
    let mut events = Vec::new();
    for _ in 0..n {
        let Some(subscription) = clock.current() else {
            break;
        };
        if let Some(event) = engine.on_tick(subscription) {
            events.push(event);
        }
    }
    events
}

#[test]
fn test_work_session_scenario() {
    let (mut engine, clock, notifier) = engine_with(Settings::load(MemoryStore::new()));
    engine.start();

    let events = tick(&mut engine, &clock, 1500);

    assert_eq!(events.len(), 1);
    assert_eq!(notifier.completions(), vec![SessionKind::Work]);
    assert_eq!(engine.completed_work_sessions(), 1);
    assert_eq!(engine.session(), SessionKind::ShortBreak);
    assert_eq!(engine.remaining_secs(), engine.durations().duration_of(SessionKind::ShortBreak));
    assert!(!engine.is_running());
    assert!(clock.active().is_empty());
}

#[test]
fn test_auto_chain_scenario() {
    let (engine, clock, notifier) = engine_with(Settings::load(MemoryStore::new()));
    let mut engine = engine.with_auto_chain(true);
    engine.start();

    tick(&mut engine, &clock, 1500);

    assert_eq!(notifier.completions(), vec![SessionKind::Work]);
    assert!(engine.is_running());
    assert_eq!(engine.session(), SessionKind::ShortBreak);
    assert_eq!(clock.active().len(), 1);
    assert_eq!(clock.subscribe_count(), 2);

    // The new subscription keeps driving the break.
    tick(&mut engine, &clock, 10);
    assert_eq!(engine.remaining_secs(), 290.0);
}

#[test]
fn test_overlay_countdown_seen_by_poller() {
    let (mut engine, clock, _) = engine_with(FixedDurations::new(5.0, 60.0, 60.0));
    engine.start();

    let mut seen = Vec::new();
    loop {
        match engine.overlay_countdown() {
            Some(n) => seen.push(n),
            None => break,
        }
        tick(&mut engine, &clock, 1);
    }

    assert_eq!(seen, vec![5, 4, 3, 2, 1]);
    assert!(!engine.overlay_active());
    assert_eq!(engine.session(), SessionKind::ShortBreak);
}

#[test]
fn test_persisted_preferences_drive_durations() {
    let dir = tempfile::tempdir().unwrap();
    let store = pomobar_core::TomlFileStore::new(dir.path().join("config.toml"));
    {
        let mut settings = Settings::load(store.clone());
        settings.set_minutes(SessionKind::Work, 2);
    }

    let (mut engine, clock, _) = engine_with(Settings::load(store));
    assert_eq!(engine.remaining_secs(), 120.0);
    engine.start();
    let events = tick(&mut engine, &clock, 120);
    assert!(matches!(events.as_slice(), [Event::SessionCompleted { finished: SessionKind::Work, .. }]));
}

#[test]
fn test_config_edit_while_running_keeps_progress_in_range() {
    let (mut engine, clock, _) = engine_with(Settings::load(MemoryStore::new()));
    engine.start();
    tick(&mut engine, &clock, 300);
    engine.durations_mut().set_minutes(SessionKind::Work, 1);
    assert!(!engine.refresh_duration());
    assert!((0.0..=1.0).contains(&engine.progress()));
}

fn complete_cycles(engine: &mut TimerEngine<FixedDurations>, clock: &ManualClock, works: u32) -> Vec<SessionKind> {
    let mut after_work = Vec::new();
    for _ in 0..works {
        engine.start();
        tick(engine, clock, 3);
        after_work.push(engine.session());
        engine.skip();
    }
    after_work
}

#[test]
fn test_long_break_cadence() {
    let (mut engine, clock, _) = engine_with(FixedDurations::new(3.0, 2.0, 2.0));
    let after_work = complete_cycles(&mut engine, &clock, 7);

    use SessionKind::{LongBreak, ShortBreak};
    assert_eq!(
        after_work,
        vec![ShortBreak, ShortBreak, ShortBreak, LongBreak, ShortBreak, ShortBreak, ShortBreak]
    );
}

proptest! {
    #[test]
    fn prop_reset_all_restores_initial_state(
        work in 1u32..=60,
        short in 1u32..=30,
        long in 1u32..=30,
        ops in proptest::collection::vec(0u8..6, 0..40),
    ) {
        let durations = FixedDurations::new(
            f64::from(work) * 60.0,
            f64::from(short) * 60.0,
            f64::from(long) * 60.0,
        );
        let (mut engine, clock, _) = engine_with(durations);
        for op in ops {
            match op {
                0 => { engine.start(); }
                1 => { engine.pause(); }
                2 => { engine.skip(); }
                3 => { engine.reset(); }
                4 => { engine.advance(90.0); }
                _ => { engine.toggle(); }
            }
        }

        engine.reset_all();
        prop_assert_eq!(engine.session(), SessionKind::Work);
        prop_assert_eq!(engine.remaining_secs(), f64::from(work) * 60.0);
        prop_assert_eq!(engine.completed_work_sessions(), 0);
        prop_assert!(!engine.is_running());
        prop_assert!(clock.active().is_empty());
    }

    #[test]
    fn prop_ticking_full_remaining_always_changes_session(
        work in 1u32..=20,
        skips in 0usize..3,
    ) {
        let durations = FixedDurations::new(f64::from(work) * 60.0, 60.0, 120.0);
        let (mut engine, clock, _) = engine_with(durations);
        for _ in 0..skips {
            engine.skip();
        }
        let before = engine.session();
        let remaining = engine.remaining_secs() as u32;
        engine.start();

        tick(&mut engine, &clock, remaining - 1);
        prop_assert_eq!(engine.session(), before);
        prop_assert!(engine.is_running());

        tick(&mut engine, &clock, 1);
        prop_assert_ne!(engine.session(), before);
        prop_assert!(!engine.is_running());
    }

    #[test]
    fn prop_skip_never_counts_or_notifies(
        completions in 0u32..9,
        skips in 1usize..10,
    ) {
        let (mut engine, clock, notifier) = engine_with(FixedDurations::new(2.0, 1.0, 1.0));
        complete_cycles(&mut engine, &clock, completions);
        let count = engine.completed_work_sessions();
        let notified = notifier.completions().len();

        for _ in 0..skips {
            engine.skip();
        }
        prop_assert_eq!(engine.completed_work_sessions(), count);
        prop_assert_eq!(notifier.completions().len(), notified);
    }

    #[test]
    fn prop_progress_and_display_stay_consistent(elapsed in 0u32..1500) {
        let (mut engine, _, _) = engine_with(FixedDurations::default());
        engine.start();
        prop_assert_eq!(engine.progress(), 0.0);
        engine.advance(f64::from(elapsed.max(1)));
        let p = engine.progress();
        prop_assert!((0.0..=1.0).contains(&p));

        let remaining = engine.remaining_secs() as u32;
        let expected = format!("{:02}:{:02}", remaining / 60, remaining % 60);
        prop_assert_eq!(engine.display_text(), expected);
    }
}
