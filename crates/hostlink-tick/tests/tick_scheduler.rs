//! Integration tests for the fixed-rate poll scheduler.
//!
//! Uses `tokio::time::pause()` to control time deterministically.
//! All tests run with auto-advanced time so `sleep_until` resolves
//! instantly when we advance the clock.

use std::time::Duration;

use hostlink_tick::{TickConfig, TickScheduler};

// =========================================================================
// Helpers
// =========================================================================

fn config_20hz() -> TickConfig {
    TickConfig {
        tick_rate_hz: 20,
        initial_jitter_us: 0,
    }
}

// =========================================================================
// TickConfig
// =========================================================================

#[test]
fn test_default_config_is_30hz() {
    let cfg = TickConfig::default();
    assert_eq!(cfg.tick_rate_hz, 30);
}

#[test]
fn test_with_rate_sets_duration() {
    let cfg = TickConfig::with_rate(20);
    assert_eq!(cfg.tick_duration(), Duration::from_millis(50));
}

#[test]
fn test_validated_clamps_zero_rate_to_one() {
    let cfg = TickConfig {
        tick_rate_hz: 0,
        initial_jitter_us: 0,
    }
    .validated();
    assert_eq!(cfg.tick_rate_hz, 1);
}

#[test]
fn test_validated_clamps_excessive_rate_to_max() {
    let cfg = TickConfig {
        tick_rate_hz: 1_000,
        initial_jitter_us: 0,
    }
    .validated();
    assert_eq!(cfg.tick_rate_hz, TickConfig::MAX_TICK_RATE_HZ);
}

// =========================================================================
// Scheduler creation and accessors
// =========================================================================

#[test]
fn test_scheduler_initial_state() {
    let s = TickScheduler::new(config_20hz());
    assert_eq!(s.tick_count(), 0);
    assert_eq!(s.tick_rate_hz(), 20);
    assert!(!s.is_paused());
    assert_eq!(s.tick_duration(), Duration::from_millis(50));
}

#[test]
fn test_with_rate_constructor() {
    let s = TickScheduler::with_rate(10);
    assert_eq!(s.tick_rate_hz(), 10);
    assert_eq!(s.tick_duration(), Duration::from_millis(100));
}

// =========================================================================
// Tick firing
// =========================================================================

#[tokio::test(start_paused = true)]
async fn test_wait_for_tick_fires_and_increments() {
    let mut s = TickScheduler::new(config_20hz());

    let info = s.wait_for_tick().await;
    assert_eq!(info.tick, 1);
    assert_eq!(info.dt, Duration::from_millis(50));
    assert!(!info.overrun);
    assert_eq!(info.ticks_skipped, 0);
    assert_eq!(s.tick_count(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_multiple_ticks_increment_monotonically() {
    let mut s = TickScheduler::new(config_20hz());

    for expected in 1..=5 {
        let info = s.wait_for_tick().await;
        assert_eq!(info.tick, expected);
    }
    assert_eq!(s.tick_count(), 5);
}

#[tokio::test(start_paused = true)]
async fn test_dt_is_always_fixed() {
    let mut s = TickScheduler::new(config_20hz());

    let expected_dt = Duration::from_millis(50);
    for _ in 0..3 {
        let info = s.wait_for_tick().await;
        assert_eq!(info.dt, expected_dt);
    }
}

// =========================================================================
// Pause / Resume
// =========================================================================

#[tokio::test(start_paused = true)]
async fn test_pause_prevents_ticks() {
    let mut s = TickScheduler::new(config_20hz());

    // Fire one tick to confirm it works.
    s.wait_for_tick().await;
    assert_eq!(s.tick_count(), 1);

    s.pause();
    assert!(s.is_paused());

    // Should not fire while paused.
    let result = tokio::time::timeout(Duration::from_secs(1), s.wait_for_tick()).await;
    assert!(result.is_err(), "paused scheduler should pend");
}

#[tokio::test(start_paused = true)]
async fn test_resume_allows_ticks_again() {
    let mut s = TickScheduler::new(config_20hz());

    s.wait_for_tick().await;
    s.pause();
    s.resume();
    assert!(!s.is_paused());

    let info = s.wait_for_tick().await;
    assert_eq!(info.tick, 2);
}

#[tokio::test]
async fn test_pause_resume_idempotent() {
    let mut s = TickScheduler::new(config_20hz());

    // Multiple pauses shouldn't panic or change state.
    s.pause();
    s.pause();
    assert!(s.is_paused());

    s.resume();
    s.resume();
    assert!(!s.is_paused());
}

// =========================================================================
// Integration: select! loop pattern (mirrors real client usage)
// =========================================================================

#[tokio::test(start_paused = true)]
async fn test_select_loop_pattern() {
    let mut s = TickScheduler::new(config_20hz());

    let (tx, mut rx) = tokio::sync::mpsc::channel::<&str>(10);

    // Simulate: 3 ticks fire, then a "stop" command arrives.
    tokio::spawn(async move {
        // Send stop after ~160ms (3 ticks at 20Hz = 50ms each).
        tokio::time::sleep(Duration::from_millis(160)).await;
        tx.send("stop").await.ok();
    });

    let mut ticks_fired = 0u64;
    loop {
        tokio::select! {
            Some(cmd) = rx.recv() => {
                assert_eq!(cmd, "stop");
                break;
            }
            info = s.wait_for_tick() => {
                ticks_fired += 1;
                assert_eq!(info.tick, ticks_fired);
            }
        }
    }

    assert!(ticks_fired >= 3, "expected at least 3 ticks, got {ticks_fired}");
}
