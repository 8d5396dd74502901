use std::time::{Duration, Instant};

use focusprompt::{PacingEngine, PacingEvent, PacingState};

fn init_tracing() {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();
}

#[test]
fn hello_world_at_rate_60_end_to_end() {
    init_tracing();
    // At 60 wpm the base delay is 1000ms; "world." holds for 2000ms.
    let t0 = Instant::now();
    let mut e = PacingEngine::new("Hello world.", 60);
    assert_eq!(e.token_count(), 2);

    e.play(t0);
    assert_eq!(e.cursor(), 0);
    assert_eq!(e.current_token().map(|t| t.as_str()), Some("Hello"));

    assert_eq!(e.poll(t0 + Duration::from_millis(999)), None);
    assert_eq!(
        e.poll(t0 + Duration::from_millis(1000)),
        Some(PacingEvent::Advanced { cursor: 1 })
    );
    assert_eq!(e.current_token().map(|t| t.as_str()), Some("world."));

    // The punctuated token holds for twice the base delay.
    assert_eq!(e.poll(t0 + Duration::from_millis(2999)), None);
    assert_eq!(
        e.poll(t0 + Duration::from_millis(3000)),
        Some(PacingEvent::Finished)
    );
    assert_eq!(e.state(), PacingState::Finished);
    assert!(!e.is_running());
}

#[test]
fn arbitrary_operation_sequences_keep_invariants() {
    init_tracing();
    // Cursor stays in [0, token_count - 1] and rate stays in [50, 1000]
    // regardless of operation order.
    let t0 = Instant::now();
    let mut e = PacingEngine::new("one two three four five", 250);

    let mut now = t0;
    for step in 0..200 {
        now += Duration::from_millis(37);
        match step % 7 {
            0 => e.toggle(now),
            1 => e.seek(3, now),
            2 => e.seek(-5, now),
            3 => e.adjust_rate(500),
            4 => e.adjust_rate(-5000),
            5 => {
                e.poll(now);
            }
            _ => e.set_rate(step as u32),
        }
        assert!(e.cursor() <= e.token_count());
        assert!((50..=1000).contains(&e.rate_wpm()));
        if e.state() == PacingState::Finished {
            assert!(!e.is_running());
        }
    }

    e.reset();
    assert_eq!(e.cursor(), 0);
    assert_eq!(e.state(), PacingState::Idle);
}

#[test]
fn seek_while_running_rearms_from_new_token() {
    init_tracing();
    let t0 = Instant::now();
    let mut e = PacingEngine::new("aa bb, cc", 250);
    e.play(t0);

    // Jump onto the comma token; the next delay comes from it (360ms),
    // measured from the seek, not from the original play.
    let seek_at = t0 + Duration::from_millis(100);
    e.seek(1, seek_at);
    assert_eq!(e.poll(seek_at + Duration::from_millis(359)), None);
    assert_eq!(
        e.poll(seek_at + Duration::from_millis(360)),
        Some(PacingEvent::Advanced { cursor: 2 })
    );
}
