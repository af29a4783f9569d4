//! Integration tests for the replay player.
//!
//! All tests run on a paused tokio clock, so "waiting 500ms" advances
//! virtual time deterministically.

use std::time::Duration;

use assert_matches::assert_matches;
use serde_json::json;
use tokio::sync::broadcast;
use tokio::time::Instant;

use bienestar_core::drawing::{DrawingPayload, Point, Stroke, StrokeRecording};
use bienestar_replay::player::{PlaybackState, ReplayEvent, ReplayPlayer};
use bienestar_replay::speed::PlaybackSpeed;
use bienestar_replay::surface::MemorySurface;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn recording(strokes: usize) -> StrokeRecording {
    let strokes = (0..strokes)
        .map(|i| Stroke {
            points: vec![Point { x: i as f64, y: 0.0 }, Point { x: i as f64, y: 10.0 }],
            color: "#000000".into(),
            brush_radius: 3.0,
        })
        .collect();
    StrokeRecording::new(strokes)
}

fn player(strokes: usize) -> ReplayPlayer<MemorySurface> {
    ReplayPlayer::from_recording(recording(strokes), MemorySurface::new())
}

fn shown(player: &ReplayPlayer<MemorySurface>) -> usize {
    player.inspect_surface(|s| s.strokes_shown())
}

fn render_calls(player: &ReplayPlayer<MemorySurface>) -> usize {
    player.inspect_surface(|s| s.render_calls())
}

/// Receive events until `Finished`, returning every `Advanced` cursor seen.
async fn advanced_until_finished(rx: &mut broadcast::Receiver<ReplayEvent>) -> Vec<usize> {
    let mut cursors = Vec::new();
    loop {
        match rx.recv().await.expect("event channel should stay open") {
            ReplayEvent::Advanced { cursor, .. } => cursors.push(cursor),
            ReplayEvent::Finished { .. } => return cursors,
            _ => {}
        }
    }
}

// ---------------------------------------------------------------------------
// Test: a full run at 1x
// ---------------------------------------------------------------------------

/// Ten strokes at 50ms each finish after 500ms and stop rendering.
#[tokio::test(start_paused = true)]
async fn ten_strokes_finish_after_half_a_second() {
    let mut player = player(10);
    let mut rx = player.subscribe();
    let started = Instant::now();

    assert!(player.start());
    let cursors = advanced_until_finished(&mut rx).await;

    assert_eq!(started.elapsed(), Duration::from_millis(500));
    assert_eq!(cursors, (1..=10).collect::<Vec<_>>());
    assert_eq!(player.progress().cursor, 10);
    assert_eq!(player.progress().percent(), 100);
    assert_eq!(player.state(), PlaybackState::Finished);

    let calls = render_calls(&player);
    tokio::time::sleep(Duration::from_secs(1)).await;
    assert_eq!(render_calls(&player), calls, "no renders after finishing");
    assert!(!player.is_ticking());
}

#[tokio::test(start_paused = true)]
async fn start_clears_before_first_stroke() {
    let mut player = player(3);
    player.show_final();
    assert_eq!(shown(&player), 3);

    player.start();
    assert_eq!(shown(&player), 0);
    assert_eq!(player.progress().cursor, 0);

    tokio::time::sleep(Duration::from_millis(60)).await;
    assert_eq!(shown(&player), 1);
}

// ---------------------------------------------------------------------------
// Test: unavailable recordings
// ---------------------------------------------------------------------------

#[tokio::test(start_paused = true)]
async fn malformed_recording_schedules_nothing() {
    let payload = DrawingPayload::Serialized("not json at all".into());
    let mut player = ReplayPlayer::new(&payload, MemorySurface::new());

    assert!(!player.is_available());
    assert!(!player.start());
    assert!(!player.is_ticking());

    tokio::time::sleep(Duration::from_secs(1)).await;
    assert_eq!(render_calls(&player), 0);
    assert!(player.inspect_surface(|s| s.is_blank()));
    assert_eq!(player.state(), PlaybackState::Idle);
}

#[tokio::test(start_paused = true)]
async fn empty_recording_schedules_nothing() {
    let payload = DrawingPayload::Structured(json!({ "lines": [] }));
    let mut player = ReplayPlayer::new(&payload, MemorySurface::new());

    assert!(!player.start());
    player.show_final();
    assert!(!player.is_ticking());
    assert_eq!(render_calls(&player), 0);
    assert_eq!(player.progress().percent(), 0);
}

// ---------------------------------------------------------------------------
// Test: single active ticker
// ---------------------------------------------------------------------------

/// Restarting mid-play replaces the ticker instead of adding a second one.
#[tokio::test(start_paused = true)]
async fn double_start_keeps_one_ticker() {
    let mut player = player(10);
    let mut rx = player.subscribe();

    player.start();
    tokio::time::sleep(Duration::from_millis(120)).await;
    assert_eq!(render_calls(&player), 2);

    let restarted = Instant::now();
    player.start();
    player.start();

    // Drain events up to the final restart.
    let mut starts = 0;
    while starts < 3 {
        if let ReplayEvent::Started { .. } = rx.recv().await.unwrap() {
            starts += 1;
        }
    }

    let cursors = advanced_until_finished(&mut rx).await;
    assert_eq!(cursors, (1..=10).collect::<Vec<_>>());
    assert_eq!(restarted.elapsed(), Duration::from_millis(500));
    assert_eq!(render_calls(&player), 2 + 10);
}

// ---------------------------------------------------------------------------
// Test: speed changes
// ---------------------------------------------------------------------------

#[tokio::test(start_paused = true)]
async fn speed_change_keeps_cursor_and_sequence() {
    let mut player = player(10);
    let mut rx = player.subscribe();

    player.start();
    tokio::time::sleep(Duration::from_millis(260)).await;
    let before = player.progress().cursor;
    assert_eq!(before, 5);

    let changed = Instant::now();
    player.set_speed(PlaybackSpeed::Quadruple);
    assert_eq!(player.progress().cursor, before);
    assert_eq!(player.state(), PlaybackState::Playing);

    let cursors = advanced_until_finished(&mut rx).await;
    assert_eq!(cursors, (1..=10).collect::<Vec<_>>(), "no skipped or repeated strokes");
    assert_eq!(changed.elapsed(), Duration::from_millis(5 * 12));
    assert_eq!(render_calls(&player), 10);
}

#[tokio::test(start_paused = true)]
async fn speed_change_while_idle_applies_to_next_start() {
    let mut player = player(4);
    let mut rx = player.subscribe();

    player.set_speed(PlaybackSpeed::Double);
    assert!(!player.is_ticking());

    let started = Instant::now();
    player.start();
    advanced_until_finished(&mut rx).await;
    assert_eq!(started.elapsed(), Duration::from_millis(4 * 25));
}

// ---------------------------------------------------------------------------
// Test: pause / resume / reset / show_final
// ---------------------------------------------------------------------------

#[tokio::test(start_paused = true)]
async fn pause_keeps_cursor_and_stops_rendering() {
    let mut player = player(10);
    player.start();
    tokio::time::sleep(Duration::from_millis(160)).await;

    player.pause();
    assert_eq!(player.state(), PlaybackState::Paused);
    assert_eq!(player.progress().cursor, 3);

    tokio::time::sleep(Duration::from_secs(1)).await;
    assert_eq!(player.progress().cursor, 3);
    assert_eq!(shown(&player), 3);
}

/// Starting after a pause begins again from the first stroke.
#[tokio::test(start_paused = true)]
async fn start_after_pause_restarts_from_zero() {
    let mut player = player(10);
    player.start();
    tokio::time::sleep(Duration::from_millis(160)).await;
    player.pause();
    assert_eq!(player.progress().cursor, 3);

    let mut rx = player.subscribe();
    player.start();
    assert_eq!(player.progress().cursor, 0);
    assert!(player.inspect_surface(|s| s.is_blank()));

    let cursors = advanced_until_finished(&mut rx).await;
    assert_eq!(cursors, (1..=10).collect::<Vec<_>>());
}

#[tokio::test(start_paused = true)]
async fn resume_continues_from_cursor() {
    let mut player = player(6);
    player.start();
    tokio::time::sleep(Duration::from_millis(110)).await;
    player.pause();
    assert_eq!(player.progress().cursor, 2);

    let mut rx = player.subscribe();
    assert!(player.resume());
    assert_matches!(rx.recv().await, Ok(ReplayEvent::Resumed { cursor: 2, .. }));

    let cursors = advanced_until_finished(&mut rx).await;
    assert_eq!(cursors, vec![3, 4, 5, 6]);
    assert!(!player.resume(), "nothing left to resume");
}

#[tokio::test(start_paused = true)]
async fn reset_always_rewinds_and_blanks() {
    let mut player = player(5);

    // From playing.
    player.start();
    tokio::time::sleep(Duration::from_millis(110)).await;
    player.reset();
    assert_eq!(player.progress().cursor, 0);
    assert!(player.inspect_surface(|s| s.is_blank()));
    assert_eq!(player.state(), PlaybackState::Idle);

    tokio::time::sleep(Duration::from_secs(1)).await;
    assert!(player.inspect_surface(|s| s.is_blank()), "cancelled ticker must not draw");

    // From finished.
    player.show_final();
    player.reset();
    assert_eq!(player.progress().cursor, 0);
    assert!(player.inspect_surface(|s| s.is_blank()));

    // From idle.
    player.reset();
    assert_eq!(player.progress().cursor, 0);
}

#[tokio::test(start_paused = true)]
async fn show_final_renders_everything_from_any_state() {
    for total in [1usize, 3, 10] {
        // Idle.
        let mut p = player(total);
        p.show_final();
        assert_eq!(shown(&p), total);
        assert_eq!(p.progress().cursor, total);

        // Mid-play.
        let mut p = player(total);
        p.start();
        tokio::time::sleep(Duration::from_millis(30)).await;
        p.show_final();
        assert_eq!(shown(&p), total);
        assert_eq!(p.state(), PlaybackState::Finished);
        tokio::time::sleep(Duration::from_secs(1)).await;
        assert_eq!(shown(&p), total, "no ticker may redraw a prefix afterwards");

        // Paused.
        let mut p = player(total);
        p.start();
        p.pause();
        p.show_final();
        assert_eq!(shown(&p), total);

        // Already finished.
        p.show_final();
        assert_eq!(shown(&p), total);
    }
}

#[tokio::test(start_paused = true)]
async fn serialized_payload_plays() {
    let raw = recording(3).to_json().unwrap();
    let mut player = ReplayPlayer::new(&DrawingPayload::Serialized(raw), MemorySurface::new());
    let mut rx = player.subscribe();

    assert!(player.start());
    assert_eq!(advanced_until_finished(&mut rx).await, vec![1, 2, 3]);
}
