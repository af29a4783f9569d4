//! Stroke-by-stroke replay of a recorded drawing.
//!
//! [`ReplayPlayer`] owns a [`Surface`] and a cursor (strokes rendered so
//! far). While playing, a tokio task ticks every
//! [`PlaybackSpeed::stroke_delay`] and renders one more stroke until the
//! cursor reaches the end.
//!
//! At most one ticker exists at a time: every control operation cancels the
//! current ticker's [`CancellationToken`] and bumps a generation counter
//! before doing anything else, so a tick already in flight from a cancelled
//! ticker is discarded.
//!
//! Lifecycle changes are broadcast as [`ReplayEvent`]s. Call
//! [`ReplayPlayer::subscribe`] to receive them.
//!
//! The player must be driven from inside a tokio runtime.

use std::sync::{Arc, Mutex, MutexGuard};

use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

use bienestar_core::drawing::{DrawingPayload, RecordingState, StrokeRecording};

use crate::speed::PlaybackSpeed;
use crate::surface::Surface;

/// Broadcast channel capacity for replay events.
const EVENT_CHANNEL_CAPACITY: usize = 256;

// ---------------------------------------------------------------------------
// Public types
// ---------------------------------------------------------------------------

/// Where the player is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaybackState {
    /// Nothing scheduled. Initial state and the state after a reset.
    Idle,
    /// A ticker is rendering strokes.
    Playing,
    /// Stopped mid-drawing; the cursor is retained for [`ReplayPlayer::resume`].
    Paused,
    /// Every stroke is on the surface.
    Finished,
}

/// Snapshot of how far a replay has got.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Progress {
    /// Strokes rendered so far.
    pub cursor: usize,
    /// Strokes in the recording.
    pub total: usize,
}

impl Progress {
    /// Completion rounded to the nearest whole percent; 0 for an empty recording.
    pub fn percent(&self) -> u8 {
        if self.total == 0 {
            return 0;
        }
        ((self.cursor as f64 / self.total as f64) * 100.0).round() as u8
    }
}

/// Lifecycle notification sent to every [`ReplayPlayer::subscribe`] receiver.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReplayEvent {
    /// Playback began from the first stroke on a cleared surface.
    Started { total: usize, speed: PlaybackSpeed },
    /// Playback continued from a retained cursor.
    Resumed { cursor: usize, speed: PlaybackSpeed },
    /// One more stroke was rendered.
    Advanced { cursor: usize, total: usize },
    SpeedChanged { cursor: usize, speed: PlaybackSpeed },
    Paused { cursor: usize },
    /// The ticker rendered the last stroke.
    Finished { total: usize },
    /// Surface cleared and cursor rewound to zero.
    Reset,
    /// The whole drawing was rendered at once.
    ShowedFinal { total: usize },
}

// ---------------------------------------------------------------------------
// Internals
// ---------------------------------------------------------------------------

/// State shared between the player and its ticker task.
struct Playback<S> {
    surface: S,
    cursor: usize,
    state: PlaybackState,
    /// Incremented on every control operation; a ticker only advances while
    /// its own generation is current.
    generation: u64,
}

struct Ticker {
    cancel: CancellationToken,
    handle: JoinHandle<()>,
}

enum Tick {
    Continue,
    Done,
}

fn lock<S>(shared: &Mutex<Playback<S>>) -> MutexGuard<'_, Playback<S>> {
    shared.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

// ---------------------------------------------------------------------------
// ReplayPlayer
// ---------------------------------------------------------------------------

/// Replays a [`StrokeRecording`] onto a [`Surface`] one stroke per tick.
///
/// Dropping the player cancels its ticker.
pub struct ReplayPlayer<S: Surface> {
    recording: Option<Arc<StrokeRecording>>,
    shared: Arc<Mutex<Playback<S>>>,
    speed: PlaybackSpeed,
    ticker: Option<Ticker>,
    event_tx: broadcast::Sender<ReplayEvent>,
}

impl<S: Surface> ReplayPlayer<S> {
    /// Decode `payload` and prepare a player on `surface`.
    ///
    /// An unusable payload yields a player whose controls are inert; see
    /// [`is_available`](Self::is_available).
    pub fn new(payload: &DrawingPayload, surface: S) -> Self {
        let recording = match payload.decode() {
            RecordingState::Available(recording) => Some(recording),
            RecordingState::Unavailable(_) => None,
        };
        Self::build(recording, surface)
    }

    pub fn from_recording(recording: StrokeRecording, surface: S) -> Self {
        let recording = (!recording.is_empty()).then_some(recording);
        Self::build(recording, surface)
    }

    fn build(recording: Option<StrokeRecording>, surface: S) -> Self {
        let (event_tx, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Self {
            recording: recording.map(Arc::new),
            shared: Arc::new(Mutex::new(Playback {
                surface,
                cursor: 0,
                state: PlaybackState::Idle,
                generation: 0,
            })),
            speed: PlaybackSpeed::default(),
            ticker: None,
            event_tx,
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<ReplayEvent> {
        self.event_tx.subscribe()
    }

    /// Whether there is anything to replay. When `false` every control is a no-op.
    pub fn is_available(&self) -> bool {
        self.recording.is_some()
    }

    /// Number of strokes in the recording; 0 when unavailable.
    pub fn total(&self) -> usize {
        self.recording.as_ref().map_or(0, |r| r.len())
    }

    pub fn state(&self) -> PlaybackState {
        lock(&self.shared).state
    }

    pub fn progress(&self) -> Progress {
        Progress {
            cursor: lock(&self.shared).cursor,
            total: self.total(),
        }
    }

    /// Speed used by the current or next ticker.
    pub fn speed(&self) -> PlaybackSpeed {
        self.speed
    }

    /// Whether a ticker task is currently alive.
    pub fn is_ticking(&self) -> bool {
        self.ticker.as_ref().is_some_and(|t| !t.handle.is_finished())
    }

    /// Run `f` against the surface.
    pub fn inspect_surface<R>(&self, f: impl FnOnce(&S) -> R) -> R {
        f(&lock(&self.shared).surface)
    }

    /// Clear the surface and play from the first stroke.
    ///
    /// Always restarts from zero, including after [`pause`](Self::pause).
    /// Returns `false` without scheduling anything when the recording is
    /// unavailable.
    pub fn start(&mut self) -> bool {
        self.cancel_ticker();
        let Some(recording) = self.recording.clone() else {
            tracing::debug!("Replay unavailable, start ignored");
            return false;
        };

        let generation = {
            let mut playback = lock(&self.shared);
            playback.generation += 1;
            playback.cursor = 0;
            playback.surface.clear();
            playback.state = PlaybackState::Playing;
            playback.generation
        };

        tracing::debug!(total = recording.len(), speed = ?self.speed, "Replay started");
        self.emit(ReplayEvent::Started {
            total: recording.len(),
            speed: self.speed,
        });
        self.spawn_ticker(recording, generation);
        true
    }

    /// Continue from the retained cursor without clearing.
    ///
    /// Returns `false` when there is nothing left to play.
    pub fn resume(&mut self) -> bool {
        let Some(recording) = self.recording.clone() else {
            return false;
        };
        if self.state() == PlaybackState::Playing && self.is_ticking() {
            return true;
        }
        self.cancel_ticker();

        let (generation, cursor) = {
            let mut playback = lock(&self.shared);
            if playback.cursor >= recording.len() {
                return false;
            }
            playback.generation += 1;
            playback.state = PlaybackState::Playing;
            (playback.generation, playback.cursor)
        };

        self.emit(ReplayEvent::Resumed {
            cursor,
            speed: self.speed,
        });
        self.spawn_ticker(recording, generation);
        true
    }

    /// Stop advancing. The cursor and the surface are kept.
    pub fn pause(&mut self) {
        self.cancel_ticker();
        let cursor = {
            let mut playback = lock(&self.shared);
            if playback.state != PlaybackState::Playing {
                return;
            }
            playback.generation += 1;
            playback.state = PlaybackState::Paused;
            playback.cursor
        };
        tracing::debug!(cursor, "Replay paused");
        self.emit(ReplayEvent::Paused { cursor });
    }

    /// Stop, clear the surface and rewind to zero.
    pub fn reset(&mut self) {
        self.cancel_ticker();
        {
            let mut playback = lock(&self.shared);
            playback.generation += 1;
            playback.cursor = 0;
            playback.surface.clear();
            playback.state = PlaybackState::Idle;
        }
        self.emit(ReplayEvent::Reset);
    }

    /// Stop and render the whole drawing at once.
    pub fn show_final(&mut self) {
        self.cancel_ticker();
        let Some(recording) = self.recording.clone() else {
            return;
        };
        {
            let mut playback = lock(&self.shared);
            playback.generation += 1;
            playback.surface.render(recording.strokes());
            playback.cursor = recording.len();
            playback.state = PlaybackState::Finished;
        }
        self.emit(ReplayEvent::ShowedFinal {
            total: recording.len(),
        });
    }

    /// Change the per-stroke delay.
    ///
    /// While playing, the ticker is replaced by one running at the new
    /// delay from the current cursor; no stroke is skipped or repeated.
    pub fn set_speed(&mut self, speed: PlaybackSpeed) {
        if speed == self.speed {
            return;
        }
        self.speed = speed;

        if self.state() != PlaybackState::Playing {
            return;
        }
        let Some(recording) = self.recording.clone() else {
            return;
        };
        self.cancel_ticker();

        let (generation, cursor) = {
            let mut playback = lock(&self.shared);
            playback.generation += 1;
            (playback.generation, playback.cursor)
        };

        tracing::debug!(cursor, ?speed, "Replay speed changed");
        self.emit(ReplayEvent::SpeedChanged { cursor, speed });
        self.spawn_ticker(recording, generation);
    }

    // ---- private helpers ----

    fn emit(&self, event: ReplayEvent) {
        // Zero receivers is fine.
        let _ = self.event_tx.send(event);
    }

    fn cancel_ticker(&mut self) {
        if let Some(ticker) = self.ticker.take() {
            ticker.cancel.cancel();
        }
    }

    fn spawn_ticker(&mut self, recording: Arc<StrokeRecording>, generation: u64) {
        let cancel = CancellationToken::new();
        let delay = self.speed.stroke_delay();
        let shared = Arc::clone(&self.shared);
        let event_tx = self.event_tx.clone();
        let token = cancel.clone();

        let handle = tokio::spawn(async move {
            let mut interval = tokio::time::interval_at(Instant::now() + delay, delay);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                tokio::select! {
                    biased;
                    _ = token.cancelled() => break,
                    _ = interval.tick() => {
                        if let Tick::Done = advance(&shared, &recording, generation, &event_tx) {
                            break;
                        }
                    }
                }
            }
        });

        self.ticker = Some(Ticker { cancel, handle });
    }
}

impl<S: Surface> Drop for ReplayPlayer<S> {
    fn drop(&mut self) {
        self.cancel_ticker();
    }
}

/// One render step: show one more stroke, finishing at the end.
fn advance<S: Surface>(
    shared: &Mutex<Playback<S>>,
    recording: &StrokeRecording,
    generation: u64,
    event_tx: &broadcast::Sender<ReplayEvent>,
) -> Tick {
    let mut playback = lock(shared);
    if playback.generation != generation || playback.state != PlaybackState::Playing {
        return Tick::Done;
    }

    let total = recording.len();
    if playback.cursor < total {
        playback.cursor += 1;
        let cursor = playback.cursor;
        playback.surface.render(&recording.strokes()[..cursor]);
        let _ = event_tx.send(ReplayEvent::Advanced { cursor, total });
    }

    if playback.cursor >= total {
        playback.state = PlaybackState::Finished;
        tracing::debug!(total, "Replay finished");
        let _ = event_tx.send(ReplayEvent::Finished { total });
        return Tick::Done;
    }
    Tick::Continue
}
