//! `bienestar-replay` -- replay a saved drawing to the log.
//!
//! Reads a stroke recording (the JSON the drawing canvas saves, either as an
//! object or as a JSON-encoded string) and plays it back stroke by stroke,
//! logging each frame. Useful for inspecting a drawing without the portal.
//!
//! # Usage
//!
//! ```text
//! bienestar-replay <drawing.json>
//! ```
//!
//! # Environment variables
//!
//! | Variable       | Required | Default   | Description                        |
//! |----------------|----------|-----------|------------------------------------|
//! | `REPLAY_SPEED` | no       | `1`       | Speed multiplier: `1`, `2` or `4`  |
//! | `REPLAY_MODE`  | no       | `animate` | `animate` or `final`               |

use std::path::PathBuf;

use bienestar_core::drawing::DrawingPayload;
use bienestar_replay::player::{ReplayEvent, ReplayPlayer};
use bienestar_replay::speed::PlaybackSpeed;
use bienestar_replay::surface::LogSurface;
use tokio::sync::broadcast::error::RecvError;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    Animate,
    Final,
}

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "bienestar_replay=info,bienestar_core=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let path: PathBuf = std::env::args_os()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| {
            tracing::error!("usage: bienestar-replay <drawing.json>");
            std::process::exit(1);
        });

    let speed = std::env::var("REPLAY_SPEED")
        .ok()
        .and_then(|v| v.trim().parse::<u8>().ok())
        .and_then(PlaybackSpeed::from_multiplier)
        .unwrap_or_default();

    let mode = match std::env::var("REPLAY_MODE").as_deref() {
        Ok("final") => Mode::Final,
        _ => Mode::Animate,
    };

    let raw = std::fs::read_to_string(&path).unwrap_or_else(|e| {
        tracing::error!(path = %path.display(), error = %e, "Failed to read drawing file");
        std::process::exit(1);
    });

    // Files saved by the portal may hold the canvas JSON itself or that JSON
    // wrapped in a string.
    let payload = match serde_json::from_str::<serde_json::Value>(&raw) {
        Ok(value) => DrawingPayload::from_value(value),
        Err(_) => DrawingPayload::Serialized(raw),
    };

    let label = path.display().to_string();
    let mut player = ReplayPlayer::new(&payload, LogSurface::new(label.clone()));

    if !player.is_available() {
        tracing::warn!(drawing = %label, "Replay unavailable for this drawing");
        return;
    }

    tracing::info!(
        drawing = %label,
        strokes = player.total(),
        speed = speed.multiplier(),
        ?mode,
        "Starting replay",
    );

    if mode == Mode::Final {
        player.show_final();
        return;
    }

    player.set_speed(speed);
    let mut events = player.subscribe();
    player.start();

    loop {
        match events.recv().await {
            Ok(ReplayEvent::Finished { total }) => {
                tracing::info!(drawing = %label, total, "Replay finished");
                break;
            }
            Ok(_) | Err(RecvError::Lagged(_)) => {}
            Err(e @ RecvError::Closed) => {
                tracing::error!(error = %e, "Replay event stream closed");
                break;
            }
        }
    }
}
