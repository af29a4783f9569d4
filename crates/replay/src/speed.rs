//! Playback speed table.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Per-stroke delay at normal speed. Also used for unknown multipliers.
pub const BASE_STROKE_DELAY: Duration = Duration::from_millis(50);

/// User-selectable replay speed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum PlaybackSpeed {
    #[default]
    Normal,
    Double,
    Quadruple,
}

impl PlaybackSpeed {
    pub const ALL: [PlaybackSpeed; 3] = [
        PlaybackSpeed::Normal,
        PlaybackSpeed::Double,
        PlaybackSpeed::Quadruple,
    ];

    pub fn from_multiplier(multiplier: u8) -> Option<Self> {
        match multiplier {
            1 => Some(PlaybackSpeed::Normal),
            2 => Some(PlaybackSpeed::Double),
            4 => Some(PlaybackSpeed::Quadruple),
            _ => None,
        }
    }

    pub fn multiplier(&self) -> u8 {
        match self {
            PlaybackSpeed::Normal => 1,
            PlaybackSpeed::Double => 2,
            PlaybackSpeed::Quadruple => 4,
        }
    }

    /// Time between two rendered strokes.
    pub fn stroke_delay(&self) -> Duration {
        match self {
            PlaybackSpeed::Normal => BASE_STROKE_DELAY,
            PlaybackSpeed::Double => Duration::from_millis(25),
            // 50 / 4, truncated to whole milliseconds.
            PlaybackSpeed::Quadruple => Duration::from_millis(12),
        }
    }
}

/// Delay for a raw multiplier, falling back to [`BASE_STROKE_DELAY`].
pub fn delay_for_multiplier(multiplier: u8) -> Duration {
    PlaybackSpeed::from_multiplier(multiplier)
        .map(|s| s.stroke_delay())
        .unwrap_or(BASE_STROKE_DELAY)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn delays_match_table() {
        assert_eq!(delay_for_multiplier(1), Duration::from_millis(50));
        assert_eq!(delay_for_multiplier(2), Duration::from_millis(25));
        assert_eq!(delay_for_multiplier(4), Duration::from_millis(12));
    }

    #[test]
    fn unknown_multiplier_falls_back() {
        assert_eq!(delay_for_multiplier(3), BASE_STROKE_DELAY);
        assert_eq!(delay_for_multiplier(0), BASE_STROKE_DELAY);
        assert!(PlaybackSpeed::from_multiplier(8).is_none());
    }

    #[test]
    fn multiplier_round_trips() {
        for speed in PlaybackSpeed::ALL {
            assert_eq!(PlaybackSpeed::from_multiplier(speed.multiplier()), Some(speed));
        }
    }
}
