//! Drawing surfaces the player renders onto.
//!
//! A [`Surface`] only ever receives whole prefixes of the recording:
//! `render` replaces whatever was shown before, the same way the canvas
//! reloads its save data.

use bienestar_core::drawing::Stroke;

pub trait Surface: Send + 'static {
    /// Remove everything from the surface.
    fn clear(&mut self);

    /// Show exactly `strokes`, replacing the previous content.
    fn render(&mut self, strokes: &[Stroke]);
}

/// Headless surface that only counts what it was asked to draw.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct MemorySurface {
    shown: usize,
    render_calls: usize,
    clears: usize,
}

impl MemorySurface {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of strokes currently on the surface.
    pub fn strokes_shown(&self) -> usize {
        self.shown
    }

    pub fn render_calls(&self) -> usize {
        self.render_calls
    }

    pub fn clears(&self) -> usize {
        self.clears
    }

    pub fn is_blank(&self) -> bool {
        self.shown == 0
    }
}

impl Surface for MemorySurface {
    fn clear(&mut self) {
        self.shown = 0;
        self.clears += 1;
    }

    fn render(&mut self, strokes: &[Stroke]) {
        self.shown = strokes.len();
        self.render_calls += 1;
    }
}

/// Surface that reports each frame through `tracing`.
#[derive(Debug, Clone)]
pub struct LogSurface {
    label: String,
}

impl LogSurface {
    pub fn new(label: impl Into<String>) -> Self {
        Self { label: label.into() }
    }
}

impl Surface for LogSurface {
    fn clear(&mut self) {
        tracing::info!(drawing = %self.label, "Surface cleared");
    }

    fn render(&mut self, strokes: &[Stroke]) {
        let points: usize = strokes.iter().map(|s| s.points.len()).sum();
        let last_color = strokes.last().map(|s| s.color.as_str()).unwrap_or("-");
        tracing::info!(
            drawing = %self.label,
            strokes = strokes.len(),
            points,
            last_color,
            "Frame rendered",
        );
    }
}
