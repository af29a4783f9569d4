//! Stroke recordings captured by the freehand drawing surface.
//!
//! A recording is persisted by the backend as an opaque blob which may come
//! back either as a JSON object or as a JSON document serialized into a
//! string. [`DrawingPayload`] models both shapes explicitly and
//! [`DrawingPayload::decode`] turns them into a [`RecordingState`]:
//! anything that cannot be replayed becomes
//! [`RecordingState::Unavailable`] instead of an error.
//!
//! Wire shape:
//!
//! ```json
//! { "lines": [ { "points": [[10, 20], [11, 22]], "color": "#000", "brushRadius": 3 } ] }
//! ```
//!
//! Points are also accepted as `{ "x": .., "y": .. }` objects and the stroke
//! color as `brushColor`, which is what the canvas library emits natively.

use serde::{Deserialize, Serialize};

/// Stroke color used when the recording does not carry one.
pub const DEFAULT_STROKE_COLOR: &str = "#000000";

/// Brush radius used when the recording does not carry one.
pub const DEFAULT_BRUSH_RADIUS: f64 = 3.0;

// ---------------------------------------------------------------------------
// Points and strokes
// ---------------------------------------------------------------------------

/// A single sampled pen position.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(from = "WirePoint", into = "[f64; 2]")]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum WirePoint {
    Pair([f64; 2]),
    Object { x: f64, y: f64 },
}

impl From<WirePoint> for Point {
    fn from(wire: WirePoint) -> Self {
        match wire {
            WirePoint::Pair([x, y]) => Point { x, y },
            WirePoint::Object { x, y } => Point { x, y },
        }
    }
}

impl From<Point> for [f64; 2] {
    fn from(p: Point) -> Self {
        [p.x, p.y]
    }
}

/// One continuous pen-down-to-pen-up path.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Stroke {
    pub points: Vec<Point>,
    #[serde(alias = "brushColor", default = "default_color")]
    pub color: String,
    #[serde(rename = "brushRadius", default = "default_radius")]
    pub brush_radius: f64,
}

fn default_color() -> String {
    DEFAULT_STROKE_COLOR.to_string()
}

fn default_radius() -> f64 {
    DEFAULT_BRUSH_RADIUS
}

// ---------------------------------------------------------------------------
// StrokeRecording
// ---------------------------------------------------------------------------

/// The full ordered set of strokes forming one completed drawing.
///
/// Immutable once decoded; replay works on prefixes via
/// [`prefix`](Self::prefix).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StrokeRecording {
    #[serde(rename = "lines")]
    strokes: Vec<Stroke>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    width: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    height: Option<f64>,
}

impl StrokeRecording {
    pub fn new(strokes: Vec<Stroke>) -> Self {
        Self {
            strokes,
            width: None,
            height: None,
        }
    }

    /// Attach the canvas dimensions the drawing was captured on.
    pub fn with_canvas(mut self, width: f64, height: f64) -> Self {
        self.width = Some(width);
        self.height = Some(height);
        self
    }

    pub fn strokes(&self) -> &[Stroke] {
        &self.strokes
    }

    pub fn len(&self) -> usize {
        self.strokes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.strokes.is_empty()
    }

    /// Canvas dimensions, when the recording carries them.
    pub fn canvas(&self) -> Option<(f64, f64)> {
        self.width.zip(self.height)
    }

    /// A recording holding only the first `count` strokes (clamped to the
    /// length), keeping the canvas dimensions.
    pub fn prefix(&self, count: usize) -> StrokeRecording {
        let end = count.min(self.strokes.len());
        StrokeRecording {
            strokes: self.strokes[..end].to_vec(),
            width: self.width,
            height: self.height,
        }
    }

    /// Serialize back into the wire shape.
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}

// ---------------------------------------------------------------------------
// Boundary decoding
// ---------------------------------------------------------------------------

/// A stroke recording exactly as it arrives from storage.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum DrawingPayload {
    /// No drawing data attached (e.g. an uploaded image rather than a canvas).
    #[default]
    Missing,
    /// A JSON document serialized into a string.
    Serialized(String),
    /// A JSON value embedded directly.
    Structured(serde_json::Value),
}

/// Why a payload cannot be replayed.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum UnavailableReason {
    #[error("no drawing data")]
    Missing,
    #[error("malformed drawing data: {0}")]
    Malformed(String),
    #[error("drawing has no strokes")]
    Empty,
}

/// Result of decoding a [`DrawingPayload`].
#[derive(Debug, Clone, PartialEq)]
pub enum RecordingState {
    Available(StrokeRecording),
    Unavailable(UnavailableReason),
}

impl RecordingState {
    pub fn is_available(&self) -> bool {
        matches!(self, RecordingState::Available(_))
    }

    pub fn recording(&self) -> Option<&StrokeRecording> {
        match self {
            RecordingState::Available(recording) => Some(recording),
            RecordingState::Unavailable(_) => None,
        }
    }
}

impl DrawingPayload {
    /// Classify an arbitrary JSON value.
    pub fn from_value(value: serde_json::Value) -> Self {
        match value {
            serde_json::Value::Null => DrawingPayload::Missing,
            serde_json::Value::String(s) => DrawingPayload::Serialized(s),
            other => DrawingPayload::Structured(other),
        }
    }

    /// Decode into a replayable recording.
    ///
    /// Never fails: unusable input yields [`RecordingState::Unavailable`]
    /// and a logged diagnostic.
    pub fn decode(&self) -> RecordingState {
        let parsed = match self {
            DrawingPayload::Missing => Err(UnavailableReason::Missing),
            DrawingPayload::Serialized(raw) => serde_json::from_str::<StrokeRecording>(raw)
                .map_err(|e| UnavailableReason::Malformed(e.to_string())),
            DrawingPayload::Structured(value) => {
                StrokeRecording::deserialize(value).map_err(|e| UnavailableReason::Malformed(e.to_string()))
            }
        };

        match parsed {
            Ok(recording) if recording.is_empty() => {
                tracing::warn!(reason = %UnavailableReason::Empty, "Drawing replay unavailable");
                RecordingState::Unavailable(UnavailableReason::Empty)
            }
            Ok(recording) => RecordingState::Available(recording),
            Err(reason) => {
                tracing::warn!(reason = %reason, "Drawing replay unavailable");
                RecordingState::Unavailable(reason)
            }
        }
    }
}

impl From<StrokeRecording> for DrawingPayload {
    fn from(recording: StrokeRecording) -> Self {
        match serde_json::to_value(&recording) {
            Ok(value) => DrawingPayload::Structured(value),
            Err(_) => DrawingPayload::Missing,
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;
    use serde_json::json;

    use super::*;

    fn two_stroke_json() -> serde_json::Value {
        json!({
            "lines": [
                { "points": [[0, 0], [1, 1]], "color": "#ff0000", "brushRadius": 2 },
                { "points": [[5, 5]], "color": "#00ff00", "brushRadius": 4 }
            ],
            "width": 800,
            "height": 600
        })
    }

    #[test]
    fn structured_payload_decodes() {
        let state = DrawingPayload::Structured(two_stroke_json()).decode();
        let recording = state.recording().expect("should be available");

        assert_eq!(recording.len(), 2);
        assert_eq!(recording.strokes()[0].color, "#ff0000");
        assert_eq!(recording.strokes()[1].points, vec![Point { x: 5.0, y: 5.0 }]);
        assert_eq!(recording.canvas(), Some((800.0, 600.0)));
    }

    #[test]
    fn serialized_payload_decodes_like_structured() {
        let raw = two_stroke_json().to_string();
        let from_string = DrawingPayload::Serialized(raw).decode();
        let from_object = DrawingPayload::Structured(two_stroke_json()).decode();
        assert_eq!(from_string, from_object);
    }

    #[test]
    fn canvas_library_shape_is_accepted() {
        let value = json!({
            "lines": [
                { "points": [{ "x": 1.5, "y": 2.5 }], "brushColor": "#123456", "brushRadius": 6 }
            ]
        });
        let state = DrawingPayload::Structured(value).decode();
        let stroke = &state.recording().unwrap().strokes()[0];

        assert_eq!(stroke.points[0], Point { x: 1.5, y: 2.5 });
        assert_eq!(stroke.color, "#123456");
        assert_eq!(stroke.brush_radius, 6.0);
    }

    #[test]
    fn stroke_metadata_defaults_when_absent() {
        let value = json!({ "lines": [ { "points": [[1, 2]] } ] });
        let state = DrawingPayload::Structured(value).decode();
        let stroke = &state.recording().unwrap().strokes()[0];

        assert_eq!(stroke.color, DEFAULT_STROKE_COLOR);
        assert_eq!(stroke.brush_radius, DEFAULT_BRUSH_RADIUS);
    }

    #[test]
    fn unparsable_string_is_unavailable() {
        let state = DrawingPayload::Serialized("{not json".to_string()).decode();
        assert_matches!(state, RecordingState::Unavailable(UnavailableReason::Malformed(_)));
    }

    #[test]
    fn object_without_lines_is_unavailable() {
        let state = DrawingPayload::Structured(json!({ "width": 10 })).decode();
        assert_matches!(state, RecordingState::Unavailable(UnavailableReason::Malformed(_)));
    }

    #[test]
    fn empty_lines_is_unavailable() {
        let state = DrawingPayload::Structured(json!({ "lines": [] })).decode();
        assert_eq!(state, RecordingState::Unavailable(UnavailableReason::Empty));
    }

    #[test]
    fn missing_payload_is_unavailable() {
        assert_eq!(
            DrawingPayload::Missing.decode(),
            RecordingState::Unavailable(UnavailableReason::Missing)
        );
    }

    #[test]
    fn payload_classifies_json_values() {
        assert_eq!(DrawingPayload::from_value(json!(null)), DrawingPayload::Missing);
        assert_matches!(
            DrawingPayload::from_value(json!("{}")),
            DrawingPayload::Serialized(_)
        );
        assert_matches!(
            DrawingPayload::from_value(json!({ "lines": [] })),
            DrawingPayload::Structured(_)
        );
    }

    #[test]
    fn payload_field_deserializes_from_record() {
        #[derive(Deserialize)]
        struct Record {
            #[serde(default)]
            drawing_data: DrawingPayload,
        }

        let absent: Record = serde_json::from_value(json!({})).unwrap();
        assert_eq!(absent.drawing_data, DrawingPayload::Missing);

        let null: Record = serde_json::from_value(json!({ "drawing_data": null })).unwrap();
        assert_eq!(null.drawing_data, DrawingPayload::Missing);

        let text: Record =
            serde_json::from_value(json!({ "drawing_data": "{\"lines\":[]}" })).unwrap();
        assert_matches!(text.drawing_data, DrawingPayload::Serialized(_));
    }

    #[test]
    fn prefix_clamps_and_keeps_canvas() {
        let state = DrawingPayload::Structured(two_stroke_json()).decode();
        let recording = state.recording().unwrap();

        assert_eq!(recording.prefix(1).len(), 1);
        assert_eq!(recording.prefix(99).len(), 2);
        assert_eq!(recording.prefix(0).canvas(), Some((800.0, 600.0)));
    }

    #[test]
    fn serialized_form_uses_point_pairs() {
        let recording = StrokeRecording::new(vec![Stroke {
            points: vec![Point { x: 3.0, y: 4.0 }],
            color: "#000000".into(),
            brush_radius: 3.0,
        }]);
        let value: serde_json::Value = serde_json::from_str(&recording.to_json().unwrap()).unwrap();

        assert_eq!(value["lines"][0]["points"][0], json!([3.0, 4.0]));
        assert_eq!(value["lines"][0]["brushRadius"], json!(3.0));
        assert!(value.get("width").is_none());
    }
}
