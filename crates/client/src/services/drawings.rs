//! Student drawings: gallery listings, uploads and image analysis.
//!
//! Canvas drawings carry their stroke recording in `drawing_data`, which is
//! kept as a [`DrawingPayload`] so the replay player can decide whether it
//! is usable.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use bienestar_core::drawing::{DrawingPayload, StrokeRecording};
use bienestar_core::types::{EntityId, Timestamp, UserId};

use crate::api::ApiClient;
use crate::error::ApiError;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DrawingKind {
    /// Drawn on the in-app canvas; replayable.
    Canvas,
    /// An uploaded picture.
    #[default]
    #[serde(other)]
    Uploaded,
}

/// Student shown next to each drawing in the psychologist gallery.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct DrawingAuthor {
    pub id: UserId,
    #[serde(default)]
    pub nombre: Option<String>,
    #[serde(default)]
    pub apellido: Option<String>,
    #[serde(default)]
    pub codigo_alumno: Option<String>,
}

/// A drawing as listed in a gallery.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Drawing {
    pub id: EntityId,
    pub usuario_id: UserId,
    #[serde(default)]
    pub titulo: Option<String>,
    #[serde(default)]
    pub descripcion: Option<String>,
    #[serde(default)]
    pub imagen_url: Option<String>,
    #[serde(default)]
    pub tipo_dibujo: DrawingKind,
    /// Stroke recording for canvas drawings.
    #[serde(default)]
    pub drawing_data: DrawingPayload,
    #[serde(default)]
    pub created_at: Option<Timestamp>,
    /// Present only in the psychologist gallery.
    #[serde(default, rename = "usuarios")]
    pub author: Option<DrawingAuthor>,
}

impl Drawing {
    /// Whether the gallery should offer a replay button.
    pub fn is_replayable(&self) -> bool {
        self.tipo_dibujo == DrawingKind::Canvas && self.drawing_data.decode().is_available()
    }
}

/// A drawing ready to upload.
#[derive(Debug, Clone, PartialEq)]
pub struct DrawingUpload {
    pub user_id: UserId,
    /// Blank titles are replaced by [`default_title`].
    pub titulo: Option<String>,
    pub descripcion: String,
    /// PNG or JPEG, optionally as a `data:` URL.
    pub image_base64: String,
    pub kind: DrawingKind,
    pub drawing_data: DrawingPayload,
}

impl DrawingUpload {
    /// A canvas drawing together with its stroke recording.
    pub fn canvas(user_id: &str, image_base64: String, recording: StrokeRecording) -> Self {
        Self {
            user_id: user_id.to_string(),
            titulo: None,
            descripcion: String::new(),
            image_base64,
            kind: DrawingKind::Canvas,
            drawing_data: recording.into(),
        }
    }

    pub fn uploaded(user_id: &str, image_base64: String) -> Self {
        Self {
            user_id: user_id.to_string(),
            titulo: None,
            descripcion: String::new(),
            image_base64,
            kind: DrawingKind::Uploaded,
            drawing_data: DrawingPayload::Missing,
        }
    }

    pub fn titled(mut self, titulo: impl Into<String>) -> Self {
        self.titulo = Some(titulo.into());
        self
    }

    pub fn described(mut self, descripcion: impl Into<String>) -> Self {
        self.descripcion = descripcion.into();
        self
    }

    fn to_wire(&self, today: NaiveDate) -> UploadRequest<'_> {
        let titulo = match self.titulo.as_deref().map(str::trim) {
            Some(t) if !t.is_empty() => t.to_string(),
            _ => default_title(today),
        };
        UploadRequest {
            user_id: &self.user_id,
            titulo,
            descripcion: &self.descripcion,
            image_base64: &self.image_base64,
            tipo_dibujo: self.kind,
            drawing_data: &self.drawing_data,
        }
    }
}

/// Title given to drawings saved without one.
pub fn default_title(today: NaiveDate) -> String {
    format!("Dibujo {}", today.format("%d/%m/%Y"))
}

#[derive(Debug, Serialize)]
struct UploadRequest<'a> {
    user_id: &'a str,
    titulo: String,
    descripcion: &'a str,
    image_base64: &'a str,
    tipo_dibujo: DrawingKind,
    drawing_data: &'a DrawingPayload,
}

/// Image metrics, processing steps and narrative produced by the analyzer.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct AnalysisReport {
    #[serde(default)]
    pub metrics: BTreeMap<String, f64>,
    /// Base64 images of each processing step, keyed by step name.
    #[serde(default)]
    pub visualizations: BTreeMap<String, String>,
    #[serde(default)]
    pub ai_insights: Option<String>,
}

/// Analysis result as decoded from the backend.
#[derive(Debug, Clone, PartialEq)]
pub enum DrawingAnalysis {
    Structured(AnalysisReport),
    /// The analyzer only returned prose.
    Text(String),
    /// Anything else, kept for display as raw JSON.
    Unrecognized(Value),
}

impl DrawingAnalysis {
    pub fn from_value(value: Value) -> Self {
        match value {
            Value::String(text) => DrawingAnalysis::Text(text),
            Value::Object(_) => match serde_json::from_value::<AnalysisReport>(value.clone()) {
                Ok(report) => DrawingAnalysis::Structured(report),
                Err(e) => {
                    tracing::warn!(error = %e, "Unexpected drawing analysis shape");
                    DrawingAnalysis::Unrecognized(value)
                }
            },
            other => DrawingAnalysis::Unrecognized(other),
        }
    }
}

#[derive(Debug, Deserialize)]
struct AnalyzeResponse {
    #[serde(default)]
    analysis: Value,
}

pub struct DrawingsApi<'a> {
    api: &'a ApiClient,
}

impl ApiClient {
    pub fn drawings(&self) -> DrawingsApi<'_> {
        DrawingsApi { api: self }
    }
}

impl DrawingsApi<'_> {
    /// Drawings of one student, newest first.
    pub async fn for_student(&self, user_id: &str) -> Result<Vec<Drawing>, ApiError> {
        let rows: Option<Vec<Drawing>> = self
            .api
            .get(&format!("/drawings/student/{user_id}"), &[])
            .await?;
        Ok(rows.unwrap_or_default())
    }

    /// Drawings of every student assigned to `psychologist_id`.
    pub async fn for_psychologist(&self, psychologist_id: &str) -> Result<Vec<Drawing>, ApiError> {
        let rows: Option<Vec<Drawing>> = self
            .api
            .get(&format!("/drawings/psychologist/{psychologist_id}"), &[])
            .await?;
        Ok(rows.unwrap_or_default())
    }

    pub async fn upload(&self, upload: &DrawingUpload) -> Result<Drawing, ApiError> {
        let today = chrono::Local::now().date_naive();
        let request = upload.to_wire(today);
        let stored: Drawing = self.api.post("/drawings/upload", &[], &request).await?;
        tracing::info!(
            user_id = %upload.user_id,
            drawing_id = %stored.id,
            kind = ?upload.kind,
            "Drawing uploaded",
        );
        Ok(stored)
    }

    pub async fn analyze(&self, drawing_id: &str) -> Result<DrawingAnalysis, ApiError> {
        let response: AnalyzeResponse = self
            .api
            .post_empty(&format!("/drawings/analyze/{drawing_id}"), &[])
            .await?;
        Ok(DrawingAnalysis::from_value(response.analysis))
    }
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;
    use serde_json::json;

    use super::*;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 3, 5).unwrap()
    }

    #[test]
    fn blank_titles_get_the_dated_default() {
        let upload = DrawingUpload::uploaded("u1", "aGVsbG8=".into()).titled("   ");
        assert_eq!(upload.to_wire(today()).titulo, "Dibujo 05/03/2026");

        let upload = DrawingUpload::uploaded("u1", "aGVsbG8=".into());
        assert_eq!(upload.to_wire(today()).titulo, "Dibujo 05/03/2026");

        let upload = upload.titled(" Mi casa ");
        assert_eq!(upload.to_wire(today()).titulo, "Mi casa");
    }

    #[test]
    fn uploaded_pictures_send_null_drawing_data() {
        let upload = DrawingUpload::uploaded("u1", "aGVsbG8=".into());
        let wire = serde_json::to_value(upload.to_wire(today())).unwrap();
        assert_eq!(wire["tipo_dibujo"], "uploaded");
        assert_eq!(wire["drawing_data"], Value::Null);
    }

    #[test]
    fn unknown_kind_reads_as_uploaded() {
        let kind: DrawingKind = serde_json::from_value(json!("scanned")).unwrap();
        assert_eq!(kind, DrawingKind::Uploaded);
    }

    #[test]
    fn analysis_shapes_are_told_apart() {
        let structured = json!({
            "metrics": { "densidad_trazo_porcentaje": 12.5, "numero_esquinas_detectadas": 40 },
            "visualizations": { "original": "aGVsbG8=" },
            "ai_insights": "Trazos firmes."
        });
        assert_matches!(
            DrawingAnalysis::from_value(structured),
            DrawingAnalysis::Structured(report) if report.metrics.len() == 2
                && report.ai_insights.as_deref() == Some("Trazos firmes.")
        );

        assert_matches!(
            DrawingAnalysis::from_value(json!("Sin métricas")),
            DrawingAnalysis::Text(text) if text == "Sin métricas"
        );

        assert_matches!(
            DrawingAnalysis::from_value(json!({ "metrics": "n/a" })),
            DrawingAnalysis::Unrecognized(_)
        );
        assert_matches!(DrawingAnalysis::from_value(json!(42)), DrawingAnalysis::Unrecognized(_));
    }
}
