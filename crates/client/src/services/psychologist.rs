//! Psychologist views over their students.
//!
//! Besides the student lists and alert summaries, the backend renders a
//! per-student diary analysis as base64 PNG charts and exports the
//! analysed notes as a `;`-separated CSV file.

use serde::{Deserialize, Deserializer, Serialize};

use bienestar_core::types::UserId;

use crate::api::ApiClient;
use crate::error::ApiError;
use crate::services::notes::{Note, NoteStatistics};

/// A student as listed on the psychologist dashboard.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Student {
    pub id: UserId,
    pub nombre: String,
    #[serde(default)]
    pub apellido: Option<String>,
    /// University student code.
    #[serde(default)]
    pub codigo_alumno: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
}

/// Sadness risk computed from a student's recent notes.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SadnessRisk {
    /// Notes considered.
    pub count: u32,
    /// Notes tagged with sadness.
    pub sad_count: u32,
    /// `sad_count / count`.
    pub ratio: f64,
    pub max_sad_score: f64,
    pub latest_sad_score: f64,
    /// Backend label, e.g. `"low"` or `"high"`.
    pub risk_level: String,
    /// Whether the backend flags the student for follow-up.
    pub alert: bool,
}

/// A student together with their sadness-risk summary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StudentAlert {
    #[serde(flatten)]
    pub student: Student,
    #[serde(default)]
    pub risk: SadnessRisk,
    #[serde(default)]
    pub alert_message: Option<String>,
}

impl StudentAlert {
    /// Whether the dashboard should highlight this student.
    pub fn needs_attention(&self) -> bool {
        self.risk.alert
    }
}

/// Profile, notes and note statistics of one student.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct StudentReport {
    pub student: Student,
    #[serde(default)]
    pub notes: Vec<Note>,
    #[serde(default)]
    pub statistics: NoteStatistics,
}

// ---------------------------------------------------------------------------
// Diary analysis
// ---------------------------------------------------------------------------

/// Charts rendered by the backend's text analysis, each a base64 PNG.
///
/// A chart is absent when there was not enough text to draw it.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct AnalysisCharts {
    /// Sentiment distribution.
    pub sentiments: Option<String>,
    /// Emotion distribution.
    pub emotions: Option<String>,
    pub wordcloud: Option<String>,
}

impl AnalysisCharts {
    pub fn is_empty(&self) -> bool {
        self.sentiments.is_none() && self.emotions.is_none() && self.wordcloud.is_none()
    }

    /// The charts present, by name, as `data:` URLs ready for display.
    pub fn data_urls(&self) -> Vec<(&'static str, String)> {
        [
            ("sentiments", &self.sentiments),
            ("emotions", &self.emotions),
            ("wordcloud", &self.wordcloud),
        ]
        .into_iter()
        .filter_map(|(name, chart)| {
            let chart = chart.as_deref()?.trim();
            (!chart.is_empty()).then(|| (name, format!("data:image/png;base64,{chart}")))
        })
        .collect()
    }
}

/// Diary analysis of one student: charts plus the notes they were drawn from.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct DiaryAnalysis {
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default, rename = "analysis", deserialize_with = "null_as_default")]
    pub charts: AnalysisCharts,
    #[serde(default, deserialize_with = "null_as_default")]
    pub notes: Vec<Note>,
}

/// Treat an explicit `null` like a missing field.
pub(crate) fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

// ---------------------------------------------------------------------------
// PsychologistApi
// ---------------------------------------------------------------------------

pub struct PsychologistApi<'a> {
    api: &'a ApiClient,
}

impl ApiClient {
    pub fn psychologist(&self) -> PsychologistApi<'_> {
        PsychologistApi { api: self }
    }
}

impl PsychologistApi<'_> {
    /// Students, optionally only those assigned to `psychologist_id`.
    pub async fn students(&self, psychologist_id: Option<&str>) -> Result<Vec<Student>, ApiError> {
        let filter = psychologist_filter(psychologist_id);
        let rows: Option<Vec<Student>> = self
            .api
            .get("/psychologist/students", filter.as_slice())
            .await?;
        Ok(rows.unwrap_or_default())
    }

    /// Students with their sadness-risk summary.
    pub async fn students_with_alerts(
        &self,
        psychologist_id: Option<&str>,
    ) -> Result<Vec<StudentAlert>, ApiError> {
        let filter = psychologist_filter(psychologist_id);
        let rows: Option<Vec<StudentAlert>> = self
            .api
            .get("/psychologist/students-alerts", filter.as_slice())
            .await?;
        Ok(rows.unwrap_or_default())
    }

    /// Profile, notes and statistics of one student.
    pub async fn student_report(&self, student_id: &str) -> Result<StudentReport, ApiError> {
        self.api
            .get(&format!("/psychologist/student/{student_id}/report"), &[])
            .await
    }

    pub async fn student_statistics(&self, student_id: &str) -> Result<NoteStatistics, ApiError> {
        self.api
            .get(&format!("/psychologist/student/{student_id}/statistics"), &[])
            .await
    }

    /// Analyse the student's diary. A student without notes yields an
    /// empty analysis, not an error.
    pub async fn diary_analysis(&self, student_id: &str) -> Result<DiaryAnalysis, ApiError> {
        let analysis: Option<DiaryAnalysis> = self
            .api
            .get_envelope(&format!("/analyze/{student_id}"), &[])
            .await?;
        let analysis = analysis.unwrap_or_default();
        tracing::debug!(
            student_id,
            notes = analysis.notes.len(),
            charts = analysis.charts.data_urls().len(),
            "Diary analysis loaded",
        );
        Ok(analysis)
    }

    /// The student's analysed notes as CSV (`;`-separated, with header).
    ///
    /// The backend answers 404 when there is nothing to export.
    pub async fn export_csv(&self, student_id: &str) -> Result<String, ApiError> {
        self.api
            .get_text(&format!("/export/{student_id}"), &[])
            .await
    }
}

fn psychologist_filter(psychologist_id: Option<&str>) -> Option<(&'static str, &str)> {
    psychologist_id.map(|id| ("psychologist_id", id))
}
