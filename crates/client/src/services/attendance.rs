//! Counselling attendance: session records, learnings report and the
//! generated insight for the next session.

use chrono::NaiveDate;
use serde::de::IgnoredAny;
use serde::{Deserialize, Serialize};

use bienestar_core::types::{RecordId, UserId};
use bienestar_core::validation::FieldErrors;

use crate::api::ApiClient;
use crate::error::ApiError;
use crate::services::psychologist::{null_as_default, AnalysisCharts};

/// How the session took place.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum AttendanceModality {
    Presencial,
    Virtual,
    Teleconsulta,
}

/// One attended counselling session, as registered by the student.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AttendanceRecord {
    pub id_usuario: UserId,
    pub fecha_atencion: NaiveDate,
    /// 1-based session number.
    pub nro_sesion: u32,
    pub modalidad_atencion: AttendanceModality,
    /// Reasons for the visit, comma separated.
    pub motivo_atencion: String,
    pub detalle_problema_actual: String,
    /// Whether the student also sees a private professional.
    pub acude_profesional_particular: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub diagnostico_particular: Option<String>,
    pub tipo_tratamiento_actual: String,
    /// Whether the student felt comfortable with the counselling unit.
    pub comodidad_unayoe: bool,
    /// What the student takes away from the session.
    pub aprendizaje_obtenido: String,
}

impl AttendanceRecord {
    pub fn check(&self) -> Result<(), FieldErrors> {
        let mut errors = FieldErrors::new();
        if self.nro_sesion == 0 {
            errors.insert("nro_sesion", "The session number must be at least 1");
        }
        for (field, value) in [
            ("motivo_atencion", &self.motivo_atencion),
            ("detalle_problema_actual", &self.detalle_problema_actual),
            ("tipo_tratamiento_actual", &self.tipo_tratamiento_actual),
            ("aprendizaje_obtenido", &self.aprendizaje_obtenido),
        ] {
            if value.trim().is_empty() {
                errors.insert(field, "This field is required");
            }
        }
        errors.into_result()
    }
}

/// A stored learning, as listed in the attendance report.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct AttendanceEntry {
    pub id_asistencia: RecordId,
    #[serde(default)]
    pub aprendizaje_obtenido: Option<String>,
    #[serde(default)]
    pub fecha_atencion: Option<String>,
}

/// Analysis of a student's recorded learnings, newest entry first.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct AttendanceReport {
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default, rename = "analysis", deserialize_with = "null_as_default")]
    pub charts: AnalysisCharts,
    #[serde(default, rename = "notes", deserialize_with = "null_as_default")]
    pub entries: Vec<AttendanceEntry>,
}

impl AttendanceReport {
    /// Non-blank learnings, in report order.
    pub fn learnings(&self) -> Vec<&str> {
        self.entries
            .iter()
            .filter_map(|e| e.aprendizaje_obtenido.as_deref())
            .filter(|text| !text.trim().is_empty())
            .collect()
    }
}

#[derive(Debug, Serialize)]
struct InsightRequest<'a> {
    texts: &'a [&'a str],
}

#[derive(Debug, Deserialize)]
struct InsightResponse {
    #[serde(default)]
    summary: String,
}

pub struct AttendanceApi<'a> {
    api: &'a ApiClient,
}

impl ApiClient {
    pub fn attendance(&self) -> AttendanceApi<'_> {
        AttendanceApi { api: self }
    }
}

impl AttendanceApi<'_> {
    pub async fn register(&self, record: &AttendanceRecord) -> Result<(), ApiError> {
        record.check()?;
        let _: IgnoredAny = self.api.post("/asistencia", &[], record).await?;
        tracing::info!(
            user_id = %record.id_usuario,
            session = record.nro_sesion,
            "Attendance registered",
        );
        Ok(())
    }

    /// Charts and entries for `user_id`. No records yields an empty report.
    pub async fn report(&self, user_id: &str) -> Result<AttendanceReport, ApiError> {
        let report: Option<AttendanceReport> = self
            .api
            .get_envelope(&format!("/analyze-asistencia/{user_id}"), &[])
            .await?;
        Ok(report.unwrap_or_default())
    }

    /// Summary and next-session plan generated from `learnings`.
    ///
    /// Blank entries are dropped; nothing left is rejected locally.
    pub async fn insight(&self, learnings: &[&str]) -> Result<String, ApiError> {
        let texts: Vec<&str> = learnings
            .iter()
            .copied()
            .filter(|text| !text.trim().is_empty())
            .collect();
        if texts.is_empty() {
            let mut errors = FieldErrors::new();
            errors.insert("texts", "There are no learnings to summarize");
            return Err(errors.into());
        }

        let response: InsightResponse = self
            .api
            .post("/attendance-insight", &[], &InsightRequest { texts: &texts })
            .await?;
        Ok(response.summary)
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn record() -> AttendanceRecord {
        AttendanceRecord {
            id_usuario: "user-1".into(),
            fecha_atencion: NaiveDate::from_ymd_opt(2026, 3, 12).unwrap(),
            nro_sesion: 2,
            modalidad_atencion: AttendanceModality::Presencial,
            motivo_atencion: "Ansiedad, Estrés académico".into(),
            detalle_problema_actual: "Dificultad para dormir antes de exámenes".into(),
            acude_profesional_particular: false,
            diagnostico_particular: None,
            tipo_tratamiento_actual: "NINGUNO".into(),
            comodidad_unayoe: true,
            aprendizaje_obtenido: "Técnicas de respiración".into(),
        }
    }

    #[test]
    fn record_wire_shape() {
        let wire = serde_json::to_value(record()).unwrap();
        assert_eq!(wire["fecha_atencion"], "2026-03-12");
        assert_eq!(wire["modalidad_atencion"], "PRESENCIAL");
        assert_eq!(wire["nro_sesion"], 2);
        assert!(wire.get("diagnostico_particular").is_none());
    }

    #[test]
    fn record_requires_session_and_texts() {
        let mut bad = record();
        bad.nro_sesion = 0;
        bad.aprendizaje_obtenido = "   ".into();

        let errors = bad.check().unwrap_err();
        assert!(errors.contains("nro_sesion"));
        assert!(errors.contains("aprendizaje_obtenido"));
        assert!(record().check().is_ok());
    }

    #[test]
    fn learnings_skip_blank_entries() {
        let report: AttendanceReport = serde_json::from_value(json!({
            "analysis": {},
            "notes": [
                { "id_asistencia": 3, "aprendizaje_obtenido": "Pedir ayuda", "fecha_atencion": "2026-03-12" },
                { "id_asistencia": 2, "aprendizaje_obtenido": "" },
                { "id_asistencia": 1 }
            ]
        }))
        .unwrap();
        assert_eq!(report.learnings(), vec!["Pedir ayuda"]);
    }
}
