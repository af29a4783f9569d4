//! Appointment requests between students and psychologists.

use chrono::NaiveDateTime;
use serde::de::IgnoredAny;
use serde::{Deserialize, Serialize};

use bienestar_core::types::{RecordId, UserId};
use bienestar_core::validation::{AppointmentForm, FieldErrors};

use crate::api::ApiClient;
use crate::error::ApiError;

/// Wire format of `fecha_cita`.
const APPOINTMENT_TIME_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

/// An appointment request, with the names of both sides when the endpoint
/// joins them in.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Appointment {
    pub id_cita: RecordId,
    pub titulo: String,
    /// Requested date and time, `YYYY-MM-DDTHH:MM:SS`.
    pub fecha_cita: String,
    #[serde(default)]
    pub fecha_creacion: Option<String>,
    /// Student who requested the appointment.
    pub id_usuario: UserId,
    /// Assigned psychologist; unset while pending.
    #[serde(default)]
    pub id_psicologo: Option<UserId>,
    #[serde(default)]
    pub nombre_usuario: Option<String>,
    #[serde(default)]
    pub apellido_usuario: Option<String>,
    #[serde(default)]
    pub correo_usuario: Option<String>,
    #[serde(default)]
    pub nombre_psicologo: Option<String>,
    #[serde(default)]
    pub apellido_psicologo: Option<String>,
    #[serde(default)]
    pub especialidad_psicologo: Option<String>,
    #[serde(default)]
    pub estado: Option<String>,
}

impl Appointment {
    /// Whether a psychologist has taken this appointment.
    pub fn is_assigned(&self) -> bool {
        self.id_psicologo.as_deref().is_some_and(|id| !id.is_empty())
    }
}

/// Body of create and update requests.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AppointmentInput {
    pub titulo: String,
    pub fecha_cita: String,
}

impl AppointmentInput {
    /// Validate `form` against `now` and build the request body.
    pub fn from_form(form: &AppointmentForm, now: NaiveDateTime) -> Result<Self, FieldErrors> {
        form.check_at(now, false)?;
        let Some(when) = form.fecha_cita else {
            let mut errors = FieldErrors::new();
            errors.insert("fecha_cita", "Date and time are required");
            return Err(errors);
        };
        Ok(Self {
            titulo: form.titulo.trim().to_string(),
            fecha_cita: when.format(APPOINTMENT_TIME_FORMAT).to_string(),
        })
    }
}

/// A user's appointments, split by the side they are on.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct UserAppointments {
    /// Requested by the user (students).
    #[serde(default)]
    pub citas_creadas: Vec<Appointment>,
    /// Assigned to the user (psychologists).
    #[serde(default)]
    pub citas_asignadas: Vec<Appointment>,
}

impl UserAppointments {
    fn partition(user_id: &str, rows: Vec<Appointment>) -> Self {
        let mut out = Self::default();
        for row in rows {
            if row.id_psicologo.as_deref() == Some(user_id) {
                out.citas_asignadas.push(row);
            } else if row.id_usuario == user_id {
                out.citas_creadas.push(row);
            }
        }
        out
    }
}

/// `/citas/usuario/{id}` answers either pre-split lists or one flat list.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum UserAppointmentsWire {
    Flat(Vec<Appointment>),
    Split(UserAppointments),
}

/// A psychologist that can take appointments.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Psychologist {
    pub id: UserId,
    pub nombre: String,
    #[serde(default)]
    pub apellido: Option<String>,
    #[serde(default, alias = "correo_institucional")]
    pub email: Option<String>,
    #[serde(default)]
    pub especialidad: Option<String>,
}

#[derive(Debug, Serialize)]
struct AssignPsychologist<'a> {
    id_psicologo: &'a str,
}

pub struct AppointmentsApi<'a> {
    api: &'a ApiClient,
}

impl ApiClient {
    pub fn appointments(&self) -> AppointmentsApi<'_> {
        AppointmentsApi { api: self }
    }
}

impl AppointmentsApi<'_> {
    /// Request an appointment on behalf of `user_id`.
    pub async fn create(
        &self,
        user_id: &str,
        form: &AppointmentForm,
        now: NaiveDateTime,
    ) -> Result<Appointment, ApiError> {
        let input = AppointmentInput::from_form(form, now)?;
        let created: Appointment = self
            .api
            .post("/citas", &[("id_usuario", user_id)], &input)
            .await?;
        tracing::info!(user_id, id_cita = created.id_cita, "Appointment requested");
        Ok(created)
    }

    /// Appointments no psychologist has taken yet.
    pub async fn pending(&self) -> Result<Vec<Appointment>, ApiError> {
        let rows: Option<Vec<Appointment>> = self.api.get("/citas/pendientes", &[]).await?;
        Ok(rows.unwrap_or_default())
    }

    pub async fn all(&self) -> Result<Vec<Appointment>, ApiError> {
        let rows: Option<Vec<Appointment>> = self.api.get("/citas/todas", &[]).await?;
        Ok(rows.unwrap_or_default())
    }

    pub async fn for_user(&self, user_id: &str) -> Result<UserAppointments, ApiError> {
        let wire: Option<UserAppointmentsWire> = self
            .api
            .get(&format!("/citas/usuario/{user_id}"), &[])
            .await?;
        Ok(match wire {
            Some(UserAppointmentsWire::Split(split)) => split,
            Some(UserAppointmentsWire::Flat(rows)) => UserAppointments::partition(user_id, rows),
            None => UserAppointments::default(),
        })
    }

    pub async fn detail(&self, id_cita: RecordId) -> Result<Appointment, ApiError> {
        self.api.get(&format!("/citas/{id_cita}"), &[]).await
    }

    pub async fn assign_psychologist(
        &self,
        id_cita: RecordId,
        psychologist_id: &str,
    ) -> Result<Appointment, ApiError> {
        let body = AssignPsychologist {
            id_psicologo: psychologist_id,
        };
        let updated: Appointment = self
            .api
            .put(&format!("/citas/{id_cita}/asignar-psicologo"), &[], &body)
            .await?;
        tracing::info!(id_cita, psychologist_id, "Psychologist assigned");
        Ok(updated)
    }

    /// Change an appointment. Only its creator may do so.
    pub async fn update(
        &self,
        id_cita: RecordId,
        user_id: &str,
        form: &AppointmentForm,
        now: NaiveDateTime,
    ) -> Result<Appointment, ApiError> {
        let input = AppointmentInput::from_form(form, now)?;
        self.api
            .put(&format!("/citas/{id_cita}"), &[("id_usuario", user_id)], &input)
            .await
    }

    pub async fn delete(&self, id_cita: RecordId, user_id: &str) -> Result<(), ApiError> {
        let _: IgnoredAny = self
            .api
            .delete(&format!("/citas/{id_cita}"), &[("id_usuario", user_id)])
            .await?;
        Ok(())
    }

    pub async fn available_psychologists(&self) -> Result<Vec<Psychologist>, ApiError> {
        let rows: Option<Vec<Psychologist>> =
            self.api.get("/citas/psicologos/disponibles", &[]).await?;
        Ok(rows.unwrap_or_default())
    }
}
