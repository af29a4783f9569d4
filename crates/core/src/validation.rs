//! Form validation for the portal's input forms.
//!
//! Every validator returns `Ok(())` or a [`FieldErrors`] map keyed by the
//! form field name so callers can show each message next to its field.
//! Format and length rules go through the `validator` derive; rules that
//! depend on other fields or on the clock are checked by hand.

use std::collections::BTreeMap;
use std::fmt;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::error::CoreError;
use crate::session::UserRole;

/// Minimum length of a diary note.
pub const MIN_NOTE_CHARS: usize = 10;

/// Minimum length of an appointment reason.
pub const MIN_APPOINTMENT_TITLE_CHARS: usize = 10;

// ---------------------------------------------------------------------------
// FieldErrors
// ---------------------------------------------------------------------------

/// Per-field validation messages. Only the first message per field is kept.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FieldErrors(BTreeMap<String, String>);

impl FieldErrors {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a message for `field` unless one is already present.
    pub fn insert(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.0.entry(field.into()).or_insert_with(|| message.into());
    }

    pub fn get(&self, field: &str) -> Option<&str> {
        self.0.get(field).map(String::as_str)
    }

    pub fn contains(&self, field: &str) -> bool {
        self.0.contains_key(field)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// `Ok(())` when no field failed.
    pub fn into_result(self) -> Result<(), FieldErrors> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(self)
        }
    }
}

impl fmt::Display for FieldErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for (field, message) in self.iter() {
            if !first {
                f.write_str("; ")?;
            }
            write!(f, "{field}: {message}")?;
            first = false;
        }
        Ok(())
    }
}

impl From<validator::ValidationErrors> for FieldErrors {
    fn from(errors: validator::ValidationErrors) -> Self {
        let mut out = FieldErrors::new();
        for (field, errs) in errors.field_errors() {
            for err in errs.iter() {
                let message = err
                    .message
                    .as_ref()
                    .map(|m| m.to_string())
                    .unwrap_or_else(|| format!("invalid value ({})", err.code));
                out.insert(field.to_string(), message);
            }
        }
        out
    }
}

impl From<FieldErrors> for CoreError {
    fn from(errors: FieldErrors) -> Self {
        CoreError::Validation(errors)
    }
}

/// Run the derive-based rules and collect them into a [`FieldErrors`].
fn derived_errors<T: Validate>(form: &T) -> FieldErrors {
    match form.validate() {
        Ok(()) => FieldErrors::new(),
        Err(errors) => errors.into(),
    }
}

fn require_text(errors: &mut FieldErrors, field: &str, value: &str, message: &str) {
    if value.trim().is_empty() {
        errors.insert(field, message);
    }
}

// ---------------------------------------------------------------------------
// Login
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct LoginForm {
    #[validate(email(message = "Enter a valid email address"))]
    pub email: String,
    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,
}

impl LoginForm {
    pub fn check(&self) -> Result<(), FieldErrors> {
        derived_errors(self).into_result()
    }
}

// ---------------------------------------------------------------------------
// Signup
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct SignupForm {
    #[validate(email(message = "Enter a valid institutional email"))]
    pub email: String,
    #[validate(length(min = 6, message = "Password must be at least 6 characters"))]
    pub password: String,
    pub nombre: String,
    pub apellido: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub codigo_alumno: Option<String>,
    pub rol: UserRole,
}

impl SignupForm {
    pub fn check(&self) -> Result<(), FieldErrors> {
        let mut errors = derived_errors(self);

        require_text(&mut errors, "nombre", &self.nombre, "First name is required");
        require_text(&mut errors, "apellido", &self.apellido, "Last name is required");

        if self.rol == UserRole::Student {
            let code = self.codigo_alumno.as_deref().unwrap_or("");
            require_text(&mut errors, "codigo_alumno", code, "Student code is required");
        }

        errors.into_result()
    }
}

// ---------------------------------------------------------------------------
// Diary note
// ---------------------------------------------------------------------------

/// Validate the text of a diary note.
pub fn check_note(text: &str) -> Result<(), FieldErrors> {
    let mut errors = FieldErrors::new();
    if text.trim().is_empty() {
        errors.insert("nota", "The note cannot be empty");
    } else if text.chars().count() < MIN_NOTE_CHARS {
        errors.insert(
            "nota",
            format!("The note must be at least {MIN_NOTE_CHARS} characters"),
        );
    }
    errors.into_result()
}

// ---------------------------------------------------------------------------
// Appointment request
// ---------------------------------------------------------------------------

/// Appointment request as entered by a student.
///
/// `fecha_cita` is a local wall-clock time, as picked in a date-time input.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppointmentForm {
    pub titulo: String,
    pub fecha_cita: Option<NaiveDateTime>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub psicologo_id: Option<String>,
}

impl AppointmentForm {
    /// Validate against the current local time `now`.
    ///
    /// `require_psychologist` is set by forms where the student picks the
    /// psychologist; otherwise assignment happens later on the backend.
    pub fn check_at(&self, now: NaiveDateTime, require_psychologist: bool) -> Result<(), FieldErrors> {
        let mut errors = FieldErrors::new();

        if self.titulo.trim().is_empty() {
            errors.insert("titulo", "A reason is required");
        } else if self.titulo.trim().chars().count() < MIN_APPOINTMENT_TITLE_CHARS {
            errors.insert(
                "titulo",
                format!("The reason must be at least {MIN_APPOINTMENT_TITLE_CHARS} characters"),
            );
        }

        match self.fecha_cita {
            None => errors.insert("fecha_cita", "Date and time are required"),
            Some(when) if when <= now => errors.insert("fecha_cita", "The date must be in the future"),
            Some(_) => {}
        }

        if require_psychologist {
            let chosen = self.psicologo_id.as_deref().unwrap_or("");
            require_text(&mut errors, "psicologo_id", chosen, "Select a psychologist");
        }

        errors.into_result()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
