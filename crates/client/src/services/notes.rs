//! Emotional diary notes.

use std::collections::BTreeMap;

use serde::de::IgnoredAny;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use bienestar_core::types::{RecordId, Timestamp, UserId};
use bienestar_core::validation::check_note;

use crate::api::ApiClient;
use crate::error::ApiError;

/// Sentiment label attached by the backend's text analysis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Sentiment {
    #[serde(rename = "POS")]
    Positive,
    #[serde(rename = "NEG")]
    Negative,
    #[serde(rename = "NEU")]
    Neutral,
    #[serde(other)]
    Unknown,
}

/// A stored diary entry with its analysis labels.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Note {
    pub id: RecordId,
    /// Entry text as written by the student.
    pub nota: String,
    #[serde(default)]
    pub sentimiento: Option<Sentiment>,
    #[serde(default)]
    pub emocion: Option<String>,
    /// Classifier confidence for `emocion`, between 0 and 1.
    #[serde(default)]
    pub emocion_score: Option<f64>,
    #[serde(default)]
    pub created_at: Option<Timestamp>,
    /// Owner. Listed as `usuario_id` by some endpoints.
    #[serde(default, alias = "usuario_id")]
    pub user_id: Option<UserId>,
}

/// Body of create and update requests.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NoteInput {
    pub note: String,
    pub user_id: UserId,
}

/// Supportive reply generated for a new note.
///
/// Plain text in most cases; some generators return a JSON object.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum Accompaniment {
    Text(String),
    Structured(Value),
}

/// Result of saving a note.
#[derive(Debug, Clone, PartialEq)]
pub struct CreatedNote {
    /// The stored row, when the backend echoed it.
    pub note: Option<Note>,
    pub accompaniment: Option<Accompaniment>,
}

#[derive(Debug, Deserialize)]
struct CreateNoteResponse {
    #[serde(default)]
    data: Option<Vec<Note>>,
    #[serde(default)]
    accompaniment: Option<Accompaniment>,
}

#[derive(Debug, Serialize)]
struct NoteUpdate<'a> {
    note: &'a str,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct TermCount {
    pub term: String,
    pub count: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct NoteStatistics {
    #[serde(default)]
    pub total_notes: u64,
    #[serde(default)]
    pub sentiments: BTreeMap<String, u64>,
    #[serde(default)]
    pub emotions: BTreeMap<String, u64>,
    #[serde(default)]
    pub term_frequency: Vec<TermCount>,
}

pub struct NotesApi<'a> {
    api: &'a ApiClient,
}

impl ApiClient {
    pub fn notes(&self) -> NotesApi<'_> {
        NotesApi { api: self }
    }
}

impl NotesApi<'_> {
    /// Notes of `user_id`, newest first.
    pub async fn list(&self, user_id: &str) -> Result<Vec<Note>, ApiError> {
        let notes: Option<Vec<Note>> = self.api.get(&format!("/notas/{user_id}"), &[]).await?;
        Ok(notes.unwrap_or_default())
    }

    pub async fn create(&self, input: &NoteInput) -> Result<CreatedNote, ApiError> {
        check_note(&input.note)?;

        let response: CreateNoteResponse = self.api.post_envelope("/notas", &[], input).await?;
        let note = response.data.and_then(|rows| rows.into_iter().next());
        tracing::debug!(user_id = %input.user_id, stored = note.is_some(), "Note saved");
        Ok(CreatedNote {
            note,
            accompaniment: response.accompaniment,
        })
    }

    pub async fn update(&self, note_id: RecordId, user_id: &str, text: &str) -> Result<Note, ApiError> {
        check_note(text)?;
        self.api
            .put(
                &format!("/notas/{note_id}"),
                &[("user_id", user_id)],
                &NoteUpdate { note: text },
            )
            .await
    }

    pub async fn delete(&self, note_id: RecordId, user_id: &str) -> Result<(), ApiError> {
        let _: IgnoredAny = self
            .api
            .delete(&format!("/notas/{note_id}"), &[("user_id", user_id)])
            .await?;
        Ok(())
    }

    pub async fn statistics(&self, user_id: &str) -> Result<NoteStatistics, ApiError> {
        self.api.get(&format!("/notas/{user_id}/statistics"), &[]).await
    }
}
