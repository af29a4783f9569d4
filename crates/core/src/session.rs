//! Authenticated session state.
//!
//! [`SessionStore`] is created once at startup and passed explicitly to
//! whatever needs the bearer token or the current user. It optionally
//! mirrors the session into a JSON file so a restart keeps the user signed
//! in; [`SessionStore::sign_out`] removes both copies.

use std::path::{Path, PathBuf};
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::types::UserId;

/// Portal roles as spelled by the backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum UserRole {
    #[serde(rename = "estudiante")]
    Student,
    #[serde(rename = "psicologo")]
    Psychologist,
    /// Any role this client does not know about.
    #[serde(other)]
    Unknown,
}

impl UserRole {
    /// Wire spelling of the role.
    pub fn as_str(&self) -> &'static str {
        match self {
            UserRole::Student => "estudiante",
            UserRole::Psychologist => "psicologo",
            UserRole::Unknown => "unknown",
        }
    }
}

/// Profile returned by the backend on login.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserProfile {
    pub id: UserId,
    pub email: String,
    pub rol: UserRole,
    /// First name.
    pub nombre: String,
    /// Last name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub apellido: Option<String>,
    /// University student code; students only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub codigo_alumno: Option<String>,
    /// Reference photo used by the face check.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub foto_perfil_url: Option<String>,
}

impl UserProfile {
    /// A reference face exists once a profile photo has been stored.
    ///
    /// The backend may send an empty URL for users who never registered.
    pub fn has_face_registered(&self) -> bool {
        self.foto_perfil_url
            .as_deref()
            .is_some_and(|url| !url.trim().is_empty())
    }
}

/// A signed-in user together with the tokens issued at login.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    pub user: UserProfile,
    /// Sent as the bearer token on every backend request.
    pub access_token: String,
    pub refresh_token: String,
    /// Set after the face check succeeds for this session.
    #[serde(default)]
    pub face_verified: bool,
}

impl Session {
    pub fn new(user: UserProfile, access_token: String, refresh_token: String) -> Self {
        Self {
            user,
            access_token,
            refresh_token,
            face_verified: false,
        }
    }
}

// ---------------------------------------------------------------------------
// SessionStore
// ---------------------------------------------------------------------------

/// Holds the current [`Session`], if any.
#[derive(Debug)]
pub struct SessionStore {
    current: RwLock<Option<Session>>,
    path: Option<PathBuf>,
}

impl SessionStore {
    /// A store that lives only as long as the process.
    pub fn in_memory() -> Self {
        Self {
            current: RwLock::new(None),
            path: None,
        }
    }

    /// A store backed by `path`, restoring any session saved there.
    ///
    /// A missing file means "signed out". A corrupt file is logged and
    /// treated the same way.
    pub fn persistent(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let restored = load_session(&path);
        if restored.is_some() {
            tracing::info!(path = %path.display(), "Restored saved session");
        }
        Self {
            current: RwLock::new(restored),
            path: Some(path),
        }
    }

    pub fn current(&self) -> Option<Session> {
        self.read().clone()
    }

    pub fn is_signed_in(&self) -> bool {
        self.read().is_some()
    }

    pub fn user_id(&self) -> Option<UserId> {
        self.read().as_ref().map(|s| s.user.id.clone())
    }

    pub fn bearer_token(&self) -> Option<String> {
        self.read().as_ref().map(|s| s.access_token.clone())
    }

    /// Replace the current session and persist it.
    pub fn sign_in(&self, session: Session) -> Result<(), CoreError> {
        self.persist(Some(&session))?;
        tracing::info!(user_id = %session.user.id, role = session.user.rol.as_str(), "Signed in");
        *self.write() = Some(session);
        Ok(())
    }

    /// Forget the session in memory and on disk.
    pub fn sign_out(&self) {
        let previous = self.write().take();
        if let Err(e) = self.persist(None) {
            tracing::warn!(error = %e, "Failed to remove saved session");
        }
        if let Some(session) = previous {
            tracing::info!(user_id = %session.user.id, "Signed out");
        }
    }

    /// Record a successful face check on the current session.
    ///
    /// The in-memory session only changes once the saved copy is written.
    pub fn mark_face_verified(&self) -> Result<(), CoreError> {
        let mut guard = self.write();
        let mut verified = guard
            .clone()
            .ok_or_else(|| CoreError::Unauthorized("no active session".into()))?;
        verified.face_verified = true;
        self.persist(Some(&verified))?;
        *guard = Some(verified);
        Ok(())
    }

    fn persist(&self, session: Option<&Session>) -> Result<(), CoreError> {
        let Some(path) = &self.path else {
            return Ok(());
        };
        match session {
            Some(session) => {
                if let Some(dir) = path.parent() {
                    std::fs::create_dir_all(dir)?;
                }
                let json = serde_json::to_vec(session)
                    .map_err(|e| CoreError::Internal(format!("session encoding: {e}")))?;
                std::fs::write(path, json)?;
            }
            None => match std::fs::remove_file(path) {
                Ok(()) => {}
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                Err(e) => return Err(e.into()),
            },
        }
        Ok(())
    }

    fn read(&self) -> RwLockReadGuard<'_, Option<Session>> {
        self.current.read().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, Option<Session>> {
        self.current.write().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

fn load_session(path: &Path) -> Option<Session> {
    let bytes = match std::fs::read(path) {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return None,
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "Failed to read saved session");
            return None;
        }
    };
    match serde_json::from_slice(&bytes) {
        Ok(session) => Some(session),
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "Ignoring corrupt saved session");
            None
        }
    }
}
