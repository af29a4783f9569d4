//! Per-user convenience cache on local disk.
//!
//! Not a source of truth: the backend owns every record. Entries live in
//! `<root>/<namespace>/<user_id>.json`; unreadable entries are logged and
//! replaced by the type's default.

use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::error::CoreError;

#[derive(Debug, Clone)]
pub struct UserCache {
    root: PathBuf,
}

impl UserCache {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Load the cached value, or `T::default()` if absent or unreadable.
    pub fn load<T>(&self, namespace: &str, user_id: &str) -> T
    where
        T: DeserializeOwned + Default,
    {
        let path = self.entry_path(namespace, user_id);
        let bytes = match std::fs::read(&path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return T::default(),
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "Failed to read cache entry");
                return T::default();
            }
        };
        serde_json::from_slice(&bytes).unwrap_or_else(|e| {
            tracing::warn!(path = %path.display(), error = %e, "Discarding corrupt cache entry");
            T::default()
        })
    }

    /// Write the value, replacing any previous entry atomically.
    pub fn store<T: Serialize>(&self, namespace: &str, user_id: &str, value: &T) -> Result<(), CoreError> {
        let path = self.entry_path(namespace, user_id);
        if let Some(dir) = path.parent() {
            std::fs::create_dir_all(dir)?;
        }
        let json = serde_json::to_vec(value)
            .map_err(|e| CoreError::Internal(format!("cache encoding: {e}")))?;
        let tmp = path.with_extension("json.tmp");
        std::fs::write(&tmp, json)?;
        std::fs::rename(&tmp, &path)?;
        Ok(())
    }

    pub fn clear(&self, namespace: &str, user_id: &str) -> Result<(), CoreError> {
        match std::fs::remove_file(self.entry_path(namespace, user_id)) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    fn entry_path(&self, namespace: &str, user_id: &str) -> PathBuf {
        self.root
            .join(sanitize(namespace))
            .join(format!("{}.json", sanitize(user_id)))
    }
}

/// Keep cache keys inside the cache root.
fn sanitize(key: &str) -> String {
    key.chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
        .collect()
}

// ---------------------------------------------------------------------------
// Chat transcript
// ---------------------------------------------------------------------------

/// Cache namespace for chatbot conversations.
pub const CHAT_NAMESPACE: &str = "chat";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatSender {
    User,
    Bot,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatEntry {
    pub sender: ChatSender,
    pub text: String,
    /// Portal route the bot suggested, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub route: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ChatTranscript {
    pub entries: Vec<ChatEntry>,
}

impl ChatTranscript {
    pub fn push_user(&mut self, text: impl Into<String>) {
        self.entries.push(ChatEntry {
            sender: ChatSender::User,
            text: text.into(),
            route: None,
        });
    }

    pub fn push_bot(&mut self, text: impl Into<String>, route: Option<String>) {
        self.entries.push(ChatEntry {
            sender: ChatSender::Bot,
            text: text.into(),
            route,
        });
    }

    pub fn last(&self) -> Option<&ChatEntry> {
        self.entries.last()
    }
}
