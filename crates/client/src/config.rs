use std::path::PathBuf;
use std::time::Duration;

use bienestar_core::cache::UserCache;
use bienestar_core::session::SessionStore;

pub const DEFAULT_API_BASE_URL: &str = "http://127.0.0.1:8000";
pub const DEFAULT_CHATBOT_WEBHOOK_URL: &str = "http://localhost:5678/webhook/chatbot";
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_CACHE_DIR: &str = ".bienestar-cache";

/// Client configuration loaded from environment variables.
///
/// All fields have defaults suitable for a local backend.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Backend base URL, without a trailing slash.
    pub api_base_url: String,
    /// Per-request timeout in seconds.
    pub request_timeout_secs: u64,
    /// Chatbot webhook, called outside the backend.
    pub chatbot_webhook_url: String,
    /// Where the signed-in session is saved. `None` keeps it in memory.
    pub session_file: Option<PathBuf>,
    /// Root of the per-user cache.
    pub cache_dir: PathBuf,
}

impl ClientConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var               | Default                                  |
    /// |-----------------------|------------------------------------------|
    /// | `API_BASE_URL`        | `http://127.0.0.1:8000`                  |
    /// | `API_TIMEOUT_SECS`    | `30`                                     |
    /// | `CHATBOT_WEBHOOK_URL` | `http://localhost:5678/webhook/chatbot`  |
    /// | `SESSION_FILE`        | unset (session kept in memory)           |
    /// | `CACHE_DIR`           | `.bienestar-cache`                       |
    ///
    /// An unparsable or zero `API_TIMEOUT_SECS` is logged and replaced by
    /// the default.
    pub fn from_env() -> Self {
        let api_base_url = std::env::var("API_BASE_URL")
            .map(|v| normalize_base_url(&v))
            .unwrap_or_else(|_| DEFAULT_API_BASE_URL.into());

        let request_timeout_secs = std::env::var("API_TIMEOUT_SECS")
            .map(|raw| parse_timeout_secs(&raw))
            .unwrap_or(DEFAULT_REQUEST_TIMEOUT_SECS);

        let chatbot_webhook_url = std::env::var("CHATBOT_WEBHOOK_URL")
            .map(|v| v.trim().to_string())
            .unwrap_or_else(|_| DEFAULT_CHATBOT_WEBHOOK_URL.into());

        let session_file = std::env::var("SESSION_FILE")
            .ok()
            .filter(|v| !v.trim().is_empty())
            .map(PathBuf::from);

        let cache_dir = std::env::var("CACHE_DIR")
            .ok()
            .filter(|v| !v.trim().is_empty())
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_CACHE_DIR));

        Self {
            api_base_url,
            request_timeout_secs,
            chatbot_webhook_url,
            session_file,
            cache_dir,
        }
    }

    /// Defaults pointed at `api_base_url`.
    pub fn with_base_url(api_base_url: &str) -> Self {
        Self {
            api_base_url: normalize_base_url(api_base_url),
            ..Self::default()
        }
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// Open the session store this configuration describes.
    pub fn session_store(&self) -> SessionStore {
        match &self.session_file {
            Some(path) => SessionStore::persistent(path),
            None => SessionStore::in_memory(),
        }
    }

    pub fn user_cache(&self) -> UserCache {
        UserCache::new(self.cache_dir.clone())
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_base_url: DEFAULT_API_BASE_URL.into(),
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
            chatbot_webhook_url: DEFAULT_CHATBOT_WEBHOOK_URL.into(),
            session_file: None,
            cache_dir: PathBuf::from(DEFAULT_CACHE_DIR),
        }
    }
}

/// Parse a timeout in whole seconds. Zero would fail every request at once,
/// so it is rejected like any other bad value.
fn parse_timeout_secs(raw: &str) -> u64 {
    match raw.trim().parse::<u64>() {
        Ok(secs) if secs > 0 => secs,
        _ => {
            tracing::warn!(value = %raw, "API_TIMEOUT_SECS must be a positive number, using default");
            DEFAULT_REQUEST_TIMEOUT_SECS
        }
    }
}

fn normalize_base_url(url: &str) -> String {
    url.trim().trim_end_matches('/').to_string()
}
