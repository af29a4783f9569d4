//! REST client for the Bienestar backend.
//!
//! Every request carries `Authorization: Bearer <token>` while a session is
//! signed in. Successful bodies are unwrapped from the backend's
//! `{ "data": ... }` envelope when one is present. A 401 signs the session
//! out and broadcasts [`AuthEvent::SessionExpired`] so the caller can send
//! the user back to the login screen. Nothing is retried.

use std::sync::Arc;

use reqwest::{Method, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use tokio::sync::broadcast;

use bienestar_core::session::SessionStore;

use crate::config::ClientConfig;
use crate::error::{ApiError, DEFAULT_ERROR_MESSAGE};

/// URL query pairs.
pub type Query<'a> = &'a [(&'a str, &'a str)];

const AUTH_EVENT_CAPACITY: usize = 16;

/// Session lifecycle changes detected by the client.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthEvent {
    /// The backend rejected the token; the session has been cleared.
    SessionExpired,
}

/// HTTP client for the backend, bound to one [`SessionStore`].
pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
    session: Arc<SessionStore>,
    auth_tx: broadcast::Sender<AuthEvent>,
}

impl ApiClient {
    pub fn new(config: &ClientConfig, session: Arc<SessionStore>) -> Result<Self, ApiError> {
        let http = reqwest::Client::builder()
            .timeout(config.request_timeout())
            .build()?;
        Ok(Self::with_client(http, &config.api_base_url, session))
    }

    /// Create a client reusing an existing [`reqwest::Client`].
    pub fn with_client(http: reqwest::Client, base_url: &str, session: Arc<SessionStore>) -> Self {
        let (auth_tx, _) = broadcast::channel(AUTH_EVENT_CAPACITY);
        Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            session,
            auth_tx,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn session(&self) -> &Arc<SessionStore> {
        &self.session
    }

    pub fn subscribe_auth(&self) -> broadcast::Receiver<AuthEvent> {
        self.auth_tx.subscribe()
    }

    pub(crate) fn http(&self) -> &reqwest::Client {
        &self.http
    }

    // ---- request helpers ----

    /// `GET`, unwrapping the `data` envelope.
    pub async fn get<T: DeserializeOwned>(&self, path: &str, query: Query<'_>) -> Result<T, ApiError> {
        let body = self.send(Method::GET, path, query, None::<&()>).await?;
        decode(unwrap_data(body))
    }

    /// `GET`, decoding the whole body including any envelope fields.
    pub async fn get_envelope<T: DeserializeOwned>(
        &self,
        path: &str,
        query: Query<'_>,
    ) -> Result<T, ApiError> {
        let body = self.send(Method::GET, path, query, None::<&()>).await?;
        decode(body)
    }

    pub async fn post<T, B>(&self, path: &str, query: Query<'_>, body: &B) -> Result<T, ApiError>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        let body = self.send(Method::POST, path, query, Some(body)).await?;
        decode(unwrap_data(body))
    }

    /// `POST`, decoding the whole body including any envelope fields.
    pub async fn post_envelope<T, B>(&self, path: &str, query: Query<'_>, body: &B) -> Result<T, ApiError>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        let body = self.send(Method::POST, path, query, Some(body)).await?;
        decode(body)
    }

    /// `POST` without a request body.
    pub async fn post_empty<T: DeserializeOwned>(&self, path: &str, query: Query<'_>) -> Result<T, ApiError> {
        let body = self.send(Method::POST, path, query, None::<&()>).await?;
        decode(unwrap_data(body))
    }

    pub async fn put<T, B>(&self, path: &str, query: Query<'_>, body: &B) -> Result<T, ApiError>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        let body = self.send(Method::PUT, path, query, Some(body)).await?;
        decode(unwrap_data(body))
    }

    pub async fn delete<T: DeserializeOwned>(&self, path: &str, query: Query<'_>) -> Result<T, ApiError> {
        let body = self.send(Method::DELETE, path, query, None::<&()>).await?;
        decode(unwrap_data(body))
    }

    /// `GET` a non-JSON body (e.g. a CSV download) as text.
    ///
    /// Error statuses are mapped like any other request, so a JSON
    /// `detail` still becomes the error message.
    pub async fn get_text(&self, path: &str, query: Query<'_>) -> Result<String, ApiError> {
        let response = self.execute(Method::GET, path, query, None::<&()>).await?;
        Ok(response.text().await?)
    }

    // ---- private helpers ----

    async fn send<B: Serialize + ?Sized>(
        &self,
        method: Method,
        path: &str,
        query: Query<'_>,
        body: Option<&B>,
    ) -> Result<Value, ApiError> {
        let response = self.execute(method, path, query, body).await?;
        let bytes = response.bytes().await?;
        if bytes.iter().all(u8::is_ascii_whitespace) {
            return Ok(Value::Null);
        }
        Ok(serde_json::from_slice(&bytes)?)
    }

    /// Build and send the request, returning the response once its status
    /// is known to be 2xx.
    async fn execute<B: Serialize + ?Sized>(
        &self,
        method: Method,
        path: &str,
        query: Query<'_>,
        body: Option<&B>,
    ) -> Result<reqwest::Response, ApiError> {
        let mut request = self
            .http
            .request(method.clone(), format!("{}{}", self.base_url, path));
        if !query.is_empty() {
            request = request.query(query);
        }
        if let Some(token) = self.session.bearer_token() {
            request = request.bearer_auth(token);
        }
        if let Some(body) = body {
            request = request.json(body);
        }

        let response = request.send().await.map_err(|e| {
            tracing::error!(%method, path, error = %e, "No response from server");
            ApiError::Network(e)
        })?;
        self.ensure_success(&method, path, response).await
    }

    /// Map a non-2xx response to [`ApiError::Status`], logging it and
    /// expiring the session on 401.
    async fn ensure_success(
        &self,
        method: &Method,
        path: &str,
        response: reqwest::Response,
    ) -> Result<reqwest::Response, ApiError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        let message = error_message(&body);

        match status {
            StatusCode::UNAUTHORIZED => {
                tracing::warn!(%method, path, detail = %message, "Unauthorized: token missing or expired");
                self.expire_session();
            }
            StatusCode::FORBIDDEN => {
                tracing::warn!(%method, path, "Forbidden: not allowed to perform this action");
            }
            StatusCode::NOT_FOUND => {
                tracing::warn!(%method, path, "Not found: resource does not exist");
            }
            s if s.is_server_error() => {
                tracing::error!(%method, path, status = s.as_u16(), detail = %message, "Server error");
            }
            s => {
                tracing::warn!(%method, path, status = s.as_u16(), detail = %message, "Request rejected");
            }
        }

        Err(ApiError::Status {
            status: status.as_u16(),
            message,
        })
    }

    fn expire_session(&self) {
        if !self.session.is_signed_in() {
            return;
        }
        self.session.sign_out();
        // No subscribers is fine.
        let _ = self.auth_tx.send(AuthEvent::SessionExpired);
    }
}

fn decode<T: DeserializeOwned>(value: Value) -> Result<T, ApiError> {
    Ok(serde_json::from_value(value)?)
}

/// Strip the `{ "data": ... }` envelope if present.
fn unwrap_data(body: Value) -> Value {
    match body {
        Value::Object(mut map) if map.contains_key("data") => {
            map.remove("data").unwrap_or(Value::Null)
        }
        other => other,
    }
}

/// User-facing message for an error body.
///
/// Uses the backend's `detail` string. Request validation failures carry a
/// list of `{ loc, msg }` items instead, which are joined as
/// `[body.field] msg; ...`.
pub(crate) fn error_message(body: &str) -> String {
    let Ok(value) = serde_json::from_str::<Value>(body) else {
        return DEFAULT_ERROR_MESSAGE.into();
    };
    match value.get("detail") {
        Some(Value::String(detail)) if !detail.trim().is_empty() => detail.clone(),
        Some(Value::Array(items)) => {
            let parts: Vec<String> = items.iter().filter_map(validation_item).collect();
            if parts.is_empty() {
                DEFAULT_ERROR_MESSAGE.into()
            } else {
                parts.join("; ")
            }
        }
        _ => DEFAULT_ERROR_MESSAGE.into(),
    }
}

fn validation_item(item: &Value) -> Option<String> {
    let msg = item.get("msg")?.as_str()?;
    let loc = item
        .get("loc")
        .and_then(Value::as_array)
        .map(|parts| {
            parts
                .iter()
                .map(|p| match p {
                    Value::String(s) => s.clone(),
                    other => other.to_string(),
                })
                .collect::<Vec<_>>()
                .join(".")
        })
        .unwrap_or_default();

    if loc.is_empty() {
        Some(msg.to_string())
    } else {
        Some(format!("[{loc}] {msg}"))
    }
}
