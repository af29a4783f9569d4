//! Shared helpers for client integration tests.
//!
//! [`MockBackend`] is an in-process axum server on an ephemeral port. Tests
//! register canned responses per `(method, path)` and inspect every request
//! the client sent.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use axum::body::Bytes;
use axum::extract::State;
use axum::http::header::AUTHORIZATION;
use axum::http::{HeaderMap, Method, StatusCode, Uri};
use axum::response::{IntoResponse, Response};
use axum::{Json, Router};
use serde_json::{json, Value};

use bienestar_client::api::ApiClient;
use bienestar_client::config::ClientConfig;
use bienestar_core::session::{Session, SessionStore, UserProfile, UserRole};

// ---------------------------------------------------------------------------
// Mock backend
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct SeenRequest {
    pub method: Method,
    pub path: String,
    pub query: Option<String>,
    pub authorization: Option<String>,
    pub body: Value,
}

#[derive(Debug, Clone)]
enum Canned {
    Json(StatusCode, Value),
    Raw(StatusCode, &'static str),
}

#[derive(Default)]
struct Routes {
    canned: HashMap<(Method, String), Canned>,
    seen: Vec<SeenRequest>,
}

#[derive(Clone, Default)]
pub struct MockBackend {
    inner: Arc<Mutex<Routes>>,
}

impl MockBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Answer `method path` with a JSON body.
    pub fn respond(&self, method: Method, path: &str, status: StatusCode, body: Value) -> &Self {
        self.inner
            .lock()
            .unwrap()
            .canned
            .insert((method, path.to_string()), Canned::Json(status, body));
        self
    }

    /// Answer `method path` with a non-JSON body.
    pub fn respond_raw(&self, method: Method, path: &str, status: StatusCode, body: &'static str) -> &Self {
        self.inner
            .lock()
            .unwrap()
            .canned
            .insert((method, path.to_string()), Canned::Raw(status, body));
        self
    }

    pub fn seen(&self) -> Vec<SeenRequest> {
        self.inner.lock().unwrap().seen.clone()
    }

    pub fn last_request(&self) -> SeenRequest {
        self.seen().pop().expect("no request reached the mock backend")
    }

    /// Bind to an ephemeral port and serve in the background.
    /// Returns the base URL.
    pub async fn start(&self) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let app = Router::new().fallback(handle).with_state(self.clone());
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{addr}")
    }
}

async fn handle(
    State(mock): State<MockBackend>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let seen = SeenRequest {
        method: method.clone(),
        path: uri.path().to_string(),
        query: uri.query().map(str::to_string),
        authorization: headers
            .get(AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string),
        body: serde_json::from_slice(&body).unwrap_or(Value::Null),
    };

    let mut routes = mock.inner.lock().unwrap();
    routes.seen.push(seen);
    match routes.canned.get(&(method, uri.path().to_string())).cloned() {
        Some(Canned::Json(status, body)) => (status, Json(body)).into_response(),
        Some(Canned::Raw(status, body)) => (status, body).into_response(),
        None => (StatusCode::NOT_FOUND, Json(json!({ "detail": "Not Found" }))).into_response(),
    }
}

// ---------------------------------------------------------------------------
// Client helpers
// ---------------------------------------------------------------------------

pub fn profile(role: UserRole, face_registered: bool) -> UserProfile {
    UserProfile {
        id: "user-1".into(),
        email: "ana@uni.edu.pe".into(),
        rol: role,
        nombre: "Ana".into(),
        apellido: Some("Quispe".into()),
        codigo_alumno: Some("20201234".into()),
        foto_perfil_url: face_registered.then(|| "https://cdn.example/faces/user-1.jpg".to_string()),
    }
}

pub fn session(role: UserRole) -> Session {
    Session::new(profile(role, true), "token-abc".into(), "refresh-xyz".into())
}

/// A client for `base_url` with no one signed in.
pub fn client(base_url: &str) -> (ApiClient, Arc<SessionStore>) {
    let store = Arc::new(SessionStore::in_memory());
    let api = ApiClient::new(&ClientConfig::with_base_url(base_url), Arc::clone(&store))
        .expect("client should build");
    (api, store)
}

/// A client for `base_url` with a student signed in.
pub fn signed_in_client(base_url: &str) -> (ApiClient, Arc<SessionStore>) {
    let (api, store) = client(base_url);
    store.sign_in(session(UserRole::Student)).unwrap();
    (api, store)
}
