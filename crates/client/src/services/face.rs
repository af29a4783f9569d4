//! Face registration and verification.
//!
//! A user with a registered face must pass verification after every login
//! before the route guard lets them into their home area.

use serde::{Deserialize, Serialize};

use bienestar_core::access::{home_route, Route};
use bienestar_core::error::CoreError;

use crate::api::ApiClient;
use crate::error::ApiError;

#[derive(Debug, Serialize)]
struct RegisterRequest<'a> {
    user_id: &'a str,
    image_base64: &'a str,
}

#[derive(Debug, Deserialize)]
struct RegisterResponse {
    #[serde(default)]
    message: Option<String>,
}

#[derive(Debug, Serialize)]
struct VerifyRequest<'a> {
    user_id: &'a str,
    frame_base64: &'a str,
}

#[derive(Debug, Deserialize)]
struct VerifyResponse {
    #[serde(default)]
    verified: bool,
}

/// Outcome of a verification attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FaceCheck {
    /// The session is now verified; continue to this route.
    Verified(Route),
    Rejected,
}

pub struct FaceApi<'a> {
    api: &'a ApiClient,
}

impl ApiClient {
    pub fn face(&self) -> FaceApi<'_> {
        FaceApi { api: self }
    }
}

impl FaceApi<'_> {
    /// Store the reference face of `user_id`. Returns the backend's message.
    pub async fn register(&self, user_id: &str, image_base64: &str) -> Result<String, ApiError> {
        let response: RegisterResponse = self
            .api
            .post(
                "/face/register",
                &[],
                &RegisterRequest {
                    user_id,
                    image_base64,
                },
            )
            .await?;
        tracing::info!(user_id, "Face registered");
        Ok(response.message.unwrap_or_default())
    }

    /// Compare one camera frame with the stored face.
    pub async fn verify(&self, user_id: &str, frame_base64: &str) -> Result<bool, ApiError> {
        let response: VerifyResponse = self
            .api
            .post(
                "/face/verify",
                &[],
                &VerifyRequest {
                    user_id,
                    frame_base64,
                },
            )
            .await?;
        Ok(response.verified)
    }

    /// Verify the signed-in user and, on a match, mark the session verified.
    pub async fn verify_session(&self, frame_base64: &str) -> Result<FaceCheck, ApiError> {
        let session = self
            .api
            .session()
            .current()
            .ok_or_else(|| CoreError::Unauthorized("no active session".into()))?;

        if !self.verify(&session.user.id, frame_base64).await? {
            tracing::warn!(user_id = %session.user.id, "Face verification rejected");
            return Ok(FaceCheck::Rejected);
        }

        self.api.session().mark_face_verified()?;
        tracing::info!(user_id = %session.user.id, "Face verified");
        Ok(FaceCheck::Verified(home_route(session.user.rol)))
    }
}
