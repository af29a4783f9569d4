use bienestar_core::error::CoreError;
use bienestar_core::validation::FieldErrors;

/// Message used when the backend gives no usable `detail`.
pub const DEFAULT_ERROR_MESSAGE: &str = "request failed";

/// Errors from the backend REST layer.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// The request never got a response (connection, DNS, timeout).
    #[error("HTTP request failed: {0}")]
    Network(#[from] reqwest::Error),

    /// The backend answered with a non-2xx status.
    #[error("API error ({status}): {message}")]
    Status {
        status: u16,
        /// The backend's `detail`, or [`DEFAULT_ERROR_MESSAGE`].
        message: String,
    },

    /// A 2xx body did not have the expected shape.
    #[error("Failed to decode response: {0}")]
    Decode(#[from] serde_json::Error),

    /// Rejected locally before any request was sent.
    #[error("Invalid input: {0}")]
    Invalid(FieldErrors),

    #[error(transparent)]
    Core(#[from] CoreError),
}

impl ApiError {
    /// HTTP status of the failure; 0 when no response was received.
    pub fn status(&self) -> u16 {
        match self {
            ApiError::Status { status, .. } => *status,
            _ => 0,
        }
    }

    pub fn is_unauthorized(&self) -> bool {
        self.status() == 401
    }

    pub fn field_errors(&self) -> Option<&FieldErrors> {
        match self {
            ApiError::Invalid(errors) => Some(errors),
            _ => None,
        }
    }
}

impl From<FieldErrors> for ApiError {
    fn from(errors: FieldErrors) -> Self {
        ApiError::Invalid(errors)
    }
}
