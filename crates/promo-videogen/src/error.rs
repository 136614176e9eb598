//! Video generation error types.

use promo_models::BackendKind;
use thiserror::Error;

pub type VideogenResult<T> = Result<T, VideogenError>;

#[derive(Debug, Error)]
pub enum VideogenError {
    /// Network failure or non-2xx response while talking to a backend.
    /// Retains the backend name and the original cause for diagnostics.
    #[error("{backend} request failed: {message}")]
    Request {
        backend: BackendKind,
        message: String,
    },

    /// The backend answered 2xx but the body was not in the expected shape.
    #[error("{backend} returned an unexpected response: {message}")]
    InvalidResponse {
        backend: BackendKind,
        message: String,
    },

    /// Transport failure while downloading a finished artifact.
    #[error("artifact fetch failed: {0}")]
    Fetch(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl VideogenError {
    pub fn request(backend: BackendKind, message: impl Into<String>) -> Self {
        Self::Request {
            backend,
            message: message.into(),
        }
    }

    pub fn invalid_response(backend: BackendKind, message: impl Into<String>) -> Self {
        Self::InvalidResponse {
            backend,
            message: message.into(),
        }
    }

    pub fn fetch(message: impl Into<String>) -> Self {
        Self::Fetch(message.into())
    }
}
