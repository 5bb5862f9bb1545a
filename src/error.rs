// src/error.rs
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum RegistryError {
    #[error("ESP not registered")]
    NotFound(String),

    #[error("ESP '{0}' is offline")]
    Unavailable(String),
}

/// Errors surfaced by the HTTP handlers.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Malformed body, empty or missing id.
    #[error("{0}")]
    Validation(String),

    #[error(transparent)]
    Registry(#[from] RegistryError),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Validation(_) => StatusCode::BAD_REQUEST,
            ApiError::Registry(RegistryError::NotFound(_)) => StatusCode::NOT_FOUND,
            ApiError::Registry(RegistryError::Unavailable(_)) => StatusCode::SERVICE_UNAVAILABLE,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status(), self.to_string()).into_response()
    }
}

/// Failures of the command client, one per way the CLI reports them.
#[derive(Debug, Error)]
pub enum ClientError {
    #[error("could not connect to server at {url}")]
    Connect {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("ESP '{0}' not registered")]
    NotRegistered(String),

    #[error("ESP '{0}' is offline")]
    Offline(String),

    #[error("unexpected response: {0}")]
    Status(reqwest::StatusCode),

    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),
}
