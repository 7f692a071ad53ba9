//! Errors of the node's own pages (login, logout, site switcher).

use crate::credentials::CredentialError;
use axum::{
    http::StatusCode,
    response::{Html, IntoResponse, Response},
};
use thiserror::Error;
use xavyo_api_network_sso::{models::render_error_page, NetworkSsoError, SessionError};

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("This host is not a site of the network.")]
    UnknownHost,

    #[error("You must be logged in to see this page.")]
    NotSignedIn,

    #[error("Unknown username or incorrect password.")]
    InvalidCredentials,

    #[error("Credential error: {0}")]
    Credential(#[from] CredentialError),

    #[error(transparent)]
    Sso(#[from] NetworkSsoError),

    #[error("Session error: {0}")]
    Session(#[from] SessionError),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl ServerError {
    pub fn error_code(&self) -> &'static str {
        match self {
            ServerError::UnknownHost => "unknown_host",
            ServerError::NotSignedIn => "not_signed_in",
            ServerError::InvalidCredentials => "invalid_credentials",
            ServerError::Credential(_) => "credential_error",
            ServerError::Sso(e) => e.error_code(),
            ServerError::Session(_) => "session_error",
            ServerError::Internal(_) => "internal_error",
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            ServerError::UnknownHost => StatusCode::NOT_FOUND,
            ServerError::NotSignedIn | ServerError::InvalidCredentials => StatusCode::UNAUTHORIZED,
            ServerError::Sso(e) => e.status_code(),
            ServerError::Credential(_) | ServerError::Session(_) | ServerError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        if let ServerError::Sso(e) = self {
            return e.into_response();
        }

        let message = match &self {
            ServerError::Credential(e) => {
                tracing::error!(error = %e, "Credential verification failed");
                "An internal error occurred".to_string()
            }
            ServerError::Session(e) => {
                tracing::error!(error = %e, "Session store failure");
                "An internal error occurred".to_string()
            }
            ServerError::Internal(msg) => {
                tracing::error!("Internal error: {}", msg);
                "An internal error occurred".to_string()
            }
            other => other.to_string(),
        };

        (
            self.status_code(),
            Html(render_error_page(self.error_code(), &message)),
        )
            .into_response()
    }
}
