//! Network SSO error types
//!
//! Every variant is fatal to the current handshake. The user has to start
//! again from a freshly rendered link; retrying the same URL never helps.

use crate::models::{render_error_page, render_login_prompt};
use crate::nonce::NonceError;
use crate::session::SessionError;
use axum::{
    http::StatusCode,
    response::{Html, IntoResponse, Response},
};
use thiserror::Error;
use xavyo_core::SiteId;

/// Result type for network SSO operations
pub type NetworkSsoResult<T> = Result<T, NetworkSsoError>;

/// Network SSO errors
#[derive(Debug, Error)]
pub enum NetworkSsoError {
    /// `from` names a site that is not part of this network
    #[error("Single Sign On is attempting to use an invalid site on this network (site {0}).")]
    UnknownOriginSite(SiteId),

    /// The initiation request carried no nonce
    #[error("Single Sign On was attempted with a missing nonce.")]
    MissingNonce,

    /// The authorizing site has no session for the requester
    #[error("Single Sign On requires that you be logged in.")]
    LoginRequired { login_url: String },

    /// `return_to` does not resolve to a network member
    #[error(
        "Single Sign On failed. The requested site could not be found on this network. \
         If someone gave you this link, they may have sent you a phishing attack."
    )]
    UnrecognizedReturnSite(String),

    /// Nonce missing, unknown, expired, out of scope or replayed
    #[error("Single Sign On was attempted with a missing or bad nonce.")]
    InvalidNonce(Option<NonceError>),

    /// No credential-derived secret for the signed-in user
    #[error(
        "Single Sign On failed. Your account has no usable credential state. \
         Try changing your password."
    )]
    MissingCredentialState,

    /// The network-wide signing secret is not configured
    #[error("Single Sign On failed. The network is not securely configured (missing signing secret).")]
    SigningSecretMissing,

    /// The identity assertion is past its expiry
    #[error("Your Single Sign On link has expired. Please return to the dashboard and try again.")]
    AssertionExpired,

    /// Signature comparison failed
    #[error("Single Sign On has found an error in the URL that you are trying to use.")]
    SignatureMismatch,

    /// Signed-in identity is not a member of this site
    #[error(
        "Single Sign On is trying to log you in, but your user account is not authorized for \
         this site. Please contact a network admin and ask them to add you to this site."
    )]
    AccessDenied,

    /// Host session mechanism failed
    #[error("Session error: {0}")]
    Session(#[from] SessionError),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl NetworkSsoError {
    /// Stable machine-readable code
    #[must_use]
    pub fn error_code(&self) -> &'static str {
        match self {
            NetworkSsoError::UnknownOriginSite(_) => "invalid_network_site",
            NetworkSsoError::MissingNonce => "missing_nonce",
            NetworkSsoError::LoginRequired { .. } => "login_required",
            NetworkSsoError::UnrecognizedReturnSite(_) => "unrecognized_return_site",
            NetworkSsoError::InvalidNonce(_) => "invalid_nonce",
            NetworkSsoError::MissingCredentialState => "missing_credential_state",
            NetworkSsoError::SigningSecretMissing => "signing_secret_missing",
            NetworkSsoError::AssertionExpired => "assertion_expired",
            NetworkSsoError::SignatureMismatch => "signature_mismatch",
            NetworkSsoError::AccessDenied => "access_denied",
            NetworkSsoError::Session(_) => "session_error",
            NetworkSsoError::Internal(_) => "internal_error",
        }
    }

    #[must_use]
    pub fn status_code(&self) -> StatusCode {
        match self {
            NetworkSsoError::UnknownOriginSite(_)
            | NetworkSsoError::MissingNonce
            | NetworkSsoError::UnrecognizedReturnSite(_)
            | NetworkSsoError::AssertionExpired
            | NetworkSsoError::SignatureMismatch => StatusCode::BAD_REQUEST,
            NetworkSsoError::LoginRequired { .. } => StatusCode::UNAUTHORIZED,
            NetworkSsoError::InvalidNonce(_) | NetworkSsoError::AccessDenied => {
                StatusCode::FORBIDDEN
            }
            NetworkSsoError::MissingCredentialState
            | NetworkSsoError::SigningSecretMissing
            | NetworkSsoError::Session(_)
            | NetworkSsoError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Text shown to the user
    ///
    /// Storage and internal details stay in the logs.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            NetworkSsoError::Session(e) => {
                tracing::error!(error = %e, "Network SSO session error");
                "Single Sign On failed while signing you in. Please try again.".to_string()
            }
            NetworkSsoError::Internal(msg) => {
                tracing::error!("Network SSO internal error: {}", msg);
                "An internal error occurred".to_string()
            }
            NetworkSsoError::InvalidNonce(Some(NonceError::StorageError(msg))) => {
                tracing::error!("Network SSO nonce storage error: {}", msg);
                self.to_string()
            }
            NetworkSsoError::UnknownOriginSite(_) => {
                "Single Sign On is attempting to use an invalid site on this network.".to_string()
            }
            _ => self.to_string(),
        }
    }
}

impl IntoResponse for NetworkSsoError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let code = self.error_code();
        let message = self.user_message();

        let body = match &self {
            NetworkSsoError::LoginRequired { login_url } => {
                render_login_prompt(code, &message, login_url)
            }
            _ => render_error_page(code, &message),
        };

        (status, Html(body)).into_response()
    }
}
