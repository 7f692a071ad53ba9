//! The three stages of the handshake
//!
//! Each stage inspects the request context and either lets the request
//! through, answers with a redirect, or fails the handshake.

pub mod authorize;
pub mod finalize;
pub mod initiate;

pub use authorize::AuthorizeStage;
pub use finalize::FinalizeStage;
pub use initiate::InitiateStage;

use crate::error::{NetworkSsoError, NetworkSsoResult};
use axum::{
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
};
use url::Url;

/// 302 redirect to `location`, optionally setting a cookie on the way.
pub(crate) fn redirect_found(
    location: &Url,
    set_cookie: Option<HeaderValue>,
) -> NetworkSsoResult<Response> {
    let location = HeaderValue::from_str(location.as_str())
        .map_err(|e| NetworkSsoError::Internal(format!("Invalid redirect location: {e}")))?;

    let mut response = (StatusCode::FOUND, [(header::LOCATION, location)]).into_response();
    if let Some(cookie) = set_cookie {
        response.headers_mut().insert(header::SET_COOKIE, cookie);
    }
    // Handshake URLs carry nonces and signatures
    response
        .headers_mut()
        .insert(header::CACHE_CONTROL, HeaderValue::from_static("no-store"));
    Ok(response)
}
