//! Local session collaborator
//!
//! Cookies are scoped to one domain, which is the whole reason the
//! handshake exists: a session here belongs to exactly one site.
//! Cookies are `HttpOnly` and `SameSite=Lax`; `Strict` would hide the
//! freshly set cookie from the last redirect of the handshake, which is a
//! cross-site navigation.

use crate::config::{DEFAULT_SESSION_COOKIE_NAME, DEFAULT_SESSION_MAX_AGE_SECONDS};
use crate::registry::Site;
use async_trait::async_trait;
use axum::http::{header::COOKIE, HeaderMap, HeaderValue};
use chrono::{DateTime, Duration, Utc};
use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::RwLock;
use uuid::Uuid;
use xavyo_core::{SiteId, UserId};

/// Session-related errors
#[derive(Debug, Error, Clone)]
pub enum SessionError {
    /// The cookie value could not be encoded as a header
    #[error("Invalid session cookie: {0}")]
    InvalidCookie(String),

    /// Storage error
    #[error("Session storage error: {0}")]
    StorageError(String),
}

/// Host session mechanism
#[async_trait]
pub trait SessionManager: Send + Sync {
    /// User signed in to `site` by the request carrying `headers`, if any
    async fn current_user(&self, site: &Site, headers: &HeaderMap) -> Option<UserId>;

    /// Establish a persistent session for `user_id` on `site`
    ///
    /// Returns the `Set-Cookie` header value to send back.
    async fn establish(&self, site: &Site, user_id: UserId) -> Result<HeaderValue, SessionError>;

    /// End the session carried by `headers`
    ///
    /// Returns a `Set-Cookie` header value that clears the cookie.
    async fn revoke(&self, site: &Site, headers: &HeaderMap) -> Result<HeaderValue, SessionError>;

    /// Clean up expired sessions, returning how many were dropped
    async fn cleanup_expired(&self) -> u64;
}

/// A local session record
#[derive(Debug, Clone)]
pub struct LocalSession {
    pub id: Uuid,
    pub site_id: SiteId,
    pub user_id: UserId,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl LocalSession {
    pub fn is_expired(&self) -> bool {
        Utc::now() > self.expires_at
    }
}

/// In-memory session manager
#[derive(Debug, Clone)]
pub struct InMemorySessionManager {
    sessions: Arc<RwLock<HashMap<Uuid, LocalSession>>>,
    cookie_name: String,
    max_age_seconds: i64,
}

impl Default for InMemorySessionManager {
    fn default() -> Self {
        Self::new(DEFAULT_SESSION_COOKIE_NAME, DEFAULT_SESSION_MAX_AGE_SECONDS)
    }
}

impl InMemorySessionManager {
    #[must_use]
    pub fn new(cookie_name: impl Into<String>, max_age_seconds: i64) -> Self {
        Self {
            sessions: Arc::new(RwLock::new(HashMap::new())),
            cookie_name: cookie_name.into(),
            max_age_seconds,
        }
    }

    #[must_use]
    pub fn cookie_name(&self) -> &str {
        &self.cookie_name
    }

    /// Number of live session records
    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.sessions.read().await.is_empty()
    }
}

#[async_trait]
impl SessionManager for InMemorySessionManager {
    async fn current_user(&self, site: &Site, headers: &HeaderMap) -> Option<UserId> {
        let session_id = extract_session_cookie(headers, &self.cookie_name)?;
        let sessions = self.sessions.read().await;
        let session = sessions.get(&session_id)?;
        (session.site_id == site.id && !session.is_expired()).then_some(session.user_id)
    }

    async fn establish(&self, site: &Site, user_id: UserId) -> Result<HeaderValue, SessionError> {
        let now = Utc::now();
        let expires_at = Duration::try_seconds(self.max_age_seconds)
            .and_then(|max_age| now.checked_add_signed(max_age))
            .ok_or_else(|| {
                SessionError::StorageError(format!(
                    "Session max age out of range: {}s",
                    self.max_age_seconds
                ))
            })?;
        let session = LocalSession {
            id: Uuid::new_v4(),
            site_id: site.id,
            user_id,
            created_at: now,
            expires_at,
        };
        let cookie = create_session_cookie(&self.cookie_name, session.id, site, self.max_age_seconds);
        let value =
            HeaderValue::from_str(&cookie).map_err(|e| SessionError::InvalidCookie(e.to_string()))?;

        self.sessions.write().await.insert(session.id, session);

        tracing::debug!(site_id = %site.id, user_id = %user_id, "Local session established");
        Ok(value)
    }

    async fn revoke(&self, site: &Site, headers: &HeaderMap) -> Result<HeaderValue, SessionError> {
        if let Some(session_id) = extract_session_cookie(headers, &self.cookie_name) {
            let mut sessions = self.sessions.write().await;
            if sessions
                .get(&session_id)
                .is_some_and(|s| s.site_id == site.id)
            {
                sessions.remove(&session_id);
            }
        }
        let cookie = clear_session_cookie(&self.cookie_name, site);
        HeaderValue::from_str(&cookie).map_err(|e| SessionError::InvalidCookie(e.to_string()))
    }

    async fn cleanup_expired(&self) -> u64 {
        let mut sessions = self.sessions.write().await;
        let before_count = sessions.len();
        sessions.retain(|_, session| !session.is_expired());
        (before_count - sessions.len()) as u64
    }
}

/// Build a persistent session cookie for `site`.
#[must_use]
pub fn create_session_cookie(
    cookie_name: &str,
    session_id: Uuid,
    site: &Site,
    max_age_seconds: i64,
) -> String {
    let secure_flag = if site.is_secure() { "; Secure" } else { "" };
    let path = site.normalized_path();
    format!(
        "{cookie_name}={session_id}; HttpOnly{secure_flag}; SameSite=Lax; Path={path}; Max-Age={max_age_seconds}"
    )
}

/// Build a cookie that clears the session cookie for `site`.
#[must_use]
pub fn clear_session_cookie(cookie_name: &str, site: &Site) -> String {
    let secure_flag = if site.is_secure() { "; Secure" } else { "" };
    let path = site.normalized_path();
    format!("{cookie_name}=; HttpOnly{secure_flag}; SameSite=Lax; Path={path}; Max-Age=0")
}

/// Extract the session ID from request cookies.
///
/// Parses every `Cookie` header (format: "name1=value1; name2=value2").
pub fn extract_session_cookie(headers: &HeaderMap, cookie_name: &str) -> Option<Uuid> {
    let prefix = format!("{cookie_name}=");
    headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|cookies| cookies.split(';'))
        .find_map(|part| part.trim().strip_prefix(&prefix).map(str::to_owned))
        .and_then(|value| Uuid::parse_str(value.trim()).ok())
}
