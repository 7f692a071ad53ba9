//! Handshake tunables

use serde::Deserialize;

/// Lifetime of a signed identity assertion (2 minutes)
pub const DEFAULT_ASSERTION_TTL_SECONDS: i64 = 120;

/// Persistent session lifetime set on successful finalization (14 days)
pub const DEFAULT_SESSION_MAX_AGE_SECONDS: i64 = 14 * 24 * 3600;

/// Cookie name for local sessions on every network site.
pub const DEFAULT_SESSION_COOKIE_NAME: &str = "xavyo_network_session";

/// Network SSO configuration
#[derive(Debug, Clone, Deserialize)]
pub struct NetworkSsoConfig {
    #[serde(default = "default_assertion_ttl")]
    pub assertion_ttl_seconds: i64,
    #[serde(default = "default_nonce_ttl")]
    pub nonce_ttl_seconds: i64,
    /// Path (relative to a site's base URL) of the login page
    #[serde(default = "default_login_path")]
    pub login_path: String,
    #[serde(default = "default_cookie_name")]
    pub session_cookie_name: String,
    #[serde(default = "default_session_max_age")]
    pub session_max_age_seconds: i64,
}

fn default_assertion_ttl() -> i64 {
    DEFAULT_ASSERTION_TTL_SECONDS
}

fn default_nonce_ttl() -> i64 {
    crate::nonce::DEFAULT_NONCE_TTL_SECONDS
}

fn default_login_path() -> String {
    "login".to_string()
}

fn default_cookie_name() -> String {
    DEFAULT_SESSION_COOKIE_NAME.to_string()
}

fn default_session_max_age() -> i64 {
    DEFAULT_SESSION_MAX_AGE_SECONDS
}

impl Default for NetworkSsoConfig {
    fn default() -> Self {
        Self {
            assertion_ttl_seconds: default_assertion_ttl(),
            nonce_ttl_seconds: default_nonce_ttl(),
            login_path: default_login_path(),
            session_cookie_name: default_cookie_name(),
            session_max_age_seconds: default_session_max_age(),
        }
    }
}
