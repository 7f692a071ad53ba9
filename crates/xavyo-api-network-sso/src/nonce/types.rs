//! Nonce records and errors

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use chrono::{DateTime, Duration, Utc};
use rand::RngCore;
use std::fmt;
use thiserror::Error;
use xavyo_core::{SiteId, UserId};

/// Default lifetime of an unused nonce (10 minutes)
pub const DEFAULT_NONCE_TTL_SECONDS: i64 = 600;

/// Number of random bytes in a nonce value
const NONCE_BYTES: usize = 32;

/// What a nonce may be used for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NonceScope {
    /// Site that rendered the link and will authorize the handshake
    pub origin: SiteId,
    /// Site the user is switching to
    pub destination: SiteId,
    /// User signed in on the origin when the link was rendered
    pub user: Option<UserId>,
}

impl NonceScope {
    #[must_use]
    pub fn new(origin: SiteId, destination: SiteId, user: Option<UserId>) -> Self {
        Self {
            origin,
            destination,
            user,
        }
    }
}

impl fmt::Display for NonceScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.user {
            Some(user) => write!(f, "{}->{} (user {user})", self.origin, self.destination),
            None => write!(f, "{}->{} (anonymous)", self.origin, self.destination),
        }
    }
}

/// A stored handshake nonce
#[derive(Clone)]
pub struct HandshakeNonce {
    /// Opaque value carried in the `nonce` query parameter
    pub value: String,
    pub scope: NonceScope,
    pub created_at: DateTime<Utc>,
    /// When this nonce expires (created_at + TTL)
    pub expires_at: DateTime<Utc>,
    /// When this nonce was consumed (None = unused)
    pub consumed_at: Option<DateTime<Utc>>,
}

impl HandshakeNonce {
    /// Create a fresh nonce with a random value
    ///
    /// Fails when `ttl_seconds` cannot be added to the current time.
    pub fn new(scope: NonceScope, ttl_seconds: i64) -> Result<Self, NonceError> {
        let now = Utc::now();
        let expires_at = Duration::try_seconds(ttl_seconds)
            .and_then(|ttl| now.checked_add_signed(ttl))
            .ok_or_else(|| {
                NonceError::StorageError(format!("Nonce TTL out of range: {ttl_seconds}s"))
            })?;

        let mut bytes = [0u8; NONCE_BYTES];
        rand::rngs::OsRng.fill_bytes(&mut bytes);
        Ok(Self {
            value: URL_SAFE_NO_PAD.encode(bytes),
            scope,
            created_at: now,
            expires_at,
            consumed_at: None,
        })
    }

    pub fn is_expired(&self) -> bool {
        Utc::now() > self.expires_at
    }

    pub fn is_consumed(&self) -> bool {
        self.consumed_at.is_some()
    }

    /// Mark this nonce as consumed
    pub fn consume(&mut self) {
        self.consumed_at = Some(Utc::now());
    }

    /// Validate that this nonce may still be used
    pub fn validate(&self) -> Result<(), NonceError> {
        if let Some(consumed_at) = self.consumed_at {
            return Err(NonceError::AlreadyConsumed { consumed_at });
        }
        if self.is_expired() {
            return Err(NonceError::Expired {
                expired_at: self.expires_at,
            });
        }
        Ok(())
    }
}

impl fmt::Debug for HandshakeNonce {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HandshakeNonce")
            .field("value", &"[REDACTED]")
            .field("scope", &self.scope)
            .field("created_at", &self.created_at)
            .field("expires_at", &self.expires_at)
            .field("consumed_at", &self.consumed_at)
            .finish()
    }
}

/// Nonce-related errors
///
/// Variants never carry the nonce value itself.
#[derive(Debug, Error, Clone)]
pub enum NonceError {
    /// Nonce was never issued by this store (or was already cleaned up)
    #[error("Nonce not found")]
    NotFound,

    /// Nonce is past its TTL
    #[error("Nonce expired at {expired_at}")]
    Expired { expired_at: DateTime<Utc> },

    /// Nonce was already used (replay detected)
    #[error("Replay detected: nonce was already used at {consumed_at}")]
    AlreadyConsumed { consumed_at: DateTime<Utc> },

    /// Nonce was issued for a different site pair or user
    #[error("Nonce was issued for {issued}, not {presented}")]
    ScopeMismatch {
        issued: NonceScope,
        presented: NonceScope,
    },

    /// Duplicate nonce value
    #[error("Duplicate nonce value")]
    Duplicate,

    /// Storage error
    #[error("Nonce storage error: {0}")]
    StorageError(String),
}
