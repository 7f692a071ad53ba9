//! Nonce storage
//!
//! The store is the only shared mutable state of the handshake; `consume`
//! must check and mark a nonce in one indivisible step so that two racing
//! requests carrying the same nonce cannot both succeed.

use super::types::{HandshakeNonce, NonceError, NonceScope, DEFAULT_NONCE_TTL_SECONDS};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

/// Nonce store trait
#[async_trait]
pub trait NonceStore: Send + Sync {
    /// Lifetime given to nonces issued by this store
    fn ttl_seconds(&self) -> i64 {
        DEFAULT_NONCE_TTL_SECONDS
    }

    /// Store a nonce record
    async fn store(&self, nonce: HandshakeNonce) -> Result<(), NonceError>;

    /// Issue and store a fresh nonce for `scope`
    async fn issue(&self, scope: NonceScope) -> Result<HandshakeNonce, NonceError> {
        let nonce = HandshakeNonce::new(scope, self.ttl_seconds())?;
        self.store(nonce.clone()).await?;
        Ok(nonce)
    }

    /// Validate and consume a nonce atomically
    ///
    /// Fails when the nonce is unknown, was issued for another scope, has
    /// expired or was already consumed. A scope mismatch leaves the nonce
    /// untouched.
    async fn consume(&self, value: &str, scope: &NonceScope) -> Result<HandshakeNonce, NonceError>;

    /// Clean up expired nonces
    ///
    /// Returns the number of nonces deleted
    async fn cleanup_expired(&self) -> Result<u64, NonceError>;
}

/// In-memory nonce store
#[derive(Debug, Clone)]
pub struct InMemoryNonceStore {
    nonces: Arc<RwLock<HashMap<String, HandshakeNonce>>>,
    ttl_seconds: i64,
}

impl Default for InMemoryNonceStore {
    fn default() -> Self {
        Self::with_ttl(DEFAULT_NONCE_TTL_SECONDS)
    }
}

impl InMemoryNonceStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_ttl(ttl_seconds: i64) -> Self {
        Self {
            nonces: Arc::new(RwLock::new(HashMap::new())),
            ttl_seconds,
        }
    }

    /// Number of records currently held, consumed ones included
    pub async fn len(&self) -> usize {
        self.nonces.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.nonces.read().await.is_empty()
    }
}

#[async_trait]
impl NonceStore for InMemoryNonceStore {
    fn ttl_seconds(&self) -> i64 {
        self.ttl_seconds
    }

    async fn store(&self, nonce: HandshakeNonce) -> Result<(), NonceError> {
        let mut nonces = self.nonces.write().await;

        if nonces.contains_key(&nonce.value) {
            return Err(NonceError::Duplicate);
        }

        nonces.insert(nonce.value.clone(), nonce);
        Ok(())
    }

    async fn consume(&self, value: &str, scope: &NonceScope) -> Result<HandshakeNonce, NonceError> {
        let mut nonces = self.nonces.write().await;

        let nonce = nonces.get_mut(value).ok_or(NonceError::NotFound)?;

        if nonce.scope != *scope {
            return Err(NonceError::ScopeMismatch {
                issued: nonce.scope,
                presented: *scope,
            });
        }

        nonce.validate()?;
        nonce.consume();

        tracing::debug!(
            origin_site_id = %scope.origin,
            target_site_id = %scope.destination,
            "Handshake nonce consumed"
        );

        Ok(nonce.clone())
    }

    async fn cleanup_expired(&self) -> Result<u64, NonceError> {
        let mut nonces = self.nonces.write().await;
        let before_count = nonces.len();

        nonces.retain(|_, nonce| !nonce.is_expired());

        let deleted = (before_count - nonces.len()) as u64;

        if deleted > 0 {
            tracing::debug!(deleted = deleted, "Cleaned up expired handshake nonces");
        }

        Ok(deleted)
    }
}
