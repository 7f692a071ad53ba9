//! Signed identity assertion carried from the authorizing site back to the
//! target site.
//!
//! An assertion only ever exists as three query parameters of a single
//! redirect; it is never stored.

use crate::identity::UserSecret;
use crate::params::{query_value, PARAM_AUTH, PARAM_EXPIRES, PARAM_USER_ID};
use crate::signer::TokenSigner;
use url::Url;
use xavyo_core::UserId;

/// `{user id, expiry, signature}` as it travels on the wire.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdentityAssertion {
    pub user_id: UserId,
    /// Absolute expiry, unix seconds
    pub expires: i64,
    /// Lowercase hex HMAC-SHA256
    pub signature: String,
}

impl IdentityAssertion {
    /// Signs a fresh assertion for `user_id` valid until `now + ttl_seconds`.
    #[must_use]
    pub fn issue(
        signer: &TokenSigner,
        user_id: UserId,
        user_secret: &UserSecret,
        now: i64,
        ttl_seconds: i64,
    ) -> Self {
        let expires = now.saturating_add(ttl_seconds);
        Self {
            user_id,
            expires,
            signature: signer.signature(user_id, expires, user_secret),
        }
    }

    /// Reads an assertion from the query of `url`.
    ///
    /// Returns `None` when any of the three parameters is absent, empty or
    /// not a valid integer: such a request is simply not an SSO request.
    #[must_use]
    pub fn from_url(url: &Url) -> Option<Self> {
        let signature = query_value(url, PARAM_AUTH)?;
        let user_id = query_value(url, PARAM_USER_ID)?.parse::<UserId>().ok()?;
        let expires = query_value(url, PARAM_EXPIRES)?.trim().parse::<i64>().ok()?;
        Some(Self {
            user_id,
            expires,
            signature,
        })
    }

    /// True once `now` is past the expiry. The expiry second itself is still valid.
    #[must_use]
    pub fn is_expired_at(&self, now: i64) -> bool {
        now > self.expires
    }

    /// Recomputes the signature with `user_secret` and compares in constant time.
    #[must_use]
    pub fn verify(&self, signer: &TokenSigner, user_secret: &UserSecret) -> bool {
        signer.verify(self.user_id, self.expires, user_secret, &self.signature)
    }

    /// Wire form, in the order the parameters are appended to `return_to`.
    #[must_use]
    pub fn query_pairs(&self) -> [(&'static str, String); 3] {
        [
            (PARAM_AUTH, self.signature.clone()),
            (PARAM_USER_ID, self.user_id.to_string()),
            (PARAM_EXPIRES, self.expires.to_string()),
        ]
    }
}
