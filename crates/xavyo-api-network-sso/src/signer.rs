//! HMAC-SHA256 signing of identity assertions.
//!
//! The signed message is the ordered concatenation
//!
//! ```text
//! {user_id} || {expires} || {user_secret}
//! ```
//!
//! where `user_id` and `expires` are ASCII decimal integers (`expires` is a
//! signed unix timestamp in seconds), `||` is the literal two-byte field
//! separator and `user_secret` is the raw credential-derived secret. The MAC
//! is keyed with the network-wide secret and travels as lowercase hex.
//!
//! Changing this layout invalidates every assertion in flight across the
//! network, so both sides of a handshake must run the same version.

use crate::identity::UserSecret;
use hmac::{Hmac, Mac};
use sha2::Sha256;
use std::fmt;
use subtle::ConstantTimeEq;
use xavyo_core::UserId;

type HmacSha256 = Hmac<Sha256>;

/// Separator between fields of the signed message.
pub const FIELD_SEPARATOR: &str = "||";

/// Network-wide signing secret shared by every site of the network.
#[derive(Clone)]
pub struct NetworkSecret(Vec<u8>);

impl NetworkSecret {
    /// Wraps a secret. Returns `None` for an empty secret.
    #[must_use]
    pub fn new(secret: impl Into<Vec<u8>>) -> Option<Self> {
        let secret = secret.into();
        if secret.is_empty() {
            None
        } else {
            Some(Self(secret))
        }
    }

    fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

impl fmt::Debug for NetworkSecret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("NetworkSecret([REDACTED])")
    }
}

/// Computes and checks assertion signatures. Holds no state besides the key.
#[derive(Debug, Clone)]
pub struct TokenSigner {
    secret: NetworkSecret,
}

impl TokenSigner {
    #[must_use]
    pub fn new(secret: NetworkSecret) -> Self {
        Self { secret }
    }

    /// Builds the exact byte string covered by the signature.
    #[must_use]
    pub fn signing_message(user_id: UserId, expires: i64, user_secret: &UserSecret) -> Vec<u8> {
        let mut message = format!("{user_id}{FIELD_SEPARATOR}{expires}{FIELD_SEPARATOR}").into_bytes();
        message.extend_from_slice(user_secret.as_bytes());
        message
    }

    /// Signs `(user_id, expires, user_secret)`, returning a hex-encoded HMAC-SHA256.
    #[must_use]
    pub fn signature(&self, user_id: UserId, expires: i64, user_secret: &UserSecret) -> String {
        let mut mac = HmacSha256::new_from_slice(self.secret.as_bytes())
            .expect("HMAC can take key of any size");
        mac.update(&Self::signing_message(user_id, expires, user_secret));
        hex::encode(mac.finalize().into_bytes())
    }

    /// Checks a received signature in constant time.
    ///
    /// The result is a bare boolean: callers learn nothing about where a
    /// mismatch occurred.
    #[must_use]
    pub fn verify(
        &self,
        user_id: UserId,
        expires: i64,
        user_secret: &UserSecret,
        received: &str,
    ) -> bool {
        let expected = self.signature(user_id, expires, user_secret);
        constant_time_eq(expected.as_bytes(), received.as_bytes())
    }
}

/// Constant-time comparison to prevent timing attacks.
fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    a.ct_eq(b).into()
}
