//! Single-use handshake nonces
//!
//! A nonce is issued when a cross-domain link is rendered and consumed by
//! the authorizing site. It is bound to the (origin, destination) site pair
//! and to the user the link was rendered for.

mod store;
mod types;

pub use store::{InMemoryNonceStore, NonceStore};
pub use types::{HandshakeNonce, NonceError, NonceScope, DEFAULT_NONCE_TTL_SECONDS};
