//! Cross-domain single sign-on for multi-domain site networks
//!
//! Browser cookies are per domain, so a user signed in to one site of a
//! network is anonymous on every other domain. This crate carries a proof of
//! identity across domains with a three-hop redirect handshake:
//!
//! 1. A link rendered on site A ([`LinkAnnotator`]) carries `from` and a
//!    single-use nonce to site B.
//! 2. Site B ([`handlers::InitiateStage`]) sends the browser back to site A
//!    with `return_to` and the nonce.
//! 3. Site A ([`handlers::AuthorizeStage`]) checks that `return_to` is a
//!    network member, consumes the nonce and redirects back with a signed,
//!    two-minute [`IdentityAssertion`].
//! 4. Site B ([`handlers::FinalizeStage`]) verifies expiry, signature and
//!    membership, then opens a local session.
//!
//! The stages run as an ordered [`HandshakeChain`] inside
//! [`network_sso_middleware`]. Sites, users, nonces and sessions are reached
//! through the [`SiteRegistry`], [`IdentityStore`], [`NonceStore`] and
//! [`SessionManager`] traits; in-memory implementations are provided.

pub mod annotate;
pub mod assertion;
pub mod chain;
pub mod config;
pub mod context;
pub mod error;
pub mod handlers;
pub mod identity;
pub mod models;
pub mod nonce;
pub mod params;
pub mod registry;
pub mod session;
pub mod signer;
pub mod state;


pub use annotate::{LinkAnnotator, SiteSwitcherNode};
pub use assertion::IdentityAssertion;
pub use chain::{build_context, network_sso_middleware, HandshakeChain, HandshakeStage, StageOutcome};
pub use config::NetworkSsoConfig;
pub use context::RequestContext;
pub use error::{NetworkSsoError, NetworkSsoResult};
pub use identity::{Capability, IdentityStore, InMemoryIdentityStore, NetworkUser, UserSecret};
pub use nonce::{HandshakeNonce, InMemoryNonceStore, NonceError, NonceScope, NonceStore};
pub use registry::{InMemorySiteRegistry, Site, SiteRegistry};
pub use session::{InMemorySessionManager, SessionError, SessionManager};
pub use signer::{NetworkSecret, TokenSigner};
pub use state::{create_network_sso_state, NetworkSsoState};

use axum::{middleware, Router};

/// Mounts the handshake middleware in front of every route of `router`.
pub fn with_network_sso(router: Router, state: NetworkSsoState) -> Router {
    router.layer(middleware::from_fn_with_state(state, network_sso_middleware))
}
