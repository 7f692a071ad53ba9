//! Shared state of the handshake middleware

use crate::chain::HandshakeChain;
use crate::config::NetworkSsoConfig;
use crate::error::{NetworkSsoError, NetworkSsoResult};
use crate::identity::IdentityStore;
use crate::nonce::NonceStore;
use crate::registry::SiteRegistry;
use crate::session::SessionManager;
use crate::signer::{NetworkSecret, TokenSigner};
use std::sync::Arc;

/// Collaborators and settings shared by every stage of the handshake.
#[derive(Clone)]
pub struct NetworkSsoState {
    pub registry: Arc<dyn SiteRegistry>,
    pub identity: Arc<dyn IdentityStore>,
    pub nonces: Arc<dyn NonceStore>,
    pub sessions: Arc<dyn SessionManager>,
    /// `None` when the network signing secret is not configured
    pub signer: Option<TokenSigner>,
    pub config: Arc<NetworkSsoConfig>,
    pub chain: Arc<HandshakeChain>,
}

impl NetworkSsoState {
    /// The network signer, or `SigningSecretMissing` when none is configured.
    pub fn signer(&self) -> NetworkSsoResult<&TokenSigner> {
        self.signer.as_ref().ok_or(NetworkSsoError::SigningSecretMissing)
    }

    /// Replaces the stage chain.
    #[must_use]
    pub fn with_chain(mut self, chain: HandshakeChain) -> Self {
        self.chain = Arc::new(chain);
        self
    }
}

impl std::fmt::Debug for NetworkSsoState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NetworkSsoState")
            .field("signer", &self.signer)
            .field("config", &self.config)
            .field("chain", &self.chain)
            .finish_non_exhaustive()
    }
}

/// Create network SSO state with the default stage chain
#[must_use]
pub fn create_network_sso_state(
    registry: Arc<dyn SiteRegistry>,
    identity: Arc<dyn IdentityStore>,
    nonces: Arc<dyn NonceStore>,
    sessions: Arc<dyn SessionManager>,
    secret: Option<NetworkSecret>,
    config: NetworkSsoConfig,
) -> NetworkSsoState {
    NetworkSsoState {
        registry,
        identity,
        nonces,
        sessions,
        signer: secret.map(TokenSigner::new),
        config: Arc::new(config),
        chain: Arc::new(HandshakeChain::default()),
    }
}
