//! Shared state of the node.

use crate::config::NodeConfig;
use crate::credentials::CredentialHasher;
use std::sync::Arc;
use std::time::Instant;
use xavyo_api_network_sso::{
    create_network_sso_state, InMemoryIdentityStore, InMemoryNonceStore, InMemorySessionManager,
    InMemorySiteRegistry, LinkAnnotator, NetworkSsoState, Site,
};

/// State shared by every route of the node.
#[derive(Clone)]
pub struct AppState {
    pub sso: NetworkSsoState,
    /// Concrete store, for login-name lookups
    pub identity: Arc<InMemoryIdentityStore>,
    pub hasher: CredentialHasher,
    pub annotator: LinkAnnotator,
    /// Sites served by this node, in configuration order
    pub sites: Vec<Site>,
    pub started_at: Instant,
}

impl AppState {
    /// Builds the in-memory network described by `config`.
    #[must_use]
    pub fn from_config(config: &NodeConfig, hasher: CredentialHasher) -> Self {
        let registry = Arc::new(InMemorySiteRegistry::new(config.network.sites.clone()));
        let identity = Arc::new(InMemoryIdentityStore::with_users(
            config.network.users.iter().cloned(),
        ));
        let nonces = Arc::new(InMemoryNonceStore::with_ttl(config.sso.nonce_ttl_seconds));
        let sessions = Arc::new(InMemorySessionManager::new(
            config.sso.session_cookie_name.clone(),
            config.sso.session_max_age_seconds,
        ));

        let sso = create_network_sso_state(
            registry,
            identity.clone(),
            nonces,
            sessions,
            config.network_secret(),
            config.sso.clone(),
        );

        Self {
            annotator: LinkAnnotator::from_state(&sso),
            sso,
            identity,
            hasher,
            sites: config.network.sites.clone(),
            started_at: Instant::now(),
        }
    }
}
