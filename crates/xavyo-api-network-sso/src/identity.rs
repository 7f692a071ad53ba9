//! User store collaborator: credential-derived secrets and access checks.

use async_trait::async_trait;
use serde::Deserialize;
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::sync::Arc;
use tokio::sync::RwLock;
use xavyo_core::{SiteId, UserId};

/// Number of trailing characters of the credential hash kept out of the secret.
const CREDENTIAL_HASH_TRIM: usize = 2;

/// Per-user secret derived from the user's current credential hash.
///
/// Only ever used as HMAC input; it is never sent over the wire. Rotating
/// a password changes the hash and therefore invalidates every assertion
/// that is still in flight for that user.
#[derive(Clone, PartialEq, Eq)]
pub struct UserSecret(Vec<u8>);

impl UserSecret {
    /// Derives the secret from a stored credential hash.
    ///
    /// Only a prefix of the hash is used (its final two characters are
    /// dropped). Returns `None` when nothing usable is left.
    #[must_use]
    pub fn from_credential_hash(hash: &str) -> Option<Self> {
        let keep = hash.chars().count().checked_sub(CREDENTIAL_HASH_TRIM)?;
        let prefix: String = hash.chars().take(keep).collect();
        if prefix.is_empty() {
            None
        } else {
            Some(Self(prefix.into_bytes()))
        }
    }

    pub(crate) fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

impl fmt::Debug for UserSecret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("UserSecret([REDACTED])")
    }
}

/// Capabilities a user may hold on a site.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Capability {
    /// Minimal membership: may sign in and read the site.
    Read,
    /// Network administration (granted to super admins only).
    ManageNetwork,
}

/// Lookup and verification service over the network's user accounts.
#[async_trait]
pub trait IdentityStore: Send + Sync {
    /// Returns the credential-derived secret for `user_id`, or `None` when
    /// the user is unknown or has no credential state.
    async fn user_secret(&self, user_id: UserId) -> Option<UserSecret>;

    /// Checks whether `user_id` holds `capability` on `site_id`.
    async fn user_can_access(&self, user_id: UserId, site_id: SiteId, capability: Capability)
        -> bool;
}

/// A network account as held by [`InMemoryIdentityStore`].
#[derive(Debug, Clone, Deserialize)]
pub struct NetworkUser {
    pub id: UserId,
    pub login: String,
    /// PHC-formatted credential hash.
    #[serde(rename = "password_hash")]
    pub credential_hash: String,
    #[serde(default)]
    pub super_admin: bool,
    /// Sites the user is a member of.
    #[serde(default)]
    pub sites: HashSet<SiteId>,
}

impl NetworkUser {
    fn can(&self, site_id: SiteId, capability: Capability) -> bool {
        if self.super_admin {
            return true;
        }
        match capability {
            Capability::Read => self.sites.contains(&site_id),
            Capability::ManageNetwork => false,
        }
    }
}

/// In-memory identity store for tests and single-node deployments.
#[derive(Debug, Default, Clone)]
pub struct InMemoryIdentityStore {
    users: Arc<RwLock<HashMap<UserId, NetworkUser>>>,
}

impl InMemoryIdentityStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a store pre-populated with `users`.
    #[must_use]
    pub fn with_users(users: impl IntoIterator<Item = NetworkUser>) -> Self {
        let users = users.into_iter().map(|u| (u.id, u)).collect();
        Self {
            users: Arc::new(RwLock::new(users)),
        }
    }

    /// Inserts or replaces a user.
    pub async fn upsert(&self, user: NetworkUser) {
        self.users.write().await.insert(user.id, user);
    }

    /// Replaces a user's credential hash, as a password change would.
    ///
    /// Returns `false` when the user does not exist.
    pub async fn set_credential_hash(&self, user_id: UserId, hash: String) -> bool {
        match self.users.write().await.get_mut(&user_id) {
            Some(user) => {
                user.credential_hash = hash;
                true
            }
            None => false,
        }
    }

    /// Looks up a user by login name (case-insensitive).
    pub async fn find_by_login(&self, login: &str) -> Option<NetworkUser> {
        self.users
            .read()
            .await
            .values()
            .find(|u| u.login.eq_ignore_ascii_case(login))
            .cloned()
    }

    pub async fn get(&self, user_id: UserId) -> Option<NetworkUser> {
        self.users.read().await.get(&user_id).cloned()
    }
}

#[async_trait]
impl IdentityStore for InMemoryIdentityStore {
    async fn user_secret(&self, user_id: UserId) -> Option<UserSecret> {
        let users = self.users.read().await;
        let user = users.get(&user_id)?;
        UserSecret::from_credential_hash(&user.credential_hash)
    }

    async fn user_can_access(
        &self,
        user_id: UserId,
        site_id: SiteId,
        capability: Capability,
    ) -> bool {
        self.users
            .read()
            .await
            .get(&user_id)
            .is_some_and(|u| u.can(site_id, capability))
    }
}
