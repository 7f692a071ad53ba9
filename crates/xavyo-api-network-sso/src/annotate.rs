//! Decorates cross-domain links with handshake-initiation parameters
//!
//! The only thing this module does besides rewriting URLs is issuing a
//! nonce per rewritten link.

use crate::context::RequestContext;
use crate::nonce::{NonceScope, NonceStore};
use crate::params::{with_query_args, PARAM_FROM, PARAM_NONCE};
use crate::registry::{url_authority, SiteRegistry};
use crate::state::NetworkSsoState;
use serde::Serialize;
use std::sync::Arc;
use url::Url;

/// Id prefixes of site-switcher entries that lead to network sites.
const SWITCHER_PREFIXES: [&str; 2] = ["blog", "network-admin"];

/// One entry of a site-switcher menu.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SiteSwitcherNode {
    pub id: String,
    pub title: String,
    pub href: String,
}

impl SiteSwitcherNode {
    #[must_use]
    pub fn new(id: impl Into<String>, title: impl Into<String>, href: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            href: href.into(),
        }
    }

    fn is_site_link(&self) -> bool {
        !self.href.is_empty() && SWITCHER_PREFIXES.iter().any(|p| self.id.starts_with(p))
    }
}

/// Adds `from` and a fresh nonce to links that lead to another network site.
#[derive(Clone)]
pub struct LinkAnnotator {
    registry: Arc<dyn SiteRegistry>,
    nonces: Arc<dyn NonceStore>,
}

impl LinkAnnotator {
    #[must_use]
    pub fn new(registry: Arc<dyn SiteRegistry>, nonces: Arc<dyn NonceStore>) -> Self {
        Self { registry, nonces }
    }

    #[must_use]
    pub fn from_state(state: &NetworkSsoState) -> Self {
        Self::new(state.registry.clone(), state.nonces.clone())
    }

    /// Returns `link`, annotated when it points at another network site.
    ///
    /// Left unchanged: links on the current domain, links outside the
    /// network, unparseable links, and every link of an anonymous request.
    pub async fn annotate(&self, ctx: &RequestContext, link: &str) -> String {
        let Some(user_id) = ctx.user else {
            return link.to_string();
        };
        let Ok(url) = Url::parse(link) else {
            return link.to_string();
        };
        match url_authority(&url) {
            Some(authority) if !ctx.site.matches_host(&authority) => {}
            _ => return link.to_string(),
        }
        let Some(target) = self.registry.resolve_url(&url).await else {
            return link.to_string();
        };

        let scope = NonceScope::new(ctx.current_site_id(), target.id, Some(user_id));
        let nonce = match self.nonces.issue(scope).await {
            Ok(nonce) => nonce,
            Err(e) => {
                tracing::error!(
                    site_id = %ctx.current_site_id(),
                    target_site_id = %target.id,
                    error = %e,
                    "Failed to issue handshake nonce, leaving link as is"
                );
                return link.to_string();
            }
        };

        let from = ctx.current_site_id().to_string();
        with_query_args(&url, &[(PARAM_FROM, from.as_str()), (PARAM_NONCE, nonce.value.as_str())])
            .to_string()
    }

    /// Annotates the site entries of a site-switcher menu.
    ///
    /// Only entries whose id starts with `blog` or `network-admin` and that
    /// carry a link are touched.
    pub async fn annotate_site_switcher(
        &self,
        ctx: &RequestContext,
        nodes: Vec<SiteSwitcherNode>,
    ) -> Vec<SiteSwitcherNode> {
        let mut annotated = Vec::with_capacity(nodes.len());
        for mut node in nodes {
            if node.is_site_link() {
                node.href = self.annotate(ctx, &node.href).await;
            }
            annotated.push(node);
        }
        annotated
    }
}
