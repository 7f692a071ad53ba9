//! Site directory collaborator
//!
//! Maps hosts and paths to network sites. Besides building URLs, the
//! registry is the anti-phishing gate: nothing is signed for a URL that
//! does not resolve to a registered site.

use async_trait::async_trait;
use serde::Deserialize;
use std::sync::Arc;
use url::Url;
use xavyo_core::SiteId;

/// A member site of the network
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Site {
    pub id: SiteId,
    /// Host name, including an explicit port when the site is not on the default one
    pub domain: String,
    /// Base path of the site, `/` for a whole-domain site
    #[serde(default = "default_path")]
    pub path: String,
    #[serde(default = "default_scheme")]
    pub scheme: String,
}

fn default_path() -> String {
    "/".to_string()
}

fn default_scheme() -> String {
    "https".to_string()
}

impl Site {
    #[must_use]
    pub fn new(id: SiteId, domain: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            id,
            domain: domain.into(),
            path: path.into(),
            scheme: default_scheme(),
        }
    }

    /// Same site, served over a different scheme
    #[must_use]
    pub fn with_scheme(mut self, scheme: impl Into<String>) -> Self {
        self.scheme = scheme.into();
        self
    }

    /// Base path with exactly one leading and one trailing slash
    #[must_use]
    pub fn normalized_path(&self) -> String {
        let trimmed = self.path.trim_matches('/');
        if trimmed.is_empty() {
            "/".to_string()
        } else {
            format!("/{trimmed}/")
        }
    }

    /// Absolute base URL of the site, e.g. `https://b.example/blog/`
    #[must_use]
    pub fn base_url(&self) -> String {
        format!("{}://{}{}", self.scheme, self.domain, self.normalized_path())
    }

    /// Whether `host` (with optional port) names this site's domain
    #[must_use]
    pub fn matches_host(&self, host: &str) -> bool {
        self.domain.eq_ignore_ascii_case(host)
    }

    /// Whether `path` lies under this site's base path
    #[must_use]
    pub fn contains_path(&self, path: &str) -> bool {
        let base = self.normalized_path();
        if base == "/" {
            return true;
        }
        let mut candidate = path.to_string();
        if !candidate.ends_with('/') {
            candidate.push('/');
        }
        candidate.starts_with(&base)
    }

    #[must_use]
    pub fn is_secure(&self) -> bool {
        self.scheme.eq_ignore_ascii_case("https")
    }
}

/// Returns the `host[:port]` authority of `url` as sites store it.
#[must_use]
pub fn url_authority(url: &Url) -> Option<String> {
    let host = url.host_str()?;
    Some(match url.port() {
        Some(port) => format!("{host}:{port}"),
        None => host.to_string(),
    })
}

/// Site registry trait
#[async_trait]
pub trait SiteRegistry: Send + Sync {
    /// Look up a site by id
    async fn get_site(&self, id: SiteId) -> Option<Site>;

    /// Resolve `host` + `path` to the site serving them
    ///
    /// When several sites share a domain the one with the longest matching
    /// base path wins.
    async fn resolve_site(&self, host: &str, path: &str) -> Option<Site>;

    /// All sites of the network
    async fn sites(&self) -> Vec<Site>;

    /// Base URL of a site, if it exists
    async fn site_base_url(&self, id: SiteId) -> Option<String> {
        self.get_site(id).await.map(|site| site.base_url())
    }

    /// Resolve an absolute URL to a network site
    ///
    /// Only http(s) URLs whose scheme matches the resolved site's own
    /// scheme are accepted, so nothing is ever delivered over a downgraded
    /// connection.
    async fn resolve_url(&self, url: &Url) -> Option<Site> {
        if !matches!(url.scheme(), "http" | "https") {
            return None;
        }
        let authority = url_authority(url)?;
        let site = self.resolve_site(&authority, url.path()).await?;
        site.scheme
            .eq_ignore_ascii_case(url.scheme())
            .then_some(site)
    }
}

/// In-memory site registry
#[derive(Debug, Clone, Default)]
pub struct InMemorySiteRegistry {
    sites: Arc<Vec<Site>>,
}

impl InMemorySiteRegistry {
    #[must_use]
    pub fn new(sites: Vec<Site>) -> Self {
        Self {
            sites: Arc::new(sites),
        }
    }
}

#[async_trait]
impl SiteRegistry for InMemorySiteRegistry {
    async fn get_site(&self, id: SiteId) -> Option<Site> {
        self.sites.iter().find(|s| s.id == id).cloned()
    }

    async fn resolve_site(&self, host: &str, path: &str) -> Option<Site> {
        self.sites
            .iter()
            .filter(|s| s.matches_host(host) && s.contains_path(path))
            .max_by_key(|s| s.normalized_path().len())
            .cloned()
    }

    async fn sites(&self) -> Vec<Site> {
        self.sites.as_ref().clone()
    }
}
