//! Per-request context handed to every handshake stage.

use crate::params::{query_value, without_query_args};
use crate::registry::Site;
use url::Url;
use xavyo_core::{SiteId, UserId};

/// Everything a stage needs to know about the inbound request.
///
/// Built once per request by the middleware and also inserted into the
/// request extensions, so application handlers can read it.
#[derive(Debug, Clone)]
pub struct RequestContext {
    /// The network site serving this request
    pub site: Site,
    /// Absolute URL of this request, query string included
    pub current_url: Url,
    /// User with a valid local session on `site`, if any
    pub user: Option<UserId>,
}

impl RequestContext {
    #[must_use]
    pub fn new(site: Site, current_url: Url, user: Option<UserId>) -> Self {
        Self {
            site,
            current_url,
            user,
        }
    }

    #[must_use]
    pub fn current_site_id(&self) -> SiteId {
        self.site.id
    }

    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        self.user.is_some()
    }

    /// Non-empty value of a query parameter of the current URL
    #[must_use]
    pub fn query_value(&self, name: &str) -> Option<String> {
        query_value(&self.current_url, name)
    }

    /// The current URL with the named query parameters removed
    #[must_use]
    pub fn url_without(&self, names: &[&str]) -> Url {
        without_query_args(&self.current_url, names)
    }

    /// Login page of the current site, returning to the current URL afterwards
    #[must_use]
    pub fn login_url(&self, login_path: &str) -> String {
        let base = self.site.base_url();
        let login = format!("{base}{}", login_path.trim_start_matches('/'));
        match Url::parse(&login) {
            Ok(mut url) => {
                url.query_pairs_mut()
                    .append_pair("redirect_to", self.current_url.as_str());
                url.to_string()
            }
            Err(_) => base,
        }
    }
}
