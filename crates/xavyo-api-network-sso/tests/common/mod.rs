//! In-process three-site network used by the integration tests.
//!
//! Sites: a.example (1), b.example (2), c.example (3).
//! Users: alice (42) is a member of every site, bob (7) of site A only.

#![allow(dead_code)]

use axum::{
    body::Body,
    extract::{Query, State},
    http::{header, Request, Response, StatusCode},
    routing::get,
    Extension, Router,
};
use http_body_util::BodyExt;
use serde::Deserialize;
use std::sync::Arc;
use tower::util::ServiceExt;
use url::Url;
use xavyo_api_network_sso::{
    create_network_sso_state, registry::url_authority, with_network_sso, IdentityAssertion,
    InMemoryIdentityStore, InMemoryNonceStore, InMemorySessionManager, InMemorySiteRegistry,
    LinkAnnotator, NetworkSecret, NetworkSsoConfig, NetworkSsoState, NetworkUser, NonceScope,
    NonceStore, RequestContext, SessionManager, Site, UserSecret,
};
use xavyo_core::{SiteId, UserId};

pub const NETWORK_SECRET: &str = "integration-test-network-secret-0123456789";
pub const ALICE: UserId = UserId::new(42);
pub const BOB: UserId = UserId::new(7);
pub const ALICE_HASH: &str = "$argon2id$v=19$m=19456,t=2,p=1$YWxpY2Vzc2FsdA$YWxpY2UtZGlnZXN0LXZhbHVl";
pub const BOB_HASH: &str = "$argon2id$v=19$m=19456,t=2,p=1$Ym9ic2FsdA$Ym9iLWRpZ2VzdC12YWx1ZQ";

pub const SITE_A: SiteId = SiteId::new(1);
pub const SITE_B: SiteId = SiteId::new(2);
pub const SITE_C: SiteId = SiteId::new(3);

/// Installs a test-writer subscriber once; later calls are no-ops.
pub fn init_test_logging() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_test_writer()
        .try_init();
}

pub fn sites() -> Vec<Site> {
    vec![
        Site::new(SITE_A, "a.example", "/"),
        Site::new(SITE_B, "b.example", "/"),
        Site::new(SITE_C, "c.example", "/"),
    ]
}

pub fn site(id: SiteId) -> Site {
    sites()
        .into_iter()
        .find(|s| s.id == id)
        .expect("test site exists")
}

pub struct Network {
    pub router: Router,
    pub state: NetworkSsoState,
    pub nonces: Arc<InMemoryNonceStore>,
    pub sessions: Arc<InMemorySessionManager>,
    pub identity: Arc<InMemoryIdentityStore>,
}

pub fn network() -> Network {
    network_with_secret(NetworkSecret::new(NETWORK_SECRET))
}

pub fn network_with_secret(secret: Option<NetworkSecret>) -> Network {
    init_test_logging();

    let identity = Arc::new(InMemoryIdentityStore::with_users([
        NetworkUser {
            id: ALICE,
            login: "alice".to_string(),
            credential_hash: ALICE_HASH.to_string(),
            super_admin: false,
            sites: [SITE_A, SITE_B, SITE_C].into_iter().collect(),
        },
        NetworkUser {
            id: BOB,
            login: "bob".to_string(),
            credential_hash: BOB_HASH.to_string(),
            super_admin: false,
            sites: [SITE_A].into_iter().collect(),
        },
    ]));
    let nonces = Arc::new(InMemoryNonceStore::new());
    let sessions = Arc::new(InMemorySessionManager::default());
    let state = create_network_sso_state(
        Arc::new(InMemorySiteRegistry::new(sites())),
        identity.clone(),
        nonces.clone(),
        sessions.clone(),
        secret,
        NetworkSsoConfig::default(),
    );

    let app = Router::new()
        .route("/switch", get(switch_link))
        .fallback(page)
        .with_state(LinkAnnotator::from_state(&state));

    Network {
        router: with_network_sso(app, state.clone()),
        state,
        nonces,
        sessions,
        identity,
    }
}

#[derive(Deserialize)]
struct SwitchQuery {
    to: String,
}

async fn switch_link(
    State(annotator): State<LinkAnnotator>,
    Extension(ctx): Extension<RequestContext>,
    Query(query): Query<SwitchQuery>,
) -> String {
    annotator.annotate(&ctx, &query.to).await
}

async fn page(ctx: Option<Extension<RequestContext>>) -> String {
    match ctx {
        Some(Extension(ctx)) => match ctx.user {
            Some(user) => format!("site={} user={user}", ctx.site.id),
            None => format!("site={} anonymous", ctx.site.id),
        },
        None => "outside".to_string(),
    }
}

impl Network {
    /// Sends a GET for an absolute URL, addressed by `Host` like a browser would.
    pub async fn get(&self, url: &str, cookie: Option<&str>) -> Response<Body> {
        send(self.router.clone(), url, cookie).await
    }

    /// Opens a local session directly and returns the `name=value` cookie pair.
    pub async fn sign_in(&self, site_id: SiteId, user: UserId) -> String {
        let set_cookie = self.sessions.establish(&site(site_id), user).await.unwrap();
        cookie_pair(set_cookie.to_str().unwrap())
    }

    /// Issues a nonce the way a rendered link would.
    pub async fn issue_nonce(&self, origin: SiteId, destination: SiteId, user: UserId) -> String {
        self.nonces
            .issue(NonceScope::new(origin, destination, Some(user)))
            .await
            .unwrap()
            .value
    }

    /// Signs an assertion with the network secret, valid from `now` for 120 seconds.
    pub fn sign(&self, user: UserId, credential_hash: &str, now: i64) -> IdentityAssertion {
        let secret = UserSecret::from_credential_hash(credential_hash).unwrap();
        IdentityAssertion::issue(self.state.signer().unwrap(), user, &secret, now, 120)
    }
}

/// Sends a GET through `router` for an absolute URL.
pub async fn send(router: Router, url: &str, cookie: Option<&str>) -> Response<Body> {
    let url = Url::parse(url).expect("absolute URL");
    let mut path_and_query = url.path().to_string();
    if let Some(query) = url.query() {
        path_and_query.push('?');
        path_and_query.push_str(query);
    }

    let mut builder = Request::builder()
        .uri(path_and_query)
        .header(header::HOST, url_authority(&url).expect("host"));
    if let Some(cookie) = cookie {
        builder = builder.header(header::COOKIE, cookie);
    }

    router
        .oneshot(builder.body(Body::empty()).unwrap())
        .await
        .unwrap()
}

/// Authorizer URL on `site_base` for `return_to` and `nonce`.
pub fn authorize_url(site_base: &str, return_to: &str, nonce: &str) -> String {
    let mut url = Url::parse(site_base).unwrap();
    url.query_pairs_mut()
        .append_pair("return_to", return_to)
        .append_pair("nonce", nonce);
    url.to_string()
}

/// `base` with the assertion appended as query parameters.
pub fn assertion_url(base: &str, assertion: &IdentityAssertion) -> String {
    let mut url = Url::parse(base).unwrap();
    {
        let mut pairs = url.query_pairs_mut();
        for (name, value) in assertion.query_pairs() {
            pairs.append_pair(name, &value);
        }
    }
    url.to_string()
}

pub fn cookie_pair(set_cookie: &str) -> String {
    set_cookie.split(';').next().unwrap().trim().to_string()
}

pub fn location(response: &Response<Body>) -> Url {
    let value = response.headers()[header::LOCATION].to_str().unwrap();
    Url::parse(value).unwrap()
}

pub fn set_cookie(response: &Response<Body>) -> Option<String> {
    response
        .headers()
        .get(header::SET_COOKIE)
        .map(|v| cookie_pair(v.to_str().unwrap()))
}

pub fn query(url: &Url, name: &str) -> Option<String> {
    url.query_pairs()
        .find(|(k, _)| k == name)
        .map(|(_, v)| v.into_owned())
}

pub async fn body_text(response: Response<Body>) -> String {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    String::from_utf8(bytes.to_vec()).unwrap()
}

/// Asserts a rendered error page with the given status and code.
pub async fn assert_error_page(response: Response<Body>, status: StatusCode, code: &str) {
    assert_eq!(response.status(), status);
    assert!(response.headers().get(header::SET_COOKIE).is_none());
    assert!(response.headers().get(header::LOCATION).is_none());
    let body = body_text(response).await;
    assert!(
        body.contains(&format!(r#"data-error="{code}""#)),
        "expected {code} in {body}"
    );
}
