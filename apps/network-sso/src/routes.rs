//! Pages of a network node: who-am-i, login, logout, site switcher,
//! network admin, health.
//!
//! Every page is registered under the base path of each configured site,
//! and the handshake middleware runs in front of all of them.

use crate::error::ServerError;
use crate::state::AppState;
use axum::{
    extract::{Query, State},
    http::{header, HeaderMap, HeaderValue, StatusCode},
    response::{Html, IntoResponse, Response},
    routing::{get, post},
    Extension, Form, Json, Router,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use tower_http::trace::TraceLayer;
use url::Url;
use xavyo_api_network_sso::{
    models::html_escape, with_network_sso, Capability, NetworkSsoError, RequestContext,
    SiteSwitcherNode,
};

/// Builds the node router with the handshake middleware and request tracing.
pub fn app_router(state: AppState) -> Router {
    let sso = state.sso.clone();
    let login_path = state.sso.config.login_path.trim_matches('/').to_string();
    let bases: BTreeSet<String> = state.sites.iter().map(|s| s.normalized_path()).collect();

    let mut router = Router::new().route("/health", get(health));
    for base in bases {
        router = router
            .route(&base, get(home))
            .route(&format!("{base}{login_path}"), get(login_form).post(login))
            .route(&format!("{base}logout"), post(logout))
            .route(&format!("{base}my-sites"), get(my_sites))
            .route(&format!("{base}network-admin"), get(network_admin));
    }

    with_network_sso(router.with_state(state), sso).layer(TraceLayer::new_for_http())
}

/// The resolved site context, or `UnknownHost` outside the network.
fn site_context(ctx: Option<Extension<RequestContext>>) -> Result<RequestContext, ServerError> {
    ctx.map(|Extension(ctx)| ctx).ok_or(ServerError::UnknownHost)
}

fn page(title: &str, body: &str) -> Html<String> {
    Html(format!(
        r#"<!DOCTYPE html>
<html>
<head>
    <meta charset="utf-8"/>
    <title>{}</title>
</head>
<body>
{}
</body>
</html>"#,
        html_escape(title),
        body
    ))
}

/// 302 to `location`, setting `cookie`.
fn found(location: &str, cookie: HeaderValue) -> Result<Response, ServerError> {
    let location = HeaderValue::from_str(location)
        .map_err(|e| ServerError::Internal(format!("Invalid redirect location: {e}")))?;
    Ok((
        StatusCode::FOUND,
        [(header::LOCATION, location), (header::SET_COOKIE, cookie)],
    )
        .into_response())
}

async fn home(
    State(state): State<AppState>,
    ctx: Option<Extension<RequestContext>>,
) -> Result<Html<String>, ServerError> {
    let ctx = site_context(ctx)?;
    let base = ctx.site.base_url();
    let domain = html_escape(&ctx.site.domain);

    let body = match ctx.user {
        Some(user_id) => {
            let login = state
                .identity
                .get(user_id)
                .await
                .map_or_else(|| user_id.to_string(), |u| u.login);
            format!(
                r#"<p data-user="{user_id}">Signed in to {domain} as {}.</p>
<p><a href="{base}my-sites">My sites</a></p>
<form method="post" action="{base}logout"><button type="submit">Log out</button></form>"#,
                html_escape(&login),
                base = html_escape(&base),
            )
        }
        None => format!(
            r#"<p>You are not signed in to {domain}.</p>
<p><a href="{}">Log in</a></p>"#,
            html_escape(&format!("{base}{}", state.sso.config.login_path.trim_start_matches('/')))
        ),
    };

    Ok(page(&ctx.site.domain, &body))
}

#[derive(Debug, Deserialize)]
pub struct LoginQuery {
    #[serde(default)]
    pub redirect_to: Option<String>,
}

async fn login_form(
    ctx: Option<Extension<RequestContext>>,
    Query(query): Query<LoginQuery>,
) -> Result<Html<String>, ServerError> {
    let ctx = site_context(ctx)?;
    let action = ctx.url_without(&["redirect_to"]);
    let redirect_to = query.redirect_to.unwrap_or_default();

    Ok(page(
        "Log in",
        &format!(
            r#"<form method="post" action="{}">
    <label>Username <input type="text" name="log" autocomplete="username"/></label>
    <label>Password <input type="password" name="pwd" autocomplete="current-password"/></label>
    <input type="hidden" name="redirect_to" value="{}"/>
    <button type="submit">Log in</button>
</form>"#,
            html_escape(action.as_str()),
            html_escape(&redirect_to)
        ),
    ))
}

#[derive(Debug, Deserialize)]
pub struct LoginForm {
    pub log: String,
    pub pwd: String,
    #[serde(default)]
    pub redirect_to: Option<String>,
}

async fn login(
    State(state): State<AppState>,
    ctx: Option<Extension<RequestContext>>,
    Form(form): Form<LoginForm>,
) -> Result<Response, ServerError> {
    let ctx = site_context(ctx)?;
    let site = &ctx.site;

    let hasher = state.hasher.clone();
    let password = form.pwd;
    let Some(user) = state.identity.find_by_login(form.log.trim()).await else {
        tokio::task::spawn_blocking(move || hasher.verify_unknown_user(&password))
            .await
            .map_err(|e| {
                ServerError::Internal(format!("Password verification task failed: {e}"))
            })?;
        return Err(ServerError::InvalidCredentials);
    };

    let hash = user.credential_hash.clone();
    let verified = tokio::task::spawn_blocking(move || hasher.verify(&password, &hash))
        .await
        .map_err(|e| ServerError::Internal(format!("Password verification task failed: {e}")))??;

    if !verified {
        tracing::warn!(site_id = %site.id, user_id = %user.id, "Login failed: wrong password");
        return Err(ServerError::InvalidCredentials);
    }

    if !state
        .sso
        .identity
        .user_can_access(user.id, site.id, Capability::Read)
        .await
    {
        return Err(NetworkSsoError::AccessDenied.into());
    }

    let cookie = state.sso.sessions.establish(site, user.id).await?;

    // Only follow redirect_to within the same site
    let mut destination = site.base_url();
    if let Some(url) = form
        .redirect_to
        .as_deref()
        .filter(|r| !r.is_empty())
        .and_then(|r| Url::parse(r).ok())
    {
        if let Some(target) = state.sso.registry.resolve_url(&url).await {
            if target.id == site.id {
                destination = url.to_string();
            }
        }
    }

    tracing::info!(site_id = %site.id, user_id = %user.id, "User logged in");
    found(&destination, cookie)
}

async fn logout(
    State(state): State<AppState>,
    ctx: Option<Extension<RequestContext>>,
    headers: HeaderMap,
) -> Result<Response, ServerError> {
    let ctx = site_context(ctx)?;
    let cookie = state.sso.sessions.revoke(&ctx.site, &headers).await?;

    if let Some(user_id) = ctx.user {
        tracing::info!(site_id = %ctx.site.id, user_id = %user_id, "User logged out");
    }
    found(&ctx.site.base_url(), cookie)
}

async fn my_sites(
    State(state): State<AppState>,
    ctx: Option<Extension<RequestContext>>,
) -> Result<Html<String>, ServerError> {
    let ctx = site_context(ctx)?;
    let user_id = ctx.user.ok_or(ServerError::NotSignedIn)?;

    let mut nodes = Vec::new();
    for site in &state.sites {
        if state
            .sso
            .identity
            .user_can_access(user_id, site.id, Capability::Read)
            .await
        {
            let title = format!("{}{}", site.domain, site.normalized_path());
            nodes.push(SiteSwitcherNode::new(
                format!("blog-{}", site.id),
                title,
                site.base_url(),
            ));
        }
    }

    // Network admin lives on the first configured site
    if let Some(main_site) = state.sites.first() {
        if state
            .sso
            .identity
            .user_can_access(user_id, ctx.site.id, Capability::ManageNetwork)
            .await
        {
            nodes.push(SiteSwitcherNode::new(
                "network-admin",
                "Network admin",
                format!("{}network-admin", main_site.base_url()),
            ));
        }
    }

    let nodes = state.annotator.annotate_site_switcher(&ctx, nodes).await;

    let items: String = nodes
        .iter()
        .map(|node| {
            format!(
                r#"    <li id="{}"><a href="{}">{}</a></li>
"#,
                html_escape(&node.id),
                html_escape(&node.href),
                html_escape(&node.title)
            )
        })
        .collect();

    Ok(page("My sites", &format!("<ul>\n{items}</ul>")))
}

async fn network_admin(
    State(state): State<AppState>,
    ctx: Option<Extension<RequestContext>>,
) -> Result<Html<String>, ServerError> {
    let ctx = site_context(ctx)?;
    let user_id = ctx.user.ok_or(ServerError::NotSignedIn)?;
    if !state
        .sso
        .identity
        .user_can_access(user_id, ctx.site.id, Capability::ManageNetwork)
        .await
    {
        return Err(NetworkSsoError::AccessDenied.into());
    }

    let rows: String = state
        .sites
        .iter()
        .map(|site| {
            format!(
                "    <tr><td>{}</td><td>{}</td></tr>\n",
                site.id,
                html_escape(&site.base_url())
            )
        })
        .collect();

    Ok(page(
        "Network admin",
        &format!("<table>\n    <tr><th>Site</th><th>Address</th></tr>\n{rows}</table>"),
    ))
}

/// Health check response.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
    pub uptime_seconds: u64,
    pub sites: usize,
    pub signing_configured: bool,
    pub timestamp: String,
}

async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        version: env!("CARGO_PKG_VERSION"),
        uptime_seconds: state.started_at.elapsed().as_secs(),
        sites: state.sites.len(),
        signing_configured: state.sso.signer.is_some(),
        timestamp: chrono::Utc::now().to_rfc3339(),
    })
}
