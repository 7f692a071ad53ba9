//! Ordered handshake stages and the axum middleware that runs them
//!
//! Every inbound request is evaluated once against the chain. The first
//! stage that answers (redirect or error page) ends the request; when no
//! stage answers, the request continues to the application.

use crate::context::RequestContext;
use crate::error::NetworkSsoResult;
use crate::handlers::{AuthorizeStage, FinalizeStage, InitiateStage};
use crate::registry::Site;
use crate::state::NetworkSsoState;
use async_trait::async_trait;
use axum::{
    body::Body,
    extract::{Request, State},
    http::{header, HeaderMap, Uri},
    middleware::Next,
    response::{IntoResponse, Response},
};
use std::fmt;
use std::sync::Arc;
use url::Url;

/// Result of evaluating one stage.
#[derive(Debug)]
pub enum StageOutcome {
    /// Not handled here; try the next stage
    Continue,
    /// Stop and send this response
    Respond(Response),
}

/// One step of the handshake.
#[async_trait]
pub trait HandshakeStage: Send + Sync {
    fn name(&self) -> &'static str;

    async fn evaluate(
        &self,
        ctx: &RequestContext,
        state: &NetworkSsoState,
    ) -> NetworkSsoResult<StageOutcome>;
}

/// Ordered list of stages evaluated once per request.
#[derive(Clone)]
pub struct HandshakeChain {
    stages: Vec<Arc<dyn HandshakeStage>>,
}

impl Default for HandshakeChain {
    /// Initiate, then authorize, then finalize.
    fn default() -> Self {
        Self::empty()
            .with_stage(InitiateStage)
            .with_stage(AuthorizeStage)
            .with_stage(FinalizeStage)
    }
}

impl fmt::Debug for HandshakeChain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list()
            .entries(self.stages.iter().map(|s| s.name()))
            .finish()
    }
}

impl HandshakeChain {
    /// A chain with no stages; every request passes through.
    #[must_use]
    pub fn empty() -> Self {
        Self { stages: Vec::new() }
    }

    /// Appends a stage.
    #[must_use]
    pub fn with_stage(mut self, stage: impl HandshakeStage + 'static) -> Self {
        self.stages.push(Arc::new(stage));
        self
    }

    #[must_use]
    pub fn stage_names(&self) -> Vec<&'static str> {
        self.stages.iter().map(|s| s.name()).collect()
    }

    /// Runs the stages in order.
    ///
    /// Returns the response of the first stage that answers, or `None` when
    /// the request should reach the application.
    pub async fn run(
        &self,
        ctx: &RequestContext,
        state: &NetworkSsoState,
    ) -> NetworkSsoResult<Option<Response>> {
        for stage in &self.stages {
            match stage.evaluate(ctx, state).await {
                Ok(StageOutcome::Continue) => {}
                Ok(StageOutcome::Respond(response)) => return Ok(Some(response)),
                Err(e) => {
                    if e.status_code().is_server_error() {
                        tracing::error!(
                            stage = stage.name(),
                            site_id = %ctx.current_site_id(),
                            error_code = e.error_code(),
                            "SSO handshake failed"
                        );
                    } else {
                        tracing::warn!(
                            stage = stage.name(),
                            site_id = %ctx.current_site_id(),
                            error_code = e.error_code(),
                            "SSO handshake rejected"
                        );
                    }
                    return Err(e);
                }
            }
        }
        Ok(None)
    }
}

/// Authority the request was addressed to, from `Host` or the request URI.
fn request_authority(headers: &HeaderMap, uri: &Uri) -> Option<String> {
    headers
        .get(header::HOST)
        .and_then(|h| h.to_str().ok())
        .map(str::to_string)
        .or_else(|| uri.authority().map(|a| a.as_str().to_string()))
        .map(|host| host.trim().to_ascii_lowercase())
        .filter(|host| !host.is_empty())
}

/// Absolute URL of the request as seen by `site`.
fn request_url(site: &Site, authority: &str, uri: &Uri) -> Option<Url> {
    let path_and_query = uri.path_and_query().map_or("/", |pq| pq.as_str());
    Url::parse(&format!("{}://{authority}{path_and_query}", site.scheme)).ok()
}

/// Builds the request context, or `None` for requests outside the network.
///
/// Takes only the request head: `Body` is not `Sync`, and a borrowed
/// request held across an await would make the middleware future `!Send`.
pub async fn build_context(
    state: &NetworkSsoState,
    headers: &HeaderMap,
    uri: &Uri,
) -> Option<RequestContext> {
    let authority = request_authority(headers, uri)?;
    let site = state.registry.resolve_site(&authority, uri.path()).await?;
    let current_url = request_url(&site, &authority, uri)?;
    let user = state.sessions.current_user(&site, headers).await;
    Some(RequestContext::new(site, current_url, user))
}

/// Middleware running the handshake chain in front of the application.
///
/// Requests for hosts that are not network sites pass through untouched.
/// For network sites the [`RequestContext`] is inserted into the request
/// extensions, so handlers can read the resolved site and user.
///
/// ## Example
///
/// ```rust,ignore
/// use axum::{middleware, Router};
/// use xavyo_api_network_sso::network_sso_middleware;
///
/// let app = Router::new()
///     .route("/", get(handler))
///     .layer(middleware::from_fn_with_state(state, network_sso_middleware));
/// ```
pub async fn network_sso_middleware(
    State(state): State<NetworkSsoState>,
    mut request: Request<Body>,
    next: Next,
) -> Response {
    let Some(ctx) = build_context(&state, request.headers(), request.uri()).await else {
        return next.run(request).await;
    };

    match state.chain.run(&ctx, &state).await {
        Ok(Some(response)) => response,
        Ok(None) => {
            request.extensions_mut().insert(ctx);
            next.run(request).await
        }
        Err(e) => e.into_response(),
    }
}
