//! Initiation stage (runs on the target site)
//!
//! A link rendered on the source site lands here with `from` and `nonce`.
//! Nothing is verified at this hop; it only sends the browser to the source
//! site, telling it where the signed assertion must come back to.

use crate::chain::{HandshakeStage, StageOutcome};
use crate::context::RequestContext;
use crate::error::{NetworkSsoError, NetworkSsoResult};
use crate::handlers::redirect_found;
use crate::params::{with_query_args, INITIATION_PARAMS, PARAM_FROM, PARAM_NONCE, PARAM_RETURN_TO};
use crate::state::NetworkSsoState;
use async_trait::async_trait;
use url::Url;
use xavyo_core::SiteId;

/// Redirects an initiation request to the authorizing (source) site.
#[derive(Debug, Default, Clone, Copy)]
pub struct InitiateStage;

#[async_trait]
impl HandshakeStage for InitiateStage {
    fn name(&self) -> &'static str {
        "initiate"
    }

    async fn evaluate(
        &self,
        ctx: &RequestContext,
        state: &NetworkSsoState,
    ) -> NetworkSsoResult<StageOutcome> {
        // A `from` that is not a site id is not an SSO request
        let Some(origin_id) = ctx
            .query_value(PARAM_FROM)
            .and_then(|v| v.parse::<SiteId>().ok())
        else {
            return Ok(StageOutcome::Continue);
        };

        let clean_url = ctx.url_without(&INITIATION_PARAMS);

        if let Some(user_id) = ctx.user {
            tracing::debug!(
                site_id = %ctx.current_site_id(),
                user_id = %user_id,
                "Already signed in, dropping handshake parameters"
            );
            return redirect_found(&clean_url, None).map(StageOutcome::Respond);
        }

        let origin = state
            .registry
            .get_site(origin_id)
            .await
            .ok_or(NetworkSsoError::UnknownOriginSite(origin_id))?;

        let nonce = ctx
            .query_value(PARAM_NONCE)
            .ok_or(NetworkSsoError::MissingNonce)?;

        let authorize_base = Url::parse(&origin.base_url()).map_err(|e| {
            NetworkSsoError::Internal(format!("Invalid base URL for site {}: {e}", origin.id))
        })?;
        let authorize_url = with_query_args(
            &authorize_base,
            &[
                (PARAM_RETURN_TO, clean_url.as_str()),
                (PARAM_NONCE, nonce.as_str()),
            ],
        );

        tracing::info!(
            site_id = %ctx.current_site_id(),
            origin_site_id = %origin.id,
            "SSO handshake initiated"
        );

        redirect_found(&authorize_url, None).map(StageOutcome::Respond)
    }
}
