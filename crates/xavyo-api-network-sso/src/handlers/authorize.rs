//! Authorization stage (runs on the site the user is signed in to)
//!
//! Checks that `return_to` is a network member, consumes the nonce and
//! sends the browser back with a signed identity assertion.

use crate::assertion::IdentityAssertion;
use crate::chain::{HandshakeStage, StageOutcome};
use crate::context::RequestContext;
use crate::error::{NetworkSsoError, NetworkSsoResult};
use crate::handlers::redirect_found;
use crate::nonce::NonceScope;
use crate::params::{with_query_args, PARAM_NONCE, PARAM_RETURN_TO};
use crate::state::NetworkSsoState;
use async_trait::async_trait;
use chrono::Utc;
use url::Url;

/// Issues identity assertions for signed-in users.
#[derive(Debug, Default, Clone, Copy)]
pub struct AuthorizeStage;

#[async_trait]
impl HandshakeStage for AuthorizeStage {
    fn name(&self) -> &'static str {
        "authorize"
    }

    async fn evaluate(
        &self,
        ctx: &RequestContext,
        state: &NetworkSsoState,
    ) -> NetworkSsoResult<StageOutcome> {
        let Some(return_to) = ctx.query_value(PARAM_RETURN_TO) else {
            return Ok(StageOutcome::Continue);
        };

        let Some(user_id) = ctx.user else {
            return Err(NetworkSsoError::LoginRequired {
                login_url: ctx.login_url(&state.config.login_path),
            });
        };

        // Nothing is signed for a destination outside the network
        let return_url = Url::parse(&return_to)
            .map_err(|_| NetworkSsoError::UnrecognizedReturnSite(return_to.clone()))?;
        let target = state
            .registry
            .resolve_url(&return_url)
            .await
            .ok_or_else(|| NetworkSsoError::UnrecognizedReturnSite(return_to.clone()))?;

        let nonce = ctx
            .query_value(PARAM_NONCE)
            .ok_or(NetworkSsoError::InvalidNonce(None))?;
        let scope = NonceScope::new(ctx.current_site_id(), target.id, Some(user_id));
        state
            .nonces
            .consume(&nonce, &scope)
            .await
            .map_err(|e| NetworkSsoError::InvalidNonce(Some(e)))?;

        let now = Utc::now().timestamp();

        let user_secret = state
            .identity
            .user_secret(user_id)
            .await
            .ok_or(NetworkSsoError::MissingCredentialState)?;

        let signer = state.signer()?;
        let assertion = IdentityAssertion::issue(
            signer,
            user_id,
            &user_secret,
            now,
            state.config.assertion_ttl_seconds,
        );

        let pairs = assertion.query_pairs();
        let args: Vec<(&str, &str)> = pairs.iter().map(|(k, v)| (*k, v.as_str())).collect();
        let destination = with_query_args(&return_url, &args);

        tracing::info!(
            site_id = %ctx.current_site_id(),
            target_site_id = %target.id,
            user_id = %user_id,
            expires = assertion.expires,
            "Identity assertion issued"
        );

        redirect_found(&destination, None).map(StageOutcome::Respond)
    }
}
