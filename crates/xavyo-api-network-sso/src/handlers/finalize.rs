//! Finalization stage (runs on the target site)
//!
//! Verifies the identity assertion delivered by the authorizing site and
//! opens a local session for the asserted user.

use crate::assertion::IdentityAssertion;
use crate::chain::{HandshakeStage, StageOutcome};
use crate::context::RequestContext;
use crate::error::{NetworkSsoError, NetworkSsoResult};
use crate::handlers::redirect_found;
use crate::identity::Capability;
use crate::params::ASSERTION_PARAMS;
use crate::state::NetworkSsoState;
use async_trait::async_trait;
use chrono::Utc;

/// Turns a valid identity assertion into a local session.
#[derive(Debug, Default, Clone, Copy)]
pub struct FinalizeStage;

#[async_trait]
impl HandshakeStage for FinalizeStage {
    fn name(&self) -> &'static str {
        "finalize"
    }

    async fn evaluate(
        &self,
        ctx: &RequestContext,
        state: &NetworkSsoState,
    ) -> NetworkSsoResult<StageOutcome> {
        let Some(assertion) = IdentityAssertion::from_url(&ctx.current_url) else {
            return Ok(StageOutcome::Continue);
        };

        let destination = ctx.url_without(&ASSERTION_PARAMS);

        if ctx.is_authenticated() {
            return redirect_found(&destination, None).map(StageOutcome::Respond);
        }

        if assertion.is_expired_at(Utc::now().timestamp()) {
            return Err(NetworkSsoError::AssertionExpired);
        }

        let signer = state.signer()?;

        // An unknown user fails exactly like a bad signature
        let verified = match state.identity.user_secret(assertion.user_id).await {
            Some(user_secret) => assertion.verify(signer, &user_secret),
            None => false,
        };
        if !verified {
            return Err(NetworkSsoError::SignatureMismatch);
        }

        let user_id = assertion.user_id;
        let site_id = ctx.current_site_id();

        if !state
            .identity
            .user_can_access(user_id, site_id, Capability::Read)
            .await
        {
            return Err(NetworkSsoError::AccessDenied);
        }

        let cookie = state.sessions.establish(&ctx.site, user_id).await?;

        tracing::info!(
            site_id = %site_id,
            user_id = %user_id,
            "SSO session established"
        );

        redirect_found(&destination, Some(cookie)).map(StageOutcome::Respond)
    }
}
