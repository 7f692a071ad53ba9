//! Behaviour of a network without a signing secret

#[cfg(test)]
mod tests {
    use crate::common::*;
    use axum::http::StatusCode;
    use chrono::Utc;
    use xavyo_api_network_sso::{IdentityAssertion, NetworkSecret, TokenSigner, UserSecret};

    #[tokio::test]
    async fn test_authorizer_refuses_to_sign_without_secret() {
        let net = network_with_secret(None);
        let cookie = net.sign_in(SITE_A, ALICE).await;
        let nonce = net.issue_nonce(SITE_A, SITE_B, ALICE).await;
        let url = authorize_url("https://a.example/", "https://b.example/", &nonce);

        let response = net.get(&url, Some(&cookie)).await;
        assert_error_page(
            response,
            StatusCode::INTERNAL_SERVER_ERROR,
            "signing_secret_missing",
        )
        .await;
    }

    #[tokio::test]
    async fn test_finalizer_refuses_to_verify_without_secret() {
        let net = network_with_secret(None);
        let signer = TokenSigner::new(NetworkSecret::new(NETWORK_SECRET).unwrap());
        let secret = UserSecret::from_credential_hash(ALICE_HASH).unwrap();
        let assertion =
            IdentityAssertion::issue(&signer, ALICE, &secret, Utc::now().timestamp(), 120);
        let url = assertion_url("https://b.example/", &assertion);

        let response = net.get(&url, None).await;
        assert_error_page(
            response,
            StatusCode::INTERNAL_SERVER_ERROR,
            "signing_secret_missing",
        )
        .await;
        assert!(net.sessions.is_empty().await);
    }

    #[tokio::test]
    async fn test_empty_credential_hash_blocks_signing() {
        let net = network();
        net.identity.set_credential_hash(ALICE, String::new()).await;
        let cookie = net.sign_in(SITE_A, ALICE).await;
        let nonce = net.issue_nonce(SITE_A, SITE_B, ALICE).await;
        let url = authorize_url("https://a.example/", "https://b.example/", &nonce);

        let response = net.get(&url, Some(&cookie)).await;
        assert_error_page(
            response,
            StatusCode::INTERNAL_SERVER_ERROR,
            "missing_credential_state",
        )
        .await;
    }
}
