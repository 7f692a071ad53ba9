//! Assertion and nonce expiry tests

#[cfg(test)]
mod tests {
    use crate::common::*;
    use axum::http::StatusCode;
    use chrono::Utc;
    use xavyo_api_network_sso::{HandshakeNonce, NonceScope, NonceStore};

    #[tokio::test]
    async fn test_expired_assertion_rejected() {
        let net = network();
        let assertion = net.sign(ALICE, ALICE_HASH, Utc::now().timestamp() - 600);
        let url = assertion_url("https://b.example/", &assertion);

        let response = net.get(&url, None).await;
        let status = response.status();
        let body = body_text(response).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body.contains(r#"data-error="assertion_expired""#));
        assert!(body.contains("return to the dashboard"));
        assert!(net.sessions.is_empty().await);
    }

    #[tokio::test]
    async fn test_expiry_checked_before_signature() {
        let net = network();
        let mut assertion = net.sign(ALICE, ALICE_HASH, Utc::now().timestamp() - 600);
        assertion.signature = "0".repeat(64);
        let url = assertion_url("https://b.example/", &assertion);

        let response = net.get(&url, None).await;
        assert_error_page(response, StatusCode::BAD_REQUEST, "assertion_expired").await;
    }

    #[tokio::test]
    async fn test_assertion_within_window_accepted() {
        let net = network();
        // Issued 100 seconds ago, 20 seconds left
        let assertion = net.sign(ALICE, ALICE_HASH, Utc::now().timestamp() - 100);
        let url = assertion_url("https://b.example/", &assertion);

        let response = net.get(&url, None).await;
        assert_eq!(response.status(), StatusCode::FOUND);
        assert!(set_cookie(&response).is_some());
    }

    #[tokio::test]
    async fn test_expired_nonce_rejected() {
        let net = network();
        let cookie = net.sign_in(SITE_A, ALICE).await;
        let nonce = HandshakeNonce::new(NonceScope::new(SITE_A, SITE_B, Some(ALICE)), -1).unwrap();
        let value = nonce.value.clone();
        net.nonces.store(nonce).await.unwrap();

        let url = authorize_url("https://a.example/", "https://b.example/", &value);
        let response = net.get(&url, Some(&cookie)).await;
        assert_error_page(response, StatusCode::FORBIDDEN, "invalid_nonce").await;
    }

    #[tokio::test]
    async fn test_cleanup_drops_expired_nonces_only() {
        let net = network();
        let live = net.issue_nonce(SITE_A, SITE_B, ALICE).await;
        let stale = HandshakeNonce::new(NonceScope::new(SITE_A, SITE_C, Some(ALICE)), -1).unwrap();
        net.nonces.store(stale).await.unwrap();

        assert_eq!(net.nonces.cleanup_expired().await.unwrap(), 1);
        assert_eq!(net.nonces.len().await, 1);

        let scope = NonceScope::new(SITE_A, SITE_B, Some(ALICE));
        assert!(net.nonces.consume(&live, &scope).await.is_ok());
    }
}
