//! Anti-phishing tests: nothing is signed for a `return_to` outside the network

#[cfg(test)]
mod tests {
    use crate::common::*;
    use axum::http::StatusCode;
    use xavyo_api_network_sso::{NonceScope, NonceStore};

    async fn assert_rejected(return_to: &str) {
        let net = network();
        let cookie = net.sign_in(SITE_A, ALICE).await;
        let nonce = net.issue_nonce(SITE_A, SITE_B, ALICE).await;
        let url = authorize_url("https://a.example/", return_to, &nonce);

        let response = net.get(&url, Some(&cookie)).await;
        let status = response.status();
        let body = body_text(response).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "return_to {return_to}");
        assert!(body.contains(r#"data-error="unrecognized_return_site""#));
        assert!(body.contains("phishing"));

        // The nonce was not spent on the rejected request
        let scope = NonceScope::new(SITE_A, SITE_B, Some(ALICE));
        assert!(net.nonces.consume(&nonce, &scope).await.is_ok());
    }

    #[tokio::test]
    async fn test_foreign_domain_rejected() {
        assert_rejected("https://evil.example/collect").await;
    }

    #[tokio::test]
    async fn test_lookalike_subdomain_rejected() {
        assert_rejected("https://b.example.evil.example/").await;
    }

    #[tokio::test]
    async fn test_userinfo_disguise_rejected() {
        assert_rejected("https://b.example@evil.example/").await;
    }

    #[tokio::test]
    async fn test_scheme_downgrade_rejected() {
        assert_rejected("http://b.example/").await;
    }

    #[tokio::test]
    async fn test_non_http_scheme_rejected() {
        assert_rejected("javascript:alert(document.cookie)").await;
    }

    #[tokio::test]
    async fn test_relative_return_to_rejected() {
        assert_rejected("/wp-admin/").await;
    }

    #[tokio::test]
    async fn test_rejection_page_does_not_echo_return_to() {
        let net = network();
        let cookie = net.sign_in(SITE_A, ALICE).await;
        let url = authorize_url(
            "https://a.example/",
            "https://evil.example/<script>alert(1)</script>",
            "n",
        );
        let response = net.get(&url, Some(&cookie)).await;
        let body = body_text(response).await;
        assert!(!body.contains("<script>"));
        assert!(!body.contains("evil.example"));
    }

    #[tokio::test]
    async fn test_anonymous_requester_is_asked_to_log_in_first() {
        let net = network();
        let nonce = net.issue_nonce(SITE_A, SITE_B, ALICE).await;
        let url = authorize_url("https://a.example/", "https://evil.example/", &nonce);

        let response = net.get(&url, None).await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        let body = body_text(response).await;
        assert!(body.contains(r#"data-error="login_required""#));
        assert!(body.contains("https://a.example/login?redirect_to="));
    }
}
