//! Tamper detection on identity assertions

#[cfg(test)]
mod tests {
    use crate::common::*;
    use axum::http::StatusCode;
    use chrono::Utc;
    use url::Url;
    use xavyo_api_network_sso::{IdentityAssertion, NetworkSecret, TokenSigner, UserSecret};

    fn with_param(url: &str, name: &str, value: &str) -> String {
        let mut parsed = Url::parse(url).unwrap();
        let pairs: Vec<(String, String)> = parsed
            .query_pairs()
            .map(|(k, v)| {
                if k == name {
                    (k.into_owned(), value.to_string())
                } else {
                    (k.into_owned(), v.into_owned())
                }
            })
            .collect();
        parsed.query_pairs_mut().clear().extend_pairs(pairs);
        parsed.to_string()
    }

    fn flip_last_hex_digit(signature: &str) -> String {
        let mut chars: Vec<char> = signature.chars().collect();
        let last = chars.len() - 1;
        chars[last] = if chars[last] == '0' { '1' } else { '0' };
        chars.into_iter().collect()
    }

    async fn assert_mismatch(net: &Network, url: &str) {
        let response = net.get(url, None).await;
        assert_error_page(response, StatusCode::BAD_REQUEST, "signature_mismatch").await;
        assert!(net.sessions.is_empty().await);
    }

    #[tokio::test]
    async fn test_changed_signature_rejected() {
        let net = network();
        let assertion = net.sign(ALICE, ALICE_HASH, Utc::now().timestamp());
        let url = assertion_url("https://b.example/", &assertion);
        let url = with_param(&url, "auth", &flip_last_hex_digit(&assertion.signature));
        assert_mismatch(&net, &url).await;
    }

    #[tokio::test]
    async fn test_changed_user_id_rejected() {
        let net = network();
        let assertion = net.sign(BOB, BOB_HASH, Utc::now().timestamp());
        let url = assertion_url("https://b.example/", &assertion);
        let url = with_param(&url, "user-id", &ALICE.to_string());
        assert_mismatch(&net, &url).await;
    }

    #[tokio::test]
    async fn test_extended_expiry_rejected() {
        let net = network();
        let assertion = net.sign(ALICE, ALICE_HASH, Utc::now().timestamp());
        let url = assertion_url("https://b.example/", &assertion);
        let url = with_param(&url, "expires", &(assertion.expires + 3600).to_string());
        assert_mismatch(&net, &url).await;
    }

    #[tokio::test]
    async fn test_truncated_signature_rejected() {
        let net = network();
        let assertion = net.sign(ALICE, ALICE_HASH, Utc::now().timestamp());
        let url = assertion_url("https://b.example/", &assertion);
        let url = with_param(&url, "auth", &assertion.signature[..32]);
        assert_mismatch(&net, &url).await;
    }

    #[tokio::test]
    async fn test_foreign_network_secret_rejected() {
        let net = network();
        let foreign = TokenSigner::new(NetworkSecret::new("some-other-network").unwrap());
        let secret = UserSecret::from_credential_hash(ALICE_HASH).unwrap();
        let assertion =
            IdentityAssertion::issue(&foreign, ALICE, &secret, Utc::now().timestamp(), 120);
        let url = assertion_url("https://b.example/", &assertion);
        assert_mismatch(&net, &url).await;
    }

    #[tokio::test]
    async fn test_unknown_user_indistinguishable_from_tampering() {
        let net = network();
        let assertion = net.sign(
            xavyo_core::UserId::new(31337),
            ALICE_HASH,
            Utc::now().timestamp(),
        );
        let url = assertion_url("https://b.example/", &assertion);
        assert_mismatch(&net, &url).await;
    }

    #[tokio::test]
    async fn test_valid_assertion_for_non_member_denied() {
        let net = network();
        let assertion = net.sign(BOB, BOB_HASH, Utc::now().timestamp());
        let url = assertion_url("https://b.example/", &assertion);

        let response = net.get(&url, None).await;
        let status = response.status();
        let body = body_text(response).await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        assert!(body.contains(r#"data-error="access_denied""#));
        assert!(body.contains("network admin"));
        assert!(net.sessions.is_empty().await);
    }

    #[tokio::test]
    async fn test_malformed_assertion_is_not_an_sso_request() {
        let net = network();
        let response = net
            .get("https://b.example/?auth=abc&user-id=alice&expires=1", None)
            .await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_text(response).await, "site=2 anonymous");
    }
}
