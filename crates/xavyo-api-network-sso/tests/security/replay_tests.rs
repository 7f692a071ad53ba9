//! Replay attack prevention tests

#[cfg(test)]
mod tests {
    use crate::common::*;
    use axum::http::StatusCode;

    // ============================================================
    // Single use
    // ============================================================

    #[tokio::test]
    async fn test_second_authorization_with_same_nonce_blocked() {
        let net = network();
        let cookie = net.sign_in(SITE_A, ALICE).await;
        let nonce = net.issue_nonce(SITE_A, SITE_B, ALICE).await;
        let url = authorize_url("https://a.example/", "https://b.example/", &nonce);

        let first = net.get(&url, Some(&cookie)).await;
        assert_eq!(first.status(), StatusCode::FOUND);
        assert!(query(&location(&first), "auth").is_some());

        let second = net.get(&url, Some(&cookie)).await;
        assert_error_page(second, StatusCode::FORBIDDEN, "invalid_nonce").await;
    }

    #[tokio::test]
    async fn test_unknown_nonce_rejected() {
        let net = network();
        let cookie = net.sign_in(SITE_A, ALICE).await;
        let url = authorize_url("https://a.example/", "https://b.example/", "made-up-nonce");

        let response = net.get(&url, Some(&cookie)).await;
        assert_error_page(response, StatusCode::FORBIDDEN, "invalid_nonce").await;
    }

    #[tokio::test]
    async fn test_missing_nonce_rejected() {
        let net = network();
        let cookie = net.sign_in(SITE_A, ALICE).await;
        let response = net
            .get(
                "https://a.example/?return_to=https%3A%2F%2Fb.example%2F",
                Some(&cookie),
            )
            .await;
        assert_error_page(response, StatusCode::FORBIDDEN, "invalid_nonce").await;
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_replays_yield_one_assertion() {
        let net = network();
        let cookie = net.sign_in(SITE_A, ALICE).await;
        let nonce = net.issue_nonce(SITE_A, SITE_B, ALICE).await;
        let url = authorize_url("https://a.example/", "https://b.example/", &nonce);

        let mut tasks = tokio::task::JoinSet::new();
        for _ in 0..16 {
            let router = net.router.clone();
            let url = url.clone();
            let cookie = cookie.clone();
            tasks.spawn(async move { send(router, &url, Some(&cookie)).await.status() });
        }

        let mut issued = 0;
        let mut rejected = 0;
        while let Some(status) = tasks.join_next().await {
            match status.unwrap() {
                StatusCode::FOUND => issued += 1,
                StatusCode::FORBIDDEN => rejected += 1,
                other => panic!("unexpected status {other}"),
            }
        }
        assert_eq!(issued, 1);
        assert_eq!(rejected, 15);
    }

    // ============================================================
    // Scope binding
    // ============================================================

    #[tokio::test]
    async fn test_nonce_for_other_destination_rejected() {
        let net = network();
        let cookie = net.sign_in(SITE_A, ALICE).await;
        let nonce = net.issue_nonce(SITE_A, SITE_B, ALICE).await;

        let redirected = authorize_url("https://a.example/", "https://c.example/", &nonce);
        let response = net.get(&redirected, Some(&cookie)).await;
        assert_error_page(response, StatusCode::FORBIDDEN, "invalid_nonce").await;

        // Scope mismatch leaves the nonce usable for its real destination
        let genuine = authorize_url("https://a.example/", "https://b.example/", &nonce);
        let response = net.get(&genuine, Some(&cookie)).await;
        assert_eq!(response.status(), StatusCode::FOUND);
    }

    #[tokio::test]
    async fn test_nonce_from_other_origin_rejected() {
        let net = network();
        let cookie = net.sign_in(SITE_C, ALICE).await;
        let nonce = net.issue_nonce(SITE_A, SITE_B, ALICE).await;

        let url = authorize_url("https://c.example/", "https://b.example/", &nonce);
        let response = net.get(&url, Some(&cookie)).await;
        assert_error_page(response, StatusCode::FORBIDDEN, "invalid_nonce").await;
    }

    #[tokio::test]
    async fn test_nonce_rendered_for_other_user_rejected() {
        let net = network();
        let bob = net.sign_in(SITE_A, BOB).await;
        let nonce = net.issue_nonce(SITE_A, SITE_B, ALICE).await;

        let url = authorize_url("https://a.example/", "https://b.example/", &nonce);
        let response = net.get(&url, Some(&bob)).await;
        assert_error_page(response, StatusCode::FORBIDDEN, "invalid_nonce").await;
    }
}
