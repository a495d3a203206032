//! Route guard behaviour over HTTP.

use helpdesk_core::Role;
use helpdesk_integration_tests::{TestApp, location};
use reqwest::StatusCode;

#[tokio::test]
async fn test_signed_out_is_sent_to_sign_in_with_callback() {
    let app = TestApp::spawn().await;
    let client = TestApp::browser();

    for (path, expected) in [
        ("/dashboard", "/auth/signin?callbackUrl=%2Fdashboard"),
        ("/tickets/7", "/auth/signin?callbackUrl=%2Ftickets%2F7"),
        (
            "/admin/tickets?page=2",
            "/auth/signin?callbackUrl=%2Fadmin%2Ftickets%3Fpage%3D2",
        ),
    ] {
        let response = app.get(&client, path).await;
        assert_eq!(response.status(), StatusCode::SEE_OTHER, "{path}");
        assert_eq!(location(&response), expected, "{path}");
    }
}

#[tokio::test]
async fn test_unrouted_protected_paths_are_guarded() {
    let app = TestApp::spawn().await;
    let client = TestApp::browser();

    for (path, expected) in [
        (
            "/admin/secret-report",
            "/auth/signin?callbackUrl=%2Fadmin%2Fsecret-report",
        ),
        ("/dashboard/", "/auth/signin?callbackUrl=%2Fdashboard%2F"),
        ("/tickets/7/history", "/auth/signin?callbackUrl=%2Ftickets%2F7%2Fhistory"),
    ] {
        let response = app.get(&client, path).await;
        assert_eq!(response.status(), StatusCode::SEE_OTHER, "{path}");
        assert_eq!(location(&response), expected, "{path}");
    }

    let user = app.sign_in("user@corp.com").await;
    let response = app.get(&user, "/admin/secret-report").await;
    assert_eq!(location(&response), "/dashboard");

    let admin = app.sign_in_admin("boss@corp.com").await;
    let response = app.get(&admin, "/admin/secret-report").await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_signed_out_can_see_sign_in_page() {
    let app = TestApp::spawn().await;
    let response = app.get(&TestApp::browser(), "/auth/signin").await;

    assert_eq!(response.status(), StatusCode::OK);
    let body = response.text().await.expect("body");
    assert!(body.contains("/api/auth/signin/azure-ad"));
}

#[tokio::test]
async fn test_signed_in_user_is_kept_out_of_admin() {
    let app = TestApp::spawn().await;
    let client = app.sign_in("user@corp.com").await;

    for path in ["/admin", "/admin/tickets", "/admin/tickets/1"] {
        let response = app.get(&client, path).await;
        assert_eq!(location(&response), "/dashboard", "{path}");
    }

    let sign_in = app.get(&client, "/auth/signin").await;
    assert_eq!(location(&sign_in), "/dashboard");
}

#[tokio::test]
async fn test_lookalike_paths_are_not_guarded_as_admin() {
    let app = TestApp::spawn().await;
    let client = app.sign_in("user@corp.com").await;

    let response = app.get(&client, "/administrator").await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_role_change_applies_on_next_request() {
    let app = TestApp::spawn().await;
    let client = app.sign_in("riley@corp.com").await;

    assert_eq!(location(&app.get(&client, "/admin").await), "/dashboard");

    app.set_role("riley@corp.com", Role::Admin).await;
    let response = app.get(&client, "/admin").await;
    assert_eq!(response.status(), StatusCode::OK);

    app.set_role("riley@corp.com", Role::User).await;
    assert_eq!(location(&app.get(&client, "/admin").await), "/dashboard");
}

#[tokio::test]
async fn test_admin_sees_admin_pages() {
    let app = TestApp::spawn().await;
    let client = app.sign_in_admin("boss@corp.com").await;

    let overview = app.get(&client, "/admin").await;
    assert_eq!(overview.status(), StatusCode::OK);

    let list = app.get(&client, "/admin/tickets").await;
    assert_eq!(list.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_health_endpoints_are_open() {
    let app = TestApp::spawn().await;
    let client = TestApp::browser();

    let health = app.get(&client, "/health").await;
    assert_eq!(health.status(), StatusCode::OK);
    assert_eq!(health.text().await.expect("body"), "ok");

    let ready = app.get(&client, "/health/ready").await;
    assert_eq!(ready.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_responses_carry_request_id_and_security_headers() {
    let app = TestApp::spawn().await;
    let response = app.get(&TestApp::browser(), "/auth/signin").await;

    let headers = response.headers();
    assert!(headers.contains_key("x-request-id"));
    assert_eq!(
        headers
            .get("x-content-type-options")
            .and_then(|v| v.to_str().ok()),
        Some("nosniff")
    );
}
