mod common;

use axum::{
    body::{Body, to_bytes},
    http::{Request, Response, StatusCode, header},
};
use common::{
    MockBlogApi, config_with, default_state, expired_token, forged_token, get, post_json,
    recently_expired_token, sample_article, state_with, token_cookie, valid_token,
};
use journal_portal::{
    create_router,
    gate::UnmatchedPolicy,
    models::{LoginResponse, Profile},
};
use serde_json::{Value, json};
use tower::ServiceExt;

// --- Helpers ---

fn location(response: &Response<Body>) -> Option<&str> {
    response
        .headers()
        .get(header::LOCATION)
        .and_then(|value| value.to_str().ok())
}

fn set_cookies(response: &Response<Body>) -> Vec<String> {
    response
        .headers()
        .get_all(header::SET_COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .map(str::to_string)
        .collect()
}

async fn json_body(response: Response<Body>) -> Value {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

fn profile() -> Profile {
    Profile {
        id: "user-1".to_string(),
        username: "reader01".to_string(),
        role: "User".to_string(),
    }
}

// --- Gate Redirects ---

#[tokio::test]
async fn test_signed_in_visitor_is_sent_from_login_to_articles() {
    let app = create_router(default_state(MockBlogApi::default()));
    let cookie = token_cookie(&valid_token(Some("User")));

    let response = app.oneshot(get("/login", Some(&cookie))).await.unwrap();

    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), Some("/articles"));
    assert!(set_cookies(&response).is_empty());
}

#[tokio::test]
async fn test_anonymous_visitor_sees_public_pages() {
    let app = create_router(default_state(MockBlogApi::default()));

    for path in ["/", "/login", "/register", "/articles"] {
        let response = app.clone().oneshot(get(path, None)).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK, "path {}", path);
    }
}

#[tokio::test]
async fn test_missing_token_redirects_to_login_without_clearing() {
    let app = create_router(default_state(MockBlogApi::default()));

    let response = app.oneshot(get("/create", None)).await.unwrap();

    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), Some("/login"));
    assert!(set_cookies(&response).is_empty());
}

#[tokio::test]
async fn test_invalid_token_redirects_and_clears_session_cookies() {
    let app = create_router(default_state(MockBlogApi::default()));

    for token in [
        expired_token(Some("Admin")),
        recently_expired_token(Some("Admin")),
        forged_token(Some("Admin")),
    ] {
        let cookie = format!("{}; role=Admin", token_cookie(&token));
        let response = app
            .clone()
            .oneshot(get("/admin/articles", Some(&cookie)))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(location(&response), Some("/login"));

        let cleared = set_cookies(&response);
        for name in ["token=", "role="] {
            let cookie = cleared
                .iter()
                .find(|cookie| cookie.starts_with(name))
                .unwrap_or_else(|| panic!("no clearing cookie for {}", name));
            assert!(cookie.contains("Max-Age=0"), "cookie {}", cookie);
        }
    }
}

#[tokio::test]
async fn test_invalid_token_on_public_page_is_left_alone() {
    let app = create_router(default_state(MockBlogApi::default()));
    let cookie = token_cookie(&expired_token(Some("User")));

    let response = app.oneshot(get("/articles", Some(&cookie))).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert!(set_cookies(&response).is_empty());
}

#[tokio::test]
async fn test_any_role_may_open_the_editor() {
    let app = create_router(default_state(MockBlogApi::default()));
    let cookie = token_cookie(&valid_token(Some("User")));

    let response = app.oneshot(get("/create", Some(&cookie))).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert!(body["article"].is_null());
    assert!(body["categories"].as_array().is_some());
}

#[tokio::test]
async fn test_admin_area_rejects_user_role() {
    let app = create_router(default_state(MockBlogApi::default()));
    let cookie = token_cookie(&valid_token(Some("User")));

    let response = app.oneshot(get("/admin/articles", Some(&cookie))).await.unwrap();

    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), Some("/"));
    assert!(set_cookies(&response).is_empty());
}

#[tokio::test]
async fn test_admin_area_admits_admin_role() {
    let api = MockBlogApi {
        articles: vec![sample_article("a1", "c1", "First")],
        total: Some(1),
        ..MockBlogApi::default()
    };
    let app = create_router(default_state(api.clone()));
    let cookie = token_cookie(&valid_token(Some("Admin")));

    let response = app.oneshot(get("/admin/articles", Some(&cookie))).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["pagination"]["limit"], 10);
    assert_eq!(body["source"], "live");
    assert_eq!(api.recorded_lists()[0].limit, Some(10));
}

#[tokio::test]
async fn test_user_area_rejects_admin_role() {
    let app = create_router(default_state(MockBlogApi::default()));
    let cookie = token_cookie(&valid_token(Some("Admin")));

    let response = app.oneshot(get("/user/profile", Some(&cookie))).await.unwrap();

    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), Some("/"));
}

#[tokio::test]
async fn test_forged_role_cookie_does_not_grant_admin() {
    let app = create_router(default_state(MockBlogApi::default()));
    let cookie = format!("{}; role=Admin", token_cookie(&valid_token(Some("User"))));

    let response = app.oneshot(get("/admin/articles", Some(&cookie))).await.unwrap();

    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), Some("/"));
}

#[tokio::test]
async fn test_legacy_mode_uses_role_cookie_for_claimless_tokens() {
    let config = config_with(UnmatchedPolicy::Allow, true);
    let app = create_router(state_with(MockBlogApi::default(), config));
    let cookie = format!("{}; role=admin", token_cookie(&valid_token(None)));

    let response = app.oneshot(get("/admin/articles", Some(&cookie))).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_unlisted_route_follows_configured_policy() {
    let api = MockBlogApi {
        profile: Some(profile()),
        ..MockBlogApi::default()
    };
    let cookie = token_cookie(&valid_token(Some("User")));

    let allow = create_router(state_with(api.clone(), config_with(UnmatchedPolicy::Allow, false)));
    let response = allow.oneshot(get("/profile", Some(&cookie))).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(json_body(response).await["username"], "reader01");

    let deny = create_router(state_with(api, config_with(UnmatchedPolicy::Deny, false)));
    let response = deny.oneshot(get("/profile", Some(&cookie))).await.unwrap();
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), Some("/"));
}

#[tokio::test]
async fn test_health_is_not_gated() {
    let app = create_router(state_with(
        MockBlogApi::default(),
        config_with(UnmatchedPolicy::Deny, false),
    ));
    let cookie = token_cookie(&forged_token(None));

    let response = app.oneshot(get("/health", Some(&cookie))).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert!(response.headers().contains_key("x-request-id"));
}

// --- Session Lifecycle ---

#[tokio::test]
async fn test_login_writes_session_cookies() {
    let api = MockBlogApi {
        login_response: Some(LoginResponse {
            token: valid_token(Some("User")),
            role: "User".to_string(),
            refresh_token: Some("refresh-1".to_string()),
        }),
        ..MockBlogApi::default()
    };
    let app = create_router(default_state(api));

    let request = post_json(
        "/login",
        None,
        json!({ "username": "reader01", "password": "secret123" }),
    );
    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), Some("/articles"));

    let cookies = set_cookies(&response);
    let token = cookies.iter().find(|c| c.starts_with("token=")).unwrap();
    assert!(token.contains("HttpOnly"));
    assert!(token.contains("Path=/"));
    assert!(cookies.iter().any(|c| c.starts_with("refreshToken=refresh-1")));
    // The role lives in the signed token; no role cookie unless legacy mode is on.
    assert!(!cookies.iter().any(|c| c.starts_with("role=")));
}

#[tokio::test]
async fn test_login_in_legacy_mode_also_writes_role_cookie() {
    let api = MockBlogApi {
        login_response: Some(LoginResponse {
            token: valid_token(None),
            role: "Admin".to_string(),
            refresh_token: None,
        }),
        ..MockBlogApi::default()
    };
    let app = create_router(state_with(api, config_with(UnmatchedPolicy::Allow, true)));

    let request = post_json(
        "/login",
        None,
        json!({ "username": "admin01", "password": "secret123" }),
    );
    let response = app.oneshot(request).await.unwrap();

    let cookies = set_cookies(&response);
    assert!(cookies.iter().any(|c| c.starts_with("role=Admin")));
}

#[tokio::test]
async fn test_login_rejects_short_credentials() {
    let app = create_router(default_state(MockBlogApi::default()));

    let request = post_json("/login", None, json!({ "username": "abc", "password": "123" }));
    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let errors = json_body(response).await;
    assert_eq!(errors.as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn test_login_passes_upstream_rejection_through() {
    let app = create_router(default_state(MockBlogApi::default()));

    let request = post_json(
        "/login",
        None,
        json!({ "username": "reader01", "password": "wrongpass" }),
    );
    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_logout_clears_every_session_cookie() {
    let app = create_router(default_state(MockBlogApi::default()));
    let request = Request::builder()
        .method("POST")
        .uri("/logout")
        .body(Body::empty())
        .unwrap();

    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), Some("/"));
    let cookies = set_cookies(&response);
    for name in ["token=", "role=", "refreshToken="] {
        assert!(
            cookies.iter().any(|c| c.starts_with(name) && c.contains("Max-Age=0")),
            "missing removal of {}",
            name
        );
    }
}

// --- Page Handlers ---

#[tokio::test]
async fn test_article_list_falls_back_to_seed_data() {
    let api = MockBlogApi {
        offline: true,
        ..MockBlogApi::default()
    };
    let app = create_router(default_state(api));

    let response = app.oneshot(get("/articles?page=0", None)).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["source"], "fallback");
    assert_eq!(body["articles"].as_array().unwrap().len(), 3);
    assert_eq!(body["pagination"]["page"], 1);
    assert_eq!(body["categories"].as_array().unwrap().len(), 3);
}

#[tokio::test]
async fn test_article_list_page_size_follows_role() {
    let api = MockBlogApi::default();
    let app = create_router(default_state(api.clone()));

    let admin = token_cookie(&valid_token(Some("Admin")));
    let response = app.clone().oneshot(get("/articles", Some(&admin))).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(json_body(response).await["pagination"]["limit"], 10);

    let user = token_cookie(&valid_token(Some("User")));
    let response = app.clone().oneshot(get("/articles", Some(&user))).await.unwrap();
    assert_eq!(json_body(response).await["pagination"]["limit"], 9);

    let response = app.oneshot(get("/articles", None)).await.unwrap();
    assert_eq!(json_body(response).await["pagination"]["limit"], 9);

    let limits: Vec<Option<u32>> = api.recorded_lists().iter().map(|params| params.limit).collect();
    assert_eq!(limits, vec![Some(10), Some(9), Some(9)]);
}

#[tokio::test]
async fn test_article_detail_unknown_id_is_not_found() {
    let app = create_router(default_state(MockBlogApi::default()));

    let response = app.oneshot(get("/articles/missing", None)).await.unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_create_article_forwards_payload() {
    let api = MockBlogApi::default();
    let app = create_router(default_state(api.clone()));
    let cookie = token_cookie(&valid_token(Some("User")));

    let request = post_json(
        "/create",
        Some(&cookie),
        json!({ "title": " Trail notes ", "content": "Day one", "categoryId": "\"c1\"" }),
    );
    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), Some("/articles"));
    assert_eq!(api.recorded_writes(), vec!["create_article Trail notes".to_string()]);
}

#[tokio::test]
async fn test_create_article_reports_missing_fields() {
    let api = MockBlogApi::default();
    let app = create_router(default_state(api.clone()));
    let cookie = token_cookie(&valid_token(Some("User")));

    let request = post_json(
        "/create",
        Some(&cookie),
        json!({ "title": "", "content": "", "categoryId": "" }),
    );
    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    assert!(api.recorded_writes().is_empty());
}

#[tokio::test]
async fn test_upload_failure_substitutes_default_thumbnail() {
    let api = MockBlogApi {
        upload_fails: true,
        ..MockBlogApi::default()
    };
    let app = create_router(default_state(api));
    let cookie = token_cookie(&valid_token(Some("User")));

    let body = "--XBOUNDARY\r\n\
                Content-Disposition: form-data; name=\"image\"; filename=\"cover.png\"\r\n\
                Content-Type: image/png\r\n\r\n\
                not-really-a-png\r\n\
                --XBOUNDARY--\r\n";
    let request = Request::builder()
        .method("POST")
        .uri("/create/upload")
        .header(header::COOKIE, cookie)
        .header(header::CONTENT_TYPE, "multipart/form-data; boundary=XBOUNDARY")
        .body(Body::from(body))
        .unwrap();

    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["imageUrl"], "/default-thumbnail.jpg");
    assert_eq!(body["fallback"], true);
}

#[tokio::test]
async fn test_delete_category_redirects_back() {
    let api = MockBlogApi::default();
    let app = create_router(default_state(api.clone()));
    let cookie = token_cookie(&valid_token(Some("Admin")));

    let request = post_json("/categories/c9/delete", Some(&cookie), json!({}));
    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), Some("/categories"));
    assert_eq!(api.recorded_writes(), vec!["delete_category c9".to_string()]);
}

#[tokio::test]
async fn test_admin_deletes_article() {
    let api = MockBlogApi::default();
    let app = create_router(default_state(api.clone()));
    let cookie = token_cookie(&valid_token(Some("Admin")));

    let request = post_json("/admin/articles/a1/delete", Some(&cookie), json!({}));
    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), Some("/admin/articles"));
    assert_eq!(api.recorded_writes(), vec!["delete_article a1".to_string()]);
}
