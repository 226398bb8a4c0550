use axum::{
    body::Body,
    http::{header, Request, StatusCode},
    Router,
};
use news_search::config::{Config, ServerConfig};
use news_search::server::{create_router, AppState, SESSION_COOKIE};
use tower::ServiceExt;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use test_data::*;

/// HTTP-level tests for the axum front-end.

fn config_for(server: &MockServer) -> Config {
    let mut config = Config::default();
    config.search.endpoint = format!("{}/rss/search", server.uri());
    config.security.secret = "router-secret".to_string();
    config
}

fn router(config: &Config) -> Router {
    create_router(AppState::from_config(config).unwrap(), &config.server)
}

async fn body_string(response: axum::response::Response) -> String {
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    String::from_utf8(body.to_vec()).unwrap()
}

fn extract_token(html: &str) -> String {
    let marker = r#"name="news_nonce" value=""#;
    let start = html.find(marker).unwrap() + marker.len();
    html[start..start + 64].to_string()
}

/// GET the page and return (session cookie pair, token).
async fn open_page(app: Router) -> (String, String) {
    let response = app
        .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let set_cookie = response
        .headers()
        .get(header::SET_COOKIE)
        .expect("new visitors get a session cookie")
        .to_str()
        .unwrap()
        .to_string();
    let cookie = set_cookie.split(';').next().unwrap().to_string();

    let html = body_string(response).await;
    (cookie, extract_token(&html))
}

fn post_form(cookie: &str, body: String) -> Request<Body> {
    Request::builder()
        .uri("/")
        .method("POST")
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
        .header(header::COOKIE, cookie)
        .header(header::CONTENT_LENGTH, body.len())
        .body(Body::from(body))
        .unwrap()
}

#[tokio::test]
async fn test_get_renders_idle_page_and_sets_session() {
    let feed = MockServer::start().await;
    let app = router(&config_for(&feed));

    let response = app
        .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let set_cookie = response.headers().get(header::SET_COOKIE).unwrap().to_str().unwrap();
    assert!(set_cookie.starts_with(&format!("{}=", SESSION_COOKIE)));
    assert!(set_cookie.contains("HttpOnly"));

    let html = body_string(response).await;
    assert!(html.starts_with("<!DOCTYPE html>"));
    assert!(html.contains(r#"class="news-search-form""#));
    assert!(!html.contains(r#"role="alert""#));
    assert!(!html.contains(r#"role="region""#));
}

#[tokio::test]
async fn test_returning_visitor_keeps_session() {
    let feed = MockServer::start().await;
    let app = router(&config_for(&feed));
    let (cookie, _) = open_page(app.clone()).await;

    let response = app
        .oneshot(
            Request::builder()
                .uri("/")
                .header(header::COOKIE, &cookie)
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert!(response.headers().get(header::SET_COOKIE).is_none());
}

#[tokio::test]
async fn test_post_with_valid_token_shows_results() {
    let feed = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/rss/search"))
        .respond_with(ResponseTemplate::new(200).set_body_string(THREE_ITEM_RSS))
        .expect(1)
        .mount(&feed)
        .await;

    let app = router(&config_for(&feed));
    let (cookie, token) = open_page(app.clone()).await;

    let body = format!("news_nonce={}&news_query=rust+language&news_search=1", token);
    let response = app.clone().oneshot(post_form(&cookie, body.clone())).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let html = body_string(response).await;
    assert!(html.contains("Found 3 articles"));
    assert!(html.contains(r#"value="rust language""#));

    // served from cache the second time
    let response = app.oneshot(post_form(&cookie, body)).await.unwrap();
    assert!(body_string(response).await.contains("Found 3 articles"));
}

#[tokio::test]
async fn test_post_with_token_from_other_session_is_rejected() {
    let feed = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_string(THREE_ITEM_RSS))
        .expect(0)
        .mount(&feed)
        .await;

    let app = router(&config_for(&feed));
    let (_, token) = open_page(app.clone()).await;
    let (other_cookie, _) = open_page(app.clone()).await;

    let body = format!("news_nonce={}&news_query=rust&news_search=1", token);
    let response = app.oneshot(post_form(&other_cookie, body)).await.unwrap();

    let html = body_string(response).await;
    assert!(html.contains("Security check failed. Please refresh and try again."));
    assert!(html.contains(r#"aria-invalid="true""#));
}

#[tokio::test]
async fn test_post_without_submit_flag_is_idle() {
    let feed = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_string(THREE_ITEM_RSS))
        .expect(0)
        .mount(&feed)
        .await;

    let app = router(&config_for(&feed));
    let (cookie, token) = open_page(app.clone()).await;

    let body = format!("news_nonce={}&news_query=rust", token);
    let html = body_string(app.oneshot(post_form(&cookie, body)).await.unwrap()).await;

    assert!(!html.contains(r#"role="alert""#));
    assert!(!html.contains(r#"role="region""#));
    assert!(!html.contains(r#"role="status""#));
}

#[tokio::test]
async fn test_repeated_field_renders_idle_page() {
    let feed = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_string(THREE_ITEM_RSS))
        .expect(0)
        .mount(&feed)
        .await;

    let app = router(&config_for(&feed));
    let (cookie, token) = open_page(app.clone()).await;

    let body = format!("news_nonce={}&news_query=a&news_query=b&news_search=1", token);
    let response = app.oneshot(post_form(&cookie, body)).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let html = body_string(response).await;
    assert!(html.contains(r#"class="news-search-form""#));
    assert!(!html.contains(r#"role="alert""#));
    assert!(!html.contains(r#"role="region""#));
}

#[tokio::test]
async fn test_wrong_content_type_renders_idle_page() {
    let feed = MockServer::start().await;
    let app = router(&config_for(&feed));
    let (cookie, _) = open_page(app.clone()).await;

    let request = Request::builder()
        .uri("/")
        .method("POST")
        .header(header::CONTENT_TYPE, "text/plain")
        .header(header::COOKIE, &cookie)
        .body(Body::from("news_query=rust&news_search=1"))
        .unwrap();
    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let html = body_string(response).await;
    assert!(html.starts_with("<!DOCTYPE html>"));
    assert!(!html.contains(r#"role="alert""#));
}

#[tokio::test]
async fn test_oversized_body_is_rejected() {
    let feed = MockServer::start().await;
    let mut config = config_for(&feed);
    config.server = ServerConfig {
        max_request_size: 64,
        ..ServerConfig::default()
    };
    let app = router(&config);

    let body = format!("news_search=1&news_query={}", "a".repeat(1024));
    let response = app.oneshot(post_form("x=y", body)).await.unwrap();

    assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
}

#[tokio::test]
async fn test_health() {
    let feed = MockServer::start().await;
    let app = router(&config_for(&feed));

    let response = app
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_string(response).await, "ok");
}
