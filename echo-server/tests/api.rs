use axum::http::{self, Request, StatusCode};
use echo_server::{app, Echo};
use http_body_util::BodyExt;
use tower::ServiceExt;

async fn body_json<T: serde::de::DeserializeOwned>(response: axum::response::Response) -> T {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

async fn body_bytes(response: axum::response::Response) -> bytes::Bytes {
    response.into_body().collect().await.unwrap().to_bytes()
}

fn form_request(uri: &str, body: &str) -> Request<String> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(http::header::CONTENT_TYPE, "application/x-www-form-urlencoded")
        .body(body.to_string())
        .unwrap()
}

// --- echo ---

#[tokio::test]
async fn echo_get_reports_method_and_path() {
    let resp = app()
        .oneshot(Request::builder().uri("/echo").body(String::new()).unwrap())
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    let echo: Echo = body_json(resp).await;
    assert_eq!(echo.method, "GET");
    assert_eq!(echo.path, "/echo");
    assert_eq!(echo.query, None);
    assert!(echo.body.is_empty());
}

#[tokio::test]
async fn echo_keeps_raw_query() {
    let resp = app()
        .oneshot(
            Request::builder()
                .uri("/echo/v1/instances?v=1.3&network%5B0%5D.id=23")
                .body(String::new())
                .unwrap(),
        )
        .await
        .unwrap();

    let echo: Echo = body_json(resp).await;
    assert_eq!(echo.path, "/echo/v1/instances");
    assert_eq!(echo.query.as_deref(), Some("v=1.3&network%5B0%5D.id=23"));
}

#[tokio::test]
async fn echo_reports_repeated_headers_in_order() {
    let resp = app()
        .oneshot(
            Request::builder()
                .method("PUT")
                .uri("/echo")
                .header("foo", "bar")
                .header("foo", "baz")
                .body("payload".to_string())
                .unwrap(),
        )
        .await
        .unwrap();

    let echo: Echo = body_json(resp).await;
    assert_eq!(echo.method, "PUT");
    assert_eq!(echo.header("foo"), vec!["bar", "baz"]);
    assert_eq!(echo.body, "payload");
}

#[tokio::test]
async fn echo_assigns_distinct_request_ids() {
    let first: Echo = body_json(
        app()
            .oneshot(Request::builder().uri("/echo").body(String::new()).unwrap())
            .await
            .unwrap(),
    )
    .await;
    let second: Echo = body_json(
        app()
            .oneshot(Request::builder().uri("/echo").body(String::new()).unwrap())
            .await
            .unwrap(),
    )
    .await;
    assert_ne!(first.request_id, second.request_id);
}

// --- form ---

#[tokio::test]
async fn form_decodes_pairs_in_order() {
    let resp = app()
        .oneshot(form_request("/form", "foo=bar&foo=baz&Value=dGVzdA%3D%3D&a+b=c"))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    let pairs: Vec<(String, String)> = body_json(resp).await;
    assert_eq!(
        pairs,
        vec![
            ("foo".to_string(), "bar".to_string()),
            ("foo".to_string(), "baz".to_string()),
            ("Value".to_string(), "dGVzdA==".to_string()),
            ("a b".to_string(), "c".to_string()),
        ]
    );
}

#[tokio::test]
async fn form_without_form_content_type_is_rejected() {
    let resp = app()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/form")
                .header(http::header::CONTENT_TYPE, "application/json")
                .body("{}".to_string())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::UNSUPPORTED_MEDIA_TYPE);
}

#[tokio::test]
async fn unknown_route_returns_404() {
    let resp = app()
        .oneshot(Request::builder().uri("/nope").body(String::new()).unwrap())
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    assert!(body_bytes(resp).await.is_empty());
}
