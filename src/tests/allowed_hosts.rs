use axum::http::StatusCode;

use crate::tests::helper;

#[tokio::test]
async fn test_any_host_allowed_by_default() {
    let (mut app, _pusher) = helper::setup_test_app().await;

    let (status_code, _) = helper::get(&mut app, "/api/records").await;

    assert_eq!(StatusCode::OK, status_code);
}

#[tokio::test]
async fn test_allowed_hosts() {
    let mut config = helper::test_config();
    config.allowed_hosts = vec!["example.com".to_string()];

    let (mut app, _pusher) = helper::setup_test_app_with_config(config).await;

    // listed host, with and without port
    let (status_code, _) =
        helper::get_with_host(&mut app, "/api/records", "example.com").await;
    assert_eq!(StatusCode::OK, status_code);

    let (status_code, _) =
        helper::get_with_host(&mut app, "/api/records", "example.com:8080").await;
    assert_eq!(StatusCode::OK, status_code);

    // unlisted host
    let (status_code, body) =
        helper::get_with_host(&mut app, "/api/records", "evil.example.net").await;
    assert_eq!(StatusCode::BAD_REQUEST, status_code);
    assert_eq!("Host not allowed", body["error"].as_str().unwrap());

    // missing host header
    let (status_code, _) = helper::get(&mut app, "/api/records").await;
    assert_eq!(StatusCode::BAD_REQUEST, status_code);
}
