use axum::http::StatusCode;
use serde_json::json;

use crate::tests::helper;

#[tokio::test]
async fn test_chart_data() {
    let (mut app, _pusher) = helper::setup_test_app().await;

    // submitted out of order on purpose
    let later = json!({
        "date": "2024-05-11",
        "temperature": 18.0,
        "weather": "cloudy",
    });
    let earlier = json!({
        "date": "2024-05-10",
        "temperature": 16.5,
        "weather": "sunny",
        "weightKg": 72.4,
    });

    helper::post_json(&mut app, "/api/records", &later).await;
    helper::post_json(&mut app, "/api/records", &earlier).await;

    let (status_code, body) = helper::get(&mut app, "/api/chart-data").await;

    assert_eq!(StatusCode::OK, status_code);

    // ordered by date, not by submission
    assert_eq!(
        json!(["2024-05-10", "2024-05-11"]),
        body["data"]["labels"]
    );
    assert_eq!(json!([16.5, 18.0]), body["data"]["temps"]);
    assert_eq!(json!([72.4, null]), body["data"]["weights"]);
}

#[tokio::test]
async fn test_chart_data_empty() {
    let (mut app, _pusher) = helper::setup_test_app().await;

    let (status_code, body) = helper::get(&mut app, "/api/chart-data").await;

    assert_eq!(StatusCode::OK, status_code);
    assert_eq!(0, body["data"]["labels"].as_array().unwrap().len());
}
