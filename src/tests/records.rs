use axum::http::StatusCode;
use chrono::Duration;
use chrono::Local;
use serde_json::json;

use crate::tests::helper;

#[tokio::test]
async fn test_list_without_records() {
    let (mut app, _pusher) = helper::setup_test_app().await;

    let (status_code, body) = helper::get(&mut app, "/api/records").await;

    assert_eq!(StatusCode::OK, status_code);
    assert_eq!(0, body["data"]["records"].as_array().unwrap().len());

    // without any records the next date to submit is today
    let today = Local::now().date_naive().to_string();
    assert_eq!(today, body["data"]["nextDate"].as_str().unwrap());
}

#[tokio::test]
async fn test_submit_and_list() {
    let (mut app, _pusher) = helper::setup_test_app().await;

    let today = Local::now().date_naive();
    let payload = json!({
        "date": today.to_string(),
        "temperature": 21.5,
        "weather": "few_clouds",
        "wind": true,
        "rainMm": 2.5,
        "notes": "first spring day",
    });

    let (status_code, body) = helper::post_json(&mut app, "/api/records", &payload).await;

    assert_eq!(StatusCode::CREATED, status_code);
    assert_eq!(today.to_string(), body["data"]["date"].as_str().unwrap());
    assert_eq!(21.5, body["data"]["temperature"].as_f64().unwrap());
    assert_eq!("few_clouds", body["data"]["weather"].as_str().unwrap());
    assert!(body["data"]["wind"].as_bool().unwrap());
    assert!(!body["data"]["hail"].as_bool().unwrap());
    assert_eq!(2.5, body["data"]["rainMm"].as_f64().unwrap());
    assert!(body["data"]["snowCm"].is_null());
    assert_eq!("first spring day", body["data"]["notes"].as_str().unwrap());

    let (status_code, body) = helper::get(&mut app, "/api/records").await;

    assert_eq!(StatusCode::OK, status_code);
    assert_eq!(1, body["data"]["records"].as_array().unwrap().len());

    // today is covered, nothing left to submit
    assert!(body["data"]["nextDate"].is_null());
}

#[tokio::test]
async fn test_submit_duplicate_date_updates() {
    let (mut app, _pusher) = helper::setup_test_app().await;

    let today = Local::now().date_naive();

    let first = helper::submit_record(&mut app, today, 10.0).await;
    let second = helper::submit_record(&mut app, today, 12.5).await;

    // the record is replaced, not duplicated
    assert_eq!(first["data"]["id"], second["data"]["id"]);

    let (_, body) = helper::get(&mut app, "/api/records").await;

    let records = body["data"]["records"].as_array().unwrap();
    assert_eq!(1, records.len());
    assert_eq!(12.5, records[0]["temperature"].as_f64().unwrap());
}

#[tokio::test]
async fn test_next_date_is_first_gap() {
    let (mut app, _pusher) = helper::setup_test_app().await;

    let today = Local::now().date_naive();

    helper::submit_record(&mut app, today - Duration::days(2), 8.0).await;
    helper::submit_record(&mut app, today, 9.0).await;

    let (_, body) = helper::get(&mut app, "/api/records").await;

    let expected = (today - Duration::days(1)).to_string();
    assert_eq!(expected, body["data"]["nextDate"].as_str().unwrap());
}

#[tokio::test]
async fn test_submit_missing_fields() {
    let (mut app, _pusher) = helper::setup_test_app().await;

    let (status_code, body) = helper::post_json(&mut app, "/api/records", &json!({})).await;

    assert_eq!(StatusCode::BAD_REQUEST, status_code);
    assert_eq!("Data error", body["error"].as_str().unwrap());
}

#[tokio::test]
async fn test_submit_unknown_weather() {
    let (mut app, _pusher) = helper::setup_test_app().await;

    let payload = json!({
        "date": "2024-05-10",
        "temperature": 15.0,
        "weather": "drizzle",
    });

    let (status_code, body) = helper::post_json(&mut app, "/api/records", &payload).await;

    assert_eq!(StatusCode::BAD_REQUEST, status_code);
    assert_eq!("Data error", body["error"].as_str().unwrap());
}
