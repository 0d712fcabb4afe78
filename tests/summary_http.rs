mod common;

use axum::http::StatusCode;
use chrono::{DateTime, Duration, TimeZone, Utc};
use serde_json::Value;

use common::app::{spawn_test_app, spawn_test_app_in};
use common::fixtures::{seed_record, seed_user};
use common::http::{assert_json_error, assert_status_ok_json, get_json};

fn at(y: i32, m: u32, d: u32, h: u32, min: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(y, m, d, h, min, 0).unwrap()
}

fn instant(value: &Value) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(value.as_str().expect("timestamp string"))
        .expect("rfc3339 timestamp")
        .with_timezone(&Utc)
}

fn periods(body: &Value) -> &Vec<Value> {
    body["data"]["summary"].as_array().expect("summary array")
}

#[tokio::test]
async fn it_summary_two_day_scenario() {
    let app = spawn_test_app().await;
    let user = seed_user(app.store(), "scenario@test.com", "scenario");
    seed_record(app.store(), &user.id, at(2024, 1, 1, 10, 0), 100, 30);
    seed_record(app.store(), &user.id, at(2024, 1, 2, 10, 0), 100, 30);

    let (status, body) = get_json(
        &app.app,
        &format!(
            "/api/users/{}/summary?from=2024-01-01&to=2024-01-03&granularity=day",
            user.id
        ),
    )
    .await;

    assert_status_ok_json(status, &body);
    let data = &body["data"];
    assert_eq!(data["user_id"], user.id.as_str());
    assert_eq!(data["user_email"], "scenario@test.com");
    assert_eq!(data["timezone"], "UTC");
    assert_eq!(data["granularity"], "day");
    assert_eq!(instant(&data["period"]["from"]), at(2024, 1, 1, 0, 0));
    assert_eq!(instant(&data["period"]["to"]), at(2024, 1, 3, 0, 0));

    let summary = periods(&body);
    assert_eq!(summary.len(), 2);
    for (idx, period) in summary.iter().enumerate() {
        let day = 1 + idx as u32;
        assert_eq!(instant(&period["start_date"]), at(2024, 1, day, 0, 0));
        assert_eq!(instant(&period["end_date"]), at(2024, 1, day + 1, 0, 0));
        assert_eq!(period["total_word_count"], 100);
        assert_eq!(period["total_study_time_minutes"], 30);
        assert_eq!(period["record_count"], 1);
        assert_eq!(period["average_words_per_minute"].as_f64(), Some(3.33));
        assert!(period["moving_avg_word_count"].is_null());
        assert!(period["moving_avg_study_time"].is_null());
    }
}

#[tokio::test]
async fn it_summary_defaults_to_day() {
    let app = spawn_test_app().await;
    let user = seed_user(app.store(), "default@test.com", "default");
    seed_record(app.store(), &user.id, at(2024, 3, 5, 8, 0), 10, 5);

    let (status, body) = get_json(
        &app.app,
        &format!("/api/users/{}/summary?from=2024-03-01&to=2024-03-31", user.id),
    )
    .await;

    assert_status_ok_json(status, &body);
    assert_eq!(body["data"]["granularity"], "day");
    assert_eq!(periods(&body).len(), 1);
}

#[tokio::test]
async fn it_summary_hourly_buckets() {
    let app = spawn_test_app().await;
    let user = seed_user(app.store(), "hourly@test.com", "hourly");
    seed_record(app.store(), &user.id, at(2024, 1, 1, 10, 5), 20, 10);
    seed_record(app.store(), &user.id, at(2024, 1, 1, 10, 55), 30, 10);
    seed_record(app.store(), &user.id, at(2024, 1, 1, 11, 30), 15, 0);

    let (status, body) = get_json(
        &app.app,
        &format!(
            "/api/users/{}/summary?from=2024-01-01T00:00:00Z&to=2024-01-01T23:59:59Z&granularity=hour",
            user.id
        ),
    )
    .await;

    assert_status_ok_json(status, &body);
    let summary = periods(&body);
    assert_eq!(summary.len(), 2);

    assert_eq!(instant(&summary[0]["start_date"]), at(2024, 1, 1, 10, 0));
    assert_eq!(instant(&summary[0]["end_date"]), at(2024, 1, 1, 11, 0));
    assert_eq!(summary[0]["total_word_count"], 50);
    assert_eq!(summary[0]["record_count"], 2);
    assert_eq!(summary[0]["average_words_per_minute"].as_f64(), Some(2.5));

    // 学习时长为 0 时速率为 0
    assert_eq!(summary[1]["total_study_time_minutes"], 0);
    assert_eq!(summary[1]["average_words_per_minute"].as_f64(), Some(0.0));
}

#[tokio::test]
async fn it_summary_month_rolls_over_year() {
    let app = spawn_test_app().await;
    let user = seed_user(app.store(), "monthly@test.com", "monthly");
    seed_record(app.store(), &user.id, at(2023, 12, 15, 9, 0), 60, 20);
    seed_record(app.store(), &user.id, at(2024, 1, 20, 9, 0), 30, 10);

    let (status, body) = get_json(
        &app.app,
        &format!(
            "/api/users/{}/summary?from=2023-12-01&to=2024-01-31&granularity=month",
            user.id
        ),
    )
    .await;

    assert_status_ok_json(status, &body);
    let summary = periods(&body);
    assert_eq!(summary.len(), 2);
    assert_eq!(instant(&summary[0]["start_date"]), at(2023, 12, 1, 0, 0));
    assert_eq!(instant(&summary[0]["end_date"]), at(2024, 1, 1, 0, 0));
    assert_eq!(instant(&summary[1]["end_date"]), at(2024, 2, 1, 0, 0));
}

#[tokio::test]
async fn it_summary_moving_average_window() {
    let app = spawn_test_app().await;
    let user = seed_user(app.store(), "window@test.com", "window");
    for (idx, words) in [100, 110, 120, 130, 140].into_iter().enumerate() {
        let ts = at(2024, 2, 1, 12, 0) + Duration::days(idx as i64);
        seed_record(app.store(), &user.id, ts, words, 10);
    }

    let (status, body) = get_json(
        &app.app,
        &format!("/api/users/{}/summary?from=2024-02-01&to=2024-02-10", user.id),
    )
    .await;

    assert_status_ok_json(status, &body);
    let summary = periods(&body);
    assert_eq!(summary.len(), 5);
    assert!(summary[0]["moving_avg_word_count"].is_null());
    assert!(summary[1]["moving_avg_word_count"].is_null());
    assert_eq!(summary[2]["moving_avg_word_count"].as_f64(), Some(110.0));
    assert_eq!(summary[3]["moving_avg_word_count"].as_f64(), Some(120.0));
    assert_eq!(summary[4]["moving_avg_word_count"].as_f64(), Some(130.0));
    assert_eq!(summary[4]["moving_avg_study_time"].as_f64(), Some(10.0));
}

#[tokio::test]
async fn it_summary_empty_range_is_empty_list() {
    let app = spawn_test_app().await;
    let user = seed_user(app.store(), "empty@test.com", "empty");

    let (status, body) = get_json(
        &app.app,
        &format!("/api/users/{}/summary?from=2024-01-01&to=2024-01-31", user.id),
    )
    .await;

    assert_status_ok_json(status, &body);
    assert!(periods(&body).is_empty());
}

#[tokio::test]
async fn it_summary_is_per_user() {
    let app = spawn_test_app().await;
    let alice = seed_user(app.store(), "alice@test.com", "alice");
    let bob = seed_user(app.store(), "bob@test.com", "bob");
    seed_record(app.store(), &alice.id, at(2024, 1, 1, 10, 0), 100, 30);
    seed_record(app.store(), &bob.id, at(2024, 1, 1, 11, 0), 999, 1);

    let (_, body) = get_json(
        &app.app,
        &format!("/api/users/{}/summary?from=2024-01-01&to=2024-01-02", alice.id),
    )
    .await;

    let summary = periods(&body);
    assert_eq!(summary.len(), 1);
    assert_eq!(summary[0]["total_word_count"], 100);
}

#[tokio::test]
async fn it_summary_buckets_in_configured_zone() {
    let app = spawn_test_app_in(chrono_tz::Asia::Shanghai).await;
    let user = seed_user(app.store(), "shanghai@test.com", "shanghai");
    // 2024-01-01 20:00 UTC 已是上海 1 月 2 日
    seed_record(app.store(), &user.id, at(2024, 1, 1, 20, 0), 10, 5);

    let (status, body) = get_json(
        &app.app,
        &format!("/api/users/{}/summary?from=2024-01-01&to=2024-01-03", user.id),
    )
    .await;

    assert_status_ok_json(status, &body);
    assert_eq!(body["data"]["timezone"], "Asia/Shanghai");
    let summary = periods(&body);
    assert_eq!(summary.len(), 1);
    let start = summary[0]["start_date"].as_str().unwrap();
    assert!(start.starts_with("2024-01-02T00:00:00"));
    assert!(start.ends_with("+08:00"));
}

#[tokio::test]
async fn it_summary_accepts_offset_bounds() {
    let app = spawn_test_app().await;
    let user = seed_user(app.store(), "bounds@test.com", "bounds");
    seed_record(app.store(), &user.id, at(2024, 1, 1, 10, 0), 10, 5);

    // 10:00 UTC == 12:00+02:00，闭区间包含边界
    let (status, body) = get_json(
        &app.app,
        &format!(
            "/api/users/{}/summary?from=2024-01-01T12:00:00%2B02:00&to=2024-01-01T10:00:00.000Z&granularity=hour",
            user.id
        ),
    )
    .await;

    assert_status_ok_json(status, &body);
    assert_eq!(periods(&body).len(), 1);
}

#[tokio::test]
async fn it_summary_missing_bounds() {
    let app = spawn_test_app().await;
    let user = seed_user(app.store(), "missing@test.com", "missing");

    for query in ["", "?from=2024-01-01", "?to=2024-01-01", "?from=&to=2024-01-01"] {
        let (status, body) =
            get_json(&app.app, &format!("/api/users/{}/summary{query}", user.id)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "query {query:?}");
        assert_json_error(&body, "VALIDATION_ERROR");
        assert_eq!(body["message"], "\"from\" and \"to\" parameters are required");
    }
}

#[tokio::test]
async fn it_summary_rejects_unknown_granularity() {
    let app = spawn_test_app().await;
    let user = seed_user(app.store(), "week@test.com", "week");

    let (status, body) = get_json(
        &app.app,
        &format!(
            "/api/users/{}/summary?from=2024-01-01&to=2024-01-31&granularity=week",
            user.id
        ),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Granularity must be hour, day, or month");
}

#[tokio::test]
async fn it_summary_rejects_inverted_range() {
    let app = spawn_test_app().await;

    // 用户不存在也先报区间错误
    let (status, body) = get_json(
        &app.app,
        "/api/users/nobody/summary?from=2024-02-01&to=2024-01-01",
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "\"from\" date must be before \"to\" date");
}

#[tokio::test]
async fn it_summary_rejects_bad_date() {
    let app = spawn_test_app().await;
    let user = seed_user(app.store(), "baddate@test.com", "baddate");

    let (status, body) = get_json(
        &app.app,
        &format!("/api/users/{}/summary?from=2024-13-45&to=2024-01-31", user.id),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(
        body["message"],
        "Invalid date format: Unable to parse date: 2024-13-45"
    );
}

#[tokio::test]
async fn it_summary_unknown_user_is_404() {
    let app = spawn_test_app().await;

    let (status, body) = get_json(
        &app.app,
        "/api/users/nobody/summary?from=2024-01-01&to=2024-01-31",
    )
    .await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_json_error(&body, "NOT_FOUND");
    assert_eq!(body["message"], "User not found");
}
