mod common;

use std::io::Write;
use std::path::PathBuf;

use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode, header},
};
use chrono::{Datelike, NaiveDate, Weekday};
use serde_json::{Value, json};
use tower::util::ServiceExt; // for `oneshot`

use attendance::db::repository;
use attendance::models::MemberCourse;
use common::*;

const BOUNDARY: &str = "attendance-test-boundary";

fn app(pool: sqlx::SqlitePool) -> Router {
    test_app(pool, PathBuf::from("does-not-exist/index.html"))
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

fn post_json(uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn upload(files: &[(&str, &str, &str)]) -> Request<Body> {
    let mut body = String::new();
    for (field, file_name, contents) in files {
        body.push_str(&format!(
            "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{field}\"; filename=\"{file_name}\"\r\nContent-Type: text/csv\r\n\r\n{contents}\r\n"
        ));
    }
    body.push_str(&format!("--{BOUNDARY}--\r\n"));

    Request::builder()
        .method("POST")
        .uri("/api/import")
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={BOUNDARY}"),
        )
        .body(Body::from(body))
        .unwrap()
}

async fn body_bytes(body: Body) -> Vec<u8> {
    axum::body::to_bytes(body, usize::MAX)
        .await
        .expect("Should read body")
        .to_vec()
}

async fn extract_json(body: Body) -> Value {
    serde_json::from_slice(&body_bytes(body).await).expect("Should parse JSON")
}

#[tokio::test]
async fn test_health() {
    let response = app(test_pool().await).oneshot(get("/health")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_index_page() {
    let mut page = tempfile::NamedTempFile::new().unwrap();
    write!(page, "<h1>Anwesenheit</h1>").unwrap();

    let with_page = test_app(test_pool().await, page.path().to_path_buf());
    let response = with_page.oneshot(get("/")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_bytes(response.into_body()).await, b"<h1>Anwesenheit</h1>");

    let response = app(test_pool().await).oneshot(get("/")).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_import_then_list_courses_and_occurrences() {
    let pool = test_pool().await;

    let response = app(pool.clone())
        .oneshot(upload(&[
            ("files", "TrainingsStatistik.csv", COURSE_CSV),
            ("files", "Trainingsanmeldungen.csv", ROSTER_A_CSV),
        ]))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let summary = extract_json(response.into_body()).await;
    assert_eq!(summary["files"][0]["kind"], "courses");
    assert_eq!(summary["files"][0]["courses"], 2);
    assert_eq!(summary["files"][1]["kind"], "roster");
    assert_eq!(summary["files"][1]["enrollments"], 3);

    let response = app(pool.clone()).oneshot(get("/api/courses")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let courses = extract_json(response.into_body()).await;
    assert_eq!(courses.as_array().unwrap().len(), 2);
    assert_eq!(courses[0]["id"], 101);
    assert_eq!(courses[0]["last_schedule"], Value::Null);

    let response = app(pool.clone())
        .oneshot(get("/api/courses/101/occurrences"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let dates: Vec<NaiveDate> = extract_json(response.into_body())
        .await
        .as_array()
        .unwrap()
        .iter()
        .map(|d| NaiveDate::parse_from_str(d.as_str().unwrap(), "%Y-%m-%d").unwrap())
        .collect();
    assert_eq!(dates.len(), 3);
    assert_eq!(dates[1].weekday(), Weekday::Mon);
    assert_eq!((dates[1] - dates[0]).num_days(), 7);
    assert_eq!((dates[2] - dates[1]).num_days(), 7);
}

#[tokio::test]
async fn test_occurrences_for_unknown_course_or_weekday() {
    let pool = test_pool().await;
    let response = app(pool.clone())
        .oneshot(get("/api/courses/999/occurrences"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let response = app(pool.clone())
        .oneshot(upload(&[("files", "kurse.csv", "Id,Name,Trainer,Wochentag\n5,Yoga,Anna,Feiertag\n")]))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = app(pool).oneshot(get("/api/courses/5/occurrences")).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn test_attendance_round_trip_and_export() {
    let pool = test_pool().await;
    let response = app(pool.clone())
        .oneshot(upload(&[("files", "Trainingsanmeldungen.csv", ROSTER_A_CSV)]))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert!(
        repository::fetch_enrollments(&pool)
            .await
            .unwrap()
            .contains(&MemberCourse { member_id: 2, course_id: 101 })
    );

    let uri = "/api/courses/101/dates/2024-01-08/participants/2/attendance";
    for _ in 0..2 {
        let response = app(pool.clone())
            .oneshot(post_json(uri, json!({ "present": true })))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(extract_json(response.into_body()).await, json!({ "present": true }));
    }

    let response = app(pool.clone())
        .oneshot(get("/api/courses/101/dates/2024-01-08/participants"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let participants = extract_json(response.into_body()).await;
    assert_eq!(participants[0]["first_name"], "Anna");
    assert_eq!(participants[0]["present"], false);
    assert_eq!(participants[1]["first_name"], "Ben");
    assert_eq!(participants[1]["present"], true);

    let response = app(pool.clone())
        .oneshot(get("/api/export?minDate=2024-01-01&maxDate=2024-01-31"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()[header::CONTENT_TYPE], "text/csv");
    let csv = String::from_utf8(body_bytes(response.into_body()).await).unwrap();
    assert_eq!(csv, "Date,CourseID,MemberID\n2024-01-08,101,2\n");

    let response = app(pool.clone())
        .oneshot(post_json(uri, json!({ "present": false })))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = app(pool)
        .oneshot(get("/api/export?minDate=2024-01-01&maxDate=2024-01-31"))
        .await
        .unwrap();
    let csv = String::from_utf8(body_bytes(response.into_body()).await).unwrap();
    assert_eq!(csv, "Date,CourseID,MemberID\n");
}

#[tokio::test]
async fn test_bad_requests() {
    let pool = test_pool().await;

    let response = app(pool.clone()).oneshot(get("/api/export?minDate=2024-01-01")).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = app(pool.clone())
        .oneshot(get("/api/courses/1/dates/08.01.2024/participants"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = app(pool.clone())
        .oneshot(upload(&[("other", "TrainingsStatistik.csv", COURSE_CSV)]))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = app(pool)
        .oneshot(upload(&[("files", "export.csv", "Id,Name\n1,Yoga\n")]))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let body = extract_json(response.into_body()).await;
    assert!(body["message"].as_str().unwrap().contains("export.csv"));
}
