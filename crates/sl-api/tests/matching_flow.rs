use std::sync::Arc;

use axum::{
    body::Body,
    http::{header::CONTENT_TYPE, Method, Request, StatusCode},
    Router,
};
use http_body_util::BodyExt;
use serde_json::{json, Value};
use sl_common::{
    directory::InMemoryDirectory, Availability, Coordinates, MatchStatus, WorkerCandidate,
};
use tower::ServiceExt;
use uuid::Uuid;

const API_KEY: &str = "test-key";

fn plumber() -> WorkerCandidate {
    WorkerCandidate {
        id: Uuid::new_v4(),
        display_name: "Ravi".into(),
        skill_tags: vec!["Plumbing".into(), "Tiling".into()],
        location: Some(Coordinates::new(19.076, 72.8777)),
        location_city: Some("Mumbai".into()),
        suggested_rate: Some(400.0),
        trustrank: 4.0,
        availability: Availability::Available,
        photo_url: None,
        bio: Some("Ten years of residential plumbing".into()),
    }
}

fn painter_elsewhere() -> WorkerCandidate {
    WorkerCandidate {
        id: Uuid::new_v4(),
        display_name: "Anil".into(),
        skill_tags: vec!["painting".into()],
        location: None,
        location_city: Some("Delhi".into()),
        suggested_rate: None,
        trustrank: 2.0,
        availability: Availability::Available,
        ..WorkerCandidate::default()
    }
}

fn job_body() -> Value {
    json!({
        "required_skills": ["plumbing"],
        "location": { "city": "Mumbai", "lat": 19.076, "lng": 72.8777 },
        "max_rate": 500.0,
        "employer": { "location_city": "Mumbai" }
    })
}

async fn send(app: &Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header("x-api-key", API_KEY);
    let body = match body {
        Some(value) => {
            builder = builder.header(CONTENT_TYPE, "application/json");
            Body::from(value.to_string())
        }
        None => Body::empty(),
    };

    let response = app
        .clone()
        .oneshot(builder.body(body).unwrap())
        .await
        .unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let json = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };

    (status, json)
}

fn app_with(workers: Vec<WorkerCandidate>) -> (Router, Arc<InMemoryDirectory>) {
    let directory = Arc::new(InMemoryDirectory::with_workers(workers));
    let state = sl_api::test_state_with_directory(API_KEY, directory.clone());
    (sl_api::create_router(state), directory)
}

#[tokio::test]
async fn job_creation_persists_ranked_suggestions() {
    let worker = plumber();
    let (app, directory) = app_with(vec![worker.clone(), painter_elsewhere()]);
    let job_id = Uuid::new_v4();

    let (status, body) = send(
        &app,
        Method::POST,
        &format!("/api/jobs/{job_id}/matches"),
        Some(job_body()),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["job_id"], job_id.to_string());
    let suggested = body["suggested_workers"].as_array().unwrap();
    assert_eq!(suggested.len(), 1);
    assert_eq!(suggested[0]["worker_id"], worker.id.to_string());
    assert_eq!(suggested[0]["score"], 96);
    assert_eq!(suggested[0]["distance_km"], 0.0);

    let stored = directory.matches();
    assert_eq!(stored.len(), 1);
    assert_eq!(stored[0].request_id, job_id);
    assert_eq!(stored[0].status, MatchStatus::Suggested);
    assert!((stored[0].score - 0.96).abs() < 1e-9);
    assert_eq!(suggested[0]["match_id"], stored[0].id.to_string());
}

#[tokio::test]
async fn repeat_request_inside_the_window_reuses_the_run() {
    let (app, directory) = app_with(vec![plumber()]);
    let uri = format!("/api/jobs/{}/matches", Uuid::new_v4());

    let (_, first) = send(&app, Method::POST, &uri, Some(job_body())).await;
    let (status, second) = send(&app, Method::POST, &uri, Some(job_body())).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(first, second);
    assert_eq!(directory.matches().len(), 1);
}

#[tokio::test]
async fn concurrent_requests_for_one_job_share_a_single_run() {
    let (app, directory) = app_with(vec![plumber(), plumber()]);
    let uri = format!("/api/jobs/{}/matches", Uuid::new_v4());

    let (first, second) = tokio::join!(
        send(&app, Method::POST, &uri, Some(job_body())),
        send(&app, Method::POST, &uri, Some(job_body())),
    );

    assert_eq!(first.0, StatusCode::OK);
    assert_eq!(second.0, StatusCode::OK);
    assert_eq!(first.1, second.1);
    assert_eq!(directory.matches().len(), 2);
}

#[tokio::test]
async fn invalid_coordinates_are_a_bad_request() {
    let (app, directory) = app_with(vec![plumber()]);
    let mut body = job_body();
    body["location"]["lat"] = json!(123.0);

    let (status, error) = send(
        &app,
        Method::POST,
        &format!("/api/jobs/{}/matches", Uuid::new_v4()),
        Some(body),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(error["code"], "bad_request");
    assert!(directory.matches().is_empty());
}

#[tokio::test]
async fn candidate_pool_outage_is_reported() {
    let (app, directory) = app_with(vec![plumber()]);
    directory.fail_candidate_fetch(true);

    let (status, error) = send(
        &app,
        Method::POST,
        &format!("/api/jobs/{}/matches", Uuid::new_v4()),
        Some(job_body()),
    )
    .await;

    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(error["code"], "service_unavailable");
}

#[tokio::test]
async fn lifecycle_moves_forward_and_refuses_to_reopen() {
    let worker = plumber();
    let (app, _) = app_with(vec![worker.clone()]);
    let job_id = Uuid::new_v4();

    let (_, body) = send(
        &app,
        Method::POST,
        &format!("/api/jobs/{job_id}/matches"),
        Some(job_body()),
    )
    .await;
    let match_id = body["suggested_workers"][0]["match_id"]
        .as_str()
        .unwrap()
        .to_string();

    let (status, record) = send(
        &app,
        Method::POST,
        &format!("/api/matches/{match_id}/contact"),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(record["status"], "contacted");
    assert!(record["contacted_at"].is_string());

    let (status, record) = send(
        &app,
        Method::PATCH,
        &format!("/api/matches/{match_id}/status"),
        Some(json!({ "status": "hired" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(record["status"], "hired");
    assert!(record["hired_at"].is_string());

    let (status, error) = send(
        &app,
        Method::PATCH,
        &format!("/api/matches/{match_id}/status"),
        Some(json!({ "status": "shortlisted" })),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(error["code"], "conflict");

    let (status, listed) = send(
        &app,
        Method::GET,
        &format!("/api/workers/{}/matches", worker.id),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(listed.as_array().unwrap().len(), 1);
    assert_eq!(listed[0]["status"], "hired");

    let (status, listed) = send(
        &app,
        Method::GET,
        &format!("/api/jobs/{job_id}/matches"),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(listed[0]["id"], match_id);
}

#[tokio::test]
async fn unknown_match_is_not_found() {
    let (app, _) = app_with(Vec::new());

    let (status, error) = send(
        &app,
        Method::POST,
        &format!("/api/matches/{}/contact", Uuid::new_v4()),
        None,
    )
    .await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(error["code"], "not_found");
}
