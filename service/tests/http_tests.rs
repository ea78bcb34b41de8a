//! HTTP surface of the flights service, driven through the router.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use axum::Router;
use axum::body::{Body, to_bytes};
use axum::http::{Request, StatusCode, header};
use flights_core::flight::{Flight, FlightId, FlightStatus};
use flights_service::FlightService;
use flights_service::server::error::ErrorResponse;
use flights_service::server::handlers::{ORGANIZATION_HEADER, USER_HEADER};
use flights_service::server::{AppState, build_router};
use flights_testing::{
    InMemoryFlightCache, InMemoryFlightStore, StubAircraftValidator, fixtures,
};
use serde::de::DeserializeOwned;
use serde_json::json;
use std::sync::Arc;
use tower::ServiceExt;
use uuid::Uuid;

fn app_with(store: &InMemoryFlightStore, validator: StubAircraftValidator) -> Router {
    let service = FlightService::builder(Arc::new(store.clone()), Arc::new(validator))
        .cache(Arc::new(InMemoryFlightCache::new()))
        .build();
    build_router(AppState::new(Arc::new(service)))
}

fn app(store: &InMemoryFlightStore) -> Router {
    app_with(store, StubAircraftValidator::existing())
}

fn create_body() -> serde_json::Value {
    json!({
        "number": "aa123",
        "origin": "lax",
        "destination": "jfk",
        "departure_time": "2025-01-01T10:00:00Z",
        "arrival_time": "2025-01-01T15:00:00Z",
        "aircraft_id": Uuid::new_v4(),
    })
}

fn post_flight(body: &serde_json::Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/flights")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

async fn json_body<T: DeserializeOwned>(response: axum::response::Response) -> T {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).expect("Response should be JSON")
}

#[tokio::test]
async fn health_reports_up() {
    let response = app(&InMemoryFlightStore::new())
        .oneshot(get("/health"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body: serde_json::Value = json_body(response).await;
    assert_eq!(body["status"], "UP");
}

#[tokio::test]
async fn post_creates_a_flight() {
    let store = InMemoryFlightStore::new();

    let response = app(&store).oneshot(post_flight(&create_body())).await.unwrap();

    assert_eq!(response.status(), StatusCode::CREATED);
    let flight: Flight = json_body(response).await;
    assert_eq!(flight.number, "AA123");
    assert_eq!(flight.origin, "LAX");
    assert_eq!(flight.destination, "JFK");
    assert_eq!(flight.status, FlightStatus::Scheduled);
    assert!(flight.created_at.is_some());
    assert!(store.get(flight.id).is_some());
}

#[tokio::test]
async fn gateway_headers_become_audit_fields() {
    let store = InMemoryFlightStore::new();
    let user = Uuid::new_v4();
    let org = Uuid::new_v4();
    let mut request = post_flight(&create_body());
    request
        .headers_mut()
        .insert(USER_HEADER, user.to_string().parse().unwrap());
    request
        .headers_mut()
        .insert(ORGANIZATION_HEADER, org.to_string().parse().unwrap());

    let response = app(&store).oneshot(request).await.unwrap();
    let flight: Flight = json_body(response).await;

    let stored = store.get(flight.id).unwrap();
    assert_eq!(stored.created_by, Some(user));
    assert_eq!(stored.organization_id, Some(org));
}

#[tokio::test]
async fn blank_fields_are_all_reported() {
    let mut body = create_body();
    body["number"] = json!("  ");
    body.as_object_mut().unwrap().remove("destination");

    let store = InMemoryFlightStore::new();
    let response = app(&store).oneshot(post_flight(&body)).await.unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let error: ErrorResponse = json_body(response).await;
    assert_eq!(error.code, "VALIDATION_ERROR");
    assert_eq!(error.message, "missing required field(s): number, destination");
    assert!(store.is_empty());
}

#[tokio::test]
async fn invalid_times_are_a_bad_request() {
    let mut body = create_body();
    body["arrival_time"] = json!("2025-01-01T09:00:00Z");

    let response = app(&InMemoryFlightStore::new())
        .oneshot(post_flight(&body))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let error: ErrorResponse = json_body(response).await;
    assert!(error.message.starts_with("arrival must be after departure"));
}

#[tokio::test]
async fn undecodable_body_is_a_bad_request() {
    let mut body = create_body();
    body["aircraft_id"] = json!("not-a-uuid");

    let response = app(&InMemoryFlightStore::new())
        .oneshot(post_flight(&body))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let error: ErrorResponse = json_body(response).await;
    assert_eq!(error.code, "BAD_REQUEST");
}

#[tokio::test]
async fn unknown_aircraft_is_not_found() {
    let response = app_with(&InMemoryFlightStore::new(), StubAircraftValidator::not_found())
        .oneshot(post_flight(&create_body()))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn aircraft_service_outage_is_unavailable() {
    let response = app_with(
        &InMemoryFlightStore::new(),
        StubAircraftValidator::unavailable("timeout"),
    )
    .oneshot(post_flight(&create_body()))
    .await
    .unwrap();

    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    let error: ErrorResponse = json_body(response).await;
    assert_eq!(error.code, "SERVICE_UNAVAILABLE");
}

#[tokio::test]
async fn duplicate_flight_is_a_conflict() {
    let store = InMemoryFlightStore::new();
    let app = app(&store);

    let first = app.clone().oneshot(post_flight(&create_body())).await.unwrap();
    assert_eq!(first.status(), StatusCode::CREATED);

    let second = app.oneshot(post_flight(&create_body())).await.unwrap();
    assert_eq!(second.status(), StatusCode::CONFLICT);
}

#[tokio::test]
async fn store_failure_hides_details() {
    let store = InMemoryFlightStore::new();
    store.fail_creates_with("password authentication failed for user flights");

    let response = app(&store).oneshot(post_flight(&create_body())).await.unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let error: ErrorResponse = json_body(response).await;
    assert!(!error.message.contains("password"));
}

#[tokio::test]
async fn get_returns_a_stored_flight() {
    let store = InMemoryFlightStore::new();
    let flight = fixtures::stored_flight();
    store.seed(flight.clone());

    let response = app(&store)
        .oneshot(get(&format!("/flights/{}", flight.id)))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let found: Flight = json_body(response).await;
    assert_eq!(found.id, flight.id);
    assert_eq!(found.number, flight.number);
}

#[tokio::test]
async fn get_unknown_flight_is_not_found() {
    let response = app(&InMemoryFlightStore::new())
        .oneshot(get(&format!("/flights/{}", FlightId::new())))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let error: ErrorResponse = json_body(response).await;
    assert_eq!(error.code, "NOT_FOUND");
}

#[tokio::test]
async fn get_with_malformed_id_is_a_bad_request() {
    let response = app(&InMemoryFlightStore::new())
        .oneshot(get("/flights/not-a-uuid"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}
