use std::sync::Arc;

use axum::{
    body::Body,
    http::{header, Request, StatusCode},
};
use chrono::{TimeZone, Utc};
use serde_json::{json, Value};
use tower::ServiceExt;
use uuid::Uuid;

use flightline_api::{app, seed::seed_demo, AppState};
use flightline_calendar::{BookingScreen, DialogError, ScreenError};
use flightline_core::events::BookingEvent;
use flightline_core::identity::{Identity, IdentityProvider};
use flightline_store::{MemoryDataSource, RestDataSource};

fn test_state(member: Uuid) -> AppState {
    AppState {
        source: Arc::new(MemoryDataSource::new()),
        identity: Identity::new(member),
    }
}

async fn body_json(body: Body) -> Value {
    let bytes = axum::body::to_bytes(body, usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

fn json_request(method: &str, uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn get_request(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

#[tokio::test]
async fn test_identity_endpoint_serves_configured_member() {
    let member = Uuid::new_v4();
    let app = app(test_state(member));

    let response = app.oneshot(get_request("/v1/identity")).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response.into_body()).await;
    assert_eq!(body["id"], member.to_string());
}

#[tokio::test]
async fn test_record_crud_round_trip() {
    let app = app(test_state(Uuid::new_v4()));

    // Create assigns an id and answers 201.
    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/v1/bookings",
            json!({
                "profile_id": Uuid::new_v4().to_string(),
                "resource_id": Uuid::new_v4().to_string(),
                "start_time": "2031-05-01T10:00:00Z",
                "end_time": "2031-05-01T11:00:00Z",
            }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    let created = body_json(response.into_body()).await;
    let id = created["id"].as_str().unwrap().to_string();

    // Patch merges at the top level.
    let response = app
        .clone()
        .oneshot(json_request(
            "PATCH",
            &format!("/v1/bookings/{}", id),
            json!({ "title": "Checkride" }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let updated = body_json(response.into_body()).await;
    assert_eq!(updated["title"], "Checkride");
    assert_eq!(updated["start_time"], "2031-05-01T10:00:00Z");

    // Delete answers 204; a second delete is a 404.
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("DELETE")
                .uri(format!("/v1/bookings/{}", id))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let response = app
        .oneshot(
            Request::builder()
                .method("DELETE")
                .uri(format!("/v1/bookings/{}", id))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_list_applies_filters_and_reports_total() {
    let member = Uuid::new_v4();
    let state = test_state(member);
    seed_demo(&state.source, member).await.unwrap();
    let app = app(state);

    let response = app
        .clone()
        .oneshot(get_request(&format!(
            "/v1/bookings?filter=profile_id.eq.{}",
            member
        )))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response.into_body()).await;
    assert_eq!(body["total"], 1);

    // Paged listing still counts the whole filtered set.
    let response = app
        .oneshot(get_request(
            "/v1/resources?filter=status.eq.AVAILABLE&order=name.asc&page=1&page_size=2",
        ))
        .await
        .unwrap();
    let body = body_json(response.into_body()).await;
    assert_eq!(body["total"], 3);
    assert_eq!(body["data"].as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn test_unknown_collection_and_malformed_filter() {
    let app = app(test_state(Uuid::new_v4()));

    let response = app
        .clone()
        .oneshot(get_request("/v1/blogs"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let body = body_json(response.into_body()).await;
    assert!(body["error"].as_str().unwrap().contains("blogs"));

    let response = app
        .oneshot(get_request("/v1/bookings?filter=name.like.cessna"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

/// The full engine-against-service flow: a booking screen driving the
/// served store contract over HTTP, exercising create, the overlap
/// rejection, the boundary acceptance and delete.
#[tokio::test]
async fn test_booking_screen_against_served_store() {
    let member = Uuid::new_v4();
    let state = test_state(member);
    seed_demo(&state.source, member).await.unwrap();

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app(state)).await.unwrap();
    });

    let rest = RestDataSource::new(format!("http://{}", addr));
    let identity = rest.current_identity().await.unwrap();
    assert_eq!(identity.id, member);

    let mut screen = BookingScreen::new(Arc::new(rest), identity);
    screen.load().await;
    assert_eq!(screen.resources().ready().unwrap().len(), 4);
    assert_eq!(screen.bookings().ready().unwrap().len(), 1);

    let aircraft = screen.resources().ready().unwrap()[0].id;
    let mut events = screen.subscribe();
    let start = Utc.with_ymd_and_hms(2031, 5, 1, 9, 0, 0).unwrap();
    let end = Utc.with_ymd_and_hms(2031, 5, 1, 10, 0, 0).unwrap();

    screen.select_range(aircraft, start, end);
    screen.save().await.unwrap();
    assert_eq!(screen.bookings().ready().unwrap().len(), 2);
    let created_id = match events.try_recv().unwrap() {
        BookingEvent::Created(booking) => booking.id.unwrap(),
        other => panic!("expected Created, got {:?}", other),
    };

    // A half-hour shifted candidate on the same aircraft is blocked
    // before any request is made.
    screen.select_range(
        aircraft,
        Utc.with_ymd_and_hms(2031, 5, 1, 9, 30, 0).unwrap(),
        Utc.with_ymd_and_hms(2031, 5, 1, 10, 30, 0).unwrap(),
    );
    let err = screen.save().await.unwrap_err();
    assert!(matches!(err, ScreenError::Dialog(DialogError::Overlap)));
    assert!(screen.dialog().is_open());
    screen.cancel();

    // Touching endpoints are fine.
    screen.select_range(
        aircraft,
        end,
        Utc.with_ymd_and_hms(2031, 5, 1, 11, 0, 0).unwrap(),
    );
    screen.save().await.unwrap();
    assert_eq!(screen.bookings().ready().unwrap().len(), 3);

    screen.open_booking(created_id).unwrap();
    screen.delete().await.unwrap();
    assert_eq!(screen.bookings().ready().unwrap().len(), 2);

    let _ = events.try_recv().unwrap(); // the boundary booking's Created
    assert!(matches!(
        events.try_recv().unwrap(),
        BookingEvent::Deleted { id } if id == created_id
    ));
}
