use std::sync::Arc;

use axum::{
    body::{to_bytes, Body},
    http::{header, Method, Request, StatusCode},
    Router,
};
use chrono::{Duration, Utc};
use familypaw_server::{config::Config, entities::household_member, routes};
use sea_orm::{DatabaseBackend, DatabaseConnection, DbErr, MockDatabase};
use serde_json::{json, Value};
use tower::ServiceExt;
use uuid::Uuid;

const MEMBER: &str = "2f1c6c52-1a8e-4d9b-9a55-0c6f3d1f7e01";

fn app() -> Router {
    app_with(DatabaseConnection::Disconnected)
}

fn app_with(db: DatabaseConnection) -> Router {
    routes::app(db, Arc::new(Config::default()))
}

fn store_down() -> DbErr {
    DbErr::Custom("connection refused".to_string())
}

fn membership(household_id: i32) -> household_member::Model {
    household_member::Model {
        id: 1,
        household_id,
        user_id: MEMBER.parse::<Uuid>().unwrap(),
        joined_at: (Utc::now() - Duration::days(40)).fixed_offset(),
    }
}

async fn json_body(body: Body) -> Value {
    let bytes = to_bytes(body, usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn health_is_public() {
    let response = app()
        .oneshot(Request::get("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    assert_eq!(&bytes[..], b"OK");
}

#[tokio::test]
async fn member_routes_need_the_cookie() {
    let response = app()
        .oneshot(Request::get("/households").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(json_body(response.into_body()).await["error"], "Unauthorized");
}

#[tokio::test]
async fn malformed_member_cookie_is_rejected() {
    let response = app()
        .oneshot(
            Request::get("/households/1/stats")
                .header(header::COOKIE, "familypaw_member=42")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn admin_routes_need_the_cookie_too() {
    let response = app()
        .oneshot(Request::get("/admin/dashboard").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn invalid_payload_is_rejected_before_the_store() {
    let response = app()
        .oneshot(
            Request::post("/households/join")
                .header(header::COOKIE, format!("familypaw_member={MEMBER}"))
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from("{}"))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn store_failures_surface_as_generic_500() {
    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_query_errors([store_down()])
        .into_connection();

    let response = app_with(db)
        .oneshot(
            Request::get("/profile")
                .header(header::COOKIE, format!("familypaw_member={MEMBER}"))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(json_body(response.into_body()).await["error"], "Database error");
}

#[tokio::test]
async fn stats_keep_the_ranking_when_side_reads_fail() {
    // membership check and roster succeed; every other read fails
    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_query_results([vec![membership(7)]])
        .append_query_errors([store_down()])
        .append_query_results([vec![membership(7)]])
        .append_query_errors((0..8).map(|_| store_down()))
        .into_connection();

    let response = app_with(db)
        .oneshot(
            Request::get("/households/7/stats")
                .header(header::COOKIE, format!("familypaw_member={MEMBER}"))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response.into_body()).await;
    assert_eq!(body["archive"]["status"], "skipped");
    assert_eq!(body["members"].as_array().unwrap().len(), 1);
    assert_eq!(body["members"][0]["member_id"], MEMBER);
    assert_eq!(body["members"][0]["display_name"], "Unknown");
    assert_eq!(body["honors"], json!([]));
}

#[tokio::test]
async fn cors_preflight_allows_the_frontend() {
    let response = app()
        .oneshot(
            Request::builder()
                .method(Method::OPTIONS)
                .uri("/households")
                .header(header::ORIGIN, "http://localhost:3003")
                .header(header::ACCESS_CONTROL_REQUEST_METHOD, "POST")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers()[header::ACCESS_CONTROL_ALLOW_ORIGIN],
        "http://localhost:3003"
    );
}

#[tokio::test]
async fn unknown_routes_are_404() {
    let response = app()
        .oneshot(Request::get("/nope").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
