//! Integration tests for the health check endpoint and general HTTP behaviour.

mod common;

use axum::body::Body;
use axum::http::{Method, Request, StatusCode};
use common::{body_json, get};
use lostfound_api::router::MAX_BODY_BYTES;
use lostfound_core::roles::ROLE_USER;
use sqlx::PgPool;
use tower::ServiceExt;

#[sqlx::test(migrations = "../db/migrations")]
async fn health_check_returns_ok_with_json(pool: PgPool) {
    let app = common::build_test_app(pool);
    let response = get(app.router, "/health").await;

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["status"], "ok");
    assert!(json["version"].is_string());
    assert_eq!(json["db_healthy"], true);
    assert_eq!(json["similarity_healthy"], true);
}

#[sqlx::test(migrations = "../db/migrations")]
async fn similarity_outage_does_not_degrade_status(pool: PgPool) {
    let app = common::build_test_app(pool);
    app.similarity
        .down
        .store(true, std::sync::atomic::Ordering::SeqCst);

    let json = body_json(get(app.router, "/health").await).await;
    assert_eq!(json["status"], "ok");
    assert_eq!(json["similarity_healthy"], false);
}

#[sqlx::test(migrations = "../db/migrations")]
async fn unknown_route_returns_404(pool: PgPool) {
    let app = common::build_test_app(pool);
    let response = get(app.router, "/this-route-does-not-exist").await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let json = body_json(response).await;
    assert_eq!(json["code"], "NOT_FOUND");
    assert_eq!(json["error"], "No route for /this-route-does-not-exist");
}

#[sqlx::test(migrations = "../db/migrations")]
async fn unknown_api_route_uses_json_error_shape(pool: PgPool) {
    let app = common::build_test_app(pool);
    let response = get(app.router, "/api/v1/lost-items/1/nothing-here").await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(body_json(response).await["code"], "NOT_FOUND");
}

#[sqlx::test(migrations = "../db/migrations")]
async fn oversized_body_is_rejected(pool: PgPool) {
    let user = common::create_user(&pool, "Reporter").await;
    let app = common::build_test_app(pool);
    let mut body = common::lost_body("Scarf");
    body["description"] = serde_json::Value::String("x".repeat(MAX_BODY_BYTES + 1));

    let response = common::post_json_auth(
        app.router,
        "/api/v1/lost-items",
        body,
        &common::token(user, ROLE_USER),
    )
    .await;
    assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
}

#[sqlx::test(migrations = "../db/migrations")]
async fn response_contains_x_request_id_header(pool: PgPool) {
    let app = common::build_test_app(pool);
    let response = get(app.router, "/health").await;

    let request_id = response
        .headers()
        .get("x-request-id")
        .expect("Response must contain an x-request-id header");
    assert_eq!(request_id.to_str().unwrap().len(), 36);
}

#[sqlx::test(migrations = "../db/migrations")]
async fn cors_preflight_returns_correct_headers(pool: PgPool) {
    let app = common::build_test_app(pool);
    let request = Request::builder()
        .method(Method::OPTIONS)
        .uri("/api/v1/claims/mine")
        .header("Origin", "http://localhost:5173")
        .header("Access-Control-Request-Method", "GET")
        .header("Access-Control-Request-Headers", "authorization")
        .body(Body::empty())
        .unwrap();

    let response = app.router.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let allow_origin = response
        .headers()
        .get("access-control-allow-origin")
        .unwrap()
        .to_str()
        .unwrap();
    assert_eq!(allow_origin, "http://localhost:5173");
}

#[sqlx::test(migrations = "../db/migrations")]
async fn protected_routes_require_a_token(pool: PgPool) {
    let app = common::build_test_app(pool);
    let response = get(app.router.clone(), "/api/v1/claims/mine").await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let json = body_json(response).await;
    assert_eq!(json["code"], "UNAUTHORIZED");

    let response = common::get_auth(app.router, "/api/v1/claims/mine", "not-a-jwt").await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}
