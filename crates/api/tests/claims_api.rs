//! HTTP-level tests for item reports and the claim workflow.

mod common;

use axum::http::StatusCode;
use common::{
    body_json, create_user, delete_auth, found_body, get_auth, lost_body, post_json_auth, token,
};
use lostfound_core::matching::MatchType;
use lostfound_core::roles::ROLE_USER;
use lostfound_core::ttl_store::RateLimitConfig;
use lostfound_similarity::InstantMatch;
use serde_json::json;
use sqlx::PgPool;

#[sqlx::test(migrations = "../db/migrations")]
async fn test_report_claim_and_approve(pool: PgPool) {
    let owner = create_user(&pool, "Owner").await;
    let finder = create_user(&pool, "Finder").await;
    let owner_token = token(owner, ROLE_USER);
    let finder_token = token(finder, ROLE_USER);
    let app = common::build_test_app(pool);

    let response =
        post_json_auth(app.router.clone(), "/api/v1/lost-items", lost_body("Wallet"), &owner_token)
            .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let json = body_json(response).await;
    assert_eq!(json["data"]["matching"], "completed");
    let lost_id = json["data"]["item"]["id"].as_i64().unwrap();

    *app.similarity.instant.lock().unwrap() = vec![InstantMatch {
        paired_item_id: lost_id,
        similarity: 0.92,
        match_type: MatchType::Image,
    }];
    let response = post_json_auth(
        app.router.clone(),
        "/api/v1/found-items",
        found_body("Wallet"),
        &finder_token,
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let json = body_json(response).await;
    assert_eq!(json["data"]["matches_found"], 1);
    let found_id = json["data"]["item"]["id"].as_i64().unwrap();

    let json = body_json(
        get_auth(
            app.router.clone(),
            &format!("/api/v1/lost-items/{lost_id}/matches"),
            &owner_token,
        )
        .await,
    )
    .await;
    assert_eq!(json["data"][0]["found_item_id"], found_id);

    let response = post_json_auth(
        app.router.clone(),
        &format!("/api/v1/found-items/{found_id}/claims"),
        json!({ "story": "Library card in the front pocket" }),
        &owner_token,
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let claim_id = body_json(response).await["data"]["id"].as_i64().unwrap();

    let response = post_json_auth(
        app.router.clone(),
        &format!("/api/v1/claims/{claim_id}/review"),
        json!({ "action": "approve" }),
        &owner_token,
    )
    .await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let response = post_json_auth(
        app.router.clone(),
        &format!("/api/v1/claims/{claim_id}/review"),
        json!({ "action": "approve" }),
        &finder_token,
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["data"]["status_id"], 2);

    let json = body_json(
        get_auth(
            app.router.clone(),
            &format!("/api/v1/lost-items/{lost_id}"),
            &owner_token,
        )
        .await,
    )
    .await;
    assert_eq!(json["data"]["status_id"], 3);

    // Approved claims cannot be withdrawn.
    let response = delete_auth(
        app.router,
        &format!("/api/v1/claims/{claim_id}"),
        &owner_token,
    )
    .await;
    assert_eq!(response.status(), StatusCode::CONFLICT);
    assert_eq!(body_json(response).await["code"], "INVALID_TRANSITION");
}

#[sqlx::test(migrations = "../db/migrations")]
async fn test_claim_errors_map_to_status_codes(pool: PgPool) {
    let finder = create_user(&pool, "Finder").await;
    let claimer = create_user(&pool, "Claimer").await;
    let finder_token = token(finder, ROLE_USER);
    let claimer_token = token(claimer, ROLE_USER);
    let app = common::build_test_app(pool);

    let response = post_json_auth(
        app.router.clone(),
        "/api/v1/found-items",
        found_body("Scarf"),
        &finder_token,
    )
    .await;
    let found_id = body_json(response).await["data"]["item"]["id"].as_i64().unwrap();
    let claims_uri = format!("/api/v1/found-items/{found_id}/claims");

    let own = post_json_auth(
        app.router.clone(),
        &claims_uri,
        json!({ "story": "Mine" }),
        &finder_token,
    )
    .await;
    assert_eq!(own.status(), StatusCode::FORBIDDEN);

    let missing = post_json_auth(
        app.router.clone(),
        "/api/v1/found-items/999999/claims",
        json!({ "story": "Mine" }),
        &claimer_token,
    )
    .await;
    assert_eq!(missing.status(), StatusCode::NOT_FOUND);

    let first = post_json_auth(
        app.router.clone(),
        &claims_uri,
        json!({ "story": "Red wool with a tag" }),
        &claimer_token,
    )
    .await;
    assert_eq!(first.status(), StatusCode::CREATED);
    let claim_id = body_json(first).await["data"]["id"].as_i64().unwrap();

    let duplicate = post_json_auth(
        app.router.clone(),
        &claims_uri,
        json!({ "story": "Again" }),
        &claimer_token,
    )
    .await;
    assert_eq!(duplicate.status(), StatusCode::CONFLICT);

    let no_reason = post_json_auth(
        app.router.clone(),
        &format!("/api/v1/claims/{claim_id}/review"),
        json!({ "action": "reject" }),
        &finder_token,
    )
    .await;
    assert_eq!(no_reason.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(no_reason).await["code"], "VALIDATION_ERROR");

    let listed = get_auth(app.router.clone(), &claims_uri, &claimer_token).await;
    assert_eq!(listed.status(), StatusCode::FORBIDDEN);

    let cancelled = delete_auth(
        app.router.clone(),
        &format!("/api/v1/claims/{claim_id}"),
        &claimer_token,
    )
    .await;
    assert_eq!(cancelled.status(), StatusCode::NO_CONTENT);

    let json = body_json(get_auth(app.router, &claims_uri, &finder_token).await).await;
    assert_eq!(json["data"].as_array().unwrap().len(), 0);
}

#[sqlx::test(migrations = "../db/migrations")]
async fn test_claims_are_rate_limited(pool: PgPool) {
    let finder = create_user(&pool, "Finder").await;
    let claimer = create_user(&pool, "Claimer").await;
    let mut config = common::test_config();
    config.rate_limits = RateLimitConfig {
        claims_per_hour: 1,
        reports_per_hour: 20,
    };
    let app = common::build_test_app_with(pool, config);
    let claimer_token = token(claimer, ROLE_USER);

    let response = post_json_auth(
        app.router.clone(),
        "/api/v1/found-items",
        found_body("Phone"),
        &token(finder, ROLE_USER),
    )
    .await;
    let found_id = body_json(response).await["data"]["item"]["id"].as_i64().unwrap();
    let uri = format!("/api/v1/found-items/{found_id}/claims");

    let first = post_json_auth(app.router.clone(), &uri, json!({ "story": "Cracked screen" }), &claimer_token).await;
    assert_eq!(first.status(), StatusCode::CREATED);

    let second = post_json_auth(app.router, &uri, json!({ "story": "Cracked screen" }), &claimer_token).await;
    assert_eq!(second.status(), StatusCode::TOO_MANY_REQUESTS);
    assert_eq!(body_json(second).await["code"], "RATE_LIMITED");
}

#[sqlx::test(migrations = "../db/migrations")]
async fn test_found_item_without_image_is_rejected(pool: PgPool) {
    let finder = create_user(&pool, "Finder").await;
    let app = common::build_test_app(pool);
    let mut body = found_body("Keys");
    body["image_urls"] = json!([]);

    let response =
        post_json_auth(app.router, "/api/v1/found-items", body, &token(finder, ROLE_USER)).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}
