/// Router tests that need no database
///
/// Every request here is rejected by authentication, authorization or input
/// validation before a handler touches the pool, so the app runs over a lazy
/// pool that never connects.

mod common;

use axum::http::{Method, StatusCode};
use common::{access_token, lazy_app, send, token_for};
use coordinator_shared::{auth::jwt::TokenType, models::user::UserType};
use serde_json::{json, Value};
use uuid::Uuid;

fn detail_fields(body: &Value) -> Vec<String> {
    body["details"]
        .as_array()
        .map(|details| {
            details
                .iter()
                .filter_map(|d| d["field"].as_str().map(String::from))
                .collect()
        })
        .unwrap_or_default()
}

#[tokio::test]
async fn test_protected_route_requires_token() {
    let app = lazy_app();

    let (status, body) = send(&app, Method::GET, "/v1/auth/me", None, None).await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "unauthorized");
}

#[tokio::test]
async fn test_refresh_token_rejected_as_access_token() {
    let app = lazy_app();
    let refresh = token_for(Uuid::new_v4(), UserType::Producer, TokenType::Refresh);

    let (status, _) = send(&app, Method::GET, "/v1/stats", Some(&refresh), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_garbage_token_rejected() {
    let app = lazy_app();

    let (status, _) = send(&app, Method::GET, "/v1/projects", Some("not-a-jwt"), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_unknown_route_is_not_found() {
    let app = lazy_app();

    let (status, _) = send(&app, Method::GET, "/v1/nowhere", None, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_register_validation_errors() {
    let app = lazy_app();

    let (status, body) = send(
        &app,
        Method::POST,
        "/v1/auth/register",
        None,
        Some(json!({
            "email": "not-an-email",
            "password": "short",
            "user_type": "musician",
            "first_name": "",
            "last_name": "Mingus"
        })),
    )
    .await;

    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["error"], "validation_error");

    let fields = detail_fields(&body);
    assert!(fields.contains(&"email".to_string()));
    assert!(fields.contains(&"password".to_string()));
    assert!(fields.contains(&"first_name".to_string()));
}

#[tokio::test]
async fn test_register_rejects_weak_password() {
    let app = lazy_app();

    let (status, body) = send(
        &app,
        Method::POST,
        "/v1/auth/register",
        None,
        Some(json!({
            "email": "bass@example.com",
            "password": "onlyletters",
            "user_type": "musician",
            "first_name": "Charles",
            "last_name": "Mingus"
        })),
    )
    .await;

    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(detail_fields(&body), vec!["password".to_string()]);
}

#[tokio::test]
async fn test_register_rejects_unknown_user_type() {
    let app = lazy_app();

    let (status, _) = send(
        &app,
        Method::POST,
        "/v1/auth/register",
        None,
        Some(json!({
            "email": "label@example.com",
            "password": "SoundCheck42",
            "user_type": "label",
            "first_name": "Blue",
            "last_name": "Note"
        })),
    )
    .await;

    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn test_musician_cannot_create_project() {
    let app = lazy_app();
    let token = access_token(UserType::Musician);

    let (status, body) = send(
        &app,
        Method::POST,
        "/v1/projects",
        Some(&token),
        Some(json!({ "title": "My album", "description": "Ten songs" })),
    )
    .await;

    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"], "forbidden");
}

#[tokio::test]
async fn test_project_dates_must_be_ordered() {
    let app = lazy_app();
    let token = access_token(UserType::Studio);

    let (status, body) = send(
        &app,
        Method::POST,
        "/v1/projects",
        Some(&token),
        Some(json!({
            "title": "Winter sessions",
            "description": "Strings overdubs",
            "start_date": "2025-12-10",
            "end_date": "2025-12-01"
        })),
    )
    .await;

    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(detail_fields(&body), vec!["end_date".to_string()]);
}

#[tokio::test]
async fn test_session_end_must_follow_start() {
    let app = lazy_app();
    let token = access_token(UserType::Producer);

    let (status, body) = send(
        &app,
        Method::POST,
        "/v1/sessions",
        Some(&token),
        Some(json!({
            "project_id": Uuid::new_v4(),
            "title": "Vocals",
            "start_time": "2025-07-02T16:00:00Z",
            "end_time": "2025-07-02T10:00:00Z"
        })),
    )
    .await;

    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(detail_fields(&body), vec!["end_time".to_string()]);
}

#[tokio::test]
async fn test_invitation_response_must_be_accept_or_decline() {
    let app = lazy_app();
    let token = access_token(UserType::Musician);
    let uri = format!("/v1/invitations/{}/respond", Uuid::new_v4());

    let (status, _) = send(
        &app,
        Method::POST,
        &uri,
        Some(&token),
        Some(json!({ "status": "cancelled" })),
    )
    .await;

    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn test_session_response_must_be_confirm_or_decline() {
    let app = lazy_app();
    let token = access_token(UserType::Musician);
    let uri = format!("/v1/sessions/{}/respond", Uuid::new_v4());

    let (status, _) = send(
        &app,
        Method::POST,
        &uri,
        Some(&token),
        Some(json!({ "status": "completed" })),
    )
    .await;

    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn test_cannot_edit_another_users_profile() {
    let app = lazy_app();
    let token = access_token(UserType::Musician);
    let uri = format!("/v1/users/{}", Uuid::new_v4());

    let (status, _) = send(
        &app,
        Method::PUT,
        &uri,
        Some(&token),
        Some(json!({ "bio": "Not mine" })),
    )
    .await;

    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_cannot_message_self() {
    let app = lazy_app();
    let user_id = Uuid::new_v4();
    let token = token_for(user_id, UserType::Musician, TokenType::Access);

    let (status, body) = send(
        &app,
        Method::POST,
        "/v1/messages",
        Some(&token),
        Some(json!({ "recipient_id": user_id, "content": "note to self" })),
    )
    .await;

    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(detail_fields(&body), vec!["recipient_id".to_string()]);
}

#[tokio::test]
async fn test_review_rating_and_self_review() {
    let app = lazy_app();
    let user_id = Uuid::new_v4();
    let token = token_for(user_id, UserType::Producer, TokenType::Access);

    let (status, body) = send(
        &app,
        Method::POST,
        "/v1/reviews",
        Some(&token),
        Some(json!({ "reviewee_id": Uuid::new_v4(), "rating": 6 })),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(detail_fields(&body), vec!["rating".to_string()]);

    let (status, body) = send(
        &app,
        Method::POST,
        "/v1/reviews",
        Some(&token),
        Some(json!({ "reviewee_id": user_id, "rating": 5 })),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(detail_fields(&body), vec!["reviewee_id".to_string()]);
}

#[tokio::test]
async fn test_payment_amount_and_payee() {
    let app = lazy_app();
    let user_id = Uuid::new_v4();
    let token = token_for(user_id, UserType::Studio, TokenType::Access);

    let (status, body) = send(
        &app,
        Method::POST,
        "/v1/payments",
        Some(&token),
        Some(json!({ "payee_id": Uuid::new_v4(), "amount_cents": 0 })),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(detail_fields(&body), vec!["amount_cents".to_string()]);

    let (status, body) = send(
        &app,
        Method::POST,
        "/v1/payments",
        Some(&token),
        Some(json!({ "payee_id": user_id, "amount_cents": 1000 })),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(detail_fields(&body), vec!["payee_id".to_string()]);
}

#[tokio::test]
async fn test_availability_range_must_be_ordered() {
    let app = lazy_app();
    let token = access_token(UserType::Producer);
    let uri = format!(
        "/v1/users/{}/availability?from=2025-06-10&to=2025-06-01",
        Uuid::new_v4()
    );

    let (status, body) = send(&app, Method::GET, &uri, Some(&token), None).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "bad_request");
}

#[tokio::test]
async fn test_websocket_requires_token() {
    let app = lazy_app();

    let (status, _) = send(&app, Method::GET, "/v1/ws", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let refresh = token_for(Uuid::new_v4(), UserType::Musician, TokenType::Refresh);
    let uri = format!("/v1/ws?token={refresh}");
    let (status, _) = send(&app, Method::GET, &uri, None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_websocket_without_upgrade_is_bad_request() {
    let app = lazy_app();
    let uri = format!("/v1/ws?token={}", access_token(UserType::Musician));

    let (status, _) = send(&app, Method::GET, &uri, None, None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_security_headers_on_error_responses() {
    let app = lazy_app();

    let response = {
        use axum::{body::Body, http::Request};
        use tower::ServiceExt;

        app.oneshot(
            Request::builder()
                .uri("/v1/auth/me")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap()
    };

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(
        response.headers().get("x-content-type-options").unwrap(),
        "nosniff"
    );
    assert_eq!(response.headers().get("x-frame-options").unwrap(), "DENY");
    assert!(response.headers().get("strict-transport-security").is_none());
}

#[tokio::test]
async fn test_availability_from_at_calendar_limit() {
    let app = lazy_app();
    let token = access_token(UserType::Musician);
    let uri = format!(
        "/v1/users/{}/availability?from=%2B262142-12-31",
        Uuid::new_v4()
    );

    let (status, body) = send(&app, Method::GET, &uri, Some(&token), None).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "bad_request");
}

#[tokio::test]
async fn test_unknown_status_value_uses_error_envelope() {
    let app = lazy_app();
    let token = access_token(UserType::Producer);
    let uri = format!("/v1/sessions/{}/status", Uuid::new_v4());

    let (status, body) = send(
        &app,
        Method::POST,
        &uri,
        Some(&token),
        Some(json!({ "status": "bogus" })),
    )
    .await;

    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["error"], "validation_error");
    assert_eq!(detail_fields(&body), vec!["body".to_string()]);
}

#[tokio::test]
async fn test_refresh_without_token_uses_error_envelope() {
    let app = lazy_app();

    let (status, body) = send(&app, Method::POST, "/v1/auth/refresh", None, Some(json!({}))).await;

    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["error"], "validation_error");
}

#[tokio::test]
async fn test_malformed_json_is_bad_request() {
    let app = lazy_app();
    let token = access_token(UserType::Musician);
    let uri = format!("/v1/invitations/{}/respond", Uuid::new_v4());

    let response = {
        use axum::{body::Body, http::Request};
        use tower::ServiceExt;

        app.oneshot(
            Request::builder()
                .method(Method::POST)
                .uri(&uri)
                .header("authorization", format!("Bearer {token}"))
                .header("content-type", "application/json")
                .body(Body::from("{\"status\":"))
                .unwrap(),
        )
        .await
        .unwrap()
    };

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let body: Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(body["error"], "bad_request");
}

#[tokio::test]
async fn test_instrument_set_size_is_limited() {
    let app = lazy_app();
    let user_id = Uuid::new_v4();
    let token = token_for(user_id, UserType::Musician, TokenType::Access);
    let instruments: Vec<Value> = (0..51)
        .map(|_| json!({ "instrument_id": Uuid::new_v4(), "proficiency_level": 3 }))
        .collect();

    let (status, body) = send(
        &app,
        Method::PUT,
        &format!("/v1/users/{user_id}/instruments"),
        Some(&token),
        Some(json!({ "instruments": instruments })),
    )
    .await;

    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(detail_fields(&body), vec!["instruments".to_string()]);
}
