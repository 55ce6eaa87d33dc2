//! Handler tests for the users domain
//!
//! These exercise the users and auth routers over the in-memory repository:
//! - Request deserialization and validation
//! - Response serialization (never any password material)
//! - HTTP status codes and error bodies

use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum_helpers::ErrorResponse;
use domain_users::*;
use http_body_util::BodyExt;
use serde_json::{Value, json};
use test_utils::STRONG_PASSWORD;
use test_utils::assertions::assert_no_password_fields;
use tower::ServiceExt; // For oneshot()

// Helper to parse JSON response body
async fn json_body<T: serde::de::DeserializeOwned>(body: Body) -> T {
    let bytes = body.collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

fn json_request(method: &str, uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn empty_request(method: &str, uri: &str) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}

fn new_user_body(email: &str) -> Value {
    json!({
        "first_name": "John",
        "last_name": "Doe",
        "email": email,
        "password": STRONG_PASSWORD,
    })
}

fn setup() -> (Router, UserService<InMemoryUserRepository>) {
    let service = UserService::new(InMemoryUserRepository::new());
    (handlers::router(service.clone()), service)
}

#[tokio::test]
async fn test_create_user_returns_201_without_password() {
    let (app, _) = setup();

    let response = app
        .oneshot(json_request("POST", "/", new_user_body("john@example.com")))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::CREATED);

    let body: Value = json_body(response.into_body()).await;
    assert_no_password_fields(&body);
    assert_eq!(body["email"], "john@example.com");
    assert_eq!(body["roles"], json!(["user"]));
    assert_eq!(body["is_active"], true);
}

#[tokio::test]
async fn test_create_user_weak_password_lists_requirements() {
    let (app, _) = setup();

    let mut body = new_user_body("john@example.com");
    body["password"] = json!("weak");

    let response = app.oneshot(json_request("POST", "/", body)).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let error: ErrorResponse = json_body(response.into_body()).await;
    assert_eq!(error.error, "WEAK_PASSWORD");
    let unmet = &error.details.unwrap()["unmet_requirements"];
    assert_eq!(unmet, &json!(["min_length", "uppercase", "digit", "symbol"]));
}

#[tokio::test]
async fn test_create_user_invalid_fields_are_enumerated() {
    let (app, _) = setup();

    let response = app
        .oneshot(json_request(
            "POST",
            "/",
            json!({
                "first_name": " ",
                "last_name": "Doe",
                "email": "not-an-email",
                "password": STRONG_PASSWORD,
                "roles": ["root"],
            }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let error: ErrorResponse = json_body(response.into_body()).await;
    assert_eq!(error.error, "VALIDATION_ERROR");
    let details = error.details.unwrap();
    assert!(details.get("first_name").is_some());
    assert!(details.get("email").is_some());
    assert_eq!(details["roles"][0]["code"], "unknown_role");
}

#[tokio::test]
async fn test_create_user_duplicate_email_returns_409() {
    let (app, _) = setup();

    let first = app
        .clone()
        .oneshot(json_request("POST", "/", new_user_body("john@example.com")))
        .await
        .unwrap();
    assert_eq!(first.status(), StatusCode::CREATED);

    let second = app
        .oneshot(json_request("POST", "/", new_user_body("JOHN@example.com")))
        .await
        .unwrap();
    assert_eq!(second.status(), StatusCode::CONFLICT);

    let error: ErrorResponse = json_body(second.into_body()).await;
    assert_eq!(error.error, "CONFLICT");
}

#[tokio::test]
async fn test_get_user_found_and_missing() {
    let (app, _) = setup();

    app.clone()
        .oneshot(json_request("POST", "/", new_user_body("john@example.com")))
        .await
        .unwrap();

    let found = app.clone().oneshot(empty_request("GET", "/1")).await.unwrap();
    assert_eq!(found.status(), StatusCode::OK);
    let user: UserResponse = json_body(found.into_body()).await;
    assert_eq!(user.id, 1);

    let missing = app.oneshot(empty_request("GET", "/999")).await.unwrap();
    assert_eq!(missing.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_get_user_rejects_non_integer_id() {
    let (app, _) = setup();

    let response = app.oneshot(empty_request("GET", "/abc")).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let error: ErrorResponse = json_body(response.into_body()).await;
    assert_eq!(error.error, "INVALID_ID");
}

#[tokio::test]
async fn test_list_users_filters_by_status() {
    let (app, service) = setup();

    for email in ["a@example.com", "b@example.com"] {
        service
            .create_user(CreateUser {
                first_name: "Test".to_string(),
                last_name: "User".to_string(),
                email: email.to_string(),
                password: STRONG_PASSWORD.to_string(),
                roles: vec![],
                date_of_birth: None,
                phone_number: None,
            })
            .await
            .unwrap();
    }
    service.deactivate_user(2).await.unwrap();

    let all = app.clone().oneshot(empty_request("GET", "/")).await.unwrap();
    assert_eq!(all.status(), StatusCode::OK);
    let all: Value = json_body(all.into_body()).await;
    assert_no_password_fields(&all);
    assert_eq!(all.as_array().unwrap().len(), 2);

    let active = app
        .oneshot(empty_request("GET", "/?is_active=true"))
        .await
        .unwrap();
    let active: Vec<UserResponse> = json_body(active.into_body()).await;
    assert_eq!(active.len(), 1);
    assert_eq!(active[0].email, "a@example.com");
}

#[tokio::test]
async fn test_lookup_by_email() {
    let (app, _) = setup();

    app.clone()
        .oneshot(json_request("POST", "/", new_user_body("John@Example.com")))
        .await
        .unwrap();

    let found = app
        .clone()
        .oneshot(empty_request("GET", "/lookup?email=john%40example.com"))
        .await
        .unwrap();
    assert_eq!(found.status(), StatusCode::OK);
    let user: UserResponse = json_body(found.into_body()).await;
    assert_eq!(user.email, "John@Example.com");

    let missing = app
        .oneshot(empty_request("GET", "/lookup?email=nobody%40example.com"))
        .await
        .unwrap();
    assert_eq!(missing.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_malformed_query_strings_return_json_400() {
    let (app, _) = setup();

    for uri in ["/?is_active=maybe", "/lookup", "/lookup?email="] {
        let response = app.clone().oneshot(empty_request("GET", uri)).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST, "{uri}");
        assert_eq!(
            response.headers()["content-type"],
            "application/json",
            "{uri}"
        );

        let error: ErrorResponse = json_body(response.into_body()).await;
        assert_eq!(error.error, "VALIDATION_ERROR", "{uri}");
    }
}

#[tokio::test]
async fn test_patch_user_updates_only_given_fields() {
    let (app, service) = setup();

    app.clone()
        .oneshot(json_request("POST", "/", new_user_body("john@example.com")))
        .await
        .unwrap();
    let before = service.get_user(1).await.unwrap();

    let response = app
        .oneshot(json_request("PATCH", "/1", json!({ "first_name": "Jane" })))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let after: UserResponse = json_body(response.into_body()).await;
    assert_eq!(after.first_name, "Jane");
    assert_eq!(after.last_name, before.last_name);
    assert_eq!(after.email, before.email);
    assert!(after.updated_at >= before.updated_at);
}

#[tokio::test]
async fn test_patch_missing_user_returns_404() {
    let (app, _) = setup();

    let response = app
        .oneshot(json_request("PATCH", "/42", json!({ "first_name": "Jane" })))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_delete_user_then_get_returns_404() {
    let (app, _) = setup();

    app.clone()
        .oneshot(json_request("POST", "/", new_user_body("john@example.com")))
        .await
        .unwrap();

    let deleted = app.clone().oneshot(empty_request("DELETE", "/1")).await.unwrap();
    assert_eq!(deleted.status(), StatusCode::NO_CONTENT);

    let again = app.clone().oneshot(empty_request("DELETE", "/1")).await.unwrap();
    assert_eq!(again.status(), StatusCode::NOT_FOUND);

    let get = app.oneshot(empty_request("GET", "/1")).await.unwrap();
    assert_eq!(get.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_deactivate_and_activate_routes() {
    let (app, _) = setup();

    let response = app
        .clone()
        .oneshot(json_request("POST", "/", new_user_body("john@example.com")))
        .await
        .unwrap();
    let created: UserResponse = json_body(response.into_body()).await;

    let response = app
        .clone()
        .oneshot(empty_request("PATCH", "/1/deactivate"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let user: UserResponse = json_body(response.into_body()).await;
    assert!(!user.is_active);

    let response = app
        .oneshot(empty_request("PATCH", "/1/activate"))
        .await
        .unwrap();
    let activated: UserResponse = json_body(response.into_body()).await;
    assert!(activated.is_active);
    assert!(activated.updated_at >= created.updated_at);
    assert_eq!(
        UserResponse {
            updated_at: created.updated_at,
            ..activated
        },
        created
    );
}

#[tokio::test]
async fn test_register_ignores_roles_and_login_checks_password() {
    let service = UserService::new(InMemoryUserRepository::new());
    let app = auth_handlers::router(service);

    let mut body = new_user_body("john@example.com");
    body["roles"] = json!(["admin"]);

    let response = app
        .clone()
        .oneshot(json_request("POST", "/register", body))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    let user: Value = json_body(response.into_body()).await;
    assert_no_password_fields(&user);
    assert_eq!(user["roles"], json!(["user"]));

    let login = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/login",
            json!({ "email": "JOHN@example.com", "password": STRONG_PASSWORD }),
        ))
        .await
        .unwrap();
    assert_eq!(login.status(), StatusCode::OK);

    let wrong = app
        .oneshot(json_request(
            "POST",
            "/login",
            json!({ "email": "john@example.com", "password": "WrongPass1!" }),
        ))
        .await
        .unwrap();
    assert_eq!(wrong.status(), StatusCode::UNAUTHORIZED);
}
