use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, patch},
};
use axum_helpers::{AppError, IdPath, ValidatedJson, ValidatedQuery};
use std::sync::Arc;

use crate::error::UserResult;
use crate::models::{CreateUser, EmailQuery, UpdateUser, UserFilter, UserResponse};
use crate::repository::UserRepository;
use crate::service::UserService;

/// Create the users router with all HTTP endpoints
pub fn router<R: UserRepository + 'static>(service: UserService<R>) -> Router {
    let shared_service = Arc::new(service);

    Router::new()
        .route("/", get(list_users).post(create_user))
        .route("/lookup", get(find_by_email))
        .route(
            "/{id}",
            get(get_user).patch(update_user).delete(delete_user),
        )
        .route("/{id}/activate", patch(activate_user))
        .route("/{id}/deactivate", patch(deactivate_user))
        .with_state(shared_service)
}

/// List users, optionally only active or inactive ones
///
/// GET /users?is_active=true
async fn list_users<R: UserRepository>(
    State(service): State<Arc<UserService<R>>>,
    ValidatedQuery(filter): ValidatedQuery<UserFilter>,
) -> UserResult<Json<Vec<UserResponse>>> {
    let users = match filter.is_active {
        Some(is_active) => service.list_users_by_status(is_active).await?,
        None => service.list_users().await?,
    };
    Ok(Json(users))
}

/// POST /users
async fn create_user<R: UserRepository>(
    State(service): State<Arc<UserService<R>>>,
    ValidatedJson(input): ValidatedJson<CreateUser>,
) -> UserResult<impl IntoResponse> {
    let user = service.create_user(input).await?;
    Ok((StatusCode::CREATED, Json(user)))
}

/// GET /users/lookup?email=someone@example.com
async fn find_by_email<R: UserRepository>(
    State(service): State<Arc<UserService<R>>>,
    ValidatedQuery(query): ValidatedQuery<EmailQuery>,
) -> UserResult<Response> {
    let response = match service.find_by_email(&query.email).await? {
        Some(user) => Json(user).into_response(),
        None => AppError::NotFound(format!("No user with email {}", query.email)).into_response(),
    };
    Ok(response)
}

/// GET /users/{id}
async fn get_user<R: UserRepository>(
    State(service): State<Arc<UserService<R>>>,
    IdPath(id): IdPath,
) -> UserResult<Json<UserResponse>> {
    let user = service.get_user(id).await?;
    Ok(Json(user))
}

/// Partial update; omitted fields are left unchanged
///
/// PATCH /users/{id}
async fn update_user<R: UserRepository>(
    State(service): State<Arc<UserService<R>>>,
    IdPath(id): IdPath,
    ValidatedJson(input): ValidatedJson<UpdateUser>,
) -> UserResult<Json<UserResponse>> {
    let user = service.update_user(id, input).await?;
    Ok(Json(user))
}

/// DELETE /users/{id}
async fn delete_user<R: UserRepository>(
    State(service): State<Arc<UserService<R>>>,
    IdPath(id): IdPath,
) -> UserResult<impl IntoResponse> {
    service.delete_user(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// PATCH /users/{id}/activate
async fn activate_user<R: UserRepository>(
    State(service): State<Arc<UserService<R>>>,
    IdPath(id): IdPath,
) -> UserResult<Json<UserResponse>> {
    let user = service.activate_user(id).await?;
    Ok(Json(user))
}

/// PATCH /users/{id}/deactivate
async fn deactivate_user<R: UserRepository>(
    State(service): State<Arc<UserService<R>>>,
    IdPath(id): IdPath,
) -> UserResult<Json<UserResponse>> {
    let user = service.deactivate_user(id).await?;
    Ok(Json(user))
}
