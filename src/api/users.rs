//! User management endpoints

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::get,
    Router,
};
use tracing::debug;

use crate::api::state::AppState;
use crate::api::types::{
    ApiError, DeleteUserResponse, Json, ListUsersQuery, ListUsersResponse, UserResponse,
};
use crate::domain::user::{NewUserInput, UserPatch};
use crate::domain::UserId;

/// Create the user management router
pub fn create_users_router() -> Router<AppState> {
    Router::new()
        .route("/users", get(list_users).post(create_user))
        .route(
            "/users/{id}",
            get(get_user).put(update_user).delete(delete_user),
        )
}

/// Identifiers that are not positive integers cannot name a stored user
fn parse_user_id(raw: &str) -> Result<UserId, ApiError> {
    UserId::parse(raw).ok_or_else(|| ApiError::not_found(format!("User '{}' not found", raw)))
}

/// GET /users
pub async fn list_users(
    State(state): State<AppState>,
    Query(query): Query<ListUsersQuery>,
) -> Result<Json<ListUsersResponse>, ApiError> {
    let page = query.page_request(&state.pagination);
    let filter = query.filter();

    debug!(
        page = page.page(),
        page_size = page.page_size(),
        name = ?filter.name,
        email = ?filter.email,
        "Listing users"
    );

    let users = state.user_service.list(&filter, page).await?;

    Ok(Json(ListUsersResponse::from(users)))
}

/// POST /users
pub async fn create_user(
    State(state): State<AppState>,
    Json(request): Json<NewUserInput>,
) -> Result<(StatusCode, Json<UserResponse>), ApiError> {
    debug!("Creating user");

    let user = state.user_service.create(request).await?;

    Ok((StatusCode::CREATED, Json(UserResponse::from(user))))
}

/// GET /users/{id}
pub async fn get_user(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<UserResponse>, ApiError> {
    let id = parse_user_id(&id)?;
    debug!(user_id = %id, "Getting user");

    let user = state.user_service.get(id).await?;

    Ok(Json(UserResponse::from(user)))
}

/// PUT /users/{id}
pub async fn update_user(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(request): Json<UserPatch>,
) -> Result<Json<UserResponse>, ApiError> {
    let id = parse_user_id(&id)?;
    debug!(user_id = %id, "Updating user");

    let user = state.user_service.update(id, request).await?;

    Ok(Json(UserResponse::from(user)))
}

/// DELETE /users/{id}
pub async fn delete_user(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<DeleteUserResponse>, ApiError> {
    let id = parse_user_id(&id)?;
    debug!(user_id = %id, "Deleting user");

    state.user_service.delete(id).await?;

    Ok(Json(DeleteUserResponse {
        message: "User deleted".to_string(),
        id: id.value(),
    }))
}
