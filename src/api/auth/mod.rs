//! Authentication API endpoints
//!
//! Signup and login exchange credentials for a signed bearer token; `/me`
//! resolves the token back to its user.

use axum::{
    extract::State,
    routing::{get, post},
    Router,
};
use tracing::debug;

use crate::api::middleware::RequireUser;
use crate::api::state::AppState;
use crate::api::types::{ApiError, Json, UserResponse};
use crate::domain::user::{Credentials, NewUserInput};
use crate::infrastructure::auth::AuthToken;

/// Create the authentication router
pub fn create_auth_router() -> Router<AppState> {
    Router::new()
        .route("/signup", post(signup))
        .route("/login", post(login))
        .route("/me", get(get_current_user))
}

/// Register a new user
///
/// POST /signup
///
/// Returns a token bound to the new user.
pub async fn signup(
    State(state): State<AppState>,
    Json(request): Json<NewUserInput>,
) -> Result<Json<AuthToken>, ApiError> {
    debug!("Signup requested");

    let token = state.auth_service.register(request).await?;

    Ok(Json(token))
}

/// Login with email and password
///
/// POST /login
pub async fn login(
    State(state): State<AppState>,
    Json(request): Json<Credentials>,
) -> Result<Json<AuthToken>, ApiError> {
    let token = state.auth_service.login(request).await?;

    Ok(Json(token))
}

/// Get current authenticated user
///
/// GET /me
pub async fn get_current_user(
    RequireUser(user): RequireUser,
) -> Result<Json<UserResponse>, ApiError> {
    Ok(Json(UserResponse::from(user)))
}
