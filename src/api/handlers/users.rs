use crate::api::error::AppError;
use crate::api::handlers::auth::UserResponse;
use crate::api::middleware::auth::AuthUser;
use crate::services::users::{UserPatch, apply_patch};
use axum::{Extension, Json, extract::State};
use serde::Deserialize;
use utoipa::ToSchema;
use validator::Validate;

#[utoipa::path(
    get,
    path = "/users/me",
    responses(
        (status = 200, description = "Profile retrieved successfully", body = UserResponse),
        (status = 401, description = "Unauthorized")
    ),
    security(
        ("jwt" = [])
    )
)]
pub async fn get_me(Extension(auth): Extension<AuthUser>) -> Json<UserResponse> {
    Json(auth.user.into())
}

/// Partial self-update; only fields present in the request are applied.
#[derive(Deserialize, ToSchema, Validate)]
pub struct UpdateMeRequest {
    #[validate(length(min = 3, max = 50, message = "Username must be between 3 and 50 characters"))]
    pub username: Option<String>,
    #[validate(email(message = "Invalid email format"))]
    pub email: Option<String>,
    #[validate(length(max = 100))]
    pub full_name: Option<String>,
    #[validate(length(min = 8, message = "Password must be at least 8 characters"))]
    pub password: Option<String>,
}

#[utoipa::path(
    put,
    path = "/users/me",
    request_body = UpdateMeRequest,
    responses(
        (status = 200, description = "Profile updated successfully", body = UserResponse),
        (status = 400, description = "Username or email already taken"),
        (status = 401, description = "Unauthorized")
    ),
    security(
        ("jwt" = [])
    )
)]
pub async fn update_me(
    State(state): State<crate::AppState>,
    Extension(auth): Extension<AuthUser>,
    Json(payload): Json<UpdateMeRequest>,
) -> Result<Json<UserResponse>, AppError> {
    payload
        .validate()
        .map_err(|e| AppError::BadRequest(e.to_string()))?;

    let updated = apply_patch(
        &state.db,
        auth.user,
        UserPatch {
            username: payload.username,
            email: payload.email,
            full_name: payload.full_name,
            password: payload.password,
            disabled: None,
            scopes: None,
        },
    )
    .await?;

    Ok(Json(updated.into()))
}
