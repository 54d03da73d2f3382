use crate::api::error::AppError;
use crate::api::handlers::auth::UserResponse;
use crate::api::middleware::auth::AuthUser;
use crate::entities::prelude::*;
use crate::services::users::{UserPatch, apply_patch};
use axum::{
    Extension, Json,
    extract::{Path, Query, State},
};
use sea_orm::{EntityTrait, PaginatorTrait, QuerySelect};
use serde::Deserialize;
use serde_json::{Value, json};
use utoipa::ToSchema;
use validator::Validate;

#[derive(Deserialize)]
pub struct ListUsersQuery {
    pub limit: Option<u64>,
    pub offset: Option<u64>,
}

#[utoipa::path(
    get,
    path = "/admin/users",
    params(
        ("limit" = Option<u64>, Query, description = "Maximum number of users to return"),
        ("offset" = Option<u64>, Query, description = "Number of users to skip")
    ),
    responses(
        (status = 200, description = "Paginated user list", body = [UserResponse]),
        (status = 401, description = "Not enough permissions")
    ),
    security(
        ("jwt" = [])
    )
)]
pub async fn list_users(
    State(state): State<crate::AppState>,
    Extension(auth): Extension<AuthUser>,
    Query(query): Query<ListUsersQuery>,
) -> Result<Json<Vec<UserResponse>>, AppError> {
    auth.require_scope("superuser")?;

    let users = Users::find()
        .limit(query.limit.unwrap_or(10))
        .offset(query.offset.unwrap_or(0))
        .all(&state.db)
        .await?;

    Ok(Json(users.into_iter().map(UserResponse::from).collect()))
}

/// Admin partial update; extends the self-service fields with account
/// status and scopes.
#[derive(Deserialize, ToSchema, Validate)]
pub struct AdminUpdateRequest {
    #[validate(length(min = 3, max = 50, message = "Username must be between 3 and 50 characters"))]
    pub username: Option<String>,
    #[validate(email(message = "Invalid email format"))]
    pub email: Option<String>,
    #[validate(length(max = 100))]
    pub full_name: Option<String>,
    #[validate(length(min = 8, message = "Password must be at least 8 characters"))]
    pub password: Option<String>,
    pub disabled: Option<bool>,
    pub scopes: Option<String>,
}

#[utoipa::path(
    patch,
    path = "/admin/users/{id}",
    params(
        ("id" = i64, Path, description = "User ID")
    ),
    request_body = AdminUpdateRequest,
    responses(
        (status = 200, description = "User updated", body = UserResponse),
        (status = 401, description = "Not enough permissions"),
        (status = 404, description = "User not found")
    ),
    security(
        ("jwt" = [])
    )
)]
pub async fn update_user(
    State(state): State<crate::AppState>,
    Extension(auth): Extension<AuthUser>,
    Path(user_id): Path<i64>,
    Json(payload): Json<AdminUpdateRequest>,
) -> Result<Json<UserResponse>, AppError> {
    auth.require_scope("superuser")?;

    payload
        .validate()
        .map_err(|e| AppError::BadRequest(e.to_string()))?;

    let user = Users::find_by_id(user_id)
        .one(&state.db)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("User with ID {} not found.", user_id)))?;

    let updated = apply_patch(
        &state.db,
        user,
        UserPatch {
            username: payload.username,
            email: payload.email,
            full_name: payload.full_name,
            password: payload.password,
            disabled: payload.disabled,
            scopes: payload.scopes,
        },
    )
    .await?;

    tracing::info!(user_id, admin = %auth.user.username, "User updated by admin");

    Ok(Json(updated.into()))
}

#[utoipa::path(
    get,
    path = "/admin/status",
    responses(
        (status = 200, description = "System status"),
        (status = 401, description = "Not enough permissions")
    ),
    security(
        ("jwt" = [])
    )
)]
pub async fn status(
    State(state): State<crate::AppState>,
    Extension(auth): Extension<AuthUser>,
) -> Result<Json<Value>, AppError> {
    auth.require_scope("superuser")?;

    let user_count = Users::find().count(&state.db).await?;

    Ok(Json(json!({
        "status": "ok",
        "superuser": auth.user.username,
        "users": user_count,
    })))
}
