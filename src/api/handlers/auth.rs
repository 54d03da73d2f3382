use crate::api::error::AppError;
use crate::services::auth::{IssuedToken, issue_token};
use crate::services::users::{NewUser, create_user};
use axum::{Form, Json, extract::State, http::StatusCode};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

#[derive(Deserialize, ToSchema, Validate)]
pub struct RegisterRequest {
    #[validate(length(min = 3, max = 50, message = "Username must be between 3 and 50 characters"))]
    pub username: String,
    #[validate(email(message = "Invalid email format"))]
    pub email: Option<String>,
    #[validate(length(max = 100))]
    pub full_name: Option<String>,
    #[validate(length(min = 8, message = "Password must be at least 8 characters"))]
    pub password: String,
    #[serde(default)]
    pub scopes: Option<String>,
}

#[derive(Serialize, ToSchema)]
pub struct UserResponse {
    pub id: i64,
    pub username: String,
    pub email: Option<String>,
    pub full_name: Option<String>,
    pub disabled: bool,
    pub scopes: String,
    pub is_oauth: bool,
}

impl From<crate::entities::users::Model> for UserResponse {
    fn from(user: crate::entities::users::Model) -> Self {
        Self {
            id: user.id,
            username: user.username,
            email: user.email,
            full_name: user.full_name,
            disabled: user.disabled,
            scopes: user.scopes,
            is_oauth: user.is_oauth,
        }
    }
}

#[utoipa::path(
    post,
    path = "/register",
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "User registered successfully", body = UserResponse),
        (status = 400, description = "Username or email already taken")
    )
)]
pub async fn register(
    State(state): State<crate::AppState>,
    Json(payload): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<UserResponse>), AppError> {
    payload
        .validate()
        .map_err(|e| AppError::BadRequest(e.to_string()))?;

    let user = create_user(
        &state.db,
        NewUser {
            username: payload.username,
            email: payload.email,
            full_name: payload.full_name,
            password: payload.password,
            disabled: false,
            scopes: payload.scopes.unwrap_or_default(),
            is_oauth: false,
            oauth_provider: None,
            oauth_id: None,
        },
    )
    .await?;

    Ok((StatusCode::CREATED, Json(user.into())))
}

/// OAuth2 password form: username, password, optional requested scope set.
#[derive(Deserialize, ToSchema)]
pub struct TokenForm {
    pub username: String,
    pub password: String,
    #[serde(default)]
    pub scope: Option<String>,
}

#[utoipa::path(
    post,
    path = "/token",
    request_body = TokenForm,
    responses(
        (status = 200, description = "Login successful", body = IssuedToken),
        (status = 401, description = "Invalid credentials"),
        (status = 403, description = "Inactive user or OAuth account")
    )
)]
pub async fn login(
    State(state): State<crate::AppState>,
    Form(form): Form<TokenForm>,
) -> Result<Json<IssuedToken>, AppError> {
    let token = issue_token(
        &state.db,
        &state.config,
        &form.username,
        &form.password,
        form.scope.as_deref(),
        false,
    )
    .await?;

    Ok(Json(token))
}
