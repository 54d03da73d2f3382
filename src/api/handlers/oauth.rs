use crate::api::error::AppError;
use crate::api::handlers::auth::UserResponse;
use crate::services::auth::issue_token;
use crate::services::users::{NewUser, create_user, find_by_email};
use crate::services::yandex::generate_temp_password;
use crate::utils::auth::{create_login_state, verify_login_state};
use axum::{
    Json,
    extract::{Query, State},
    response::{IntoResponse, Redirect, Response},
};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Where the user agent lands when the provider reports an error.
const AUTH_FAILED_REDIRECT: &str = "/register?error=yandex_auth_failed";
/// Password-login entry point, used for the email-collision refusal.
const PASSWORD_LOGIN_REDIRECT: &str = "/token";

/// Scopes granted to accounts created through the OAuth flow.
const OAUTH_DEFAULT_SCOPES: &str = "me listener";

#[derive(Serialize, ToSchema)]
pub struct OAuthCallbackResponse {
    pub access_token: String,
    pub token_type: String,
    pub user_info: UserResponse,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temporary_password: Option<String>,
    pub is_temporary_password: bool,
}

#[utoipa::path(
    get,
    path = "/auth/yandex",
    responses(
        (status = 303, description = "Redirect to the Yandex authorization endpoint")
    )
)]
pub async fn login_yandex(State(state): State<crate::AppState>) -> Result<Response, AppError> {
    let login_state = create_login_state(&state.config.secret_key)
        .map_err(|e| AppError::Internal(format!("Failed to initiate Yandex login: {}", e)))?;

    let url = state.oauth.authorize_url(&login_state);
    tracing::info!("Initiating Yandex OAuth redirect");

    Ok(Redirect::to(&url).into_response())
}

#[derive(Deserialize)]
pub struct CallbackQuery {
    pub code: Option<String>,
    pub state: Option<String>,
    pub error: Option<String>,
    pub error_description: Option<String>,
}

#[utoipa::path(
    get,
    path = "/auth/yandex/callback",
    responses(
        (status = 200, description = "Authentication successful", body = OAuthCallbackResponse),
        (status = 303, description = "Provider error or email collision, redirect"),
        (status = 400, description = "Invalid callback request"),
        (status = 503, description = "Provider unreachable")
    )
)]
pub async fn callback_yandex(
    State(state): State<crate::AppState>,
    Query(query): Query<CallbackQuery>,
) -> Result<Response, AppError> {
    // 1. Provider-reported errors are a redirect, not an exception
    if let Some(error) = query.error {
        tracing::error!(
            error = %error,
            description = query.error_description.as_deref().unwrap_or("No description provided."),
            "Yandex returned an error"
        );
        return Ok(Redirect::to(AUTH_FAILED_REDIRECT).into_response());
    }

    // 2. No code without an error is a malformed callback
    let Some(code) = query.code else {
        tracing::error!("Yandex callback missing 'code' parameter without an 'error'");
        return Err(AppError::BadRequest(
            "Invalid callback request from Yandex: missing code.".to_string(),
        ));
    };

    // 3. Anti-forgery state must verify
    let state_ok = query
        .state
        .as_deref()
        .is_some_and(|s| verify_login_state(s, &state.config.secret_key));
    if !state_ok {
        tracing::warn!("Yandex callback carried a missing or invalid state parameter");
        return Err(AppError::BadRequest(
            "Invalid callback request from Yandex: bad state.".to_string(),
        ));
    }

    // 4. Code exchange, then profile fetch; neither runs inside a transaction
    let provider_token = state.oauth.exchange_code(&code).await?;
    let profile = state.oauth.fetch_profile(&provider_token.access_token).await?;

    let Some(email) = profile.default_email.clone().filter(|e| !e.is_empty()) else {
        tracing::error!("Yandex profile missing default_email");
        return Err(AppError::BadRequest(
            "Invalid user data received from Yandex".to_string(),
        ));
    };

    // 5. Reconciliation: at most one local account per external identity
    if let Some(existing) = find_by_email(&state.db, &email).await? {
        if !existing.is_oauth {
            // Email collision with a password account: refuse silently to
            // block account takeover through the provider
            tracing::warn!(email = %email, "Email conflict with non-OAuth account");
            return Ok(Redirect::to(PASSWORD_LOGIN_REDIRECT).into_response());
        }

        tracing::info!(user_id = existing.id, "Returning OAuth user");
        let token = issue_token(
            &state.db,
            &state.config,
            &existing.username,
            "",
            None,
            true,
        )
        .await?;

        return Ok(Json(OAuthCallbackResponse {
            access_token: token.access_token,
            token_type: token.token_type,
            user_info: existing.into(),
            temporary_password: None,
            is_temporary_password: false,
        })
        .into_response());
    }

    // 6. First login for this identity: create the account with a one-time
    //    temporary password disclosed in this response only
    let temp_password = generate_temp_password();
    let created = create_user(
        &state.db,
        NewUser {
            username: profile.login.clone(),
            email: Some(email),
            full_name: Some(profile.full_name()),
            password: temp_password.clone(),
            disabled: false,
            scopes: OAUTH_DEFAULT_SCOPES.to_string(),
            is_oauth: true,
            oauth_provider: Some("yandex".to_string()),
            oauth_id: Some(profile.id.clone()),
        },
    )
    .await?;

    let token = issue_token(
        &state.db,
        &state.config,
        &created.username,
        "",
        None,
        true,
    )
    .await?;

    Ok(Json(OAuthCallbackResponse {
        access_token: token.access_token,
        token_type: token.token_type,
        user_info: created.into(),
        temporary_password: Some(temp_password),
        is_temporary_password: true,
    })
    .into_response())
}
