use crate::api::error::AppError;
use crate::config::{AppConfig, TOKEN_TYPE};
use crate::entities::{prelude::*, users};
use crate::utils::auth::create_access_token;
use argon2::{
    Argon2, PasswordHash,
    password_hash::{PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter};
use serde::Serialize;
use utoipa::ToSchema;

#[derive(Serialize, ToSchema, Debug, Clone)]
pub struct IssuedToken {
    pub access_token: String,
    pub token_type: String,
}

pub fn hash_password(password: &str) -> Result<String, AppError> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| AppError::Internal(e.to_string()))?
        .to_string();
    Ok(hash)
}

pub fn verify_password(password: &str, password_hash: &str) -> bool {
    let Ok(parsed_hash) = PasswordHash::new(password_hash) else {
        return false;
    };
    Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_ok()
}

pub async fn get_user_by_username(
    db: &DatabaseConnection,
    username: &str,
) -> Result<Option<users::Model>, AppError> {
    let user = Users::find()
        .filter(users::Column::Username.eq(username))
        .one(db)
        .await?;
    Ok(user)
}

/// Turn a verified principal into a signed, time-limited access token.
///
/// `bypass_password_check` is set only by the OAuth callback, which has
/// already authenticated the principal against the external provider; the
/// supplied password is then ignored and never transmitted anywhere.
pub async fn issue_token(
    db: &DatabaseConnection,
    config: &AppConfig,
    username: &str,
    password: &str,
    requested_scopes: Option<&str>,
    bypass_password_check: bool,
) -> Result<IssuedToken, AppError> {
    let user = get_user_by_username(db, username).await?.ok_or_else(|| {
        tracing::warn!("Failed login attempt for unknown username: {}", username);
        AppError::Unauthorized("Incorrect username or password".to_string())
    })?;

    // OAuth accounts never authenticate with a local password
    if user.is_oauth && !bypass_password_check {
        tracing::warn!("OAuth user attempted password login: {}", username);
        return Err(AppError::Forbidden(
            "Please login using your OAuth provider".to_string(),
        ));
    }

    if !bypass_password_check && !verify_password(password, &user.password_hash) {
        tracing::warn!("Invalid password for user: {}", username);
        return Err(AppError::Unauthorized(
            "Incorrect username or password".to_string(),
        ));
    }

    // Surfaced only after the credential itself checked out
    if user.disabled {
        tracing::warn!("Disabled user attempted login: {}", username);
        return Err(AppError::Forbidden("Inactive user".to_string()));
    }

    let scopes = match requested_scopes {
        Some(s) if !s.trim().is_empty() => s.trim().to_string(),
        _ => user.scopes.clone(),
    };

    let access_token = create_access_token(
        &user.username,
        &scopes,
        &config.secret_key,
        config.token_expire_minutes,
    )
    .map_err(|e| AppError::Internal(e.to_string()))?;

    tracing::info!("Successful login for user: {}", user.username);

    Ok(IssuedToken {
        access_token,
        token_type: TOKEN_TYPE.to_string(),
    })
}
