use crate::api::error::AppError;
use crate::entities::{prelude::*, users};
use crate::services::auth::hash_password;
use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, DbErr, EntityTrait,
    QueryFilter, Set, SqlErr,
};

/// Input for account creation, by registration or by first OAuth login.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub username: String,
    pub email: Option<String>,
    pub full_name: Option<String>,
    pub password: String,
    pub disabled: bool,
    pub scopes: String,
    pub is_oauth: bool,
    pub oauth_provider: Option<String>,
    pub oauth_id: Option<String>,
}

/// Map a unique-constraint violation to the client-visible "already taken"
/// outcome. A race between two concurrent creations lands here as well; it
/// is an expected, recoverable failure.
fn map_insert_error(e: DbErr, username: &str, email: Option<&str>) -> AppError {
    if let Some(SqlErr::UniqueConstraintViolation(constraint)) = e.sql_err() {
        tracing::warn!(
            constraint = %constraint,
            username = %username,
            email = ?email,
            "Unique constraint violation on user insert"
        );
        let constraint = constraint.to_lowercase();
        if constraint.contains("username") {
            return AppError::BadRequest("Username already taken.".to_string());
        }
        if constraint.contains("email") {
            return AppError::BadRequest("Email already taken.".to_string());
        }
    }
    AppError::Database(e)
}

pub async fn create_user(db: &DatabaseConnection, user: NewUser) -> Result<users::Model, AppError> {
    // Friendly pre-checks; the database constraints remain authoritative
    let by_username = Users::find()
        .filter(users::Column::Username.eq(&user.username))
        .one(db)
        .await?;
    if by_username.is_some() {
        return Err(AppError::BadRequest(
            "Username already registered".to_string(),
        ));
    }

    if let Some(email) = &user.email {
        let by_email = Users::find()
            .filter(users::Column::Email.eq(email))
            .one(db)
            .await?;
        if by_email.is_some() {
            return Err(AppError::BadRequest(
                "Email is already registered".to_string(),
            ));
        }
    }

    let password_hash = hash_password(&user.password)?;
    let now = Utc::now();

    let model = users::ActiveModel {
        username: Set(user.username.clone()),
        email: Set(user.email.clone()),
        password_hash: Set(password_hash),
        full_name: Set(user.full_name),
        disabled: Set(user.disabled),
        scopes: Set(if user.scopes.is_empty() {
            "me listener".to_string()
        } else {
            user.scopes
        }),
        is_oauth: Set(user.is_oauth),
        oauth_provider: Set(user.oauth_provider),
        oauth_id: Set(user.oauth_id),
        created_at: Set(Some(now)),
        updated_at: Set(Some(now)),
        ..Default::default()
    };

    let created = model
        .insert(db)
        .await
        .map_err(|e| map_insert_error(e, &user.username, user.email.as_deref()))?;

    tracing::info!(
        user_id = created.id,
        username = %created.username,
        is_oauth = created.is_oauth,
        "New user created"
    );

    Ok(created)
}

pub async fn find_by_email(
    db: &DatabaseConnection,
    email: &str,
) -> Result<Option<users::Model>, AppError> {
    let user = Users::find()
        .filter(users::Column::Email.eq(email))
        .one(db)
        .await?;
    Ok(user)
}

/// Partial update applied field by field; only present fields are assigned.
#[derive(Debug, Default, Clone)]
pub struct UserPatch {
    pub username: Option<String>,
    pub email: Option<String>,
    pub full_name: Option<String>,
    pub password: Option<String>,
    pub disabled: Option<bool>,
    pub scopes: Option<String>,
}

pub async fn apply_patch<C: ConnectionTrait>(
    db: &C,
    user: users::Model,
    patch: UserPatch,
) -> Result<users::Model, AppError> {
    let username = user.username.clone();
    let email = patch.email.clone().or(user.email.clone());
    let mut active: users::ActiveModel = user.into();

    if let Some(new_username) = patch.username {
        active.username = Set(new_username);
    }
    if let Some(new_email) = patch.email {
        active.email = Set(Some(new_email));
    }
    if let Some(full_name) = patch.full_name {
        active.full_name = Set(Some(full_name));
    }
    if let Some(password) = patch.password
        && !password.is_empty()
    {
        active.password_hash = Set(hash_password(&password)?);
    }
    if let Some(disabled) = patch.disabled {
        active.disabled = Set(disabled);
    }
    if let Some(scopes) = patch.scopes {
        active.scopes = Set(scopes);
    }
    active.updated_at = Set(Some(Utc::now()));

    let updated = active
        .update(db)
        .await
        .map_err(|e| map_insert_error(e, &username, email.as_deref()))?;

    Ok(updated)
}
