use crate::api::error::AppError;
use crate::entities::users;
use crate::services::auth::get_user_by_username;
use crate::utils::auth::decode_access_token;
use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use serde::Deserialize;

/// Principal resolved from a verified bearer token, inserted into request
/// extensions for downstream handlers.
#[derive(Clone, Debug)]
pub struct AuthUser {
    pub user: users::Model,
    pub scopes: Vec<String>,
}

impl AuthUser {
    pub fn has_scope(&self, scope: &str) -> bool {
        self.scopes.iter().any(|s| s == scope)
    }

    pub fn require_scope(&self, scope: &str) -> Result<(), AppError> {
        if self.has_scope(scope) {
            Ok(())
        } else {
            Err(AppError::Unauthorized("Not enough permissions".to_string()))
        }
    }
}

#[derive(Deserialize)]
struct AuthQuery {
    token: Option<String>,
}

/// Resolve the bearer token (Authorization header or `?token=` query, the
/// latter for media elements that cannot set headers), verify it, and load
/// the account. All routes behind this middleware require the `me` scope.
pub async fn auth_middleware(
    State(state): State<crate::AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let header_token = req
        .headers()
        .get("Authorization")
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "))
        .map(|s| s.to_string());

    let token = match header_token {
        Some(t) => Some(t),
        None => {
            let query = req.uri().query().unwrap_or_default();
            serde_urlencoded::from_str::<AuthQuery>(query)
                .ok()
                .and_then(|q| q.token)
        }
    };

    let Some(token) = token else {
        return Err(AppError::Unauthorized(
            "Could not validate credentials".to_string(),
        ));
    };

    let claims = decode_access_token(&token, &state.config.secret_key).map_err(|_| {
        AppError::Unauthorized("Could not validate credentials".to_string())
    })?;

    let user = get_user_by_username(&state.db, &claims.sub)
        .await?
        .ok_or_else(|| AppError::Unauthorized("Could not validate credentials".to_string()))?;

    if user.disabled {
        return Err(AppError::Forbidden("Inactive user".to_string()));
    }

    let auth = AuthUser {
        user,
        scopes: claims.scopes.split_whitespace().map(str::to_owned).collect(),
    };
    auth.require_scope("me")?;

    req.extensions_mut().insert(auth);
    Ok(next.run(req).await)
}
