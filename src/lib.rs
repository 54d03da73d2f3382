pub mod api;
pub mod config;
pub mod entities;
pub mod infrastructure;
pub mod services;
pub mod utils;

use crate::config::AppConfig;
use crate::services::storage::AudioStorage;
use crate::services::yandex::YandexOAuthClient;
use axum::{
    Router,
    middleware::from_fn_with_state,
    routing::{get, post},
};
use sea_orm::DatabaseConnection;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

#[derive(OpenApi)]
#[openapi(
    paths(
        api::handlers::auth::register,
        api::handlers::auth::login,
        api::handlers::oauth::login_yandex,
        api::handlers::oauth::callback_yandex,
        api::handlers::users::get_me,
        api::handlers::users::update_me,
        api::handlers::admin::list_users,
        api::handlers::admin::update_user,
        api::handlers::admin::status,
        api::handlers::audio::upload_file,
        api::handlers::audio::stream_file,
        api::handlers::health::health_check,
    ),
    components(
        schemas(
            api::handlers::auth::RegisterRequest,
            api::handlers::auth::TokenForm,
            api::handlers::auth::UserResponse,
            api::handlers::oauth::OAuthCallbackResponse,
            api::handlers::users::UpdateMeRequest,
            api::handlers::admin::AdminUpdateRequest,
            api::handlers::audio::UploadResponse,
            api::handlers::health::HealthResponse,
            entities::audio_files::ContentType,
            entities::audio_files::Genre,
            services::auth::IssuedToken,
        )
    ),
    tags(
        (name = "auth", description = "Authentication endpoints"),
        (name = "audio", description = "Audio upload and streaming endpoints"),
        (name = "admin", description = "Administration endpoints")
    )
)]
pub struct ApiDoc;

#[derive(Clone)]
pub struct AppState {
    pub db: DatabaseConnection,
    pub storage: Arc<dyn AudioStorage>,
    pub oauth: Arc<YandexOAuthClient>,
    pub config: AppConfig,
}

pub fn create_app(state: AppState) -> Router {
    Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .route("/health", get(api::handlers::health::health_check))
        .route("/register", post(api::handlers::auth::register))
        .route("/token", post(api::handlers::auth::login))
        .route("/auth/yandex", get(api::handlers::oauth::login_yandex))
        .route(
            "/auth/yandex/callback",
            get(api::handlers::oauth::callback_yandex),
        )
        .route(
            "/users/me",
            get(api::handlers::users::get_me)
                .put(api::handlers::users::update_me)
                .layer(from_fn_with_state(
                    state.clone(),
                    api::middleware::auth::auth_middleware,
                )),
        )
        .route(
            "/admin/users",
            get(api::handlers::admin::list_users).layer(from_fn_with_state(
                state.clone(),
                api::middleware::auth::auth_middleware,
            )),
        )
        .route(
            "/admin/users/:id",
            axum::routing::patch(api::handlers::admin::update_user).layer(from_fn_with_state(
                state.clone(),
                api::middleware::auth::auth_middleware,
            )),
        )
        .route(
            "/admin/status",
            get(api::handlers::admin::status).layer(from_fn_with_state(
                state.clone(),
                api::middleware::auth::auth_middleware,
            )),
        )
        .route(
            "/audio/upload",
            post(api::handlers::audio::upload_file)
                .layer(axum::extract::DefaultBodyLimit::max(
                    state.config.max_upload_size + 10 * 1024 * 1024, // Add 10MB buffer for multipart overhead
                ))
                .layer(from_fn_with_state(
                    state.clone(),
                    api::middleware::auth::auth_middleware,
                )),
        )
        .route(
            "/audio/:id/file",
            get(api::handlers::audio::stream_file).layer(from_fn_with_state(
                state.clone(),
                api::middleware::auth::auth_middleware,
            )),
        )
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state)
}
