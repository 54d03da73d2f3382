use std::env;

/// Runtime configuration, loaded once at startup and passed explicitly
/// through `AppState`.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// HMAC secret for access tokens and the OAuth state parameter
    pub secret_key: String,

    /// Access token lifetime in minutes (default: 30)
    pub token_expire_minutes: i64,

    /// Root directory for uploaded audio objects (default: "./uploads")
    pub storage_path: String,

    /// Maximum upload size in bytes (default: 256 MB)
    pub max_upload_size: usize,

    /// Yandex OAuth application credentials
    pub yandex_client_id: String,
    pub yandex_client_secret: String,

    /// Provider endpoints, overridable for tests
    pub yandex_auth_url: String,
    pub yandex_token_url: String,
    pub yandex_userinfo_url: String,

    /// Redirect URI registered with the provider
    pub yandex_redirect_uri: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            secret_key: "change-me".to_string(),
            token_expire_minutes: 30,
            storage_path: "./uploads".to_string(),
            max_upload_size: 256 * 1024 * 1024, // 256 MB
            yandex_client_id: String::new(),
            yandex_client_secret: String::new(),
            yandex_auth_url: "https://oauth.yandex.com/authorize".to_string(),
            yandex_token_url: "https://oauth.yandex.com/token".to_string(),
            yandex_userinfo_url: "https://login.yandex.ru/info".to_string(),
            yandex_redirect_uri: "http://127.0.0.1:3000/auth/yandex/callback".to_string(),
        }
    }
}

impl AppConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Self {
        let default = Self::default();

        Self {
            secret_key: env::var("SECRET_KEY").unwrap_or(default.secret_key),

            token_expire_minutes: env::var("ACCESS_TOKEN_EXPIRE_MINUTES")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(default.token_expire_minutes),

            storage_path: env::var("STORAGE_PATH").unwrap_or(default.storage_path),

            max_upload_size: env::var("MAX_UPLOAD_SIZE")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(default.max_upload_size),

            yandex_client_id: env::var("YANDEX_CLIENT_ID").unwrap_or(default.yandex_client_id),

            yandex_client_secret: env::var("YANDEX_CLIENT_SECRET")
                .unwrap_or(default.yandex_client_secret),

            yandex_auth_url: env::var("YANDEX_AUTH_URL").unwrap_or(default.yandex_auth_url),

            yandex_token_url: env::var("YANDEX_TOKEN_URL").unwrap_or(default.yandex_token_url),

            yandex_userinfo_url: env::var("YANDEX_USERINFO_URL")
                .unwrap_or(default.yandex_userinfo_url),

            yandex_redirect_uri: env::var("YANDEX_REDIRECT_URI")
                .unwrap_or(default.yandex_redirect_uri),
        }
    }

    /// Create config for development and tests (fixed secret, tiny expiry horizon is
    /// still the default 30 minutes)
    pub fn development() -> Self {
        Self {
            secret_key: "dev-secret".to_string(),
            yandex_client_id: "dev-client".to_string(),
            yandex_client_secret: "dev-secret".to_string(),
            ..Self::default()
        }
    }
}

/// Token type reported in every token response.
pub const TOKEN_TYPE: &str = "bearer";
