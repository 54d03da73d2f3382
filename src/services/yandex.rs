use crate::api::error::AppError;
use crate::config::AppConfig;
use serde::Deserialize;
use std::time::Duration;

const HTTP_TIMEOUT: Duration = Duration::from_secs(10);

/// Provider token returned by the code exchange.
#[derive(Debug, Deserialize)]
pub struct ProviderToken {
    pub access_token: String,
    #[serde(default)]
    pub token_type: Option<String>,
    #[serde(default)]
    pub expires_in: Option<i64>,
}

/// External profile, as returned by the provider's userinfo endpoint.
///
/// `id` and `login` are always present for a valid profile; the rest is
/// best-effort and feeds the full-name fallback chain.
#[derive(Debug, Clone, Deserialize)]
pub struct YandexProfile {
    pub id: String,
    pub login: String,
    #[serde(default)]
    pub default_email: Option<String>,
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
}

impl YandexProfile {
    /// first+last name, falling back to display name, falling back to the
    /// login handle; first non-empty wins.
    pub fn full_name(&self) -> String {
        let joined = format!(
            "{} {}",
            self.first_name.as_deref().unwrap_or(""),
            self.last_name.as_deref().unwrap_or("")
        )
        .trim()
        .to_string();

        if !joined.is_empty() {
            return joined;
        }
        match self.display_name.as_deref() {
            Some(name) if !name.is_empty() => name.to_string(),
            _ => self.login.clone(),
        }
    }
}

/// Client for the Yandex OAuth endpoints: authorization redirect, code
/// exchange, and profile fetch. No transaction is ever held across these
/// calls.
pub struct YandexOAuthClient {
    http: reqwest::Client,
    client_id: String,
    client_secret: String,
    auth_url: String,
    token_url: String,
    userinfo_url: String,
    redirect_uri: String,
}

impl YandexOAuthClient {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            http: reqwest::Client::builder()
                .timeout(HTTP_TIMEOUT)
                .build()
                .unwrap_or_default(),
            client_id: config.yandex_client_id.clone(),
            client_secret: config.yandex_client_secret.clone(),
            auth_url: config.yandex_auth_url.clone(),
            token_url: config.yandex_token_url.clone(),
            userinfo_url: config.yandex_userinfo_url.clone(),
            redirect_uri: config.yandex_redirect_uri.clone(),
        }
    }

    /// Authorization endpoint URL the user agent is redirected to.
    pub fn authorize_url(&self, state: &str) -> String {
        let query = serde_urlencoded::to_string([
            ("response_type", "code"),
            ("client_id", self.client_id.as_str()),
            ("redirect_uri", self.redirect_uri.as_str()),
            ("state", state),
        ])
        .unwrap_or_default();

        format!("{}?{}", self.auth_url, query)
    }

    /// Exchange the authorization code for a provider access token.
    ///
    /// Network failures are transient (503, caller may restart the flow);
    /// provider rejections and malformed payloads are permanent for this
    /// attempt (400).
    pub async fn exchange_code(&self, code: &str) -> Result<ProviderToken, AppError> {
        let response = self
            .http
            .post(&self.token_url)
            .form(&[
                ("grant_type", "authorization_code"),
                ("code", code),
                ("client_id", self.client_id.as_str()),
                ("client_secret", self.client_secret.as_str()),
            ])
            .send()
            .await
            .map_err(|e| {
                tracing::error!("Network error during token exchange: {}", e);
                AppError::ServiceUnavailable(
                    "Could not connect to Yandex authentication service. Please try again later."
                        .to_string(),
                )
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            tracing::error!(status = %status, body = %body, "Yandex token exchange failed");
            return Err(AppError::BadRequest(
                "Failed to exchange code for access token.".to_string(),
            ));
        }

        response.json::<ProviderToken>().await.map_err(|e| {
            tracing::error!("Malformed token response from Yandex: {}", e);
            AppError::BadRequest("Invalid token received from Yandex".to_string())
        })
    }

    /// Fetch the external profile with the provider token.
    pub async fn fetch_profile(&self, access_token: &str) -> Result<YandexProfile, AppError> {
        let response = self
            .http
            .get(&self.userinfo_url)
            .header("Authorization", format!("OAuth {}", access_token))
            .query(&[("format", "json")])
            .send()
            .await
            .map_err(|e| {
                tracing::error!("Network error during user info fetch: {}", e);
                AppError::ServiceUnavailable(
                    "Could not connect to Yandex user info service. Please try again later."
                        .to_string(),
                )
            })?;

        if !response.status().is_success() {
            let status = response.status();
            tracing::error!(status = %status, "Yandex user info fetch failed");
            return Err(AppError::BadRequest(
                "Invalid user data received from Yandex".to_string(),
            ));
        }

        response.json::<YandexProfile>().await.map_err(|e| {
            tracing::error!("Validation error for Yandex user data: {}", e);
            AppError::BadRequest("Invalid user data received from Yandex".to_string())
        })
    }
}

const PASSWORD_SYMBOLS: &str = "!@#$%^&*";
const PASSWORD_LENGTH: usize = 16;

/// Generate a strong temporary password with mixed case, digits and symbols.
/// Disclosed exactly once, when a new OAuth-originated account is created.
pub fn generate_temp_password() -> String {
    use rand::Rng;

    let alphabet: Vec<char> = ('a'..='z')
        .chain('A'..='Z')
        .chain('0'..='9')
        .chain(PASSWORD_SYMBOLS.chars())
        .collect();

    let mut rng = rand::thread_rng();
    loop {
        let password: String = (0..PASSWORD_LENGTH)
            .map(|_| alphabet[rng.gen_range(0..alphabet.len())])
            .collect();

        if password.chars().any(|c| c.is_ascii_lowercase())
            && password.chars().any(|c| c.is_ascii_uppercase())
            && password.chars().any(|c| c.is_ascii_digit())
            && password.chars().any(|c| PASSWORD_SYMBOLS.contains(c))
        {
            return password;
        }
    }
}
