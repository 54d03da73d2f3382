use anyhow::Result;
use chrono::{Duration, Utc};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};

/// Access token claims. Tokens are stateless: validity is fully determined
/// by the signature and the expiry instant.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    /// Username of the principal
    pub sub: String,
    /// Space-separated scope set
    pub scopes: String,
    pub exp: usize,
}

pub fn create_access_token(
    username: &str,
    scopes: &str,
    secret: &str,
    expire_minutes: i64,
) -> Result<String> {
    let expiration = (Utc::now() + Duration::minutes(expire_minutes)).timestamp();

    let claims = Claims {
        sub: username.to_owned(),
        scopes: scopes.to_owned(),
        exp: expiration as usize,
    };

    let token = encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_ref()),
    )?;

    Ok(token)
}

pub fn decode_access_token(token: &str, secret: &str) -> Result<Claims> {
    let token_data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_ref()),
        &Validation::default(),
    )?;

    Ok(token_data.claims)
}

/// Anti-forgery state for the OAuth redirect. Signed with the app secret and
/// short-lived, so the callback can verify it without server-side storage.
#[derive(Debug, Serialize, Deserialize)]
struct StateClaims {
    nonce: String,
    exp: usize,
}

const STATE_LIFETIME_MINUTES: i64 = 10;

pub fn create_login_state(secret: &str) -> Result<String> {
    use rand::Rng;

    let nonce: String = rand::thread_rng()
        .sample_iter(rand::distributions::Alphanumeric)
        .take(32)
        .map(char::from)
        .collect();

    let claims = StateClaims {
        nonce,
        exp: (Utc::now() + Duration::minutes(STATE_LIFETIME_MINUTES)).timestamp() as usize,
    };

    let token = encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_ref()),
    )?;

    Ok(token)
}

pub fn verify_login_state(state: &str, secret: &str) -> bool {
    decode::<StateClaims>(
        state,
        &DecodingKey::from_secret(secret.as_ref()),
        &Validation::default(),
    )
    .is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_token_round_trip() {
        let token = create_access_token("alice", "me listener", "test_secret", 30).unwrap();
        let claims = decode_access_token(&token, "test_secret").unwrap();
        assert_eq!(claims.sub, "alice");
        assert_eq!(claims.scopes, "me listener");
    }

    #[test]
    fn test_token_round_trip_empty_scopes() {
        let token = create_access_token("bob", "", "test_secret", 30).unwrap();
        let claims = decode_access_token(&token, "test_secret").unwrap();
        assert_eq!(claims.sub, "bob");
        assert_eq!(claims.scopes, "");
    }

    #[test]
    fn test_expired_token_rejected() {
        // Past the default 60s validation leeway
        let token = create_access_token("alice", "me", "test_secret", -5).unwrap();
        assert!(decode_access_token(&token, "test_secret").is_err());
    }

    #[test]
    fn test_wrong_secret_rejected() {
        let token = create_access_token("alice", "me", "test_secret", 30).unwrap();
        assert!(decode_access_token(&token, "other_secret").is_err());
    }

    #[test]
    fn test_login_state_round_trip() {
        let state = create_login_state("test_secret").unwrap();
        assert!(verify_login_state(&state, "test_secret"));
        assert!(!verify_login_state(&state, "other_secret"));
        assert!(!verify_login_state("garbage", "test_secret"));
    }
}
