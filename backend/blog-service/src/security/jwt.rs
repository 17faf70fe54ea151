/// JWT token generation and validation using HS256
/// Tokens carry the user id as `sub` and expire after the configured
/// number of days (default 30).
use anyhow::{anyhow, Result};
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, TokenData, Validation};
use lazy_static::lazy_static;
use serde::{Deserialize, Serialize};
use std::sync::RwLock;
use uuid::Uuid;

/// JWT Claims structure
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    /// Subject (user ID)
    pub sub: String,
    /// Issued at (Unix timestamp)
    pub iat: i64,
    /// Expiration time (Unix timestamp)
    pub exp: i64,
}

struct JwtState {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    expiry_days: i64,
}

lazy_static! {
    static ref JWT_STATE: RwLock<Option<JwtState>> = RwLock::new(None);
}

/// Initialize the signing secret; must be called during startup before
/// any token operation.
pub fn initialize(secret: &str, expiry_days: i64) -> Result<()> {
    if secret.is_empty() {
        return Err(anyhow!("JWT secret must not be empty"));
    }

    let state = JwtState {
        encoding_key: EncodingKey::from_secret(secret.as_bytes()),
        decoding_key: DecodingKey::from_secret(secret.as_bytes()),
        expiry_days,
    };

    let mut guard = JWT_STATE
        .write()
        .map_err(|e| anyhow!("Failed to acquire write lock on JWT state: {}", e))?;
    *guard = Some(state);

    Ok(())
}

/// Generate a signed token for a user id
pub fn generate_token(user_id: Uuid) -> Result<String> {
    let guard = JWT_STATE
        .read()
        .map_err(|e| anyhow!("Failed to acquire read lock on JWT state: {}", e))?;
    let state = guard
        .as_ref()
        .ok_or_else(|| anyhow!("JWT state not initialized. Call initialize() during startup"))?;

    let now = Utc::now();
    let expiry = now + Duration::days(state.expiry_days);

    let claims = Claims {
        sub: user_id.to_string(),
        iat: now.timestamp(),
        exp: expiry.timestamp(),
    };

    encode(&Header::default(), &claims, &state.encoding_key)
        .map_err(|e| anyhow!("Failed to generate token: {}", e))
}

/// Validate a token and return its claims
pub fn validate_token(token: &str) -> Result<TokenData<Claims>> {
    let guard = JWT_STATE
        .read()
        .map_err(|e| anyhow!("Failed to acquire read lock on JWT state: {}", e))?;
    let state = guard
        .as_ref()
        .ok_or_else(|| anyhow!("JWT state not initialized. Call initialize() during startup"))?;

    decode::<Claims>(token, &state.decoding_key, &Validation::default())
        .map_err(|e| anyhow!("Token validation failed: {}", e))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn init() {
        initialize("test-secret", 30).unwrap();
    }

    #[test]
    fn round_trip_preserves_subject() {
        init();
        let user_id = Uuid::new_v4();
        let token = generate_token(user_id).unwrap();
        let data = validate_token(&token).unwrap();
        assert_eq!(data.claims.sub, user_id.to_string());
    }

    #[test]
    fn expiry_is_days_ahead_of_issuance() {
        init();
        let token = generate_token(Uuid::new_v4()).unwrap();
        let claims = validate_token(&token).unwrap().claims;
        assert_eq!(claims.exp - claims.iat, 30 * 24 * 60 * 60);
    }

    #[test]
    fn garbage_token_is_rejected() {
        init();
        assert!(validate_token("not-a-token").is_err());
    }
}
