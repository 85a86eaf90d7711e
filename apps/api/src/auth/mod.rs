//! Argon2 password hashing and HS256 access/refresh JWTs.
//!
//! Token pairs carry a `token_type` claim so a refresh token can never be
//! replayed as an access token (and vice versa).

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts},
};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::user::User;
use crate::state::AppState;

pub mod handlers;
pub mod store;

/// Hash a password using Argon2.
pub fn hash_password(password: &str) -> Result<String, AppError> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| anyhow::anyhow!("Failed to hash password: {e}"))?;
    Ok(hash.to_string())
}

/// Verify a password against a stored Argon2 hash.
pub fn verify_password(password: &str, hash: &str) -> bool {
    let parsed_hash = match PasswordHash::new(hash) {
        Ok(h) => h,
        Err(_) => return false,
    };
    Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_ok()
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenType {
    Access,
    Refresh,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: Uuid,
    pub email: String,
    pub token_type: TokenType,
    pub iat: i64,
    pub exp: i64,
}

#[derive(Debug, Serialize)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
    /// Access token lifetime in seconds.
    pub expires_in: i64,
}

/// Issues and verifies the HS256 token pair.
#[derive(Clone)]
pub struct JwtService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    access_ttl_secs: i64,
    refresh_ttl_secs: i64,
}

impl JwtService {
    pub fn new(secret: &str, access_ttl_secs: i64, refresh_ttl_secs: i64) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            access_ttl_secs,
            refresh_ttl_secs,
        }
    }

    pub fn issue_pair(&self, user: &User) -> Result<TokenPair, AppError> {
        let access_token =
            self.issue(user.id, &user.email, TokenType::Access, self.access_ttl_secs)?;
        let refresh_token = self.issue(
            user.id,
            &user.email,
            TokenType::Refresh,
            self.refresh_ttl_secs,
        )?;
        Ok(TokenPair {
            access_token,
            refresh_token,
            expires_in: self.access_ttl_secs,
        })
    }

    fn issue(
        &self,
        user_id: Uuid,
        email: &str,
        token_type: TokenType,
        ttl_secs: i64,
    ) -> Result<String, AppError> {
        let now = chrono::Utc::now().timestamp();
        let claims = Claims {
            sub: user_id,
            email: email.to_string(),
            token_type,
            iat: now,
            exp: now + ttl_secs,
        };
        encode(&Header::default(), &claims, &self.encoding_key)
            .map_err(|e| anyhow::anyhow!("Failed to sign token: {e}").into())
    }

    /// Verifies signature, expiry, and token type.
    pub fn verify(&self, token: &str, expected: TokenType) -> Result<Claims, AppError> {
        let data = decode::<Claims>(token, &self.decoding_key, &Validation::default())
            .map_err(|e| AppError::Unauthorized(format!("Invalid or expired token: {e}")))?;
        if data.claims.token_type != expected {
            return Err(AppError::Unauthorized("Wrong token type".to_string()));
        }
        Ok(data.claims)
    }
}

/// The authenticated caller, extracted from the `Authorization: Bearer` header.
/// Rejects with 401 on a missing, malformed, expired, or non-access token.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub user_id: Uuid,
    pub email: String,
}

#[async_trait]
impl FromRequestParts<AppState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let header = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|h| h.to_str().ok())
            .ok_or_else(|| AppError::Unauthorized("Missing Authorization header".to_string()))?;

        let token = header
            .strip_prefix("Bearer ")
            .ok_or_else(|| AppError::Unauthorized("Expected a bearer token".to_string()))?;

        let claims = state.jwt.verify(token, TokenType::Access)?;
        Ok(AuthUser {
            user_id: claims.sub,
            email: claims.email,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn test_user() -> User {
        User {
            id: Uuid::new_v4(),
            email: "jordan@example.com".to_string(),
            password_hash: String::new(),
            first_name: Some("Jordan".to_string()),
            last_name: None,
            tier: "free".to_string(),
            resumes_created: 0,
            created_at: Utc::now(),
            last_login_at: None,
        }
    }

    #[test]
    fn test_password_hash_roundtrip() {
        let hash = hash_password("correct horse battery staple").unwrap();
        assert!(verify_password("correct horse battery staple", &hash));
        assert!(!verify_password("wrong password", &hash));
    }

    #[test]
    fn test_verify_rejects_garbage_hash() {
        assert!(!verify_password("anything", "not-a-phc-string"));
    }

    #[test]
    fn test_access_token_roundtrip() {
        let jwt = JwtService::new("test-secret", 900, 604800);
        let user = test_user();
        let pair = jwt.issue_pair(&user).unwrap();

        let claims = jwt.verify(&pair.access_token, TokenType::Access).unwrap();
        assert_eq!(claims.sub, user.id);
        assert_eq!(claims.email, user.email);
    }

    #[test]
    fn test_refresh_token_rejected_as_access_token() {
        let jwt = JwtService::new("test-secret", 900, 604800);
        let pair = jwt.issue_pair(&test_user()).unwrap();

        assert!(jwt.verify(&pair.refresh_token, TokenType::Access).is_err());
        assert!(jwt.verify(&pair.refresh_token, TokenType::Refresh).is_ok());
    }

    #[test]
    fn test_expired_token_rejected() {
        // Negative TTL produces an already-expired token.
        let jwt = JwtService::new("test-secret", -120, 604800);
        let pair = jwt.issue_pair(&test_user()).unwrap();

        assert!(jwt.verify(&pair.access_token, TokenType::Access).is_err());
    }

    #[test]
    fn test_token_signed_with_other_secret_rejected() {
        let jwt = JwtService::new("secret-a", 900, 604800);
        let other = JwtService::new("secret-b", 900, 604800);
        let pair = jwt.issue_pair(&test_user()).unwrap();

        assert!(other.verify(&pair.access_token, TokenType::Access).is_err());
    }
}
