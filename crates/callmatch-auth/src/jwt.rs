//! JWT token validation service
//!
//! Validates session tokens with the jsonwebtoken crate. Token creation is
//! kept for tooling and tests; production tokens come from the login service.

use crate::claims::Claims;
use callmatch_core::error::AppError;
use callmatch_core::models::UserRole;
use chrono::{Duration, Utc};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use tracing::{debug, error, warn};

/// JWT Service for token creation and validation
#[derive(Clone)]
pub struct JwtService {
    /// Default token expiration time in seconds
    expiration_secs: i64,

    encoding_key: EncodingKey,

    decoding_key: DecodingKey,
}

impl JwtService {
    /// Create a new JWT service
    ///
    /// # Examples
    ///
    /// ```
    /// use callmatch_auth::JwtService;
    ///
    /// let jwt_service = JwtService::new("my-secret-key", 1800);
    /// assert_eq!(jwt_service.expiration_secs(), 1800);
    /// ```
    pub fn new(secret: &str, expiration_secs: i64) -> Self {
        Self {
            expiration_secs,
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
        }
    }

    /// Create a JWT token from claims
    ///
    /// # Errors
    ///
    /// Returns `AppError::InvalidToken` if token creation fails
    pub fn create_token(&self, claims: &Claims) -> Result<String, AppError> {
        let mut token_claims = claims.clone();

        if token_claims.exp == 0 {
            let exp = Utc::now() + Duration::seconds(self.expiration_secs);
            token_claims.exp = exp.timestamp();
        }

        debug!(
            username = %token_claims.sub,
            role = ?token_claims.role,
            exp = %token_claims.exp,
            "Creating JWT token"
        );

        encode(&Header::default(), &token_claims, &self.encoding_key).map_err(|e| {
            error!(error = %e, "Failed to create JWT token");
            AppError::InvalidToken(format!("Token creation failed: {}", e))
        })
    }

    /// Create a token for a user with username and role
    pub fn create_token_for_user(
        &self,
        username: &str,
        role: UserRole,
    ) -> Result<String, AppError> {
        self.create_token(&Claims::new(username, role))
    }

    /// Validate a JWT token and extract claims
    ///
    /// # Errors
    ///
    /// Returns:
    /// - `AppError::TokenExpired` if the token has expired
    /// - `AppError::InvalidToken` if the token is invalid
    pub fn validate_token(&self, token: &str) -> Result<Claims, AppError> {
        let validation = Validation::default();

        let token_data = decode::<Claims>(token, &self.decoding_key, &validation).map_err(|e| {
            if matches!(e.kind(), ErrorKind::ExpiredSignature) {
                warn!("Token expired");
                return AppError::TokenExpired;
            }

            warn!(error = %e, "Invalid token");
            AppError::InvalidToken(format!("Token validation failed: {}", e))
        })?;

        let claims = token_data.claims;

        // Validation allows clock leeway
        if claims.is_expired() {
            warn!(username = %claims.sub, "Token expired (manual check)");
            return Err(AppError::TokenExpired);
        }

        debug!(
            username = %claims.sub,
            role = ?claims.role,
            "Token validated successfully"
        );

        Ok(claims)
    }

    pub fn expiration_secs(&self) -> i64 {
        self.expiration_secs
    }
}

impl std::fmt::Debug for JwtService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JwtService")
            .field("expiration_secs", &self.expiration_secs)
            .field("secret", &"[REDACTED]")
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TEST_SECRET: &str = "test-secret-key-for-jwt-testing-12345";

    #[test]
    fn test_create_and_validate_token() {
        let jwt_service = JwtService::new(TEST_SECRET, 3600);
        let claims = Claims::new("testuser", UserRole::Operator).with_department("sales");

        let token = jwt_service.create_token(&claims).unwrap();
        assert!(!token.is_empty());

        let decoded = jwt_service.validate_token(&token).unwrap();
        assert_eq!(decoded.sub, "testuser");
        assert_eq!(decoded.role, UserRole::Operator);
        assert_eq!(decoded.department.as_deref(), Some("sales"));
    }

    #[test]
    fn test_expired_token() {
        let jwt_service = JwtService::new(TEST_SECRET, 1);

        let claims = Claims::with_expiration("user", UserRole::Operator, -120);
        let token = jwt_service.create_token(&claims).unwrap();

        let result = jwt_service.validate_token(&token);
        assert!(matches!(result, Err(AppError::TokenExpired)));
    }

    #[test]
    fn test_invalid_token() {
        let jwt_service = JwtService::new(TEST_SECRET, 3600);

        let result = jwt_service.validate_token("invalid.token.here");
        assert!(matches!(result, Err(AppError::InvalidToken(_))));
    }

    #[test]
    fn test_token_with_different_secret() {
        let jwt_service1 = JwtService::new("secret1", 3600);
        let jwt_service2 = JwtService::new("secret2", 3600);

        let token = jwt_service1
            .create_token_for_user("user", UserRole::Viewer)
            .unwrap();

        let result = jwt_service2.validate_token(&token);
        assert!(matches!(result, Err(AppError::InvalidToken(_))));
    }

    #[test]
    fn test_token_expiration_setting() {
        let jwt_service = JwtService::new(TEST_SECRET, 7200);

        let token = jwt_service
            .create_token_for_user("user", UserRole::Operator)
            .unwrap();
        let decoded = jwt_service.validate_token(&token).unwrap();

        let now = Utc::now().timestamp();
        assert!(decoded.exp > now);
        assert!(decoded.exp <= now + 7200);
    }

    #[test]
    fn test_debug_impl_hides_secret() {
        let jwt_service = JwtService::new(TEST_SECRET, 3600);
        let debug_str = format!("{:?}", jwt_service);

        assert!(debug_str.contains("JwtService"));
        assert!(debug_str.contains("[REDACTED]"));
        assert!(!debug_str.contains(TEST_SECRET));
    }
}
