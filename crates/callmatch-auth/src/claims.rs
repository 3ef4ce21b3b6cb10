//! JWT Claims structure
//!
//! Defines the claims carried by dashboard session tokens.

use callmatch_core::models::{AuthContext, UserRole};
use chrono::{Duration, Utc};
use serde::{Deserialize, Serialize};

/// JWT Claims
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Claims {
    /// Subject (username)
    pub sub: String,

    /// User role
    pub role: UserRole,

    /// Department the user belongs to, if any
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub department: Option<String>,

    /// Issued at (Unix timestamp)
    pub iat: i64,

    /// Expiration time (Unix timestamp)
    pub exp: i64,
}

impl Claims {
    /// Create new claims with the specified username and role
    ///
    /// # Examples
    ///
    /// ```
    /// use callmatch_auth::Claims;
    /// use callmatch_core::models::UserRole;
    ///
    /// let claims = Claims::new("nino", UserRole::Operator);
    /// assert_eq!(claims.sub, "nino");
    /// assert_eq!(claims.exp, 0);
    /// ```
    pub fn new(username: &str, role: UserRole) -> Self {
        Self {
            sub: username.to_string(),
            role,
            department: None,
            iat: Utc::now().timestamp(),
            exp: 0, // Will be set by JwtService
        }
    }

    /// Create new claims expiring `expires_in_secs` from now
    pub fn with_expiration(username: &str, role: UserRole, expires_in_secs: i64) -> Self {
        let now = Utc::now();
        Self {
            exp: (now + Duration::seconds(expires_in_secs)).timestamp(),
            iat: now.timestamp(),
            ..Self::new(username, role)
        }
    }

    pub fn with_department(mut self, department: &str) -> Self {
        self.department = Some(department.to_string());
        self
    }

    pub fn is_expired(&self) -> bool {
        self.exp <= Utc::now().timestamp()
    }

    pub fn username(&self) -> &str {
        &self.sub
    }

    /// Identity handed to core operations
    pub fn auth_context(&self) -> AuthContext {
        AuthContext::new(self.sub.clone(), self.role, self.department.clone())
    }
}
