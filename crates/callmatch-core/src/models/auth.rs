//! Request-scoped authorization context
//!
//! Every core operation receives the caller's identity explicitly instead of
//! reading role or department flags from ambient state.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::AppError;
use crate::AppResult;

/// User role enumeration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    /// Read-only access to contacts and call logs
    #[default]
    Viewer,
    /// Uploads batches and runs reconciliation
    Operator,
    /// Full access
    Admin,
}

impl fmt::Display for UserRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UserRole::Viewer => write!(f, "viewer"),
            UserRole::Operator => write!(f, "operator"),
            UserRole::Admin => write!(f, "admin"),
        }
    }
}

impl UserRole {
    /// Parse from string (case-insensitive)
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "viewer" => Some(UserRole::Viewer),
            "operator" => Some(UserRole::Operator),
            "admin" => Some(UserRole::Admin),
            _ => None,
        }
    }
}

/// Operations guarded by the authorization context
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Permission {
    ViewContacts,
    UploadContacts,
    Reconcile,
    ViewCallLog,
}

/// Identity of the user a request is executed for
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthContext {
    pub username: String,
    pub role: UserRole,
    pub department: Option<String>,
}

impl AuthContext {
    pub fn new(username: impl Into<String>, role: UserRole, department: Option<String>) -> Self {
        Self {
            username: username.into(),
            role,
            department,
        }
    }

    pub fn allows(&self, permission: Permission) -> bool {
        match permission {
            Permission::ViewContacts | Permission::ViewCallLog => true,
            Permission::UploadContacts | Permission::Reconcile => {
                matches!(self.role, UserRole::Operator | UserRole::Admin)
            }
        }
    }

    /// Fail with `Forbidden` unless `permission` is granted
    pub fn require(&self, permission: Permission) -> AppResult<()> {
        if self.allows(permission) {
            Ok(())
        } else {
            tracing::warn!(
                username = %self.username,
                role = %self.role,
                ?permission,
                "Permission denied"
            );
            Err(AppError::Forbidden)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_parse() {
        assert_eq!(UserRole::parse("ADMIN"), Some(UserRole::Admin));
        assert_eq!(UserRole::parse("operator"), Some(UserRole::Operator));
        assert_eq!(UserRole::parse("root"), None);
    }

    #[test]
    fn test_viewer_cannot_reconcile() {
        let ctx = AuthContext::new("eka", UserRole::Viewer, Some("sales".to_string()));
        assert!(ctx.allows(Permission::ViewContacts));
        assert!(matches!(
            ctx.require(Permission::Reconcile),
            Err(AppError::Forbidden)
        ));
    }

    #[test]
    fn test_operator_can_upload_and_reconcile() {
        let ctx = AuthContext::new("levan", UserRole::Operator, None);
        assert!(ctx.require(Permission::UploadContacts).is_ok());
        assert!(ctx.require(Permission::Reconcile).is_ok());
    }
}
