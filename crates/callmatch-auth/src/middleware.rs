//! Actix-web request extractor for authenticated users

use crate::jwt::JwtService;
use crate::Claims;
use actix_web::{dev::Payload, web, FromRequest, HttpRequest};
use callmatch_core::error::AppError;
use callmatch_core::models::{AuthContext, UserRole};
use futures::future::{ready, Ready};
use std::sync::Arc;
use tracing::{debug, warn};

/// Token from the `Authorization: Bearer` header, else the `token` cookie
fn extract_token_from_request(req: &HttpRequest) -> Option<String> {
    if let Some(auth_header) = req.headers().get("Authorization") {
        if let Ok(auth_str) = auth_header.to_str() {
            if let Some(token) = auth_str.strip_prefix("Bearer ") {
                return Some(token.trim().to_string());
            }
        }
    }

    req.cookie("token").map(|c| c.value().to_string())
}

/// Authenticated user extractor
///
/// Validates the request's token against the `JwtService` registered as app
/// data. Rejections render as the usual JSON error body with status 401.
///
/// # Examples
///
/// ```no_run
/// use actix_web::HttpResponse;
/// use callmatch_auth::middleware::AuthenticatedUser;
///
/// async fn protected_handler(user: AuthenticatedUser) -> HttpResponse {
///     let ctx = user.context();
///     HttpResponse::Ok().json(serde_json::json!({ "username": ctx.username }))
/// }
/// ```
#[derive(Debug, Clone)]
pub struct AuthenticatedUser {
    pub username: String,

    pub role: UserRole,

    /// Full claims from the JWT token
    pub claims: Claims,
}

impl AuthenticatedUser {
    /// Identity handed to core operations
    pub fn context(&self) -> AuthContext {
        self.claims.auth_context()
    }
}

impl FromRequest for AuthenticatedUser {
    type Error = actix_web::Error;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        let jwt_service = match req.app_data::<web::Data<Arc<JwtService>>>() {
            Some(service) => service.get_ref().clone(),
            None => {
                warn!("JwtService not found in app data");
                return ready(Err(AppError::Unauthorized(
                    "Authentication service not configured".to_string(),
                )
                .into()));
            }
        };

        let Some(token) = extract_token_from_request(req) else {
            debug!("No authentication token found in request");
            return ready(Err(AppError::Unauthorized(
                "No authentication token provided".to_string(),
            )
            .into()));
        };

        match jwt_service.validate_token(&token) {
            Ok(claims) => {
                debug!(
                    username = %claims.sub,
                    role = ?claims.role,
                    "User authenticated successfully"
                );

                ready(Ok(AuthenticatedUser {
                    username: claims.sub.clone(),
                    role: claims.role,
                    claims,
                }))
            }
            Err(e) => {
                warn!(error = %e, "Token validation failed");
                ready(Err(e.into()))
            }
        }
    }
}
