//! Authentication for Callmatch
//!
//! Tokens are issued by the dashboard's login service; this crate only
//! validates them and turns their claims into the `AuthContext` passed to
//! every core operation.
//!
//! # Examples
//!
//! ## Validating a token
//!
//! ```no_run
//! use callmatch_auth::{JwtService, Claims};
//! use callmatch_core::models::UserRole;
//!
//! let jwt_service = JwtService::new("your-secret-key", 1800);
//! let token = jwt_service.create_token(&Claims::new("nino", UserRole::Operator))?;
//! let ctx = jwt_service.validate_token(&token)?.auth_context();
//! assert_eq!(ctx.username, "nino");
//! # Ok::<(), callmatch_core::error::AppError>(())
//! ```
//!
//! ## Using the extractor in Actix-web
//!
//! ```no_run
//! use actix_web::HttpResponse;
//! use callmatch_auth::AuthenticatedUser;
//!
//! async fn protected_route(user: AuthenticatedUser) -> HttpResponse {
//!     HttpResponse::Ok().json(serde_json::json!({
//!         "username": user.username,
//!         "role": user.role
//!     }))
//! }
//! ```

pub mod claims;
pub mod jwt;
pub mod middleware;

pub use claims::Claims;
pub use jwt::JwtService;
pub use middleware::AuthenticatedUser;
