//! Actor identity resolution
//!
//! Handles:
//! - Access token verification
//! - Authentication middleware and extractors

mod middleware;
pub mod token;

pub use middleware::{ACCESS_TOKEN_COOKIE, CurrentUser, MaybeUser, require_auth};
pub use token::{AccessClaims, create_access_token, verify_access_token};
