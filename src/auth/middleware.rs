//! Authentication middleware
//!
//! Resolves the acting identity from a bearer token or the
//! `accessToken` cookie and protects routes that require it.

use axum::{
    async_trait,
    extract::{FromRef, FromRequestParts, State},
    http::{HeaderMap, Request, request::Parts},
    middleware::Next,
    response::Response,
};
use axum_extra::extract::CookieJar;

use super::token::{AccessClaims, verify_access_token};
use crate::AppState;
use crate::error::AppError;

/// Cookie carrying the access token for browser clients
pub const ACCESS_TOKEN_COOKIE: &str = "accessToken";

fn extract_token_from_headers(headers: &HeaderMap) -> Option<String> {
    headers
        .get("Authorization")
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .map(ToOwned::to_owned)
        .or_else(|| {
            let jar = CookieJar::from_headers(headers);
            jar.get(ACCESS_TOKEN_COOKIE)
                .map(|cookie| cookie.value().to_owned())
        })
}

fn authenticate_token(token: &str, state: &AppState) -> Result<AccessClaims, AppError> {
    verify_access_token(token, &state.config.auth.token_secret)
}

/// Middleware to require authentication
///
/// Verifies the access token and adds the claims to request extensions.
///
/// # Usage
/// ```ignore
/// let protected_routes = Router::new()
///     .route("/api/v1/...", ...)
///     .route_layer(middleware::from_fn_with_state(state, require_auth));
/// ```
pub async fn require_auth(
    State(state): State<AppState>,
    mut request: Request<axum::body::Body>,
    next: Next,
) -> Result<Response, AppError> {
    let token = extract_token_from_headers(request.headers()).ok_or(AppError::Unauthorized)?;
    let claims = authenticate_token(&token, &state)?;

    tracing::debug!(user_id = %claims.user_id, "Request authenticated");
    request.extensions_mut().insert(claims);

    Ok(next.run(request).await)
}

/// Extractor for the authenticated actor
///
/// # Usage
/// ```ignore
/// async fn handler(CurrentUser(claims): CurrentUser) -> impl IntoResponse {
///     format!("Hello, {}", claims.username)
/// }
/// ```
#[derive(Debug, Clone)]
pub struct CurrentUser(pub AccessClaims);

#[async_trait]
impl<S> FromRequestParts<S> for CurrentUser
where
    AppState: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        if let Some(claims) = parts.extensions.get::<AccessClaims>().cloned() {
            return Ok(CurrentUser(claims));
        }

        let state = AppState::from_ref(state);
        let token = extract_token_from_headers(&parts.headers).ok_or(AppError::Unauthorized)?;
        let claims = authenticate_token(&token, &state)?;
        parts.extensions.insert(claims.clone());

        Ok(CurrentUser(claims))
    }
}

/// Optional actor extractor
///
/// Anonymous viewers get `None`; an invalid token is treated as absent.
#[derive(Debug, Clone)]
pub struct MaybeUser(pub Option<AccessClaims>);

#[async_trait]
impl<S> FromRequestParts<S> for MaybeUser
where
    AppState: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        if let Some(claims) = parts.extensions.get::<AccessClaims>().cloned() {
            return Ok(MaybeUser(Some(claims)));
        }

        let app_state = AppState::from_ref(state);
        let claims = extract_token_from_headers(&parts.headers)
            .and_then(|token| authenticate_token(&token, &app_state).ok());

        if let Some(claims) = &claims {
            parts.extensions.insert(claims.clone());
        }

        Ok(MaybeUser(claims))
    }
}
