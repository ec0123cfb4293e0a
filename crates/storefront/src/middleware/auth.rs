//! Authentication extractors.
//!
//! The logged-in identity lives in the session as a [`RequestContext`].
//! Handlers receive it through these extractors and pass it to services
//! explicitly.

use axum::{
    Json,
    extract::FromRequestParts,
    http::{StatusCode, request::Parts},
    response::{IntoResponse, Response},
};
use serde_json::json;
use tower_sessions::Session;

use crate::models::{RequestContext, session_keys};

/// Extractor that requires a logged-in user.
///
/// # Example
///
/// ```rust,ignore
/// async fn protected_handler(
///     RequireAuth(ctx): RequireAuth,
/// ) -> impl IntoResponse {
///     format!("Hello, {}!", ctx.name)
/// }
/// ```
pub struct RequireAuth(pub RequestContext);

/// Extractor that requires a logged-in admin.
///
/// Non-admins get the same 401 as anonymous callers.
pub struct RequireAdmin(pub RequestContext);

/// Extractor that optionally gets the current user.
pub struct OptionalAuth(pub Option<RequestContext>);

/// Rejection for the auth extractors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AuthRejection;

impl IntoResponse for AuthRejection {
    fn into_response(self) -> Response {
        (
            StatusCode::UNAUTHORIZED,
            Json(json!({ "message": "Unauthorized" })),
        )
            .into_response()
    }
}

async fn current_user(parts: &Parts) -> Option<RequestContext> {
    let session = parts.extensions.get::<Session>()?;
    session
        .get::<RequestContext>(session_keys::CURRENT_USER)
        .await
        .ok()
        .flatten()
}

impl<S> FromRequestParts<S> for RequireAuth
where
    S: Send + Sync,
{
    type Rejection = AuthRejection;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        current_user(parts).await.map(Self).ok_or(AuthRejection)
    }
}

impl<S> FromRequestParts<S> for RequireAdmin
where
    S: Send + Sync,
{
    type Rejection = AuthRejection;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        current_user(parts)
            .await
            .filter(RequestContext::is_admin)
            .map(Self)
            .ok_or(AuthRejection)
    }
}

impl<S> FromRequestParts<S> for OptionalAuth
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(Self(current_user(parts).await))
    }
}

/// Store the logged-in identity in the session.
///
/// The session id is cycled first so a pre-login id cannot be reused.
///
/// # Errors
///
/// Returns an error if the session cannot be modified.
pub async fn set_request_context(
    session: &Session,
    ctx: &RequestContext,
) -> Result<(), tower_sessions::session::Error> {
    session.cycle_id().await?;
    session.insert(session_keys::CURRENT_USER, ctx).await
}

/// Clear the logged-in identity from the session (logout).
///
/// # Errors
///
/// Returns an error if the session cannot be modified.
pub async fn clear_request_context(session: &Session) -> Result<(), tower_sessions::session::Error> {
    session
        .remove::<RequestContext>(session_keys::CURRENT_USER)
        .await?;
    Ok(())
}
