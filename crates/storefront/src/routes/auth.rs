//! Authentication route handlers.
//!
//! JSON register/login/logout. The session holds a [`RequestContext`] once
//! logged in.

use axum::{
    Json,
    extract::{State, rejection::JsonRejection},
    http::StatusCode,
    response::IntoResponse,
};
use serde_json::json;
use tower_sessions::Session;

use vitaforge_core::UserRole;

use crate::error::{Result, add_breadcrumb, clear_sentry_user, set_sentry_user};
use crate::middleware::{OptionalAuth, RequireAuth, clear_request_context, set_request_context};
use crate::models::RequestContext;
use crate::services::{AuthService, LoginInput, RegisterInput};
use crate::state::AppState;

/// Create an account. New accounts are always customers.
pub async fn register(
    State(state): State<AppState>,
    payload: std::result::Result<Json<RegisterInput>, JsonRejection>,
) -> Result<impl IntoResponse> {
    let Json(input) = payload?;

    let user = AuthService::new(state.users())
        .register(&input, UserRole::Customer)
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(json!({ "message": "Account created", "user": user })),
    ))
}

/// Log in and store the identity in the session.
pub async fn login(
    State(state): State<AppState>,
    session: Session,
    payload: std::result::Result<Json<LoginInput>, JsonRejection>,
) -> Result<Json<RequestContext>> {
    let Json(input) = payload?;

    let user = AuthService::new(state.users()).login(&input).await?;
    let ctx = RequestContext::from(&user);

    set_request_context(&session, &ctx).await?;
    set_sentry_user(&ctx.user_id, Some(ctx.email.as_str()));
    add_breadcrumb("auth", "Logged in", None);

    Ok(Json(ctx))
}

/// Clear the session identity. Succeeds for anonymous callers too.
pub async fn logout(
    session: Session,
    OptionalAuth(ctx): OptionalAuth,
) -> Result<Json<serde_json::Value>> {
    if let Some(ctx) = ctx {
        tracing::info!(user_id = %ctx.user_id, "Logged out");
    }

    clear_request_context(&session).await?;
    clear_sentry_user();

    Ok(Json(json!({ "success": true })))
}

/// The current request context.
pub async fn me(RequireAuth(ctx): RequireAuth) -> Json<RequestContext> {
    Json(ctx)
}

