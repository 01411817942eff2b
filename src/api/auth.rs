/// Admin login and password reset endpoints
use crate::{
    account::{
        Admin, ForgotPasswordRequest, LoginRequest, LoginResponse, ResetPasswordRequest,
        ResetTokenQuery,
    },
    auth::AdminAuth,
    context::AppContext,
    error::{GymError, GymResult},
};
use axum::{
    extract::{Query, State},
    routing::{get, post},
    Json, Router,
};
use serde_json::{json, Value};
use std::sync::Arc;

const RESET_ACKNOWLEDGEMENT: &str =
    "If an account exists for that email, a password reset link has been sent.";

/// Build auth routes
pub fn routes() -> Router<AppContext> {
    Router::new()
        .route("/auth/login", post(login))
        .route("/auth/logout", post(logout))
        .route("/auth/me", get(me))
        .route("/auth/forgot-password", post(forgot_password))
        .route("/auth/reset-password", get(check_reset_token).post(reset_password))
}

async fn login(
    State(ctx): State<AppContext>,
    Json(req): Json<LoginRequest>,
) -> GymResult<Json<LoginResponse>> {
    if req.username.trim().is_empty() || req.password.is_empty() {
        return Err(GymError::Validation(
            "Username and password are required".to_string(),
        ));
    }

    let response = ctx.accounts.login(&req.username, &req.password).await?;
    Ok(Json(response))
}

async fn logout(State(ctx): State<AppContext>, auth: AdminAuth) -> GymResult<Json<Value>> {
    ctx.accounts.logout(&auth.token).await?;
    ctx.activity
        .record(auth.admin.id, "auth.logout", "Logged out")
        .await?;
    Ok(Json(json!({})))
}

async fn me(auth: AdminAuth) -> Json<Admin> {
    Json(auth.admin)
}

/// Always answers the same way so callers cannot probe for admin emails
async fn forgot_password(
    State(ctx): State<AppContext>,
    Json(req): Json<ForgotPasswordRequest>,
) -> GymResult<Json<Value>> {
    if req.email.trim().is_empty() {
        return Err(GymError::Validation("Email is required".to_string()));
    }

    if let Some(issued) = ctx.accounts.request_reset(&req.email).await? {
        // Delivery stays off the response path so its latency cannot mark the email as known
        let mailer = Arc::clone(&ctx.mailer);
        let gym_name = ctx.config.branding.gym_name.clone();
        let base_url = ctx.base_url();
        tokio::spawn(async move {
            if let Err(e) = mailer
                .send_password_reset_email(&issued, &gym_name, &base_url)
                .await
            {
                tracing::error!("Failed to send password reset email: {}", e);
            }
        });
    }

    Ok(Json(json!({ "message": RESET_ACKNOWLEDGEMENT })))
}

async fn check_reset_token(
    State(ctx): State<AppContext>,
    Query(query): Query<ResetTokenQuery>,
) -> GymResult<Json<Value>> {
    let valid = match ctx.accounts.validate_reset_token(&query.token).await {
        Ok(_) => true,
        Err(GymError::NotFound(_)) => false,
        Err(e) => return Err(e),
    };

    Ok(Json(json!({ "valid": valid })))
}

async fn reset_password(
    State(ctx): State<AppContext>,
    Query(query): Query<ResetTokenQuery>,
    Json(req): Json<ResetPasswordRequest>,
) -> GymResult<Json<Value>> {
    ctx.accounts
        .consume_reset(&query.token, &req.password, &req.confirm_password)
        .await?;

    Ok(Json(json!({})))
}
