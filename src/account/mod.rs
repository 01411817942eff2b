/// Admin accounts
///
/// Handles admin login, bearer sessions and the password reset flow.

mod manager;
pub mod password;

pub use manager::AccountManager;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

/// Staff account allowed to use the admin backend
#[derive(Debug, Clone, PartialEq, Serialize, sqlx::FromRow)]
pub struct Admin {
    pub id: i64,
    pub username: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub email: String,
    pub full_name: String,
    pub created_at: DateTime<Utc>,
    pub last_login_at: Option<DateTime<Utc>>,
}

/// Bearer session issued at login
#[derive(Debug, Clone, PartialEq, Serialize, sqlx::FromRow)]
pub struct AdminSession {
    pub token: String,
    pub admin_id: i64,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

/// Input for creating an admin
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct NewAdmin {
    #[validate(length(min = 3, max = 50))]
    pub username: String,
    #[validate(length(min = 8))]
    pub password: String,
    #[validate(email)]
    pub email: String,
    #[validate(length(min = 1, max = 100))]
    pub full_name: String,
}

/// Login request
#[derive(Debug, Clone, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

/// Login response
#[derive(Debug, Clone, Serialize)]
pub struct LoginResponse {
    pub token: String,
    pub expires_at: DateTime<Utc>,
    pub admin: Admin,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ForgotPasswordRequest {
    pub email: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ResetPasswordRequest {
    pub password: String,
    pub confirm_password: String,
}

/// Reset token from the emailed link
#[derive(Debug, Clone, Deserialize)]
pub struct ResetTokenQuery {
    pub token: String,
}

/// Outcome of a reset request, for handing to the mailer
#[derive(Debug, Clone)]
pub struct IssuedResetToken {
    pub token: String,
    pub email: String,
    pub full_name: String,
    pub expires_at: DateTime<Utc>,
}
