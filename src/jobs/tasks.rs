/// Background task implementations
use crate::{context::AppContext, error::GymResult};
use chrono::Utc;

/// Cleanup expired sessions and spent reset tokens
pub async fn cleanup_expired_sessions(ctx: &AppContext) -> GymResult<u64> {
    let (sessions_deleted, reset_tokens_deleted) = ctx.accounts.cleanup_expired().await?;
    Ok(sessions_deleted + reset_tokens_deleted)
}

/// Mark members whose membership has ended as inactive
pub async fn expire_memberships(ctx: &AppContext) -> GymResult<u64> {
    let now = Utc::now();
    ctx.members.expire_memberships(now.date_naive(), now).await
}
