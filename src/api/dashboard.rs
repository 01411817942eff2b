/// Dashboard and activity log endpoints
use crate::{
    activity::ActivityEntry,
    auth::AdminAuth,
    context::AppContext,
    dashboard::DashboardStats,
    error::GymResult,
};
use axum::{
    extract::{Query, State},
    routing::get,
    Json, Router,
};
use chrono::Utc;
use serde::Deserialize;

const DEFAULT_ACTIVITY_LIMIT: i64 = 50;

pub fn routes() -> Router<AppContext> {
    Router::new()
        .route("/dashboard", get(dashboard))
        .route("/activity", get(activity))
}

#[derive(Debug, Deserialize)]
struct ActivityQuery {
    limit: Option<i64>,
}

async fn dashboard(
    State(ctx): State<AppContext>,
    _auth: AdminAuth,
) -> GymResult<Json<DashboardStats>> {
    Ok(Json(ctx.dashboard.stats(Utc::now().date_naive()).await?))
}

async fn activity(
    State(ctx): State<AppContext>,
    _auth: AdminAuth,
    Query(query): Query<ActivityQuery>,
) -> GymResult<Json<Vec<ActivityEntry>>> {
    let limit = query.limit.unwrap_or(DEFAULT_ACTIVITY_LIMIT);
    Ok(Json(ctx.activity.recent(limit).await?))
}
