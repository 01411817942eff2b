/// Membership plan endpoints
use crate::{
    auth::AdminAuth,
    context::AppContext,
    error::GymResult,
    plans::{CreatePlanRequest, MembershipPlan},
};
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;

pub fn routes() -> Router<AppContext> {
    Router::new()
        .route("/plans", get(list_plans).post(create_plan))
        .route("/plans/:id/active", post(set_plan_active))
}

#[derive(Debug, Default, Deserialize)]
struct PlanListQuery {
    #[serde(default)]
    include_inactive: bool,
}

#[derive(Debug, Deserialize)]
struct SetActiveRequest {
    active: bool,
}

async fn list_plans(
    State(ctx): State<AppContext>,
    _auth: AdminAuth,
    Query(query): Query<PlanListQuery>,
) -> GymResult<Json<Vec<MembershipPlan>>> {
    Ok(Json(ctx.plans.list_plans(query.include_inactive).await?))
}

async fn create_plan(
    State(ctx): State<AppContext>,
    auth: AdminAuth,
    Json(req): Json<CreatePlanRequest>,
) -> GymResult<(StatusCode, Json<MembershipPlan>)> {
    let plan = ctx.plans.create_plan(req).await?;

    ctx.activity
        .record(
            auth.admin.id,
            "plan.create",
            &format!("Created plan {} ({} days)", plan.name, plan.duration_days),
        )
        .await?;

    Ok((StatusCode::CREATED, Json(plan)))
}

async fn set_plan_active(
    State(ctx): State<AppContext>,
    auth: AdminAuth,
    Path(id): Path<i64>,
    Json(req): Json<SetActiveRequest>,
) -> GymResult<Json<MembershipPlan>> {
    let plan = ctx.plans.set_plan_active(id, req.active).await?;

    let verb = if plan.is_active { "Enabled" } else { "Retired" };
    ctx.activity
        .record(auth.admin.id, "plan.update", &format!("{} plan {}", verb, plan.name))
        .await?;

    Ok(Json(plan))
}
