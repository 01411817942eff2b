/// Member endpoints
use crate::{
    auth::AdminAuth,
    context::AppContext,
    error::GymResult,
    members::{
        CreateMemberRequest, HistoryEntry, Member, MemberQuery, MemberUpdateOutcome,
        UpdateMemberRequest,
    },
    payments::Payment,
};
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use serde_json::{json, Value};

pub fn routes() -> Router<AppContext> {
    Router::new()
        .route("/members", get(list_members).post(create_member))
        .route(
            "/members/:id",
            get(get_member).post(update_member).delete(delete_member),
        )
        .route("/members/:id/payments", get(member_payments))
        .route("/members/:id/history", get(member_history))
}

async fn list_members(
    State(ctx): State<AppContext>,
    _auth: AdminAuth,
    Query(query): Query<MemberQuery>,
) -> GymResult<Json<Vec<Member>>> {
    Ok(Json(ctx.members.list_members(query).await?))
}

async fn create_member(
    State(ctx): State<AppContext>,
    auth: AdminAuth,
    Json(req): Json<CreateMemberRequest>,
) -> GymResult<(StatusCode, Json<Member>)> {
    let member = ctx
        .members
        .create_member(req.into(), &auth.request_context())
        .await?;
    Ok((StatusCode::CREATED, Json(member)))
}

async fn get_member(
    State(ctx): State<AppContext>,
    _auth: AdminAuth,
    Path(id): Path<i64>,
) -> GymResult<Json<Member>> {
    Ok(Json(ctx.members.get_member(id).await?))
}

/// Profile edit, plan assignment and optional payment in one transaction
async fn update_member(
    State(ctx): State<AppContext>,
    auth: AdminAuth,
    Path(id): Path<i64>,
    Json(req): Json<UpdateMemberRequest>,
) -> GymResult<Json<MemberUpdateOutcome>> {
    let update = req.into_update()?;
    let outcome = ctx
        .members
        .update_member(id, update, &auth.request_context())
        .await?;
    Ok(Json(outcome))
}

async fn delete_member(
    State(ctx): State<AppContext>,
    auth: AdminAuth,
    Path(id): Path<i64>,
) -> GymResult<Json<Value>> {
    ctx.members.delete_member(id, &auth.request_context()).await?;
    Ok(Json(json!({})))
}

async fn member_payments(
    State(ctx): State<AppContext>,
    _auth: AdminAuth,
    Path(id): Path<i64>,
) -> GymResult<Json<Vec<Payment>>> {
    ctx.members.get_member(id).await?;
    Ok(Json(ctx.payments.list_for_member(id).await?))
}

async fn member_history(
    State(ctx): State<AppContext>,
    _auth: AdminAuth,
    Path(id): Path<i64>,
) -> GymResult<Json<Vec<HistoryEntry>>> {
    ctx.members.get_member(id).await?;
    Ok(Json(ctx.members.membership_history(id).await?))
}
