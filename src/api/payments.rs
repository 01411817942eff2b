/// Payment and receipt endpoints
use crate::{
    auth::AdminAuth,
    context::AppContext,
    error::GymResult,
    payments::Payment,
    receipt::render_receipt_html,
};
use axum::{
    extract::{Path, Query, State},
    response::Html,
    routing::get,
    Json, Router,
};
use serde::Deserialize;

const DEFAULT_RECENT: i64 = 20;

pub fn routes() -> Router<AppContext> {
    Router::new()
        .route("/payments", get(recent_payments))
        .route("/payments/:id", get(get_payment))
        .route("/receipts/:payment_id", get(receipt))
}

#[derive(Debug, Deserialize)]
struct RecentQuery {
    limit: Option<i64>,
}

async fn recent_payments(
    State(ctx): State<AppContext>,
    _auth: AdminAuth,
    Query(query): Query<RecentQuery>,
) -> GymResult<Json<Vec<Payment>>> {
    let limit = query.limit.unwrap_or(DEFAULT_RECENT);
    Ok(Json(ctx.payments.recent(limit).await?))
}

async fn get_payment(
    State(ctx): State<AppContext>,
    _auth: AdminAuth,
    Path(id): Path<i64>,
) -> GymResult<Json<Payment>> {
    Ok(Json(ctx.payments.get_payment(id).await?))
}

/// Printable HTML receipt
async fn receipt(
    State(ctx): State<AppContext>,
    _auth: AdminAuth,
    Path(payment_id): Path<i64>,
) -> GymResult<Html<String>> {
    let view = ctx.payments.receipt_view(payment_id).await?;
    Ok(Html(render_receipt_html(&view, &ctx.config.branding)))
}
