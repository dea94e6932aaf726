use axum::extract::{Query, State};
use axum::Json;
use chrono::{NaiveDate, Utc};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::auth::extractor::AuthUser;
use crate::db;
use crate::db::statistics::{Overview, PaymentSummary};
use crate::error::AppError;
use crate::state::SharedState;

#[derive(Deserialize)]
pub struct PaymentParams {
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
}

pub async fn overview(
    _auth: AuthUser,
    State(state): State<SharedState>,
) -> Result<Json<Overview>, AppError> {
    let today = Utc::now().date_naive();
    Ok(Json(db::statistics::overview(&state.pool, today).await?))
}

pub async fn tasks(
    _auth: AuthUser,
    State(state): State<SharedState>,
) -> Result<Json<Value>, AppError> {
    let items = db::statistics::tasks_by_status(&state.pool).await?;
    let total: i64 = items.iter().map(|row| row.count).sum();
    Ok(Json(json!({ "items": items, "total": total })))
}

pub async fn payments(
    _auth: AuthUser,
    State(state): State<SharedState>,
    Query(params): Query<PaymentParams>,
) -> Result<Json<PaymentSummary>, AppError> {
    if let (Some(start), Some(end)) = (params.start_date, params.end_date) {
        if end < start {
            return Err(AppError::BadRequest(
                "end_date precedes start_date".to_string(),
            ));
        }
    }
    let summary =
        db::statistics::payments_between(&state.pool, params.start_date, params.end_date).await?;
    Ok(Json(summary))
}
