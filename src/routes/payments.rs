use axum::extract::{Path, Query, State};
use axum::response::Response;
use axum::Json;
use chrono::NaiveDate;
use serde::Deserialize;
use serde_json::{json, Value};
use uuid::Uuid;

use crate::approval::change::PaymentChange;
use crate::approval::{Change, Mutation, Payload};
use crate::auth::extractor::AuthUser;
use crate::db;
use crate::db::payments::PaymentFilter;
use crate::error::AppError;
use crate::models::{Payment, ResourceType};
use crate::routes::{page, submit_and_load, submit_delete};
use crate::state::SharedState;

#[derive(Deserialize)]
pub struct ListParams {
    pub customer_id: Option<Uuid>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub offset: Option<i64>,
    pub limit: Option<i64>,
}

pub async fn list(
    _auth: AuthUser,
    State(state): State<SharedState>,
    Query(params): Query<ListParams>,
) -> Result<Json<Value>, AppError> {
    let (offset, limit) = page(params.offset, params.limit);
    let filter = PaymentFilter {
        customer_id: params.customer_id,
        start_date: params.start_date,
        end_date: params.end_date,
    };

    let items = db::payments::list(&state.pool, &filter, limit, offset).await?;
    let total = db::payments::count(&state.pool, &filter).await?;
    Ok(Json(json!({ "items": items, "total": total })))
}

pub async fn get(
    _auth: AuthUser,
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Payment>, AppError> {
    Ok(Json(find(&state, id).await?))
}

pub async fn create(
    auth: AuthUser,
    State(state): State<SharedState>,
    Json(body): Json<PaymentChange>,
) -> Result<Response, AppError> {
    body.validate_create().map_err(AppError::BadRequest)?;

    let mut mutation = Mutation::new(Change::Create(Payload::Payment(body.clone())));
    if let (Some(date), Some(amount)) = (body.payment_date, body.amount) {
        mutation = mutation.label(format!("{date} - {amount:.2}"));
    }

    submit_and_load(&state, &auth, mutation, |id| {
        db::payments::find_by_id(&state.pool, id)
    })
    .await
}

pub async fn update(
    auth: AuthUser,
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
    Json(body): Json<PaymentChange>,
) -> Result<Response, AppError> {
    body.validate().map_err(AppError::BadRequest)?;
    let existing = find(&state, id).await?;

    let label = existing.label();
    let mutation = Mutation::new(Change::Update {
        id,
        payload: Payload::Payment(body),
    })
    .before(serde_json::to_value(&existing)?)
    .label(label);

    submit_and_load(&state, &auth, mutation, |id| {
        db::payments::find_by_id(&state.pool, id)
    })
    .await
}

pub async fn delete(
    auth: AuthUser,
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> Result<Response, AppError> {
    let existing = find(&state, id).await?;

    let mutation = Mutation::new(Change::Delete {
        resource_type: ResourceType::Payment,
        id,
    })
    .before(serde_json::to_value(&existing)?)
    .label(existing.label());

    submit_delete(&state, &auth, mutation).await
}

async fn find(state: &SharedState, id: Uuid) -> Result<Payment, AppError> {
    db::payments::find_by_id(&state.pool, id)
        .await?
        .ok_or_else(|| AppError::NotFound("Payment not found".to_string()))
}
