use axum::extract::{Path, Query, State};
use axum::response::Response;
use axum::Json;
use serde::Deserialize;
use serde_json::{json, Value};
use uuid::Uuid;

use crate::approval::change::CustomerChange;
use crate::approval::{Change, Mutation, Payload};
use crate::auth::extractor::AuthUser;
use crate::db;
use crate::db::payments::PaymentFilter;
use crate::db::tasks::TaskFilter;
use crate::error::AppError;
use crate::models::customer::{CREDIT_RATINGS, CUSTOMER_TYPES};
use crate::models::{Customer, ResourceType};
use crate::routes::{page, submit_and_load, submit_delete};
use crate::state::SharedState;

#[derive(Deserialize)]
pub struct ListParams {
    pub keyword: Option<String>,
    pub offset: Option<i64>,
    pub limit: Option<i64>,
}

pub async fn list(
    _auth: AuthUser,
    State(state): State<SharedState>,
    Query(params): Query<ListParams>,
) -> Result<Json<Value>, AppError> {
    let (offset, limit) = page(params.offset, params.limit);
    let keyword = params.keyword.as_deref().filter(|k| !k.is_empty());

    let items = db::customers::list(&state.pool, keyword, limit, offset).await?;
    let total = db::customers::count(&state.pool, keyword).await?;
    Ok(Json(json!({ "items": items, "total": total })))
}

pub async fn get(
    _auth: AuthUser,
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Customer>, AppError> {
    Ok(Json(find(&state, id).await?))
}

pub async fn create(
    auth: AuthUser,
    State(state): State<SharedState>,
    Json(body): Json<CustomerChange>,
) -> Result<Response, AppError> {
    body.validate_create().map_err(AppError::BadRequest)?;

    let mut mutation = Mutation::new(Change::Create(Payload::Customer(body.clone())));
    if let Some(name) = body.name {
        mutation = mutation.label(name);
    }

    submit_and_load(&state, &auth, mutation, |id| {
        db::customers::find_by_id(&state.pool, id)
    })
    .await
}

pub async fn update(
    auth: AuthUser,
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
    Json(body): Json<CustomerChange>,
) -> Result<Response, AppError> {
    body.validate().map_err(AppError::BadRequest)?;
    let existing = find(&state, id).await?;

    let label = body.name.clone().unwrap_or_else(|| existing.name.clone());
    let mutation = Mutation::new(Change::Update {
        id,
        payload: Payload::Customer(body),
    })
    .before(serde_json::to_value(&existing)?)
    .label(label);

    submit_and_load(&state, &auth, mutation, |id| {
        db::customers::find_by_id(&state.pool, id)
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
        resource_type: ResourceType::Customer,
        id,
    })
    .before(serde_json::to_value(&existing)?)
    .label(existing.name);

    submit_delete(&state, &auth, mutation).await
}

pub async fn types(_auth: AuthUser) -> Json<Value> {
    Json(json!({ "items": CUSTOMER_TYPES }))
}

pub async fn credit_ratings(_auth: AuthUser) -> Json<Value> {
    Json(json!({ "items": CREDIT_RATINGS }))
}

pub async fn tasks(
    _auth: AuthUser,
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Value>, AppError> {
    find(&state, id).await?;
    let filter = TaskFilter {
        keyword: None,
        status: None,
        customer_id: Some(id),
    };
    let total = db::tasks::count(&state.pool, &filter).await?;
    let items = db::tasks::list(&state.pool, &filter, total.max(1), 0).await?;
    Ok(Json(json!({ "items": items, "total": total })))
}

pub async fn payments(
    _auth: AuthUser,
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Value>, AppError> {
    find(&state, id).await?;
    let filter = PaymentFilter {
        customer_id: Some(id),
        start_date: None,
        end_date: None,
    };
    let total = db::payments::count(&state.pool, &filter).await?;
    let items = db::payments::list(&state.pool, &filter, total.max(1), 0).await?;
    Ok(Json(json!({ "items": items, "total": total })))
}

async fn find(state: &SharedState, id: Uuid) -> Result<Customer, AppError> {
    db::customers::find_by_id(&state.pool, id)
        .await?
        .ok_or_else(|| AppError::NotFound("Customer not found".to_string()))
}
