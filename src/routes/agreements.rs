use axum::extract::{Path, Query, State};
use axum::response::Response;
use axum::Json;
use serde::Deserialize;
use serde_json::{json, Value};
use uuid::Uuid;

use crate::approval::change::AgreementChange;
use crate::approval::{Change, Mutation, Payload};
use crate::auth::extractor::AuthUser;
use crate::db;
use crate::db::agreements::AgreementFilter;
use crate::error::AppError;
use crate::models::{Agreement, AgreementStatus, ResourceType};
use crate::routes::{page, submit_and_load, submit_delete};
use crate::state::SharedState;

#[derive(Deserialize)]
pub struct ListParams {
    pub keyword: Option<String>,
    pub status: Option<AgreementStatus>,
    pub customer_id: Option<Uuid>,
    pub offset: Option<i64>,
    pub limit: Option<i64>,
}

pub async fn list(
    _auth: AuthUser,
    State(state): State<SharedState>,
    Query(params): Query<ListParams>,
) -> Result<Json<Value>, AppError> {
    let (offset, limit) = page(params.offset, params.limit);
    let filter = AgreementFilter {
        keyword: params.keyword.as_deref().filter(|k| !k.is_empty()),
        status: params.status,
        customer_id: params.customer_id,
    };

    let items = db::agreements::list(&state.pool, &filter, limit, offset).await?;
    let total = db::agreements::count(&state.pool, &filter).await?;
    Ok(Json(json!({ "items": items, "total": total })))
}

pub async fn get(
    _auth: AuthUser,
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Agreement>, AppError> {
    Ok(Json(find(&state, id).await?))
}

pub async fn create(
    auth: AuthUser,
    State(state): State<SharedState>,
    Json(body): Json<AgreementChange>,
) -> Result<Response, AppError> {
    body.validate_create().map_err(AppError::BadRequest)?;

    // Generated numbers are only known once the insert runs.
    let mut mutation = Mutation::new(Change::Create(Payload::Agreement(body.clone())));
    if let Some(number) = body.agreement_number.filter(|n| !n.trim().is_empty()) {
        mutation = mutation.label(number);
    }

    submit_and_load(&state, &auth, mutation, |id| {
        db::agreements::find_by_id(&state.pool, id)
    })
    .await
}

pub async fn update(
    auth: AuthUser,
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
    Json(body): Json<AgreementChange>,
) -> Result<Response, AppError> {
    body.validate().map_err(AppError::BadRequest)?;
    let existing = find(&state, id).await?;

    let label = body
        .agreement_number
        .clone()
        .filter(|n| !n.trim().is_empty())
        .unwrap_or_else(|| existing.agreement_number.clone());
    let mutation = Mutation::new(Change::Update {
        id,
        payload: Payload::Agreement(body),
    })
    .before(serde_json::to_value(&existing)?)
    .label(label);

    submit_and_load(&state, &auth, mutation, |id| {
        db::agreements::find_by_id(&state.pool, id)
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
        resource_type: ResourceType::Agreement,
        id,
    })
    .before(serde_json::to_value(&existing)?)
    .label(existing.agreement_number);

    submit_delete(&state, &auth, mutation).await
}

async fn find(state: &SharedState, id: Uuid) -> Result<Agreement, AppError> {
    db::agreements::find_by_id(&state.pool, id)
        .await?
        .ok_or_else(|| AppError::NotFound("Agreement not found".to_string()))
}
