use axum::extract::{Path, Query, State};
use axum::response::Response;
use axum::Json;
use serde::Deserialize;
use serde_json::{json, Value};
use uuid::Uuid;

use crate::approval::change::PersonChange;
use crate::approval::{Change, Mutation, Payload};
use crate::auth::extractor::AuthUser;
use crate::db;
use crate::error::AppError;
use crate::models::{Person, ResourceType};
use crate::routes::{page, submit_and_load, submit_delete};
use crate::state::SharedState;

#[derive(Deserialize)]
pub struct ListParams {
    pub keyword: Option<String>,
    pub is_service_person: Option<bool>,
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

    let items =
        db::people::list(&state.pool, keyword, params.is_service_person, limit, offset).await?;
    let total = db::people::count(&state.pool, keyword, params.is_service_person).await?;
    Ok(Json(json!({ "items": items, "total": total })))
}

pub async fn get(
    _auth: AuthUser,
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Person>, AppError> {
    Ok(Json(find(&state, id).await?))
}

pub async fn create(
    auth: AuthUser,
    State(state): State<SharedState>,
    Json(body): Json<PersonChange>,
) -> Result<Response, AppError> {
    body.validate_create().map_err(AppError::BadRequest)?;

    let mut mutation = Mutation::new(Change::Create(Payload::Person(body.clone())));
    if let Some(name) = body.name {
        mutation = mutation.label(name);
    }

    submit_and_load(&state, &auth, mutation, |id| {
        db::people::find_by_id(&state.pool, id)
    })
    .await
}

pub async fn update(
    auth: AuthUser,
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
    Json(body): Json<PersonChange>,
) -> Result<Response, AppError> {
    body.validate().map_err(AppError::BadRequest)?;
    let existing = find(&state, id).await?;

    let label = body.name.clone().unwrap_or_else(|| existing.name.clone());
    let mutation = Mutation::new(Change::Update {
        id,
        payload: Payload::Person(body),
    })
    .before(serde_json::to_value(&existing)?)
    .label(label);

    submit_and_load(&state, &auth, mutation, |id| {
        db::people::find_by_id(&state.pool, id)
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
        resource_type: ResourceType::Person,
        id,
    })
    .before(serde_json::to_value(&existing)?)
    .label(existing.name);

    submit_delete(&state, &auth, mutation).await
}

/// Customers the person represents, invests in, or services.
pub async fn customers(
    _auth: AuthUser,
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Value>, AppError> {
    let person = find(&state, id).await?;

    let representative = db::customers::list_by_representative(&state.pool, person.id).await?;
    let investor = db::customers::list_by_ids(&state.pool, &person.investor_customer_ids).await?;
    let service = db::customers::list_by_ids(&state.pool, &person.service_customer_ids).await?;

    Ok(Json(json!({
        "representative": representative,
        "investor": investor,
        "service": service,
    })))
}

async fn find(state: &SharedState, id: Uuid) -> Result<Person, AppError> {
    db::people::find_by_id(&state.pool, id)
        .await?
        .ok_or_else(|| AppError::NotFound("Person not found".to_string()))
}
