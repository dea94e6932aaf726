use axum::extract::{Path, Query, State};
use axum::response::Response;
use axum::Json;
use serde::Deserialize;
use serde_json::{json, Value};
use uuid::Uuid;

use crate::approval::change::TaskChange;
use crate::approval::{Change, Mutation, Payload};
use crate::auth::extractor::AuthUser;
use crate::db;
use crate::db::tasks::TaskFilter;
use crate::error::AppError;
use crate::models::{ResourceType, Task, TaskStatus};
use crate::routes::{page, submit_and_load, submit_delete};
use crate::state::SharedState;

#[derive(Deserialize)]
pub struct ListParams {
    pub keyword: Option<String>,
    pub status: Option<TaskStatus>,
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
    let filter = TaskFilter {
        keyword: params.keyword.as_deref().filter(|k| !k.is_empty()),
        status: params.status,
        customer_id: params.customer_id,
    };

    let items = db::tasks::list(&state.pool, &filter, limit, offset).await?;
    let total = db::tasks::count(&state.pool, &filter).await?;
    Ok(Json(json!({ "items": items, "total": total })))
}

pub async fn get(
    _auth: AuthUser,
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Task>, AppError> {
    Ok(Json(find(&state, id).await?))
}

pub async fn create(
    auth: AuthUser,
    State(state): State<SharedState>,
    Json(body): Json<TaskChange>,
) -> Result<Response, AppError> {
    body.validate_create().map_err(AppError::BadRequest)?;

    let mut mutation = Mutation::new(Change::Create(Payload::Task(body.clone())));
    if let Some(title) = body.title {
        mutation = mutation.label(title);
    }

    submit_and_load(&state, &auth, mutation, |id| {
        db::tasks::find_by_id(&state.pool, id)
    })
    .await
}

pub async fn update(
    auth: AuthUser,
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
    Json(body): Json<TaskChange>,
) -> Result<Response, AppError> {
    body.validate().map_err(AppError::BadRequest)?;
    let existing = find(&state, id).await?;

    let label = body.title.clone().unwrap_or_else(|| existing.title.clone());
    let mutation = Mutation::new(Change::Update {
        id,
        payload: Payload::Task(body),
    })
    .before(serde_json::to_value(&existing)?)
    .label(label);

    submit_and_load(&state, &auth, mutation, |id| {
        db::tasks::find_by_id(&state.pool, id)
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
        resource_type: ResourceType::Task,
        id,
    })
    .before(serde_json::to_value(&existing)?)
    .label(existing.title);

    submit_delete(&state, &auth, mutation).await
}

async fn find(state: &SharedState, id: Uuid) -> Result<Task, AppError> {
    db::tasks::find_by_id(&state.pool, id)
        .await?
        .ok_or_else(|| AppError::NotFound("Task not found".to_string()))
}
