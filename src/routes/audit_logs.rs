use axum::extract::{Query, State};
use axum::Json;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::auth::extractor::AuthUser;
use crate::error::AppError;
use crate::models::AuditStatus;
use crate::routes::page;
use crate::state::SharedState;

#[derive(Deserialize)]
pub struct ListParams {
    pub status: Option<String>,
    pub offset: Option<i64>,
    pub limit: Option<i64>,
}

pub async fn list(
    _auth: AuthUser,
    State(state): State<SharedState>,
    Query(params): Query<ListParams>,
) -> Result<Json<Value>, AppError> {
    let status = match params.status.as_deref() {
        None | Some("") => None,
        Some(s) => Some(s.parse::<AuditStatus>().map_err(AppError::BadRequest)?),
    };
    let (offset, limit) = page(params.offset, params.limit);

    let (items, total) = state.audit.list(status, offset, limit).await?;
    Ok(Json(json!({
        "items": items,
        "total": total,
        "offset": offset,
        "limit": limit,
    })))
}
