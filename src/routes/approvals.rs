use axum::extract::State;
use axum::Json;
use serde::Deserialize;
use serde_json::{json, Value};
use uuid::Uuid;

use crate::approval::{executor, Draft};
use crate::auth::extractor::AuthUser;
use crate::error::AppError;
use crate::models::AuditAction;
use crate::state::SharedState;

#[derive(Deserialize)]
pub struct ApproveRequest {
    pub log_id: Uuid,
    pub reason: Option<String>,
}

#[derive(Deserialize)]
pub struct RejectRequest {
    pub log_id: Uuid,
    pub reason: String,
}

pub async fn pending(
    auth: AuthUser,
    State(state): State<SharedState>,
) -> Result<Json<Value>, AppError> {
    auth.require_manager()?;
    let items = state.audit.list_pending().await?;
    Ok(Json(json!({ "total": items.len(), "items": items })))
}

/// Approve a pending entry and replay its change. Both happen in one
/// transaction: if the replay fails the entry is left pending.
pub async fn approve(
    auth: AuthUser,
    State(state): State<SharedState>,
    Json(req): Json<ApproveRequest>,
) -> Result<Json<Value>, AppError> {
    auth.require_manager()?;
    let approver = auth.actor();
    let note = req.reason.as_deref().filter(|r| !r.trim().is_empty());

    let mut tx = state.pool.begin().await?;
    let entry = state
        .audit
        .approve(&mut tx, req.log_id, approver, note)
        .await?;

    let resource_id = match executor::replay(&mut tx, &entry).await {
        Ok(id) => id,
        Err(err) => {
            tracing::warn!(
                "Replay of audit entry {} failed, entry stays pending: {err}",
                entry.id
            );
            let detail = match &err {
                AppError::Database(_) | AppError::Internal(_) => "internal error".to_string(),
                other => other.to_string(),
            };
            return Err(AppError::Execution(format!(
                "Approved change could not be applied: {detail}"
            )));
        }
    };

    state
        .audit
        .record(
            &mut tx,
            approver,
            Draft {
                action: AuditAction::Approve,
                resource_type: entry.resource_type,
                resource_id: Some(resource_id),
                resource_name: entry.resource_name.as_deref(),
                old_value: None,
                new_value: Some(json!({ "log_id": entry.id, "reason": note })),
                reason: note,
            },
        )
        .await?;
    tx.commit().await?;

    tracing::info!(
        "Entry {} approved by {}: {} {} {resource_id}",
        entry.id,
        approver.id,
        entry.action,
        entry.resource_type
    );

    Ok(Json(json!({
        "message": "Approved",
        "log_id": entry.id,
        "resource_id": resource_id,
    })))
}

pub async fn reject(
    auth: AuthUser,
    State(state): State<SharedState>,
    Json(req): Json<RejectRequest>,
) -> Result<Json<Value>, AppError> {
    auth.require_manager()?;
    let approver = auth.actor();
    let reason = req.reason.trim();
    if reason.is_empty() {
        return Err(AppError::BadRequest("A rejection reason is required".to_string()));
    }

    let mut tx = state.pool.begin().await?;
    let entry = state
        .audit
        .reject(&mut tx, req.log_id, approver, reason)
        .await?;

    state
        .audit
        .record(
            &mut tx,
            approver,
            Draft {
                action: AuditAction::Reject,
                resource_type: entry.resource_type,
                resource_id: entry.resource_id,
                resource_name: entry.resource_name.as_deref(),
                old_value: None,
                new_value: Some(json!({ "log_id": entry.id, "reason": reason })),
                reason: Some(reason),
            },
        )
        .await?;
    tx.commit().await?;

    tracing::info!("Entry {} rejected by {}", entry.id, approver.id);

    Ok(Json(json!({ "message": "Rejected", "log_id": entry.id })))
}
