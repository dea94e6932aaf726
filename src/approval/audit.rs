use chrono::{DateTime, Utc};
use serde_json::{Map, Value};
use sqlx::{PgConnection, PgPool};
use uuid::Uuid;

use super::Actor;
use crate::db;
use crate::db::audit_logs::NewEntry;
use crate::error::AppError;
use crate::models::{AuditAction, AuditLog, AuditLogView, AuditStatus, ResourceType};

/// Fields of an audit entry supplied by the caller.
#[derive(Debug, Clone)]
pub struct Draft<'a> {
    pub action: AuditAction,
    pub resource_type: ResourceType,
    pub resource_id: Option<Uuid>,
    pub resource_name: Option<&'a str>,
    pub old_value: Option<Value>,
    pub new_value: Option<Value>,
    pub reason: Option<&'a str>,
}

#[derive(Clone)]
pub struct AuditLogService {
    pool: PgPool,
}

impl AuditLogService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Insert one entry on `conn`. Status and approver follow the actor's role.
    pub async fn record(
        &self,
        conn: &mut PgConnection,
        actor: Actor,
        draft: Draft<'_>,
    ) -> Result<Uuid, AppError> {
        let status = AuditStatus::initial_for(actor.role);
        let approver_id = (status == AuditStatus::Approved).then_some(actor.id);

        let entry = db::audit_logs::insert(
            &mut *conn,
            NewEntry {
                actor_id: actor.id,
                actor_role: actor.role,
                action: draft.action,
                resource_type: draft.resource_type,
                resource_id: draft.resource_id,
                resource_name: draft.resource_name,
                old_value: draft.old_value.map(scrub_relations),
                new_value: draft.new_value.map(scrub_relations),
                status,
                approver_id,
                reason: draft.reason,
            },
        )
        .await?;

        Ok(entry.id)
    }

    pub async fn list_pending(&self) -> Result<Vec<AuditLogView>, AppError> {
        Ok(db::audit_logs::list_pending(&self.pool).await?)
    }

    /// One page of entries, newest first, with the unpaged total.
    pub async fn list(
        &self,
        status: Option<AuditStatus>,
        offset: i64,
        limit: i64,
    ) -> Result<(Vec<AuditLogView>, i64), AppError> {
        let items = db::audit_logs::list(&self.pool, status, limit, offset).await?;
        let total = db::audit_logs::count(&self.pool, status).await?;
        Ok((items, total))
    }

    /// Mark a pending entry approved. The row stays locked until `conn`'s
    /// transaction ends, so callers replay the change before committing.
    pub async fn approve(
        &self,
        conn: &mut PgConnection,
        id: Uuid,
        approver: Actor,
        note: Option<&str>,
    ) -> Result<AuditLog, AppError> {
        self.decide(conn, id, AuditStatus::Approved, approver, note)
            .await
    }

    pub async fn reject(
        &self,
        conn: &mut PgConnection,
        id: Uuid,
        approver: Actor,
        reason: &str,
    ) -> Result<AuditLog, AppError> {
        self.decide(conn, id, AuditStatus::Rejected, approver, Some(reason))
            .await
    }

    async fn decide(
        &self,
        conn: &mut PgConnection,
        id: Uuid,
        status: AuditStatus,
        approver: Actor,
        reason: Option<&str>,
    ) -> Result<AuditLog, AppError> {
        let entry = db::audit_logs::find_for_update(&mut *conn, id)
            .await?
            .ok_or_else(|| AppError::NotFound("Audit log entry not found".to_string()))?;

        if entry.status != AuditStatus::Pending {
            return Err(AppError::InvalidState(format!(
                "Audit log entry is already {}",
                entry.status
            )));
        }

        db::audit_logs::decide(&mut *conn, id, status, approver.id, reason)
            .await?
            .ok_or_else(|| AppError::InvalidState("Audit log entry is no longer pending".to_string()))
    }

    pub async fn purge_one(&self, id: Uuid) -> Result<(), AppError> {
        if db::audit_logs::delete(&self.pool, id).await? == 0 {
            return Err(AppError::NotFound("Audit log entry not found".to_string()));
        }
        Ok(())
    }

    /// Delete entries created before `before` and/or after `after`.
    pub async fn purge_range(
        &self,
        before: Option<DateTime<Utc>>,
        after: Option<DateTime<Utc>>,
    ) -> Result<u64, AppError> {
        if before.is_none() && after.is_none() {
            return Err(AppError::BadRequest(
                "At least one of before/after is required".to_string(),
            ));
        }
        Ok(db::audit_logs::delete_range(&self.pool, before, after).await?)
    }
}

/// Keep only scalar fields of a snapshot. Nested objects and arrays of
/// objects are embedded relations; arrays of scalars (id lists) survive.
pub fn scrub_relations(value: Value) -> Value {
    match value {
        Value::Object(map) => Value::Object(
            map.into_iter()
                .filter(|(_, v)| match v {
                    Value::Object(_) => false,
                    Value::Array(items) => !items
                        .iter()
                        .any(|i| matches!(i, Value::Object(_) | Value::Array(_))),
                    _ => true,
                })
                .collect::<Map<String, Value>>(),
        ),
        other => other,
    }
}
