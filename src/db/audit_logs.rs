use chrono::{DateTime, Utc};
use serde_json::Value;
use sqlx::PgPool;
use uuid::Uuid;

use crate::models::{AuditAction, AuditLog, AuditLogView, AuditStatus, ResourceType, Role};

const VIEW_SELECT: &str = "SELECT a.*, u.username AS actor_username
     FROM audit_logs a LEFT JOIN admin_users u ON u.id = a.actor_id";

/// Column values for a new audit row. Snapshots are already scrubbed.
pub struct NewEntry<'a> {
    pub actor_id: Uuid,
    pub actor_role: Role,
    pub action: AuditAction,
    pub resource_type: ResourceType,
    pub resource_id: Option<Uuid>,
    pub resource_name: Option<&'a str>,
    pub old_value: Option<Value>,
    pub new_value: Option<Value>,
    pub status: AuditStatus,
    pub approver_id: Option<Uuid>,
    pub reason: Option<&'a str>,
}

pub async fn insert<'e, E: sqlx::PgExecutor<'e>>(
    executor: E,
    entry: NewEntry<'_>,
) -> Result<AuditLog, sqlx::Error> {
    sqlx::query_as::<_, AuditLog>(
        "INSERT INTO audit_logs
            (actor_id, actor_role, action, resource_type, resource_id, resource_name,
             old_value, new_value, status, approver_id, approved_at, reason)
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10,
                 CASE WHEN $10::uuid IS NULL THEN NULL ELSE now() END, $11)
         RETURNING *",
    )
    .bind(entry.actor_id)
    .bind(entry.actor_role)
    .bind(entry.action)
    .bind(entry.resource_type)
    .bind(entry.resource_id)
    .bind(entry.resource_name)
    .bind(entry.old_value)
    .bind(entry.new_value)
    .bind(entry.status)
    .bind(entry.approver_id)
    .bind(entry.reason)
    .fetch_one(executor)
    .await
}

/// Fetch an entry and hold its row lock until the surrounding transaction ends.
pub async fn find_for_update<'e, E: sqlx::PgExecutor<'e>>(
    executor: E,
    id: Uuid,
) -> Result<Option<AuditLog>, sqlx::Error> {
    sqlx::query_as::<_, AuditLog>("SELECT * FROM audit_logs WHERE id = $1 FOR UPDATE")
        .bind(id)
        .fetch_optional(executor)
        .await
}

/// Record a decision on an entry. Only rows still pending are touched.
pub async fn decide<'e, E: sqlx::PgExecutor<'e>>(
    executor: E,
    id: Uuid,
    status: AuditStatus,
    approver_id: Uuid,
    reason: Option<&str>,
) -> Result<Option<AuditLog>, sqlx::Error> {
    sqlx::query_as::<_, AuditLog>(
        "UPDATE audit_logs
         SET status = $2, approver_id = $3, approved_at = now(),
             reason = COALESCE($4, reason), updated_at = now()
         WHERE id = $1 AND status = 'pending'
         RETURNING *",
    )
    .bind(id)
    .bind(status)
    .bind(approver_id)
    .bind(reason)
    .fetch_optional(executor)
    .await
}

pub async fn set_resource_id<'e, E: sqlx::PgExecutor<'e>>(
    executor: E,
    id: Uuid,
    resource_id: Uuid,
) -> Result<(), sqlx::Error> {
    sqlx::query("UPDATE audit_logs SET resource_id = $2, updated_at = now() WHERE id = $1")
        .bind(id)
        .bind(resource_id)
        .execute(executor)
        .await?;
    Ok(())
}

pub async fn list_pending(pool: &PgPool) -> Result<Vec<AuditLogView>, sqlx::Error> {
    sqlx::query_as::<_, AuditLogView>(&format!(
        "{VIEW_SELECT} WHERE a.status = 'pending' ORDER BY a.created_at DESC"
    ))
    .fetch_all(pool)
    .await
}

pub async fn list(
    pool: &PgPool,
    status: Option<AuditStatus>,
    limit: i64,
    offset: i64,
) -> Result<Vec<AuditLogView>, sqlx::Error> {
    sqlx::query_as::<_, AuditLogView>(&format!(
        "{VIEW_SELECT} WHERE ($1::audit_status IS NULL OR a.status = $1)
         ORDER BY a.created_at DESC LIMIT $2 OFFSET $3"
    ))
    .bind(status)
    .bind(limit)
    .bind(offset)
    .fetch_all(pool)
    .await
}

pub async fn count(pool: &PgPool, status: Option<AuditStatus>) -> Result<i64, sqlx::Error> {
    let row: (i64,) = sqlx::query_as(
        "SELECT COUNT(*) FROM audit_logs WHERE ($1::audit_status IS NULL OR status = $1)",
    )
    .bind(status)
    .fetch_one(pool)
    .await?;
    Ok(row.0)
}

pub async fn delete(pool: &PgPool, id: Uuid) -> Result<u64, sqlx::Error> {
    let result = sqlx::query("DELETE FROM audit_logs WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected())
}

/// Delete entries created inside the given window. Open bounds are unbounded.
pub async fn delete_range(
    pool: &PgPool,
    before: Option<DateTime<Utc>>,
    after: Option<DateTime<Utc>>,
) -> Result<u64, sqlx::Error> {
    let result = sqlx::query(
        "DELETE FROM audit_logs
         WHERE ($1::timestamptz IS NULL OR created_at < $1)
           AND ($2::timestamptz IS NULL OR created_at > $2)",
    )
    .bind(before)
    .bind(after)
    .execute(pool)
    .await?;
    Ok(result.rows_affected())
}
