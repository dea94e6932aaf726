use sqlx::PgPool;

use super::audit::{AuditLogService, Draft};
use super::{executor, Actor, Mutation, Outcome};
use crate::error::AppError;

/// Routes every business mutation either straight to the executor or into
/// the pending queue, depending on who submits it.
#[derive(Clone)]
pub struct ApprovalGate {
    pool: PgPool,
    audit: AuditLogService,
}

impl ApprovalGate {
    pub fn new(pool: PgPool, audit: AuditLogService) -> Self {
        Self { pool, audit }
    }

    pub async fn submit(&self, actor: Actor, mutation: Mutation) -> Result<Outcome, AppError> {
        let Mutation {
            change,
            before,
            label,
        } = mutation;

        let mut tx = self.pool.begin().await?;

        if actor.role.requires_approval() {
            let log_id = self
                .audit
                .record(
                    &mut tx,
                    actor,
                    Draft {
                        action: change.action(),
                        resource_type: change.resource_type(),
                        resource_id: change.resource_id(),
                        resource_name: label.as_deref(),
                        old_value: before,
                        new_value: change.new_value()?,
                        reason: None,
                    },
                )
                .await?;
            tx.commit().await?;

            tracing::info!(
                "Queued {} {} by {} for approval as entry {log_id}",
                change.action(),
                change.resource_type(),
                actor.id
            );
            return Ok(Outcome::Queued { log_id });
        }

        // Dropping `tx` on error rolls back the change; no audit row survives.
        let resource_id = executor::apply(&mut tx, &change).await?;
        self.audit
            .record(
                &mut tx,
                actor,
                Draft {
                    action: change.action(),
                    resource_type: change.resource_type(),
                    resource_id: Some(resource_id),
                    resource_name: label.as_deref(),
                    old_value: before,
                    new_value: change.new_value()?,
                    reason: None,
                },
            )
            .await?;
        tx.commit().await?;

        tracing::info!(
            "Applied {} {} {resource_id} by {} ({})",
            change.action(),
            change.resource_type(),
            actor.id,
            actor.role
        );
        Ok(Outcome::Applied { resource_id })
    }
}
