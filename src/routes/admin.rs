use axum::extract::{Path, State};
use axum::Json;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::{json, Value};
use uuid::Uuid;

use crate::auth::extractor::AuthUser;
use crate::auth::password;
use crate::db;
use crate::error::{write_error, AppError};
use crate::models::{AdminUser, Role};
use crate::state::SharedState;

/// Initial password for logins created by promoting a person to manager.
pub const MANAGER_DEFAULT_PASSWORD: &str = "manager";

#[derive(Deserialize)]
pub struct SetManagerRequest {
    pub person_id: Uuid,
    pub is_manager: bool,
}

#[derive(Deserialize)]
pub struct ClearAuditLogsRequest {
    pub before: Option<DateTime<Utc>>,
    pub after: Option<DateTime<Utc>>,
}

pub async fn list_users(
    auth: AuthUser,
    State(state): State<SharedState>,
) -> Result<Json<Vec<AdminUser>>, AppError> {
    auth.require_super_admin()?;
    let users = db::admin_users::list_all(&state.pool).await?;
    Ok(Json(users))
}

/// Promote a service person's login to manager, or demote it back.
/// Promoting a person without a login creates one.
pub async fn set_manager(
    auth: AuthUser,
    State(state): State<SharedState>,
    Json(req): Json<SetManagerRequest>,
) -> Result<Json<AdminUser>, AppError> {
    auth.require_super_admin()?;

    let person = db::people::find_by_id(&state.pool, req.person_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Person not found".to_string()))?;

    let mut tx = state.pool.begin().await?;
    let existing = db::admin_users::find_by_person(&mut *tx, person.id).await?;

    let user = match (existing, req.is_manager) {
        (Some(user), _) if user.role == Role::SuperAdmin => {
            return Err(AppError::BadRequest(
                "Super admin role cannot be changed".to_string(),
            ));
        }
        (Some(user), true) => db::admin_users::update_role(&mut *tx, user.id, Role::Manager).await?,
        (Some(user), false) => {
            db::admin_users::update_role(&mut *tx, user.id, Role::ServicePerson).await?
        }
        (None, true) => {
            if !person.is_service_person {
                return Err(AppError::BadRequest(
                    "Person is not a service person".to_string(),
                ));
            }
            let hash = password::hash(MANAGER_DEFAULT_PASSWORD).map_err(AppError::Internal)?;
            db::admin_users::create(&mut *tx, &person.name, &hash, Role::Manager, Some(person.id))
                .await
                .map_err(write_error)?
        }
        (None, false) => {
            return Err(AppError::NotFound(
                "Person has no login to demote".to_string(),
            ));
        }
    };
    tx.commit().await?;

    tracing::info!(
        "Login '{}' for person {} is now {}",
        user.username,
        person.id,
        user.role
    );
    Ok(Json(user))
}

pub async fn delete_user(
    auth: AuthUser,
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Value>, AppError> {
    auth.require_super_admin()?;

    let user = db::admin_users::find_by_id(&state.pool, id)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;
    if user.role == Role::SuperAdmin {
        return Err(AppError::BadRequest(
            "Cannot delete a super admin".to_string(),
        ));
    }

    db::admin_users::delete(&state.pool, id).await?;
    Ok(Json(json!({ "message": "User deleted" })))
}

pub async fn delete_audit_log(
    auth: AuthUser,
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Value>, AppError> {
    auth.require_super_admin()?;
    state.audit.purge_one(id).await?;
    tracing::info!("Audit entry {id} purged by {}", auth.user_id);
    Ok(Json(json!({ "message": "Audit log entry deleted" })))
}

pub async fn clear_audit_logs(
    auth: AuthUser,
    State(state): State<SharedState>,
    Json(req): Json<ClearAuditLogsRequest>,
) -> Result<Json<Value>, AppError> {
    auth.require_super_admin()?;
    let deleted = state.audit.purge_range(req.before, req.after).await?;
    tracing::info!("{deleted} audit entries purged by {}", auth.user_id);
    Ok(Json(json!({ "deleted": deleted })))
}
