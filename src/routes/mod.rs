pub mod admin;
pub mod agreements;
pub mod approvals;
pub mod audit_logs;
pub mod auth;
pub mod customers;
pub mod export;
pub mod payments;
pub mod people;
pub mod statistics;
pub mod tasks;

use std::future::Future;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{delete, get, post};
use axum::{Json, Router};
use serde::Serialize;
use serde_json::json;
use uuid::Uuid;

use crate::approval::{Mutation, Outcome};
use crate::auth::extractor::AuthUser;
use crate::error::AppError;
use crate::state::SharedState;

pub const DEFAULT_PAGE_SIZE: i64 = 20;
pub const MAX_PAGE_SIZE: i64 = 100;

pub fn api_routes() -> Router<SharedState> {
    Router::new()
        // Auth
        .route("/api/v1/auth/login", post(auth::login))
        .route("/api/v1/auth/me", get(auth::me))
        .route("/api/v1/auth/change-password", post(auth::change_password))
        // Customers
        .route(
            "/api/v1/customers",
            get(customers::list).post(customers::create),
        )
        .route("/api/v1/customers/types", get(customers::types))
        .route(
            "/api/v1/customers/credit-ratings",
            get(customers::credit_ratings),
        )
        .route(
            "/api/v1/customers/{id}",
            get(customers::get)
                .put(customers::update)
                .delete(customers::delete),
        )
        .route("/api/v1/customers/{id}/tasks", get(customers::tasks))
        .route("/api/v1/customers/{id}/payments", get(customers::payments))
        // People
        .route("/api/v1/people", get(people::list).post(people::create))
        .route(
            "/api/v1/people/{id}",
            get(people::get).put(people::update).delete(people::delete),
        )
        .route("/api/v1/people/{id}/customers", get(people::customers))
        // Tasks
        .route("/api/v1/tasks", get(tasks::list).post(tasks::create))
        .route(
            "/api/v1/tasks/{id}",
            get(tasks::get).put(tasks::update).delete(tasks::delete),
        )
        // Agreements
        .route(
            "/api/v1/agreements",
            get(agreements::list).post(agreements::create),
        )
        .route(
            "/api/v1/agreements/{id}",
            get(agreements::get)
                .put(agreements::update)
                .delete(agreements::delete),
        )
        // Payments
        .route(
            "/api/v1/payments",
            get(payments::list).post(payments::create),
        )
        .route(
            "/api/v1/payments/{id}",
            get(payments::get)
                .put(payments::update)
                .delete(payments::delete),
        )
        // Approvals
        .route("/api/v1/approvals/pending", get(approvals::pending))
        .route("/api/v1/approvals/approve", post(approvals::approve))
        .route("/api/v1/approvals/reject", post(approvals::reject))
        .route("/api/v1/audit-logs", get(audit_logs::list))
        // Statistics
        .route("/api/v1/statistics/overview", get(statistics::overview))
        .route("/api/v1/statistics/tasks", get(statistics::tasks))
        .route("/api/v1/statistics/payments", get(statistics::payments))
        // Export
        .route("/api/v1/export/customers", get(export::customers))
        .route("/api/v1/export/people", get(export::people))
        // Admin
        .route("/api/v1/admin/users", get(admin::list_users))
        .route("/api/v1/admin/users/{id}", delete(admin::delete_user))
        .route("/api/v1/admin/managers", post(admin::set_manager))
        .route(
            "/api/v1/admin/audit-logs/{id}",
            delete(admin::delete_audit_log),
        )
        .route(
            "/api/v1/admin/audit-logs/clear",
            post(admin::clear_audit_logs),
        )
}

/// Resolve `offset`/`limit` query values: limit defaults to 20 and is
/// clamped to 1..=100, offset is never negative.
pub fn page(offset: Option<i64>, limit: Option<i64>) -> (i64, i64) {
    let limit = limit.unwrap_or(DEFAULT_PAGE_SIZE).clamp(1, MAX_PAGE_SIZE);
    let offset = offset.unwrap_or(0).max(0);
    (offset, limit)
}

/// 202 body telling the caller the change waits for a manager.
pub fn queued(log_id: Uuid) -> Response {
    (
        StatusCode::ACCEPTED,
        Json(json!({
            "requires_approval": true,
            "message": "Change submitted for approval",
            "log_id": log_id,
        })),
    )
        .into_response()
}

/// Submit a create or update and answer with the resulting row, or 202 when
/// the change was queued.
pub async fn submit_and_load<T, F, Fut>(
    state: &SharedState,
    auth: &AuthUser,
    mutation: Mutation,
    load: F,
) -> Result<Response, AppError>
where
    T: Serialize,
    F: FnOnce(Uuid) -> Fut,
    Fut: Future<Output = Result<Option<T>, sqlx::Error>>,
{
    match state.gate.submit(auth.actor(), mutation).await? {
        Outcome::Applied { resource_id } => {
            let row = load(resource_id)
                .await?
                .ok_or_else(|| AppError::NotFound("Record not found".to_string()))?;
            Ok(Json(row).into_response())
        }
        Outcome::Queued { log_id } => Ok(queued(log_id)),
    }
}

pub async fn submit_delete(
    state: &SharedState,
    auth: &AuthUser,
    mutation: Mutation,
) -> Result<Response, AppError> {
    match state.gate.submit(auth.actor(), mutation).await? {
        Outcome::Applied { resource_id } => Ok(Json(json!({
            "message": "Deleted",
            "id": resource_id,
        }))
        .into_response()),
        Outcome::Queued { log_id } => Ok(queued(log_id)),
    }
}
