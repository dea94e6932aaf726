use chrono::NaiveDate;
use serde::Serialize;
use sqlx::PgPool;

use crate::models::TaskStatus;

#[derive(Debug, Serialize, sqlx::FromRow)]
pub struct Overview {
    pub customer_count: i64,
    pub open_task_count: i64,
    pub active_agreement_count: i64,
    pub month_payment_total: f64,
    pub year_payment_total: f64,
}

#[derive(Debug, Serialize, sqlx::FromRow)]
pub struct TaskStatusCount {
    pub status: TaskStatus,
    pub count: i64,
}

#[derive(Debug, Serialize, sqlx::FromRow)]
pub struct PaymentSummary {
    pub count: i64,
    pub total: f64,
}

/// Dashboard counters. Month and year totals are relative to `today`.
pub async fn overview(pool: &PgPool, today: NaiveDate) -> Result<Overview, sqlx::Error> {
    sqlx::query_as::<_, Overview>(
        "SELECT
            (SELECT COUNT(*) FROM customers) AS customer_count,
            (SELECT COUNT(*) FROM tasks WHERE status <> 'completed') AS open_task_count,
            (SELECT COUNT(*) FROM agreements WHERE status = 'active') AS active_agreement_count,
            (SELECT COALESCE(SUM(amount), 0)::float8 FROM payments
              WHERE date_trunc('month', payment_date) = date_trunc('month', $1::date))
              AS month_payment_total,
            (SELECT COALESCE(SUM(amount), 0)::float8 FROM payments
              WHERE date_trunc('year', payment_date) = date_trunc('year', $1::date))
              AS year_payment_total",
    )
    .bind(today)
    .fetch_one(pool)
    .await
}

pub async fn tasks_by_status(pool: &PgPool) -> Result<Vec<TaskStatusCount>, sqlx::Error> {
    sqlx::query_as::<_, TaskStatusCount>(
        "SELECT status, COUNT(*) AS count FROM tasks GROUP BY status ORDER BY status",
    )
    .fetch_all(pool)
    .await
}

pub async fn payments_between(
    pool: &PgPool,
    start_date: Option<NaiveDate>,
    end_date: Option<NaiveDate>,
) -> Result<PaymentSummary, sqlx::Error> {
    sqlx::query_as::<_, PaymentSummary>(
        "SELECT COUNT(*) AS count, COALESCE(SUM(amount), 0)::float8 AS total
         FROM payments
         WHERE ($1::date IS NULL OR payment_date >= $1)
           AND ($2::date IS NULL OR payment_date <= $2)",
    )
    .bind(start_date)
    .bind(end_date)
    .fetch_one(pool)
    .await
}
