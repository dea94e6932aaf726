use sqlx::PgPool;
use uuid::Uuid;

use crate::approval::change::TaskChange;
use crate::models::{Task, TaskStatus};

pub struct TaskFilter<'a> {
    pub keyword: Option<&'a str>,
    pub status: Option<TaskStatus>,
    pub customer_id: Option<Uuid>,
}

pub async fn insert<'e, E: sqlx::PgExecutor<'e>>(
    executor: E,
    t: &TaskChange,
) -> Result<Task, sqlx::Error> {
    sqlx::query_as::<_, Task>(
        "INSERT INTO tasks (customer_id, title, description, status, due_date, completed_at)
         VALUES ($1, $2, $3, COALESCE($4, 'pending'::task_status), $5,
                 CASE WHEN $4 = 'completed'::task_status THEN now() END)
         RETURNING *",
    )
    .bind(t.customer_id)
    .bind(&t.title)
    .bind(&t.description)
    .bind(t.status)
    .bind(t.due_date)
    .fetch_one(executor)
    .await
}

/// Patch a task. Moving into `completed` stamps `completed_at` once.
pub async fn update<'e, E: sqlx::PgExecutor<'e>>(
    executor: E,
    id: Uuid,
    t: &TaskChange,
) -> Result<Option<Task>, sqlx::Error> {
    sqlx::query_as::<_, Task>(
        "UPDATE tasks SET
            customer_id = COALESCE($2, customer_id),
            title = COALESCE($3, title),
            description = COALESCE($4, description),
            completed_at = CASE
                WHEN $5 = 'completed'::task_status AND status <> 'completed' THEN now()
                ELSE completed_at
            END,
            status = COALESCE($5, status),
            due_date = COALESCE($6, due_date),
            updated_at = now()
         WHERE id = $1
         RETURNING *",
    )
    .bind(id)
    .bind(t.customer_id)
    .bind(&t.title)
    .bind(&t.description)
    .bind(t.status)
    .bind(t.due_date)
    .fetch_optional(executor)
    .await
}

pub async fn delete<'e, E: sqlx::PgExecutor<'e>>(executor: E, id: Uuid) -> Result<u64, sqlx::Error> {
    let result = sqlx::query("DELETE FROM tasks WHERE id = $1")
        .bind(id)
        .execute(executor)
        .await?;
    Ok(result.rows_affected())
}

pub async fn find_by_id<'e, E: sqlx::PgExecutor<'e>>(
    executor: E,
    id: Uuid,
) -> Result<Option<Task>, sqlx::Error> {
    sqlx::query_as::<_, Task>("SELECT * FROM tasks WHERE id = $1")
        .bind(id)
        .fetch_optional(executor)
        .await
}

pub async fn list(
    pool: &PgPool,
    filter: &TaskFilter<'_>,
    limit: i64,
    offset: i64,
) -> Result<Vec<Task>, sqlx::Error> {
    sqlx::query_as::<_, Task>(
        "SELECT * FROM tasks
         WHERE ($1::text IS NULL OR title ILIKE '%' || $1 || '%')
           AND ($2::task_status IS NULL OR status = $2)
           AND ($3::uuid IS NULL OR customer_id = $3)
         ORDER BY due_date ASC NULLS LAST, created_at DESC
         LIMIT $4 OFFSET $5",
    )
    .bind(filter.keyword)
    .bind(filter.status)
    .bind(filter.customer_id)
    .bind(limit)
    .bind(offset)
    .fetch_all(pool)
    .await
}

pub async fn count(pool: &PgPool, filter: &TaskFilter<'_>) -> Result<i64, sqlx::Error> {
    let row: (i64,) = sqlx::query_as(
        "SELECT COUNT(*) FROM tasks
         WHERE ($1::text IS NULL OR title ILIKE '%' || $1 || '%')
           AND ($2::task_status IS NULL OR status = $2)
           AND ($3::uuid IS NULL OR customer_id = $3)",
    )
    .bind(filter.keyword)
    .bind(filter.status)
    .bind(filter.customer_id)
    .fetch_one(pool)
    .await?;
    Ok(row.0)
}
