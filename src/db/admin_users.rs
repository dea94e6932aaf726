use sqlx::PgPool;
use uuid::Uuid;

use crate::models::{AdminUser, Role};

pub async fn create<'e, E: sqlx::PgExecutor<'e>>(
    executor: E,
    username: &str,
    password_hash: &str,
    role: Role,
    person_id: Option<Uuid>,
) -> Result<AdminUser, sqlx::Error> {
    sqlx::query_as::<_, AdminUser>(
        "INSERT INTO admin_users (username, password_hash, role, person_id)
         VALUES ($1, $2, $3, $4) RETURNING *",
    )
    .bind(username)
    .bind(password_hash)
    .bind(role)
    .bind(person_id)
    .fetch_one(executor)
    .await
}

pub async fn find_by_username(pool: &PgPool, username: &str) -> Result<Option<AdminUser>, sqlx::Error> {
    sqlx::query_as::<_, AdminUser>("SELECT * FROM admin_users WHERE username = $1")
        .bind(username)
        .fetch_optional(pool)
        .await
}

pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<AdminUser>, sqlx::Error> {
    sqlx::query_as::<_, AdminUser>("SELECT * FROM admin_users WHERE id = $1")
        .bind(id)
        .fetch_optional(pool)
        .await
}

pub async fn find_by_person<'e, E: sqlx::PgExecutor<'e>>(
    executor: E,
    person_id: Uuid,
) -> Result<Option<AdminUser>, sqlx::Error> {
    sqlx::query_as::<_, AdminUser>("SELECT * FROM admin_users WHERE person_id = $1")
        .bind(person_id)
        .fetch_optional(executor)
        .await
}

pub async fn count_by_role<'e, E: sqlx::PgExecutor<'e>>(
    executor: E,
    role: Role,
) -> Result<i64, sqlx::Error> {
    let row: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM admin_users WHERE role = $1")
        .bind(role)
        .fetch_one(executor)
        .await?;
    Ok(row.0)
}

pub async fn list_all(pool: &PgPool) -> Result<Vec<AdminUser>, sqlx::Error> {
    sqlx::query_as::<_, AdminUser>("SELECT * FROM admin_users ORDER BY created_at DESC")
        .fetch_all(pool)
        .await
}

/// Store a new password and clear the forced-change flag.
pub async fn update_password(
    pool: &PgPool,
    id: Uuid,
    password_hash: &str,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        "UPDATE admin_users
         SET password_hash = $2, must_change_password = false,
             last_password_change = now(), updated_at = now()
         WHERE id = $1",
    )
    .bind(id)
    .bind(password_hash)
    .execute(pool)
    .await?;
    Ok(())
}

pub async fn update_role<'e, E: sqlx::PgExecutor<'e>>(
    executor: E,
    id: Uuid,
    role: Role,
) -> Result<AdminUser, sqlx::Error> {
    sqlx::query_as::<_, AdminUser>(
        "UPDATE admin_users SET role = $2, updated_at = now() WHERE id = $1 RETURNING *",
    )
    .bind(id)
    .bind(role)
    .fetch_one(executor)
    .await
}

pub async fn delete(pool: &PgPool, id: Uuid) -> Result<u64, sqlx::Error> {
    let result = sqlx::query("DELETE FROM admin_users WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected())
}
