use sqlx::PgPool;
use uuid::Uuid;

use crate::approval::change::PersonChange;
use crate::models::Person;

pub async fn insert<'e, E: sqlx::PgExecutor<'e>>(
    executor: E,
    p: &PersonChange,
) -> Result<Person, sqlx::Error> {
    sqlx::query_as::<_, Person>(
        "INSERT INTO people
            (name, phone, id_card, is_service_person,
             representative_customer_ids, investor_customer_ids, service_customer_ids)
         VALUES ($1, $2, $3, COALESCE($4, false),
                 COALESCE($5, '{}'), COALESCE($6, '{}'), COALESCE($7, '{}'))
         RETURNING *",
    )
    .bind(&p.name)
    .bind(&p.phone)
    .bind(&p.id_card)
    .bind(p.is_service_person)
    .bind(&p.representative_customer_ids)
    .bind(&p.investor_customer_ids)
    .bind(&p.service_customer_ids)
    .fetch_one(executor)
    .await
}

pub async fn update<'e, E: sqlx::PgExecutor<'e>>(
    executor: E,
    id: Uuid,
    p: &PersonChange,
) -> Result<Option<Person>, sqlx::Error> {
    sqlx::query_as::<_, Person>(
        "UPDATE people SET
            name = COALESCE($2, name),
            phone = COALESCE($3, phone),
            id_card = COALESCE($4, id_card),
            is_service_person = COALESCE($5, is_service_person),
            representative_customer_ids = COALESCE($6, representative_customer_ids),
            investor_customer_ids = COALESCE($7, investor_customer_ids),
            service_customer_ids = COALESCE($8, service_customer_ids),
            updated_at = now()
         WHERE id = $1
         RETURNING *",
    )
    .bind(id)
    .bind(&p.name)
    .bind(&p.phone)
    .bind(&p.id_card)
    .bind(p.is_service_person)
    .bind(&p.representative_customer_ids)
    .bind(&p.investor_customer_ids)
    .bind(&p.service_customer_ids)
    .fetch_optional(executor)
    .await
}

pub async fn delete<'e, E: sqlx::PgExecutor<'e>>(executor: E, id: Uuid) -> Result<u64, sqlx::Error> {
    let result = sqlx::query("DELETE FROM people WHERE id = $1")
        .bind(id)
        .execute(executor)
        .await?;
    Ok(result.rows_affected())
}

pub async fn find_by_id<'e, E: sqlx::PgExecutor<'e>>(
    executor: E,
    id: Uuid,
) -> Result<Option<Person>, sqlx::Error> {
    sqlx::query_as::<_, Person>("SELECT * FROM people WHERE id = $1")
        .bind(id)
        .fetch_optional(executor)
        .await
}

pub async fn list(
    pool: &PgPool,
    keyword: Option<&str>,
    is_service_person: Option<bool>,
    limit: i64,
    offset: i64,
) -> Result<Vec<Person>, sqlx::Error> {
    sqlx::query_as::<_, Person>(
        "SELECT * FROM people
         WHERE ($1::text IS NULL OR name ILIKE '%' || $1 || '%' OR phone ILIKE '%' || $1 || '%')
           AND ($2::boolean IS NULL OR is_service_person = $2)
         ORDER BY created_at DESC LIMIT $3 OFFSET $4",
    )
    .bind(keyword)
    .bind(is_service_person)
    .bind(limit)
    .bind(offset)
    .fetch_all(pool)
    .await
}

pub async fn count(
    pool: &PgPool,
    keyword: Option<&str>,
    is_service_person: Option<bool>,
) -> Result<i64, sqlx::Error> {
    let row: (i64,) = sqlx::query_as(
        "SELECT COUNT(*) FROM people
         WHERE ($1::text IS NULL OR name ILIKE '%' || $1 || '%' OR phone ILIKE '%' || $1 || '%')
           AND ($2::boolean IS NULL OR is_service_person = $2)",
    )
    .bind(keyword)
    .bind(is_service_person)
    .fetch_one(pool)
    .await?;
    Ok(row.0)
}

pub async fn list_all(pool: &PgPool) -> Result<Vec<Person>, sqlx::Error> {
    sqlx::query_as::<_, Person>("SELECT * FROM people ORDER BY created_at DESC")
        .fetch_all(pool)
        .await
}

/// Record `customer_id` in the person's representative list if absent.
pub async fn link_representative<'e, E: sqlx::PgExecutor<'e>>(
    executor: E,
    person_id: Uuid,
    customer_id: Uuid,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        "UPDATE people
         SET representative_customer_ids = array_append(representative_customer_ids, $2),
             updated_at = now()
         WHERE id = $1 AND NOT ($2 = ANY(representative_customer_ids))",
    )
    .bind(person_id)
    .bind(customer_id)
    .execute(executor)
    .await?;
    Ok(())
}

/// Drop a customer from every person's relation lists.
pub async fn unlink_customer<'e, E: sqlx::PgExecutor<'e>>(
    executor: E,
    customer_id: Uuid,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        "UPDATE people SET
            representative_customer_ids = array_remove(representative_customer_ids, $1),
            investor_customer_ids = array_remove(investor_customer_ids, $1),
            service_customer_ids = array_remove(service_customer_ids, $1),
            updated_at = now()
         WHERE $1 = ANY(representative_customer_ids)
            OR $1 = ANY(investor_customer_ids)
            OR $1 = ANY(service_customer_ids)",
    )
    .bind(customer_id)
    .execute(executor)
    .await?;
    Ok(())
}
