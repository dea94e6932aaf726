use sqlx::PgPool;
use uuid::Uuid;

use crate::approval::change::CustomerChange;
use crate::models::Customer;

pub async fn insert<'e, E: sqlx::PgExecutor<'e>>(
    executor: E,
    c: &CustomerChange,
) -> Result<Customer, sqlx::Error> {
    sqlx::query_as::<_, Customer>(
        "INSERT INTO customers
            (name, customer_type, tax_number, contact, phone, email, address,
             business_scope, credit_rating, representative_id)
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
         RETURNING *",
    )
    .bind(&c.name)
    .bind(&c.customer_type)
    .bind(&c.tax_number)
    .bind(&c.contact)
    .bind(&c.phone)
    .bind(&c.email)
    .bind(&c.address)
    .bind(&c.business_scope)
    .bind(&c.credit_rating)
    .bind(c.representative_id)
    .fetch_one(executor)
    .await
}

/// Patch the columns present in `c`. Returns `None` when the row is gone.
pub async fn update<'e, E: sqlx::PgExecutor<'e>>(
    executor: E,
    id: Uuid,
    c: &CustomerChange,
) -> Result<Option<Customer>, sqlx::Error> {
    sqlx::query_as::<_, Customer>(
        "UPDATE customers SET
            name = COALESCE($2, name),
            customer_type = COALESCE($3, customer_type),
            tax_number = COALESCE($4, tax_number),
            contact = COALESCE($5, contact),
            phone = COALESCE($6, phone),
            email = COALESCE($7, email),
            address = COALESCE($8, address),
            business_scope = COALESCE($9, business_scope),
            credit_rating = COALESCE($10, credit_rating),
            representative_id = COALESCE($11, representative_id),
            updated_at = now()
         WHERE id = $1
         RETURNING *",
    )
    .bind(id)
    .bind(&c.name)
    .bind(&c.customer_type)
    .bind(&c.tax_number)
    .bind(&c.contact)
    .bind(&c.phone)
    .bind(&c.email)
    .bind(&c.address)
    .bind(&c.business_scope)
    .bind(&c.credit_rating)
    .bind(c.representative_id)
    .fetch_optional(executor)
    .await
}

pub async fn delete<'e, E: sqlx::PgExecutor<'e>>(executor: E, id: Uuid) -> Result<u64, sqlx::Error> {
    let result = sqlx::query("DELETE FROM customers WHERE id = $1")
        .bind(id)
        .execute(executor)
        .await?;
    Ok(result.rows_affected())
}

pub async fn find_by_id<'e, E: sqlx::PgExecutor<'e>>(
    executor: E,
    id: Uuid,
) -> Result<Option<Customer>, sqlx::Error> {
    sqlx::query_as::<_, Customer>("SELECT * FROM customers WHERE id = $1")
        .bind(id)
        .fetch_optional(executor)
        .await
}

pub async fn list(
    pool: &PgPool,
    keyword: Option<&str>,
    limit: i64,
    offset: i64,
) -> Result<Vec<Customer>, sqlx::Error> {
    sqlx::query_as::<_, Customer>(
        "SELECT * FROM customers
         WHERE ($1::text IS NULL OR name ILIKE '%' || $1 || '%'
                OR tax_number ILIKE '%' || $1 || '%'
                OR contact ILIKE '%' || $1 || '%')
         ORDER BY created_at DESC LIMIT $2 OFFSET $3",
    )
    .bind(keyword)
    .bind(limit)
    .bind(offset)
    .fetch_all(pool)
    .await
}

pub async fn count(pool: &PgPool, keyword: Option<&str>) -> Result<i64, sqlx::Error> {
    let row: (i64,) = sqlx::query_as(
        "SELECT COUNT(*) FROM customers
         WHERE ($1::text IS NULL OR name ILIKE '%' || $1 || '%'
                OR tax_number ILIKE '%' || $1 || '%'
                OR contact ILIKE '%' || $1 || '%')",
    )
    .bind(keyword)
    .fetch_one(pool)
    .await?;
    Ok(row.0)
}

pub async fn list_all(pool: &PgPool) -> Result<Vec<Customer>, sqlx::Error> {
    sqlx::query_as::<_, Customer>("SELECT * FROM customers ORDER BY created_at DESC")
        .fetch_all(pool)
        .await
}

pub async fn list_by_ids(pool: &PgPool, ids: &[Uuid]) -> Result<Vec<Customer>, sqlx::Error> {
    sqlx::query_as::<_, Customer>(
        "SELECT * FROM customers WHERE id = ANY($1) ORDER BY name",
    )
    .bind(ids)
    .fetch_all(pool)
    .await
}

/// Customers whose legal representative is the given person.
pub async fn list_by_representative(
    pool: &PgPool,
    person_id: Uuid,
) -> Result<Vec<Customer>, sqlx::Error> {
    sqlx::query_as::<_, Customer>(
        "SELECT * FROM customers WHERE representative_id = $1 ORDER BY name",
    )
    .bind(person_id)
    .fetch_all(pool)
    .await
}
