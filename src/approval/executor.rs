use async_trait::async_trait;
use chrono::Utc;
use sqlx::PgConnection;
use uuid::Uuid;

use super::change::{
    AgreementChange, Change, CustomerChange, Payload, PaymentChange, PersonChange, TaskChange,
};
use crate::auth::password;
use crate::db;
use crate::error::{write_error, AppError};
use crate::models::agreement;
use crate::models::{AuditLog, ResourceType, Role};

/// Initial password for logins provisioned for service staff.
pub const SERVICE_PERSON_DEFAULT_PASSWORD: &str = "123456";

/// Writes one resource type's payload to its table.
#[async_trait]
trait ResourceWriter: Send + Sync {
    async fn insert(&self, conn: &mut PgConnection) -> Result<Uuid, AppError>;
    async fn patch(&self, conn: &mut PgConnection, id: Uuid) -> Result<Uuid, AppError>;
}

impl Payload {
    fn writer(&self) -> &dyn ResourceWriter {
        match self {
            Payload::Customer(c) => c,
            Payload::Person(p) => p,
            Payload::Task(t) => t,
            Payload::Agreement(a) => a,
            Payload::Payment(p) => p,
        }
    }
}

/// Apply `change` on `conn` and return the id of the affected row.
pub async fn apply(conn: &mut PgConnection, change: &Change) -> Result<Uuid, AppError> {
    match change {
        Change::Create(payload) => {
            payload.validate_create().map_err(AppError::BadRequest)?;
            payload.writer().insert(conn).await
        }
        Change::Update { id, payload } => {
            payload.validate().map_err(AppError::BadRequest)?;
            payload.writer().patch(conn, *id).await
        }
        Change::Delete { resource_type, id } => remove(conn, *resource_type, *id).await,
    }
}

/// Re-run the change recorded in a pending entry. A replayed create
/// back-fills the entry's `resource_id` with the new row's id.
pub async fn replay(conn: &mut PgConnection, entry: &AuditLog) -> Result<Uuid, AppError> {
    let change = Change::from_entry(entry).map_err(AppError::BadRequest)?;
    let resource_id = apply(conn, &change).await?;

    if matches!(change, Change::Create(_)) {
        db::audit_logs::set_resource_id(&mut *conn, entry.id, resource_id).await?;
    }

    tracing::debug!(
        "Replayed {} {} from audit entry {}",
        entry.action,
        entry.resource_type,
        entry.id
    );
    Ok(resource_id)
}

async fn remove(
    conn: &mut PgConnection,
    resource_type: ResourceType,
    id: Uuid,
) -> Result<Uuid, AppError> {
    let deleted = match resource_type {
        ResourceType::Customer => {
            db::people::unlink_customer(&mut *conn, id).await?;
            db::customers::delete(&mut *conn, id).await?
        }
        ResourceType::Person => db::people::delete(&mut *conn, id).await?,
        ResourceType::Task => db::tasks::delete(&mut *conn, id).await?,
        ResourceType::Agreement => db::agreements::delete(&mut *conn, id).await?,
        ResourceType::Payment => db::payments::delete(&mut *conn, id).await?,
    };

    if deleted == 0 {
        return Err(not_found(resource_type));
    }
    Ok(id)
}

fn not_found(resource_type: ResourceType) -> AppError {
    AppError::NotFound(format!("{resource_type} not found"))
}

/// Give a service person a login named after them, if they lack one.
async fn ensure_login(conn: &mut PgConnection, person_id: Uuid, name: &str) -> Result<(), AppError> {
    if db::admin_users::find_by_person(&mut *conn, person_id)
        .await?
        .is_some()
    {
        return Ok(());
    }

    let hash = password::hash(SERVICE_PERSON_DEFAULT_PASSWORD).map_err(AppError::Internal)?;
    db::admin_users::create(&mut *conn, name, &hash, Role::ServicePerson, Some(person_id))
        .await
        .map_err(write_error)?;

    tracing::info!("Provisioned login '{name}' for service person {person_id}");
    Ok(())
}

#[async_trait]
impl ResourceWriter for CustomerChange {
    async fn insert(&self, conn: &mut PgConnection) -> Result<Uuid, AppError> {
        let customer = db::customers::insert(&mut *conn, self)
            .await
            .map_err(write_error)?;
        if let Some(person_id) = customer.representative_id {
            db::people::link_representative(&mut *conn, person_id, customer.id).await?;
        }
        Ok(customer.id)
    }

    async fn patch(&self, conn: &mut PgConnection, id: Uuid) -> Result<Uuid, AppError> {
        let customer = db::customers::update(&mut *conn, id, self)
            .await
            .map_err(write_error)?
            .ok_or_else(|| not_found(ResourceType::Customer))?;
        if let Some(person_id) = self.representative_id {
            db::people::link_representative(&mut *conn, person_id, customer.id).await?;
        }
        Ok(customer.id)
    }
}

#[async_trait]
impl ResourceWriter for PersonChange {
    async fn insert(&self, conn: &mut PgConnection) -> Result<Uuid, AppError> {
        let person = db::people::insert(&mut *conn, self)
            .await
            .map_err(write_error)?;
        if person.is_service_person {
            ensure_login(conn, person.id, &person.name).await?;
        }
        Ok(person.id)
    }

    async fn patch(&self, conn: &mut PgConnection, id: Uuid) -> Result<Uuid, AppError> {
        let person = db::people::update(&mut *conn, id, self)
            .await
            .map_err(write_error)?
            .ok_or_else(|| not_found(ResourceType::Person))?;
        if self.is_service_person == Some(true) {
            ensure_login(conn, person.id, &person.name).await?;
        }
        Ok(person.id)
    }
}

#[async_trait]
impl ResourceWriter for TaskChange {
    async fn insert(&self, conn: &mut PgConnection) -> Result<Uuid, AppError> {
        let task = db::tasks::insert(&mut *conn, self)
            .await
            .map_err(write_error)?;
        Ok(task.id)
    }

    async fn patch(&self, conn: &mut PgConnection, id: Uuid) -> Result<Uuid, AppError> {
        let task = db::tasks::update(&mut *conn, id, self)
            .await
            .map_err(write_error)?
            .ok_or_else(|| not_found(ResourceType::Task))?;
        Ok(task.id)
    }
}

#[async_trait]
impl ResourceWriter for AgreementChange {
    async fn insert(&self, conn: &mut PgConnection) -> Result<Uuid, AppError> {
        let number = match self.agreement_number.as_deref().map(str::trim) {
            Some(n) if !n.is_empty() => n.to_string(),
            _ => {
                let prefix = agreement::number_prefix(Utc::now().date_naive());
                let last = db::agreements::last_number_with_prefix(&mut *conn, &prefix).await?;
                agreement::next_number(&prefix, last.as_deref())
            }
        };

        let created = db::agreements::insert(&mut *conn, self, &number)
            .await
            .map_err(write_error)?;
        Ok(created.id)
    }

    async fn patch(&self, conn: &mut PgConnection, id: Uuid) -> Result<Uuid, AppError> {
        let updated = db::agreements::update(&mut *conn, id, self)
            .await
            .map_err(write_error)?
            .ok_or_else(|| not_found(ResourceType::Agreement))?;
        Ok(updated.id)
    }
}

#[async_trait]
impl ResourceWriter for PaymentChange {
    async fn insert(&self, conn: &mut PgConnection) -> Result<Uuid, AppError> {
        let payment = db::payments::insert(&mut *conn, self)
            .await
            .map_err(write_error)?;
        Ok(payment.id)
    }

    async fn patch(&self, conn: &mut PgConnection, id: Uuid) -> Result<Uuid, AppError> {
        let payment = db::payments::update(&mut *conn, id, self)
            .await
            .map_err(write_error)?
            .ok_or_else(|| not_found(ResourceType::Payment))?;
        Ok(payment.id)
    }
}
