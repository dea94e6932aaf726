use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, sqlx::FromRow, Serialize, Deserialize)]
pub struct Person {
    pub id: Uuid,
    pub name: String,
    pub phone: String,
    pub id_card: Option<String>,
    pub is_service_person: bool,
    pub representative_customer_ids: Vec<Uuid>,
    pub investor_customer_ids: Vec<Uuid>,
    pub service_customer_ids: Vec<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
