use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub const CUSTOMER_TYPES: &[&str] = &[
    "limited_company",
    "sole_proprietorship",
    "partnership",
    "individual_business",
];

/// Tax credit ratings, best to worst; `M` marks newly registered companies.
pub const CREDIT_RATINGS: &[&str] = &["A", "B", "C", "D", "M"];

#[derive(Debug, Clone, sqlx::FromRow, Serialize, Deserialize)]
pub struct Customer {
    pub id: Uuid,
    pub name: String,
    pub customer_type: Option<String>,
    pub tax_number: Option<String>,
    pub contact: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub address: Option<String>,
    pub business_scope: Option<String>,
    pub credit_rating: Option<String>,
    pub representative_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
