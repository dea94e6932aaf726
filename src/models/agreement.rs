use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub const NUMBER_PREFIX: &str = "AGT";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "agreement_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum AgreementStatus {
    Active,
    Expired,
    Cancelled,
}

#[derive(Debug, Clone, sqlx::FromRow, Serialize, Deserialize)]
pub struct Agreement {
    pub id: Uuid,
    pub customer_id: Uuid,
    pub agreement_number: String,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    /// monthly / quarterly / yearly
    pub fee_type: Option<String>,
    pub amount: f64,
    pub status: AgreementStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Daily prefix for generated numbers, e.g. `AGT20260105`.
pub fn number_prefix(day: NaiveDate) -> String {
    format!("{NUMBER_PREFIX}{}", day.format("%Y%m%d"))
}

/// Next number in the day's sequence given the highest number issued so far
/// with the same prefix. Unparseable or exhausted suffixes restart the
/// sequence at 1.
pub fn next_number(prefix: &str, last: Option<&str>) -> String {
    let serial = last
        .and_then(|n| n.strip_prefix(prefix))
        .and_then(|suffix| suffix.parse::<u64>().ok())
        .and_then(|n| n.checked_add(1))
        .unwrap_or(1);
    format!("{prefix}{serial:04}")
}
