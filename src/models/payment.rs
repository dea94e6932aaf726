use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, sqlx::FromRow, Serialize, Deserialize)]
pub struct Payment {
    pub id: Uuid,
    pub customer_id: Uuid,
    pub agreement_id: Option<Uuid>,
    pub amount: f64,
    pub payment_date: NaiveDate,
    pub payment_method: Option<String>,
    /// Billing period the payment covers, `YYYY-MM`.
    pub period: Option<String>,
    pub remark: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Payment {
    pub fn label(&self) -> String {
        format!("{} - {:.2}", self.payment_date, self.amount)
    }
}
