use std::sync::LazyLock;

use chrono::NaiveDate;
use regex::Regex;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::models::customer::{CREDIT_RATINGS, CUSTOMER_TYPES};
use crate::models::{AgreementStatus, AuditAction, AuditLog, ResourceType, TaskStatus};

static PERIOD_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d{4}-(0[1-9]|1[0-2])$").expect("valid period regex"));

// Every payload field is optional: on create, required fields are checked by
// `validate_create`; on update, absent fields leave their column untouched.

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CustomerChange {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub customer_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tax_number: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub contact: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub business_scope: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub credit_rating: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub representative_id: Option<Uuid>,
}

impl CustomerChange {
    pub fn validate(&self) -> Result<(), String> {
        if self.name.as_deref().is_some_and(|n| n.trim().is_empty()) {
            return Err("Customer name must not be empty".to_string());
        }
        if let Some(t) = &self.customer_type {
            if !CUSTOMER_TYPES.contains(&t.as_str()) {
                return Err(format!("Unknown customer type '{t}'"));
            }
        }
        if let Some(r) = &self.credit_rating {
            if !CREDIT_RATINGS.contains(&r.as_str()) {
                return Err(format!("Unknown credit rating '{r}'"));
            }
        }
        Ok(())
    }

    pub fn validate_create(&self) -> Result<(), String> {
        if self.name.is_none() {
            return Err("Customer name is required".to_string());
        }
        self.validate()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PersonChange {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id_card: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_service_person: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub representative_customer_ids: Option<Vec<Uuid>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub investor_customer_ids: Option<Vec<Uuid>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub service_customer_ids: Option<Vec<Uuid>>,
}

impl PersonChange {
    pub fn validate(&self) -> Result<(), String> {
        if self.name.as_deref().is_some_and(|n| n.trim().is_empty()) {
            return Err("Name must not be empty".to_string());
        }
        if self.phone.as_deref().is_some_and(|p| p.trim().is_empty()) {
            return Err("Phone must not be empty".to_string());
        }
        Ok(())
    }

    pub fn validate_create(&self) -> Result<(), String> {
        if self.name.is_none() || self.phone.is_none() {
            return Err("Name and phone are required".to_string());
        }
        self.validate()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TaskChange {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub customer_id: Option<Uuid>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<TaskStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub due_date: Option<NaiveDate>,
}

impl TaskChange {
    pub fn validate(&self) -> Result<(), String> {
        if self.title.as_deref().is_some_and(|t| t.trim().is_empty()) {
            return Err("Task title must not be empty".to_string());
        }
        Ok(())
    }

    pub fn validate_create(&self) -> Result<(), String> {
        if self.customer_id.is_none() || self.title.is_none() {
            return Err("customer_id and title are required".to_string());
        }
        self.validate()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AgreementChange {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub customer_id: Option<Uuid>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub agreement_number: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_date: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_date: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fee_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub amount: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<AgreementStatus>,
}

impl AgreementChange {
    pub fn validate(&self) -> Result<(), String> {
        if let (Some(start), Some(end)) = (self.start_date, self.end_date) {
            if end < start {
                return Err("Agreement end date precedes its start date".to_string());
            }
        }
        if self.amount.is_some_and(|a| a < 0.0) {
            return Err("Agreement amount must not be negative".to_string());
        }
        Ok(())
    }

    pub fn validate_create(&self) -> Result<(), String> {
        if self.customer_id.is_none() {
            return Err("customer_id is required".to_string());
        }
        self.validate()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PaymentChange {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub customer_id: Option<Uuid>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub agreement_id: Option<Uuid>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub amount: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payment_date: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payment_method: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub period: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub remark: Option<String>,
}

impl PaymentChange {
    pub fn validate(&self) -> Result<(), String> {
        if self.amount.is_some_and(|a| a <= 0.0) {
            return Err("Payment amount must be positive".to_string());
        }
        if let Some(period) = &self.period {
            if !PERIOD_RE.is_match(period) {
                return Err("Payment period must look like YYYY-MM".to_string());
            }
        }
        Ok(())
    }

    pub fn validate_create(&self) -> Result<(), String> {
        if self.customer_id.is_none() || self.amount.is_none() || self.payment_date.is_none() {
            return Err("customer_id, amount and payment_date are required".to_string());
        }
        self.validate()
    }
}

/// A change payload tagged with the resource it targets.
#[derive(Debug, Clone, PartialEq)]
pub enum Payload {
    Customer(CustomerChange),
    Person(PersonChange),
    Task(TaskChange),
    Agreement(AgreementChange),
    Payment(PaymentChange),
}

impl Payload {
    pub fn resource_type(&self) -> ResourceType {
        match self {
            Payload::Customer(_) => ResourceType::Customer,
            Payload::Person(_) => ResourceType::Person,
            Payload::Task(_) => ResourceType::Task,
            Payload::Agreement(_) => ResourceType::Agreement,
            Payload::Payment(_) => ResourceType::Payment,
        }
    }

    pub fn validate(&self) -> Result<(), String> {
        match self {
            Payload::Customer(c) => c.validate(),
            Payload::Person(p) => p.validate(),
            Payload::Task(t) => t.validate(),
            Payload::Agreement(a) => a.validate(),
            Payload::Payment(p) => p.validate(),
        }
    }

    pub fn validate_create(&self) -> Result<(), String> {
        match self {
            Payload::Customer(c) => c.validate_create(),
            Payload::Person(p) => p.validate_create(),
            Payload::Task(t) => t.validate_create(),
            Payload::Agreement(a) => a.validate_create(),
            Payload::Payment(p) => p.validate_create(),
        }
    }

    /// The JSON snapshot stored as an audit entry's `new_value`.
    pub fn to_snapshot(&self) -> Result<Value, serde_json::Error> {
        match self {
            Payload::Customer(c) => serde_json::to_value(c),
            Payload::Person(p) => serde_json::to_value(p),
            Payload::Task(t) => serde_json::to_value(t),
            Payload::Agreement(a) => serde_json::to_value(a),
            Payload::Payment(p) => serde_json::to_value(p),
        }
    }

    /// Rebuild a payload from a stored snapshot. Keys the payload does not
    /// know (embedded relations such as `customer` or `payments`) are dropped.
    pub fn from_snapshot(
        resource_type: ResourceType,
        snapshot: &Value,
    ) -> Result<Self, serde_json::Error> {
        fn decode<T: DeserializeOwned>(v: &Value) -> Result<T, serde_json::Error> {
            T::deserialize(v)
        }

        Ok(match resource_type {
            ResourceType::Customer => Payload::Customer(decode(snapshot)?),
            ResourceType::Person => Payload::Person(decode(snapshot)?),
            ResourceType::Task => Payload::Task(decode(snapshot)?),
            ResourceType::Agreement => Payload::Agreement(decode(snapshot)?),
            ResourceType::Payment => Payload::Payment(decode(snapshot)?),
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Change {
    Create(Payload),
    Update { id: Uuid, payload: Payload },
    Delete { resource_type: ResourceType, id: Uuid },
}

impl Change {
    pub fn action(&self) -> AuditAction {
        match self {
            Change::Create(_) => AuditAction::Create,
            Change::Update { .. } => AuditAction::Update,
            Change::Delete { .. } => AuditAction::Delete,
        }
    }

    pub fn resource_type(&self) -> ResourceType {
        match self {
            Change::Create(payload) | Change::Update { payload, .. } => payload.resource_type(),
            Change::Delete { resource_type, .. } => *resource_type,
        }
    }

    pub fn resource_id(&self) -> Option<Uuid> {
        match self {
            Change::Create(_) => None,
            Change::Update { id, .. } | Change::Delete { id, .. } => Some(*id),
        }
    }

    pub fn new_value(&self) -> Result<Option<Value>, serde_json::Error> {
        match self {
            Change::Create(payload) | Change::Update { payload, .. } => {
                payload.to_snapshot().map(Some)
            }
            Change::Delete { .. } => Ok(None),
        }
    }

    /// Reconstruct the change recorded in a deferred audit entry.
    pub fn from_entry(entry: &AuditLog) -> Result<Self, String> {
        let payload = || -> Result<Payload, String> {
            let snapshot = entry
                .new_value
                .as_ref()
                .ok_or_else(|| "new_value is required".to_string())?;
            Payload::from_snapshot(entry.resource_type, snapshot)
                .map_err(|e| format!("Invalid {} snapshot: {e}", entry.resource_type))
        };
        let resource_id = || {
            entry
                .resource_id
                .ok_or_else(|| "resource_id is required".to_string())
        };

        match entry.action {
            AuditAction::Create => Ok(Change::Create(payload()?)),
            AuditAction::Update => Ok(Change::Update {
                id: resource_id()?,
                payload: payload()?,
            }),
            AuditAction::Delete => Ok(Change::Delete {
                resource_type: entry.resource_type,
                id: resource_id()?,
            }),
            AuditAction::Approve | AuditAction::Reject => {
                Err(format!("{} entries cannot be replayed", entry.action))
            }
        }
    }
}
