pub mod admin_user;
pub mod agreement;
pub mod audit_log;
pub mod customer;
pub mod payment;
pub mod person;
pub mod task;

pub use admin_user::{AdminUser, Role};
pub use agreement::{Agreement, AgreementStatus};
pub use audit_log::{AuditAction, AuditLog, AuditLogView, AuditStatus, ResourceType};
pub use customer::Customer;
pub use payment::Payment;
pub use person::Person;
pub use task::{Task, TaskStatus};
