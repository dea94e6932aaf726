pub mod admin_users;
pub mod agreements;
pub mod audit_logs;
pub mod customers;
pub mod payments;
pub mod people;
pub mod statistics;
pub mod tasks;
