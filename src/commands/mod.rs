pub mod accounting;
pub mod auth;
pub mod bank;
pub mod bulk_import;
pub mod cash_register;
pub mod checks;
pub mod dashboard;
pub mod employees;
pub mod haccp;
pub mod hr;
pub mod invoices;
pub mod payment;
pub mod portal;
pub mod reconciliation;
pub mod suppliers;
pub mod treasury;
pub mod utils;
pub mod vat;
pub mod warehouse;
