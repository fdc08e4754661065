//! # Repository Module
//!
//! Repository implementations for the admission & reversal engine.
//!
//! Each repository wraps the shared pool behind a focused API and owns the
//! transaction boundaries of its operations: a state transition and its
//! audit entry always commit together, and conditional updates
//! (`rows_affected()` guards) carry the concurrency contract instead of
//! application-level locks.
//!
//! ## Available Repositories
//!
//! - [`sale::SaleRepository`] - Sales, items, pendency codes, price approvals
//! - [`credit::CreditRepository`] - Debt, admission, review lifecycle
//! - [`movement::MovementRepository`] - Ledger movements and reversals
//! - [`audit::CreditLogRepository`] - Append-only credit log
//! - [`settings::SettingsRepository`] - Tenant settings and customer limits

pub mod audit;
pub mod credit;
pub mod movement;
pub mod sale;
pub mod settings;
