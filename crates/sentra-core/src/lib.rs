//! # sentra-core: Pure Business Logic for the Admission & Reversal Engine
//!
//! This crate decides; it never touches I/O. It answers whether a sale
//! needs stock separation, credit review, or discount approval before
//! invoicing, and provides the pure calculations behind the credit
//! admission decision and the ledger reversal semantics.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                    Surrounding Application                      │
//! │      checkout flow, review screens, back-office actions         │
//! └─────────────────────────────┬───────────────────────────────────┘
//!                               │
//! ┌─────────────────────────────▼───────────────────────────────────┐
//! │               ★ sentra-core (THIS CRATE) ★                      │
//! │                                                                 │
//! │  ┌─────────┐ ┌──────────┐ ┌──────────────┐ ┌────────────────┐   │
//! │  │  types  │ │ pendency │ │ price_policy │ │     credit     │   │
//! │  │  money  │ │  E C D   │ │  validator   │ │   admission    │   │
//! │  └─────────┘ └──────────┘ └──────────────┘ └────────────────┘   │
//! │                                                                 │
//! │   NO I/O • NO DATABASE • NO NETWORK • PURE FUNCTIONS            │
//! └─────────────────────────────┬───────────────────────────────────┘
//!                               │
//! ┌─────────────────────────────▼───────────────────────────────────┐
//! │                    sentra-db (Database Layer)                   │
//! │        SQLite repositories, transactions, audit log             │
//! └─────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Domain types (Sale, SaleItem, FinancialMovement, etc.)
//! - [`money`] - Integer-cents Money and discount math
//! - [`pendency`] - The E/C/D code set gating invoicing
//! - [`price_policy`] - Discount/minimum-price validation
//! - [`credit`] - Credit admission decision
//! - [`validation`] - Input validation
//! - [`error`] - Domain error types
//!
//! ## Design Principles
//!
//! 1. **Pure functions**: deterministic, same input = same output
//! 2. **No I/O**: database, network, filesystem access is forbidden here
//! 3. **Integer money**: monetary values are cents (i64), never floats
//! 4. **Explicit errors**: typed errors, never strings or panics

// =============================================================================
// Module Declarations
// =============================================================================

pub mod credit;
pub mod error;
pub mod money;
pub mod pendency;
pub mod price_policy;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use credit::{evaluate_admission, CreditDecision};
pub use error::{CoreError, CoreResult, ValidationError};
pub use money::Money;
pub use pendency::{PendencyCode, PendencySet};
pub use price_policy::{evaluate_price, PriceEvaluation};
pub use types::*;
