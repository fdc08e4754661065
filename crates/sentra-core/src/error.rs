//! # Error Types
//!
//! Domain-specific error types for sentra-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                         Error Types                             │
//! │                                                                 │
//! │  sentra-core errors (this file)                                 │
//! │  ├── CoreError        - Business rule violations                │
//! │  └── ValidationError  - Input validation failures               │
//! │                                                                 │
//! │  sentra-db errors (separate crate)                              │
//! │  └── DbError          - Persistence and state-conflict failures │
//! │                                                                 │
//! │  Flow: ValidationError → CoreError → DbError → caller           │
//! └─────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Design Principles
//! 1. Use `thiserror` for derive macros (not manual impl)
//! 2. Include context in error messages (ids, amounts, field names)
//! 3. Errors are enum variants, never bare strings
//! 4. Every rejection message is suitable for direct user display

use thiserror::Error;

// =============================================================================
// Core Error
// =============================================================================

/// Core business logic errors.
///
/// These represent business rule violations detected before any write.
#[derive(Debug, Error)]
pub enum CoreError {
    /// The acting identity is not in the tenant's approver set.
    #[error("User {user_id} is not authorized to approve for this tenant")]
    NotAnApprover { user_id: String },

    /// A sale's monetary fields do not satisfy `total = subtotal - discount`.
    #[error(
        "Sale totals are inconsistent: subtotal {subtotal_cents} - discount \
         {discount_cents} != total {total_cents}"
    )]
    InconsistentTotals {
        subtotal_cents: i64,
        discount_cents: i64,
        total_cents: i64,
    },

    /// Validation error (wraps ValidationError).
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
///
/// These occur when caller input doesn't meet requirements. They are raised
/// before business logic runs and before any persistence call.
#[derive(Debug, Error)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Field value is too long.
    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    /// Numeric value is out of range.
    #[error("{field} must be between {min} and {max}")]
    OutOfRange { field: String, min: i64, max: i64 },

    /// Value must be positive.
    #[error("{field} must be positive")]
    MustBePositive { field: String },

    /// Value must not be negative.
    #[error("{field} must not be negative")]
    MustNotBeNegative { field: String },

    /// Invalid format (e.g., invalid UUID).
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;

// =============================================================================
// Unit Tests
// =============================================================================
