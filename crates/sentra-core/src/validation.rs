//! # Validation Module
//!
//! Input validation for the admission engine.
//!
//! Validators run before business logic and before any persistence call, so
//! a rejected input never produces a write. Rejection messages are suitable
//! for direct user display.

use crate::error::ValidationError;

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

/// Longest accepted reason string.
pub const MAX_REASON_LEN: usize = 500;

// =============================================================================
// String Validators
// =============================================================================

/// Validates a required reason string (denials, adjustments, reversals,
/// rejections).
///
/// ## Rules
/// - Must not be empty or whitespace-only
/// - Must be at most [`MAX_REASON_LEN`] characters
///
/// ## Returns
/// The trimmed reason.
pub fn validate_reason(reason: &str) -> ValidationResult<String> {
    let reason = reason.trim();

    if reason.is_empty() {
        return Err(ValidationError::Required {
            field: "reason".to_string(),
        });
    }

    if reason.len() > MAX_REASON_LEN {
        return Err(ValidationError::TooLong {
            field: "reason".to_string(),
            max: MAX_REASON_LEN,
        });
    }

    Ok(reason.to_string())
}

/// Validates a UUID string identifier.
pub fn validate_uuid(field: &str, id: &str) -> ValidationResult<()> {
    if id.trim().is_empty() {
        return Err(ValidationError::Required {
            field: field.to_string(),
        });
    }

    uuid::Uuid::parse_str(id).map_err(|_| ValidationError::InvalidFormat {
        field: field.to_string(),
        reason: "must be a valid UUID".to_string(),
    })?;

    Ok(())
}

// =============================================================================
// Numeric Validators
// =============================================================================

/// Validates a quantity value (must be positive).
pub fn validate_quantity(qty: i64) -> ValidationResult<()> {
    if qty <= 0 {
        return Err(ValidationError::MustBePositive {
            field: "quantity".to_string(),
        });
    }

    Ok(())
}

/// Validates an amount in cents (zero allowed, negative rejected).
pub fn validate_amount_cents(field: &str, cents: i64) -> ValidationResult<()> {
    if cents < 0 {
        return Err(ValidationError::MustNotBeNegative {
            field: field.to_string(),
        });
    }

    Ok(())
}

/// Validates a movement value in cents (must be positive; direction, not
/// sign, encodes in/out).
pub fn validate_movement_value(cents: i64) -> ValidationResult<()> {
    if cents <= 0 {
        return Err(ValidationError::MustBePositive {
            field: "value".to_string(),
        });
    }

    Ok(())
}

/// Validates the sale totals invariant: `total = subtotal - discount`,
/// all three non-negative.
pub fn validate_sale_totals(
    subtotal_cents: i64,
    discount_cents: i64,
    total_cents: i64,
) -> ValidationResult<()> {
    validate_amount_cents("subtotal", subtotal_cents)?;
    validate_amount_cents("discount", discount_cents)?;
    validate_amount_cents("total", total_cents)?;

    if subtotal_cents - discount_cents != total_cents {
        return Err(ValidationError::InvalidFormat {
            field: "total".to_string(),
            reason: "must equal subtotal minus discount".to_string(),
        });
    }

    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_reason() {
        assert_eq!(validate_reason("  limite excedido  ").unwrap(), "limite excedido");

        assert!(validate_reason("").is_err());
        assert!(validate_reason("   ").is_err());
        assert!(validate_reason(&"x".repeat(MAX_REASON_LEN + 1)).is_err());
    }

    #[test]
    fn test_validate_uuid() {
        assert!(validate_uuid("sale_id", "550e8400-e29b-41d4-a716-446655440000").is_ok());
        assert!(validate_uuid("sale_id", "").is_err());
        assert!(validate_uuid("sale_id", "not-a-uuid").is_err());
    }

    #[test]
    fn test_validate_quantity() {
        assert!(validate_quantity(1).is_ok());
        assert!(validate_quantity(0).is_err());
        assert!(validate_quantity(-3).is_err());
    }

    #[test]
    fn test_validate_amount_cents() {
        assert!(validate_amount_cents("total", 0).is_ok());
        assert!(validate_amount_cents("total", 1099).is_ok());
        assert!(validate_amount_cents("total", -1).is_err());
    }

    #[test]
    fn test_validate_movement_value() {
        assert!(validate_movement_value(1).is_ok());
        assert!(validate_movement_value(0).is_err());
        assert!(validate_movement_value(-500).is_err());
    }

    #[test]
    fn test_validate_sale_totals() {
        assert!(validate_sale_totals(10_000, 1_000, 9_000).is_ok());
        assert!(validate_sale_totals(10_000, 0, 10_000).is_ok());

        assert!(validate_sale_totals(10_000, 1_000, 9_500).is_err());
        assert!(validate_sale_totals(-1, 0, -1).is_err());
        assert!(validate_sale_totals(10_000, -500, 10_500).is_err());
    }
}
