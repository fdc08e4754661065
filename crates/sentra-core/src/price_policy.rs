//! # Price Policy Validator
//!
//! Evaluates a single line item's price against the tenant's discount and
//! minimum-price rules.
//!
//! ## Evaluation Order
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │  evaluate_price(original, final, minimum?, settings)            │
//! │                                                                 │
//! │  1. policy disabled?        ──► Ok, no approval                 │
//! │  2. compute discount bps    (original <= 0 guards to 0)         │
//! │  3. final < minimum?        ──► BelowMinimum, approval          │
//! │  4. bps > max discount?     ──► DiscountExceeded, approval      │
//! │  5. final < approval floor? ──► Ok, but approval                │
//! │  6. otherwise               ──► Ok, no approval                 │
//! └─────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The minimum-price check runs before the discount-cap check and wins
//! when both would fire. Step 5 catches low-value sales that need a human
//! look even without an explicit discount violation.
//!
//! This is a total function: every input combination, including zero and
//! negative prices, yields exactly one of the three statuses. It never
//! returns an error.

use serde::{Deserialize, Serialize};

use crate::money::{discount_bps, format_bps, Money};
use crate::types::{PriceControlSettings, PriceStatus};

// =============================================================================
// Evaluation Result
// =============================================================================

/// Outcome of evaluating one line item against the price policy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriceEvaluation {
    pub status: PriceStatus,
    /// True when the item must be resolved by an approver before the sale
    /// can be invoiced. Can be true even with `status == Ok` (approval
    /// floor).
    pub needs_approval: bool,
    /// Human-readable explanation when approval is needed.
    pub message: Option<String>,
    /// Computed discount in basis points.
    pub discount_bps: i64,
}

impl PriceEvaluation {
    fn ok(discount_bps: i64) -> Self {
        PriceEvaluation {
            status: PriceStatus::Ok,
            needs_approval: false,
            message: None,
            discount_bps,
        }
    }
}

// =============================================================================
// Evaluation
// =============================================================================

/// Evaluates a line item's negotiated price against the tenant policy.
///
/// ## Arguments
/// * `original` - list price per unit
/// * `final_price` - negotiated price per unit
/// * `minimum_price` - per-item floor, when one is configured
/// * `settings` - the tenant's price control configuration
pub fn evaluate_price(
    original: Money,
    final_price: Money,
    minimum_price: Option<Money>,
    settings: &PriceControlSettings,
) -> PriceEvaluation {
    // Price control is opt-in per tenant.
    if !settings.enabled {
        return PriceEvaluation::ok(0);
    }

    let bps = discount_bps(original, final_price);
    let symbol = settings.currency_symbol.as_str();

    if let Some(minimum) = minimum_price {
        // Checked before the discount cap: a price can be under minimum
        // while still inside the nominal cap, and the minimum wins.
        if final_price < minimum {
            return PriceEvaluation {
                status: PriceStatus::BelowMinimum,
                needs_approval: true,
                message: Some(format!(
                    "Price {} is below the minimum price {}",
                    final_price.format_with(symbol),
                    minimum.format_with(symbol),
                )),
                discount_bps: bps,
            };
        }
    }

    if bps > settings.max_discount_bps {
        return PriceEvaluation {
            status: PriceStatus::DiscountExceeded,
            needs_approval: true,
            message: Some(format!(
                "Discount {} exceeds the maximum allowed {}",
                format_bps(bps),
                format_bps(settings.max_discount_bps),
            )),
            discount_bps: bps,
        };
    }

    // Low-value sales need a human look even without a discount violation.
    if settings.approval_floor_cents > 0
        && final_price.cents() < settings.approval_floor_cents
    {
        return PriceEvaluation {
            status: PriceStatus::Ok,
            needs_approval: true,
            message: Some(format!(
                "Price {} is below the approval-free floor {}",
                final_price.format_with(symbol),
                Money::from_cents(settings.approval_floor_cents).format_with(symbol),
            )),
            discount_bps: bps,
        };
    }

    PriceEvaluation::ok(bps)
}

// =============================================================================
// Unit Tests
// =============================================================================
