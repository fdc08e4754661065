//! # Credit Admission
//!
//! The pure decision at the heart of the credit admission controller:
//! given a customer's limit, their current open debt, and the total of the
//! sale under evaluation, decide whether the sale is admitted.
//!
//! Debt aggregation and the review lifecycle (approve/deny/adjust) live in
//! the persistence layer; this module only decides.

use serde::{Deserialize, Serialize};

use crate::money::Money;

// =============================================================================
// Credit Decision
// =============================================================================

/// Admission decision for a credit-bearing sale.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreditDecision {
    pub allowed: bool,
    /// Human-readable rejection reason, formatted for direct display.
    pub reason: Option<String>,
    pub credit_limit_cents: i64,
    pub current_debt_cents: i64,
    /// On allow: post-sale headroom (`limit - debt - total`).
    /// On deny: the credit still available (`limit - debt`).
    pub available_credit_cents: i64,
}

// =============================================================================
// Admission
// =============================================================================

/// Decides whether a customer may make a credit sale.
///
/// ## Rules
/// - No customer on the sale: denied, "customer not specified".
/// - `credit_limit <= 0`: no limit is configured, which means unlimited,
///   not zero. Allowed, with zero debt/available reported.
/// - Otherwise deny when `debt + total > limit`, with a reason citing the
///   limit, the current balance and the available credit in the tenant's
///   currency; allow otherwise, reporting post-sale headroom.
///
/// `current_debt` is the caller's read of the customer's open debt. Two
/// concurrent admissions can both read the same debt and both pass before
/// either sale commits, transiently exceeding the limit; callers wanting a
/// hard guarantee serialize admission per customer.
pub fn evaluate_admission(
    customer_id: Option<&str>,
    credit_limit: Money,
    current_debt: Money,
    sale_total: Money,
    currency_symbol: &str,
) -> CreditDecision {
    let has_customer = customer_id.is_some_and(|id| !id.trim().is_empty());
    if !has_customer {
        return CreditDecision {
            allowed: false,
            reason: Some("Credit sale denied: customer not specified".to_string()),
            credit_limit_cents: credit_limit.cents(),
            current_debt_cents: 0,
            available_credit_cents: 0,
        };
    }

    if credit_limit.cents() <= 0 {
        return CreditDecision {
            allowed: true,
            reason: None,
            credit_limit_cents: credit_limit.cents(),
            current_debt_cents: 0,
            available_credit_cents: 0,
        };
    }

    let available = credit_limit - current_debt;
    let new_debt = current_debt + sale_total;

    if new_debt > credit_limit {
        return CreditDecision {
            allowed: false,
            reason: Some(format!(
                "Credit limit exceeded: limit {}, current balance {}, available {}",
                credit_limit.format_with(currency_symbol),
                current_debt.format_with(currency_symbol),
                available.format_with(currency_symbol),
            )),
            credit_limit_cents: credit_limit.cents(),
            current_debt_cents: current_debt.cents(),
            available_credit_cents: available.cents(),
        };
    }

    CreditDecision {
        allowed: true,
        reason: None,
        credit_limit_cents: credit_limit.cents(),
        current_debt_cents: current_debt.cents(),
        available_credit_cents: (available - sale_total).cents(),
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
