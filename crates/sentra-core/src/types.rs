//! # Domain Types
//!
//! Core domain types for the admission & reversal engine.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                            │
//! │                                                                 │
//! │  ┌──────────────┐  ┌──────────────┐  ┌────────────────────┐     │
//! │  │     Sale     │  │   SaleItem   │  │ FinancialMovement  │     │
//! │  │ ───────────  │  │ ───────────  │  │ ─────────────────  │     │
//! │  │ id (UUID)    │  │ id (UUID)    │  │ id (UUID)          │     │
//! │  │ pendency set │  │ price_status │  │ direction in|out   │     │
//! │  │ credit_review│  │ final price  │  │ reversal metadata  │     │
//! │  └──────────────┘  └──────────────┘  └────────────────────┘     │
//! │                                                                 │
//! │  ┌──────────────┐  ┌──────────────────────┐  ┌──────────────┐   │
//! │  │ PaymentMethod│  │ PriceControlSettings │  │ CreditLog    │    │
//! │  │ enumerated + │  │ per-tenant policy    │  │ append-only  │    │
//! │  │ credit flag  │  │ + approver set       │  │ audit trail  │    │
//! │  └──────────────┘  └──────────────────────┘  └──────────────┘   │
//! └─────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Ownership: a `Sale` owns its `SaleItem`s and its pendency-code set. A
//! `FinancialMovement` is owned by the ledger once posted; reversal actions
//! reference it, never edit its value or direction. `CreditLogEntry` rows
//! reference but do not own the sale/movement they describe.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::money::Money;
use crate::pendency::PendencySet;

// =============================================================================
// Payment Status
// =============================================================================

/// Payment collection state of a sale. `Pending` and `Overdue` sales count
/// toward the customer's open debt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    Pending,
    Paid,
    Overdue,
}

impl Default for PaymentStatus {
    fn default() -> Self {
        PaymentStatus::Pending
    }
}

// =============================================================================
// Credit Review State
// =============================================================================

/// Review state of a credit-bearing sale.
///
/// `Approved` and `Denied` are terminal for a review cycle; an adjustment
/// request opens a fresh `Pending` cycle linked to the prior decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[serde(rename_all = "snake_case")]
pub enum CreditReview {
    Pending,
    Approved,
    Denied,
}

// =============================================================================
// Price Status
// =============================================================================

/// Item-level outcome of price policy evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[serde(rename_all = "snake_case")]
pub enum PriceStatus {
    /// Price is within policy.
    Ok,
    /// Discount exceeds the tenant's maximum seller discount.
    DiscountExceeded,
    /// Final price is under the configured minimum price.
    BelowMinimum,
}

impl Default for PriceStatus {
    fn default() -> Self {
        PriceStatus::Ok
    }
}

// =============================================================================
// Payment Method
// =============================================================================

/// Enumerated payment method with a fixed credit-review attribute.
///
/// Free-text labels from upstream systems are classified once, at ingestion,
/// by [`PaymentMethod::from_label`]; the sale row stores the enumerated
/// value, so every downstream check is exact.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    Cash,
    Pix,
    DebitCard,
    /// Card payment on an external terminal; exposure sits with the card
    /// issuer, not with the seller.
    CreditCard,
    /// Bank slip collected after delivery.
    Boleto,
    /// Open-account terms ("a prazo").
    OnAccount,
    /// House credit carried by the store itself.
    StoreCredit,
    /// Mercantile trade note ("duplicata").
    TradeNote,
    Check,
    /// Seller-financed installment plan.
    Installments,
    /// Unrecognized label; never credit-bearing.
    Other,
}

impl PaymentMethod {
    /// Whether sales paid with this method go through credit review.
    ///
    /// The vocabulary is fixed: boleto, open account, store credit, trade
    /// note, check and installment plans expose the seller to the
    /// customer's credit; everything else settles immediately or shifts
    /// exposure to a third party.
    pub const fn requires_credit_review(&self) -> bool {
        matches!(
            self,
            PaymentMethod::Boleto
                | PaymentMethod::OnAccount
                | PaymentMethod::StoreCredit
                | PaymentMethod::TradeNote
                | PaymentMethod::Check
                | PaymentMethod::Installments
        )
    }

    /// Classifies a free-text payment-method label.
    ///
    /// ## Matching Policy
    /// One consistent rule for every phrase: normalize the label
    /// (lowercase, strip diacritics, collapse `_`/`-` into spaces), then
    /// take the first substring match in vocabulary order. Exact and
    /// partial labels classify identically ("Boleto" and
    /// "Boleto Bancário 30d" are both [`PaymentMethod::Boleto`]).
    ///
    /// Unknown labels map to [`PaymentMethod::Other`].
    pub fn from_label(label: &str) -> Self {
        let normalized = normalize_label(label);

        // Vocabulary order matters: "credito interno"/"credito loja" must
        // win over the bare "credito" of an external card label.
        if normalized.contains("boleto") {
            PaymentMethod::Boleto
        } else if normalized.contains("prazo") {
            PaymentMethod::OnAccount
        } else if normalized.contains("credito interno") || normalized.contains("credito loja") {
            PaymentMethod::StoreCredit
        } else if normalized.contains("duplicata") {
            PaymentMethod::TradeNote
        } else if normalized.contains("cheque") || normalized.contains("check") {
            PaymentMethod::Check
        } else if normalized.contains("parcelad") || normalized.contains("parcelamento") {
            PaymentMethod::Installments
        } else if normalized.contains("pix") {
            PaymentMethod::Pix
        } else if normalized.contains("debito") || normalized.contains("debit") {
            PaymentMethod::DebitCard
        } else if normalized.contains("credito") || normalized.contains("credit") {
            PaymentMethod::CreditCard
        } else if normalized.contains("dinheiro")
            || normalized.contains("cash")
            || normalized.contains("a vista")
        {
            PaymentMethod::Cash
        } else {
            PaymentMethod::Other
        }
    }
}

/// Lowercases, strips the diacritics that occur in payment labels, and
/// collapses `_`/`-` separators into spaces.
fn normalize_label(label: &str) -> String {
    label
        .to_lowercase()
        .chars()
        .map(|c| match c {
            'á' | 'à' | 'â' | 'ã' => 'a',
            'é' | 'ê' => 'e',
            'í' => 'i',
            'ó' | 'ô' | 'õ' => 'o',
            'ú' | 'ü' => 'u',
            'ç' => 'c',
            '_' | '-' => ' ',
            other => other,
        })
        .collect()
}

// =============================================================================
// Sale
// =============================================================================

/// A commercial sale transaction.
///
/// Invariants:
/// - `total_cents = subtotal_cents - discount_cents`, all non-negative
/// - invoiceable iff the pendency-code set is empty
/// - once invoiced the row is immutable apart from payment status
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Sale {
    pub id: String,
    pub tenant_id: String,
    pub customer_id: Option<String>,
    pub payment_method: PaymentMethod,
    pub payment_status: PaymentStatus,
    pub subtotal_cents: i64,
    pub discount_cents: i64,
    pub total_cents: i64,
    /// Canonical pendency-code string ("E","C","D" order, e.g. "EC").
    pub pendency_codes: String,
    /// `None` for rows created before review tracking existed.
    pub credit_review: Option<CreditReview>,
    /// Set when a price rejection blocks the sale; cleared on approval.
    pub block_reason: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Sale {
    /// Returns the pendency-code set.
    #[inline]
    pub fn pendencies(&self) -> PendencySet {
        PendencySet::from_code_string(&self.pendency_codes)
    }

    /// A sale is invoiceable iff no pendency codes remain.
    #[inline]
    pub fn is_invoiceable(&self) -> bool {
        self.pendencies().is_empty()
    }

    /// Returns the sale total as Money.
    #[inline]
    pub fn total(&self) -> Money {
        Money::from_cents(self.total_cents)
    }

    /// Checks the `total = subtotal - discount` invariant.
    pub fn totals_consistent(&self) -> bool {
        self.subtotal_cents >= 0
            && self.discount_cents >= 0
            && self.total_cents >= 0
            && self.subtotal_cents - self.discount_cents == self.total_cents
    }
}

// =============================================================================
// Sale Item
// =============================================================================

/// A line item in a sale.
///
/// `unit_price_cents` is the list price; `final_price_cents` the negotiated
/// unit price actually charged. `price_status` is mutated only by approval
/// actions.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct SaleItem {
    pub id: String,
    pub sale_id: String,
    pub description: String,
    pub quantity: i64,
    pub unit_price_cents: i64,
    pub final_price_cents: i64,
    /// Per-item floor; `None` when no minimum is configured.
    pub minimum_price_cents: Option<i64>,
    /// Line discount: `(unit_price - final_price) * quantity`.
    pub discount_cents: i64,
    /// Line total: `final_price * quantity`.
    pub total_cents: i64,
    pub price_status: PriceStatus,
    pub created_at: DateTime<Utc>,
}

impl SaleItem {
    #[inline]
    pub fn unit_price(&self) -> Money {
        Money::from_cents(self.unit_price_cents)
    }

    #[inline]
    pub fn final_price(&self) -> Money {
        Money::from_cents(self.final_price_cents)
    }

    #[inline]
    pub fn total(&self) -> Money {
        Money::from_cents(self.total_cents)
    }
}

// =============================================================================
// Price Control Settings
// =============================================================================

/// Per-tenant price policy configuration.
///
/// Read-only to the validator; written only through the administrative
/// upsert path.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct PriceControlSettings {
    pub tenant_id: String,
    /// Price control is opt-in; a disabled policy passes everything.
    pub enabled: bool,
    /// Maximum seller discount in basis points (2000 = 20%).
    pub max_discount_bps: i64,
    /// A final price below this positive floor needs approval even with no
    /// discount violation. Zero disables the floor.
    pub approval_floor_cents: i64,
    /// JSON array of user identities authorized to resolve price pendencies.
    pub approvers: String,
    /// Symbol used when formatting user-facing amounts for this tenant.
    pub currency_symbol: String,
    pub updated_at: DateTime<Utc>,
}

impl PriceControlSettings {
    /// A disabled policy for the given tenant.
    pub fn disabled(tenant_id: impl Into<String>) -> Self {
        PriceControlSettings {
            tenant_id: tenant_id.into(),
            enabled: false,
            max_discount_bps: 0,
            approval_floor_cents: 0,
            approvers: "[]".to_string(),
            currency_symbol: "$".to_string(),
            updated_at: Utc::now(),
        }
    }

    /// Parses the approver array. Malformed JSON yields an empty set rather
    /// than a panic; an unreadable approver list must never approve anyone.
    pub fn approver_ids(&self) -> Vec<String> {
        serde_json::from_str(&self.approvers).unwrap_or_default()
    }

    /// Whether the identity may resolve price pendencies for this tenant.
    pub fn is_approver(&self, user_id: &str) -> bool {
        self.approver_ids().iter().any(|id| id == user_id)
    }

    /// Serializes an approver list into the stored JSON form.
    pub fn approvers_json(ids: &[&str]) -> String {
        serde_json::to_string(ids).unwrap_or_else(|_| "[]".to_string())
    }
}

// =============================================================================
// Customer
// =============================================================================

/// Minimal customer record: the engine only reads the credit limit.
///
/// `credit_limit_cents <= 0` means no limit is configured (unlimited), not
/// a zero limit.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Customer {
    pub id: String,
    pub tenant_id: String,
    pub name: String,
    pub credit_limit_cents: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// =============================================================================
// Credit Info
// =============================================================================

/// Derived credit position of a customer. Computed on demand from unpaid
/// and overdue sales; never stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreditInfo {
    pub credit_limit_cents: i64,
    /// Open plus overdue balance.
    pub used_cents: i64,
    /// `limit - used`, unclamped: over-exposed customers show negative
    /// headroom.
    pub available_cents: i64,
    pub open_balance_cents: i64,
    pub overdue_balance_cents: i64,
}

// =============================================================================
// Movement Direction
// =============================================================================

/// Direction of a financial movement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[serde(rename_all = "lowercase")]
pub enum MovementDirection {
    In,
    Out,
}

impl MovementDirection {
    /// The opposite direction, used when building a compensating entry.
    #[inline]
    pub const fn flipped(&self) -> Self {
        match self {
            MovementDirection::In => MovementDirection::Out,
            MovementDirection::Out => MovementDirection::In,
        }
    }
}

// =============================================================================
// Financial Movement
// =============================================================================

/// A posted ledger entry.
///
/// Immutable once posted: reversal inserts a compensating row and flags
/// this one; `is_reversed = true` is terminal and value/direction are never
/// edited.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct FinancialMovement {
    pub id: String,
    pub tenant_id: String,
    pub direction: MovementDirection,
    pub value_cents: i64,
    pub account: String,
    pub nature: Option<String>,
    pub cost_center: Option<String>,
    pub description: String,
    /// Back-reference from a compensating entry to the movement it offsets.
    pub reverses_movement_id: Option<String>,
    pub is_reversed: bool,
    pub reversed_at: Option<DateTime<Utc>>,
    pub reversed_by: Option<String>,
    pub reverse_reason: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl FinancialMovement {
    #[inline]
    pub fn value(&self) -> Money {
        Money::from_cents(self.value_cents)
    }

    /// Signed cents effect on the ledger: inflows positive, outflows
    /// negative.
    pub fn signed_cents(&self) -> i64 {
        match self.direction {
            MovementDirection::In => self.value_cents,
            MovementDirection::Out => -self.value_cents,
        }
    }
}

// =============================================================================
// Credit Log
// =============================================================================

/// Action recorded by a credit-log entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[serde(rename_all = "snake_case")]
pub enum CreditLogAction {
    CreditApproved,
    CreditDenied,
    AdjustmentRequested,
    MovementReversed,
    PriceApproved,
    PriceRejected,
}

/// An append-only audit record of an admission decision or reversal.
///
/// Rows are inserted in the same transaction as the state change they
/// describe and are never updated or deleted. `details` is a versioned
/// JSON payload (`schema_version` plus per-action fields).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct CreditLogEntry {
    pub id: String,
    pub tenant_id: String,
    pub sale_id: Option<String>,
    pub movement_id: Option<String>,
    pub action: CreditLogAction,
    pub actor_id: String,
    pub reason: Option<String>,
    pub details: String,
    pub created_at: DateTime<Utc>,
}

// =============================================================================
// Unit Tests
// =============================================================================
