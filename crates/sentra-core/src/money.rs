//! # Money Module
//!
//! Monetary values as integer cents.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │  Every monetary value in the engine flows through this type.    │
//! │                                                                 │
//! │  SaleItem.unit_price ──► line totals ──► Sale.total             │
//! │  Sale.total ──► customer debt ──► credit admission              │
//! │  FinancialMovement.value ──► reversal ──► net ledger effect     │
//! └─────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Amounts are stored in the smallest currency unit (cents). The database,
//! calculations, and decision messages all use cents; only display
//! formatting converts to major units.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Add, AddAssign, Sub, SubAssign};

// =============================================================================
// Money Type
// =============================================================================

/// A monetary value in the smallest currency unit.
///
/// Signed: negative values represent reversals and over-exposure headroom.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
pub struct Money(i64);

impl Money {
    /// Creates a Money value from cents.
    #[inline]
    pub const fn from_cents(cents: i64) -> Self {
        Money(cents)
    }

    /// Returns the value in cents.
    #[inline]
    pub const fn cents(&self) -> i64 {
        self.0
    }

    /// Returns the major unit portion.
    #[inline]
    pub const fn major(&self) -> i64 {
        self.0 / 100
    }

    /// Returns the minor unit portion (always 0-99).
    #[inline]
    pub const fn minor(&self) -> i64 {
        (self.0 % 100).abs()
    }

    /// Zero money value.
    #[inline]
    pub const fn zero() -> Self {
        Money(0)
    }

    #[inline]
    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }

    #[inline]
    pub const fn is_positive(&self) -> bool {
        self.0 > 0
    }

    #[inline]
    pub const fn is_negative(&self) -> bool {
        self.0 < 0
    }

    /// Returns the absolute value.
    #[inline]
    pub const fn abs(&self) -> Self {
        Money(self.0.abs())
    }

    /// Formats the amount with a tenant currency symbol.
    ///
    /// ## Example
    /// ```rust
    /// use sentra_core::money::Money;
    ///
    /// assert_eq!(Money::from_cents(109900).format_with("R$"), "R$1099.00");
    /// assert_eq!(Money::from_cents(-550).format_with("$"), "-$5.50");
    /// ```
    pub fn format_with(&self, symbol: &str) -> String {
        let sign = if self.0 < 0 { "-" } else { "" };
        format!("{}{}{}.{:02}", sign, symbol, self.major().abs(), self.minor())
    }
}

// =============================================================================
// Discount Math
// =============================================================================

/// Computes the discount between a list price and a final price in basis
/// points (1 bps = 0.01%).
///
/// ## Rules
/// - `original <= 0` yields 0 bps (division-by-zero guard; a neutral result,
///   never an error)
/// - A final price above the list price yields negative bps
///
/// ## Example
/// ```rust
/// use sentra_core::money::{discount_bps, Money};
///
/// let bps = discount_bps(Money::from_cents(10000), Money::from_cents(7000));
/// assert_eq!(bps, 3000); // 30%
/// ```
pub fn discount_bps(original: Money, final_price: Money) -> i64 {
    if original.cents() <= 0 {
        return 0;
    }
    // i128 intermediate to keep large amounts from overflowing
    let diff = original.cents() as i128 - final_price.cents() as i128;
    (diff * 10_000 / original.cents() as i128) as i64
}

/// Formats basis points as a percentage string for user-facing messages.
pub fn format_bps(bps: i64) -> String {
    format!("{:.2}%", bps as f64 / 100.0)
}

// =============================================================================
// Trait Implementations
// =============================================================================

/// Debug-friendly display; decision messages use [`Money::format_with`]
/// so the tenant's own currency symbol is shown.
impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.format_with("$"))
    }
}

impl Add for Money {
    type Output = Self;

    #[inline]
    fn add(self, other: Self) -> Self {
        Money(self.0 + other.0)
    }
}

impl AddAssign for Money {
    #[inline]
    fn add_assign(&mut self, other: Self) {
        self.0 += other.0;
    }
}

impl Sub for Money {
    type Output = Self;

    #[inline]
    fn sub(self, other: Self) -> Self {
        Money(self.0 - other.0)
    }
}

impl SubAssign for Money {
    #[inline]
    fn sub_assign(&mut self, other: Self) {
        self.0 -= other.0;
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
