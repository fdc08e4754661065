//! # Pendency Codes
//!
//! The small set of status codes that gate a sale's invoicing.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                     Pendency Lifecycle                          │
//! │                                                                 │
//! │  Sale created                                                   │
//! │    ├── stock separation required ──► add E                      │
//! │    ├── credit-bearing payment    ──► add C                      │
//! │    └── discount needs approval   ──► add D                      │
//! │                                                                 │
//! │  Approver resolves each pendency ──► remove code                │
//! │                                                                 │
//! │  Set empty ──► sale invoiceable                                 │
//! └─────────────────────────────────────────────────────────────────┘
//! ```
//!
//! A sale holds at most three codes. Insert and remove are idempotent, and
//! the canonical string form ("E","C","D" order) is what gets persisted on
//! the sale row, so two sets with the same codes always serialize
//! identically.

use serde::{Deserialize, Serialize};
use std::fmt;

// =============================================================================
// Pendency Code
// =============================================================================

/// A single invoicing gate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PendencyCode {
    /// `E`: physical stock separation required.
    StockSeparation,
    /// `C`: credit review required.
    CreditReview,
    /// `D`: discount approval required.
    DiscountApproval,
}

impl PendencyCode {
    /// The single-letter code persisted on the sale row.
    pub const fn code(&self) -> char {
        match self {
            PendencyCode::StockSeparation => 'E',
            PendencyCode::CreditReview => 'C',
            PendencyCode::DiscountApproval => 'D',
        }
    }

    /// Parses a single-letter code. Unknown letters yield `None`.
    pub const fn from_code(code: char) -> Option<Self> {
        match code {
            'E' => Some(PendencyCode::StockSeparation),
            'C' => Some(PendencyCode::CreditReview),
            'D' => Some(PendencyCode::DiscountApproval),
            _ => None,
        }
    }

    /// All codes in canonical persistence order.
    pub const ALL: [PendencyCode; 3] = [
        PendencyCode::StockSeparation,
        PendencyCode::CreditReview,
        PendencyCode::DiscountApproval,
    ];
}

impl fmt::Display for PendencyCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

// =============================================================================
// Pendency Set
// =============================================================================

/// The set of pendency codes on a sale.
///
/// Backed by a tiny bitmask; all operations are idempotent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub struct PendencySet(u8);

impl PendencySet {
    /// The empty set (an invoiceable sale).
    #[inline]
    pub const fn empty() -> Self {
        PendencySet(0)
    }

    const fn bit(code: PendencyCode) -> u8 {
        match code {
            PendencyCode::StockSeparation => 0b001,
            PendencyCode::CreditReview => 0b010,
            PendencyCode::DiscountApproval => 0b100,
        }
    }

    /// Idempotent union-insert; a present code is a no-op.
    #[inline]
    pub fn add(&mut self, code: PendencyCode) {
        self.0 |= Self::bit(code);
    }

    /// Idempotent removal; an absent code is a no-op.
    #[inline]
    pub fn remove(&mut self, code: PendencyCode) {
        self.0 &= !Self::bit(code);
    }

    #[inline]
    pub const fn contains(&self, code: PendencyCode) -> bool {
        self.0 & Self::bit(code) != 0
    }

    /// True iff the code set is empty; the sale may then be invoiced.
    #[inline]
    pub const fn is_empty(&self) -> bool {
        self.0 == 0
    }

    #[inline]
    pub const fn len(&self) -> usize {
        self.0.count_ones() as usize
    }

    /// Codes present, in canonical order.
    pub fn iter(&self) -> impl Iterator<Item = PendencyCode> + '_ {
        PendencyCode::ALL
            .into_iter()
            .filter(move |code| self.contains(*code))
    }

    /// Canonical persisted form: present codes in "E","C","D" order.
    pub fn to_code_string(&self) -> String {
        self.iter().map(|code| code.code()).collect()
    }

    /// Parses a persisted code string. Unknown letters are ignored, so a
    /// row written by a newer schema still round-trips its known codes.
    pub fn from_code_string(codes: &str) -> Self {
        let mut set = PendencySet::empty();
        for c in codes.chars() {
            if let Some(code) = PendencyCode::from_code(c) {
                set.add(code);
            }
        }
        set
    }
}

impl fmt::Display for PendencySet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_code_string())
    }
}

impl From<String> for PendencySet {
    fn from(codes: String) -> Self {
        PendencySet::from_code_string(&codes)
    }
}

impl From<PendencySet> for String {
    fn from(set: PendencySet) -> Self {
        set.to_code_string()
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
