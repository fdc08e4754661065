//! # Credit Repository
//!
//! Debt aggregation, credit admission, and the review lifecycle.
//!
//! ## Review Lifecycle
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                                                                 │
//! │   sale created with credit-bearing method                       │
//! │        │                                                        │
//! │        ▼                                                        │
//! │    ┌─────────┐   approve_credit   ┌──────────┐                  │
//! │    │ pending │ ─────────────────► │ approved │  (C cleared)     │
//! │    └─────────┘                    └──────────┘                  │
//! │        │                               ▲                        │
//! │        │ deny_credit                   │ request_adjustment     │
//! │        ▼                               │ reopens a pending      │
//! │    ┌─────────┐ ──────────────────────┘  cycle from either       │
//! │    │ denied  │    (C kept: sale stays     terminal state        │
//! │    └─────────┘     blocked)                                     │
//! │                                                                 │
//! └─────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Every transition is a conditional update keyed on the review state the
//! caller is entitled to assume; two concurrent approvals produce exactly
//! one success and one clean [`DbError::ReviewNotPending`]. The decision
//! and its audit entry commit in the same transaction, so neither is
//! durable without the other.

use sqlx::SqlitePool;
use tracing::{debug, info};

use chrono::Utc;

use crate::error::{DbError, DbResult};
use crate::repository::audit::{self, NewLogEntry};
use sentra_core::validation::validate_reason;
use sentra_core::{
    evaluate_admission, CreditDecision, CreditInfo, CreditLogAction, CreditReview, Money,
    PaymentMethod, Sale,
};

/// Payment methods whose sales are back-filled into the pending queue when
/// they predate review tracking (`credit_review IS NULL`).
const CREDIT_BEARING_METHODS: [PaymentMethod; 6] = [
    PaymentMethod::Boleto,
    PaymentMethod::OnAccount,
    PaymentMethod::StoreCredit,
    PaymentMethod::TradeNote,
    PaymentMethod::Check,
    PaymentMethod::Installments,
];

// =============================================================================
// Result Types
// =============================================================================

/// A sale awaiting credit review, enriched with the customer's current
/// credit position.
#[derive(Debug, Clone)]
pub struct PendingCreditSale {
    pub sale: Sale,
    pub credit_info: CreditInfo,
}

// =============================================================================
// Repository
// =============================================================================

/// Repository for credit admission and review operations.
#[derive(Debug, Clone)]
pub struct CreditRepository {
    pool: SqlitePool,
}

impl CreditRepository {
    /// Creates a new CreditRepository.
    pub fn new(pool: SqlitePool) -> Self {
        CreditRepository { pool }
    }

    // =========================================================================
    // Reads
    // =========================================================================

    /// Sales awaiting credit review for a tenant.
    ///
    /// Returns sales whose review state is `pending`, plus legacy sales
    /// with no review state whose payment method is credit-bearing. Every
    /// returned sale carries the customer's current [`CreditInfo`].
    pub async fn pending_credit_sales(&self, tenant_id: &str) -> DbResult<Vec<PendingCreditSale>> {
        let sales = sqlx::query_as::<_, Sale>(
            r#"
            SELECT id, tenant_id, customer_id, payment_method, payment_status,
                   subtotal_cents, discount_cents, total_cents,
                   pendency_codes, credit_review, block_reason,
                   created_at, updated_at
            FROM sales
            WHERE tenant_id = ?1
              AND (credit_review = ?2
                   OR (credit_review IS NULL
                       AND payment_method IN (?3, ?4, ?5, ?6, ?7, ?8)))
            ORDER BY created_at, id
            "#,
        )
        .bind(tenant_id)
        .bind(CreditReview::Pending)
        .bind(CREDIT_BEARING_METHODS[0])
        .bind(CREDIT_BEARING_METHODS[1])
        .bind(CREDIT_BEARING_METHODS[2])
        .bind(CREDIT_BEARING_METHODS[3])
        .bind(CREDIT_BEARING_METHODS[4])
        .bind(CREDIT_BEARING_METHODS[5])
        .fetch_all(&self.pool)
        .await?;

        let mut pending = Vec::with_capacity(sales.len());
        for sale in sales {
            let credit_info = match sale.customer_id.as_deref() {
                Some(customer_id) => self.credit_info(tenant_id, customer_id).await?,
                None => CreditInfo {
                    credit_limit_cents: 0,
                    used_cents: 0,
                    available_cents: 0,
                    open_balance_cents: 0,
                    overdue_balance_cents: 0,
                },
            };
            pending.push(PendingCreditSale { sale, credit_info });
        }

        Ok(pending)
    }

    /// Sums the customer's open debt: `total_cents` over sales whose
    /// payment status is pending or overdue.
    ///
    /// `exclude_sale_id` skips one sale, used when re-evaluating a sale
    /// being edited so it doesn't double-count itself.
    pub async fn customer_debt(
        &self,
        tenant_id: &str,
        customer_id: &str,
        exclude_sale_id: Option<&str>,
    ) -> DbResult<Money> {
        let debt: Option<i64> = sqlx::query_scalar(
            r#"
            SELECT SUM(total_cents)
            FROM sales
            WHERE tenant_id = ?1
              AND customer_id = ?2
              AND payment_status IN ('pending', 'overdue')
              AND (?3 IS NULL OR id != ?3)
            "#,
        )
        .bind(tenant_id)
        .bind(customer_id)
        .bind(exclude_sale_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(Money::from_cents(debt.unwrap_or(0)))
    }

    /// Computes the customer's current credit position on demand.
    ///
    /// With no configured limit (`limit <= 0`) the available headroom is
    /// reported as zero; with a limit, `available = limit - used`,
    /// unclamped, so over-exposure shows as negative headroom.
    pub async fn credit_info(&self, tenant_id: &str, customer_id: &str) -> DbResult<CreditInfo> {
        let credit_limit_cents: Option<i64> = sqlx::query_scalar(
            "SELECT credit_limit_cents FROM customers WHERE tenant_id = ?1 AND id = ?2",
        )
        .bind(tenant_id)
        .bind(customer_id)
        .fetch_optional(&self.pool)
        .await?;
        let credit_limit_cents = credit_limit_cents.unwrap_or(0);

        let (open, overdue): (Option<i64>, Option<i64>) = sqlx::query_as(
            r#"
            SELECT
                SUM(CASE WHEN payment_status = 'pending' THEN total_cents END),
                SUM(CASE WHEN payment_status = 'overdue' THEN total_cents END)
            FROM sales
            WHERE tenant_id = ?1 AND customer_id = ?2
            "#,
        )
        .bind(tenant_id)
        .bind(customer_id)
        .fetch_one(&self.pool)
        .await?;

        let open_balance_cents = open.unwrap_or(0);
        let overdue_balance_cents = overdue.unwrap_or(0);
        let used_cents = open_balance_cents + overdue_balance_cents;

        Ok(CreditInfo {
            credit_limit_cents,
            used_cents,
            available_cents: if credit_limit_cents > 0 {
                credit_limit_cents - used_cents
            } else {
                0
            },
            open_balance_cents,
            overdue_balance_cents,
        })
    }

    // =========================================================================
    // Admission
    // =========================================================================

    /// Decides whether a customer may make a credit sale of the given
    /// total, against their current open debt.
    ///
    /// The debt read and the decision are not atomic: two concurrent
    /// admissions for the same customer can both pass before either sale
    /// commits, transiently exceeding the limit. That window is accepted
    /// and monitored; callers wanting a hard guarantee serialize admission
    /// per customer.
    pub async fn can_customer_make_credit_sale(
        &self,
        tenant_id: &str,
        customer_id: Option<&str>,
        credit_limit: Money,
        sale_total: Money,
        exclude_sale_id: Option<&str>,
    ) -> DbResult<CreditDecision> {
        let currency_symbol = self.currency_symbol(tenant_id).await?;

        let current_debt = match customer_id {
            Some(customer_id) if credit_limit.cents() > 0 => {
                self.customer_debt(tenant_id, customer_id, exclude_sale_id)
                    .await?
            }
            _ => Money::zero(),
        };

        let decision = evaluate_admission(
            customer_id,
            credit_limit,
            current_debt,
            sale_total,
            &currency_symbol,
        );

        debug!(
            tenant_id = %tenant_id,
            customer_id = ?customer_id,
            allowed = decision.allowed,
            current_debt_cents = decision.current_debt_cents,
            "Credit admission evaluated"
        );

        Ok(decision)
    }

    // =========================================================================
    // Review Lifecycle
    // =========================================================================

    /// Approves a pending credit review: sets the state to `approved`,
    /// clears the `C` pendency code, and appends the audit entry, in one
    /// transaction.
    ///
    /// Only a sale currently in `pending` review can be approved; anything
    /// else is rejected with [`DbError::ReviewNotPending`], never silently
    /// accepted.
    pub async fn approve_credit(
        &self,
        tenant_id: &str,
        sale_id: &str,
        approver_id: &str,
        reason: Option<&str>,
        details: Option<serde_json::Value>,
    ) -> DbResult<()> {
        let reason = match reason {
            Some(reason) => Some(validate_reason(reason)?),
            None => None,
        };

        let mut tx = self.pool.begin().await?;

        let result = sqlx::query(
            r#"
            UPDATE sales
            SET credit_review = ?3,
                pendency_codes = REPLACE(pendency_codes, 'C', ''),
                updated_at = ?4
            WHERE tenant_id = ?1 AND id = ?2 AND credit_review = ?5
            "#,
        )
        .bind(tenant_id)
        .bind(sale_id)
        .bind(CreditReview::Approved)
        .bind(Utc::now())
        .bind(CreditReview::Pending)
        .execute(&mut *tx)
        .await?;

        if result.rows_affected() == 0 {
            // The conditional update matched nothing: release the (empty)
            // transaction's connection before the existence check, which
            // acquires its own — the single-connection in-memory pool would
            // otherwise deadlock.
            drop(tx);
            return Err(self.review_conflict(tenant_id, sale_id).await);
        }

        audit::append_tx(
            &mut *tx,
            NewLogEntry {
                tenant_id,
                sale_id: Some(sale_id),
                movement_id: None,
                action: CreditLogAction::CreditApproved,
                actor_id: approver_id,
                reason: reason.as_deref(),
                details: decision_details("approved", details),
            },
        )
        .await?;

        tx.commit().await?;

        info!(sale_id = %sale_id, approver_id = %approver_id, "Credit approved");

        Ok(())
    }

    /// Denies a pending credit review. Requires a non-empty reason.
    ///
    /// The `C` pendency code is NOT cleared: a denied sale stays blocked
    /// from invoicing until the order is cancelled or the payment method
    /// changes and is re-evaluated.
    pub async fn deny_credit(
        &self,
        tenant_id: &str,
        sale_id: &str,
        approver_id: &str,
        reason: &str,
        details: Option<serde_json::Value>,
    ) -> DbResult<()> {
        let reason = validate_reason(reason)?;

        let mut tx = self.pool.begin().await?;

        let result = sqlx::query(
            r#"
            UPDATE sales
            SET credit_review = ?3, updated_at = ?4
            WHERE tenant_id = ?1 AND id = ?2 AND credit_review = ?5
            "#,
        )
        .bind(tenant_id)
        .bind(sale_id)
        .bind(CreditReview::Denied)
        .bind(Utc::now())
        .bind(CreditReview::Pending)
        .execute(&mut *tx)
        .await?;

        if result.rows_affected() == 0 {
            // See approve_credit: free the connection before review_conflict
            // acquires its own, so the single-connection pool can't deadlock.
            drop(tx);
            return Err(self.review_conflict(tenant_id, sale_id).await);
        }

        audit::append_tx(
            &mut *tx,
            NewLogEntry {
                tenant_id,
                sale_id: Some(sale_id),
                movement_id: None,
                action: CreditLogAction::CreditDenied,
                actor_id: approver_id,
                reason: Some(&reason),
                details: decision_details("denied", details),
            },
        )
        .await?;

        tx.commit().await?;

        info!(sale_id = %sale_id, approver_id = %approver_id, "Credit denied");

        Ok(())
    }

    /// Records an adjustment request and reopens a fresh `pending` review
    /// cycle, linking the prior decision in the audit entry.
    ///
    /// Invoiceability does not change here: pendency codes are untouched
    /// and the follow-up workflow (partial payment, limit override, ...)
    /// decides the sale's fate.
    pub async fn request_credit_adjustment(
        &self,
        tenant_id: &str,
        sale_id: &str,
        approver_id: &str,
        reason: &str,
        adjustment_type: &str,
        adjustment_details: Option<serde_json::Value>,
        details: Option<serde_json::Value>,
    ) -> DbResult<()> {
        let reason = validate_reason(reason)?;
        if adjustment_type.trim().is_empty() {
            return Err(sentra_core::ValidationError::Required {
                field: "adjustment_type".to_string(),
            }
            .into());
        }

        let mut tx = self.pool.begin().await?;

        // CAS on the observed prior state so a concurrent decision can't
        // be silently overwritten.
        let prior: Option<Option<CreditReview>> =
            sqlx::query_scalar("SELECT credit_review FROM sales WHERE tenant_id = ?1 AND id = ?2")
                .bind(tenant_id)
                .bind(sale_id)
                .fetch_optional(&mut *tx)
                .await?;
        let prior = prior.ok_or_else(|| DbError::not_found("Sale", sale_id))?;

        let result = sqlx::query(
            r#"
            UPDATE sales
            SET credit_review = ?3, updated_at = ?4
            WHERE tenant_id = ?1 AND id = ?2 AND credit_review IS ?5
            "#,
        )
        .bind(tenant_id)
        .bind(sale_id)
        .bind(CreditReview::Pending)
        .bind(Utc::now())
        .bind(prior)
        .execute(&mut *tx)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::stale("Sale", sale_id));
        }

        let mut extra = decision_details("adjustment_requested", details);
        if let serde_json::Value::Object(ref mut map) = extra {
            map.insert(
                "adjustment_type".to_string(),
                serde_json::Value::from(adjustment_type.trim()),
            );
            map.insert(
                "prior_review".to_string(),
                serde_json::to_value(prior).unwrap_or(serde_json::Value::Null),
            );
            if let Some(adjustment_details) = adjustment_details {
                map.insert("adjustment_details".to_string(), adjustment_details);
            }
        }

        audit::append_tx(
            &mut *tx,
            NewLogEntry {
                tenant_id,
                sale_id: Some(sale_id),
                movement_id: None,
                action: CreditLogAction::AdjustmentRequested,
                actor_id: approver_id,
                reason: Some(&reason),
                details: extra,
            },
        )
        .await?;

        tx.commit().await?;

        info!(
            sale_id = %sale_id,
            adjustment_type = %adjustment_type,
            "Credit adjustment requested"
        );

        Ok(())
    }

    // =========================================================================
    // Helpers
    // =========================================================================

    /// Distinguishes "sale missing" from "review moved on" after a
    /// conditional update affected zero rows.
    async fn review_conflict(&self, tenant_id: &str, sale_id: &str) -> DbError {
        let exists =
            sqlx::query_scalar::<_, String>("SELECT id FROM sales WHERE tenant_id = ?1 AND id = ?2")
                .bind(tenant_id)
                .bind(sale_id)
                .fetch_optional(&self.pool)
                .await;

        match exists {
            Ok(Some(_)) => DbError::ReviewNotPending {
                sale_id: sale_id.to_string(),
            },
            Ok(None) => DbError::not_found("Sale", sale_id),
            Err(err) => err.into(),
        }
    }

    async fn currency_symbol(&self, tenant_id: &str) -> DbResult<String> {
        let symbol: Option<String> = sqlx::query_scalar(
            "SELECT currency_symbol FROM price_control_settings WHERE tenant_id = ?1",
        )
        .bind(tenant_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(symbol.unwrap_or_else(|| "$".to_string()))
    }
}

/// Base `details` payload for a review decision.
fn decision_details(
    decision: &str,
    caller_details: Option<serde_json::Value>,
) -> serde_json::Value {
    let mut details = match caller_details {
        Some(serde_json::Value::Object(map)) => serde_json::Value::Object(map),
        Some(other) => serde_json::json!({ "context": other }),
        None => serde_json::json!({}),
    };
    if let serde_json::Value::Object(ref mut map) = details {
        map.insert("decision".to_string(), serde_json::Value::from(decision));
    }
    details
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{Database, DbConfig};
    use crate::repository::sale::{NewSale, NewSaleItem};
    use sentra_core::{Customer, PaymentStatus, PriceControlSettings};

    async fn test_db() -> Database {
        Database::new(DbConfig::in_memory()).await.unwrap()
    }

    fn credit_sale(total_cents: i64) -> NewSale {
        NewSale {
            tenant_id: "t1".to_string(),
            customer_id: Some("c1".to_string()),
            payment_method: PaymentMethod::from_label("boleto"),
            subtotal_cents: total_cents,
            discount_cents: 0,
            total_cents,
            requires_stock_separation: false,
            items: vec![NewSaleItem {
                description: "Item".to_string(),
                quantity: 1,
                unit_price_cents: total_cents,
                final_price_cents: total_cents,
                minimum_price_cents: None,
            }],
        }
    }

    async fn seed_customer(db: &Database, credit_limit_cents: i64) {
        db.settings()
            .upsert_customer(&Customer {
                id: "c1".to_string(),
                tenant_id: "t1".to_string(),
                name: "Mercearia Central".to_string(),
                credit_limit_cents,
                created_at: Utc::now(),
                updated_at: Utc::now(),
            })
            .await
            .unwrap();
    }

    fn settings() -> PriceControlSettings {
        PriceControlSettings::disabled("t1")
    }

    #[tokio::test]
    async fn test_boleto_sale_is_admitted_within_limit() {
        let db = test_db().await;
        seed_customer(&db, 100_000).await;

        // Existing open sales totalling 800.00.
        db.sales().create_sale(&credit_sale(50_000), &settings()).await.unwrap();
        db.sales().create_sale(&credit_sale(30_000), &settings()).await.unwrap();

        // The label itself is credit-bearing.
        assert!(PaymentMethod::from_label("boleto").requires_credit_review());

        // New sale of 150.00: admitted with 50.00 of headroom left.
        let decision = db
            .credit()
            .can_customer_make_credit_sale(
                "t1",
                Some("c1"),
                Money::from_cents(100_000),
                Money::from_cents(15_000),
                None,
            )
            .await
            .unwrap();

        assert!(decision.allowed);
        assert_eq!(decision.current_debt_cents, 80_000);
        assert_eq!(decision.available_credit_cents, 5_000);
    }

    #[tokio::test]
    async fn test_admission_denied_over_limit_cites_amounts() {
        let db = test_db().await;
        seed_customer(&db, 100_000).await;

        db.sales().create_sale(&credit_sale(50_000), &settings()).await.unwrap();
        db.sales().create_sale(&credit_sale(30_000), &settings()).await.unwrap();

        // New sale of 300.00: denied, reason cites limit 1000.00, debt
        // 800.00, available 200.00.
        let decision = db
            .credit()
            .can_customer_make_credit_sale(
                "t1",
                Some("c1"),
                Money::from_cents(100_000),
                Money::from_cents(30_000),
                None,
            )
            .await
            .unwrap();

        assert!(!decision.allowed);
        let reason = decision.reason.unwrap();
        assert!(reason.contains("$1000.00"));
        assert!(reason.contains("$800.00"));
        assert!(reason.contains("$200.00"));
    }

    #[tokio::test]
    async fn test_debt_counts_only_pending_and_overdue() {
        let db = test_db().await;
        seed_customer(&db, 100_000).await;

        let paid = db.sales().create_sale(&credit_sale(40_000), &settings()).await.unwrap();
        db.sales().create_sale(&credit_sale(30_000), &settings()).await.unwrap();
        let overdue = db.sales().create_sale(&credit_sale(10_000), &settings()).await.unwrap();

        db.sales()
            .set_payment_status("t1", &paid.id, PaymentStatus::Paid)
            .await
            .unwrap();
        db.sales()
            .set_payment_status("t1", &overdue.id, PaymentStatus::Overdue)
            .await
            .unwrap();

        let debt = db.credit().customer_debt("t1", "c1", None).await.unwrap();
        assert_eq!(debt.cents(), 40_000);

        let info = db.credit().credit_info("t1", "c1").await.unwrap();
        assert_eq!(info.open_balance_cents, 30_000);
        assert_eq!(info.overdue_balance_cents, 10_000);
        assert_eq!(info.used_cents, 40_000);
        assert_eq!(info.available_cents, 60_000);
    }

    #[tokio::test]
    async fn test_exclude_sale_avoids_double_counting_on_edit() {
        let db = test_db().await;
        seed_customer(&db, 100_000).await;

        let editing = db.sales().create_sale(&credit_sale(80_000), &settings()).await.unwrap();

        // Re-evaluating the sale under edit must not count itself.
        let decision = db
            .credit()
            .can_customer_make_credit_sale(
                "t1",
                Some("c1"),
                Money::from_cents(100_000),
                Money::from_cents(90_000),
                Some(&editing.id),
            )
            .await
            .unwrap();

        assert!(decision.allowed);
        assert_eq!(decision.current_debt_cents, 0);
    }

    #[tokio::test]
    async fn test_no_limit_configured_is_unlimited() {
        let db = test_db().await;

        let decision = db
            .credit()
            .can_customer_make_credit_sale(
                "t1",
                Some("c1"),
                Money::zero(),
                Money::from_cents(999_999),
                None,
            )
            .await
            .unwrap();

        assert!(decision.allowed);
        assert_eq!(decision.available_credit_cents, 0);
    }

    #[tokio::test]
    async fn test_missing_customer_is_denied() {
        let db = test_db().await;

        let decision = db
            .credit()
            .can_customer_make_credit_sale(
                "t1",
                None,
                Money::from_cents(100_000),
                Money::from_cents(1_000),
                None,
            )
            .await
            .unwrap();

        assert!(!decision.allowed);
        assert!(decision.reason.unwrap().contains("customer not specified"));
    }

    #[tokio::test]
    async fn test_approve_clears_c_and_logs() {
        let db = test_db().await;
        seed_customer(&db, 100_000).await;

        let sale = db.sales().create_sale(&credit_sale(10_000), &settings()).await.unwrap();
        assert_eq!(sale.pendency_codes, "C");

        db.credit()
            .approve_credit("t1", &sale.id, "mgr-1", Some("dentro do limite"), None)
            .await
            .unwrap();

        let after = db.sales().get_by_id("t1", &sale.id).await.unwrap().unwrap();
        assert_eq!(after.credit_review, Some(CreditReview::Approved));
        assert!(after.is_invoiceable());

        let log = db.audit().for_sale("t1", &sale.id).await.unwrap();
        assert_eq!(log.len(), 1);
        assert_eq!(log[0].action, CreditLogAction::CreditApproved);
        let details: serde_json::Value = serde_json::from_str(&log[0].details).unwrap();
        assert_eq!(details["decision"], "approved");
    }

    #[tokio::test]
    async fn test_second_approval_fails_cleanly() {
        let db = test_db().await;
        seed_customer(&db, 100_000).await;

        let sale = db.sales().create_sale(&credit_sale(10_000), &settings()).await.unwrap();

        db.credit()
            .approve_credit("t1", &sale.id, "mgr-1", None, None)
            .await
            .unwrap();

        // At most one success: the second approval observes the
        // transitioned state and fails without double-logging.
        let err = db
            .credit()
            .approve_credit("t1", &sale.id, "mgr-2", None, None)
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::ReviewNotPending { .. }));

        let log = db.audit().for_sale("t1", &sale.id).await.unwrap();
        assert_eq!(log.len(), 1);
    }

    #[tokio::test]
    async fn test_deny_requires_reason_and_keeps_c() {
        let db = test_db().await;
        seed_customer(&db, 100_000).await;

        let sale = db.sales().create_sale(&credit_sale(10_000), &settings()).await.unwrap();

        let err = db
            .credit()
            .deny_credit("t1", &sale.id, "mgr-1", "", None)
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::Validation(_)));

        db.credit()
            .deny_credit("t1", &sale.id, "mgr-1", "limite excedido", None)
            .await
            .unwrap();

        // Denied sales stay blocked: the C code is not cleared.
        let after = db.sales().get_by_id("t1", &sale.id).await.unwrap().unwrap();
        assert_eq!(after.credit_review, Some(CreditReview::Denied));
        assert_eq!(after.pendency_codes, "C");
        assert!(!after.is_invoiceable());

        // A decision on a non-pending sale is rejected.
        let err = db
            .credit()
            .approve_credit("t1", &sale.id, "mgr-1", None, None)
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::ReviewNotPending { .. }));
    }

    #[tokio::test]
    async fn test_adjustment_reopens_pending_cycle() {
        let db = test_db().await;
        seed_customer(&db, 100_000).await;

        let sale = db.sales().create_sale(&credit_sale(10_000), &settings()).await.unwrap();
        db.credit()
            .deny_credit("t1", &sale.id, "mgr-1", "limite excedido", None)
            .await
            .unwrap();

        db.credit()
            .request_credit_adjustment(
                "t1",
                &sale.id,
                "mgr-1",
                "cliente propôs entrada de 50%",
                "partial_payment",
                Some(serde_json::json!({ "upfront_cents": 5_000 })),
                None,
            )
            .await
            .unwrap();

        // Fresh pending cycle; invoiceability unchanged.
        let after = db.sales().get_by_id("t1", &sale.id).await.unwrap().unwrap();
        assert_eq!(after.credit_review, Some(CreditReview::Pending));
        assert_eq!(after.pendency_codes, "C");

        let log = db.audit().for_sale("t1", &sale.id).await.unwrap();
        assert_eq!(log.len(), 2);
        assert_eq!(log[1].action, CreditLogAction::AdjustmentRequested);
        let details: serde_json::Value = serde_json::from_str(&log[1].details).unwrap();
        assert_eq!(details["adjustment_type"], "partial_payment");
        assert_eq!(details["prior_review"], "denied");
        assert_eq!(details["adjustment_details"]["upfront_cents"], 5_000);
    }

    #[tokio::test]
    async fn test_pending_queue_includes_legacy_backfill() {
        let db = test_db().await;
        seed_customer(&db, 100_000).await;

        let tracked = db.sales().create_sale(&credit_sale(10_000), &settings()).await.unwrap();
        let cash = db
            .sales()
            .create_sale(
                &NewSale {
                    payment_method: PaymentMethod::Cash,
                    ..credit_sale(5_000)
                },
                &settings(),
            )
            .await
            .unwrap();

        // A legacy row: credit-bearing method but no review state.
        let legacy = db.sales().create_sale(&credit_sale(20_000), &settings()).await.unwrap();
        sqlx::query("UPDATE sales SET credit_review = NULL WHERE id = ?1")
            .bind(&legacy.id)
            .execute(db.pool())
            .await
            .unwrap();

        let pending = db.credit().pending_credit_sales("t1").await.unwrap();
        let ids: Vec<&str> = pending.iter().map(|p| p.sale.id.as_str()).collect();

        assert!(ids.contains(&tracked.id.as_str()));
        assert!(ids.contains(&legacy.id.as_str()));
        assert!(!ids.contains(&cash.id.as_str()));

        // Every entry is enriched with the customer's credit position.
        for entry in &pending {
            assert_eq!(entry.credit_info.credit_limit_cents, 100_000);
            assert_eq!(entry.credit_info.used_cents, 35_000);
        }
    }

    #[tokio::test]
    async fn test_approved_sale_leaves_pending_queue() {
        let db = test_db().await;
        seed_customer(&db, 100_000).await;

        let sale = db.sales().create_sale(&credit_sale(10_000), &settings()).await.unwrap();
        assert_eq!(db.credit().pending_credit_sales("t1").await.unwrap().len(), 1);

        db.credit()
            .approve_credit("t1", &sale.id, "mgr-1", None, None)
            .await
            .unwrap();
        assert!(db.credit().pending_credit_sales("t1").await.unwrap().is_empty());
    }
}
