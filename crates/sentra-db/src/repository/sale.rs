//! # Sale Repository
//!
//! Sale creation, pendency-code tracking, and price-approval resolution.
//!
//! ## Sale Admission Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                      create_sale()                              │
//! │                                                                 │
//! │  1. VALIDATE      totals invariant, item quantities             │
//! │  2. PRICE POLICY  evaluate every item                           │
//! │       └── any item needs approval ──► add D                     │
//! │  3. STOCK         caller-flagged separation ──► add E           │
//! │  4. CREDIT        credit-bearing method ──► add C,              │
//! │                   review state = pending                        │
//! │  5. INSERT        sale + items, one transaction                 │
//! │                                                                 │
//! │  The sale is invoiceable only when the code set empties.        │
//! └─────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Pendency Mutations
//! Codes are persisted as a canonical string on the sale row. Mutations
//! are compare-and-swap: the update is conditioned on the code string the
//! mutation observed, and lost races retry a bounded number of times.
//! Multiple independent processes call this engine concurrently; there are
//! no application-level locks to lean on, and a sale row must never hold
//! a torn code set.

use chrono::Utc;
use sqlx::SqlitePool;
use tracing::debug;
use uuid::Uuid;

use crate::error::{DbError, DbResult};
use crate::repository::audit::{self, NewLogEntry};
use sentra_core::price_policy::evaluate_price;
use sentra_core::validation::{validate_quantity, validate_reason, validate_sale_totals};
use sentra_core::{
    CreditLogAction, CreditReview, Money, PaymentMethod, PaymentStatus, PendencyCode, PendencySet,
    PriceControlSettings, PriceStatus, Sale, SaleItem,
};

/// Bounded retries for pendency compare-and-swap updates.
const CAS_MAX_RETRIES: u32 = 3;

// =============================================================================
// Input Types
// =============================================================================

/// A sale to be created.
#[derive(Debug, Clone)]
pub struct NewSale {
    pub tenant_id: String,
    pub customer_id: Option<String>,
    /// Already-classified method; free-text labels go through
    /// [`PaymentMethod::from_label`] at the boundary.
    pub payment_method: PaymentMethod,
    pub subtotal_cents: i64,
    pub discount_cents: i64,
    pub total_cents: i64,
    /// Whether the inventory collaborator flagged physical stock
    /// separation for this sale.
    pub requires_stock_separation: bool,
    pub items: Vec<NewSaleItem>,
}

/// A line item of a sale to be created.
#[derive(Debug, Clone)]
pub struct NewSaleItem {
    pub description: String,
    pub quantity: i64,
    /// List price per unit.
    pub unit_price_cents: i64,
    /// Negotiated price per unit actually charged.
    pub final_price_cents: i64,
    /// Per-item floor, when one is configured.
    pub minimum_price_cents: Option<i64>,
}

// =============================================================================
// Repository
// =============================================================================

/// Repository for sale database operations.
#[derive(Debug, Clone)]
pub struct SaleRepository {
    pool: SqlitePool,
}

impl SaleRepository {
    /// Creates a new SaleRepository.
    pub fn new(pool: SqlitePool) -> Self {
        SaleRepository { pool }
    }

    // =========================================================================
    // Creation
    // =========================================================================

    /// Creates a sale with its items, evaluating the price policy and
    /// setting the initial pendency codes, in one transaction.
    ///
    /// ## Pendency Codes Set Here
    /// - `D` when any item's price needs approval
    /// - `E` when the caller flagged stock separation
    /// - `C` (plus a `pending` review state) when the payment method is
    ///   credit-bearing
    pub async fn create_sale(
        &self,
        new: &NewSale,
        settings: &PriceControlSettings,
    ) -> DbResult<Sale> {
        validate_sale_totals(new.subtotal_cents, new.discount_cents, new.total_cents)?;
        for item in &new.items {
            validate_quantity(item.quantity)?;
        }

        let now = Utc::now();
        let sale_id = Uuid::new_v4().to_string();
        let mut pendencies = PendencySet::empty();

        // Evaluate every line item before deciding the sale-level gates.
        let mut evaluated = Vec::with_capacity(new.items.len());
        for item in &new.items {
            let eval = evaluate_price(
                Money::from_cents(item.unit_price_cents),
                Money::from_cents(item.final_price_cents),
                item.minimum_price_cents.map(Money::from_cents),
                settings,
            );
            if eval.needs_approval {
                pendencies.add(PendencyCode::DiscountApproval);
            }
            evaluated.push(eval);
        }

        if new.requires_stock_separation {
            pendencies.add(PendencyCode::StockSeparation);
        }

        let credit_review = if new.payment_method.requires_credit_review() {
            pendencies.add(PendencyCode::CreditReview);
            Some(CreditReview::Pending)
        } else {
            None
        };

        debug!(
            sale_id = %sale_id,
            tenant_id = %new.tenant_id,
            pendency_codes = %pendencies,
            "Creating sale"
        );

        let sale = Sale {
            id: sale_id.clone(),
            tenant_id: new.tenant_id.clone(),
            customer_id: new.customer_id.clone(),
            payment_method: new.payment_method,
            payment_status: PaymentStatus::Pending,
            subtotal_cents: new.subtotal_cents,
            discount_cents: new.discount_cents,
            total_cents: new.total_cents,
            pendency_codes: pendencies.to_code_string(),
            credit_review,
            block_reason: None,
            created_at: now,
            updated_at: now,
        };

        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r#"
            INSERT INTO sales (
                id, tenant_id, customer_id, payment_method, payment_status,
                subtotal_cents, discount_cents, total_cents,
                pendency_codes, credit_review, block_reason,
                created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)
            "#,
        )
        .bind(&sale.id)
        .bind(&sale.tenant_id)
        .bind(&sale.customer_id)
        .bind(sale.payment_method)
        .bind(sale.payment_status)
        .bind(sale.subtotal_cents)
        .bind(sale.discount_cents)
        .bind(sale.total_cents)
        .bind(&sale.pendency_codes)
        .bind(sale.credit_review)
        .bind(&sale.block_reason)
        .bind(sale.created_at)
        .bind(sale.updated_at)
        .execute(&mut *tx)
        .await?;

        for (item, eval) in new.items.iter().zip(&evaluated) {
            let line_discount =
                (item.unit_price_cents - item.final_price_cents).max(0) * item.quantity;
            let line_total = item.final_price_cents * item.quantity;

            sqlx::query(
                r#"
                INSERT INTO sale_items (
                    id, sale_id, description, quantity,
                    unit_price_cents, final_price_cents, minimum_price_cents,
                    discount_cents, total_cents, price_status, created_at
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)
                "#,
            )
            .bind(Uuid::new_v4().to_string())
            .bind(&sale.id)
            .bind(&item.description)
            .bind(item.quantity)
            .bind(item.unit_price_cents)
            .bind(item.final_price_cents)
            .bind(item.minimum_price_cents)
            .bind(line_discount)
            .bind(line_total)
            .bind(eval.status)
            .bind(now)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;

        Ok(sale)
    }

    // =========================================================================
    // Reads
    // =========================================================================

    /// Gets a sale by ID.
    pub async fn get_by_id(&self, tenant_id: &str, sale_id: &str) -> DbResult<Option<Sale>> {
        let sale = sqlx::query_as::<_, Sale>(
            r#"
            SELECT id, tenant_id, customer_id, payment_method, payment_status,
                   subtotal_cents, discount_cents, total_cents,
                   pendency_codes, credit_review, block_reason,
                   created_at, updated_at
            FROM sales
            WHERE tenant_id = ?1 AND id = ?2
            "#,
        )
        .bind(tenant_id)
        .bind(sale_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(sale)
    }

    /// Gets all items for a sale.
    pub async fn get_items(&self, sale_id: &str) -> DbResult<Vec<SaleItem>> {
        let items = sqlx::query_as::<_, SaleItem>(
            r#"
            SELECT id, sale_id, description, quantity,
                   unit_price_cents, final_price_cents, minimum_price_cents,
                   discount_cents, total_cents, price_status, created_at
            FROM sale_items
            WHERE sale_id = ?1
            ORDER BY created_at, id
            "#,
        )
        .bind(sale_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(items)
    }

    // =========================================================================
    // Pendency Tracking
    // =========================================================================

    /// Idempotent union-insert of a pendency code.
    pub async fn add_pendency_code(
        &self,
        tenant_id: &str,
        sale_id: &str,
        code: PendencyCode,
    ) -> DbResult<()> {
        self.mutate_pendencies(tenant_id, sale_id, |set| set.add(code))
            .await
            .map(|_| ())
    }

    /// Idempotent removal of a pendency code.
    pub async fn remove_pendency_code(
        &self,
        tenant_id: &str,
        sale_id: &str,
        code: PendencyCode,
    ) -> DbResult<()> {
        self.mutate_pendencies(tenant_id, sale_id, |set| set.remove(code))
            .await
            .map(|_| ())
    }

    /// Whether the sale currently carries the given code.
    pub async fn has_pendency_code(
        &self,
        tenant_id: &str,
        sale_id: &str,
        code: PendencyCode,
    ) -> DbResult<bool> {
        Ok(self.read_pendencies(tenant_id, sale_id).await?.contains(code))
    }

    /// True iff the sale's pendency-code set is empty.
    pub async fn can_invoice(&self, tenant_id: &str, sale_id: &str) -> DbResult<bool> {
        Ok(self.read_pendencies(tenant_id, sale_id).await?.is_empty())
    }

    async fn read_pendencies(&self, tenant_id: &str, sale_id: &str) -> DbResult<PendencySet> {
        let codes: Option<String> =
            sqlx::query_scalar("SELECT pendency_codes FROM sales WHERE tenant_id = ?1 AND id = ?2")
                .bind(tenant_id)
                .bind(sale_id)
                .fetch_optional(&self.pool)
                .await?;

        codes
            .map(|codes| PendencySet::from_code_string(&codes))
            .ok_or_else(|| DbError::not_found("Sale", sale_id))
    }

    /// Applies a pure mutation to the sale's code set under
    /// compare-and-swap.
    ///
    /// The update is conditioned on the code string observed by the read;
    /// a concurrent writer makes `rows_affected` come back zero and the
    /// mutation re-reads and retries. After [`CAS_MAX_RETRIES`] lost races
    /// the caller gets [`DbError::StaleState`] and decides whether to
    /// retry or abort its workflow; the code set never drifts silently.
    async fn mutate_pendencies<F>(
        &self,
        tenant_id: &str,
        sale_id: &str,
        mutate: F,
    ) -> DbResult<PendencySet>
    where
        F: Fn(&mut PendencySet),
    {
        for _ in 0..CAS_MAX_RETRIES {
            let observed = self.read_pendencies(tenant_id, sale_id).await?;

            let mut updated = observed;
            mutate(&mut updated);

            // No-op mutations (idempotent re-adds/re-removes) skip the write.
            if updated == observed {
                return Ok(observed);
            }

            let result = sqlx::query(
                r#"
                UPDATE sales
                SET pendency_codes = ?3, updated_at = ?4
                WHERE tenant_id = ?1 AND id = ?2 AND pendency_codes = ?5
                "#,
            )
            .bind(tenant_id)
            .bind(sale_id)
            .bind(updated.to_code_string())
            .bind(Utc::now())
            .bind(observed.to_code_string())
            .execute(&self.pool)
            .await?;

            if result.rows_affected() == 1 {
                debug!(
                    sale_id = %sale_id,
                    pendency_codes = %updated,
                    "Pendency codes updated"
                );
                return Ok(updated);
            }
        }

        Err(DbError::stale("Sale", sale_id))
    }

    // =========================================================================
    // Payment Status
    // =========================================================================

    /// Updates the sale's payment collection status. Pending and overdue
    /// sales count toward the customer's open debt.
    pub async fn set_payment_status(
        &self,
        tenant_id: &str,
        sale_id: &str,
        status: PaymentStatus,
    ) -> DbResult<()> {
        let result = sqlx::query(
            r#"
            UPDATE sales
            SET payment_status = ?3, updated_at = ?4
            WHERE tenant_id = ?1 AND id = ?2
            "#,
        )
        .bind(tenant_id)
        .bind(sale_id)
        .bind(status)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Sale", sale_id));
        }

        Ok(())
    }

    // =========================================================================
    // Price Approval Resolution
    // =========================================================================

    /// Approves a single item's price, clearing its price status.
    ///
    /// The acting identity must be in the tenant's approver set. The `D`
    /// code stays until the whole sale is approved.
    pub async fn approve_item_price(
        &self,
        tenant_id: &str,
        item_id: &str,
        approver_id: &str,
        settings: &PriceControlSettings,
    ) -> DbResult<()> {
        if !settings.is_approver(approver_id) {
            return Err(DbError::NotAnApprover {
                user_id: approver_id.to_string(),
            });
        }

        let mut tx = self.pool.begin().await?;

        let sale_id: Option<String> = sqlx::query_scalar(
            r#"
            SELECT si.sale_id
            FROM sale_items si
            JOIN sales s ON s.id = si.sale_id
            WHERE si.id = ?1 AND s.tenant_id = ?2
            "#,
        )
        .bind(item_id)
        .bind(tenant_id)
        .fetch_optional(&mut *tx)
        .await?;

        let sale_id = sale_id.ok_or_else(|| DbError::not_found("Sale item", item_id))?;

        let result = sqlx::query(
            "UPDATE sale_items SET price_status = ?2 WHERE id = ?1 AND price_status != ?2",
        )
        .bind(item_id)
        .bind(PriceStatus::Ok)
        .execute(&mut *tx)
        .await?;

        if result.rows_affected() == 1 {
            audit::append_tx(
                &mut *tx,
                NewLogEntry {
                    tenant_id,
                    sale_id: Some(&sale_id),
                    movement_id: None,
                    action: CreditLogAction::PriceApproved,
                    actor_id: approver_id,
                    reason: None,
                    details: serde_json::json!({ "scope": "item", "item_id": item_id }),
                },
            )
            .await?;
        }

        tx.commit().await?;

        Ok(())
    }

    /// Approves an entire sale's prices: clears every item flagged
    /// `discount_exceeded` or `below_minimum`, drops the `D` pendency
    /// code, and clears any block reason, releasing the discount gate.
    pub async fn approve_sale_prices(
        &self,
        tenant_id: &str,
        sale_id: &str,
        approver_id: &str,
        settings: &PriceControlSettings,
    ) -> DbResult<()> {
        if !settings.is_approver(approver_id) {
            return Err(DbError::NotAnApprover {
                user_id: approver_id.to_string(),
            });
        }

        let mut tx = self.pool.begin().await?;

        let exists: Option<String> =
            sqlx::query_scalar("SELECT id FROM sales WHERE tenant_id = ?1 AND id = ?2")
                .bind(tenant_id)
                .bind(sale_id)
                .fetch_optional(&mut *tx)
                .await?;
        if exists.is_none() {
            return Err(DbError::not_found("Sale", sale_id));
        }

        let cleared = sqlx::query(
            r#"
            UPDATE sale_items
            SET price_status = ?2
            WHERE sale_id = ?1 AND price_status IN (?3, ?4)
            "#,
        )
        .bind(sale_id)
        .bind(PriceStatus::Ok)
        .bind(PriceStatus::DiscountExceeded)
        .bind(PriceStatus::BelowMinimum)
        .execute(&mut *tx)
        .await?;

        // Single UPDATE keeps the code mutation atomic with the release.
        sqlx::query(
            r#"
            UPDATE sales
            SET pendency_codes = REPLACE(pendency_codes, 'D', ''),
                block_reason = NULL,
                updated_at = ?3
            WHERE tenant_id = ?1 AND id = ?2
            "#,
        )
        .bind(tenant_id)
        .bind(sale_id)
        .bind(Utc::now())
        .execute(&mut *tx)
        .await?;

        audit::append_tx(
            &mut *tx,
            NewLogEntry {
                tenant_id,
                sale_id: Some(sale_id),
                movement_id: None,
                action: CreditLogAction::PriceApproved,
                actor_id: approver_id,
                reason: None,
                details: serde_json::json!({
                    "scope": "sale",
                    "items_cleared": cleared.rows_affected(),
                }),
            },
        )
        .await?;

        tx.commit().await?;

        debug!(sale_id = %sale_id, approver_id = %approver_id, "Sale prices approved");

        Ok(())
    }

    /// Rejects a sale's prices: records the block reason and leaves the
    /// item statuses and the `D` code in place, so the sale stays
    /// non-released until it is re-submitted.
    pub async fn reject_sale_prices(
        &self,
        tenant_id: &str,
        sale_id: &str,
        approver_id: &str,
        reason: &str,
        settings: &PriceControlSettings,
    ) -> DbResult<()> {
        let reason = validate_reason(reason)?;

        if !settings.is_approver(approver_id) {
            return Err(DbError::NotAnApprover {
                user_id: approver_id.to_string(),
            });
        }

        let mut tx = self.pool.begin().await?;

        let result = sqlx::query(
            r#"
            UPDATE sales
            SET block_reason = ?3, updated_at = ?4
            WHERE tenant_id = ?1 AND id = ?2
            "#,
        )
        .bind(tenant_id)
        .bind(sale_id)
        .bind(&reason)
        .bind(Utc::now())
        .execute(&mut *tx)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Sale", sale_id));
        }

        audit::append_tx(
            &mut *tx,
            NewLogEntry {
                tenant_id,
                sale_id: Some(sale_id),
                movement_id: None,
                action: CreditLogAction::PriceRejected,
                actor_id: approver_id,
                reason: Some(&reason),
                details: serde_json::json!({ "scope": "sale" }),
            },
        )
        .await?;

        tx.commit().await?;

        Ok(())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{Database, DbConfig};

    async fn test_db() -> Database {
        Database::new(DbConfig::in_memory()).await.unwrap()
    }

    fn control_settings() -> PriceControlSettings {
        let mut settings = PriceControlSettings::disabled("t1");
        settings.enabled = true;
        settings.max_discount_bps = 2_000;
        settings.approvers = PriceControlSettings::approvers_json(&["mgr-1"]);
        settings
    }

    fn plain_sale(payment_method: PaymentMethod) -> NewSale {
        NewSale {
            tenant_id: "t1".to_string(),
            customer_id: Some("c1".to_string()),
            payment_method,
            subtotal_cents: 10_000,
            discount_cents: 0,
            total_cents: 10_000,
            requires_stock_separation: false,
            items: vec![NewSaleItem {
                description: "Item".to_string(),
                quantity: 1,
                unit_price_cents: 10_000,
                final_price_cents: 10_000,
                minimum_price_cents: None,
            }],
        }
    }

    #[tokio::test]
    async fn test_cash_sale_within_policy_is_invoiceable() {
        let db = test_db().await;

        let sale = db
            .sales()
            .create_sale(&plain_sale(PaymentMethod::Cash), &control_settings())
            .await
            .unwrap();

        assert!(sale.is_invoiceable());
        assert!(sale.credit_review.is_none());
        assert!(db.sales().can_invoice("t1", &sale.id).await.unwrap());
    }

    #[tokio::test]
    async fn test_discount_violation_sets_d_code() {
        let db = test_db().await;

        let mut new = plain_sale(PaymentMethod::Cash);
        new.items[0].final_price_cents = 7_000; // 30% off with a 20% cap
        new.discount_cents = 3_000;
        new.total_cents = 7_000;

        let sale = db
            .sales()
            .create_sale(&new, &control_settings())
            .await
            .unwrap();

        assert_eq!(sale.pendency_codes, "D");

        let items = db.sales().get_items(&sale.id).await.unwrap();
        assert_eq!(items[0].price_status, PriceStatus::DiscountExceeded);
    }

    #[tokio::test]
    async fn test_credit_bearing_sale_sets_c_and_pending_review() {
        let db = test_db().await;

        let sale = db
            .sales()
            .create_sale(&plain_sale(PaymentMethod::Boleto), &control_settings())
            .await
            .unwrap();

        assert_eq!(sale.pendency_codes, "C");
        assert_eq!(sale.credit_review, Some(CreditReview::Pending));
        assert!(!db.sales().can_invoice("t1", &sale.id).await.unwrap());
    }

    #[tokio::test]
    async fn test_inconsistent_totals_rejected_before_write() {
        let db = test_db().await;

        let mut new = plain_sale(PaymentMethod::Cash);
        new.total_cents = 9_999;

        let err = db
            .sales()
            .create_sale(&new, &control_settings())
            .await
            .unwrap_err();
        assert!(err.is_rejection());
    }

    #[tokio::test]
    async fn test_invoiceable_only_after_both_codes_removed() {
        let db = test_db().await;

        let mut new = plain_sale(PaymentMethod::Boleto);
        new.requires_stock_separation = true;
        let sale = db
            .sales()
            .create_sale(&new, &control_settings())
            .await
            .unwrap();
        assert_eq!(sale.pendency_codes, "EC");

        let sales = db.sales();
        sales
            .remove_pendency_code("t1", &sale.id, PendencyCode::StockSeparation)
            .await
            .unwrap();
        assert!(!sales.can_invoice("t1", &sale.id).await.unwrap());

        sales
            .remove_pendency_code("t1", &sale.id, PendencyCode::CreditReview)
            .await
            .unwrap();
        assert!(sales.can_invoice("t1", &sale.id).await.unwrap());
    }

    #[tokio::test]
    async fn test_pendency_mutations_are_idempotent() {
        let db = test_db().await;

        let sale = db
            .sales()
            .create_sale(&plain_sale(PaymentMethod::Cash), &control_settings())
            .await
            .unwrap();
        let sales = db.sales();

        sales
            .add_pendency_code("t1", &sale.id, PendencyCode::StockSeparation)
            .await
            .unwrap();
        sales
            .add_pendency_code("t1", &sale.id, PendencyCode::StockSeparation)
            .await
            .unwrap();
        assert_eq!(
            sales.get_by_id("t1", &sale.id).await.unwrap().unwrap().pendency_codes,
            "E"
        );

        // Removing an already-cleared code leaves the set unchanged.
        sales
            .remove_pendency_code("t1", &sale.id, PendencyCode::StockSeparation)
            .await
            .unwrap();
        sales
            .remove_pendency_code("t1", &sale.id, PendencyCode::StockSeparation)
            .await
            .unwrap();
        assert_eq!(
            sales.get_by_id("t1", &sale.id).await.unwrap().unwrap().pendency_codes,
            ""
        );
    }

    #[tokio::test]
    async fn test_pendency_ops_on_missing_sale_fail() {
        let db = test_db().await;
        let err = db
            .sales()
            .add_pendency_code("t1", "nope", PendencyCode::StockSeparation)
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_approve_sale_prices_releases_discount_gate() {
        let db = test_db().await;
        let settings = control_settings();

        let mut new = plain_sale(PaymentMethod::Cash);
        new.items[0].final_price_cents = 7_000;
        new.discount_cents = 3_000;
        new.total_cents = 7_000;
        let sale = db.sales().create_sale(&new, &settings).await.unwrap();
        assert_eq!(sale.pendency_codes, "D");

        db.sales()
            .approve_sale_prices("t1", &sale.id, "mgr-1", &settings)
            .await
            .unwrap();

        let after = db.sales().get_by_id("t1", &sale.id).await.unwrap().unwrap();
        assert!(after.is_invoiceable());
        assert!(after.block_reason.is_none());

        let items = db.sales().get_items(&sale.id).await.unwrap();
        assert_eq!(items[0].price_status, PriceStatus::Ok);

        let log = db.audit().for_sale("t1", &sale.id).await.unwrap();
        assert_eq!(log.len(), 1);
        assert_eq!(log[0].action, CreditLogAction::PriceApproved);
    }

    #[tokio::test]
    async fn test_non_approver_cannot_resolve() {
        let db = test_db().await;
        let settings = control_settings();

        let mut new = plain_sale(PaymentMethod::Cash);
        new.items[0].final_price_cents = 7_000;
        new.discount_cents = 3_000;
        new.total_cents = 7_000;
        let sale = db.sales().create_sale(&new, &settings).await.unwrap();

        let err = db
            .sales()
            .approve_sale_prices("t1", &sale.id, "seller-9", &settings)
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::NotAnApprover { .. }));

        // Nothing changed.
        let after = db.sales().get_by_id("t1", &sale.id).await.unwrap().unwrap();
        assert_eq!(after.pendency_codes, "D");
    }

    #[tokio::test]
    async fn test_reject_sets_block_reason_and_keeps_gate() {
        let db = test_db().await;
        let settings = control_settings();

        let mut new = plain_sale(PaymentMethod::Cash);
        new.items[0].final_price_cents = 7_000;
        new.discount_cents = 3_000;
        new.total_cents = 7_000;
        let sale = db.sales().create_sale(&new, &settings).await.unwrap();

        let err = db
            .sales()
            .reject_sale_prices("t1", &sale.id, "mgr-1", "  ", &settings)
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::Validation(_)));

        db.sales()
            .reject_sale_prices("t1", &sale.id, "mgr-1", "desconto fora da alçada", &settings)
            .await
            .unwrap();

        let after = db.sales().get_by_id("t1", &sale.id).await.unwrap().unwrap();
        assert_eq!(after.block_reason.as_deref(), Some("desconto fora da alçada"));
        assert_eq!(after.pendency_codes, "D");

        let log = db.audit().for_sale("t1", &sale.id).await.unwrap();
        assert_eq!(log[0].action, CreditLogAction::PriceRejected);
    }

    #[tokio::test]
    async fn test_approve_single_item() {
        let db = test_db().await;
        let settings = control_settings();

        let mut new = plain_sale(PaymentMethod::Cash);
        new.items.push(NewSaleItem {
            description: "Item 2".to_string(),
            quantity: 1,
            unit_price_cents: 10_000,
            final_price_cents: 7_000,
            minimum_price_cents: None,
        });
        new.subtotal_cents = 20_000;
        new.discount_cents = 3_000;
        new.total_cents = 17_000;
        let sale = db.sales().create_sale(&new, &settings).await.unwrap();

        let items = db.sales().get_items(&sale.id).await.unwrap();
        let flagged = items
            .iter()
            .find(|i| i.price_status == PriceStatus::DiscountExceeded)
            .unwrap();

        db.sales()
            .approve_item_price("t1", &flagged.id, "mgr-1", &settings)
            .await
            .unwrap();

        let items = db.sales().get_items(&sale.id).await.unwrap();
        assert!(items.iter().all(|i| i.price_status == PriceStatus::Ok));

        // Item approval alone does not release the sale-level gate.
        let after = db.sales().get_by_id("t1", &sale.id).await.unwrap().unwrap();
        assert_eq!(after.pendency_codes, "D");
    }
}
