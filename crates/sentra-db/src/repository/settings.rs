//! # Settings Repository
//!
//! Per-tenant price control settings and customer credit limits.
//!
//! The price policy validator only ever reads settings; writes go through
//! the administrative upsert below. Customer records carry nothing but the
//! credit limit the admission controller needs.

use chrono::Utc;
use sqlx::SqlitePool;
use tracing::debug;

use crate::error::DbResult;
use sentra_core::{Customer, PriceControlSettings};

/// Repository for tenant configuration reads and administrative writes.
#[derive(Debug, Clone)]
pub struct SettingsRepository {
    pool: SqlitePool,
}

impl SettingsRepository {
    /// Creates a new SettingsRepository.
    pub fn new(pool: SqlitePool) -> Self {
        SettingsRepository { pool }
    }

    // =========================================================================
    // Price Control Settings
    // =========================================================================

    /// Gets the tenant's price control settings.
    ///
    /// A tenant with no row gets a disabled policy: price control is
    /// opt-in.
    pub async fn price_control(&self, tenant_id: &str) -> DbResult<PriceControlSettings> {
        let settings = sqlx::query_as::<_, PriceControlSettings>(
            r#"
            SELECT tenant_id, enabled, max_discount_bps, approval_floor_cents,
                   approvers, currency_symbol, updated_at
            FROM price_control_settings
            WHERE tenant_id = ?1
            "#,
        )
        .bind(tenant_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(settings.unwrap_or_else(|| PriceControlSettings::disabled(tenant_id)))
    }

    /// Administrative upsert of a tenant's price control settings.
    pub async fn upsert_price_control(&self, settings: &PriceControlSettings) -> DbResult<()> {
        debug!(tenant_id = %settings.tenant_id, enabled = settings.enabled, "Upserting price control settings");

        let now = Utc::now();

        sqlx::query(
            r#"
            INSERT INTO price_control_settings (
                tenant_id, enabled, max_discount_bps, approval_floor_cents,
                approvers, currency_symbol, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            ON CONFLICT (tenant_id) DO UPDATE SET
                enabled = excluded.enabled,
                max_discount_bps = excluded.max_discount_bps,
                approval_floor_cents = excluded.approval_floor_cents,
                approvers = excluded.approvers,
                currency_symbol = excluded.currency_symbol,
                updated_at = excluded.updated_at
            "#,
        )
        .bind(&settings.tenant_id)
        .bind(settings.enabled)
        .bind(settings.max_discount_bps)
        .bind(settings.approval_floor_cents)
        .bind(&settings.approvers)
        .bind(&settings.currency_symbol)
        .bind(now)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    // =========================================================================
    // Customers
    // =========================================================================

    /// Gets a customer by ID.
    pub async fn customer(&self, tenant_id: &str, customer_id: &str) -> DbResult<Option<Customer>> {
        let customer = sqlx::query_as::<_, Customer>(
            r#"
            SELECT id, tenant_id, name, credit_limit_cents, created_at, updated_at
            FROM customers
            WHERE tenant_id = ?1 AND id = ?2
            "#,
        )
        .bind(tenant_id)
        .bind(customer_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(customer)
    }

    /// Upserts a customer record (name and credit limit).
    pub async fn upsert_customer(&self, customer: &Customer) -> DbResult<()> {
        debug!(
            customer_id = %customer.id,
            credit_limit_cents = customer.credit_limit_cents,
            "Upserting customer"
        );

        let now = Utc::now();

        sqlx::query(
            r#"
            INSERT INTO customers (
                id, tenant_id, name, credit_limit_cents, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?5)
            ON CONFLICT (id) DO UPDATE SET
                name = excluded.name,
                credit_limit_cents = excluded.credit_limit_cents,
                updated_at = excluded.updated_at
            "#,
        )
        .bind(&customer.id)
        .bind(&customer.tenant_id)
        .bind(&customer.name)
        .bind(customer.credit_limit_cents)
        .bind(now)
        .execute(&self.pool)
        .await?;

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

    #[tokio::test]
    async fn test_missing_settings_default_to_disabled() {
        let db = test_db().await;

        let settings = db.settings().price_control("t1").await.unwrap();
        assert!(!settings.enabled);
        assert_eq!(settings.tenant_id, "t1");
    }

    #[tokio::test]
    async fn test_upsert_and_read_settings() {
        let db = test_db().await;

        let mut settings = PriceControlSettings::disabled("t1");
        settings.enabled = true;
        settings.max_discount_bps = 2_000;
        settings.approval_floor_cents = 5_000;
        settings.approvers = PriceControlSettings::approvers_json(&["mgr-1"]);
        settings.currency_symbol = "R$".to_string();

        db.settings().upsert_price_control(&settings).await.unwrap();

        let read = db.settings().price_control("t1").await.unwrap();
        assert!(read.enabled);
        assert_eq!(read.max_discount_bps, 2_000);
        assert_eq!(read.approval_floor_cents, 5_000);
        assert!(read.is_approver("mgr-1"));
        assert_eq!(read.currency_symbol, "R$");

        // Second upsert overwrites in place.
        settings.enabled = false;
        db.settings().upsert_price_control(&settings).await.unwrap();
        assert!(!db.settings().price_control("t1").await.unwrap().enabled);
    }

    #[tokio::test]
    async fn test_customer_upsert_and_read() {
        let db = test_db().await;

        let customer = Customer {
            id: "c1".to_string(),
            tenant_id: "t1".to_string(),
            name: "Mercearia Central".to_string(),
            credit_limit_cents: 100_000,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        db.settings().upsert_customer(&customer).await.unwrap();

        let read = db.settings().customer("t1", "c1").await.unwrap().unwrap();
        assert_eq!(read.name, "Mercearia Central");
        assert_eq!(read.credit_limit_cents, 100_000);

        assert!(db.settings().customer("t2", "c1").await.unwrap().is_none());
    }
}
