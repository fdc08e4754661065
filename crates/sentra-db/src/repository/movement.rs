//! # Financial Movement Repository
//!
//! Ledger entries and the compensating-transaction reversal engine.
//!
//! ## Reversal Contract
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                 reverse(movement, reason, actor)                │
//! │                                                                 │
//! │  preconditions  reason non-empty, movement not yet reversed     │
//! │                                                                 │
//! │  one transaction:                                               │
//! │   1. INSERT compensating movement                               │
//! │        direction flipped, equal value, same account and         │
//! │        classification, description prefixed "Reversal: ",       │
//! │        back-reference to the original                           │
//! │   2. UPDATE original SET is_reversed = 1 ...                    │
//! │        WHERE is_reversed = 0    ← concurrent-reversal guard     │
//! │   3. INSERT credit-log entry referencing both movements         │
//! │                                                                 │
//! │  any step failing ──► rollback, no orphan entry, original       │
//! │  untouched                                                      │
//! └─────────────────────────────────────────────────────────────────┘
//! ```
//!
//! A reversed movement is terminal: a second reversal is rejected with a
//! named error and performs no writes. History is never deleted; the pair
//! of rows nets to zero.

use chrono::Utc;
use sqlx::SqlitePool;
use tracing::{debug, info};
use uuid::Uuid;

use crate::error::{DbError, DbResult};
use crate::repository::audit::{self, NewLogEntry};
use sentra_core::validation::{validate_movement_value, validate_reason};
use sentra_core::{CreditLogAction, FinancialMovement, MovementDirection};

/// Prefix marking a compensating entry's description.
const REVERSAL_PREFIX: &str = "Reversal: ";

// =============================================================================
// Input Types
// =============================================================================

/// A movement to be posted.
#[derive(Debug, Clone)]
pub struct NewMovement {
    pub tenant_id: String,
    pub direction: MovementDirection,
    /// Positive cents; direction, not sign, encodes in/out.
    pub value_cents: i64,
    pub account: String,
    pub nature: Option<String>,
    pub cost_center: Option<String>,
    pub description: String,
}

// =============================================================================
// Repository
// =============================================================================

/// Repository for financial movement operations.
#[derive(Debug, Clone)]
pub struct MovementRepository {
    pool: SqlitePool,
}

impl MovementRepository {
    /// Creates a new MovementRepository.
    pub fn new(pool: SqlitePool) -> Self {
        MovementRepository { pool }
    }

    /// Posts a new movement to the ledger.
    pub async fn insert(&self, new: &NewMovement) -> DbResult<FinancialMovement> {
        validate_movement_value(new.value_cents)?;

        let movement = FinancialMovement {
            id: Uuid::new_v4().to_string(),
            tenant_id: new.tenant_id.clone(),
            direction: new.direction,
            value_cents: new.value_cents,
            account: new.account.clone(),
            nature: new.nature.clone(),
            cost_center: new.cost_center.clone(),
            description: new.description.clone(),
            reverses_movement_id: None,
            is_reversed: false,
            reversed_at: None,
            reversed_by: None,
            reverse_reason: None,
            created_at: Utc::now(),
        };

        debug!(
            movement_id = %movement.id,
            direction = ?movement.direction,
            value_cents = movement.value_cents,
            "Posting movement"
        );

        insert_movement(&self.pool, &movement).await?;

        Ok(movement)
    }

    /// Gets a movement by ID.
    pub async fn get_by_id(
        &self,
        tenant_id: &str,
        movement_id: &str,
    ) -> DbResult<Option<FinancialMovement>> {
        let movement = sqlx::query_as::<_, FinancialMovement>(
            r#"
            SELECT id, tenant_id, direction, value_cents, account,
                   nature, cost_center, description, reverses_movement_id,
                   is_reversed, reversed_at, reversed_by, reverse_reason,
                   created_at
            FROM financial_movements
            WHERE tenant_id = ?1 AND id = ?2
            "#,
        )
        .bind(tenant_id)
        .bind(movement_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(movement)
    }

    /// Reverses a posted movement.
    ///
    /// Inserts a compensating entry (direction flipped, equal value, same
    /// account and classification), marks the original reversed, and
    /// appends the audit entry, atomically. An already-reversed movement
    /// is rejected with [`DbError::AlreadyReversed`] and no writes.
    ///
    /// Returns the compensating movement.
    pub async fn reverse(
        &self,
        tenant_id: &str,
        movement_id: &str,
        reason: &str,
        actor_id: &str,
    ) -> DbResult<FinancialMovement> {
        let reason = validate_reason(reason)?;

        let original = self
            .get_by_id(tenant_id, movement_id)
            .await?
            .ok_or_else(|| DbError::not_found("Movement", movement_id))?;

        if original.is_reversed {
            return Err(DbError::AlreadyReversed {
                id: movement_id.to_string(),
            });
        }

        let now = Utc::now();
        let compensating = FinancialMovement {
            id: Uuid::new_v4().to_string(),
            tenant_id: original.tenant_id.clone(),
            direction: original.direction.flipped(),
            value_cents: original.value_cents,
            account: original.account.clone(),
            nature: original.nature.clone(),
            cost_center: original.cost_center.clone(),
            description: format!("{}{}", REVERSAL_PREFIX, original.description),
            reverses_movement_id: Some(original.id.clone()),
            is_reversed: false,
            reversed_at: None,
            reversed_by: None,
            reverse_reason: None,
            created_at: now,
        };

        let mut tx = self.pool.begin().await?;

        insert_movement(&mut *tx, &compensating).await?;

        // Conditional flip: a concurrent reversal that won the race makes
        // this affect zero rows, and the whole transaction rolls back.
        let result = sqlx::query(
            r#"
            UPDATE financial_movements
            SET is_reversed = 1, reversed_at = ?3, reversed_by = ?4,
                reverse_reason = ?5
            WHERE tenant_id = ?1 AND id = ?2 AND is_reversed = 0
            "#,
        )
        .bind(tenant_id)
        .bind(movement_id)
        .bind(now)
        .bind(actor_id)
        .bind(&reason)
        .execute(&mut *tx)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::AlreadyReversed {
                id: movement_id.to_string(),
            });
        }

        audit::append_tx(
            &mut *tx,
            NewLogEntry {
                tenant_id,
                sale_id: None,
                movement_id: Some(movement_id),
                action: CreditLogAction::MovementReversed,
                actor_id,
                reason: Some(&reason),
                details: serde_json::json!({
                    "original_movement_id": original.id,
                    "compensating_movement_id": compensating.id,
                    "value_cents": original.value_cents,
                    "direction": original.direction,
                }),
            },
        )
        .await?;

        tx.commit().await?;

        info!(
            movement_id = %movement_id,
            compensating_id = %compensating.id,
            actor_id = %actor_id,
            "Movement reversed"
        );

        Ok(compensating)
    }

    /// Net signed effect of an account's movements, in cents: inflows
    /// positive, outflows negative. A reversed pair contributes zero.
    pub async fn ledger_net(&self, tenant_id: &str, account: &str) -> DbResult<i64> {
        let net: Option<i64> = sqlx::query_scalar(
            r#"
            SELECT SUM(CASE direction WHEN 'in' THEN value_cents ELSE -value_cents END)
            FROM financial_movements
            WHERE tenant_id = ?1 AND account = ?2
            "#,
        )
        .bind(tenant_id)
        .bind(account)
        .fetch_one(&self.pool)
        .await?;

        Ok(net.unwrap_or(0))
    }
}

/// Inserts a movement row on any executor (pool or open transaction).
async fn insert_movement<'e, E>(executor: E, movement: &FinancialMovement) -> DbResult<()>
where
    E: sqlx::Executor<'e, Database = sqlx::Sqlite>,
{
    sqlx::query(
        r#"
        INSERT INTO financial_movements (
            id, tenant_id, direction, value_cents, account,
            nature, cost_center, description, reverses_movement_id,
            is_reversed, reversed_at, reversed_by, reverse_reason,
            created_at
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14)
        "#,
    )
    .bind(&movement.id)
    .bind(&movement.tenant_id)
    .bind(movement.direction)
    .bind(movement.value_cents)
    .bind(&movement.account)
    .bind(&movement.nature)
    .bind(&movement.cost_center)
    .bind(&movement.description)
    .bind(&movement.reverses_movement_id)
    .bind(movement.is_reversed)
    .bind(movement.reversed_at)
    .bind(movement.reversed_by.as_deref())
    .bind(movement.reverse_reason.as_deref())
    .bind(movement.created_at)
    .execute(executor)
    .await?;

    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================
