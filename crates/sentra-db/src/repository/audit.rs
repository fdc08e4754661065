//! # Credit Log Repository
//!
//! Append-only audit trail of every admission decision and reversal.
//!
//! ## Append-Only Contract
//! There is no update or delete path in this module, and none may be
//! added. A decision is durable only together with its log entry, so the
//! insert happens on the caller's transaction via [`append_tx`]; a failed
//! log write rolls the decision back with it.
//!
//! `details` is a versioned JSON payload: every entry carries
//! `schema_version` plus per-action fields, keeping the trail
//! machine-readable as decision types evolve.

use chrono::Utc;
use sqlx::{SqliteConnection, SqlitePool};
use tracing::debug;
use uuid::Uuid;

use crate::error::DbResult;
use sentra_core::{CreditLogAction, CreditLogEntry};

/// Version stamped into every `details` payload.
pub const DETAILS_SCHEMA_VERSION: i64 = 1;

/// A log entry to be appended.
#[derive(Debug, Clone)]
pub struct NewLogEntry<'a> {
    pub tenant_id: &'a str,
    pub sale_id: Option<&'a str>,
    pub movement_id: Option<&'a str>,
    pub action: CreditLogAction,
    pub actor_id: &'a str,
    pub reason: Option<&'a str>,
    /// Action-specific fields; `schema_version` is added on write.
    pub details: serde_json::Value,
}

/// Appends a log entry on an open transaction.
///
/// Callers pass `&mut *tx` so the entry commits or rolls back atomically
/// with the state change it describes.
pub(crate) async fn append_tx(
    conn: &mut SqliteConnection,
    entry: NewLogEntry<'_>,
) -> DbResult<String> {
    let id = Uuid::new_v4().to_string();
    let now = Utc::now();

    let mut details = entry.details;
    if let serde_json::Value::Object(ref mut map) = details {
        map.insert(
            "schema_version".to_string(),
            serde_json::Value::from(DETAILS_SCHEMA_VERSION),
        );
    }

    debug!(
        tenant_id = %entry.tenant_id,
        action = ?entry.action,
        actor_id = %entry.actor_id,
        "Appending credit log entry"
    );

    sqlx::query(
        r#"
        INSERT INTO credit_log (
            id, tenant_id, sale_id, movement_id,
            action, actor_id, reason, details, created_at
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
        "#,
    )
    .bind(&id)
    .bind(entry.tenant_id)
    .bind(entry.sale_id)
    .bind(entry.movement_id)
    .bind(entry.action)
    .bind(entry.actor_id)
    .bind(entry.reason)
    .bind(details.to_string())
    .bind(now)
    .execute(conn)
    .await?;

    Ok(id)
}

/// Repository for reading the credit log.
#[derive(Debug, Clone)]
pub struct CreditLogRepository {
    pool: SqlitePool,
}

impl CreditLogRepository {
    /// Creates a new CreditLogRepository.
    pub fn new(pool: SqlitePool) -> Self {
        CreditLogRepository { pool }
    }

    /// Entries referencing a sale, oldest first.
    pub async fn for_sale(&self, tenant_id: &str, sale_id: &str) -> DbResult<Vec<CreditLogEntry>> {
        let entries = sqlx::query_as::<_, CreditLogEntry>(
            r#"
            SELECT id, tenant_id, sale_id, movement_id,
                   action, actor_id, reason, details, created_at
            FROM credit_log
            WHERE tenant_id = ?1 AND sale_id = ?2
            ORDER BY created_at, id
            "#,
        )
        .bind(tenant_id)
        .bind(sale_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(entries)
    }

    /// Entries referencing a movement, oldest first.
    pub async fn for_movement(
        &self,
        tenant_id: &str,
        movement_id: &str,
    ) -> DbResult<Vec<CreditLogEntry>> {
        let entries = sqlx::query_as::<_, CreditLogEntry>(
            r#"
            SELECT id, tenant_id, sale_id, movement_id,
                   action, actor_id, reason, details, created_at
            FROM credit_log
            WHERE tenant_id = ?1 AND movement_id = ?2
            ORDER BY created_at, id
            "#,
        )
        .bind(tenant_id)
        .bind(movement_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(entries)
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
    async fn test_append_and_read_back() {
        let db = test_db().await;

        let mut conn = db.pool().acquire().await.unwrap();
        append_tx(
            &mut *conn,
            NewLogEntry {
                tenant_id: "t1",
                sale_id: Some("s1"),
                movement_id: None,
                action: CreditLogAction::CreditApproved,
                actor_id: "mgr-1",
                reason: Some("dentro do limite"),
                details: serde_json::json!({ "decision": "approved" }),
            },
        )
        .await
        .unwrap();
        drop(conn);

        let entries = db.audit().for_sale("t1", "s1").await.unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].action, CreditLogAction::CreditApproved);
        assert_eq!(entries[0].actor_id, "mgr-1");

        // schema_version is stamped into every payload.
        let details: serde_json::Value = serde_json::from_str(&entries[0].details).unwrap();
        assert_eq!(details["schema_version"], DETAILS_SCHEMA_VERSION);
        assert_eq!(details["decision"], "approved");
    }

    #[tokio::test]
    async fn test_entries_are_tenant_scoped() {
        let db = test_db().await;

        let mut conn = db.pool().acquire().await.unwrap();
        append_tx(
            &mut *conn,
            NewLogEntry {
                tenant_id: "t1",
                sale_id: Some("s1"),
                movement_id: None,
                action: CreditLogAction::CreditDenied,
                actor_id: "mgr-1",
                reason: Some("limite excedido"),
                details: serde_json::json!({}),
            },
        )
        .await
        .unwrap();
        drop(conn);

        assert_eq!(db.audit().for_sale("t1", "s1").await.unwrap().len(), 1);
        assert!(db.audit().for_sale("t2", "s1").await.unwrap().is_empty());
    }
}
