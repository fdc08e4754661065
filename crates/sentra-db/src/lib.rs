//! # sentra-db: Database Layer for the Admission & Reversal Engine
//!
//! SQLite persistence for Sentra via sqlx: connection pooling, embedded
//! migrations, and the repositories that implement the engine's stateful
//! contracts.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                   Surrounding Application                       │
//! └─────────────────────────────┬───────────────────────────────────┘
//!                               │
//! ┌─────────────────────────────▼───────────────────────────────────┐
//! │                   sentra-db (THIS CRATE)                        │
//! │                                                                 │
//! │  ┌─────────────┐   ┌────────────────┐   ┌──────────────┐        │
//! │  │  Database   │   │  Repositories  │   │  Migrations  │        │
//! │  │  (pool.rs)  │◄──│  sale, credit, │   │  (embedded)  │        │
//! │  │  SqlitePool │   │  movement, ... │   │  001_init    │        │
//! │  └─────────────┘   └────────────────┘   └──────────────┘        │
//! │                                                                 │
//! └─────────────────────────────┬───────────────────────────────────┘
//!                               │
//! ┌─────────────────────────────▼───────────────────────────────────┐
//! │                      SQLite Database (WAL)                      │
//! └─────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//!
//! - [`pool`] - Connection pool creation and configuration
//! - [`migrations`] - Embedded database migrations
//! - [`error`] - Database error types and the rejection taxonomy
//! - [`repository`] - Repository implementations
//!
//! ## Usage
//!
//! ```rust,ignore
//! use sentra_db::{Database, DbConfig};
//!
//! let db = Database::new(DbConfig::new("sentra.db")).await?;
//!
//! let settings = db.settings().price_control("tenant-1").await?;
//! let sale = db.sales().create_sale(&new_sale, &settings).await?;
//! let decision = db
//!     .credit()
//!     .can_customer_make_credit_sale("tenant-1", sale.customer_id.as_deref(),
//!                                    credit_limit, sale.total(), None)
//!     .await?;
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod migrations;
pub mod pool;
pub mod repository;

// =============================================================================
// Re-exports
// =============================================================================

pub use error::{DbError, DbResult};
pub use pool::{Database, DbConfig};

// Repository re-exports for convenience
pub use repository::audit::CreditLogRepository;
pub use repository::credit::{CreditRepository, PendingCreditSale};
pub use repository::movement::{MovementRepository, NewMovement};
pub use repository::sale::{NewSale, NewSaleItem, SaleRepository};
pub use repository::settings::SettingsRepository;
