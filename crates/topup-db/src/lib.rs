//! # topup-db: Database Layer for the Top-up Storefront
//!
//! SQLite storage through sqlx. Pricing and loyalty decisions come from
//! `topup-core`; this crate persists them, and owns the two multi-row
//! writes that must be atomic.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  topup-service (TopupStore impl for Database)                           │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                     topup-db (THIS CRATE)                       │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────────┐    ┌────────────────────┐  ┌────────────┐  │   │
//! │  │   │   Database    │    │   Repositories     │  │ Migrations │  │   │
//! │  │   │   (pool.rs)   │◄───│ CatalogRepository  │  │ (embedded) │  │   │
//! │  │   │               │    │ ProfileRepository  │  │            │  │   │
//! │  │   │ SqlitePool    │    │ UserVoucherRepo    │  │ 001_init   │  │   │
//! │  │   │ redeem()      │    │ TransactionRepo    │  │            │  │   │
//! │  │   │ commit_...()  │    │                    │  │            │  │   │
//! │  │   └───────────────┘    └────────────────────┘  └────────────┘  │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//!
//! ```rust,ignore
//! use topup_db::{Database, DbConfig};
//!
//! let db = Database::new(DbConfig::new("topup.db")).await?;
//! let games = db.catalog().list_active_games().await?;
//! ```

pub mod error;
pub mod migrations;
pub mod pool;
pub mod repository;

pub use error::{DbError, DbResult};
pub use pool::{Database, DbConfig, PurchaseCommit};

pub use repository::catalog::CatalogRepository;
pub use repository::ledger::LedgerRepository;
pub use repository::profile::ProfileRepository;
pub use repository::transaction::TransactionRepository;
pub use repository::voucher::UserVoucherRepository;
