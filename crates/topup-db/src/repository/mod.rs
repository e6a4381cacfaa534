//! # Repository Module
//!
//! Database repository implementations.
//!
//! ## Repository Pattern
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  topup-service                                                         │
//! │       │                                                                 │
//! │       │  db.catalog().get_product(id)                                   │
//! │       ▼                                                                 │
//! │  CatalogRepository / ProfileRepository / ...                           │
//! │       │                                                                 │
//! │       │  SQL Query                                                      │
//! │       ▼                                                                 │
//! │  SQLite Database                                                       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Available Repositories
//!
//! - [`CatalogRepository`](catalog::CatalogRepository) - Games, products, voucher templates
//! - [`ProfileRepository`](profile::ProfileRepository) - Profiles and balances
//! - [`UserVoucherRepository`](voucher::UserVoucherRepository) - Redeemed voucher instances
//! - [`TransactionRepository`](transaction::TransactionRepository) - Purchase records
//! - [`LedgerRepository`](ledger::LedgerRepository) - Multi-row atomic writes

pub mod catalog;
pub mod ledger;
pub mod profile;
pub mod transaction;
pub mod voucher;

#[cfg(test)]
pub(crate) mod test_support;
