//! # topup-service: Purchase and Redemption Orchestration
//!
//! The single entry point for every flow that changes loyalty state. The
//! pure decisions live in `topup-core`; this crate sequences them against a
//! [`TopupStore`] and reports exactly one outcome per call.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  topup-cli / any other driver                                           │
//! │       │  user_id passed explicitly on every call                        │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                 topup-service (THIS CRATE)                      │   │
//! │  │                                                                 │   │
//! │  │   TopupService<S: TopupStore>                                   │   │
//! │  │     purchase ─► validate ─► price ─► accrue ─► commit_purchase  │   │
//! │  │     redeem_voucher ─► eligibility ─► redeem                     │   │
//! │  │                                                                 │   │
//! │  │   TopupStore ◄── impl for topup_db::Database (sqlite.rs)        │   │
//! │  │              ◄── MemoryStore (memory.rs)                        │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//!
//! ```rust,ignore
//! use topup_service::{PurchaseRequest, TopupService};
//!
//! let service = TopupService::new(db);
//! let receipt = service
//!     .purchase("user-1", PurchaseRequest {
//!         product_id,
//!         user_game_id: "12345678".into(),
//!         payment_method: "gopay".into(),
//!         user_voucher_id: Some(voucher_id),
//!     })
//!     .await?;
//! println!("Charged {}", receipt.transaction.total());
//! ```

pub mod error;
pub mod memory;
pub mod service;
pub mod sqlite;
pub mod store;

pub use error::{ServiceError, ServiceResult};
pub use memory::MemoryStore;
pub use service::{
    GameProducts, ProfileView, PurchaseReceipt, PurchaseRequest, RedemptionReceipt, TopupService,
    Vault,
};
pub use store::{StoreError, StoreResult, TopupStore};
pub use topup_db::PurchaseCommit;
