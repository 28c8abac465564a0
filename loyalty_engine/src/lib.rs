//! Loyalty Engine
//!
//! The loyalty engine is the core of the loyalty points server. Users submit purchase-order numbers; an external
//! accrual oracle decides, some time later, whether each order earns points and how many. Users can spend points they
//! have accrued.
//!
//! The library is divided into three main sections:
//! 1. Database management and control ([`mod@traits`] and [`SqliteDatabase`]). Backends implement the traits in
//!    [`mod@traits`]; SQLite is the supported backend. The data types stored in the database live in [`db_types`].
//! 2. Accrual reconciliation ([`mod@accrual`]). A background loop picks up orders that are waiting on a verdict, asks
//!    the oracle about them with bounded concurrency and retries, and writes the verdicts back. Balances are never
//!    stored, so a verdict only ever touches the order it is about.
//! 3. The user-facing API ([`OrderApi`], [`BalanceApi`] and [`UserApi`]). Order submission, balances, withdrawals and
//!    user registration, independent of any transport.
pub mod accrual;
pub mod db_types;
mod loyalty_api;
#[cfg(feature = "sqlite")]
mod sqlite;
pub mod traits;

#[cfg(any(feature = "test_utils", test))]
pub mod test_utils;

pub use loyalty_api::{
    balance_api::BalanceApi,
    errors::{BalanceApiError, OrderApiError, UserApiError},
    order_api::{OrderApi, SubmitOrderResult},
    user_api::UserApi,
};
#[cfg(feature = "sqlite")]
pub use sqlite::SqliteDatabase;
pub use traits::{
    AccrualStore,
    AccrualStoreError,
    ApplyVerdictResult,
    InsertOrderResult,
    LoyaltyDatabase,
    LoyaltyDatabaseError,
    UserManagement,
};
