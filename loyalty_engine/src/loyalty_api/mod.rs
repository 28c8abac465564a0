//! # Loyalty engine public API
//!
//! The user-facing operations of the loyalty engine, minus any transport. An HTTP layer (or anything else) can sit on
//! top of these.
//!
//! * [`order_api`] accepts order submissions and lists a user's orders.
//! * [`balance_api`] reports balances and records withdrawals.
//! * [`user_api`] registers users and checks their credentials.
//!
//! # API usage
//!
//! An API instance is created by supplying a database backend that implements the traits the API needs.
//!
//! ```rust,ignore
//! use loyalty_engine::{OrderApi, SqliteDatabase};
//! let db = SqliteDatabase::new_with_url(...).await?;
//! let api = OrderApi::new(db);
//! let result = api.submit_order(user_id, "12345678903").await?;
//! ```
pub mod balance_api;
pub mod errors;
pub mod order_api;
pub mod user_api;
