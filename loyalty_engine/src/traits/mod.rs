//! # Database management and control.
//!
//! This module defines the interface contracts that loyalty database *backends* must honour.
//!
//! * [`AccrualStore`] is the narrow capability used by the accrual reconciliation loop. It selects orders that are still
//!   waiting for a verdict and applies verdicts to them, one row at a time. The futures it returns are `Send` so that
//!   the reconciliation tasks can run on any runtime worker.
//! * [`LoyaltyDatabase`] covers the user-facing order and withdrawal paths: submission, balances and withdrawals.
//! * [`UserManagement`] stores and retrieves registered users.
mod accrual_store;
mod data_objects;
mod loyalty_database;
mod user_management;

pub use accrual_store::{AccrualStore, AccrualStoreError};
pub use data_objects::{ApplyVerdictResult, InsertOrderResult};
pub use loyalty_database::{LoyaltyDatabase, LoyaltyDatabaseError};
pub use user_management::UserManagement;
