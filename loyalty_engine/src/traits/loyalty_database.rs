use thiserror::Error;

use crate::{
    db_types::{Balance, NewWithdrawal, Order, OrderNumber, Withdrawal},
    traits::InsertOrderResult,
};

#[derive(Debug, Clone, Error)]
pub enum LoyaltyDatabaseError {
    #[error("We have an internal database engine (configuration/uptime etc.) : {0}")]
    DatabaseError(String),
    #[error("The requested user id {0} does not exist")]
    UserNotFound(i64),
}

impl From<sqlx::Error> for LoyaltyDatabaseError {
    fn from(e: sqlx::Error) -> Self {
        LoyaltyDatabaseError::DatabaseError(e.to_string())
    }
}

/// This trait defines the behaviour that the user-facing order and withdrawal paths need from a backend.
///
/// Balances are never stored. They are derived from processed orders and withdrawals every time they are read.
#[allow(async_fn_in_trait)]
pub trait LoyaltyDatabase: Clone {
    /// The URL of the database
    fn url(&self) -> &str;

    /// Stores a new order in status `NEW` for the given user.
    ///
    /// Order numbers are globally unique. If the number is already on record (for any user), nothing is written and
    /// the existing order is returned as [`InsertOrderResult::AlreadyExists`].
    async fn insert_order(&self, user_id: i64, number: &OrderNumber) -> Result<InsertOrderResult, LoyaltyDatabaseError>;

    async fn fetch_order_by_number(&self, number: &OrderNumber) -> Result<Option<Order>, LoyaltyDatabaseError>;

    /// All orders submitted by the user, oldest first.
    async fn fetch_orders_for_user(&self, user_id: i64) -> Result<Vec<Order>, LoyaltyDatabaseError>;

    async fn fetch_balance(&self, user_id: i64) -> Result<Balance, LoyaltyDatabaseError>;

    /// Records the withdrawal only if the user's current balance covers it. The check and the insert are a single
    /// statement, so two concurrent withdrawals can never overdraw the balance.
    ///
    /// Returns `None` if the balance was insufficient.
    async fn try_withdraw(&self, withdrawal: NewWithdrawal) -> Result<Option<Withdrawal>, LoyaltyDatabaseError>;

    /// All withdrawals made by the user, oldest first.
    async fn fetch_withdrawals_for_user(&self, user_id: i64) -> Result<Vec<Withdrawal>, LoyaltyDatabaseError>;

    async fn close(&mut self) -> Result<(), LoyaltyDatabaseError> {
        Ok(())
    }
}
