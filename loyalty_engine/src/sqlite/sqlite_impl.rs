//! `SqliteDatabase` is the concrete loyalty engine backend.
//!
//! Unsurprisingly, it uses SQLite as the backend and implements all the traits defined in the [`crate::traits`]
//! module.
use std::fmt::Debug;

use log::*;
use lps_common::Points;
use sqlx::{migrate::MigrateError, SqlitePool};

use super::db::{new_pool, orders, users, withdrawals};
use crate::{
    db_types::{Balance, NewUser, NewWithdrawal, Order, OrderNumber, OrderStatusType, User, Withdrawal},
    traits::{
        AccrualStore,
        AccrualStoreError,
        ApplyVerdictResult,
        InsertOrderResult,
        LoyaltyDatabase,
        LoyaltyDatabaseError,
        UserManagement,
    },
};

#[derive(Clone)]
pub struct SqliteDatabase {
    url: String,
    pool: SqlitePool,
}

impl Debug for SqliteDatabase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "SqliteDatabase ({:?})", self.pool)
    }
}

impl SqliteDatabase {
    pub async fn new_with_url(url: &str, max_connections: u32) -> Result<Self, sqlx::Error> {
        trace!("🗃️ Creating new database connection pool with url {url}");
        let pool = new_pool(url, max_connections).await?;
        let url = url.to_string();
        Ok(Self { url, pool })
    }

    /// Brings the schema up to date. Safe to call on every start-up.
    pub async fn migrate(&self) -> Result<(), MigrateError> {
        sqlx::migrate!("./src/sqlite/migrations").run(&self.pool).await?;
        info!("🗃️ Database migrations complete");
        Ok(())
    }

    /// Runs on its own connection, ahead of the write transaction it guards. Users are never deleted.
    async fn check_user_exists(&self, user_id: i64) -> Result<(), LoyaltyDatabaseError> {
        let mut conn = self.pool.acquire().await?;
        match users::fetch_user_by_id(user_id, &mut conn).await? {
            Some(_) => Ok(()),
            None => Err(LoyaltyDatabaseError::UserNotFound(user_id)),
        }
    }

    /// Returns a reference to the database connection pool.
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

impl AccrualStore for SqliteDatabase {
    async fn fetch_pending_orders(&self, limit: u32) -> Result<Vec<OrderNumber>, AccrualStoreError> {
        let mut conn = self.pool.acquire().await?;
        let numbers = orders::fetch_pending_numbers(limit, &mut conn).await?;
        trace!("🗃️ {} orders are awaiting a verdict", numbers.len());
        Ok(numbers)
    }

    async fn apply_verdict(
        &self,
        number: &OrderNumber,
        status: OrderStatusType,
        accrual: Option<Points>,
    ) -> Result<ApplyVerdictResult, AccrualStoreError> {
        let mut tx = self.pool.begin().await?;
        let result = orders::apply_verdict(number, status, accrual, &mut tx).await?;
        tx.commit().await?;
        Ok(result)
    }
}

impl LoyaltyDatabase for SqliteDatabase {
    fn url(&self) -> &str {
        self.url.as_str()
    }

    async fn insert_order(&self, user_id: i64, number: &OrderNumber) -> Result<InsertOrderResult, LoyaltyDatabaseError> {
        self.check_user_exists(user_id).await?;
        let mut tx = self.pool.begin().await?;
        let result = orders::idempotent_insert(user_id, number, &mut tx).await?;
        tx.commit().await?;
        Ok(result)
    }

    async fn fetch_order_by_number(&self, number: &OrderNumber) -> Result<Option<Order>, LoyaltyDatabaseError> {
        let mut conn = self.pool.acquire().await?;
        let order = orders::fetch_order_by_number(number, &mut conn).await?;
        Ok(order)
    }

    async fn fetch_orders_for_user(&self, user_id: i64) -> Result<Vec<Order>, LoyaltyDatabaseError> {
        let mut conn = self.pool.acquire().await?;
        let orders = orders::fetch_orders_for_user(user_id, &mut conn).await?;
        Ok(orders)
    }

    async fn fetch_balance(&self, user_id: i64) -> Result<Balance, LoyaltyDatabaseError> {
        let mut conn = self.pool.acquire().await?;
        let balance = withdrawals::fetch_balance(user_id, &mut conn).await?;
        Ok(balance)
    }

    async fn try_withdraw(&self, withdrawal: NewWithdrawal) -> Result<Option<Withdrawal>, LoyaltyDatabaseError> {
        let user_id = withdrawal.user_id;
        self.check_user_exists(user_id).await?;
        let mut tx = self.pool.begin().await?;
        let result = withdrawals::insert_if_covered(withdrawal, &mut tx).await?;
        tx.commit().await?;
        if let Some(w) = &result {
            debug!("🗃️ Withdrawal #{} of {} recorded for user #{user_id}", w.id, w.amount);
        }
        Ok(result)
    }

    async fn fetch_withdrawals_for_user(&self, user_id: i64) -> Result<Vec<Withdrawal>, LoyaltyDatabaseError> {
        let mut conn = self.pool.acquire().await?;
        let result = withdrawals::fetch_withdrawals_for_user(user_id, &mut conn).await?;
        Ok(result)
    }

    async fn close(&mut self) -> Result<(), LoyaltyDatabaseError> {
        self.pool.close().await;
        Ok(())
    }
}

impl UserManagement for SqliteDatabase {
    async fn insert_user(&self, user: NewUser) -> Result<Option<User>, LoyaltyDatabaseError> {
        let mut tx = self.pool.begin().await?;
        let user = users::insert_user(user, &mut tx).await?;
        tx.commit().await?;
        Ok(user)
    }

    async fn fetch_user_by_login(&self, login: &str) -> Result<Option<User>, LoyaltyDatabaseError> {
        let mut conn = self.pool.acquire().await?;
        let user = users::fetch_user_by_login(login, &mut conn).await?;
        Ok(user)
    }

    async fn fetch_user(&self, user_id: i64) -> Result<Option<User>, LoyaltyDatabaseError> {
        let mut conn = self.pool.acquire().await?;
        let user = users::fetch_user_by_id(user_id, &mut conn).await?;
        Ok(user)
    }
}
