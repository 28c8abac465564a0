use std::{fmt::Debug, str::FromStr};

use log::*;
use lps_common::Points;

use crate::{
    db_types::{Balance, NewWithdrawal, OrderNumber, Withdrawal},
    loyalty_api::errors::BalanceApiError,
    traits::LoyaltyDatabase,
};

/// `BalanceApi` reports user balances, and lets users spend their points.
pub struct BalanceApi<B> {
    db: B,
}

impl<B> Debug for BalanceApi<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "BalanceApi")
    }
}

impl<B> BalanceApi<B> {
    pub fn new(db: B) -> Self {
        Self { db }
    }
}

impl<B> BalanceApi<B>
where B: LoyaltyDatabase
{
    /// The user's current and withdrawn points, computed from their orders and withdrawals at the time of the call.
    pub async fn balance(&self, user_id: i64) -> Result<Balance, BalanceApiError> {
        let balance = self.db.fetch_balance(user_id).await?;
        Ok(balance)
    }

    /// Withdraws `amount` points from the user's balance against the order reference `order_ref`.
    ///
    /// The reference must pass the Luhn checksum and `amount` must be positive. If the current balance does not cover
    /// the amount, nothing is recorded and [`BalanceApiError::InsufficientFunds`] is returned.
    pub async fn withdraw(&self, user_id: i64, order_ref: &str, amount: Points) -> Result<Withdrawal, BalanceApiError> {
        let order_reference = OrderNumber::from_str(order_ref)?;
        if !amount.is_positive() {
            return Err(BalanceApiError::InvalidAmount(amount));
        }
        let withdrawal = NewWithdrawal::new(user_id, order_reference, amount);
        match self.db.try_withdraw(withdrawal).await? {
            Some(w) => {
                info!("💸️ User #{user_id} withdrew {amount} points against order #{order_ref}");
                Ok(w)
            },
            None => {
                let available = self.db.fetch_balance(user_id).await?.current;
                debug!("💸️ User #{user_id} cannot withdraw {amount} points. Balance is {available}");
                Err(BalanceApiError::InsufficientFunds { requested: amount, available })
            },
        }
    }

    /// The user's withdrawals, oldest first
    pub async fn withdrawals(&self, user_id: i64) -> Result<Vec<Withdrawal>, BalanceApiError> {
        let withdrawals = self.db.fetch_withdrawals_for_user(user_id).await?;
        Ok(withdrawals)
    }
}
