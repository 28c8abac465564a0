use std::{fmt::Debug, str::FromStr};

use log::*;

use crate::{
    db_types::{Order, OrderNumber},
    loyalty_api::errors::OrderApiError,
    traits::{InsertOrderResult, LoyaltyDatabase},
};

#[derive(Debug, Clone)]
pub enum SubmitOrderResult {
    /// The order is new, and is now waiting for the accrual oracle.
    Accepted(Order),
    /// The same user had already submitted this order. Nothing changed.
    AlreadyAccepted(Order),
}

impl SubmitOrderResult {
    pub fn order(&self) -> &Order {
        match self {
            SubmitOrderResult::Accepted(order) | SubmitOrderResult::AlreadyAccepted(order) => order,
        }
    }
}

/// `OrderApi` accepts order submissions from users and reports on their orders.
pub struct OrderApi<B> {
    db: B,
}

impl<B> Debug for OrderApi<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "OrderApi")
    }
}

impl<B> OrderApi<B> {
    pub fn new(db: B) -> Self {
        Self { db }
    }
}

impl<B> OrderApi<B>
where B: LoyaltyDatabase
{
    /// Submits an order number on behalf of a user.
    ///
    /// * The number must pass the Luhn checksum, or [`OrderApiError::InvalidOrderNumber`] is returned.
    /// * Submitting a number twice is harmless: the second call returns [`SubmitOrderResult::AlreadyAccepted`].
    /// * A number that another user has already submitted is rejected with [`OrderApiError::OrderConflict`], and the
    ///   existing order keeps its owner.
    pub async fn submit_order(&self, user_id: i64, number: &str) -> Result<SubmitOrderResult, OrderApiError> {
        let number = OrderNumber::from_str(number)?;
        match self.db.insert_order(user_id, &number).await? {
            InsertOrderResult::Inserted(order) => {
                info!("📦️ Order {number} accepted for user #{user_id}");
                Ok(SubmitOrderResult::Accepted(order))
            },
            InsertOrderResult::AlreadyExists(order) if order.user_id == user_id => {
                debug!("📦️ User #{user_id} submitted order {number} again");
                Ok(SubmitOrderResult::AlreadyAccepted(order))
            },
            InsertOrderResult::AlreadyExists(order) => {
                warn!("📦️ User #{user_id} tried to submit order {number}, which belongs to user #{}", order.user_id);
                Err(OrderApiError::OrderConflict(number))
            },
        }
    }

    /// The user's orders, oldest first
    pub async fn orders_for_user(&self, user_id: i64) -> Result<Vec<Order>, OrderApiError> {
        let orders = self.db.fetch_orders_for_user(user_id).await?;
        Ok(orders)
    }

    pub async fn order(&self, number: &OrderNumber) -> Result<Option<Order>, OrderApiError> {
        let order = self.db.fetch_order_by_number(number).await?;
        Ok(order)
    }
}
