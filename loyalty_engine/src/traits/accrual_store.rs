use std::future::Future;

use lps_common::Points;
use thiserror::Error;

use crate::{
    db_types::{OrderNumber, OrderStatusType},
    traits::ApplyVerdictResult,
};

#[derive(Debug, Clone, Error)]
pub enum AccrualStoreError {
    #[error("We have an internal database engine (configuration/uptime etc.) : {0}")]
    DatabaseError(String),
}

impl From<sqlx::Error> for AccrualStoreError {
    fn from(e: sqlx::Error) -> Self {
        AccrualStoreError::DatabaseError(e.to_string())
    }
}

/// The store capability consumed by the accrual reconciliation loop.
pub trait AccrualStore: Clone + Send + Sync + 'static {
    /// Returns the numbers of up to `limit` orders whose status is `NEW` or `PROCESSING`, oldest submission first.
    ///
    /// This call has no side effects.
    fn fetch_pending_orders(
        &self,
        limit: u32,
    ) -> impl Future<Output = Result<Vec<OrderNumber>, AccrualStoreError>> + Send;

    /// Atomically moves a non-terminal order to `status`, recording `accrual` alongside it.
    ///
    /// Orders that do not exist, and orders that are already `INVALID` or `PROCESSED`, are left untouched and
    /// [`ApplyVerdictResult::NotFound`] is returned.
    fn apply_verdict(
        &self,
        number: &OrderNumber,
        status: OrderStatusType,
        accrual: Option<Points>,
    ) -> impl Future<Output = Result<ApplyVerdictResult, AccrualStoreError>> + Send;
}
