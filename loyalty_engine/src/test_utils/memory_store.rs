use std::{
    str::FromStr,
    sync::{Arc, Mutex, MutexGuard},
};

use chrono::{Duration, Utc};
use lps_common::Points;
use tokio::time::Instant;

use crate::{
    db_types::{Order, OrderNumber, OrderStatusType},
    traits::{AccrualStore, AccrualStoreError, ApplyVerdictResult},
};

/// An [`AccrualStore`] that keeps orders in memory and counts how it is used.
///
/// Clones share the same state.
#[derive(Clone, Default)]
pub struct MemoryStore {
    inner: Arc<Mutex<MemoryStoreInner>>,
}

#[derive(Default)]
struct MemoryStoreInner {
    orders: Vec<Order>,
    selects: Vec<Instant>,
    apply_calls: usize,
    fail_selects: bool,
    fail_applies: bool,
}

impl MemoryStore {
    fn lock(&self) -> MutexGuard<'_, MemoryStoreInner> {
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Adds a `NEW` order for user 1. Orders are submitted one second apart, in the order they are added.
    pub fn add_order(&self, number: &str) {
        self.add_order_with_status(number, OrderStatusType::New);
    }

    pub fn add_order_with_status(&self, number: &str, status: OrderStatusType) {
        let number = OrderNumber::from_str(number).expect("Invalid order number in test setup");
        let mut inner = self.lock();
        let id = inner.orders.len() as i64 + 1;
        let submitted_at = Utc::now() - Duration::days(1) + Duration::seconds(id);
        let accrual = (status == OrderStatusType::Processed).then_some(Points::ZERO);
        inner.orders.push(Order {
            id,
            number,
            user_id: 1,
            status,
            accrual,
            submitted_at,
            updated_at: submitted_at,
        });
    }

    pub fn order(&self, number: &str) -> Option<Order> {
        self.lock().orders.iter().find(|o| o.number.as_str() == number).cloned()
    }

    pub fn orders(&self) -> Vec<Order> {
        self.lock().orders.clone()
    }

    /// The (tokio) instants at which pending orders were selected.
    pub fn select_times(&self) -> Vec<Instant> {
        self.lock().selects.clone()
    }

    pub fn select_calls(&self) -> usize {
        self.lock().selects.len()
    }

    pub fn apply_calls(&self) -> usize {
        self.lock().apply_calls
    }

    pub fn set_fail_selects(&self, fail: bool) {
        self.lock().fail_selects = fail;
    }

    pub fn set_fail_applies(&self, fail: bool) {
        self.lock().fail_applies = fail;
    }
}

impl AccrualStore for MemoryStore {
    async fn fetch_pending_orders(&self, limit: u32) -> Result<Vec<OrderNumber>, AccrualStoreError> {
        let mut inner = self.lock();
        inner.selects.push(Instant::now());
        if inner.fail_selects {
            return Err(AccrualStoreError::DatabaseError("select failed".into()));
        }
        let mut pending = inner.orders.iter().filter(|o| !o.status.is_terminal()).collect::<Vec<_>>();
        pending.sort_by_key(|o| (o.submitted_at, o.id));
        Ok(pending.into_iter().take(limit as usize).map(|o| o.number.clone()).collect())
    }

    async fn apply_verdict(
        &self,
        number: &OrderNumber,
        status: OrderStatusType,
        accrual: Option<Points>,
    ) -> Result<ApplyVerdictResult, AccrualStoreError> {
        let mut inner = self.lock();
        inner.apply_calls += 1;
        if inner.fail_applies {
            return Err(AccrualStoreError::DatabaseError("update failed".into()));
        }
        let order = inner.orders.iter_mut().find(|o| &o.number == number && !o.status.is_terminal());
        match order {
            Some(order) => {
                order.status = status;
                order.accrual = accrual;
                order.updated_at = Utc::now();
                Ok(ApplyVerdictResult::Applied(order.clone()))
            },
            None => Ok(ApplyVerdictResult::NotFound),
        }
    }
}
