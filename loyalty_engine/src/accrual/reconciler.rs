use std::fmt::Display;

use log::*;
use lps_common::Points;

use crate::{
    accrual::verdict::Verdict,
    db_types::OrderStatusType,
    traits::{AccrualStore, ApplyVerdictResult},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReconcileOutcome {
    /// The order moved to the status in the verdict.
    Applied,
    /// The oracle status does not correspond to an order status. Nothing was written.
    Ignored,
    /// The order does not exist, or is already terminal.
    NotFound,
    /// The store reported an error. The order is left for a later cycle.
    StoreFailed,
}

impl Display for ReconcileOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ReconcileOutcome::Applied => write!(f, "applied"),
            ReconcileOutcome::Ignored => write!(f, "ignored"),
            ReconcileOutcome::NotFound => write!(f, "not found"),
            ReconcileOutcome::StoreFailed => write!(f, "store failed"),
        }
    }
}

/// Writes oracle verdicts back to the store.
///
/// The reconciler only ever changes an order's status and accrual. Balances are derived at read time, so there is
/// nothing else to keep in step.
#[derive(Clone)]
pub struct Reconciler<S> {
    store: S,
}

impl<S: AccrualStore> Reconciler<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Applies the verdict. Failures are logged and reported through the outcome; this never errors.
    pub async fn apply(&self, verdict: Verdict) -> ReconcileOutcome {
        let Verdict { number, status, accrual } = verdict;
        let Some(new_status) = status.order_status() else {
            debug!("🧾️ Oracle status {status} for order {number} needs no action");
            return ReconcileOutcome::Ignored;
        };
        let accrual = match new_status {
            OrderStatusType::Processed => Some(accrual.unwrap_or(Points::ZERO)),
            _ => None,
        };
        match self.store.apply_verdict(&number, new_status, accrual).await {
            Ok(ApplyVerdictResult::Applied(order)) => {
                match order.accrual {
                    Some(points) => info!("🧾️ Order {number} is {new_status}. {points} points accrued"),
                    None => info!("🧾️ Order {number} is {new_status}"),
                }
                ReconcileOutcome::Applied
            },
            Ok(ApplyVerdictResult::NotFound) => {
                debug!("🧾️ Order {number} is unknown or already final. Verdict {status} discarded");
                ReconcileOutcome::NotFound
            },
            Err(e) => {
                error!("🧾️ Could not record verdict {status} for order {number}. {e}");
                ReconcileOutcome::StoreFailed
            },
        }
    }
}
