use std::{fmt::Display, sync::Arc, time::Duration};

use log::*;
use tokio::{sync::Semaphore, task::JoinSet, time::timeout};

use crate::{
    accrual::{
        client::{AccrualClient, OracleTransport},
        reconciler::{ReconcileOutcome, Reconciler},
        shutdown::ShutdownSignal,
    },
    db_types::OrderNumber,
    traits::AccrualStore,
};

/// What happened to each order in a batch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BatchReport {
    pub applied: usize,
    pub ignored: usize,
    pub not_found: usize,
    pub store_failed: usize,
    /// No verdict could be obtained from the oracle this time round.
    pub fetch_failed: usize,
    /// The task panicked.
    pub crashed: usize,
    /// The task was still running when the shutdown grace period ran out.
    pub aborted: usize,
}

impl BatchReport {
    pub fn total(&self) -> usize {
        self.applied +
            self.ignored +
            self.not_found +
            self.store_failed +
            self.fetch_failed +
            self.crashed +
            self.aborted
    }

    fn record(&mut self, outcome: TaskOutcome) {
        match outcome {
            TaskOutcome::Reconciled(ReconcileOutcome::Applied) => self.applied += 1,
            TaskOutcome::Reconciled(ReconcileOutcome::Ignored) => self.ignored += 1,
            TaskOutcome::Reconciled(ReconcileOutcome::NotFound) => self.not_found += 1,
            TaskOutcome::Reconciled(ReconcileOutcome::StoreFailed) => self.store_failed += 1,
            TaskOutcome::FetchFailed => self.fetch_failed += 1,
        }
    }
}

impl Display for BatchReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "applied: {}, ignored: {}, not found: {}, store failed: {}, fetch failed: {}, crashed: {}, aborted: {}",
            self.applied,
            self.ignored,
            self.not_found,
            self.store_failed,
            self.fetch_failed,
            self.crashed,
            self.aborted
        )
    }
}

enum TaskOutcome {
    Reconciled(ReconcileOutcome),
    FetchFailed,
}

/// Fans a batch of orders out to the oracle, with at most `concurrency` calls in flight at any instant.
///
/// Each order gets its own task, which holds a semaphore permit for the whole fetch-and-reconcile step. A failing or
/// panicking task only affects its own order.
pub struct Dispatcher<S, T> {
    reconciler: Reconciler<S>,
    client: Arc<AccrualClient<T>>,
    concurrency: usize,
    grace_period: Duration,
}

impl<S, T> Dispatcher<S, T>
where
    S: AccrualStore,
    T: OracleTransport,
{
    /// A `concurrency` of zero is treated as one.
    pub fn new(
        reconciler: Reconciler<S>,
        client: Arc<AccrualClient<T>>,
        concurrency: usize,
        grace_period: Duration,
    ) -> Self {
        Self { reconciler, client, concurrency: concurrency.max(1), grace_period }
    }

    pub fn concurrency(&self) -> usize {
        self.concurrency
    }

    /// Runs the batch and waits for every order in it to settle.
    ///
    /// If `shutdown` is raised while the batch is running, the remaining tasks get the grace period to finish. Any
    /// still running after that are aborted, and their orders are left as they were.
    pub async fn dispatch(&self, batch: Vec<OrderNumber>, shutdown: &mut ShutdownSignal) -> BatchReport {
        let mut report = BatchReport::default();
        if batch.is_empty() {
            return report;
        }
        trace!("🚦️ Dispatching {} orders, {} at a time", batch.len(), self.concurrency);
        let permits = Arc::new(Semaphore::new(self.concurrency));
        let mut tasks = JoinSet::new();
        for number in batch {
            let permits = Arc::clone(&permits);
            let client = Arc::clone(&self.client);
            let reconciler = self.reconciler.clone();
            tasks.spawn(async move {
                let Ok(_permit) = permits.acquire_owned().await else {
                    return TaskOutcome::FetchFailed;
                };
                match client.fetch(&number).await {
                    Ok(verdict) => TaskOutcome::Reconciled(reconciler.apply(verdict).await),
                    Err(e) => {
                        warn!("🚦️ No verdict for order {number} this cycle. {e}");
                        TaskOutcome::FetchFailed
                    },
                }
            });
        }
        let settled = tokio::select! {
            _ = collect(&mut tasks, &mut report) => true,
            _ = shutdown.raised() => false,
        };
        if !settled {
            info!(
                "🚦️ Shutdown requested with {} orders outstanding. Allowing {:?} for them to finish",
                tasks.len(),
                self.grace_period
            );
            if timeout(self.grace_period, collect(&mut tasks, &mut report)).await.is_err() {
                warn!("🚦️ Grace period is over. Aborting {} unfinished orders", tasks.len());
                tasks.abort_all();
                collect(&mut tasks, &mut report).await;
            }
        }
        report
    }
}

/// Joins every task in the set, recording each result. Cancel-safe.
async fn collect(tasks: &mut JoinSet<TaskOutcome>, report: &mut BatchReport) {
    while let Some(result) = tasks.join_next().await {
        match result {
            Ok(outcome) => report.record(outcome),
            Err(e) if e.is_cancelled() => report.aborted += 1,
            Err(e) => {
                error!("🚦️ A reconciliation task crashed. {e}");
                report.crashed += 1;
            },
        }
    }
}
