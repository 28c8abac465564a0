use std::{fmt::Display, sync::Arc, time::Duration};

use log::*;
use tokio::time::sleep;

use crate::{
    accrual::{
        client::{AccrualClient, OracleTransport},
        config::AccrualConfig,
        dispatcher::{BatchReport, Dispatcher},
        reconciler::Reconciler,
        shutdown::ShutdownSignal,
    },
    traits::AccrualStore,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopState {
    /// Created, but not started yet.
    Idle,
    /// Asking the store for orders that still need a verdict.
    Selecting,
    /// Waiting for the current batch to settle.
    Dispatching,
    /// Waiting out the poll interval before the next cycle.
    Sleeping,
    Stopped,
}

impl Display for LoopState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LoopState::Idle => write!(f, "Idle"),
            LoopState::Selecting => write!(f, "Selecting"),
            LoopState::Dispatching => write!(f, "Dispatching"),
            LoopState::Sleeping => write!(f, "Sleeping"),
            LoopState::Stopped => write!(f, "Stopped"),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CycleReport {
    pub cycle: u64,
    pub selected: usize,
    pub batch: BatchReport,
}

/// The accrual reconciliation loop.
///
/// Each cycle selects up to `batch_size` pending orders, oldest first, and hands them to the [`Dispatcher`]. The next
/// cycle only starts once every order in the current batch has settled and the poll interval has passed. The pause is
/// unconditional, so an idle system still only queries the store once per interval.
pub struct AccrualLoop<S, T> {
    store: S,
    dispatcher: Dispatcher<S, T>,
    batch_size: u32,
    poll_interval: Duration,
    state: LoopState,
    cycles: u64,
}

impl<S, T> AccrualLoop<S, T>
where
    S: AccrualStore,
    T: OracleTransport,
{
    pub fn new(store: S, client: AccrualClient<T>, config: &AccrualConfig) -> Self {
        let reconciler = Reconciler::new(store.clone());
        let dispatcher =
            Dispatcher::new(reconciler, Arc::new(client), config.concurrency, config.shutdown_grace_period);
        Self {
            store,
            dispatcher,
            batch_size: config.batch_size,
            poll_interval: config.poll_interval,
            state: LoopState::Idle,
            cycles: 0,
        }
    }

    pub fn state(&self) -> LoopState {
        self.state
    }

    /// The number of cycles started so far
    pub fn cycles(&self) -> u64 {
        self.cycles
    }

    /// Runs a single select-and-dispatch cycle, without the trailing sleep.
    ///
    /// A store error while selecting is logged, and the cycle carries on with an empty batch.
    pub async fn run_cycle(&mut self, shutdown: &mut ShutdownSignal) -> CycleReport {
        self.cycles += 1;
        let cycle = self.cycles;
        self.state = LoopState::Selecting;
        let batch = match self.store.fetch_pending_orders(self.batch_size).await {
            Ok(batch) => batch,
            Err(e) => {
                error!("🔄️ Cycle {cycle}: could not fetch pending orders. {e}");
                Vec::new()
            },
        };
        let selected = batch.len();
        self.state = LoopState::Dispatching;
        let report = self.dispatcher.dispatch(batch, shutdown).await;
        if selected > 0 {
            info!("🔄️ Cycle {cycle}: {selected} pending orders. {report}");
        } else {
            debug!("🔄️ Cycle {cycle}: no pending orders");
        }
        CycleReport { cycle, selected, batch: report }
    }

    /// Runs cycles until `shutdown` is raised, then returns the number of cycles run.
    ///
    /// A sleeping loop wakes up and stops as soon as shutdown is requested. A running batch is given the grace period
    /// to finish first.
    pub async fn run(&mut self, mut shutdown: ShutdownSignal) -> u64 {
        info!(
            "🔄️ Accrual loop started. Batches of {}, {} at a time, every {:?}",
            self.batch_size,
            self.dispatcher.concurrency(),
            self.poll_interval
        );
        while !shutdown.is_raised() {
            self.run_cycle(&mut shutdown).await;
            if shutdown.is_raised() {
                break;
            }
            self.state = LoopState::Sleeping;
            trace!("🔄️ Sleeping for {:?}", self.poll_interval);
            tokio::select! {
                _ = sleep(self.poll_interval) => {},
                _ = shutdown.raised() => {},
            }
        }
        self.state = LoopState::Stopped;
        info!("🔄️ Accrual loop stopped after {} cycles", self.cycles);
        self.cycles
    }
}
