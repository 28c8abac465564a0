//! # Accrual reconciliation
//!
//! The background process that asks the external accrual oracle about submitted orders and records its verdicts.
//!
//! * [`AccrualLoop`] drives the process: select pending orders, dispatch them, sleep, repeat.
//! * [`Dispatcher`] runs a batch with a hard cap on the number of oracle calls in flight.
//! * [`AccrualClient`] asks the oracle about one order, with a timeout on every attempt and a fixed delay between
//!   retries. [`HttpOracle`] is the HTTP transport it uses in production.
//! * [`Reconciler`] writes each verdict back through the [`crate::traits::AccrualStore`] capability.
//!
//! Shutdown is cooperative, through a [`ShutdownSignal`].
pub mod client;
pub mod config;
pub mod dispatcher;
pub mod http_oracle;
pub mod reconciler;
pub mod reconciliation_loop;
pub mod shutdown;
pub mod verdict;

pub use client::{AccrualClient, AccrualClientError, OracleTransport};
pub use config::{AccrualConfig, RetryPolicy};
pub use dispatcher::{BatchReport, Dispatcher};
pub use http_oracle::HttpOracle;
pub use reconciler::{ReconcileOutcome, Reconciler};
pub use reconciliation_loop::{AccrualLoop, CycleReport, LoopState};
pub use shutdown::{shutdown_channel, ShutdownSignal, ShutdownTrigger};
pub use verdict::{OracleStatus, Verdict, VerdictPayload};
