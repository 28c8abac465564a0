//! A retrying client for the accrual oracle.
//!
//! [`OracleTransport`] makes exactly one request. [`AccrualClient`] wraps a transport with the [`RetryPolicy`]: every
//! attempt is bounded by a timeout, and failed attempts are retried after a fixed delay until the attempt budget is
//! spent.
use std::{
    future::Future,
    sync::atomic::{AtomicU32, Ordering},
    time::Duration,
};

use backon::{ConstantBuilder, Retryable};
use log::*;
use thiserror::Error;
use tokio::time::timeout;

use crate::{
    accrual::{
        config::RetryPolicy,
        verdict::{Verdict, VerdictPayload},
    },
    db_types::OrderNumber,
};

#[derive(Debug, Clone, Error)]
pub enum AccrualClientError {
    #[error("Could not initialize client: {0}")]
    Initialization(String),
    #[error("Could not reach the accrual oracle: {0}")]
    Transport(String),
    #[error("The accrual oracle responded with status {status}")]
    UnexpectedStatus { status: u16 },
    #[error("The accrual oracle sent an unusable payload: {0}")]
    MalformedPayload(String),
    #[error("The accrual oracle did not answer within {0:?}")]
    Timeout(Duration),
    #[error("Gave up on order {number} after {attempts} attempts. Last error: {last}")]
    RetriesExhausted { number: OrderNumber, attempts: u32, last: Box<AccrualClientError> },
}

/// A single request to the oracle for a single order. Implementations do not retry.
pub trait OracleTransport: Send + Sync + 'static {
    fn request_verdict(
        &self,
        number: &OrderNumber,
    ) -> impl Future<Output = Result<VerdictPayload, AccrualClientError>> + Send;
}

pub struct AccrualClient<T> {
    transport: T,
    policy: RetryPolicy,
}

impl<T: OracleTransport> AccrualClient<T> {
    pub fn new(transport: T, policy: RetryPolicy) -> Self {
        Self { transport, policy }
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Asks the oracle for the verdict on `number`, retrying transient failures according to the policy.
    ///
    /// If every attempt fails, [`AccrualClientError::RetriesExhausted`] is returned, carrying the last failure.
    pub async fn fetch(&self, number: &OrderNumber) -> Result<Verdict, AccrualClientError> {
        let attempts = self.policy.attempts();
        let made = AtomicU32::new(0);
        let counter = &made;
        let backoff = ConstantBuilder::default()
            .with_delay(self.policy.retry_delay)
            .with_max_times((attempts - 1) as usize);
        let result = (move || async move {
            counter.fetch_add(1, Ordering::Relaxed);
            self.attempt(number).await
        })
        .retry(backoff)
        .sleep(tokio::time::sleep)
        .notify(|e: &AccrualClientError, delay: Duration| {
            let attempt = counter.load(Ordering::Relaxed);
            warn!("📡️ Attempt {attempt}/{attempts} for order {number} failed: {e}. Retrying in {delay:?}");
        })
        .await;
        let attempt = made.load(Ordering::Relaxed);
        match result {
            Ok(verdict) => {
                trace!("📡️ Oracle says order {number} is {} (attempt {attempt}/{attempts})", verdict.status);
                Ok(verdict)
            },
            Err(e) => {
                warn!("📡️ Attempt {attempt}/{attempts} for order {number} failed: {e}. Giving up for now.");
                Err(AccrualClientError::RetriesExhausted { number: number.clone(), attempts: attempt, last: Box::new(e) })
            },
        }
    }

    async fn attempt(&self, number: &OrderNumber) -> Result<Verdict, AccrualClientError> {
        let limit = self.policy.attempt_timeout;
        let payload = timeout(limit, self.transport.request_verdict(number))
            .await
            .map_err(|_| AccrualClientError::Timeout(limit))??;
        Verdict::from_payload(number, payload).map_err(|e| AccrualClientError::MalformedPayload(e.to_string()))
    }
}
