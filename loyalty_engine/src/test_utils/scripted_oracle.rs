use std::{
    collections::{HashMap, VecDeque},
    sync::{
        atomic::{AtomicUsize, Ordering},
        Arc,
        Mutex,
    },
    time::Duration,
};

use tokio::time::sleep;

use crate::{
    accrual::{
        client::{AccrualClientError, OracleTransport},
        verdict::VerdictPayload,
    },
    db_types::OrderNumber,
};

#[derive(Debug, Clone)]
pub enum ScriptedReply {
    /// A `200 OK` with this body
    Json(String),
    /// Any other HTTP status
    Status(u16),
    TransportError,
    /// The request handler panics
    Panic,
}

/// A fake accrual oracle. Replies are queued per order number and handed out in order. Once an order's queue is empty,
/// the oracle answers `204 No Content`, which is what the real service says about orders it has never heard of.
///
/// The oracle counts calls, and tracks how many are in flight at once. Clones share the same state.
#[derive(Clone, Default)]
pub struct ScriptedOracle {
    latency: Duration,
    state: Arc<OracleState>,
}

#[derive(Default)]
struct OracleState {
    replies: Mutex<HashMap<String, VecDeque<ScriptedReply>>>,
    calls: AtomicUsize,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

struct InFlight<'a>(&'a OracleState);

impl<'a> InFlight<'a> {
    fn enter(state: &'a OracleState) -> Self {
        let now = state.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        state.max_in_flight.fetch_max(now, Ordering::SeqCst);
        Self(state)
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.in_flight.fetch_sub(1, Ordering::SeqCst);
    }
}

impl ScriptedOracle {
    /// Every request takes `latency` before it is answered.
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    pub fn reply(&self, number: &str, reply: ScriptedReply) {
        let mut replies = self.state.replies.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        replies.entry(number.to_string()).or_default().push_back(reply);
    }

    pub fn reply_json(&self, number: &str, body: &str) {
        self.reply(number, ScriptedReply::Json(body.to_string()));
    }

    pub fn reply_processed(&self, number: &str, points: i64) {
        self.reply_json(number, &format!(r#"{{"order":"{number}","status":"PROCESSED","accrual":{points}}}"#));
    }

    /// A reply with the given oracle status and no accrual
    pub fn reply_verdict(&self, number: &str, status: &str) {
        self.reply_json(number, &format!(r#"{{"order":"{number}","status":"{status}"}}"#));
    }

    pub fn reply_status(&self, number: &str, status: u16) {
        self.reply(number, ScriptedReply::Status(status));
    }

    pub fn reply_transport_error(&self, number: &str) {
        self.reply(number, ScriptedReply::TransportError);
    }

    pub fn reply_malformed(&self, number: &str) {
        self.reply_json(number, r#"{"order": "#);
    }

    pub fn reply_panic(&self, number: &str) {
        self.reply(number, ScriptedReply::Panic);
    }

    pub fn calls(&self) -> usize {
        self.state.calls.load(Ordering::SeqCst)
    }

    pub fn in_flight(&self) -> usize {
        self.state.in_flight.load(Ordering::SeqCst)
    }

    pub fn max_in_flight(&self) -> usize {
        self.state.max_in_flight.load(Ordering::SeqCst)
    }

    fn next_reply(&self, number: &OrderNumber) -> ScriptedReply {
        let mut replies = self.state.replies.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        replies.get_mut(number.as_str()).and_then(VecDeque::pop_front).unwrap_or(ScriptedReply::Status(204))
    }
}

impl OracleTransport for ScriptedOracle {
    async fn request_verdict(&self, number: &OrderNumber) -> Result<VerdictPayload, AccrualClientError> {
        self.state.calls.fetch_add(1, Ordering::SeqCst);
        let _in_flight = InFlight::enter(&self.state);
        if !self.latency.is_zero() {
            sleep(self.latency).await;
        }
        match self.next_reply(number) {
            ScriptedReply::Json(body) => {
                serde_json::from_str(&body).map_err(|e| AccrualClientError::MalformedPayload(e.to_string()))
            },
            ScriptedReply::Status(status) => Err(AccrualClientError::UnexpectedStatus { status }),
            ScriptedReply::TransportError => Err(AccrualClientError::Transport("connection refused".into())),
            ScriptedReply::Panic => panic!("Scripted oracle panicked while answering for order {number}"),
        }
    }
}
