//! The oracle's answer for a single order, as it arrives on the wire and after it has been checked.
use std::fmt::Display;

use lps_common::Points;
use serde::Deserialize;
use thiserror::Error;

use crate::db_types::{OrderNumber, OrderStatusType};

//--------------------------------------     OracleStatus     ---------------------------------------------------------
/// The oracle's status vocabulary. It is wider than [`OrderStatusType`]; values we do not act on are kept so that they
/// can be logged.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(from = "String")]
pub enum OracleStatus {
    /// The oracle knows about the order but has not started on it.
    Registered,
    Invalid,
    Processing,
    Processed,
    Unrecognized(String),
}

impl From<String> for OracleStatus {
    fn from(value: String) -> Self {
        match value.as_str() {
            "REGISTERED" => Self::Registered,
            "INVALID" => Self::Invalid,
            "PROCESSING" => Self::Processing,
            "PROCESSED" => Self::Processed,
            _ => Self::Unrecognized(value),
        }
    }
}

impl Display for OracleStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OracleStatus::Registered => write!(f, "REGISTERED"),
            OracleStatus::Invalid => write!(f, "INVALID"),
            OracleStatus::Processing => write!(f, "PROCESSING"),
            OracleStatus::Processed => write!(f, "PROCESSED"),
            OracleStatus::Unrecognized(s) => write!(f, "{s}"),
        }
    }
}

impl OracleStatus {
    /// The order status this oracle status maps onto, if any. `None` means the verdict is a no-op.
    pub fn order_status(&self) -> Option<OrderStatusType> {
        match self {
            OracleStatus::Processing => Some(OrderStatusType::Processing),
            OracleStatus::Processed => Some(OrderStatusType::Processed),
            OracleStatus::Invalid => Some(OrderStatusType::Invalid),
            OracleStatus::Registered | OracleStatus::Unrecognized(_) => None,
        }
    }
}

//--------------------------------------    VerdictPayload    ---------------------------------------------------------
/// The JSON body of a `200 OK` response from `GET /api/orders/{number}`.
#[derive(Debug, Clone, Deserialize)]
pub struct VerdictPayload {
    pub order: String,
    pub status: OracleStatus,
    #[serde(default)]
    pub accrual: Option<Points>,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{0}")]
pub struct MalformedVerdict(pub String);

//--------------------------------------        Verdict       ---------------------------------------------------------
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Verdict {
    pub number: OrderNumber,
    pub status: OracleStatus,
    pub accrual: Option<Points>,
}

impl Verdict {
    pub fn new(number: OrderNumber, status: OracleStatus, accrual: Option<Points>) -> Self {
        Self { number, status, accrual }
    }

    /// Checks a payload against the order it was requested for.
    ///
    /// A payload is malformed if it names a different order, or carries a negative accrual.
    pub fn from_payload(requested: &OrderNumber, payload: VerdictPayload) -> Result<Self, MalformedVerdict> {
        if payload.order != requested.as_str() {
            return Err(MalformedVerdict(format!(
                "Asked about order {requested} but the oracle answered for order #{}",
                payload.order
            )));
        }
        if let Some(accrual) = payload.accrual.filter(Points::is_negative) {
            return Err(MalformedVerdict(format!("Accrual for order {requested} is negative ({accrual})")));
        }
        Ok(Self::new(requested.clone(), payload.status, payload.accrual))
    }
}

#[cfg(test)]
mod test {
    use std::str::FromStr;

    use super::*;

    fn number() -> OrderNumber {
        OrderNumber::from_str("12345678903").unwrap()
    }

    #[test]
    fn full_payload() {
        let payload: VerdictPayload =
            serde_json::from_str(r#"{"order":"12345678903","status":"PROCESSED","accrual":500}"#).unwrap();
        let verdict = Verdict::from_payload(&number(), payload).unwrap();
        assert_eq!(verdict.status, OracleStatus::Processed);
        assert_eq!(verdict.accrual, Some(Points::from_points(500)));
    }

    #[test]
    fn accrual_is_optional() {
        let payload: VerdictPayload = serde_json::from_str(r#"{"order":"12345678903","status":"INVALID"}"#).unwrap();
        let verdict = Verdict::from_payload(&number(), payload).unwrap();
        assert_eq!(verdict.status, OracleStatus::Invalid);
        assert_eq!(verdict.accrual, None);
    }

    #[test]
    fn missing_fields_do_not_parse() {
        assert!(serde_json::from_str::<VerdictPayload>(r#"{"status":"PROCESSED","accrual":5}"#).is_err());
        assert!(serde_json::from_str::<VerdictPayload>(r#"{"order":"12345678903"}"#).is_err());
        assert!(serde_json::from_str::<VerdictPayload>("not json").is_err());
    }

    #[test]
    fn wider_status_vocabulary() {
        let payload: VerdictPayload = serde_json::from_str(r#"{"order":"12345678903","status":"REGISTERED"}"#).unwrap();
        assert_eq!(payload.status, OracleStatus::Registered);
        assert_eq!(payload.status.order_status(), None);
        let payload: VerdictPayload = serde_json::from_str(r#"{"order":"12345678903","status":"ON_HOLD"}"#).unwrap();
        assert_eq!(payload.status, OracleStatus::Unrecognized("ON_HOLD".into()));
        assert_eq!(payload.status.order_status(), None);
        assert_eq!(OracleStatus::Processing.order_status(), Some(OrderStatusType::Processing));
    }

    #[test]
    fn mismatched_order_is_malformed() {
        let payload: VerdictPayload = serde_json::from_str(r#"{"order":"79927398713","status":"INVALID"}"#).unwrap();
        assert!(Verdict::from_payload(&number(), payload).is_err());
    }

    #[test]
    fn negative_accrual_is_malformed() {
        let payload: VerdictPayload =
            serde_json::from_str(r#"{"order":"12345678903","status":"PROCESSED","accrual":-1}"#).unwrap();
        assert!(Verdict::from_payload(&number(), payload).is_err());
    }
}
