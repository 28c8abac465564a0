use std::time::Duration;

use log::*;
use reqwest::{Client, StatusCode};

use crate::{
    accrual::{
        client::{AccrualClientError, OracleTransport},
        verdict::VerdictPayload,
    },
    db_types::OrderNumber,
};

/// Talks to the accrual oracle over HTTP: `GET {base_url}/api/orders/{number}`.
#[derive(Clone, Debug)]
pub struct HttpOracle {
    base_url: String,
    client: Client,
}

impl HttpOracle {
    /// `timeout` is applied by the HTTP client to every request as a backstop. The accrual client enforces its own
    /// per-attempt timeout on top of this.
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, AccrualClientError> {
        let client =
            Client::builder().timeout(timeout).build().map_err(|e| AccrualClientError::Initialization(e.to_string()))?;
        let base_url = normalize_base_url(base_url);
        if base_url.is_empty() {
            return Err(AccrualClientError::Initialization("The accrual oracle address is empty".into()));
        }
        debug!("📡️ Accrual oracle client will use {base_url}");
        Ok(Self { base_url, client })
    }

    pub fn base_url(&self) -> &str {
        self.base_url.as_str()
    }

    pub fn url(&self, number: &OrderNumber) -> String {
        format!("{}/api/orders/{}", self.base_url, number.as_str())
    }
}

impl OracleTransport for HttpOracle {
    async fn request_verdict(&self, number: &OrderNumber) -> Result<VerdictPayload, AccrualClientError> {
        let url = self.url(number);
        trace!("📡️ GET {url}");
        let response = self.client.get(url).send().await.map_err(|e| AccrualClientError::Transport(e.to_string()))?;
        let status = response.status();
        if status != StatusCode::OK {
            return Err(AccrualClientError::UnexpectedStatus { status: status.as_u16() });
        }
        response.json::<VerdictPayload>().await.map_err(|e| AccrualClientError::MalformedPayload(e.to_string()))
    }
}

/// Addresses are often configured as `host:port`. Assume plain HTTP in that case, and drop any trailing slash.
fn normalize_base_url(url: &str) -> String {
    let url = url.trim().trim_end_matches('/');
    if url.is_empty() || url.contains("://") {
        url.to_string()
    } else {
        format!("http://{url}")
    }
}
