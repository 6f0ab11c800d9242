//! Client for the monitoring analytics API.
//!
//! Every endpoint answers `GET` with `{"data": [...]}`. A non-2xx status, a
//! failed transport, or an undecodable body is a [`FetchError`]; a body with
//! no `data` field decodes to an empty result.

use anyhow::{Context, Result};
use serde::de::DeserializeOwned;
use std::future::Future;
use std::time::{Duration, Instant};
use thiserror::Error;
use tracing::debug;

use crate::filters::FilterParams;
use crate::types::{
    DataEnvelope, HotMarket, ProfitEntry, SmartMoneyEntry, SuspiciousWallet, WhaleEntry,
};

pub const SMART_MONEY_PATH: &str = "/monitor/smart-money";
pub const WHALES_PATH: &str = "/monitor/whales";
pub const TOP_PROFIT_PATH: &str = "/rankings/top-profit";
pub const HOT_MARKETS_PATH: &str = "/markets/hot";
pub const SUSPICIOUS_WALLETS_PATH: &str = "/monitor/suspicious-wallets";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FetchError {
    /// The request could not complete (DNS, refused connection, aborted body).
    #[error("request to {path} failed: {message}")]
    Transport { path: &'static str, message: String },
    /// A response arrived with a non-success status code.
    #[error("Request failed: {status}")]
    Status { path: &'static str, status: u16 },
    /// The body was not a JSON envelope of the expected records.
    #[error("invalid response from {path}: {message}")]
    Decode { path: &'static str, message: String },
}

impl FetchError {
    pub fn path(&self) -> &'static str {
        match self {
            Self::Transport { path, .. } | Self::Status { path, .. } | Self::Decode { path, .. } => {
                path
            }
        }
    }
}

/// The five monitor endpoints. Implemented by [`MonitorClient`] and by test fakes.
pub trait MonitorApi: Send + Sync {
    fn smart_money(
        &self,
    ) -> impl Future<Output = Result<Vec<SmartMoneyEntry>, FetchError>> + Send;
    fn whales(&self) -> impl Future<Output = Result<Vec<WhaleEntry>, FetchError>> + Send;
    fn top_profit(&self) -> impl Future<Output = Result<Vec<ProfitEntry>, FetchError>> + Send;
    fn hot_markets(&self) -> impl Future<Output = Result<Vec<HotMarket>, FetchError>> + Send;
    fn suspicious_wallets(
        &self,
        filters: &FilterParams,
    ) -> impl Future<Output = Result<Vec<SuspiciousWallet>, FetchError>> + Send;
}

pub struct MonitorClient {
    base_url: String,
    client: reqwest::Client,
}

impl MonitorClient {
    /// `timeout` of `None` leaves requests unbounded: a hung endpoint delays
    /// its refresh cycle until it settles.
    pub fn new(base_url: &str, timeout: Option<Duration>) -> Result<Self> {
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder.build().context("failed to build HTTP client")?;

        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn url_for(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    pub fn suspicious_wallets_url(&self, filters: &FilterParams) -> String {
        format!(
            "{}?{}",
            self.url_for(SUSPICIOUS_WALLETS_PATH),
            filters.to_query_string()
        )
    }

    async fn get_records<T: DeserializeOwned>(
        &self,
        path: &'static str,
        url: String,
    ) -> Result<Vec<T>, FetchError> {
        let started = Instant::now();
        let result = self.send(path, &url).await;
        let status = if result.is_ok() { "ok" } else { "err" };
        metrics::counter!("dashboard_api_requests_total", "path" => path, "status" => status)
            .increment(1);
        debug!(
            url = %url,
            status,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "monitor api request finished"
        );
        result
    }

    async fn send<T: DeserializeOwned>(
        &self,
        path: &'static str,
        url: &str,
    ) -> Result<Vec<T>, FetchError> {
        let resp = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| FetchError::Transport {
                path,
                message: e.to_string(),
            })?;

        let status = resp.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                path,
                status: status.as_u16(),
            });
        }

        let body = resp.bytes().await.map_err(|e| FetchError::Transport {
            path,
            message: e.to_string(),
        })?;

        let envelope: DataEnvelope<T> =
            serde_json::from_slice(&body).map_err(|e| FetchError::Decode {
                path,
                message: e.to_string(),
            })?;
        Ok(envelope.into_records())
    }
}

impl MonitorApi for MonitorClient {
    async fn smart_money(&self) -> Result<Vec<SmartMoneyEntry>, FetchError> {
        self.get_records(SMART_MONEY_PATH, self.url_for(SMART_MONEY_PATH))
            .await
    }

    async fn whales(&self) -> Result<Vec<WhaleEntry>, FetchError> {
        self.get_records(WHALES_PATH, self.url_for(WHALES_PATH)).await
    }

    async fn top_profit(&self) -> Result<Vec<ProfitEntry>, FetchError> {
        self.get_records(TOP_PROFIT_PATH, self.url_for(TOP_PROFIT_PATH))
            .await
    }

    async fn hot_markets(&self) -> Result<Vec<HotMarket>, FetchError> {
        self.get_records(HOT_MARKETS_PATH, self.url_for(HOT_MARKETS_PATH))
            .await
    }

    async fn suspicious_wallets(
        &self,
        filters: &FilterParams,
    ) -> Result<Vec<SuspiciousWallet>, FetchError> {
        self.get_records(SUSPICIOUS_WALLETS_PATH, self.suspicious_wallets_url(filters))
            .await
    }
}
