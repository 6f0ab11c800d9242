use chrono::Utc;
use common::filters::FilterParams;
use common::monitor_api::{FetchError, MonitorApi};
use common::types::{HotMarket, ProfitEntry, SmartMoneyEntry, SuspiciousWallet, WhaleEntry};
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::filter_state::FilterState;
use crate::session::Session;
use crate::sources::{DashboardSnapshot, Source, SourceState};

/// Shown when a cycle ended without an error message of its own.
pub const GENERIC_FAILURE_MESSAGE: &str = "failed to load data";

/// Results of one fully successful refresh cycle.
#[derive(Debug, Clone)]
pub struct CycleData {
    pub smart_money: Vec<SmartMoneyEntry>,
    pub whales: Vec<WhaleEntry>,
    pub top_profit: Vec<ProfitEntry>,
    pub hot_markets: Vec<HotMarket>,
    pub suspicious_wallets: Vec<SuspiciousWallet>,
}

impl CycleData {
    /// Replace every source with its fresh payload in one step.
    pub fn apply_to(self, snapshot: &mut DashboardSnapshot) {
        snapshot.smart_money = SourceState::Ready(self.smart_money);
        snapshot.whales = SourceState::Ready(self.whales);
        snapshot.top_profit = SourceState::Ready(self.top_profit);
        snapshot.hot_markets = SourceState::Ready(self.hot_markets);
        snapshot.suspicious_wallets = SourceState::Ready(self.suspicious_wallets);
        snapshot.last_refreshed_at = Some(Utc::now());
    }

    pub fn len(&self, source: Source) -> usize {
        match source {
            Source::SmartMoney => self.smart_money.len(),
            Source::Whales => self.whales.len(),
            Source::TopProfit => self.top_profit.len(),
            Source::HotMarkets => self.hot_markets.len(),
            Source::SuspiciousWallets => self.suspicious_wallets.len(),
        }
    }
}

/// A cycle in which at least one request failed. The message applies to all
/// five sources.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CycleFailure {
    /// The request whose failure ended the cycle.
    pub source: Option<Source>,
    pub message: String,
}

// Implemented by hand: thiserror treats a field named `source` as the error
// cause, which `Option<Source>` is not.
impl std::fmt::Display for CycleFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.message)
    }
}

impl std::error::Error for CycleFailure {}

impl CycleFailure {
    /// A cycle that ended without an error of its own, e.g. a panicked fetch task.
    pub fn generic() -> Self {
        Self {
            source: None,
            message: GENERIC_FAILURE_MESSAGE.to_string(),
        }
    }
}

impl From<FetchError> for CycleFailure {
    fn from(err: FetchError) -> Self {
        Self {
            source: Source::from_path(err.path()),
            message: err.to_string(),
        }
    }
}

/// Drives the five monitor requests for a dashboard view.
pub struct DataOrchestrator<A> {
    api: Arc<A>,
    period: Duration,
}

impl<A> Clone for DataOrchestrator<A> {
    fn clone(&self) -> Self {
        Self {
            api: Arc::clone(&self.api),
            period: self.period,
        }
    }
}

impl<A: MonitorApi + 'static> DataOrchestrator<A> {
    pub fn new(api: Arc<A>, period: Duration) -> Self {
        Self { api, period }
    }

    /// Interval between timer-driven cycles.
    pub fn period(&self) -> Duration {
        self.period
    }

    /// One refresh cycle: all five requests in flight together. The cycle
    /// resolves once every request has succeeded, or as soon as any one fails.
    /// Only the suspicious-wallet request carries the filters.
    pub async fn refresh(&self, filters: &FilterParams) -> Result<CycleData, CycleFailure> {
        let started = Instant::now();
        let result = tokio::try_join!(
            self.api.smart_money(),
            self.api.whales(),
            self.api.top_profit(),
            self.api.hot_markets(),
            self.api.suspicious_wallets(filters),
        );
        metrics::histogram!("dashboard_refresh_latency_ms")
            .record(started.elapsed().as_secs_f64() * 1000.0);

        let (smart_money, whales, top_profit, hot_markets, suspicious_wallets) = result?;
        Ok(CycleData {
            smart_money,
            whales,
            top_profit,
            hot_markets,
            suspicious_wallets,
        })
    }

    /// Start the refresh lifecycle for one view: an immediate cycle, then one
    /// per period until the returned session is torn down or dropped.
    pub fn start_session(&self, filters: FilterState) -> Session {
        Session::spawn(self.clone(), filters)
    }
}
