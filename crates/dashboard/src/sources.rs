//! Per-source refresh state and the snapshot observers read.

use chrono::{DateTime, Utc};
use common::filters::FilterParams;
use common::monitor_api::{
    HOT_MARKETS_PATH, SMART_MONEY_PATH, SUSPICIOUS_WALLETS_PATH, TOP_PROFIT_PATH, WHALES_PATH,
};
use common::types::{HotMarket, ProfitEntry, SmartMoneyEntry, SuspiciousWallet, WhaleEntry};
use serde::ser::SerializeStruct;
use serde::{Serialize, Serializer};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Source {
    SmartMoney,
    Whales,
    TopProfit,
    HotMarkets,
    SuspiciousWallets,
}

impl Source {
    pub const ALL: [Source; 5] = [
        Self::SmartMoney,
        Self::Whales,
        Self::TopProfit,
        Self::HotMarkets,
        Self::SuspiciousWallets,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::SmartMoney => "smart_money",
            Self::Whales => "whales",
            Self::TopProfit => "top_profit",
            Self::HotMarkets => "hot_markets",
            Self::SuspiciousWallets => "suspicious_wallets",
        }
    }

    pub fn path(&self) -> &'static str {
        match self {
            Self::SmartMoney => SMART_MONEY_PATH,
            Self::Whales => WHALES_PATH,
            Self::TopProfit => TOP_PROFIT_PATH,
            Self::HotMarkets => HOT_MARKETS_PATH,
            Self::SuspiciousWallets => SUSPICIOUS_WALLETS_PATH,
        }
    }

    pub fn from_path(path: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|s| s.path() == path)
    }

    pub fn title(&self) -> &'static str {
        match self {
            Self::SmartMoney => "Smart money flows",
            Self::Whales => "Whale watch",
            Self::TopProfit => "Top profit (30d)",
            Self::HotMarkets => "Hot markets",
            Self::SuspiciousWallets => "Suspicious wallets",
        }
    }

    /// Shown for an empty panel when the cycle carried no error message.
    pub fn empty_message(&self) -> &'static str {
        match self {
            Self::SmartMoney => "No smart money data",
            Self::Whales => "No whale data",
            Self::TopProfit => "No profit data",
            Self::HotMarkets => "No hot market data",
            Self::SuspiciousWallets => "No suspicious wallet data",
        }
    }
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceStatus {
    Loading,
    Ready,
    Error,
}

/// Refresh state of one source. The payload exists only while `Ready` and the
/// message only while `Failed`.
#[derive(Debug, Clone, PartialEq)]
pub enum SourceState<T> {
    Loading,
    Ready(Vec<T>),
    Failed(String),
}

impl<T> SourceState<T> {
    pub fn status(&self) -> SourceStatus {
        match self {
            Self::Loading => SourceStatus::Loading,
            Self::Ready(_) => SourceStatus::Ready,
            Self::Failed(_) => SourceStatus::Error,
        }
    }

    pub fn payload(&self) -> &[T] {
        match self {
            Self::Ready(rows) => rows,
            Self::Loading | Self::Failed(_) => &[],
        }
    }

    pub fn error_message(&self) -> Option<&str> {
        match self {
            Self::Failed(message) => Some(message),
            Self::Loading | Self::Ready(_) => None,
        }
    }
}

impl<T: Serialize> Serialize for SourceState<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("SourceState", 3)?;
        state.serialize_field("status", &self.status())?;
        state.serialize_field("data", self.payload())?;
        state.serialize_field("error", &self.error_message())?;
        state.end()
    }
}

/// Everything a view renders, published as one value per change.
#[derive(Debug, Clone, Serialize)]
pub struct DashboardSnapshot {
    /// Sequence number of the most recently started refresh cycle.
    pub generation: u64,
    pub filters: FilterParams,
    pub address: String,
    pub smart_money: SourceState<SmartMoneyEntry>,
    pub whales: SourceState<WhaleEntry>,
    pub top_profit: SourceState<ProfitEntry>,
    pub hot_markets: SourceState<HotMarket>,
    pub suspicious_wallets: SourceState<SuspiciousWallet>,
    pub last_refreshed_at: Option<DateTime<Utc>>,
}

impl DashboardSnapshot {
    pub fn new(filters: FilterParams, address: String) -> Self {
        Self {
            generation: 0,
            filters,
            address,
            smart_money: SourceState::Loading,
            whales: SourceState::Loading,
            top_profit: SourceState::Loading,
            hot_markets: SourceState::Loading,
            suspicious_wallets: SourceState::Loading,
            last_refreshed_at: None,
        }
    }

    pub fn status(&self, source: Source) -> SourceStatus {
        match source {
            Source::SmartMoney => self.smart_money.status(),
            Source::Whales => self.whales.status(),
            Source::TopProfit => self.top_profit.status(),
            Source::HotMarkets => self.hot_markets.status(),
            Source::SuspiciousWallets => self.suspicious_wallets.status(),
        }
    }

    pub fn error_message(&self, source: Source) -> Option<&str> {
        match source {
            Source::SmartMoney => self.smart_money.error_message(),
            Source::Whales => self.whales.error_message(),
            Source::TopProfit => self.top_profit.error_message(),
            Source::HotMarkets => self.hot_markets.error_message(),
            Source::SuspiciousWallets => self.suspicious_wallets.error_message(),
        }
    }

    /// Start of a cycle: every source goes back to `Loading`, clearing errors.
    pub fn mark_all_loading(&mut self) {
        self.smart_money = SourceState::Loading;
        self.whales = SourceState::Loading;
        self.top_profit = SourceState::Loading;
        self.hot_markets = SourceState::Loading;
        self.suspicious_wallets = SourceState::Loading;
    }

    /// A whole cycle failed: every source carries the same message.
    pub fn mark_all_failed(&mut self, message: &str) {
        self.smart_money = SourceState::Failed(message.to_string());
        self.whales = SourceState::Failed(message.to_string());
        self.top_profit = SourceState::Failed(message.to_string());
        self.hot_markets = SourceState::Failed(message.to_string());
        self.suspicious_wallets = SourceState::Failed(message.to_string());
    }

    pub fn all_settled(&self) -> bool {
        Source::ALL
            .into_iter()
            .all(|s| self.status(s) != SourceStatus::Loading)
    }
}
