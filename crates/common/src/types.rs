use serde::{Deserialize, Serialize};

/// Top-level response body of every monitor endpoint: `{"data": [...]}`.
#[derive(Debug, Clone, Deserialize)]
#[serde(bound(deserialize = "T: Deserialize<'de>"))]
pub struct DataEnvelope<T> {
    #[serde(default)]
    pub data: Option<Vec<T>>,
}

impl<T> DataEnvelope<T> {
    /// Records carried by the envelope. A missing or null `data` field is an
    /// empty result, not an error.
    pub fn into_records(self) -> Vec<T> {
        self.data.unwrap_or_default()
    }
}

/// Row from `GET /monitor/smart-money`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SmartMoneyEntry {
    pub user_id: String,
    pub roi: f64,
    pub win_rate: f64,
    pub profit: f64,
    pub trade_count: u64,
}

/// Row from `GET /monitor/whales`: 24h net invested per wallet.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WhaleEntry {
    pub user_id: String,
    pub net_invested: f64,
}

/// Row from `GET /rankings/top-profit`, already sorted by the API.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProfitEntry {
    pub user_id: String,
    pub profit: f64,
}

/// Row from `GET /markets/hot`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HotMarket {
    pub market_id: String,
    #[serde(default)]
    pub question: Option<String>,
    pub volume: f64,
}

impl HotMarket {
    /// Question text, or the market id when the API has none.
    pub fn title(&self) -> &str {
        self.question
            .as_deref()
            .filter(|q| !q.is_empty())
            .unwrap_or(&self.market_id)
    }
}

/// Row from `GET /monitor/suspicious-wallets`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SuspiciousWallet {
    pub user_id: String,
    pub reason: String,
    pub market_id: String,
    pub stake: f64,
    #[serde(default)]
    pub first_trade_at: Option<String>,
    #[serde(default)]
    pub profit_hit_at: Option<String>,
}
