//! In-memory stand-in for the monitor API.

use common::filters::FilterParams;
use common::monitor_api::{FetchError, MonitorApi};
use common::types::{HotMarket, ProfitEntry, SmartMoneyEntry, SuspiciousWallet, WhaleEntry};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tokio::sync::Semaphore;

use crate::sources::Source;

/// Every endpoint answers with one row. A source can be made to fail with a
/// 500, and the suspicious-wallet request can be held on a gate keyed by the
/// `min_stake` it was issued with.
#[derive(Default)]
pub struct FakeApi {
    failing: Option<Source>,
    panics: bool,
    gates: Mutex<HashMap<u64, Arc<Semaphore>>>,
    suspicious_calls: Mutex<Vec<FilterParams>>,
}

impl FakeApi {
    pub fn failing(source: Source) -> Self {
        Self {
            failing: Some(source),
            ..Self::default()
        }
    }

    /// The smart-money request panics instead of answering.
    pub fn panicking() -> Self {
        Self {
            panics: true,
            ..Self::default()
        }
    }

    /// Hold suspicious-wallet requests for `min_stake` until a permit is added.
    pub fn gate(&self, min_stake: u64) -> Arc<Semaphore> {
        let mut gates = self.gates.lock().unwrap();
        Arc::clone(
            gates
                .entry(min_stake)
                .or_insert_with(|| Arc::new(Semaphore::new(0))),
        )
    }

    pub fn suspicious_calls(&self) -> Vec<FilterParams> {
        self.suspicious_calls.lock().unwrap().clone()
    }

    fn check(&self, source: Source) -> Result<(), FetchError> {
        if self.failing == Some(source) {
            return Err(FetchError::Status {
                path: source.path(),
                status: 500,
            });
        }
        Ok(())
    }
}

impl MonitorApi for FakeApi {
    async fn smart_money(&self) -> Result<Vec<SmartMoneyEntry>, FetchError> {
        assert!(!self.panics, "smart money endpoint exploded");
        self.check(Source::SmartMoney)?;
        Ok(vec![SmartMoneyEntry {
            user_id: "0xsmart".into(),
            roi: 0.25,
            win_rate: 0.6,
            profit: 15_000.0,
            trade_count: 12,
        }])
    }

    async fn whales(&self) -> Result<Vec<WhaleEntry>, FetchError> {
        self.check(Source::Whales)?;
        Ok(vec![WhaleEntry {
            user_id: "0xwhale".into(),
            net_invested: 250_000.0,
        }])
    }

    async fn top_profit(&self) -> Result<Vec<ProfitEntry>, FetchError> {
        self.check(Source::TopProfit)?;
        Ok(vec![ProfitEntry {
            user_id: "0xtop".into(),
            profit: 90_000.0,
        }])
    }

    async fn hot_markets(&self) -> Result<Vec<HotMarket>, FetchError> {
        self.check(Source::HotMarkets)?;
        Ok(vec![HotMarket {
            market_id: "0xmarket".into(),
            question: Some("Will it rain?".into()),
            volume: 1_000_000.0,
        }])
    }

    async fn suspicious_wallets(
        &self,
        filters: &FilterParams,
    ) -> Result<Vec<SuspiciousWallet>, FetchError> {
        self.suspicious_calls.lock().unwrap().push(*filters);
        let gate = self
            .gates
            .lock()
            .unwrap()
            .get(&(filters.min_stake as u64))
            .cloned();
        if let Some(gate) = gate {
            let _permit = gate.acquire().await;
        }
        self.check(Source::SuspiciousWallets)?;
        Ok(vec![SuspiciousWallet {
            user_id: "0xsus".into(),
            reason: "new_account_large_bet".into(),
            market_id: "0xmarket".into(),
            stake: filters.min_stake,
            first_trade_at: None,
            profit_hit_at: None,
        }])
    }
}
