//! Suspicious-wallet filter parameters and their query-string form.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::query::encode_query;

/// One of the five user-adjustable filter parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FilterKey {
    #[serde(rename = "account_age_days")]
    MinAccountAgeDays,
    #[serde(rename = "large_stake")]
    MinStake,
    #[serde(rename = "profit_threshold")]
    MinProfit,
    ReinvestMinDays,
    ReinvestMaxDays,
}

impl FilterKey {
    /// Canonical serialization order.
    pub const ALL: [FilterKey; 5] = [
        Self::MinAccountAgeDays,
        Self::MinStake,
        Self::MinProfit,
        Self::ReinvestMinDays,
        Self::ReinvestMaxDays,
    ];

    /// Query-string key, shared by the upstream API and the dashboard address.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::MinAccountAgeDays => "account_age_days",
            Self::MinStake => "large_stake",
            Self::MinProfit => "profit_threshold",
            Self::ReinvestMinDays => "reinvest_min_days",
            Self::ReinvestMaxDays => "reinvest_max_days",
        }
    }

    pub fn default_value(&self) -> f64 {
        match self {
            Self::MinAccountAgeDays => 30.0,
            Self::MinStake => 10_000.0,
            Self::MinProfit => 10_000.0,
            Self::ReinvestMinDays => 1.0,
            Self::ReinvestMaxDays => 30.0,
        }
    }
}

impl fmt::Display for FilterKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FilterKey {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|key| key.as_str() == s)
            .ok_or_else(|| format!("unknown filter key: {s}"))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FilterParams {
    pub min_account_age_days: f64,
    pub min_stake: f64,
    pub min_profit: f64,
    pub reinvest_min_days: f64,
    pub reinvest_max_days: f64,
}

impl Default for FilterParams {
    fn default() -> Self {
        Self {
            min_account_age_days: FilterKey::MinAccountAgeDays.default_value(),
            min_stake: FilterKey::MinStake.default_value(),
            min_profit: FilterKey::MinProfit.default_value(),
            reinvest_min_days: FilterKey::ReinvestMinDays.default_value(),
            reinvest_max_days: FilterKey::ReinvestMaxDays.default_value(),
        }
    }
}

impl FilterParams {
    pub fn get(&self, key: FilterKey) -> f64 {
        match key {
            FilterKey::MinAccountAgeDays => self.min_account_age_days,
            FilterKey::MinStake => self.min_stake,
            FilterKey::MinProfit => self.min_profit,
            FilterKey::ReinvestMinDays => self.reinvest_min_days,
            FilterKey::ReinvestMaxDays => self.reinvest_max_days,
        }
    }

    /// Raw field access. Callers enforce the reinvestment-bound invariant.
    pub fn field_mut(&mut self, key: FilterKey) -> &mut f64 {
        match key {
            FilterKey::MinAccountAgeDays => &mut self.min_account_age_days,
            FilterKey::MinStake => &mut self.min_stake,
            FilterKey::MinProfit => &mut self.min_profit,
            FilterKey::ReinvestMinDays => &mut self.reinvest_min_days,
            FilterKey::ReinvestMaxDays => &mut self.reinvest_max_days,
        }
    }

    /// Seed from decoded query pairs. The first occurrence of each key wins;
    /// absent or unparsable values fall back to the key's default.
    pub fn from_query_pairs<K, V>(pairs: &[(K, V)]) -> Self
    where
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let mut params = Self::default();
        for key in FilterKey::ALL {
            let parsed = pairs
                .iter()
                .find(|(k, _)| k.as_ref() == key.as_str())
                .and_then(|(_, v)| parse_number(v.as_ref()));
            if let Some(value) = parsed {
                *params.field_mut(key) = value;
            }
        }
        params
    }

    pub fn query_pairs(&self) -> Vec<(&'static str, String)> {
        FilterKey::ALL
            .into_iter()
            .map(|key| (key.as_str(), format_number(self.get(key))))
            .collect()
    }

    /// `account_age_days=..&large_stake=..&profit_threshold=..&reinvest_min_days=..&reinvest_max_days=..`
    pub fn to_query_string(&self) -> String {
        encode_query(&self.query_pairs())
    }
}

/// Parse a numeric query value. Empty and non-finite inputs are rejected.
pub fn parse_number(raw: &str) -> Option<f64> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    trimmed.parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Shortest decimal form: whole numbers carry no fraction (`30`, not `30.0`).
pub fn format_number(value: f64) -> String {
    if value == 0.0 {
        // Normalise -0 to 0.
        return "0".to_string();
    }
    format!("{value}")
}
