use common::filters::{FilterKey, FilterParams};
use tracing::debug;

use crate::address::PageAddress;

/// Filter parameters bound two-way to the page address.
///
/// Seeded from the address once per view. Every change rewrites all five
/// values into the address, so a copied link reproduces the filtered view.
#[derive(Debug, Clone)]
pub struct FilterState {
    params: FilterParams,
    address: PageAddress,
}

impl FilterState {
    pub fn from_address(mut address: PageAddress) -> Self {
        let params = FilterParams::from_query_pairs(address.query_pairs());
        address.replace_filter_query(&params);
        Self { params, address }
    }

    pub fn params(&self) -> &FilterParams {
        &self.params
    }

    pub fn address(&self) -> &PageAddress {
        &self.address
    }

    pub fn shareable_url(&self) -> String {
        self.address.to_string()
    }

    pub fn set_min_account_age_days(&mut self, value: f64) -> bool {
        self.set(FilterKey::MinAccountAgeDays, value)
    }

    pub fn set_min_stake(&mut self, value: f64) -> bool {
        self.set(FilterKey::MinStake, value)
    }

    pub fn set_min_profit(&mut self, value: f64) -> bool {
        self.set(FilterKey::MinProfit, value)
    }

    /// Ignored when `value` exceeds the current maximum.
    pub fn set_reinvest_min_days(&mut self, value: f64) -> bool {
        self.set(FilterKey::ReinvestMinDays, value)
    }

    /// Ignored when `value` is below the current minimum.
    pub fn set_reinvest_max_days(&mut self, value: f64) -> bool {
        self.set(FilterKey::ReinvestMaxDays, value)
    }

    /// Apply one update. Returns `true` only if the stored value changed; a
    /// rejected or redundant update leaves both the parameters and the address
    /// untouched.
    pub fn set(&mut self, key: FilterKey, value: f64) -> bool {
        if !value.is_finite() {
            debug!(key = %key, value, "ignoring non-finite filter value");
            return false;
        }
        let allowed = match key {
            FilterKey::ReinvestMinDays => value <= self.params.reinvest_max_days,
            FilterKey::ReinvestMaxDays => value >= self.params.reinvest_min_days,
            FilterKey::MinAccountAgeDays | FilterKey::MinStake | FilterKey::MinProfit => true,
        };
        if !allowed {
            debug!(key = %key, value, "filter update would invert reinvest window, ignored");
            return false;
        }

        let slot = self.params.field_mut(key);
        if *slot == value {
            return false;
        }
        *slot = value;
        self.address.replace_filter_query(&self.params);
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn state(addr: &str) -> FilterState {
        FilterState::from_address(PageAddress::parse(addr))
    }

    #[test]
    fn test_seeds_defaults_and_syncs_address() {
        let s = state("http://localhost:5173/");
        assert_eq!(*s.params(), FilterParams::default());
        assert_eq!(
            s.shareable_url(),
            "http://localhost:5173/?account_age_days=30&large_stake=10000&profit_threshold=10000&reinvest_min_days=1&reinvest_max_days=30"
        );
    }

    #[test]
    fn test_seeds_from_query_with_fallbacks() {
        let s = state("/?account_age_days=7&large_stake=oops&reinvest_max_days=90");
        assert_eq!(s.params().min_account_age_days, 7.0);
        assert_eq!(s.params().min_stake, 10_000.0);
        assert_eq!(s.params().reinvest_max_days, 90.0);
        assert!(s.shareable_url().contains("large_stake=10000"));
    }

    #[test]
    fn test_reinvest_min_above_max_is_rejected() {
        let mut s = state("/");
        let before = s.shareable_url();
        assert!(!s.set_reinvest_min_days(45.0));
        assert_eq!(s.params().reinvest_min_days, 1.0);
        assert_eq!(s.shareable_url(), before);
    }

    #[test]
    fn test_reinvest_max_below_min_is_rejected() {
        let mut s = state("/?reinvest_min_days=10&reinvest_max_days=20");
        assert!(!s.set_reinvest_max_days(9.0));
        assert_eq!(s.params().reinvest_max_days, 20.0);
    }

    #[test]
    fn test_reinvest_bounds_may_meet() {
        let mut s = state("/");
        assert!(s.set_reinvest_min_days(30.0));
        assert!(!s.set_reinvest_max_days(30.0));
        assert!(s.set_reinvest_max_days(31.0));
        assert!(s.set_reinvest_max_days(30.0));
        assert_eq!(s.params().reinvest_min_days, s.params().reinvest_max_days);
    }

    #[test]
    fn test_unbounded_setters_accept_anything_numeric() {
        let mut s = state("/");
        assert!(s.set_min_account_age_days(0.0));
        assert!(s.set_min_stake(-5.0));
        assert!(s.set_min_profit(1e9));
        assert_eq!(s.params().min_stake, -5.0);
        assert!(!s.set_min_stake(f64::NAN));
        assert_eq!(s.params().min_stake, -5.0);
    }

    #[test]
    fn test_successful_update_rewrites_address() {
        let mut s = state("http://h/?tab=alerts");
        assert!(s.set_min_stake(2500.0));
        assert_eq!(
            s.shareable_url(),
            "http://h/?tab=alerts&account_age_days=30&large_stake=2500&profit_threshold=10000&reinvest_min_days=1&reinvest_max_days=30"
        );
    }

    #[test]
    fn test_same_value_is_not_a_change() {
        let mut s = state("/");
        assert!(!s.set_min_profit(10_000.0));
    }

    #[test]
    fn test_invariant_holds_over_mixed_sequences() {
        let mut s = state("/");
        let script: [(FilterKey, f64); 10] = [
            (FilterKey::ReinvestMaxDays, 5.0),
            (FilterKey::ReinvestMinDays, 6.0),
            (FilterKey::ReinvestMinDays, 0.0),
            (FilterKey::ReinvestMaxDays, -1.0),
            (FilterKey::MinStake, 1.0),
            (FilterKey::ReinvestMinDays, 5.0),
            (FilterKey::ReinvestMaxDays, 4.0),
            (FilterKey::ReinvestMaxDays, 100.0),
            (FilterKey::ReinvestMinDays, 101.0),
            (FilterKey::ReinvestMinDays, 99.5),
        ];
        for (key, value) in script {
            s.set(key, value);
            assert!(s.params().reinvest_min_days <= s.params().reinvest_max_days);
        }
        assert_eq!(s.params().reinvest_min_days, 99.5);
        assert_eq!(s.params().reinvest_max_days, 100.0);
    }

    #[test]
    fn test_address_round_trip_reproduces_params() {
        let mut s = state("http://h/");
        s.set_min_account_age_days(3.0);
        s.set_min_profit(0.0);
        s.set_reinvest_min_days(0.0);
        s.set_reinvest_max_days(12.5);
        let restored = state(&s.shareable_url());
        assert_eq!(restored.params(), s.params());
        assert_eq!(restored.shareable_url(), s.shareable_url());
    }
}
