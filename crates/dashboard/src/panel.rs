//! What each panel shows, and a plain-text rendering of it for the terminal.

use chrono::{DateTime, Local, NaiveDateTime};
use common::filters::{format_number, FilterParams};
use common::types::{HotMarket, ProfitEntry, SmartMoneyEntry, SuspiciousWallet, WhaleEntry};
use std::fmt::Write as _;

use crate::sources::{DashboardSnapshot, Source, SourceState};

/// Panel content derived from one source's state.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PanelView<'a, T> {
    Loading,
    Rows(&'a [T]),
    /// Settled with nothing to show: the cycle's error message, or the
    /// panel's default text.
    Empty(&'a str),
}

impl<'a, T> PanelView<'a, T> {
    pub fn derive(source: Source, state: &'a SourceState<T>) -> Self {
        match state {
            SourceState::Loading => Self::Loading,
            SourceState::Ready(rows) if !rows.is_empty() => Self::Rows(rows),
            SourceState::Ready(_) => Self::Empty(source.empty_message()),
            SourceState::Failed(message) if !message.is_empty() => Self::Empty(message),
            SourceState::Failed(_) => Self::Empty(source.empty_message()),
        }
    }
}

/// A record that renders as one table row.
trait TableRow {
    const COLUMNS: &'static [&'static str];

    /// `rank` is the zero-based position of the row in its panel.
    fn cells(&self, rank: usize) -> Vec<String>;
}

impl TableRow for SmartMoneyEntry {
    const COLUMNS: &'static [&'static str] = &["Wallet", "ROI", "Win rate", "Profit", "Trades"];

    fn cells(&self, _rank: usize) -> Vec<String> {
        vec![
            self.user_id.clone(),
            format_percent(self.roi),
            format_percent(self.win_rate),
            format_usd(self.profit),
            self.trade_count.to_string(),
        ]
    }
}

impl TableRow for WhaleEntry {
    const COLUMNS: &'static [&'static str] = &["Wallet", "Net invested (24h)"];

    fn cells(&self, _rank: usize) -> Vec<String> {
        vec![self.user_id.clone(), format_usd(self.net_invested)]
    }
}

impl TableRow for ProfitEntry {
    const COLUMNS: &'static [&'static str] = &["Rank", "User", "Total profit"];

    fn cells(&self, rank: usize) -> Vec<String> {
        vec![
            format!("#{}", rank + 1),
            self.user_id.clone(),
            format_usd(self.profit),
        ]
    }
}

impl TableRow for HotMarket {
    const COLUMNS: &'static [&'static str] = &["Market", "Volume"];

    fn cells(&self, _rank: usize) -> Vec<String> {
        vec![self.title().to_string(), format_usd(self.volume)]
    }
}

impl TableRow for SuspiciousWallet {
    const COLUMNS: &'static [&'static str] = &["Wallet", "Reason", "Stake", "First trade", "Market"];

    fn cells(&self, _rank: usize) -> Vec<String> {
        vec![
            short_wallet(&self.user_id),
            reason_label(&self.reason).to_string(),
            format_usd(self.stake),
            format_trade_time(self.first_trade_at.as_deref()),
            short_market(&self.market_id),
        ]
    }
}

/// All five panels, in display order, preceded by a status line.
pub fn render_dashboard(snapshot: &DashboardSnapshot) -> String {
    let mut out = String::new();
    let status = match snapshot.last_refreshed_at {
        Some(at) => format!(
            "last refreshed {}",
            at.with_timezone(&Local).format("%Y-%m-%d %H:%M:%S")
        ),
        None => "waiting for first refresh".to_string(),
    };
    let _ = writeln!(out, "{}\n{status}\n", snapshot.address);

    render_panel(&mut out, Source::SmartMoney, None, &snapshot.smart_money);
    render_panel(&mut out, Source::Whales, None, &snapshot.whales);
    render_panel(&mut out, Source::TopProfit, None, &snapshot.top_profit);
    let summary = filter_summary(&snapshot.filters);
    render_panel(
        &mut out,
        Source::SuspiciousWallets,
        Some(&summary),
        &snapshot.suspicious_wallets,
    );
    render_panel(&mut out, Source::HotMarkets, None, &snapshot.hot_markets);
    out
}

fn render_panel<T: TableRow>(
    out: &mut String,
    source: Source,
    subtitle: Option<&str>,
    state: &SourceState<T>,
) {
    match subtitle {
        Some(subtitle) => {
            let _ = writeln!(out, "== {} ({subtitle}) ==", source.title());
        }
        None => {
            let _ = writeln!(out, "== {} ==", source.title());
        }
    }
    match PanelView::derive(source, state) {
        PanelView::Loading => out.push_str("  loading...\n"),
        PanelView::Empty(message) => {
            let _ = writeln!(out, "  {message}");
        }
        PanelView::Rows(rows) => render_table(out, rows),
    }
    out.push('\n');
}

fn render_table<T: TableRow>(out: &mut String, rows: &[T]) {
    let cells: Vec<Vec<String>> = rows
        .iter()
        .enumerate()
        .map(|(rank, row)| row.cells(rank))
        .collect();
    let mut widths: Vec<usize> = T::COLUMNS.iter().map(|c| c.chars().count()).collect();
    for row in &cells {
        for (width, cell) in widths.iter_mut().zip(row) {
            *width = (*width).max(cell.chars().count());
        }
    }

    let header: Vec<String> = T::COLUMNS.iter().map(ToString::to_string).collect();
    write_row(out, &header, &widths);
    for row in &cells {
        write_row(out, row, &widths);
    }
}

fn write_row(out: &mut String, cells: &[String], widths: &[usize]) {
    let line = cells
        .iter()
        .zip(widths)
        .map(|(cell, width)| format!("{cell:<width$}"))
        .collect::<Vec<_>>()
        .join("  ");
    let _ = writeln!(out, "  {}", line.trim_end());
}

/// `Age>30d Stake>$10,000 Profit>$10,000 Reinv:1-30d`
pub fn filter_summary(filters: &FilterParams) -> String {
    format!(
        "Age>{}d Stake>{} Profit>{} Reinv:{}-{}d",
        format_number(filters.min_account_age_days),
        format_usd(filters.min_stake),
        format_usd(filters.min_profit),
        format_number(filters.reinvest_min_days),
        format_number(filters.reinvest_max_days),
    )
}

/// `0.1234` → `12.34%`
pub fn format_percent(ratio: f64) -> String {
    format!("{:.2}%", ratio * 100.0)
}

/// Dollar amount with thousands separators and at most two decimals,
/// trailing zeros dropped: `$1,234.5`.
pub fn format_usd(value: f64) -> String {
    if !value.is_finite() {
        return format!("${value}");
    }
    let cents_total = (value.abs() * 100.0).round() as u64;
    let whole = group_thousands(cents_total / 100);
    let cents = cents_total % 100;
    let sign = if value < 0.0 && cents_total > 0 { "-" } else { "" };
    match cents {
        0 => format!("${sign}{whole}"),
        c if c % 10 == 0 => format!("${sign}{whole}.{}", c / 10),
        c => format!("${sign}{whole}.{c:02}"),
    }
}

fn group_thousands(n: u64) -> String {
    let digits = n.to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    grouped
}

/// `0x1234567890abcdef` → `0x1234...cdef`
pub fn short_wallet(id: &str) -> String {
    let chars: Vec<char> = id.chars().collect();
    if chars.len() <= 10 {
        return id.to_string();
    }
    let head: String = chars[..6].iter().collect();
    let tail: String = chars[chars.len() - 4..].iter().collect();
    format!("{head}...{tail}")
}

pub fn short_market(id: &str) -> String {
    let head: String = id.chars().take(4).collect();
    format!("{head}...")
}

pub fn reason_label(reason: &str) -> &str {
    match reason {
        "new_account_large_bet" => "new account, large bet",
        other => other,
    }
}

/// `MM-DD HH:MM` in local time. Timestamps without an offset are taken as
/// already local. Absent → `-`; unparsable → shown as received.
pub fn format_trade_time(raw: Option<&str>) -> String {
    let Some(raw) = raw.filter(|r| !r.is_empty()) else {
        return "-".to_string();
    };
    if let Ok(at) = DateTime::parse_from_rfc3339(raw) {
        return at.with_timezone(&Local).format("%m-%d %H:%M").to_string();
    }
    for pattern in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"] {
        if let Ok(at) = NaiveDateTime::parse_from_str(raw, pattern) {
            return at.format("%m-%d %H:%M").to_string();
        }
    }
    raw.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_derive_view_from_state() {
        let loading: SourceState<WhaleEntry> = SourceState::Loading;
        assert_eq!(
            PanelView::derive(Source::Whales, &loading),
            PanelView::Loading
        );

        let empty: SourceState<WhaleEntry> = SourceState::Ready(vec![]);
        assert_eq!(
            PanelView::derive(Source::Whales, &empty),
            PanelView::Empty("No whale data")
        );

        let failed: SourceState<WhaleEntry> = SourceState::Failed("Request failed: 503".into());
        assert_eq!(
            PanelView::derive(Source::Whales, &failed),
            PanelView::Empty("Request failed: 503")
        );

        let blank: SourceState<WhaleEntry> = SourceState::Failed(String::new());
        assert_eq!(
            PanelView::derive(Source::Whales, &blank),
            PanelView::Empty("No whale data")
        );

        let rows = vec![WhaleEntry {
            user_id: "0xw".into(),
            net_invested: 1.0,
        }];
        let ready = SourceState::Ready(rows.clone());
        assert_eq!(
            PanelView::derive(Source::Whales, &ready),
            PanelView::Rows(&rows[..])
        );
    }

    #[test]
    fn test_format_usd() {
        assert_eq!(format_usd(10_000.0), "$10,000");
        assert_eq!(format_usd(1234.5), "$1,234.5");
        assert_eq!(format_usd(1234.567), "$1,234.57");
        assert_eq!(format_usd(0.0), "$0");
        assert_eq!(format_usd(999.999), "$1,000");
        assert_eq!(format_usd(-2500.05), "$-2,500.05");
        assert_eq!(format_usd(1_000_000.0), "$1,000,000");
    }

    #[test]
    fn test_format_percent() {
        assert_eq!(format_percent(0.1234), "12.34%");
        assert_eq!(format_percent(1.0), "100.00%");
    }

    #[test]
    fn test_short_ids() {
        assert_eq!(short_wallet("0x1234567890abcdef"), "0x1234...cdef");
        assert_eq!(short_wallet("0xabc"), "0xabc");
        assert_eq!(short_market("0xmarket"), "0xma...");
    }

    #[test]
    fn test_reason_label() {
        assert_eq!(reason_label("new_account_large_bet"), "new account, large bet");
        assert_eq!(reason_label("fast_reinvest"), "fast_reinvest");
    }

    #[test]
    fn test_format_trade_time() {
        assert_eq!(format_trade_time(None), "-");
        assert_eq!(format_trade_time(Some("")), "-");
        assert_eq!(format_trade_time(Some("2024-03-07T09:05:00")), "03-07 09:05");
        assert_eq!(
            format_trade_time(Some("2024-11-20 23:59:59.123")),
            "11-20 23:59"
        );
        assert_eq!(format_trade_time(Some("yesterday")), "yesterday");
    }

    #[test]
    fn test_filter_summary_defaults() {
        assert_eq!(
            filter_summary(&FilterParams::default()),
            "Age>30d Stake>$10,000 Profit>$10,000 Reinv:1-30d"
        );
        let custom = FilterParams {
            reinvest_max_days: 7.5,
            ..FilterParams::default()
        };
        assert!(filter_summary(&custom).ends_with("Reinv:1-7.5d"));
    }

    #[test]
    fn test_render_dashboard_panels() {
        let mut snap = DashboardSnapshot::new(FilterParams::default(), "http://h/?x=1".into());
        snap.top_profit = SourceState::Ready(vec![
            ProfitEntry {
                user_id: "0xfirst".into(),
                profit: 50_000.0,
            },
            ProfitEntry {
                user_id: "0xsecond".into(),
                profit: 40_000.0,
            },
        ]);
        snap.whales = SourceState::Ready(vec![]);
        snap.hot_markets = SourceState::Failed("Request failed: 502".into());

        let text = render_dashboard(&snap);
        assert!(text.starts_with("http://h/?x=1\nwaiting for first refresh\n"));
        assert!(text.contains("== Smart money flows ==\n  loading...\n"));
        assert!(text.contains("== Whale watch ==\n  No whale data\n"));
        assert!(text.contains("#1    0xfirst   $50,000"));
        assert!(text.contains("#2    0xsecond  $40,000"));
        assert!(text.contains(
            "== Suspicious wallets (Age>30d Stake>$10,000 Profit>$10,000 Reinv:1-30d) =="
        ));
        assert!(text.contains("== Hot markets ==\n  Request failed: 502\n"));
    }

    #[test]
    fn test_suspicious_row_cells() {
        let row = SuspiciousWallet {
            user_id: "0x1234567890abcdef".into(),
            reason: "new_account_large_bet".into(),
            market_id: "0xmarket".into(),
            stake: 25_000.0,
            first_trade_at: None,
            profit_hit_at: None,
        };
        assert_eq!(
            row.cells(0),
            vec![
                "0x1234...cdef",
                "new account, large bet",
                "$25,000",
                "-",
                "0xma..."
            ]
        );
    }
}
