use chrono::NaiveDate;
use log::warn;
use serde::{Deserialize, Serialize};

/// 日线数据结构
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyBar {
    pub date: NaiveDate,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: u64,
}

impl DailyBar {
    pub fn new(date: NaiveDate, open: f64, high: f64, low: f64, close: f64, volume: u64) -> Self {
        Self { date, open, high, low, close, volume }
    }

    /// `low <= high` with both prices non-negative and finite.
    pub fn is_valid(&self) -> bool {
        self.high.is_finite()
            && self.low.is_finite()
            && self.low >= 0.0
            && self.low <= self.high
    }
}

/// Daily bars for one ticker, always ascending by date with unique dates.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PriceSeries {
    pub symbol: String,
    pub name: Option<String>,
    bars: Vec<DailyBar>,
}

impl PriceSeries {
    /// Builds a series from bars in any order.
    ///
    /// Bars are sorted by date; the first bar seen for a date wins and
    /// bars failing [`DailyBar::is_valid`] are dropped with a warning.
    pub fn new(symbol: &str, name: Option<String>, bars: Vec<DailyBar>) -> Self {
        let mut kept: Vec<DailyBar> = Vec::with_capacity(bars.len());
        for bar in bars {
            if !bar.is_valid() {
                warn!(
                    "Dropping invalid bar for {} on {}: high={} low={}",
                    symbol, bar.date, bar.high, bar.low
                );
                continue;
            }
            if kept.iter().any(|b| b.date == bar.date) {
                warn!("Dropping duplicate bar for {} on {}", symbol, bar.date);
                continue;
            }
            kept.push(bar);
        }

        kept.sort_by(|a, b| a.date.cmp(&b.date));

        Self {
            symbol: symbol.to_string(),
            name,
            bars: kept,
        }
    }

    pub fn bars(&self) -> &[DailyBar] {
        &self.bars
    }

    pub fn len(&self) -> usize {
        self.bars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }

    /// The last `n` bars by date, or all of them when fewer exist.
    pub fn tail(&self, n: usize) -> &[DailyBar] {
        let start = self.bars.len().saturating_sub(n);
        &self.bars[start..]
    }

    /// Bars dated within `[from, to]` inclusive.
    pub fn between(&self, from: NaiveDate, to: NaiveDate) -> impl Iterator<Item = &DailyBar> {
        self.bars.iter().filter(move |b| b.date >= from && b.date <= to)
    }

    pub fn first_date(&self) -> Option<NaiveDate> {
        self.bars.first().map(|b| b.date)
    }

    pub fn last_date(&self) -> Option<NaiveDate> {
        self.bars.last().map(|b| b.date)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 5, day).unwrap()
    }

    fn bar(day: u32, high: f64, low: f64) -> DailyBar {
        DailyBar::new(d(day), low, high, low, high, 1000)
    }

    #[test]
    fn series_sorts_unordered_input() {
        let bars = vec![bar(9, 10.0, 9.0), bar(7, 11.0, 8.0), bar(8, 12.0, 7.0)];
        let series = PriceSeries::new("7203.T", None, bars);
        let dates: Vec<_> = series.bars().iter().map(|b| b.date).collect();
        assert_eq!(dates, vec![d(7), d(8), d(9)]);
    }

    #[test]
    fn duplicate_dates_keep_first_seen() {
        let series = PriceSeries::new("7203.T", None, vec![bar(7, 11.0, 8.0), bar(7, 99.0, 1.0)]);
        assert_eq!(series.len(), 1);
        assert_eq!(series.bars()[0].high, 11.0);
    }

    #[test]
    fn invalid_bars_are_dropped() {
        let series = PriceSeries::new(
            "7203.T",
            None,
            vec![bar(7, 8.0, 9.0), bar(8, f64::NAN, 1.0), bar(9, 10.0, 9.0)],
        );
        assert_eq!(series.len(), 1);
        assert_eq!(series.first_date(), Some(d(9)));
    }

    #[test]
    fn tail_on_short_series_returns_everything() {
        let series = PriceSeries::new("7203.T", None, vec![bar(7, 11.0, 8.0), bar(8, 12.0, 7.0)]);
        assert_eq!(series.tail(5).len(), 2);
        assert_eq!(series.tail(1)[0].date, d(8));
    }

    #[test]
    fn between_is_inclusive() {
        let series = PriceSeries::new(
            "7203.T",
            None,
            vec![bar(6, 1.0, 1.0), bar(7, 1.0, 1.0), bar(8, 1.0, 1.0), bar(9, 1.0, 1.0)],
        );
        let dates: Vec<_> = series.between(d(7), d(8)).map(|b| b.date).collect();
        assert_eq!(dates, vec![d(7), d(8)]);
    }
}
