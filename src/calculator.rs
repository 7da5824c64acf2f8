//! Rule-1 high/low windowing and half-retrace arithmetic.
//!
//! The pipeline is `compute_high` → `compute_low` → `compute_retrace`:
//!
//! ```text
//! high          = max(High) over the last 5 bars          (earliest date on ties)
//! low           = min(Low) over [high_date - 14d, high_date] (earliest date on ties)
//! rise_ratio    = high / low
//! rise_width    = high - low
//! half_width    = floor(rise_width / 2)
//! retrace_price = floor(high - half_width)
//! ```
//!
//! Everything here is pure and synchronous.

use chrono::{Duration, NaiveDate};
use log::debug;

use crate::errors::{Result, Rule1Error};
use crate::models::{
    Analysis, LowOutcome, PricePoint, PriceSeries, RetraceOutcome, RetraceResult,
};

pub const DEFAULT_HIGH_LOOKBACK_BARS: usize = 5;
pub const DEFAULT_LOW_WINDOW_DAYS: i64 = 14;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HighLowRetraceCalculator {
    /// Number of trailing trading days searched for the high.
    pub high_lookback_bars: usize,
    /// Calendar days before the high date searched for the low.
    pub low_window_days: i64,
}

impl Default for HighLowRetraceCalculator {
    fn default() -> Self {
        Self {
            high_lookback_bars: DEFAULT_HIGH_LOOKBACK_BARS,
            low_window_days: DEFAULT_LOW_WINDOW_DAYS,
        }
    }
}

impl HighLowRetraceCalculator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Maximum `high` over the last `high_lookback_bars` bars.
    pub fn compute_high(&self, series: &PriceSeries) -> Result<PricePoint> {
        let recent = series.tail(self.high_lookback_bars);

        let mut best: Option<PricePoint> = None;
        for bar in recent {
            // 严格大于：相同高值保留最早日期
            if best.map_or(true, |b| bar.high > b.price) {
                best = Some(PricePoint { price: bar.high, date: bar.date });
            }
        }

        best.ok_or(Rule1Error::InsufficientData)
    }

    /// First day of the low window for a given high date.
    pub fn low_window_start(&self, high_date: NaiveDate) -> NaiveDate {
        high_date - Duration::days(self.low_window_days)
    }

    /// Minimum `low` over bars dated within `[high_date - low_window_days, high_date]`.
    pub fn compute_low(&self, series: &PriceSeries, high_date: NaiveDate) -> Result<PricePoint> {
        let window_start = self.low_window_start(high_date);

        let mut best: Option<PricePoint> = None;
        for bar in series.between(window_start, high_date) {
            if best.map_or(true, |b| bar.low < b.price) {
                best = Some(PricePoint { price: bar.low, date: bar.date });
            }
        }

        best.ok_or(Rule1Error::NoLowDataInWindow { high_date })
    }

    /// The half-retrace arithmetic. Requires `recent_high > recent_low > 0`.
    pub fn compute_retrace(recent_high: f64, recent_low: f64) -> Result<RetraceResult> {
        let in_range = recent_high.is_finite()
            && recent_low.is_finite()
            && recent_high > recent_low
            && recent_low > 0.0;
        if !in_range {
            return Err(Rule1Error::InvalidRange { high: recent_high, low: recent_low });
        }

        let rise_ratio = recent_high / recent_low;
        let rise_width = recent_high - recent_low;
        let half_width = (rise_width / 2.0).floor();
        let retrace_price = (recent_high - half_width).floor();

        Ok(RetraceResult {
            recent_high,
            high_date: None,
            recent_low,
            low_date: None,
            rise_ratio,
            rise_width,
            half_width: half_width as i64,
            retrace_price: retrace_price as i64,
        })
    }

    /// Runs the whole pipeline over one series.
    ///
    /// Only `InsufficientData` is returned as an error. A missing low or an
    /// unusable high/low pair is reported inside the [`Analysis`] instead.
    pub fn analyze(&self, series: &PriceSeries) -> Result<Analysis> {
        let high = self.compute_high(series)?;
        debug!("{}: high {} on {}", series.symbol, high.price, high.date);

        let (low, retrace) = match self.compute_low(series, high.date) {
            Ok(low) => {
                debug!("{}: low {} on {}", series.symbol, low.price, low.date);
                let retrace = match Self::compute_retrace(high.price, low.price) {
                    Ok(result) => RetraceOutcome::Computed(result.with_dates(high.date, low.date)),
                    Err(Rule1Error::InvalidRange { high, low }) => {
                        RetraceOutcome::InvalidRange { high, low }
                    }
                    Err(e) => return Err(e),
                };
                (LowOutcome::Found(low), retrace)
            }
            Err(Rule1Error::NoLowDataInWindow { high_date }) => (
                LowOutcome::NoDataInWindow {
                    window_start: self.low_window_start(high_date),
                    window_end: high_date,
                },
                RetraceOutcome::Skipped,
            ),
            Err(e) => return Err(e),
        };

        Ok(Analysis { high, low, retrace })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::ErrorKind;
    use crate::models::DailyBar;

    fn d(month: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, month, day).unwrap()
    }

    fn bar(date: NaiveDate, high: f64, low: f64) -> DailyBar {
        DailyBar::new(date, low, high, low, low, 100)
    }

    fn series(bars: Vec<DailyBar>) -> PriceSeries {
        PriceSeries::new("7203.T", None, bars)
    }

    #[test]
    fn high_comes_from_last_five_bars_only() {
        let calc = HighLowRetraceCalculator::new();
        let s = series(vec![
            bar(d(5, 1), 999.0, 900.0),
            bar(d(5, 2), 110.0, 100.0),
            bar(d(5, 5), 120.0, 101.0),
            bar(d(5, 6), 130.0, 102.0),
            bar(d(5, 7), 125.0, 103.0),
            bar(d(5, 8), 115.0, 104.0),
        ]);
        let high = calc.compute_high(&s).unwrap();
        assert_eq!(high.price, 130.0);
        assert_eq!(high.date, d(5, 6));
    }

    #[test]
    fn high_tie_picks_earliest_date() {
        let calc = HighLowRetraceCalculator::new();
        let s = series(vec![
            bar(d(5, 8), 130.0, 100.0),
            bar(d(5, 6), 130.0, 100.0),
            bar(d(5, 7), 120.0, 100.0),
        ]);
        assert_eq!(calc.compute_high(&s).unwrap().date, d(5, 6));
    }

    #[test]
    fn high_on_short_series_uses_all_bars() {
        let calc = HighLowRetraceCalculator::new();
        let s = series(vec![bar(d(5, 1), 140.0, 100.0), bar(d(5, 2), 120.0, 100.0)]);
        let high = calc.compute_high(&s).unwrap();
        assert_eq!(high.price, 140.0);
        assert_eq!(high.date, d(5, 1));
    }

    #[test]
    fn high_on_empty_series_is_insufficient_data() {
        let calc = HighLowRetraceCalculator::new();
        let err = calc.compute_high(&series(vec![])).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InsufficientData);
    }

    #[test]
    fn low_window_is_inclusive_on_both_ends() {
        let calc = HighLowRetraceCalculator::new();
        let high_date = d(5, 20);
        let s = series(vec![
            bar(d(5, 5), 100.0, 10.0),  // 15 days before: out
            bar(d(5, 6), 100.0, 50.0),  // exactly 14 days before: in
            bar(d(5, 12), 100.0, 60.0),
            bar(high_date, 120.0, 70.0),
            bar(d(5, 21), 100.0, 5.0),  // after the high: out
        ]);
        let low = calc.compute_low(&s, high_date).unwrap();
        assert_eq!(low.price, 50.0);
        assert_eq!(low.date, d(5, 6));
    }

    #[test]
    fn low_never_leaves_the_window() {
        let calc = HighLowRetraceCalculator::new();
        let high_date = d(6, 16);
        let bars: Vec<_> = (1..=30)
            .map(|day| bar(d(6, day), 200.0, (day as f64 - 15.0).abs() + 1.0))
            .collect();
        let s = series(bars);
        let low = calc.compute_low(&s, high_date).unwrap();
        assert!(low.date <= high_date);
        assert!(low.date >= calc.low_window_start(high_date));
        assert_eq!(low.date, d(6, 15));
    }

    #[test]
    fn low_tie_picks_earliest_date() {
        let calc = HighLowRetraceCalculator::new();
        let s = series(vec![
            bar(d(5, 12), 100.0, 80.0),
            bar(d(5, 9), 100.0, 80.0),
            bar(d(5, 14), 100.0, 90.0),
        ]);
        assert_eq!(calc.compute_low(&s, d(5, 14)).unwrap().date, d(5, 9));
    }

    #[test]
    fn low_without_bars_in_window_is_distinct_condition() {
        let calc = HighLowRetraceCalculator::new();
        let s = series(vec![bar(d(4, 1), 100.0, 90.0)]);
        let err = calc.compute_low(&s, d(5, 20)).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NoLowDataInWindow);
    }

    #[test]
    fn retrace_even_width() {
        let r = HighLowRetraceCalculator::compute_retrace(103.0, 100.0).unwrap();
        assert_eq!(r.rise_ratio, 1.03);
        assert_eq!(r.rise_width, 3.0);
        assert_eq!(r.half_width, 1);
        assert_eq!(r.retrace_price, 102);
    }

    #[test]
    fn retrace_odd_width() {
        let r = HighLowRetraceCalculator::compute_retrace(110.0, 101.0).unwrap();
        assert_eq!(r.rise_width, 9.0);
        assert_eq!(r.half_width, 4);
        assert_eq!(r.retrace_price, 106);
    }

    #[test]
    fn retrace_floors_fractional_prices() {
        // width 3.5 -> half 1 -> floor(2510.5 - 1) = 2509
        let r = HighLowRetraceCalculator::compute_retrace(2510.5, 2507.0).unwrap();
        assert_eq!(r.half_width, 1);
        assert_eq!(r.retrace_price, 2509);
    }

    #[test]
    fn retrace_rejects_invalid_ranges() {
        let cases = [(100.0, 100.0), (100.0, 0.0), (90.0, 100.0), (100.0, -1.0), (f64::NAN, 1.0)];
        for (high, low) in cases {
            let err = HighLowRetraceCalculator::compute_retrace(high, low).unwrap_err();
            assert_eq!(err.kind(), ErrorKind::InvalidRange, "high={} low={}", high, low);
        }
    }

    #[test]
    fn retrace_is_idempotent() {
        let a = HighLowRetraceCalculator::compute_retrace(2875.5, 2601.0).unwrap();
        let b = HighLowRetraceCalculator::compute_retrace(2875.5, 2601.0).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn analyze_fills_dates_on_result() {
        let calc = HighLowRetraceCalculator::new();
        let s = series(vec![
            bar(d(5, 12), 105.0, 100.0),
            bar(d(5, 13), 108.0, 102.0),
            bar(d(5, 14), 110.0, 104.0),
            bar(d(5, 15), 109.0, 101.0),
        ]);
        let analysis = calc.analyze(&s).unwrap();
        assert_eq!(analysis.high, PricePoint { price: 110.0, date: d(5, 14) });
        assert_eq!(analysis.low_point(), Some(PricePoint { price: 100.0, date: d(5, 12) }));

        let result = analysis.retrace_result().unwrap();
        assert_eq!(result.high_date, Some(d(5, 14)));
        assert_eq!(result.low_date, Some(d(5, 12)));
        assert_eq!(result.half_width, 5);
        assert_eq!(result.retrace_price, 105);
    }

    #[test]
    fn analyze_flat_series_reports_invalid_range() {
        let calc = HighLowRetraceCalculator::new();
        let s = series(vec![bar(d(5, 12), 100.0, 100.0), bar(d(5, 13), 100.0, 100.0)]);
        let analysis = calc.analyze(&s).unwrap();
        assert_eq!(analysis.retrace, RetraceOutcome::InvalidRange { high: 100.0, low: 100.0 });
    }

    #[test]
    fn analyze_empty_series_fails() {
        let calc = HighLowRetraceCalculator::new();
        let err = calc.analyze(&series(vec![])).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InsufficientData);
    }

    #[test]
    fn analyze_with_empty_low_window_skips_retrace() {
        let calc = HighLowRetraceCalculator { high_lookback_bars: 5, low_window_days: -1 };
        let s = series(vec![bar(d(5, 12), 105.0, 100.0)]);
        let analysis = calc.analyze(&s).unwrap();
        assert!(matches!(analysis.low, LowOutcome::NoDataInWindow { .. }));
        assert_eq!(analysis.retrace, RetraceOutcome::Skipped);
    }
}
