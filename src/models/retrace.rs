use chrono::NaiveDate;
use serde::Serialize;

/// A price together with the trading day it was observed on.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PricePoint {
    pub price: f64,
    pub date: NaiveDate,
}

/// Result of the rule-1 half-retrace calculation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RetraceResult {
    pub recent_high: f64,
    pub high_date: Option<NaiveDate>,
    pub recent_low: f64,
    pub low_date: Option<NaiveDate>,
    pub rise_ratio: f64,
    pub rise_width: f64,
    pub half_width: i64,
    pub retrace_price: i64,
}

impl RetraceResult {
    /// Attaches the dates the high and low were observed on.
    pub fn with_dates(mut self, high_date: NaiveDate, low_date: NaiveDate) -> Self {
        self.high_date = Some(high_date);
        self.low_date = Some(low_date);
        self
    }
}

/// What happened to the low step of the pipeline.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum LowOutcome {
    Found(PricePoint),
    NoDataInWindow { window_start: NaiveDate, window_end: NaiveDate },
}

/// What happened to the retrace step of the pipeline.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum RetraceOutcome {
    Computed(RetraceResult),
    InvalidRange { high: f64, low: f64 },
    /// The low step produced nothing to compute from.
    Skipped,
}

/// Full high → low → retrace pipeline output for one series.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Analysis {
    pub high: PricePoint,
    pub low: LowOutcome,
    pub retrace: RetraceOutcome,
}

impl Analysis {
    pub fn low_point(&self) -> Option<PricePoint> {
        match self.low {
            LowOutcome::Found(point) => Some(point),
            LowOutcome::NoDataInWindow { .. } => None,
        }
    }

    pub fn retrace_result(&self) -> Option<&RetraceResult> {
        match &self.retrace {
            RetraceOutcome::Computed(result) => Some(result),
            _ => None,
        }
    }
}
