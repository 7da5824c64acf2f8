use crate::calculator::HighLowRetraceCalculator;
use crate::config::Config;
use crate::errors::{Result, Rule1Error};
use crate::models::{Analysis, PriceSeries, RetraceOutcome};
use crate::sources::base::PriceSource;
use crate::ticker::Ticker;
use log::{info, warn};
use serde::Serialize;
use std::sync::Arc;

pub const COMPANY_NAME_NOT_FOUND: &str = "Company name not found";

/// User-entered replacements for the detected high/low.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Overrides {
    pub high: Option<f64>,
    pub low: Option<f64>,
}

impl Overrides {
    pub fn is_empty(&self) -> bool {
        self.high.is_none() && self.low.is_none()
    }
}

/// Everything a front end needs to render one check.
#[derive(Debug, Clone, Serialize)]
pub struct CheckReport {
    pub symbol: String,
    pub code: String,
    pub company_name: String,
    pub bar_count: usize,
    pub analysis: Analysis,
    /// Retrace recomputed from user overrides, when any were given.
    pub override_retrace: Option<RetraceOutcome>,
}

/// 检查服务：获取日线、计算高低点与半值回调
pub struct CheckService {
    config: Config,
    source: Arc<dyn PriceSource + Send + Sync>,
    calculator: HighLowRetraceCalculator,
}

impl CheckService {
    pub fn new(config: Config, source: Arc<dyn PriceSource + Send + Sync>) -> Self {
        Self {
            config,
            source,
            calculator: HighLowRetraceCalculator::default(),
        }
    }

    pub fn with_calculator(mut self, calculator: HighLowRetraceCalculator) -> Self {
        self.calculator = calculator;
        self
    }

    pub fn ticker(&self, code: &str) -> Result<Ticker> {
        Ticker::parse(code, &self.config.exchange_suffix)
    }

    /// Fetches the series for `code` without analysing it.
    pub async fn fetch_series(&self, code: &str) -> Result<PriceSeries> {
        let ticker = self.ticker(code)?;
        info!("Fetching {} via {}", ticker, self.source.source_name());
        self.source.fetch(&ticker).await
    }

    pub async fn check(&self, code: &str, overrides: Overrides) -> Result<CheckReport> {
        let ticker = self.ticker(code)?;
        info!("Checking {} via {}", ticker, self.source.source_name());
        let series = self.source.fetch(&ticker).await?;
        self.check_series(&ticker, &series, overrides)
    }

    /// Runs the analysis on an already fetched series.
    pub fn check_series(
        &self,
        ticker: &Ticker,
        series: &PriceSeries,
        overrides: Overrides,
    ) -> Result<CheckReport> {
        let analysis = self.calculator.analyze(series)?;

        if let RetraceOutcome::InvalidRange { high, low } = analysis.retrace {
            warn!("{}: detected high {} / low {} do not form a rise", ticker, high, low);
        }

        let override_retrace = if overrides.is_empty() {
            None
        } else {
            let high = overrides.high.unwrap_or(analysis.high.price);
            let low = match overrides.low.or(analysis.low_point().map(|p| p.price)) {
                Some(low) => low,
                None => {
                    // 窗口内无低点且用户未输入低点
                    return Ok(self.report(ticker, series, analysis, Some(RetraceOutcome::Skipped)));
                }
            };
            info!("{}: recomputing with high {} / low {}", ticker, high, low);
            Some(match HighLowRetraceCalculator::compute_retrace(high, low) {
                Ok(result) => RetraceOutcome::Computed(result),
                Err(Rule1Error::InvalidRange { high, low }) => {
                    RetraceOutcome::InvalidRange { high, low }
                }
                Err(e) => return Err(e),
            })
        };

        Ok(self.report(ticker, series, analysis, override_retrace))
    }

    fn report(
        &self,
        ticker: &Ticker,
        series: &PriceSeries,
        analysis: Analysis,
        override_retrace: Option<RetraceOutcome>,
    ) -> CheckReport {
        CheckReport {
            symbol: ticker.symbol.clone(),
            code: ticker.code.clone(),
            company_name: series
                .name
                .clone()
                .unwrap_or_else(|| COMPANY_NAME_NOT_FOUND.to_string()),
            bar_count: series.len(),
            analysis,
            override_retrace,
        }
    }
}
