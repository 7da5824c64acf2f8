// 公开导出的模块，供外部使用
pub mod calculator;
pub mod models;
pub mod errors;
pub mod sources;
pub mod services;
pub mod ticker;

pub mod cache;
pub mod config;
pub mod display;
pub mod util;

// 重新导出常用类型，方便使用
pub use calculator::HighLowRetraceCalculator;
pub use config::Config;
pub use errors::{ErrorKind, Result, Rule1Error};
pub use models::{
    Analysis, DailyBar, LowOutcome, PricePoint, PriceSeries, RetraceOutcome, RetraceResult,
};
pub use services::{CheckReport, CheckService, Overrides};
pub use sources::{ArrowFileSource, CachedSource, PriceSource, YahooChartSource};
pub use ticker::Ticker;
