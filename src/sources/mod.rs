pub mod arrow_file;
pub mod base;
pub mod cached;
pub mod yahoo;

pub use arrow_file::{save_series_snapshot, ArrowFileSource};
pub use base::PriceSource;
pub use cached::CachedSource;
pub use yahoo::YahooChartSource;
