use crate::errors::Result;
use crate::models::PriceSeries;
use crate::ticker::Ticker;
use async_trait::async_trait;

/// Base trait for daily price sources
///
/// Every failure (network, unknown ticker, malformed payload, missing file)
/// must surface as `Rule1Error::DataUnavailable`.
#[async_trait]
pub trait PriceSource {
    /// Short name used in logs
    fn source_name(&self) -> &'static str;

    /// Fetch the recent daily bars for a ticker
    async fn fetch(&self, ticker: &Ticker) -> Result<PriceSeries>;
}
