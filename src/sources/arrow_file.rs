use crate::errors::{Result, Rule1Error};
use crate::models::PriceSeries;
use crate::sources::base::PriceSource;
use crate::ticker::Ticker;
use crate::util::arrow_utils;
use async_trait::async_trait;
use log::info;
use std::path::{Path, PathBuf};

/// Offline source reading series snapshots written with [`save_series_snapshot`].
pub struct ArrowFileSource {
    data_dir: PathBuf,
}

impl ArrowFileSource {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
        }
    }

    pub fn snapshot_path(&self, symbol: &str) -> PathBuf {
        snapshot_path(&self.data_dir, symbol)
    }
}

/// `{data_dir}/{symbol}.arrow`
pub fn snapshot_path(data_dir: &Path, symbol: &str) -> PathBuf {
    data_dir.join(format!("{}.arrow", symbol))
}

/// Writes `series` to its snapshot file under `data_dir`, returning the path.
pub fn save_series_snapshot(data_dir: &Path, series: &PriceSeries) -> Result<PathBuf> {
    let path = snapshot_path(data_dir, &series.symbol);
    arrow_utils::save_series_to_arrow(series, &path)?;
    Ok(path)
}

#[async_trait]
impl PriceSource for ArrowFileSource {
    fn source_name(&self) -> &'static str {
        "arrow-file"
    }

    async fn fetch(&self, ticker: &Ticker) -> Result<PriceSeries> {
        let path = self.snapshot_path(&ticker.symbol);
        if !path.exists() {
            return Err(Rule1Error::data_unavailable(
                &ticker.symbol,
                format!("no snapshot at {}", path.display()),
            ));
        }

        info!("Loading {} from {}", ticker.symbol, path.display());
        arrow_utils::read_series_from_arrow(&path, &ticker.symbol)
            .map_err(|e| Rule1Error::data_unavailable(&ticker.symbol, e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::ErrorKind;
    use crate::models::DailyBar;
    use chrono::NaiveDate;

    #[tokio::test]
    async fn saved_snapshot_is_fetchable() {
        let dir = tempfile::tempdir().unwrap();
        let ticker = Ticker::parse("7203", ".T").unwrap();
        let date = NaiveDate::from_ymd_opt(2025, 5, 12).unwrap();
        let series = PriceSeries::new(
            &ticker.symbol,
            None,
            vec![DailyBar::new(date, 10.0, 12.0, 9.0, 11.0, 5)],
        );

        let path = save_series_snapshot(dir.path(), &series).unwrap();
        assert!(path.ends_with("7203.T.arrow"));

        let source = ArrowFileSource::new(dir.path());
        assert_eq!(source.fetch(&ticker).await.unwrap(), series);
    }

    #[tokio::test]
    async fn missing_snapshot_is_data_unavailable() {
        let dir = tempfile::tempdir().unwrap();
        let source = ArrowFileSource::new(dir.path());
        let ticker = Ticker::parse("6758", ".T").unwrap();
        let err = source.fetch(&ticker).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::DataUnavailable);
    }

    #[tokio::test]
    async fn corrupt_snapshot_is_data_unavailable() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("6758.T.arrow"), b"not arrow").unwrap();
        let source = ArrowFileSource::new(dir.path());
        let ticker = Ticker::parse("6758", ".T").unwrap();
        let err = source.fetch(&ticker).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::DataUnavailable);
    }
}
