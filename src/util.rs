use chrono::{DateTime, Duration, NaiveDate, TimeZone, Utc};
use chrono_tz::Asia::Tokyo;
use crate::errors::{Result, Rule1Error};

// 交易所所在时区的当前日期
pub fn tokyo_today() -> NaiveDate {
    Utc::now().with_timezone(&Tokyo).date_naive()
}

/// `[end - days, end)` as calendar dates.
pub fn lookback_range(end: NaiveDate, days: i64) -> Result<(NaiveDate, NaiveDate)> {
    if days <= 0 {
        return Err(Rule1Error::ConfigError(format!(
            "Lookback must be positive, got {} days",
            days
        )));
    }
    let start = Duration::try_days(days)
        .and_then(|span| end.checked_sub_signed(span))
        .ok_or_else(|| {
            Rule1Error::ConfigError(format!("Lookback of {} days is out of range", days))
        })?;
    Ok((start, end))
}

/// Unix seconds at midnight Tokyo time on `date`.
pub fn tokyo_midnight_timestamp(date: NaiveDate) -> Result<i64> {
    let midnight = date
        .and_hms_opt(0, 0, 0)
        .ok_or_else(|| Rule1Error::ConfigError(format!("Invalid date: {}", date)))?;
    Tokyo
        .from_local_datetime(&midnight)
        .single()
        .map(|dt| dt.timestamp())
        .ok_or_else(|| Rule1Error::ConfigError(format!("Ambiguous local date: {}", date)))
}

/// Exchange-local calendar date for a Unix timestamp and a UTC offset in seconds.
pub fn local_date_from_timestamp(timestamp: i64, gmt_offset: i64) -> Option<NaiveDate> {
    DateTime::<Utc>::from_timestamp(timestamp + gmt_offset, 0).map(|dt| dt.date_naive())
}

// Arrow数据转换工具
pub mod arrow_utils {
    use super::*;
    use crate::models::{DailyBar, PriceSeries};
    use arrow::array::{ArrayRef, StringBuilder};
    use arrow::record_batch::RecordBatch;
    use arrow_array::{Array, Date32Array, Float64Array, StringArray, UInt64Array};
    use arrow_ipc::reader::FileReader;
    use arrow_ipc::writer::FileWriter;
    use arrow_schema::{DataType, Field, Schema};
    use log::info;
    use std::fs::{self, File};
    use std::path::Path;
    use std::sync::Arc;

    fn epoch() -> NaiveDate {
        NaiveDate::from_ymd_opt(1970, 1, 1).unwrap_or_default()
    }

    fn date_to_days(date: NaiveDate) -> i32 {
        (date - epoch()).num_days() as i32
    }

    fn days_to_date(days: i32) -> Result<NaiveDate> {
        epoch()
            .checked_add_signed(Duration::days(days as i64))
            .ok_or_else(|| Rule1Error::ArrowError(format!("Date out of range: {}", days)))
    }

    pub fn series_schema() -> Schema {
        Schema::new(vec![
            Field::new("symbol", DataType::Utf8, false),
            Field::new("name", DataType::Utf8, true),
            Field::new("date", DataType::Date32, false),
            Field::new("open", DataType::Float64, false),
            Field::new("high", DataType::Float64, false),
            Field::new("low", DataType::Float64, false),
            Field::new("close", DataType::Float64, false),
            Field::new("volume", DataType::UInt64, false),
        ])
    }

    // 每根日线一行，symbol/name 按行重复
    pub fn series_to_record_batch(series: &PriceSeries) -> Result<RecordBatch> {
        let bars = series.bars();

        let mut symbol_builder = StringBuilder::new();
        let mut name_builder = StringBuilder::new();
        for _ in bars {
            symbol_builder.append_value(&series.symbol);
            match &series.name {
                Some(name) => name_builder.append_value(name),
                None => name_builder.append_null(),
            }
        }

        let columns: Vec<ArrayRef> = vec![
            Arc::new(symbol_builder.finish()),
            Arc::new(name_builder.finish()),
            Arc::new(Date32Array::from(
                bars.iter().map(|b| date_to_days(b.date)).collect::<Vec<_>>(),
            )),
            Arc::new(Float64Array::from(bars.iter().map(|b| b.open).collect::<Vec<_>>())),
            Arc::new(Float64Array::from(bars.iter().map(|b| b.high).collect::<Vec<_>>())),
            Arc::new(Float64Array::from(bars.iter().map(|b| b.low).collect::<Vec<_>>())),
            Arc::new(Float64Array::from(bars.iter().map(|b| b.close).collect::<Vec<_>>())),
            Arc::new(UInt64Array::from(bars.iter().map(|b| b.volume).collect::<Vec<_>>())),
        ];

        Ok(RecordBatch::try_new(Arc::new(series_schema()), columns)?)
    }

    fn column<'a, T: 'static>(batch: &'a RecordBatch, name: &str) -> Result<&'a T> {
        batch
            .column_by_name(name)
            .and_then(|a| a.as_any().downcast_ref::<T>())
            .ok_or_else(|| Rule1Error::ArrowError(format!("Failed to downcast {} column", name)))
    }

    // 从Arrow文件读取单只股票的日线数据
    pub fn read_series_from_arrow(path: &Path, fallback_symbol: &str) -> Result<PriceSeries> {
        let file = File::open(path)?;
        let reader = FileReader::try_new(file, None)?;

        let mut symbol: Option<String> = None;
        let mut name: Option<String> = None;
        let mut bars = Vec::new();

        for batch in reader {
            let batch = batch?;

            let symbol_array = column::<StringArray>(&batch, "symbol")?;
            let name_array = column::<StringArray>(&batch, "name")?;
            let date_array = column::<Date32Array>(&batch, "date")?;
            let open_array = column::<Float64Array>(&batch, "open")?;
            let high_array = column::<Float64Array>(&batch, "high")?;
            let low_array = column::<Float64Array>(&batch, "low")?;
            let close_array = column::<Float64Array>(&batch, "close")?;
            let volume_array = column::<UInt64Array>(&batch, "volume")?;

            for i in 0..batch.num_rows() {
                if symbol.is_none() {
                    symbol = Some(symbol_array.value(i).to_string());
                }
                if name.is_none() && !name_array.is_null(i) {
                    name = Some(name_array.value(i).to_string());
                }

                bars.push(DailyBar {
                    date: days_to_date(date_array.value(i))?,
                    open: open_array.value(i),
                    high: high_array.value(i),
                    low: low_array.value(i),
                    close: close_array.value(i),
                    volume: volume_array.value(i),
                });
            }
        }

        let symbol = symbol.unwrap_or_else(|| fallback_symbol.to_string());
        Ok(PriceSeries::new(&symbol, name, bars))
    }

    // 将日线数据保存到Arrow文件
    pub fn save_series_to_arrow(series: &PriceSeries, path: &Path) -> Result<()> {
        info!("Saving {} bars of {} to {}", series.len(), series.symbol, path.display());

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                fs::create_dir_all(parent)?;
            }
        }

        let batch = series_to_record_batch(series)?;
        let file = File::create(path)?;

        let mut writer = FileWriter::try_new(file, &batch.schema())?;
        writer.write(&batch)?;
        writer.finish()?;

        Ok(())
    }
}
