pub mod bar;
pub mod retrace;

pub use bar::{DailyBar, PriceSeries};
pub use retrace::{Analysis, LowOutcome, PricePoint, RetraceOutcome, RetraceResult};
