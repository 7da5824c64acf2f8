//! Plain-text rendering for the command-line front end.

use std::fmt::Write;

use crate::errors::{ErrorKind, Rule1Error};
use crate::models::{LowOutcome, RetraceOutcome, RetraceResult};
use crate::services::CheckReport;

pub const NOTES: &[&str] = &[
    "Only Tokyo Stock Exchange (.T) listings are supported.",
    "Long market holidays (e.g. Golden Week) are not accounted for.",
];

pub fn render_report(report: &CheckReport) -> String {
    let mut out = String::new();
    let analysis = &report.analysis;

    let _ = writeln!(out, "{} ({}) price check", report.company_name, report.code);
    let _ = writeln!(
        out,
        "  High of the last 5 trading days:   {:.2} JPY ({})",
        analysis.high.price, analysis.high.date
    );
    match &analysis.low {
        LowOutcome::Found(low) => {
            let _ = writeln!(
                out,
                "  Low within 2 weeks of the high:    {:.2} JPY ({})",
                low.price, low.date
            );
        }
        LowOutcome::NoDataInWindow { window_start, window_end } => {
            let _ = writeln!(
                out,
                "  Low within 2 weeks of the high:    no low data between {} and {}",
                window_start, window_end
            );
        }
    }

    let _ = writeln!(out);
    let _ = writeln!(out, "Rule 1: half retrace of the rise");
    out.push_str(&render_retrace(&analysis.retrace));

    if let Some(retrace) = &report.override_retrace {
        let _ = writeln!(out);
        let _ = writeln!(out, "Recomputed with entered values");
        out.push_str(&render_retrace(retrace));
    }

    out
}

pub fn render_retrace(outcome: &RetraceOutcome) -> String {
    match outcome {
        RetraceOutcome::Computed(result) => render_result(result),
        RetraceOutcome::InvalidRange { high, low } => format!(
            "  Enter values with high > low > 0 (got high {:.2}, low {:.2}).\n",
            high, low
        ),
        RetraceOutcome::Skipped => "  Not computed: no low price to compare against.\n".to_string(),
    }
}

pub fn render_result(result: &RetraceResult) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "  Rise ratio:          {:.2} x", result.rise_ratio);
    let _ = writeln!(out, "  Rise width:          {:.2} JPY", result.rise_width);
    let _ = writeln!(out, "  Half of the rise:    {} JPY", result.half_width);
    let _ = writeln!(out, "  Half-retrace price:  {} JPY", result.retrace_price);
    out
}

/// User-facing message for a failed check.
pub fn render_error(err: &Rule1Error) -> String {
    match err.kind() {
        ErrorKind::InsufficientData => {
            "No price data found. Check the securities code.".to_string()
        }
        ErrorKind::DataUnavailable => format!("Error while fetching data: {}", err),
        ErrorKind::InvalidRange => "Enter values with high > low > 0.".to_string(),
        ErrorKind::NoLowDataInWindow => "No low data within the window.".to_string(),
        ErrorKind::Local => err.to_string(),
    }
}

pub fn render_notes() -> String {
    let mut out = String::from("Notes\n");
    for note in NOTES {
        let _ = writeln!(out, "  - {}", note);
    }
    out
}
