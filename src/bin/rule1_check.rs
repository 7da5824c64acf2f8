use rule1_check::config::Config;
use rule1_check::display;
use rule1_check::services::{CheckReport, CheckService, Overrides};
use rule1_check::sources::{
    save_series_snapshot, ArrowFileSource, CachedSource, PriceSource, YahooChartSource,
};
use rule1_check::HighLowRetraceCalculator;

use anyhow::Context;
use clap::{App, Arg, ArgMatches, SubCommand};
use log::{error, info};
use std::path::Path;
use std::sync::Arc;

fn build_config(matches: &ArgMatches) -> anyhow::Result<Config> {
    let mut config = Config::new();
    if let Some(days) = matches.value_of("lookback-days") {
        config = config.with_lookback_days(days.parse().context("--lookback-days")?);
    }
    if let Some(url) = matches.value_of("base-url") {
        config = config.with_api_base_url(url);
    }
    if let Some(dir) = matches.value_of("data-dir") {
        config = config.with_data_dir(dir);
    }
    config.validate()?;
    Ok(config)
}

fn build_source(
    config: &Config,
    offline: bool,
) -> anyhow::Result<Arc<dyn PriceSource + Send + Sync>> {
    if offline {
        info!("Offline mode: reading snapshots from {}", config.data_dir);
        return Ok(Arc::new(ArrowFileSource::new(&config.data_dir)));
    }
    let yahoo = YahooChartSource::new(config)?;
    Ok(Arc::new(CachedSource::new(yahoo, config.cache_ttl)))
}

fn parse_price(matches: &ArgMatches, name: &str) -> anyhow::Result<Option<f64>> {
    matches
        .value_of(name)
        .map(|v| v.parse::<f64>().with_context(|| format!("--{} must be a number", name)))
        .transpose()
}

async fn run_check(
    service: &CheckService,
    code: &str,
    snapshot_dir: Option<&Path>,
    overrides: Overrides,
) -> rule1_check::Result<CheckReport> {
    let ticker = service.ticker(code)?;
    let series = service.fetch_series(code).await?;
    if let Some(dir) = snapshot_dir {
        let path = save_series_snapshot(dir, &series)?;
        info!("Saved snapshot to {}", path.display());
    }
    service.check_series(&ticker, &series, overrides)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logger
    env_logger::init();

    let code_arg = Arg::with_name("code")
        .value_name("CODE")
        .help("Securities code, digits only (e.g. 7203)")
        .required(true)
        .multiple_values(true);
    let offline_arg = Arg::with_name("offline")
        .long("offline")
        .help("Read saved Arrow snapshots instead of calling the price API")
        .takes_value(false);

    let app = App::new("rule1_check")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Rule 1 stock check: 5-day high, 2-week low and half-retrace price for TSE listings")
        .arg(
            Arg::with_name("lookback-days")
                .long("lookback-days")
                .value_name("DAYS")
                .help("Calendar days of history to request")
                .takes_value(true)
                .global(true),
        )
        .arg(
            Arg::with_name("base-url")
                .long("base-url")
                .value_name("URL")
                .help("Price API base URL")
                .takes_value(true)
                .global(true),
        )
        .arg(
            Arg::with_name("data-dir")
                .long("data-dir")
                .value_name("DIR")
                .help("Directory for Arrow snapshots")
                .takes_value(true)
                .global(true),
        )
        .subcommand(
            SubCommand::with_name("check")
                .about("Show recent high/low and the half-retrace price")
                .arg(code_arg.clone())
                .arg(
                    Arg::with_name("high")
                        .long("high")
                        .value_name("PRICE")
                        .help("Override the detected high")
                        .takes_value(true),
                )
                .arg(
                    Arg::with_name("low")
                        .long("low")
                        .value_name("PRICE")
                        .help("Override the detected low")
                        .takes_value(true),
                )
                .arg(
                    Arg::with_name("json")
                        .long("json")
                        .help("Print the report as JSON")
                        .takes_value(false),
                )
                .arg(
                    Arg::with_name("save")
                        .long("save")
                        .help("Save fetched bars as an Arrow snapshot")
                        .takes_value(false),
                )
                .arg(offline_arg.clone()),
        )
        .subcommand(
            SubCommand::with_name("calc")
                .about("Half-retrace calculation from entered prices")
                .arg(
                    Arg::with_name("high")
                        .long("high")
                        .value_name("PRICE")
                        .required(true)
                        .takes_value(true),
                )
                .arg(
                    Arg::with_name("low")
                        .long("low")
                        .value_name("PRICE")
                        .required(true)
                        .takes_value(true),
                ),
        )
        .subcommand(
            SubCommand::with_name("bars")
                .about("List the fetched daily bars")
                .arg(code_arg)
                .arg(
                    Arg::with_name("limit")
                        .short('l')
                        .long("limit")
                        .value_name("LIMIT")
                        .help("Limit the number of records to display")
                        .takes_value(true)
                        .default_value("10"),
                )
                .arg(offline_arg),
        );

    let matches = app.get_matches();

    if let Some(matches) = matches.subcommand_matches("check") {
        let config = build_config(matches)?;
        let source = build_source(&config, matches.is_present("offline"))?;
        let data_dir = config.data_dir.clone();
        let service = CheckService::new(config, source);

        let overrides = Overrides {
            high: parse_price(matches, "high")?,
            low: parse_price(matches, "low")?,
        };
        let as_json = matches.is_present("json");
        let save = matches.is_present("save") && !matches.is_present("offline");

        let mut failed = false;
        for code in matches.values_of("code").into_iter().flatten() {
            let snapshot_dir = save.then(|| Path::new(&data_dir));
            let result = run_check(&service, code, snapshot_dir, overrides).await;

            match result {
                Ok(report) if as_json => println!("{}", serde_json::to_string_pretty(&report)?),
                Ok(report) => println!("{}", display::render_report(&report)),
                Err(e) => {
                    error!("{}: {}", code, e);
                    eprintln!("{}: {}", code, display::render_error(&e));
                    failed = true;
                }
            }
        }

        if !as_json {
            println!("{}", display::render_notes());
        }
        if failed {
            std::process::exit(1);
        }
    } else if let Some(matches) = matches.subcommand_matches("calc") {
        let high = parse_price(matches, "high")?.unwrap_or_default();
        let low = parse_price(matches, "low")?.unwrap_or_default();

        match HighLowRetraceCalculator::compute_retrace(high, low) {
            Ok(result) => println!("{}", display::render_result(&result)),
            Err(e) => {
                eprintln!("{}", display::render_error(&e));
                std::process::exit(1);
            }
        }
    } else if let Some(matches) = matches.subcommand_matches("bars") {
        let config = build_config(matches)?;
        let source = build_source(&config, matches.is_present("offline"))?;
        let service = CheckService::new(config, source);
        let limit = matches
            .value_of("limit")
            .unwrap_or("10")
            .parse::<usize>()
            .unwrap_or(10);

        let mut failed = false;
        for code in matches.values_of("code").into_iter().flatten() {
            let series = match service.fetch_series(code).await {
                Ok(series) => series,
                Err(e) => {
                    error!("{}: {}", code, e);
                    eprintln!("{}: {}", code, display::render_error(&e));
                    failed = true;
                    continue;
                }
            };

            println!("{} ({})", series.name.as_deref().unwrap_or("-"), series.symbol);
            println!("{:-<72}", "");
            println!(
                "{:<12} {:>10} {:>10} {:>10} {:>10} {:>14}",
                "Date", "Open", "High", "Low", "Close", "Volume"
            );
            println!("{:-<72}", "");
            // 最新的在前
            for bar in series.bars().iter().rev().take(limit) {
                println!(
                    "{:<12} {:>10.2} {:>10.2} {:>10.2} {:>10.2} {:>14}",
                    bar.date.to_string(), bar.open, bar.high, bar.low, bar.close, bar.volume
                );
            }
            if series.len() > limit {
                println!("... and {} more records", series.len() - limit);
            } else if series.is_empty() {
                println!("No daily data available for this stock");
            }
        }

        if failed {
            std::process::exit(1);
        }
    } else {
        info!("No command specified. Use --help for usage information.");
    }

    Ok(())
}
