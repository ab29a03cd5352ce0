use anyhow::{Context, Result};
use log::info;
use polars::prelude::*;
use std::path::Path;
use std::time::Instant;

use crate::cli::MatchArgs;
use crate::common::{format_elapsed, setup_logging, MatchStats};
use crate::load::{load_serials, load_subscriptions};
use crate::matching::{join_serials, join_subscriptions, unsubscribed_expr};
use crate::report::write_parquet;

/// Run the match command with the given arguments
pub fn run_match(args: MatchArgs) -> Result<MatchStats> {
    let start_time = Instant::now();

    setup_logging(&args.log_level)?;

    info!("Starting serial and subscription matching");
    info!("Tally: {}", args.tally);
    info!("Serials: {}", args.serials);
    info!("Subscriptions: {}", args.subscriptions);
    info!("Output: {}", args.output);

    for input in [&args.tally, &args.serials, &args.subscriptions] {
        if !Path::new(input).exists() {
            return Err(anyhow::anyhow!("Input file does not exist: {}", input));
        }
    }

    let tally = LazyFrame::scan_parquet(&args.tally, Default::default())
        .context("Failed to scan tally Parquet file")?;

    let tally_rows = tally
        .clone()
        .select([col("normalized_title").count().alias("count")])
        .collect()?
        .column("count")?
        .u32()?
        .get(0)
        .unwrap_or(0) as usize;

    info!("Tally rows: {}", tally_rows);

    let serials = load_serials(&args.serials)?;
    let serial_rows = serials.height();

    let subscriptions = load_subscriptions(&args.subscriptions)?;
    let subscription_rows = subscriptions.height();

    info!("Joining tally against serials registry...");
    let stage1 = join_serials(tally, serials.lazy());

    info!("Joining against subscription holdings...");
    let matched = join_subscriptions(stage1, subscriptions.lazy())?;

    let mut result = matched.collect().context("Failed to collect match results")?;

    let matched_rows = result.height();
    let unsubscribed_rows = result
        .clone()
        .lazy()
        .filter(unsubscribed_expr())
        .collect()?
        .height();

    write_parquet(&mut result, &args.output)?;

    let stats = MatchStats {
        tally_rows,
        serial_rows,
        subscription_rows,
        matched_rows,
        unsubscribed_rows,
    };

    let total_time = start_time.elapsed();

    info!("==================== FINAL SUMMARY ====================");
    info!("Total execution time: {}", format_elapsed(total_time));
    info!("Tally rows: {}", stats.tally_rows);
    info!("Serial rows: {}", stats.serial_rows);
    info!("Subscription rows: {}", stats.subscription_rows);
    info!("Match result rows: {}", stats.matched_rows);
    info!("Not subscribed: {}", stats.unsubscribed_rows);
    info!("Output file: {}", args.output);
    info!("========================================================");

    Ok(stats)
}
