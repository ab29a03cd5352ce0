use anyhow::{Context, Result};
use log::info;
use polars::prelude::*;
use std::path::Path;
use std::time::Instant;

use crate::cli::ReportArgs;
use crate::common::{format_elapsed, setup_logging, ReportStats};
use crate::report::{render_top_table, render_unsubscribed_table, top_tallies, unsubscribed};

/// Run the report command with the given arguments
pub fn run_report(args: ReportArgs) -> Result<ReportStats> {
    let start_time = Instant::now();

    setup_logging(&args.log_level)?;

    info!("Reporting on match results: {}", args.input);

    if !Path::new(&args.input).exists() {
        return Err(anyhow::anyhow!("Input file does not exist: {}", args.input));
    }

    let matches = LazyFrame::scan_parquet(&args.input, Default::default())
        .context("Failed to scan match results")?;

    let total_rows = matches
        .clone()
        .select([col("normalized_title").count().alias("count")])
        .collect()?
        .column("count")?
        .u32()?
        .get(0)
        .unwrap_or(0) as usize;

    let distinct_titles = matches
        .clone()
        .select([col("normalized_title")])
        .unique(None, UniqueKeepStrategy::First)
        .collect()?
        .height();

    let top = top_tallies(matches.clone(), args.top)?;
    let unsub = unsubscribed(matches.clone()).collect()?;
    let unsubscribed_rows = unsub.height();

    println!("Top cited titles ({}):", args.input);
    println!("{}", render_top_table(&top)?);
    println!("Cited but not subscribed:");
    println!("{}", render_unsubscribed_table(&unsub.head(Some(args.top)))?);

    let stats = ReportStats {
        total_rows,
        distinct_titles,
        unsubscribed_rows,
    };

    let total_time = start_time.elapsed();

    info!("==================== FINAL SUMMARY ====================");
    info!("Total execution time: {}", format_elapsed(total_time));
    info!("Match rows: {}", stats.total_rows);
    info!("Distinct titles: {}", stats.distinct_titles);
    info!("Not subscribed: {}", stats.unsubscribed_rows);
    info!("========================================================");

    Ok(stats)
}
