use anyhow::{Context, Result};
use comfy_table::{modifiers::UTF8_ROUND_CORNERS, presets::UTF8_FULL, Cell, Color, Table};
use log::info;
use polars::prelude::*;
use std::fs::File;

use crate::matching::unsubscribed_expr;

/// Top-N rows by tally count, tie-broken by normalized title ascending so
/// report fixtures are reproducible.
///
/// Operates on any frame carrying the tally columns; match results are first
/// reduced to one row per normalized title so join fan-out does not inflate
/// the ranking.
pub fn top_tallies(frame: LazyFrame, n: usize) -> Result<DataFrame> {
    frame
        .select([col("title"), col("normalized_title"), col("tally_count")])
        .unique(
            Some(vec!["normalized_title".into()]),
            UniqueKeepStrategy::First,
        )
        .sort(
            ["tally_count", "normalized_title"],
            SortMultipleOptions::default().with_order_descending_multi([true, false]),
        )
        .limit(n as IdxSize)
        .collect()
        .context("Failed to build top-N report")
}

/// The cited-but-not-subscribed diff: match rows whose subscription side is
/// entirely null, projected to the serial columns, highest counts first.
pub fn unsubscribed(matches: LazyFrame) -> LazyFrame {
    matches
        .filter(unsubscribed_expr())
        .sort(
            ["tally_count", "normalized_title"],
            SortMultipleOptions::default().with_order_descending_multi([true, false]),
        )
        .select([
            col("serial_id"),
            col("serial_title"),
            col("issn"),
            col("eissn"),
            col("open_access"),
            col("tally_count"),
        ])
}

/// Persist match results to a Parquet file, overwriting any existing output
pub fn write_parquet(df: &mut DataFrame, path: &str) -> Result<()> {
    let file =
        File::create(path).with_context(|| format!("Failed to create output file: {}", path))?;

    ParquetWriter::new(file)
        .with_compression(ParquetCompression::Zstd(None))
        .with_row_group_size(Some(250_000))
        .finish(df)
        .with_context(|| format!("Failed to write Parquet file: {}", path))?;

    info!("Wrote {} rows to {}", df.height(), path);
    Ok(())
}

pub fn render_top_table(df: &DataFrame) -> Result<String> {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_header(vec![
            Cell::new("Title")
                .fg(Color::Cyan)
                .add_attribute(comfy_table::Attribute::Bold),
            Cell::new("Count").fg(Color::Cyan),
        ]);

    let titles = df.column("title")?.str()?;
    let counts = df.column("tally_count")?.u32()?;

    for i in 0..df.height() {
        table.add_row(vec![
            Cell::new(titles.get(i).unwrap_or("")),
            Cell::new(counts.get(i).map(|c| c.to_string()).unwrap_or_default()),
        ]);
    }

    Ok(table.to_string())
}

pub fn render_unsubscribed_table(df: &DataFrame) -> Result<String> {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_header(vec![
            Cell::new("Serial ID")
                .fg(Color::Cyan)
                .add_attribute(comfy_table::Attribute::Bold),
            Cell::new("Title").fg(Color::Cyan),
            Cell::new("ISSN").fg(Color::Cyan),
            Cell::new("eISSN").fg(Color::Cyan),
            Cell::new("Open access").fg(Color::Cyan),
            Cell::new("Count").fg(Color::Cyan),
        ]);

    let serial_ids = df.column("serial_id")?.i64()?;
    let titles = df.column("serial_title")?.str()?;
    let issns = df.column("issn")?.str()?;
    let eissns = df.column("eissn")?.str()?;
    let open_access = df.column("open_access")?.bool()?;
    let counts = df.column("tally_count")?.u32()?;

    for i in 0..df.height() {
        let access = match open_access.get(i) {
            Some(true) => "yes",
            Some(false) => "no",
            None => "unknown",
        };
        table.add_row(vec![
            Cell::new(serial_ids.get(i).map(|v| v.to_string()).unwrap_or_default()),
            Cell::new(titles.get(i).unwrap_or("")),
            Cell::new(issns.get(i).unwrap_or("")),
            Cell::new(eissns.get(i).unwrap_or("")),
            Cell::new(access),
            Cell::new(counts.get(i).map(|c| c.to_string()).unwrap_or_default()),
        ]);
    }

    Ok(table.to_string())
}
