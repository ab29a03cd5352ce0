use std::io::BufRead;

use anyhow::{Context, Result};
use log::info;
use polars::prelude::*;
use serde::Deserialize;

use super::open_lines;
use crate::normalize::{normalize_issn, normalized_title_expr};

/// Aggregation type tag selecting registry rows; the registry export carries
/// it lower-cased, unlike the document store.
pub const SERIAL_AGGREGATION_TYPE: &str = "journal";

#[derive(Debug, Deserialize)]
struct SerialRecord {
    source_id: i64,
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    issn: Option<String>,
    #[serde(default)]
    eissn: Option<String>,
    #[serde(default)]
    open_access: Option<bool>,
    #[serde(default)]
    aggregation_type: Option<String>,
}

/// Load the serials registry from a JSONL export (optionally gzipped).
///
/// Produces columns `serial_id`, `serial_title`, `normalized_title`, `issn`,
/// `eissn`, `open_access`. Identifiers are canonicalized; titles are never
/// deduplicated, ambiguous titles stay ambiguous.
pub fn load_serials(path: &str) -> Result<DataFrame> {
    info!("Loading serials registry from: {}", path);

    let reader = open_lines(path)?;

    let mut serial_ids: Vec<i64> = Vec::new();
    let mut serial_titles: Vec<Option<String>> = Vec::new();
    let mut issns: Vec<Option<String>> = Vec::new();
    let mut eissns: Vec<Option<String>> = Vec::new();
    let mut open_access: Vec<Option<bool>> = Vec::new();

    let mut lines_read = 0;
    let mut lines_failed = 0;
    let mut skipped_type = 0;

    for line_result in reader.lines() {
        let line = line_result.context("Failed to read line")?;
        if line.trim().is_empty() {
            continue;
        }
        lines_read += 1;

        let record: SerialRecord = match serde_json::from_str(&line) {
            Ok(record) => record,
            Err(_) => {
                lines_failed += 1;
                continue;
            }
        };

        if record.aggregation_type.as_deref() != Some(SERIAL_AGGREGATION_TYPE) {
            skipped_type += 1;
            continue;
        }

        serial_ids.push(record.source_id);
        serial_titles.push(record.title);
        issns.push(normalize_issn(record.issn.as_deref()));
        eissns.push(normalize_issn(record.eissn.as_deref()));
        open_access.push(record.open_access);
    }

    info!(
        "Loaded {} serials from {} lines ({} skipped by aggregation type, {} failed to parse)",
        serial_ids.len(),
        lines_read,
        skipped_type,
        lines_failed
    );

    let df = DataFrame::new(vec![
        Column::new("serial_id".into(), serial_ids),
        Column::new("serial_title".into(), serial_titles),
        Column::new("issn".into(), issns),
        Column::new("eissn".into(), eissns),
        Column::new("open_access".into(), open_access),
    ])?;

    df.lazy()
        .with_columns([normalized_title_expr(col("serial_title")).alias("normalized_title")])
        .collect()
        .context("Failed to normalize serial titles")
}
