use anyhow::{Context, Result};
use log::info;
use polars::prelude::*;
use std::path::PathBuf;

use crate::normalize::{normalize_issn, normalize_title};

const REQUIRED_COLUMNS: [&str; 3] = ["title", "issn", "eissn"];

/// Sanitize an export header: trim, lower-case, runs of spaces/hyphens become
/// a single underscore, then fold the common identifier aliases.
fn sanitize_header(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    let mut last_was_separator = false;

    for c in name.trim().chars() {
        if c == ' ' || c == '-' {
            if !last_was_separator {
                out.push('_');
                last_was_separator = true;
            }
        } else {
            out.push(c.to_ascii_lowercase());
            last_was_separator = false;
        }
    }

    match out.as_str() {
        "print_issn" => "issn".to_string(),
        "e_issn" => "eissn".to_string(),
        _ => out,
    }
}

/// Load subscription holdings from a CSV export.
///
/// All columns are read as strings; headers are sanitized before use. Exact
/// duplicate rows are dropped from this table only, before projection, so
/// rows that differ in any export column (year ranges, package names) are
/// kept and fan out during matching.
///
/// Produces columns `subscription_title`, `normalized_subscription_title`,
/// `subscription_issn`, `subscription_eissn`.
pub fn load_subscriptions(path: &str) -> Result<DataFrame> {
    info!("Loading subscription holdings from: {}", path);

    let mut raw = CsvReadOptions::default()
        .with_has_header(true)
        .with_infer_schema_length(Some(0))
        .try_into_reader_with_file_path(Some(PathBuf::from(path)))
        .with_context(|| format!("Failed to open subscription file: {}", path))?
        .finish()
        .with_context(|| format!("Failed to read subscription file: {}", path))?;

    let sanitized: Vec<String> = raw
        .get_column_names()
        .iter()
        .map(|name| sanitize_header(name))
        .collect();
    raw.set_column_names(sanitized.clone())
        .context("Failed to rename subscription columns")?;

    for required in REQUIRED_COLUMNS {
        if !sanitized.iter().any(|name| name.as_str() == required) {
            anyhow::bail!(
                "Subscription file {} is missing required column '{}' (found: {:?})",
                path,
                required,
                sanitized
            );
        }
    }

    let rows_read = raw.height();
    let deduped = raw
        .lazy()
        .unique(None, UniqueKeepStrategy::First)
        .collect()
        .context("Failed to drop duplicate subscription rows")?;
    let duplicates_dropped = rows_read - deduped.height();

    let distinct_tuples = deduped
        .clone()
        .lazy()
        .select([col("title"), col("issn"), col("eissn")])
        .unique(None, UniqueKeepStrategy::First)
        .collect()?
        .height();

    info!(
        "Loaded {} holdings from {} rows ({} exact duplicates dropped, {} distinct title/issn/eissn tuples)",
        deduped.height(),
        rows_read,
        duplicates_dropped,
        distinct_tuples
    );

    let titles = deduped.column("title")?.str()?;
    let issns = deduped.column("issn")?.str()?;
    let eissns = deduped.column("eissn")?.str()?;

    let mut subscription_titles: Vec<Option<String>> = Vec::with_capacity(deduped.height());
    let mut normalized_titles: Vec<Option<String>> = Vec::with_capacity(deduped.height());
    let mut subscription_issns: Vec<Option<String>> = Vec::with_capacity(deduped.height());
    let mut subscription_eissns: Vec<Option<String>> = Vec::with_capacity(deduped.height());

    for i in 0..deduped.height() {
        let title = titles.get(i);
        subscription_titles.push(title.map(String::from));
        normalized_titles.push(normalize_title(title));
        subscription_issns.push(normalize_issn(issns.get(i)));
        subscription_eissns.push(normalize_issn(eissns.get(i)));
    }

    DataFrame::new(vec![
        Column::new("subscription_title".into(), subscription_titles),
        Column::new("normalized_subscription_title".into(), normalized_titles),
        Column::new("subscription_issn".into(), subscription_issns),
        Column::new("subscription_eissn".into(), subscription_eissns),
    ])
    .context("Failed to build subscription table")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn write_csv(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, "{}", content).unwrap();
        file.flush().unwrap();
        file
    }

    #[test]
    fn test_sanitize_header() {
        assert_eq!(sanitize_header("Title"), "title");
        assert_eq!(sanitize_header("Print ISSN"), "issn");
        assert_eq!(sanitize_header("E-ISSN"), "eissn");
        assert_eq!(sanitize_header("Coverage  Start - Year"), "coverage_start_year");
    }

    #[test]
    fn test_load_subscriptions_sanitizes_and_canonicalizes() {
        let file = write_csv(
            "Title,Print ISSN,E-ISSN\n\
             annals of applied probability,10505164,2168-873x\n",
        );

        let df = load_subscriptions(file.path().to_str().unwrap()).unwrap();
        assert_eq!(df.height(), 1);

        let issn = df.column("subscription_issn").unwrap().str().unwrap();
        assert_eq!(issn.get(0), Some("1050-5164"));
        let eissn = df.column("subscription_eissn").unwrap().str().unwrap();
        assert_eq!(eissn.get(0), Some("2168-873X"));
    }

    #[test]
    fn test_exact_duplicate_rows_are_dropped() {
        let file = write_csv(
            "Title,ISSN,EISSN,Coverage\n\
             Health,0000-0019,,1990-2000\n\
             Health,0000-0019,,1990-2000\n\
             Health,0000-0019,,2001-2010\n",
        );

        let df = load_subscriptions(file.path().to_str().unwrap()).unwrap();
        // The exact duplicate goes; the year-range variant stays and will fan out
        assert_eq!(df.height(), 2);
    }

    #[test]
    fn test_unique_tuples_survive_dedup() {
        let file = write_csv(
            "Title,ISSN,EISSN\n\
             Health,0000-0019,\n\
             Nature,0028-0836,1476-4687\n\
             Nature,0028-0836,1476-4687\n",
        );

        let df = load_subscriptions(file.path().to_str().unwrap()).unwrap();
        assert_eq!(df.height(), 2);

        let titles = df.column("subscription_title").unwrap().str().unwrap();
        let mut seen: Vec<&str> = titles.into_iter().flatten().collect();
        seen.sort_unstable();
        assert_eq!(seen, vec!["Health", "Nature"]);
    }

    #[test]
    fn test_missing_required_column_fails_with_context() {
        let file = write_csv("Journal Name,ISSN,EISSN\nHealth,0000-0019,\n");

        let err = load_subscriptions(file.path().to_str().unwrap()).unwrap_err();
        assert!(err.to_string().contains("missing required column 'title'"));
    }

    #[test]
    fn test_invalid_identifiers_become_missing() {
        let file = write_csv("Title,ISSN,EISSN\nHealth,not-an-issn,\n");

        let df = load_subscriptions(file.path().to_str().unwrap()).unwrap();
        let issn = df.column("subscription_issn").unwrap().str().unwrap();
        assert_eq!(issn.get(0), None);
        let eissn = df.column("subscription_eissn").unwrap().str().unwrap();
        assert_eq!(eissn.get(0), None);
    }
}
