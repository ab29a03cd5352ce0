use anyhow::{Context, Result};
use polars::prelude::*;
use rayon::prelude::*;

use crate::common::{Document, RetainedReference};
use crate::normalize::normalize_title;

/// Apply the per-pair filtering policy to a document's references.
///
/// A pair is dropped when both titles are missing, when the normalized source
/// title equals the normalized work title (the reference is not a distinct
/// journal source), or when the normalized source title is missing — the
/// source title is the only field carried forward.
pub fn retained_references(doc: &Document) -> impl Iterator<Item = RetainedReference> + '_ {
    doc.references.iter().filter_map(|pair| {
        let source = normalize_title(pair.source_title.as_deref());
        let work = normalize_title(pair.title.as_deref());

        if source.is_none() && work.is_none() {
            return None;
        }
        if let (Some(source), Some(work)) = (&source, &work) {
            if source == work {
                return None;
            }
        }

        let normalized = source?;
        let source_title = pair.source_title.clone()?;
        Some(RetainedReference {
            source_title,
            normalized,
        })
    })
}

/// Tally retained references across all documents, one row per distinct
/// normalized source title.
pub fn citation_tally(documents: &[Document]) -> Result<DataFrame> {
    let retained: Vec<RetainedReference> = documents
        .par_iter()
        .flat_map_iter(retained_references)
        .collect();

    let mut titles = Vec::with_capacity(retained.len());
    let mut normalized = Vec::with_capacity(retained.len());
    for reference in retained {
        titles.push(reference.source_title);
        normalized.push(reference.normalized);
    }

    tally_frame(titles, normalized)
}

/// Tally publication venues, one row per distinct normalized venue title.
/// Documents without a venue title are skipped.
pub fn publication_tally(documents: &[Document]) -> Result<DataFrame> {
    let mut titles = Vec::new();
    let mut normalized = Vec::new();

    for doc in documents {
        if let Some(norm) = normalize_title(doc.venue_title.as_deref()) {
            if let Some(title) = doc.venue_title.clone() {
                titles.push(title);
                normalized.push(norm);
            }
        }
    }

    tally_frame(titles, normalized)
}

/// Group raw/normalized title rows by the normalized key. The raw title is
/// carried for display only; casing variants collapse into one row.
fn tally_frame(titles: Vec<String>, normalized: Vec<String>) -> Result<DataFrame> {
    let df = DataFrame::new(vec![
        Column::new("title".into(), titles),
        Column::new("normalized_title".into(), normalized),
    ])?;

    df.lazy()
        .group_by_stable([col("normalized_title")])
        .agg([
            col("title").first(),
            col("title").count().alias("tally_count"),
        ])
        .select([col("title"), col("normalized_title"), col("tally_count")])
        .collect()
        .context("Failed to build tally")
}
