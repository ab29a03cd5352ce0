use std::io::BufRead;

use anyhow::{Context, Result};
use log::info;
use rayon::prelude::*;
use serde_json::Value;

use super::open_lines;
use crate::common::{create_spinner, Document, ReferencePair};

/// Aggregation type tag selecting documents for the pipeline. The document
/// store capitalizes this tag; the serials registry does not.
pub const JOURNAL_DOCUMENT_TYPE: &str = "Journal";

/// Result of loading a document export
#[derive(Debug)]
pub struct DocumentLoad {
    pub documents: Vec<Document>,
    pub lines_read: usize,
    pub lines_failed: usize,
}

enum ParsedLine {
    Journal(Document),
    OtherType,
    Invalid,
}

/// Combine two title sequences position-wise into reference pairs.
///
/// Truncates to the shorter sequence: surplus entries on the longer side are
/// dropped. Scalar inputs arrive here as one-element sequences, so a pair of
/// scalars yields a single pair.
pub fn zip_pairs(
    source_titles: Vec<Option<String>>,
    titles: Vec<Option<String>>,
) -> Vec<ReferencePair> {
    source_titles
        .into_iter()
        .zip(titles)
        .map(|(source_title, title)| ReferencePair {
            source_title,
            title,
        })
        .collect()
}

fn string_seq(value: Option<&Value>) -> Vec<Option<String>> {
    match value {
        Some(Value::Array(items)) => items
            .iter()
            .map(|item| item.as_str().map(String::from))
            .collect(),
        Some(Value::String(s)) => vec![Some(s.clone())],
        _ => Vec::new(),
    }
}

fn parse_document_line(line: &str) -> ParsedLine {
    let value: Value = match serde_json::from_str(line) {
        Ok(value) => value,
        Err(_) => return ParsedLine::Invalid,
    };

    let doc_type = value
        .get("aggregation_type")
        .and_then(|v| v.as_str())
        .unwrap_or("");
    if doc_type != JOURNAL_DOCUMENT_TYPE {
        return ParsedLine::OtherType;
    }

    let venue_id = value.get("venue_id").and_then(|v| v.as_i64());
    let venue_title = value
        .get("venue_title")
        .and_then(|v| v.as_str())
        .map(String::from);
    let references = zip_pairs(
        string_seq(value.get("ref_source_titles")),
        string_seq(value.get("ref_titles")),
    );

    ParsedLine::Journal(Document {
        venue_id,
        venue_title,
        references,
    })
}

/// Load journal documents from a JSONL export (optionally gzipped).
///
/// Documents of any other aggregation type are skipped entirely; unparseable
/// lines are counted, never fatal.
pub fn load_documents(path: &str) -> Result<DocumentLoad> {
    info!("Loading document records from: {}", path);

    let reader = open_lines(path)?;
    let spinner = create_spinner("Reading document records...");

    let mut lines = Vec::new();
    for line_result in reader.lines() {
        let line = line_result.context("Failed to read line")?;
        if line.trim().is_empty() {
            continue;
        }
        lines.push(line);
        if lines.len() % 100_000 == 0 {
            spinner.set_message(format!("Reading document records... {} lines", lines.len()));
        }
    }

    let parsed: Vec<ParsedLine> = lines
        .par_iter()
        .map(|line| parse_document_line(line))
        .collect();

    spinner.finish_with_message(format!("Read {} document lines", lines.len()));

    let mut documents = Vec::new();
    let mut lines_failed = 0;
    for item in parsed {
        match item {
            ParsedLine::Journal(doc) => documents.push(doc),
            ParsedLine::OtherType => {}
            ParsedLine::Invalid => lines_failed += 1,
        }
    }

    info!(
        "Loaded {} journal documents from {} lines ({} failed to parse)",
        documents.len(),
        lines.len(),
        lines_failed
    );

    Ok(DocumentLoad {
        documents,
        lines_read: lines.len(),
        lines_failed,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn write_jsonl(lines: &[&str]) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        for line in lines {
            writeln!(file, "{}", line).unwrap();
        }
        file.flush().unwrap();
        file
    }

    #[test]
    fn test_zip_pairs_truncates_to_shorter() {
        let pairs = zip_pairs(
            vec![Some("A".to_string()), Some("B".to_string()), Some("C".to_string())],
            vec![Some("x".to_string()), Some("y".to_string())],
        );
        assert_eq!(pairs.len(), 2);
        assert_eq!(pairs[0].source_title.as_deref(), Some("A"));
        assert_eq!(pairs[1].title.as_deref(), Some("y"));
    }

    #[test]
    fn test_zip_pairs_keeps_missing_entries() {
        let pairs = zip_pairs(vec![None, Some("B".to_string())], vec![Some("x".to_string()), None]);
        assert_eq!(pairs.len(), 2);
        assert_eq!(pairs[0].source_title, None);
        assert_eq!(pairs[1].title, None);
    }

    #[test]
    fn test_scalar_reference_fields_become_single_pair() {
        let file = write_jsonl(&[
            r#"{"aggregation_type": "Journal", "venue_title": "Health", "ref_source_titles": "Nature", "ref_titles": "Some cited work"}"#,
        ]);

        let load = load_documents(file.path().to_str().unwrap()).unwrap();
        assert_eq!(load.documents.len(), 1);
        assert_eq!(load.documents[0].references.len(), 1);
        assert_eq!(
            load.documents[0].references[0].source_title.as_deref(),
            Some("Nature")
        );
    }

    #[test]
    fn test_non_journal_documents_are_excluded() {
        let file = write_jsonl(&[
            r#"{"aggregation_type": "Journal", "venue_title": "Health", "ref_source_titles": [], "ref_titles": []}"#,
            r#"{"aggregation_type": "Conference Proceeding", "venue_title": "Some Conference", "ref_source_titles": ["Nature"], "ref_titles": ["A paper"]}"#,
            r#"{"aggregation_type": "Book Series", "venue_title": "A Series"}"#,
        ]);

        let load = load_documents(file.path().to_str().unwrap()).unwrap();
        assert_eq!(load.lines_read, 3);
        assert_eq!(load.documents.len(), 1);
        assert_eq!(load.documents[0].venue_title.as_deref(), Some("Health"));
    }

    #[test]
    fn test_invalid_lines_are_counted_not_fatal() {
        let file = write_jsonl(&[
            r#"{"aggregation_type": "Journal", "venue_title": "Health"}"#,
            r#"not json at all"#,
        ]);

        let load = load_documents(file.path().to_str().unwrap()).unwrap();
        assert_eq!(load.documents.len(), 1);
        assert_eq!(load.lines_failed, 1);
    }

    #[test]
    fn test_parallel_reference_lists_are_zipped() {
        let file = write_jsonl(&[
            r#"{"aggregation_type": "Journal", "venue_id": 1, "venue_title": "Health", "ref_source_titles": ["Nature", null, "Science"], "ref_titles": ["Paper one", "Paper two", "Paper three"]}"#,
        ]);

        let load = load_documents(file.path().to_str().unwrap()).unwrap();
        let refs = &load.documents[0].references;
        assert_eq!(refs.len(), 3);
        assert_eq!(refs[1].source_title, None);
        assert_eq!(refs[1].title.as_deref(), Some("Paper two"));
    }
}
