use anyhow::{Context, Result};
use flate2::read::GzDecoder;
use std::fs::File;
use std::io::{BufRead, BufReader};

pub mod documents;
pub mod serials;
pub mod subscriptions;

pub use documents::{load_documents, zip_pairs, DocumentLoad, JOURNAL_DOCUMENT_TYPE};
pub use serials::{load_serials, SERIAL_AGGREGATION_TYPE};
pub use subscriptions::load_subscriptions;

/// Open a line-oriented file, transparently gunzipping `.gz` paths
pub(crate) fn open_lines(path: &str) -> Result<Box<dyn BufRead>> {
    let file = File::open(path).with_context(|| format!("Failed to open file: {}", path))?;

    if path.ends_with(".gz") {
        Ok(Box::new(BufReader::new(GzDecoder::new(file))))
    } else {
        Ok(Box::new(BufReader::new(file)))
    }
}
