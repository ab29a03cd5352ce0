use anyhow::Result;
use log::{error, info};
use polars::prelude::*;
use std::path::Path;
use std::time::Instant;

use crate::cli::TallyArgs;
use crate::common::{format_elapsed, setup_logging, TallyStats};
use crate::extract::{citation_tally, publication_tally};
use crate::load::load_documents;
use crate::report::write_parquet;

fn configure_thread_pool(threads: usize) {
    let num_threads = if threads == 0 {
        let cores = num_cpus::get();
        info!("Auto-detected {} CPU cores. Using {} threads.", cores, cores);
        cores
    } else {
        info!("Using specified {} threads.", threads);
        threads
    };

    if let Err(e) = rayon::ThreadPoolBuilder::new()
        .num_threads(num_threads)
        .build_global()
    {
        error!("Failed to build thread pool: {}. Using default.", e);
    }
}

/// Run the tally command with the given arguments
pub fn run_tally(args: TallyArgs) -> Result<TallyStats> {
    let start_time = Instant::now();

    setup_logging(&args.log_level)?;

    info!("Starting citation and publication tally");
    info!("Documents: {}", args.documents);
    info!("Citation output: {}", args.citation_output);
    info!("Publication output: {}", args.publication_output);

    configure_thread_pool(args.threads);

    if !Path::new(&args.documents).exists() {
        return Err(anyhow::anyhow!(
            "Documents file does not exist: {}",
            args.documents
        ));
    }

    let load = load_documents(&args.documents)?;
    let documents = load.documents;

    let reference_pairs: usize = documents.iter().map(|d| d.references.len()).sum();

    info!("Building citation tally...");
    let mut citation = citation_tally(&documents)?;
    let retained: usize = citation
        .column("tally_count")?
        .u32()?
        .sum()
        .unwrap_or(0) as usize;

    info!("Building publication tally...");
    let mut publication = publication_tally(&documents)?;

    write_parquet(&mut citation, &args.citation_output)?;
    write_parquet(&mut publication, &args.publication_output)?;

    let stats = TallyStats {
        lines_read: load.lines_read,
        lines_failed: load.lines_failed,
        journal_documents: documents.len(),
        reference_pairs,
        pairs_discarded: reference_pairs - retained,
        distinct_sources: citation.height(),
        distinct_venues: publication.height(),
    };

    let total_time = start_time.elapsed();

    info!("==================== FINAL SUMMARY ====================");
    info!("Total execution time: {}", format_elapsed(total_time));
    info!("Lines read: {}", stats.lines_read);
    info!("Lines failed to parse: {}", stats.lines_failed);
    info!("Journal documents: {}", stats.journal_documents);
    info!("Reference pairs seen: {}", stats.reference_pairs);
    info!("Reference pairs discarded: {}", stats.pairs_discarded);
    info!("Distinct cited sources: {}", stats.distinct_sources);
    info!("Distinct publication venues: {}", stats.distinct_venues);
    info!("Citation tally: {}", args.citation_output);
    info!("Publication tally: {}", args.publication_output);
    info!("========================================================");

    Ok(stats)
}
