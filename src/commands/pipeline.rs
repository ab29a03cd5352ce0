use anyhow::{Context, Result};
use log::info;
use std::env;
use std::fs;
use std::path::PathBuf;
use std::time::Instant;
use uuid::Uuid;

use crate::cli::{MatchArgs, PipelineArgs, ReportArgs, TallyArgs};
use crate::commands::{match_serials, report, tally};
use crate::common::{format_elapsed, setup_logging, MatchStats, ReportStats, TallyStats};

/// Context for managing pipeline state and temp files
struct PipelineContext {
    temp_dir: PathBuf,
    citation_tally: PathBuf,
    publication_tally: PathBuf,
    keep_intermediates: bool,
}

impl PipelineContext {
    fn new(args: &PipelineArgs) -> Result<Self> {
        let run_id = &Uuid::new_v4().to_string()[..8];

        let temp_dir = args
            .temp_dir
            .as_ref()
            .map(PathBuf::from)
            .unwrap_or_else(env::temp_dir);

        fs::create_dir_all(&temp_dir)
            .with_context(|| format!("Failed to create temp directory: {}", temp_dir.display()))?;

        let citation_tally = temp_dir.join(format!("citation_tally_{}.parquet", run_id));
        let publication_tally = temp_dir.join(format!("publication_tally_{}.parquet", run_id));

        Ok(Self {
            temp_dir,
            citation_tally,
            publication_tally,
            keep_intermediates: args.keep_intermediates,
        })
    }

    fn cleanup(&self) -> Result<()> {
        if self.keep_intermediates {
            info!("Keeping intermediate files:");
            info!("  Citation tally: {}", self.citation_tally.display());
            info!("  Publication tally: {}", self.publication_tally.display());
            return Ok(());
        }

        info!("Cleaning up intermediate files...");

        if self.citation_tally.exists() {
            fs::remove_file(&self.citation_tally)
                .with_context(|| format!("Failed to remove: {}", self.citation_tally.display()))?;
        }
        if self.publication_tally.exists() {
            fs::remove_file(&self.publication_tally).with_context(|| {
                format!("Failed to remove: {}", self.publication_tally.display())
            })?;
        }

        Ok(())
    }
}

impl Drop for PipelineContext {
    fn drop(&mut self) {
        // Best-effort cleanup on drop (e.g., if the pipeline panics)
        if !self.keep_intermediates {
            let _ = fs::remove_file(&self.citation_tally);
            let _ = fs::remove_file(&self.publication_tally);
        }
    }
}

/// Run the full pipeline: tally -> match (both variants) -> report
pub fn run_pipeline(
    args: PipelineArgs,
) -> Result<(TallyStats, MatchStats, MatchStats, ReportStats)> {
    let start_time = Instant::now();

    setup_logging(&args.log_level)?;

    info!("Starting citation-holdings matching pipeline");
    info!("Documents: {}", args.documents);
    info!("Serials: {}", args.serials);
    info!("Subscriptions: {}", args.subscriptions);
    info!("Citation output: {}", args.citation_output);
    info!("Publication output: {}", args.publication_output);

    let ctx = PipelineContext::new(&args)?;

    info!("Temp directory: {}", ctx.temp_dir.display());

    info!("");
    info!("=== STEP 1/4: Tallying documents ===");
    info!("");

    let tally_args = TallyArgs {
        documents: args.documents.clone(),
        citation_output: ctx.citation_tally.to_string_lossy().to_string(),
        publication_output: ctx.publication_tally.to_string_lossy().to_string(),
        threads: args.threads,
        log_level: "OFF".to_string(), // sub-step summaries are re-logged below
    };

    let tally_stats = tally::run_tally(tally_args).context("Tally step failed")?;

    setup_logging(&args.log_level)?;
    info!(
        "Tally complete: {} journal documents, {} distinct cited sources",
        tally_stats.journal_documents, tally_stats.distinct_sources
    );

    info!("");
    info!("=== STEP 2/4: Matching citation tally ===");
    info!("");

    let citation_match_args = MatchArgs {
        tally: ctx.citation_tally.to_string_lossy().to_string(),
        serials: args.serials.clone(),
        subscriptions: args.subscriptions.clone(),
        output: args.citation_output.clone(),
        log_level: "OFF".to_string(),
    };

    let citation_stats =
        match_serials::run_match(citation_match_args).context("Citation match step failed")?;

    setup_logging(&args.log_level)?;
    info!(
        "Citation match complete: {} rows, {} not subscribed",
        citation_stats.matched_rows, citation_stats.unsubscribed_rows
    );

    info!("");
    info!("=== STEP 3/4: Matching publication tally ===");
    info!("");

    let publication_match_args = MatchArgs {
        tally: ctx.publication_tally.to_string_lossy().to_string(),
        serials: args.serials.clone(),
        subscriptions: args.subscriptions.clone(),
        output: args.publication_output.clone(),
        log_level: "OFF".to_string(),
    };

    let publication_stats = match_serials::run_match(publication_match_args)
        .context("Publication match step failed")?;

    setup_logging(&args.log_level)?;
    info!(
        "Publication match complete: {} rows, {} not subscribed",
        publication_stats.matched_rows, publication_stats.unsubscribed_rows
    );

    info!("");
    info!("=== STEP 4/4: Reporting on citation matches ===");
    info!("");

    let report_args = ReportArgs {
        input: args.citation_output.clone(),
        top: args.top,
        log_level: args.log_level.clone(),
    };

    let report_stats = report::run_report(report_args).context("Report step failed")?;

    ctx.cleanup()?;

    let total_time = start_time.elapsed();

    info!("");
    info!("==================== PIPELINE COMPLETE ====================");
    info!("Total execution time: {}", format_elapsed(total_time));
    info!("");
    info!("Tally step:");
    info!("  Lines read: {}", tally_stats.lines_read);
    if tally_stats.lines_failed > 0 {
        info!("  Lines failed to parse: {}", tally_stats.lines_failed);
    }
    info!("  Journal documents: {}", tally_stats.journal_documents);
    info!("  Reference pairs seen: {}", tally_stats.reference_pairs);
    info!("  Reference pairs discarded: {}", tally_stats.pairs_discarded);
    info!("  Distinct cited sources: {}", tally_stats.distinct_sources);
    info!("  Distinct publication venues: {}", tally_stats.distinct_venues);
    info!("");
    info!("Citation match step:");
    info!("  Match result rows: {}", citation_stats.matched_rows);
    info!("  Not subscribed: {}", citation_stats.unsubscribed_rows);
    info!("");
    info!("Publication match step:");
    info!("  Match result rows: {}", publication_stats.matched_rows);
    info!("  Not subscribed: {}", publication_stats.unsubscribed_rows);
    info!("");
    info!("Citation output: {}", args.citation_output);
    info!("Publication output: {}", args.publication_output);
    info!("===========================================================");

    Ok((tally_stats, citation_stats, publication_stats, report_stats))
}
