use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "citation-holdings-matching")]
#[command(
    about = "Unified CLI for tallying cited journals and matching them against serials metadata and subscription holdings"
)]
#[command(version = "1.0.0")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Tally cited source titles and publication venues from journal documents
    Tally(TallyArgs),

    /// Match a tally against serials metadata and subscription holdings (using Polars)
    Match(MatchArgs),

    /// Report top cited titles and the cited-but-not-subscribed diff
    Report(ReportArgs),

    /// Run the full pipeline: tally -> match -> report
    Pipeline(PipelineArgs),
}

#[derive(Parser, Clone)]
pub struct TallyArgs {
    /// Document records as JSONL (optionally .gz)
    #[arg(short, long, required = true)]
    pub documents: String,

    /// Output Parquet file for the citation tally
    #[arg(long, default_value = "citation_tally.parquet")]
    pub citation_output: String,

    /// Output Parquet file for the publication-venue tally
    #[arg(long, default_value = "publication_tally.parquet")]
    pub publication_output: String,

    /// Number of worker threads (0 = auto-detect)
    #[arg(short, long, default_value = "0")]
    pub threads: usize,

    /// Logging level (DEBUG, INFO, WARN, ERROR, OFF)
    #[arg(short, long, default_value = "INFO")]
    pub log_level: String,
}

#[derive(Parser, Clone)]
pub struct MatchArgs {
    /// Input tally Parquet file from the tally step
    #[arg(long, required = true)]
    pub tally: String,

    /// Serials registry as JSONL (optionally .gz)
    #[arg(long, required = true)]
    pub serials: String,

    /// Subscription holdings CSV export
    #[arg(long, required = true)]
    pub subscriptions: String,

    /// Output Parquet file with match results
    #[arg(short, long, default_value = "matches.parquet")]
    pub output: String,

    /// Logging level (DEBUG, INFO, WARN, ERROR, OFF)
    #[arg(short, long, default_value = "INFO")]
    pub log_level: String,
}

#[derive(Parser, Clone)]
pub struct ReportArgs {
    /// Match results Parquet file from the match step
    #[arg(short, long, required = true)]
    pub input: String,

    /// Number of rows to display per table
    #[arg(short, long, default_value = "20")]
    pub top: usize,

    /// Logging level (DEBUG, INFO, WARN, ERROR, OFF)
    #[arg(short, long, default_value = "INFO")]
    pub log_level: String,
}

#[derive(Parser, Clone)]
pub struct PipelineArgs {
    /// Document records as JSONL (optionally .gz)
    #[arg(short, long, required = true)]
    pub documents: String,

    /// Serials registry as JSONL (optionally .gz)
    #[arg(long, required = true)]
    pub serials: String,

    /// Subscription holdings CSV export
    #[arg(long, required = true)]
    pub subscriptions: String,

    /// Output Parquet file for citation match results
    #[arg(long, default_value = "citation_matches.parquet")]
    pub citation_output: String,

    /// Output Parquet file for publication match results
    #[arg(long, default_value = "publication_matches.parquet")]
    pub publication_output: String,

    /// Number of rows to display per report table
    #[arg(long, default_value = "20")]
    pub top: usize,

    /// Number of worker threads (0 = auto-detect)
    #[arg(short, long, default_value = "0")]
    pub threads: usize,

    /// Keep intermediate tally files instead of deleting them
    #[arg(long, default_value = "false")]
    pub keep_intermediates: bool,

    /// Directory for intermediate files (default: system temp)
    #[arg(long)]
    pub temp_dir: Option<String>,

    /// Logging level (DEBUG, INFO, WARN, ERROR, OFF)
    #[arg(short, long, default_value = "INFO")]
    pub log_level: String,
}
