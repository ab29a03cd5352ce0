use anyhow::Result;
use clap::Parser;

use citation_holdings_matching::cli::{Cli, Commands};
use citation_holdings_matching::commands::{run_match, run_pipeline, run_report, run_tally};

fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Tally(args) => {
            run_tally(args)?;
        }
        Commands::Match(args) => {
            run_match(args)?;
        }
        Commands::Report(args) => {
            run_report(args)?;
        }
        Commands::Pipeline(args) => {
            run_pipeline(args)?;
        }
    }

    Ok(())
}
