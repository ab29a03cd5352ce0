pub mod match_serials;
pub mod pipeline;
pub mod report;
pub mod tally;

pub use match_serials::run_match;
pub use pipeline::run_pipeline;
pub use report::run_report;
pub use tally::run_tally;
