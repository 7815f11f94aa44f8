mod outcome;
mod run;

pub use outcome::{DistroOutcome, DistroReport, PullOutcome, RunSummary};
pub use run::{PullSettings, pull_all, pull_distribution};
