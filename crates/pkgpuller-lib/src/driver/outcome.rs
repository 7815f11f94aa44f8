use crate::classify::ClassificationTally;
use crate::error::PullError;
use itertools::Itertools;
use serde::Serialize;
use std::path::PathBuf;

/// What a successful pull of one distribution produced.
#[derive(Clone, Debug, Default, Serialize)]
pub struct DistroReport {
    pub downloaded: Vec<PathBuf>,
    pub not_found: Vec<String>,
    pub tally: ClassificationTally,
}

#[derive(Clone, Debug, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum PullOutcome {
    Success(DistroReport),
    /// No repository of the distribution exists for this release.
    Skipped { reason: String },
    Failed { error: String },
}

impl PullOutcome {
    pub fn failed(error: impl std::fmt::Display) -> Self {
        PullOutcome::Failed {
            error: format!("{error:#}"),
        }
    }
}

#[derive(Clone, Debug, Serialize)]
pub struct DistroOutcome {
    pub tag: String,
    pub outcome: PullOutcome,
}

/// Outcomes of one run, in configuration order, one per distribution tag.
#[derive(Clone, Debug, Default, Serialize)]
pub struct RunSummary {
    pub distributions: Vec<DistroOutcome>,
}

impl RunSummary {
    fn tags_where(&self, predicate: impl Fn(&PullOutcome) -> bool) -> Vec<&str> {
        self.distributions
            .iter()
            .filter(|d| predicate(&d.outcome))
            .map(|d| d.tag.as_str())
            .collect()
    }

    pub fn succeeded(&self) -> Vec<&str> {
        self.tags_where(|o| matches!(o, PullOutcome::Success(_)))
    }

    pub fn skipped(&self) -> Vec<&str> {
        self.tags_where(|o| matches!(o, PullOutcome::Skipped { .. }))
    }

    pub fn failed(&self) -> Vec<&str> {
        self.tags_where(|o| matches!(o, PullOutcome::Failed { .. }))
    }

    pub fn tally(&self) -> ClassificationTally {
        let mut tally = ClassificationTally::default();
        for distro in &self.distributions {
            if let PullOutcome::Success(report) = &distro.outcome {
                tally += report.tally;
            }
        }
        tally
    }

    /// Skips are an expected outcome; only failures make the run fail.
    pub fn into_result(self) -> Result<RunSummary, PullError> {
        let failed = self.failed();
        if failed.is_empty() {
            Ok(self)
        } else {
            Err(PullError::DistributionsFailed {
                count: failed.len(),
                tags: failed.iter().join(", "),
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn outcome(tag: &str, outcome: PullOutcome) -> DistroOutcome {
        DistroOutcome {
            tag: tag.to_string(),
            outcome,
        }
    }

    #[test]
    fn test_skips_do_not_fail_the_run() {
        let summary = RunSummary {
            distributions: vec![
                outcome("ub24", PullOutcome::Success(DistroReport::default())),
                outcome(
                    "sle15",
                    PullOutcome::Skipped {
                        reason: "not found".to_string(),
                    },
                ),
            ],
        };

        assert_eq!(summary.succeeded(), vec!["ub24"]);
        assert_eq!(summary.skipped(), vec!["sle15"]);
        assert!(summary.failed().is_empty());
        assert!(summary.into_result().is_ok());
    }

    #[test]
    fn test_failures_fail_the_run() {
        let summary = RunSummary {
            distributions: vec![
                outcome("el9", PullOutcome::failed("malformed repomd.xml")),
                outcome("el10", PullOutcome::failed("1 download failed")),
                outcome("ub22", PullOutcome::Success(DistroReport::default())),
            ],
        };

        match summary.into_result() {
            Err(PullError::DistributionsFailed { count, tags }) => {
                assert_eq!(count, 2);
                assert_eq!(tags, "el9, el10");
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn test_tally_only_counts_successes() {
        let mut report = DistroReport::default();
        report.tally.total = 2;
        report.tally.amd = 2;
        let summary = RunSummary {
            distributions: vec![
                outcome("ub24", PullOutcome::Success(report.clone())),
                outcome("ub22", PullOutcome::Success(report)),
                outcome(
                    "el8",
                    PullOutcome::Skipped {
                        reason: "gone".to_string(),
                    },
                ),
            ],
        };
        assert_eq!(summary.tally().total, 4);
        assert_eq!(summary.tally().amd, 4);
    }

    #[test]
    fn test_summary_serializes_status_tag() {
        let summary = RunSummary {
            distributions: vec![outcome(
                "amzn23",
                PullOutcome::Skipped {
                    reason: "not found".to_string(),
                },
            )],
        };
        let json = serde_json::to_value(&summary).unwrap();
        assert_eq!(json["distributions"][0]["outcome"]["status"], "skipped");
        assert_eq!(json["distributions"][0]["tag"], "amzn23");
    }
}
