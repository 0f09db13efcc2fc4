//! Line-oriented batch processing over a set of keys read from stdin
//! (component H).
//!
//! One line, one key, one outcome. A failing key never aborts the run —
//! every line is attempted and every outcome recorded, so a caller piping
//! a thousand issue keys through `batch` gets a single pass with a
//! per-line result and a final tally, rather than stopping at the first
//! bad key.

use core_error::{ClientError, ErrorCategory};

/// The result of applying an operation to a single key. A failure carries
/// the same [`ClientError`] every other operation in the core reports, so
/// its real category (not a hardcoded one) flows into [`Record::category`].
#[derive(Debug, Clone)]
pub enum Outcome {
    Success,
    Failure(ClientError),
}

/// One line of the batch report: the key it was produced from and what
/// happened.
#[derive(Debug, Clone)]
pub struct Record {
    pub key: String,
    pub outcome: Outcome,
}

impl Record {
    /// `"KEY: success"` or `"KEY: failed - <message>"`.
    pub fn display_line(&self) -> String {
        match &self.outcome {
            Outcome::Success => format!("{}: success", self.key),
            Outcome::Failure(err) => format!("{}: failed - {}", self.key, err.display_line()),
        }
    }

    pub fn category(&self) -> ErrorCategory {
        match &self.outcome {
            Outcome::Success => ErrorCategory::Success,
            Outcome::Failure(err) => err.category(),
        }
    }
}

/// The outcome of a whole run: every per-line [`Record`] plus the derived
/// summary and exit classification.
#[derive(Debug, Clone)]
pub struct Report {
    pub records: Vec<Record>,
}

impl Report {
    pub fn succeeded(&self) -> usize {
        self.records
            .iter()
            .filter(|r| matches!(r.outcome, Outcome::Success))
            .count()
    }

    pub fn failed(&self) -> usize {
        self.records.len() - self.succeeded()
    }

    /// `"N processed: S succeeded, F failed"`.
    pub fn summary_line(&self) -> String {
        format!(
            "{} processed: {} succeeded, {} failed",
            self.records.len(),
            self.succeeded(),
            self.failed()
        )
    }

    /// Aggregate every record's category into the single exit category the
    /// process should report.
    pub fn category(&self) -> ErrorCategory {
        let categories: Vec<ErrorCategory> = self.records.iter().map(Record::category).collect();
        core_error::aggregate(&categories)
    }
}

/// Non-empty, whitespace-trimmed lines only: blank lines (including
/// lines that are pure whitespace) are skipped rather than treated as
/// empty keys.
pub fn keys_from_lines(input: &str) -> Vec<String> {
    input
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect()
}

/// Run `op` over every key parsed from `input`, one at a time, recording
/// an outcome for each regardless of failure. `op` is never retried and
/// its failure never stops iteration.
pub async fn run<F, Fut>(input: &str, mut op: F) -> Report
where
    F: FnMut(&str) -> Fut,
    Fut: std::future::Future<Output = Result<(), ClientError>>,
{
    let mut records = Vec::new();
    for key in keys_from_lines(input) {
        let outcome = match op(&key).await {
            Ok(()) => Outcome::Success,
            Err(err) => Outcome::Failure(err),
        };
        records.push(Record { key, outcome });
    }
    Report { records }
}

/// A single dry-run preview line: the key and the description of what
/// would have been done to it. Dry-run never calls `op` and never fails —
/// it exists purely to let a caller see which keys would be touched.
#[derive(Debug, Clone)]
pub struct Preview {
    pub key: String,
    pub description: String,
}

impl Preview {
    /// `"KEY: would <description>"`.
    pub fn display_line(&self) -> String {
        format!("{}: would {}", self.key, self.description)
    }
}

/// Dry-run variant: `describe` replaces the operation entirely (no
/// transport call is ever made) and produces one [`Preview`] per key.
pub fn run_dry<F>(input: &str, mut describe: F) -> Vec<Preview>
where
    F: FnMut(&str) -> String,
{
    keys_from_lines(input)
        .into_iter()
        .map(|key| {
            let description = describe(&key);
            Preview { key, description }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_and_whitespace_lines_are_skipped() {
        let input = "ISSUE-1\n\n   \nISSUE-2\n";
        assert_eq!(keys_from_lines(input), vec!["ISSUE-1", "ISSUE-2"]);
    }

    #[test]
    fn lines_are_trimmed() {
        let input = "  ISSUE-1  \n";
        assert_eq!(keys_from_lines(input), vec!["ISSUE-1"]);
    }

    #[tokio::test]
    async fn continues_past_failures_and_records_every_outcome() {
        let input = "OK-1\nBAD-1\nOK-2\n";
        let report = run(input, |key| {
            let key = key.to_string();
            async move {
                if key.starts_with("BAD") {
                    Err(ClientError::User("not found".to_string()))
                } else {
                    Ok(())
                }
            }
        })
        .await;

        assert_eq!(report.records.len(), 3);
        assert_eq!(report.succeeded(), 2);
        assert_eq!(report.failed(), 1);
        assert_eq!(report.summary_line(), "3 processed: 2 succeeded, 1 failed");
    }

    #[tokio::test]
    async fn mixed_outcomes_aggregate_to_partial_failure() {
        let input = "OK-1\nBAD-1\n";
        let report = run(input, |key| {
            let key = key.to_string();
            async move {
                if key == "BAD-1" {
                    Err(ClientError::User("boom".to_string()))
                } else {
                    Ok(())
                }
            }
        })
        .await;
        assert_eq!(report.category(), ErrorCategory::PartialFailure);
    }

    #[tokio::test]
    async fn all_failed_with_remote_errors_aggregates_to_api_error() {
        let input = "BAD-1\nBAD-2\n";
        let report = run(input, |_| async {
            Err(ClientError::Remote(core_error::RemoteError {
                status: 404,
                phrase: "Not Found".to_string(),
                messages: vec!["no such issue".to_string()],
                ..Default::default()
            }))
        })
        .await;
        assert_eq!(report.category(), ErrorCategory::ApiError);
    }

    #[tokio::test]
    async fn all_success_aggregates_to_success() {
        let input = "OK-1\nOK-2\n";
        let report = run(input, |_| async { Ok(()) }).await;
        assert_eq!(report.category(), ErrorCategory::Success);
    }

    #[test]
    fn dry_run_never_invokes_the_real_operation() {
        let input = "ISSUE-1\nISSUE-2\n";
        let previews = run_dry(input, |key| format!("transition {key} to Done"));
        assert_eq!(previews.len(), 2);
        assert_eq!(
            previews[0].display_line(),
            "ISSUE-1: would transition ISSUE-1 to Done"
        );
    }

    #[test]
    fn display_line_matches_expected_format() {
        let ok = Record {
            key: "ISSUE-1".into(),
            outcome: Outcome::Success,
        };
        assert_eq!(ok.display_line(), "ISSUE-1: success");

        let bad = Record {
            key: "ISSUE-2".into(),
            outcome: Outcome::Failure(ClientError::User("not found".into())),
        };
        assert_eq!(bad.display_line(), "ISSUE-2: failed - not found");
    }
}
