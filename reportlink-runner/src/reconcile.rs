// Copyright (c) The nextest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Running every seeker and combining their results.

use crate::{
    catalog::{ExecutionStatus, TestCaseDefinition, TestCaseId},
    config::ReportPatterns,
    errors::{SeekError, WriteOutputError},
    result::{ResultMap, ResultWrapper},
    seeker::{
        JunitSuites, JunitTests, ReportFormat, Seeker, SeekerKind, Tap, TestngClasses, TestngSuites,
    },
};
use camino::{Utf8Path, Utf8PathBuf};
use serde::Serialize;
use tracing::info;

/// Runs the seekers for every report format and merges their results.
#[derive(Clone, Debug)]
pub struct Reconciler {
    root: Utf8PathBuf,
    key_field: String,
    patterns: ReportPatterns,
    platform: Option<String>,
}

impl Reconciler {
    /// Creates a reconciler that scans `root` with the given patterns and matches on the custom
    /// field named `key_field`.
    pub fn new(
        root: impl Into<Utf8PathBuf>,
        key_field: impl Into<String>,
        patterns: ReportPatterns,
    ) -> Self {
        Self {
            root: root.into(),
            key_field: key_field.into(),
            patterns,
            platform: None,
        }
    }

    /// Records every result against the given platform.
    pub fn with_platform(mut self, platform: Option<&str>) -> Self {
        self.platform = platform.map(str::to_owned);
        self
    }

    /// Runs every seeker in [`SeekerKind::ALL`] order and merges their results.
    ///
    /// The first fatal error aborts the run; results gathered before it are discarded.
    pub fn run(&self, test_cases: &[TestCaseDefinition]) -> Result<ResultMap, SeekError> {
        let mut results = ResultMap::new();
        for kind in SeekerKind::ALL {
            let found = self.run_seeker(kind, test_cases)?;
            results.merge(found);
        }

        if let Some(platform) = &self.platform {
            results.set_platform(platform);
        }

        info!("matched reports to {} test cases", results.len());
        Ok(results)
    }

    /// Runs a single seeker.
    pub fn run_seeker(
        &self,
        kind: SeekerKind,
        test_cases: &[TestCaseDefinition],
    ) -> Result<ResultMap, SeekError> {
        let pattern = self.patterns.for_kind(kind);
        match kind {
            SeekerKind::JunitSuites => self.seeker(JunitSuites).seek(test_cases, pattern),
            SeekerKind::JunitTests => self.seeker(JunitTests).seek(test_cases, pattern),
            SeekerKind::TestngSuites => self.seeker(TestngSuites).seek(test_cases, pattern),
            SeekerKind::TestngClasses => self.seeker(TestngClasses).seek(test_cases, pattern),
            SeekerKind::Tap => self.seeker(Tap).seek(test_cases, pattern),
        }
    }

    fn seeker<F: ReportFormat>(&self, format: F) -> Seeker<F> {
        Seeker::new(format, self.root.clone(), self.key_field.clone())
    }
}

/// Counts of test case results by overall status.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct RunSummary {
    /// The number of test cases with a result.
    pub total: usize,

    /// The number of passed test cases.
    pub passed: usize,

    /// The number of failed test cases.
    pub failed: usize,

    /// The number of blocked test cases.
    pub blocked: usize,

    /// The number of test cases with incomplete evidence.
    pub not_run: usize,
}

impl RunSummary {
    /// Counts the results in a map.
    pub fn new(results: &ResultMap) -> Self {
        let mut summary = Self::default();
        for wrapper in results.iter() {
            summary.total += 1;
            match wrapper.execution_status() {
                ExecutionStatus::Passed => summary.passed += 1,
                ExecutionStatus::Failed => summary.failed += 1,
                ExecutionStatus::Blocked => summary.blocked += 1,
                ExecutionStatus::NotRun => summary.not_run += 1,
            }
        }
        summary
    }

    /// Decides the outcome of the run.
    pub fn outcome(&self, failed_tests_mark_failure: bool) -> RunOutcome {
        if self.failed == 0 {
            RunOutcome::Success
        } else if failed_tests_mark_failure {
            RunOutcome::Failure
        } else {
            RunOutcome::Unstable
        }
    }
}

/// The outcome of a reconciliation run.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum RunOutcome {
    /// No test case failed.
    Success,

    /// Some test cases failed.
    Unstable,

    /// Some test cases failed, and failures are configured to fail the run.
    Failure,
}

/// The serializable document produced by a run.
#[derive(Debug, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct RunReport<'a> {
    outcome: RunOutcome,
    summary: RunSummary,
    results: Vec<RunReportEntry<'a>>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "kebab-case")]
struct RunReportEntry<'a> {
    id: TestCaseId,
    execution_status: ExecutionStatus,
    #[serde(flatten)]
    result: &'a ResultWrapper,
}

impl<'a> RunReport<'a> {
    /// Creates the document for a set of results.
    pub fn new(results: &'a ResultMap, failed_tests_mark_failure: bool) -> Self {
        let summary = RunSummary::new(results);
        Self {
            outcome: summary.outcome(failed_tests_mark_failure),
            summary,
            results: results
                .iter()
                .map(|result| RunReportEntry {
                    id: result.id(),
                    execution_status: result.execution_status(),
                    result,
                })
                .collect(),
        }
    }

    /// Returns the outcome of the run.
    pub fn outcome(&self) -> RunOutcome {
        self.outcome
    }

    /// Returns the summary counts.
    pub fn summary(&self) -> &RunSummary {
        &self.summary
    }

    /// Serializes the document as pretty-printed JSON.
    pub fn to_json_string(&self) -> Result<String, WriteOutputError> {
        serde_json::to_string_pretty(self).map_err(WriteOutputError::Serialize)
    }

    /// Writes the document as JSON to a file.
    pub fn write_to_path(&self, path: &Utf8Path) -> Result<(), WriteOutputError> {
        let mut json = self.to_json_string()?;
        json.push('\n');
        std::fs::write(path, json).map_err(|error| WriteOutputError::Write {
            path: path.to_owned(),
            error,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use test_case::test_case;

    fn result(id: u64, statuses: &[(&str, ExecutionStatus)]) -> ResultWrapper {
        let mut wrapper = ResultWrapper::new(
            TestCaseDefinition::new(id, format!("tc-{id}")),
            statuses.iter().map(|(token, _)| (*token).to_owned()).collect(),
        );
        for (token, status) in statuses {
            wrapper.set_status(*token, *status);
        }
        wrapper
    }

    #[test]
    fn summary_counts() {
        let mut results = ResultMap::new();
        results.add_or_update(result(1, &[("A", ExecutionStatus::Passed)]));
        results.add_or_update(result(
            2,
            &[("A", ExecutionStatus::Passed), ("B", ExecutionStatus::Failed)],
        ));
        results.add_or_update(result(3, &[("A", ExecutionStatus::Blocked)]));
        results.add_or_update(result(4, &[("A", ExecutionStatus::NotRun)]));

        assert_eq!(
            RunSummary::new(&results),
            RunSummary {
                total: 4,
                passed: 1,
                failed: 1,
                blocked: 1,
                not_run: 1,
            }
        );
    }

    #[test_case(0, false, RunOutcome::Success ; "no failures")]
    #[test_case(0, true, RunOutcome::Success ; "no failures strict")]
    #[test_case(2, false, RunOutcome::Unstable ; "failures")]
    #[test_case(2, true, RunOutcome::Failure ; "failures strict")]
    fn outcome(failed: usize, strict: bool, expected: RunOutcome) {
        let summary = RunSummary {
            failed,
            ..RunSummary::default()
        };
        assert_eq!(summary.outcome(strict), expected);
    }

    #[test]
    fn run_report_json() {
        let mut results = ResultMap::new();
        let mut wrapper = result(7, &[("Foo", ExecutionStatus::Failed)]);
        wrapper.append_notes("notes\n");
        results.add_or_update(wrapper);

        let report = RunReport::new(&results, false);
        assert_eq!(report.outcome(), RunOutcome::Unstable);

        let json: serde_json::Value =
            serde_json::from_str(&report.to_json_string().expect("report serializes"))
                .expect("report is valid JSON");
        assert_eq!(json["outcome"], "unstable");
        assert_eq!(json["summary"]["failed"], 1);
        assert_eq!(json["results"][0]["id"], 7);
        assert_eq!(json["results"][0]["execution-status"], "failed");
        assert_eq!(json["results"][0]["statuses"]["Foo"], "failed");
        assert_eq!(json["results"][0]["notes"], "notes\n");
        assert_eq!(json["results"][0]["test-case"]["name"], "tc-7");
    }
}
