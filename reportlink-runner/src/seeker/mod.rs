// Copyright (c) The nextest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Seekers: find reports of one format, match them to test cases and collect the results.
//!
//! There is a single driver, [`Seeker`], parameterized by a [`ReportFormat`] strategy. The
//! strategy decides how a file is turned into [`ReportUnit`]s and how a unit's status is derived;
//! everything else (scanning, matching, notes, attachments and merging) is shared.

mod formats;

pub use formats::*;

use crate::{
    catalog::{ExecutionStatus, TestCaseDefinition},
    errors::{DisplayErrorChain, ReadReportError, SeekError},
    matcher::KeyMatcher,
    notes,
    result::{Attachment, ResultMap, ResultWrapper},
    scan::{IncludePattern, scan_reports},
    status::resolve_children,
    unit::ReportUnit,
};
use camino::{Utf8Path, Utf8PathBuf};
use report_formats::ParseError;
use std::fmt;
use tracing::{debug, info, warn};

/// The seekers, in the order their results are merged.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum SeekerKind {
    /// JUnit suites, matched by `<testsuite>` name.
    JunitSuites,
    /// JUnit test cases, matched by `<testcase>` name.
    JunitTests,
    /// TestNG suites, matched by `<suite>` name.
    TestngSuites,
    /// TestNG classes, matched by `<class>` name.
    TestngClasses,
    /// TAP streams, matched by file name.
    Tap,
}

impl SeekerKind {
    /// Every seeker, in merge order. When two seekers record a status for the same token, the
    /// later one wins.
    pub const ALL: [SeekerKind; 5] = [
        SeekerKind::JunitSuites,
        SeekerKind::JunitTests,
        SeekerKind::TestngSuites,
        SeekerKind::TestngClasses,
        SeekerKind::Tap,
    ];

    /// Returns a short identifier for this seeker.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::JunitSuites => "junit-suites",
            Self::JunitTests => "junit-tests",
            Self::TestngSuites => "testng-suites",
            Self::TestngClasses => "testng-classes",
            Self::Tap => "tap",
        }
    }

    /// Returns the name of the report format this seeker reads.
    pub fn format_name(self) -> &'static str {
        match self {
            Self::JunitSuites | Self::JunitTests => "JUnit",
            Self::TestngSuites | Self::TestngClasses => "TestNG",
            Self::Tap => "TAP",
        }
    }
}

impl fmt::Display for SeekerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How one report format is read and judged.
pub trait ReportFormat {
    /// Returns which seeker this format drives.
    fn kind(&self) -> SeekerKind;

    /// Parses the contents of one report file into units.
    fn extract_units(
        &self,
        source: &Utf8Path,
        contents: &str,
    ) -> Result<Vec<ReportUnit>, ParseError>;

    /// Returns the status string that marks a passing child.
    fn pass_marker(&self) -> &'static str;

    /// Returns the MIME type used when attaching a report file.
    fn attachment_mime_type(&self) -> &'static str {
        "text/xml"
    }

    /// Derives the status of a unit.
    fn resolve_status(&self, unit: &ReportUnit) -> ExecutionStatus {
        resolve_children(&unit.children, self.pass_marker())
    }

    /// Renders the notes recorded for a matched unit.
    fn render_notes(&self, unit: &ReportUnit, status: ExecutionStatus) -> String {
        notes::render_unit_notes(self.kind().format_name(), unit, status)
    }
}

/// Scans for reports of one format and matches them against test cases.
#[derive(Clone, Debug)]
pub struct Seeker<F> {
    format: F,
    root: Utf8PathBuf,
    matcher: KeyMatcher,
}

impl<F: ReportFormat> Seeker<F> {
    /// Creates a seeker that scans `root` and matches on the custom field named `key_field`.
    pub fn new(format: F, root: impl Into<Utf8PathBuf>, key_field: impl Into<String>) -> Self {
        Self {
            format,
            root: root.into(),
            matcher: KeyMatcher::new(key_field),
        }
    }

    /// Returns the format strategy.
    pub fn format(&self) -> &F {
        &self.format
    }

    /// Finds the reports matching `pattern` and collects results for `test_cases`.
    ///
    /// A blank pattern disables the seeker: an empty map is returned without touching the file
    /// system. Files that cannot be read or parsed are logged and skipped. Errors while scanning
    /// are fatal.
    pub fn seek(
        &self,
        test_cases: &[TestCaseDefinition],
        pattern: &str,
    ) -> Result<ResultMap, SeekError> {
        let kind = self.format.kind();
        let Some(pattern) = IncludePattern::new(pattern)? else {
            debug!("{kind}: no include pattern configured, skipping");
            return Ok(ResultMap::new());
        };

        let files = scan_reports(&self.root, &pattern)?;
        info!(
            "{kind}: found {} report files matching `{}` under {}",
            files.len(),
            pattern.as_str(),
            self.root,
        );

        let candidates = self.matcher.candidates(test_cases);
        let mut results = ResultMap::new();

        for file in &files {
            let units = match self.read_units(file) {
                Ok(units) => units,
                Err(error) => {
                    warn!("{kind}: skipping report: {}", DisplayErrorChain::new(&error));
                    continue;
                }
            };

            for unit in &units {
                if unit.name.trim().is_empty() {
                    continue;
                }
                for candidate in &candidates {
                    let matched = candidate.matching_tokens(&unit.name);
                    if matched.is_empty() {
                        continue;
                    }

                    let status = self.format.resolve_status(unit);
                    debug!(
                        "{kind}: {} `{}` in {file} matches test case {} ({status})",
                        unit.kind, unit.name, candidate.test_case.id,
                    );
                    for token in matched {
                        let wrapper = self.make_wrapper(
                            candidate.test_case,
                            &candidate.key_tokens,
                            token,
                            unit,
                            status,
                        );
                        results.add_or_update(wrapper);
                    }
                }
            }
        }

        info!("{kind}: collected results for {} test cases", results.len());
        Ok(results)
    }

    fn read_units(&self, file: &Utf8Path) -> Result<Vec<ReportUnit>, ReadReportError> {
        let contents =
            std::fs::read_to_string(self.root.join(file)).map_err(|error| ReadReportError::Io {
                path: file.to_owned(),
                error,
            })?;
        self.format
            .extract_units(file, &contents)
            .map_err(|error| ReadReportError::Parse {
                format: self.format.kind().format_name(),
                path: file.to_owned(),
                error,
            })
    }

    fn make_wrapper(
        &self,
        test_case: &TestCaseDefinition,
        key_tokens: &[String],
        token: String,
        unit: &ReportUnit,
        status: ExecutionStatus,
    ) -> ResultWrapper {
        let mut wrapper = ResultWrapper::new(test_case.clone(), key_tokens.to_vec());
        wrapper.set_status(token, status);
        wrapper.append_notes(&self.format.render_notes(unit, status));

        match Attachment::from_report_file(
            &self.root,
            &unit.source,
            self.format.kind().format_name(),
            self.format.attachment_mime_type(),
        ) {
            Ok(attachment) => wrapper.add_attachment(attachment),
            Err(error) => {
                warn!(
                    "{}: failed to attach report {}: {error}",
                    self.format.kind(),
                    unit.source,
                );
                wrapper.append_notes(&notes::attachment_failure_note(&unit.source, &error));
            }
        }

        wrapper
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::TestCaseId;
    use camino_tempfile::tempdir;
    use pretty_assertions::assert_eq;

    #[test]
    fn blank_pattern_performs_no_io() {
        // The root doesn't exist: any attempt to scan it would fail.
        let seeker = Seeker::new(JunitSuites, "/nonexistent/reportlink-root", "class");
        let test_cases =
            vec![TestCaseDefinition::new(1, "foo").with_custom_field("class", "FooTest")];

        for pattern in ["", "   ", ","] {
            let results = seeker.seek(&test_cases, pattern).expect("blank pattern succeeds");
            assert!(results.is_empty(), "pattern {pattern:?} yields no results");
        }
    }

    #[test]
    fn missing_root_is_fatal() {
        let dir = tempdir().expect("tempdir created");
        let seeker = Seeker::new(Tap, dir.path().join("missing"), "class");
        let err = seeker
            .seek(&[], "**/*.tap")
            .expect_err("missing root is an error");
        assert!(matches!(err, SeekError::ScanIo { .. }), "{err:?}");
    }

    /// Reads TAP streams but reports every unit as coming from a file that doesn't exist.
    struct RelocatedTap;

    impl ReportFormat for RelocatedTap {
        fn kind(&self) -> SeekerKind {
            SeekerKind::Tap
        }

        fn extract_units(
            &self,
            source: &Utf8Path,
            contents: &str,
        ) -> Result<Vec<ReportUnit>, ParseError> {
            let mut units = Tap.extract_units(source, contents)?;
            for unit in &mut units {
                unit.source = Utf8Path::new("moved").join(&unit.source);
            }
            Ok(units)
        }

        fn pass_marker(&self) -> &'static str {
            Tap.pass_marker()
        }
    }

    #[test]
    fn unreadable_attachment_keeps_match() {
        let dir = tempdir().expect("tempdir created");
        std::fs::write(dir.path().join("smoke.tap"), "1..1\nok 1 - starts\n")
            .expect("stream written");
        let test_cases =
            vec![TestCaseDefinition::new(7, "smoke").with_custom_field("class", "smoke.tap")];

        let results = Seeker::new(RelocatedTap, dir.path(), "class")
            .seek(&test_cases, "*.tap")
            .expect("attachment failure is not fatal");

        let wrapper = results.get(TestCaseId(7)).expect("match recorded");
        assert_eq!(wrapper.status_for("smoke.tap"), Some(ExecutionStatus::Passed));
        assert_eq!(wrapper.execution_status(), ExecutionStatus::Passed);
        assert!(wrapper.attachments().is_empty());
        let notes = wrapper.notes();
        assert!(notes.contains("TAP test set smoke.tap: passed"), "{notes}");
        assert!(
            notes.contains("could not attach report moved/smoke.tap"),
            "{notes}"
        );
    }

    #[test]
    fn seeker_order() {
        let names: Vec<_> = SeekerKind::ALL.iter().map(|kind| kind.as_str()).collect();
        assert_eq!(
            names,
            vec![
                "junit-suites",
                "junit-tests",
                "testng-suites",
                "testng-classes",
                "tap",
            ]
        );
    }
}
