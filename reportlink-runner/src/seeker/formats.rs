// Copyright (c) The nextest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use super::{ReportFormat, SeekerKind};
use crate::{
    catalog::ExecutionStatus,
    status::resolve_children,
    unit::{self, ReportUnit},
};
use camino::Utf8Path;
use report_formats::{ParseError, junit, tap, testng};

/// JUnit reports, matched by test suite name.
#[derive(Clone, Copy, Debug, Default)]
pub struct JunitSuites;

impl ReportFormat for JunitSuites {
    fn kind(&self) -> SeekerKind {
        SeekerKind::JunitSuites
    }

    fn extract_units(
        &self,
        source: &Utf8Path,
        contents: &str,
    ) -> Result<Vec<ReportUnit>, ParseError> {
        let report = junit::parse_report(contents)?;
        Ok(unit::junit_suite_units(&report, source))
    }

    fn pass_marker(&self) -> &'static str {
        "success"
    }
}

/// JUnit reports, matched by test case name.
#[derive(Clone, Copy, Debug, Default)]
pub struct JunitTests;

impl ReportFormat for JunitTests {
    fn kind(&self) -> SeekerKind {
        SeekerKind::JunitTests
    }

    fn extract_units(
        &self,
        source: &Utf8Path,
        contents: &str,
    ) -> Result<Vec<ReportUnit>, ParseError> {
        let report = junit::parse_report(contents)?;
        Ok(unit::junit_testcase_units(&report, source))
    }

    fn pass_marker(&self) -> &'static str {
        "success"
    }
}

/// TestNG results, matched by suite name.
#[derive(Clone, Copy, Debug, Default)]
pub struct TestngSuites;

impl ReportFormat for TestngSuites {
    fn kind(&self) -> SeekerKind {
        SeekerKind::TestngSuites
    }

    fn extract_units(
        &self,
        source: &Utf8Path,
        contents: &str,
    ) -> Result<Vec<ReportUnit>, ParseError> {
        let results = testng::parse_results(contents)?;
        Ok(unit::testng_suite_units(&results, source))
    }

    fn pass_marker(&self) -> &'static str {
        "PASS"
    }
}

/// TestNG results, matched by class name.
#[derive(Clone, Copy, Debug, Default)]
pub struct TestngClasses;

impl ReportFormat for TestngClasses {
    fn kind(&self) -> SeekerKind {
        SeekerKind::TestngClasses
    }

    fn extract_units(
        &self,
        source: &Utf8Path,
        contents: &str,
    ) -> Result<Vec<ReportUnit>, ParseError> {
        let results = testng::parse_results(contents)?;
        Ok(unit::testng_class_units(&results, source))
    }

    fn pass_marker(&self) -> &'static str {
        "PASS"
    }
}

/// TAP streams, matched by file name.
#[derive(Clone, Copy, Debug, Default)]
pub struct Tap;

impl ReportFormat for Tap {
    fn kind(&self) -> SeekerKind {
        SeekerKind::Tap
    }

    fn extract_units(
        &self,
        source: &Utf8Path,
        contents: &str,
    ) -> Result<Vec<ReportUnit>, ParseError> {
        let set = tap::parse_stream(contents)?;
        Ok(vec![unit::tap_unit(&set, source)])
    }

    fn pass_marker(&self) -> &'static str {
        "ok"
    }

    fn attachment_mime_type(&self) -> &'static str {
        "text/plain"
    }

    /// A stream whose producer bailed out is blocked, whatever its test lines say.
    fn resolve_status(&self, unit: &ReportUnit) -> ExecutionStatus {
        if unit.bail_out.is_some() {
            ExecutionStatus::Blocked
        } else {
            resolve_children(&unit.children, self.pass_marker())
        }
    }
}
