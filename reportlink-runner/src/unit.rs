// Copyright (c) The nextest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The format-agnostic view of a parsed report.
//!
//! Every report format is normalized into a list of [`ReportUnit`]s. A unit is the thing whose
//! name is compared against test case identifiers: a JUnit suite or test case, a TestNG suite or
//! class, or a whole TAP stream. Its children are the individual outcomes its status is derived
//! from.

use camino::{Utf8Path, Utf8PathBuf};
use report_formats::{
    junit::{Report, Testcase, Testsuite},
    tap::{Directive, DirectiveKind, TestResult, TestSet},
    testng::{Suite, TestMethod, TestngResults, Timings},
};
use std::fmt;

/// What a [`ReportUnit`] represents.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum UnitKind {
    /// A suite of tests.
    Suite,
    /// A test class.
    Class,
    /// A single test case.
    Test,
    /// A TAP stream.
    TestSet,
}

impl UnitKind {
    /// Returns a lowercase label for this kind.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Suite => "suite",
            Self::Class => "class",
            Self::Test => "test case",
            Self::TestSet => "test set",
        }
    }
}

impl fmt::Display for UnitKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Opaque timing information, passed through in the report's own units.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct UnitTimings {
    /// The duration.
    pub duration: Option<String>,

    /// The start time.
    pub started_at: Option<String>,

    /// The end time.
    pub finished_at: Option<String>,
}

impl UnitTimings {
    /// Returns true if no timing information is present.
    pub fn is_empty(&self) -> bool {
        self.duration.is_none() && self.started_at.is_none() && self.finished_at.is_none()
    }
}

impl From<&Timings> for UnitTimings {
    fn from(timings: &Timings) -> Self {
        Self {
            duration: timings.duration_ms.as_ref().map(|ms| format!("{ms} ms")),
            started_at: timings.started_at.clone(),
            finished_at: timings.finished_at.clone(),
        }
    }
}

/// The element enclosing a unit, described in its notes.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct UnitContainer {
    /// The kind of the enclosing element.
    pub kind: UnitKind,

    /// The name of the enclosing element.
    pub name: String,

    /// Timing information of the enclosing element.
    pub timings: UnitTimings,

    /// The number of outcomes within the enclosing element.
    pub child_count: usize,
}

/// The outcome of one test within a unit.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct ChildOutcome {
    /// The test name.
    pub name: String,

    /// The status as written in the report, e.g. `success`, `FAIL` or `not ok`.
    pub status: String,

    /// Timing information.
    pub timings: UnitTimings,

    /// For TestNG, whether this is a configuration method.
    pub is_config: Option<bool>,

    /// For TestNG, the method signature.
    pub signature: Option<String>,

    /// A failure message, skip reason or directive.
    pub message: Option<String>,
}

/// A normalized report unit.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ReportUnit {
    /// What this unit represents.
    pub kind: UnitKind,

    /// The identifier matched against test case tokens.
    pub name: String,

    /// Timing information of the unit itself.
    pub timings: UnitTimings,

    /// The enclosing element, if any.
    pub container: Option<UnitContainer>,

    /// The outcomes the unit's status is derived from, in report order.
    pub children: Vec<ChildOutcome>,

    /// What the children are called in notes, e.g. `test methods`.
    pub child_label: &'static str,

    /// For TAP, the reason given when the producer bailed out. Empty if no reason was given.
    pub bail_out: Option<String>,

    /// For TAP, the reason given by a `1..0 # skip` plan. Empty if no reason was given.
    pub skip_reason: Option<String>,

    /// The report file, relative to the scan root.
    pub source: Utf8PathBuf,
}

/// One unit per JUnit `<testsuite>`, with its test cases as children.
pub fn junit_suite_units(report: &Report, source: &Utf8Path) -> Vec<ReportUnit> {
    report
        .testsuites
        .iter()
        .map(|testsuite| ReportUnit {
            kind: UnitKind::Suite,
            name: testsuite.name.clone(),
            timings: junit_suite_timings(testsuite),
            container: None,
            children: testsuite.testcases.iter().map(junit_child).collect(),
            child_label: "test cases",
            bail_out: None,
            skip_reason: None,
            source: source.to_owned(),
        })
        .collect()
}

/// One unit per JUnit `<testcase>`, with the test case itself as the only child.
pub fn junit_testcase_units(report: &Report, source: &Utf8Path) -> Vec<ReportUnit> {
    report
        .testsuites
        .iter()
        .flat_map(|testsuite| {
            let container = UnitContainer {
                kind: UnitKind::Suite,
                name: testsuite.name.clone(),
                timings: junit_suite_timings(testsuite),
                child_count: testsuite.testcases.len(),
            };
            testsuite.testcases.iter().map(move |testcase| {
                let child = junit_child(testcase);
                ReportUnit {
                    kind: UnitKind::Test,
                    name: testcase.name.clone(),
                    timings: child.timings.clone(),
                    container: Some(container.clone()),
                    children: vec![child],
                    child_label: "test cases",
                    bail_out: None,
                    skip_reason: None,
                    source: source.to_owned(),
                }
            })
        })
        .collect()
}

/// One unit per TestNG `<suite>`, with every test method below it as children.
pub fn testng_suite_units(results: &TestngResults, source: &Utf8Path) -> Vec<ReportUnit> {
    results
        .suites
        .iter()
        .map(|suite| ReportUnit {
            kind: UnitKind::Suite,
            name: suite.name.clone(),
            timings: UnitTimings::from(&suite.timings),
            container: None,
            children: suite.test_methods().map(testng_child).collect(),
            child_label: "test methods",
            bail_out: None,
            skip_reason: None,
            source: source.to_owned(),
        })
        .collect()
}

/// One unit per TestNG `<class>`, with its test methods as children.
pub fn testng_class_units(results: &TestngResults, source: &Utf8Path) -> Vec<ReportUnit> {
    let mut units = Vec::new();
    for suite in &results.suites {
        let container = testng_suite_container(suite);
        for class in suite.tests.iter().flat_map(|test| test.classes.iter()) {
            units.push(ReportUnit {
                kind: UnitKind::Class,
                name: class.name.clone(),
                timings: UnitTimings::default(),
                container: Some(container.clone()),
                children: class.test_methods.iter().map(testng_child).collect(),
                child_label: "test methods",
                bail_out: None,
                skip_reason: None,
                source: source.to_owned(),
            });
        }
    }
    units
}

/// A single unit for a TAP stream, named after the file it was read from.
pub fn tap_unit(set: &TestSet, source: &Utf8Path) -> ReportUnit {
    let children = set
        .test_results
        .iter()
        .enumerate()
        .map(|(index, test)| {
            let number = test.number.unwrap_or(index + 1);
            let name = if test.description.is_empty() {
                number.to_string()
            } else {
                format!("{number} {}", test.description)
            };
            ChildOutcome {
                name,
                status: tap_child_status(test).to_owned(),
                message: test.directive.as_ref().map(directive_message),
                ..ChildOutcome::default()
            }
        })
        .collect();

    ReportUnit {
        kind: UnitKind::TestSet,
        name: source.file_name().unwrap_or(source.as_str()).to_owned(),
        timings: UnitTimings::default(),
        container: None,
        children,
        child_label: "tests",
        bail_out: set
            .bail_outs
            .first()
            .map(|bail_out| bail_out.reason.clone().unwrap_or_default()),
        skip_reason: set.plan.as_ref().and_then(|plan| plan.skip_reason.clone()),
        source: source.to_owned(),
    }
}

fn junit_suite_timings(testsuite: &Testsuite) -> UnitTimings {
    UnitTimings {
        duration: testsuite.time.as_ref().map(|time| format!("{time} s")),
        started_at: testsuite.timestamp.clone(),
        finished_at: None,
    }
}

fn junit_child(testcase: &Testcase) -> ChildOutcome {
    ChildOutcome {
        name: testcase.name.clone(),
        status: testcase.status.as_str().to_owned(),
        timings: UnitTimings {
            duration: testcase.time.as_ref().map(|time| format!("{time} s")),
            started_at: testcase.timestamp.clone(),
            finished_at: None,
        },
        is_config: None,
        signature: None,
        message: testcase.status.message().map(str::to_owned),
    }
}

fn testng_suite_container(suite: &Suite) -> UnitContainer {
    UnitContainer {
        kind: UnitKind::Suite,
        name: suite.name.clone(),
        timings: UnitTimings::from(&suite.timings),
        child_count: suite.test_methods().count(),
    }
}

fn testng_child(method: &TestMethod) -> ChildOutcome {
    ChildOutcome {
        name: method.name.clone(),
        status: method.status.clone(),
        timings: UnitTimings::from(&method.timings),
        is_config: Some(method.is_config),
        signature: method.signature.clone(),
        message: method
            .exception
            .as_ref()
            .and_then(|exception| exception.message.clone().or_else(|| exception.class.clone())),
    }
}

/// A `# SKIP` directive marks the test skipped whatever its `ok`/`not ok` word says.
fn tap_child_status(test: &TestResult) -> &'static str {
    match &test.directive {
        Some(Directive {
            kind: DirectiveKind::Skip,
            ..
        }) => "skip",
        _ => test.status.as_str(),
    }
}

fn directive_message(directive: &Directive) -> String {
    let keyword = match directive.kind {
        DirectiveKind::Skip => "SKIP",
        DirectiveKind::Todo => "TODO",
    };
    match &directive.reason {
        Some(reason) => format!("{keyword} {reason}"),
        None => keyword.to_owned(),
    }
}
