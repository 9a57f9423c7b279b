// Copyright (c) The nextest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! JUnit/XUnit XML reports, as written by Ant, Maven Surefire, Gradle and most other tools.

use crate::{
    Output,
    errors::ParseError,
    xml::{self, attr, count_attr, extra_attrs, push_text},
};
use indexmap::IndexMap;
use quick_xml::events::{BytesStart, Event};

const TESTSUITES_TAG: &[u8] = b"testsuites";
const TESTSUITE_TAG: &[u8] = b"testsuite";
const TESTCASE_TAG: &[u8] = b"testcase";
const PROPERTY_TAG: &[u8] = b"property";
const FAILURE_TAG: &[u8] = b"failure";
const ERROR_TAG: &[u8] = b"error";
const SKIPPED_TAG: &[u8] = b"skipped";
const SYSTEM_OUT_TAG: &[u8] = b"system-out";
const SYSTEM_ERR_TAG: &[u8] = b"system-err";

static EXPECTED_ROOT: &str = "testsuites` or `testsuite";

static TESTSUITE_KNOWN_ATTRS: &[&str] = &[
    "name",
    "tests",
    "failures",
    "errors",
    "skipped",
    "disabled",
    "time",
    "timestamp",
];
static TESTCASE_KNOWN_ATTRS: &[&str] = &["name", "classname", "assertions", "time", "timestamp"];

/// The root element of a JUnit report.
#[derive(Clone, Debug, Default)]
pub struct Report {
    /// The name of this report, if the root element was `<testsuites>` and carried one.
    pub name: Option<String>,

    /// The overall time taken, as written in the report (usually seconds).
    pub time: Option<String>,

    /// The total number of tests from all testsuites.
    pub tests: usize,

    /// The total number of failures from all testsuites.
    pub failures: usize,

    /// The total number of errors from all testsuites.
    pub errors: usize,

    /// The test suites contained in this report.
    pub testsuites: Vec<Testsuite>,
}

impl Report {
    /// Adds a new testsuite and updates the `tests`, `failures` and `errors` counts.
    pub fn add_testsuite(&mut self, testsuite: Testsuite) -> &mut Self {
        self.tests += testsuite.tests;
        self.failures += testsuite.failures;
        self.errors += testsuite.errors;
        self.testsuites.push(testsuite);
        self
    }
}

/// Represents a single testsuite.
///
/// A `Testsuite` groups together several `Testcase` instances.
#[derive(Clone, Debug, Default)]
#[non_exhaustive]
pub struct Testsuite {
    /// The name of this testsuite.
    pub name: String,

    /// The total number of tests in this testsuite.
    pub tests: usize,

    /// The total number of skipped or disabled tests in this testsuite.
    pub disabled: usize,

    /// The total number of tests in this suite that errored.
    pub errors: usize,

    /// The total number of tests in this suite that failed.
    pub failures: usize,

    /// The time at which the testsuite began execution, as written in the report.
    pub timestamp: Option<String>,

    /// The overall time taken by the testsuite, as written in the report.
    pub time: Option<String>,

    /// The testcases that form this testsuite.
    pub testcases: Vec<Testcase>,

    /// Custom properties set during test execution, e.g. environment variables.
    pub properties: Vec<Property>,

    /// Data written to standard output while the testsuite was executed.
    pub system_out: Option<Output>,

    /// Data written to standard error while the testsuite was executed.
    pub system_err: Option<Output>,

    /// Other attributes, such as "hostname" or "package".
    pub extra: IndexMap<String, String>,
}

impl Testsuite {
    /// Creates a new `Testsuite`.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    /// Adds a testcase to this testsuite and updates the counts.
    pub fn add_testcase(&mut self, testcase: Testcase) -> &mut Self {
        self.tests += 1;
        match &testcase.status {
            TestcaseStatus::Success => {}
            TestcaseStatus::NonSuccess { kind, .. } => match kind {
                NonSuccessKind::Failure => self.failures += 1,
                NonSuccessKind::Error => self.errors += 1,
            },
            TestcaseStatus::Skipped { .. } => self.disabled += 1,
        }
        self.testcases.push(testcase);
        self
    }
}

/// Represents a single testcase.
#[derive(Clone, Debug)]
#[non_exhaustive]
pub struct Testcase {
    /// The name of the testcase.
    pub name: String,

    /// The "classname" of the testcase.
    ///
    /// Typically, this represents the fully qualified path to the test. In other words,
    /// `classname` + `name` together should uniquely identify and locate a test.
    pub classname: Option<String>,

    /// The number of assertions in the testcase.
    pub assertions: Option<usize>,

    /// The time at which this testcase began execution, as written in the report.
    pub timestamp: Option<String>,

    /// The time it took to execute this testcase, as written in the report.
    pub time: Option<String>,

    /// The status of this test.
    pub status: TestcaseStatus,

    /// Data written to standard output while the testcase was executed.
    pub system_out: Option<Output>,

    /// Data written to standard error while the testcase was executed.
    pub system_err: Option<Output>,

    /// Other attributes, such as "file" or "line".
    pub extra: IndexMap<String, String>,
}

impl Testcase {
    /// Creates a new testcase.
    pub fn new(name: impl Into<String>, status: TestcaseStatus) -> Self {
        Self {
            name: name.into(),
            classname: None,
            assertions: None,
            timestamp: None,
            time: None,
            status,
            system_out: None,
            system_err: None,
            extra: IndexMap::new(),
        }
    }
}

/// Represents the success or failure of a testcase.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum TestcaseStatus {
    /// This testcase passed.
    Success,

    /// This testcase did not pass.
    NonSuccess {
        /// Whether this testcase failed in an expected way (failure) or an unexpected way (error).
        kind: NonSuccessKind,

        /// The failure message.
        message: Option<String>,

        /// The "type" of failure that occurred.
        ty: Option<String>,

        /// The description of the failure, read from the text node of the element.
        description: Option<String>,
    },

    /// This testcase was not run.
    Skipped {
        /// The skip message.
        message: Option<String>,

        /// The "type" of skip that occurred.
        ty: Option<String>,

        /// The description of the skip, read from the text node of the element.
        description: Option<String>,
    },
}

impl TestcaseStatus {
    /// Returns the status as a lowercase word: `success`, `failure`, `error` or `skipped`.
    pub fn as_str(&self) -> &'static str {
        match self {
            TestcaseStatus::Success => "success",
            TestcaseStatus::NonSuccess {
                kind: NonSuccessKind::Failure,
                ..
            } => "failure",
            TestcaseStatus::NonSuccess {
                kind: NonSuccessKind::Error,
                ..
            } => "error",
            TestcaseStatus::Skipped { .. } => "skipped",
        }
    }

    /// Returns the message attached to a non-success or skipped status.
    pub fn message(&self) -> Option<&str> {
        match self {
            TestcaseStatus::Success => None,
            TestcaseStatus::NonSuccess { message, .. } | TestcaseStatus::Skipped { message, .. } => {
                message.as_deref()
            }
        }
    }

    fn description_mut(&mut self) -> Option<&mut Option<String>> {
        match self {
            TestcaseStatus::Success => None,
            TestcaseStatus::NonSuccess { description, .. }
            | TestcaseStatus::Skipped { description, .. } => Some(description),
        }
    }
}

/// Whether a non-success was a failure or an error.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum NonSuccessKind {
    /// This is an expected failure. Serialized as `failure`.
    Failure,

    /// This is an unexpected error. Serialized as `error`.
    Error,
}

/// Custom properties set during test execution, e.g. environment variables.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Property {
    /// The name of the property.
    pub name: String,

    /// The value of the property.
    pub value: String,
}

/// Reads a JUnit report from its XML text.
///
/// Both a `<testsuites>` root and a bare `<testsuite>` root are accepted. Nested testsuites are
/// flattened into [`Report::testsuites`] in the order they are closed.
pub fn parse_report(xml: &str) -> Result<Report, ParseError> {
    let mut reader = xml::reader(xml);
    let mut state = JunitReader::default();

    loop {
        match reader.read_event()? {
            Event::Eof => break,
            Event::Start(e) => state.open(&e, false)?,
            Event::Empty(e) => state.open(&e, true)?,
            Event::End(e) => state.close(e.name().as_ref()),
            Event::Text(e) => state.text(&xml::text(&e)?),
            Event::CData(e) => state.text(&xml::cdata(e)),
            _ => {}
        }
    }

    state.finish()
}

#[derive(Clone, Copy, Debug)]
enum TextTarget {
    Status,
    SuiteOut,
    SuiteErr,
    CaseOut,
    CaseErr,
}

#[derive(Debug, Default)]
struct JunitReader {
    report: Option<Report>,
    suites: Vec<Testsuite>,
    testcase: Option<Testcase>,
    text_target: Option<TextTarget>,
    text: Option<String>,
}

impl JunitReader {
    fn open(&mut self, e: &BytesStart<'_>, empty: bool) -> Result<(), ParseError> {
        let name = e.name();
        let tag = name.as_ref();

        if self.report.is_none() && tag != TESTSUITES_TAG && tag != TESTSUITE_TAG {
            return Err(ParseError::UnexpectedRoot {
                found: xml::element_name(e),
                expected: EXPECTED_ROOT,
            });
        }

        match tag {
            TESTSUITES_TAG => {
                let report = self.report.get_or_insert_with(Report::default);
                report.name = attr(e, "name")?;
                report.time = attr(e, "time")?;
            }
            TESTSUITE_TAG => {
                self.report.get_or_insert_with(Report::default);
                let mut testsuite = Testsuite::new(attr(e, "name")?.unwrap_or_default());
                testsuite.timestamp = attr(e, "timestamp")?;
                testsuite.time = attr(e, "time")?;
                testsuite.extra = extra_attrs(e, TESTSUITE_KNOWN_ATTRS)?;
                self.suites.push(testsuite);
                if empty {
                    self.close(TESTSUITE_TAG);
                }
            }
            TESTCASE_TAG => {
                let mut testcase =
                    Testcase::new(attr(e, "name")?.unwrap_or_default(), TestcaseStatus::Success);
                testcase.classname = attr(e, "classname")?;
                testcase.assertions = count_attr(e, "testcase", "assertions")?;
                testcase.timestamp = attr(e, "timestamp")?;
                testcase.time = attr(e, "time")?;
                testcase.extra = extra_attrs(e, TESTCASE_KNOWN_ATTRS)?;
                self.testcase = Some(testcase);
                if empty {
                    self.close(TESTCASE_TAG);
                }
            }
            FAILURE_TAG | ERROR_TAG | SKIPPED_TAG => {
                if let Some(testcase) = &mut self.testcase {
                    let message = attr(e, "message")?;
                    let ty = attr(e, "type")?;
                    testcase.status = if tag == SKIPPED_TAG {
                        TestcaseStatus::Skipped {
                            message,
                            ty,
                            description: None,
                        }
                    } else {
                        let kind = if tag == FAILURE_TAG {
                            NonSuccessKind::Failure
                        } else {
                            NonSuccessKind::Error
                        };
                        TestcaseStatus::NonSuccess {
                            kind,
                            message,
                            ty,
                            description: None,
                        }
                    };
                    if !empty {
                        self.start_text(TextTarget::Status);
                    }
                }
            }
            PROPERTY_TAG => {
                if let Some(testsuite) = self.suites.last_mut() {
                    testsuite.properties.push(Property {
                        name: attr(e, "name")?.unwrap_or_default(),
                        value: attr(e, "value")?.unwrap_or_default(),
                    });
                }
            }
            SYSTEM_OUT_TAG | SYSTEM_ERR_TAG if !empty => {
                let out = tag == SYSTEM_OUT_TAG;
                let target = match (self.testcase.is_some(), out) {
                    (true, true) => TextTarget::CaseOut,
                    (true, false) => TextTarget::CaseErr,
                    (false, true) => TextTarget::SuiteOut,
                    (false, false) => TextTarget::SuiteErr,
                };
                self.start_text(target);
            }
            _ => {}
        }

        Ok(())
    }

    fn close(&mut self, tag: &[u8]) {
        match tag {
            TESTSUITE_TAG => {
                if let (Some(testsuite), Some(report)) = (self.suites.pop(), &mut self.report) {
                    report.add_testsuite(testsuite);
                }
            }
            TESTCASE_TAG => {
                if let (Some(testcase), Some(testsuite)) =
                    (self.testcase.take(), self.suites.last_mut())
                {
                    testsuite.add_testcase(testcase);
                }
            }
            FAILURE_TAG | ERROR_TAG | SKIPPED_TAG | SYSTEM_OUT_TAG | SYSTEM_ERR_TAG => {
                self.finish_text();
            }
            _ => {}
        }
    }

    fn start_text(&mut self, target: TextTarget) {
        self.text_target = Some(target);
        self.text = None;
    }

    fn text(&mut self, fragment: &str) {
        if self.text_target.is_some() {
            push_text(&mut self.text, fragment);
        }
    }

    fn finish_text(&mut self) {
        let (Some(target), Some(text)) = (self.text_target.take(), self.text.take()) else {
            return;
        };
        match target {
            TextTarget::Status => {
                if let Some(description) = self
                    .testcase
                    .as_mut()
                    .and_then(|testcase| testcase.status.description_mut())
                {
                    *description = Some(text);
                }
            }
            TextTarget::CaseOut | TextTarget::CaseErr => {
                if let Some(testcase) = &mut self.testcase {
                    let output = Some(Output::new(text));
                    match target {
                        TextTarget::CaseOut => testcase.system_out = output,
                        _ => testcase.system_err = output,
                    }
                }
            }
            TextTarget::SuiteOut | TextTarget::SuiteErr => {
                if let Some(testsuite) = self.suites.last_mut() {
                    let output = Some(Output::new(text));
                    match target {
                        TextTarget::SuiteOut => testsuite.system_out = output,
                        _ => testsuite.system_err = output,
                    }
                }
            }
        }
    }

    fn finish(self) -> Result<Report, ParseError> {
        self.report.ok_or(ParseError::MissingRoot {
            expected: EXPECTED_ROOT,
        })
    }
}
