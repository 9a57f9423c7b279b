// Copyright (c) The nextest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! TestNG `testng-results.xml` reports.
//!
//! The document is a strict hierarchy: `<testng-results>` contains `<suite>` elements, which
//! contain `<test>` elements, which contain `<class>` elements, which contain `<test-method>`
//! elements. Attribute values are passed through as strings.

use crate::{
    errors::ParseError,
    xml::{self, attr, count_attr, push_text},
};
use quick_xml::events::{BytesStart, Event};

const RESULTS_TAG: &[u8] = b"testng-results";
const SUITE_TAG: &[u8] = b"suite";
const TEST_TAG: &[u8] = b"test";
const CLASS_TAG: &[u8] = b"class";
const TEST_METHOD_TAG: &[u8] = b"test-method";
const EXCEPTION_TAG: &[u8] = b"exception";
const MESSAGE_TAG: &[u8] = b"message";
const FULL_STACKTRACE_TAG: &[u8] = b"full-stacktrace";
const PARAM_TAG: &[u8] = b"param";
const VALUE_TAG: &[u8] = b"value";

const EXPECTED_ROOT: &str = "testng-results";

/// The root of a TestNG results document.
#[derive(Clone, Debug, Default)]
pub struct TestngResults {
    /// The total number of test methods, as declared by the `total` attribute.
    pub total: Option<usize>,

    /// The number of passed test methods, as declared by the `passed` attribute.
    pub passed: Option<usize>,

    /// The number of failed test methods, as declared by the `failed` attribute.
    pub failed: Option<usize>,

    /// The number of skipped test methods, as declared by the `skipped` attribute.
    pub skipped: Option<usize>,

    /// The suites in document order.
    pub suites: Vec<Suite>,
}

/// Shared timing attributes carried by suites, tests and methods.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct Timings {
    /// The `duration-ms` attribute.
    pub duration_ms: Option<String>,

    /// The `started-at` attribute.
    pub started_at: Option<String>,

    /// The `finished-at` attribute.
    pub finished_at: Option<String>,
}

impl Timings {
    fn from_element(e: &BytesStart<'_>) -> Result<Self, ParseError> {
        Ok(Self {
            duration_ms: attr(e, "duration-ms")?,
            started_at: attr(e, "started-at")?,
            finished_at: attr(e, "finished-at")?,
        })
    }
}

/// A `<suite>` element.
#[derive(Clone, Debug, Default)]
pub struct Suite {
    /// The suite name.
    pub name: String,

    /// Timing attributes of the suite.
    pub timings: Timings,

    /// The tests in this suite.
    pub tests: Vec<Test>,
}

impl Suite {
    /// Iterates over every test method of this suite, across all tests and classes.
    pub fn test_methods(&self) -> impl Iterator<Item = &TestMethod> {
        self.tests
            .iter()
            .flat_map(|test| test.classes.iter())
            .flat_map(|class| class.test_methods.iter())
    }
}

/// A `<test>` element.
#[derive(Clone, Debug, Default)]
pub struct Test {
    /// The test name.
    pub name: String,

    /// Timing attributes of the test.
    pub timings: Timings,

    /// The classes in this test.
    pub classes: Vec<Class>,
}

/// A `<class>` element.
#[derive(Clone, Debug, Default)]
pub struct Class {
    /// The fully qualified class name.
    pub name: String,

    /// The test methods of this class, configuration methods included.
    pub test_methods: Vec<TestMethod>,
}

/// A `<test-method>` element.
#[derive(Clone, Debug, Default)]
pub struct TestMethod {
    /// The method name.
    pub name: String,

    /// The status, usually `PASS`, `FAIL` or `SKIP`.
    pub status: String,

    /// The method signature.
    pub signature: Option<String>,

    /// Whether this is a configuration method (`@BeforeClass` and friends).
    pub is_config: bool,

    /// Timing attributes of the method.
    pub timings: Timings,

    /// The method description.
    pub description: Option<String>,

    /// The exception thrown by the method, if any.
    pub exception: Option<Exception>,

    /// Parameter values, in index order.
    pub params: Vec<String>,
}

/// An `<exception>` element within a test method.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct Exception {
    /// The exception class.
    pub class: Option<String>,

    /// The exception message.
    pub message: Option<String>,

    /// The full stack trace.
    pub full_stacktrace: Option<String>,
}

/// Reads a TestNG results document from its XML text.
pub fn parse_results(xml: &str) -> Result<TestngResults, ParseError> {
    let mut reader = xml::reader(xml);
    let mut state = TestngReader::default();

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

    state.results.ok_or(ParseError::MissingRoot {
        expected: EXPECTED_ROOT,
    })
}

#[derive(Clone, Copy, Debug)]
enum TextTarget {
    Message,
    Stacktrace,
    Param,
}

#[derive(Debug, Default)]
struct TestngReader {
    results: Option<TestngResults>,
    method: Option<TestMethod>,
    text_target: Option<TextTarget>,
    text: Option<String>,
}

impl TestngReader {
    fn open(&mut self, e: &BytesStart<'_>, empty: bool) -> Result<(), ParseError> {
        let name = e.name();
        let tag = name.as_ref();

        if self.results.is_none() {
            if tag != RESULTS_TAG {
                return Err(ParseError::UnexpectedRoot {
                    found: xml::element_name(e),
                    expected: EXPECTED_ROOT,
                });
            }
            self.results = Some(TestngResults {
                total: count_attr(e, "testng-results", "total")?,
                passed: count_attr(e, "testng-results", "passed")?,
                failed: count_attr(e, "testng-results", "failed")?,
                skipped: count_attr(e, "testng-results", "skipped")?,
                suites: Vec::new(),
            });
            return Ok(());
        }
        let Some(results) = self.results.as_mut() else {
            return Ok(());
        };

        match tag {
            SUITE_TAG => results.suites.push(Suite {
                name: attr(e, "name")?.unwrap_or_default(),
                timings: Timings::from_element(e)?,
                tests: Vec::new(),
            }),
            TEST_TAG => {
                if let Some(suite) = results.suites.last_mut() {
                    suite.tests.push(Test {
                        name: attr(e, "name")?.unwrap_or_default(),
                        timings: Timings::from_element(e)?,
                        classes: Vec::new(),
                    });
                }
            }
            CLASS_TAG => {
                if let Some(test) = results
                    .suites
                    .last_mut()
                    .and_then(|suite| suite.tests.last_mut())
                {
                    test.classes.push(Class {
                        name: attr(e, "name")?.unwrap_or_default(),
                        test_methods: Vec::new(),
                    });
                }
            }
            TEST_METHOD_TAG => {
                let is_config = attr(e, "is-config")?
                    .is_some_and(|value| value.trim().eq_ignore_ascii_case("true"));
                self.method = Some(TestMethod {
                    name: attr(e, "name")?.unwrap_or_default(),
                    status: attr(e, "status")?.unwrap_or_default(),
                    signature: attr(e, "signature")?,
                    is_config,
                    timings: Timings::from_element(e)?,
                    description: attr(e, "description")?,
                    exception: None,
                    params: Vec::new(),
                });
                if empty {
                    self.close(TEST_METHOD_TAG);
                }
            }
            EXCEPTION_TAG => {
                if let Some(method) = &mut self.method {
                    method.exception = Some(Exception {
                        class: attr(e, "class")?,
                        ..Default::default()
                    });
                }
            }
            MESSAGE_TAG if !empty => self.start_text(TextTarget::Message),
            FULL_STACKTRACE_TAG if !empty => self.start_text(TextTarget::Stacktrace),
            VALUE_TAG if !empty => self.start_text(TextTarget::Param),
            PARAM_TAG if empty => {
                if let Some(method) = &mut self.method {
                    method.params.push(String::new());
                }
            }
            _ => {}
        }

        Ok(())
    }

    fn close(&mut self, tag: &[u8]) {
        match tag {
            TEST_METHOD_TAG => {
                let Some(method) = self.method.take() else {
                    return;
                };
                if let Some(class) = self
                    .results
                    .as_mut()
                    .and_then(|results| results.suites.last_mut())
                    .and_then(|suite| suite.tests.last_mut())
                    .and_then(|test| test.classes.last_mut())
                {
                    class.test_methods.push(method);
                }
            }
            MESSAGE_TAG | FULL_STACKTRACE_TAG | VALUE_TAG => self.finish_text(),
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
        let Some(target) = self.text_target.take() else {
            return;
        };
        let text = self.text.take();
        let Some(method) = &mut self.method else {
            return;
        };
        match target {
            TextTarget::Message => {
                if let Some(exception) = &mut method.exception {
                    exception.message = text;
                }
            }
            TextTarget::Stacktrace => {
                if let Some(exception) = &mut method.exception {
                    exception.full_stacktrace = text;
                }
            }
            TextTarget::Param => method.params.push(text.unwrap_or_default()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use indoc::indoc;
    use pretty_assertions::assert_eq;

    static RESULTS: &str = indoc! {r#"
        <?xml version="1.0" encoding="UTF-8"?>
        <testng-results skipped="0" failed="1" total="3" passed="2">
          <reporter-output>
          </reporter-output>
          <suite name="Nightly" duration-ms="120" started-at="2012-01-01T10:00:00Z" finished-at="2012-01-01T10:00:01Z">
            <groups>
            </groups>
            <test name="Regression" duration-ms="110">
              <class name="com.acme.FooTest">
                <test-method status="PASS" signature="setUp()[pri:0, instance:com.acme.FooTest@1]" name="setUp" is-config="true" duration-ms="1"/>
                <test-method status="PASS" signature="testA()" name="testA" duration-ms="10" description="adds">
                  <params>
                    <param index="0">
                      <value><![CDATA[42]]></value>
                    </param>
                  </params>
                </test-method>
                <test-method status="FAIL" signature="testB()" name="testB" duration-ms="20">
                  <exception class="java.lang.AssertionError">
                    <message><![CDATA[expected [1] but found [2]]]></message>
                    <full-stacktrace><![CDATA[java.lang.AssertionError: expected [1] but found [2]
        at com.acme.FooTest.testB(FooTest.java:20)]]></full-stacktrace>
                  </exception>
                  <reporter-output>
                  </reporter-output>
                </test-method>
              </class>
            </test>
          </suite>
        </testng-results>
    "#};

    #[test]
    fn parse_nested_results() {
        let results = parse_results(RESULTS).expect("results parse");
        assert_eq!(results.total, Some(3));
        assert_eq!(results.failed, Some(1));
        assert_eq!(results.suites.len(), 1);

        let suite = &results.suites[0];
        assert_eq!(suite.name, "Nightly");
        assert_eq!(suite.timings.duration_ms.as_deref(), Some("120"));
        assert_eq!(
            suite.timings.started_at.as_deref(),
            Some("2012-01-01T10:00:00Z")
        );
        assert_eq!(suite.tests[0].name, "Regression");
        assert_eq!(suite.tests[0].classes[0].name, "com.acme.FooTest");

        let methods: Vec<_> = suite
            .test_methods()
            .map(|method| (method.name.as_str(), method.status.as_str(), method.is_config))
            .collect();
        assert_eq!(
            methods,
            vec![
                ("setUp", "PASS", true),
                ("testA", "PASS", false),
                ("testB", "FAIL", false),
            ]
        );

        let test_a = &suite.tests[0].classes[0].test_methods[1];
        assert_eq!(test_a.description.as_deref(), Some("adds"));
        assert_eq!(test_a.params, vec!["42".to_owned()]);

        let exception = suite.tests[0].classes[0].test_methods[2]
            .exception
            .as_ref()
            .expect("testB has an exception");
        assert_eq!(exception.class.as_deref(), Some("java.lang.AssertionError"));
        assert_eq!(
            exception.message.as_deref(),
            Some("expected [1] but found [2]")
        );
        assert!(
            exception
                .full_stacktrace
                .as_deref()
                .is_some_and(|trace| trace.contains("FooTest.java:20"))
        );
    }

    #[test]
    fn reject_junit_document() {
        let err = parse_results("<testsuite name=\"a\"/>").expect_err("junit root is rejected");
        assert!(matches!(err, ParseError::UnexpectedRoot { .. }), "{err:?}");
    }

    #[test]
    fn reject_bad_count() {
        let err = parse_results("<testng-results total=\"many\"/>").expect_err("bad count");
        assert!(
            matches!(err, ParseError::InvalidCount { attr: "total", .. }),
            "{err:?}"
        );
    }
}
