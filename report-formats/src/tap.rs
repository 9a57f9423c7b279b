// Copyright (c) The nextest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test Anything Protocol (TAP) streams.
//!
//! The reader is lenient: lines it does not understand are ignored, and test numbers are taken
//! as written. Only a malformed or repeated plan line is an error.

use crate::errors::ParseError;

/// A parsed TAP stream.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct TestSet {
    /// The version from a `TAP version N` line, if present.
    pub version: Option<u32>,

    /// The plan line, if present.
    pub plan: Option<Plan>,

    /// Test lines in stream order.
    pub test_results: Vec<TestResult>,

    /// `Bail out!` lines in stream order.
    pub bail_outs: Vec<BailOut>,

    /// Comment lines (`# ...`), without the leading `#`.
    pub comments: Vec<String>,
}

impl TestSet {
    /// Returns true if the producer gave up part way through the stream.
    pub fn bailed_out(&self) -> bool {
        !self.bail_outs.is_empty()
    }
}

/// A TAP plan: `first..last`, optionally with a skip reason for the whole set.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Plan {
    /// The first test number, normally 1.
    pub first: usize,

    /// The last test number. `1..0` declares an empty set.
    pub last: usize,

    /// The reason given in `1..0 # skip <reason>`.
    pub skip_reason: Option<String>,
}

/// A single `ok` or `not ok` line.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct TestResult {
    /// Whether the test passed.
    pub status: TestStatus,

    /// The test number, if written.
    pub number: Option<usize>,

    /// The description, with any leading `-` removed.
    pub description: String,

    /// A `# SKIP` or `# TODO` directive.
    pub directive: Option<Directive>,

    /// Lines of an indented YAMLish diagnostic block that followed this test.
    pub diagnostics: Vec<String>,
}

/// The status of a test line.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum TestStatus {
    /// `ok`
    Ok,
    /// `not ok`
    NotOk,
}

impl TestStatus {
    /// Returns the status as written in the stream.
    pub fn as_str(self) -> &'static str {
        match self {
            TestStatus::Ok => "ok",
            TestStatus::NotOk => "not ok",
        }
    }
}

/// A directive attached to a test line.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Directive {
    /// The kind of directive.
    pub kind: DirectiveKind,

    /// The text following the directive keyword, if any.
    pub reason: Option<String>,
}

/// The kind of a [`Directive`].
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum DirectiveKind {
    /// The test was skipped.
    Skip,
    /// The test is expected to fail.
    Todo,
}

/// A `Bail out!` line.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct BailOut {
    /// The reason given after `Bail out!`, if any.
    pub reason: Option<String>,
}

/// Reads a TAP stream.
pub fn parse_stream(input: &str) -> Result<TestSet, ParseError> {
    let mut set = TestSet::default();
    let mut in_yaml = false;

    for (index, line) in input.lines().enumerate() {
        let line_no = index + 1;
        let trimmed = line.trim();

        if in_yaml {
            if trimmed == "..." {
                in_yaml = false;
            } else if let Some(test) = set.test_results.last_mut() {
                test.diagnostics.push(trimmed.to_owned());
            }
            continue;
        }

        if trimmed.is_empty() {
            continue;
        }

        if trimmed == "---" && line.starts_with(char::is_whitespace) {
            in_yaml = !set.test_results.is_empty();
            continue;
        }

        if let Some(version) = strip_prefix_ignore_case(trimmed, "TAP version") {
            let version = version.trim();
            set.version = Some(version.parse().map_err(|_| {
                ParseError::tap(line_no, format!("invalid TAP version {version:?}"))
            })?);
            continue;
        }

        if let Some(reason) = strip_prefix_ignore_case(trimmed, "Bail out!") {
            set.bail_outs.push(BailOut {
                reason: non_empty(reason),
            });
            continue;
        }

        if let Some(comment) = trimmed.strip_prefix('#') {
            set.comments.push(comment.trim().to_owned());
            continue;
        }

        if trimmed.starts_with(|c: char| c.is_ascii_digit()) && trimmed.contains("..") {
            let plan = parse_plan(line_no, trimmed)?;
            if set.plan.is_some() {
                return Err(ParseError::tap(line_no, "more than one plan"));
            }
            set.plan = Some(plan);
            continue;
        }

        if let Some(test) = parse_test_line(trimmed) {
            set.test_results.push(test);
        }
    }

    if set.plan.is_none() && set.test_results.is_empty() {
        return Err(ParseError::EmptyTapStream);
    }

    Ok(set)
}

fn parse_plan(line_no: usize, line: &str) -> Result<Plan, ParseError> {
    let (range, comment) = split_comment(line);
    let invalid = || ParseError::tap(line_no, format!("invalid plan {line:?}"));
    let (first, last) = range.trim().split_once("..").ok_or_else(invalid)?;
    let first = first.parse().map_err(|_| invalid())?;
    let last = last.parse().map_err(|_| invalid())?;

    let skip_reason = comment.and_then(|comment| {
        let keyword_end = comment.find(char::is_whitespace).unwrap_or(comment.len());
        let (keyword, rest) = comment.split_at(keyword_end);
        keyword
            .to_ascii_lowercase()
            .starts_with("skip")
            .then(|| rest.trim().to_owned())
    });

    Ok(Plan {
        first,
        last,
        skip_reason,
    })
}

fn parse_test_line(line: &str) -> Option<TestResult> {
    let (status, rest) = if let Some(rest) = word_prefix(line, "not ok") {
        (TestStatus::NotOk, rest)
    } else {
        (TestStatus::Ok, word_prefix(line, "ok")?)
    };

    let rest = rest.trim_start();
    let digits = rest
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(rest.len());
    let (number, rest) = rest.split_at(digits);
    let number = number.parse().ok();

    let (description, comment) = split_comment(rest);
    let description = description.trim();
    let description = description
        .strip_prefix('-')
        .unwrap_or(description)
        .trim()
        .replace("\\#", "#");

    let directive = comment.and_then(parse_directive);
    let description = match (&directive, comment) {
        (None, Some(comment)) => format!("{description} # {comment}"),
        _ => description,
    };

    Some(TestResult {
        status,
        number,
        description,
        directive,
        diagnostics: Vec::new(),
    })
}

fn parse_directive(comment: &str) -> Option<Directive> {
    let keyword_end = comment.find(char::is_whitespace).unwrap_or(comment.len());
    let (keyword, rest) = comment.split_at(keyword_end);
    let keyword = keyword.to_ascii_lowercase();
    let kind = if keyword.starts_with("skip") {
        DirectiveKind::Skip
    } else if keyword.starts_with("todo") {
        DirectiveKind::Todo
    } else {
        return None;
    };
    Some(Directive {
        kind,
        reason: non_empty(rest),
    })
}

/// Splits a line at the first `#` that is not escaped as `\#`.
fn split_comment(line: &str) -> (&str, Option<&str>) {
    let mut prev = None;
    for (index, c) in line.char_indices() {
        if c == '#' && prev != Some('\\') {
            return (&line[..index], Some(line[index + 1..].trim()));
        }
        prev = Some(c);
    }
    (line, None)
}

/// Strips `word` from the start of `line` if it is followed by whitespace or the end of the line.
fn word_prefix<'a>(line: &'a str, word: &str) -> Option<&'a str> {
    let rest = line.strip_prefix(word)?;
    (rest.is_empty() || rest.starts_with(char::is_whitespace)).then_some(rest)
}

fn strip_prefix_ignore_case<'a>(line: &'a str, prefix: &str) -> Option<&'a str> {
    let head = line.get(..prefix.len())?;
    head.eq_ignore_ascii_case(prefix)
        .then(|| &line[prefix.len()..])
}

fn non_empty(text: &str) -> Option<String> {
    let text = text.trim();
    (!text.is_empty()).then(|| text.to_owned())
}

#[cfg(test)]
mod tests {
    use super::*;
    use indoc::indoc;
    use pretty_assertions::assert_eq;
    use test_case::test_case;

    #[test]
    fn parse_full_stream() {
        let input = indoc! {"
            TAP version 13
            1..4
            # starting
            ok 1 - Input file opened
            not ok 2 - First line of the input valid
              ---
              message: 'First line invalid'
              severity: fail
              ...
            ok 3 - Read the rest of the file # SKIP no file
            not ok 4 - Summarized correctly # TODO Not written yet
        "};

        let set = parse_stream(input).expect("stream parses");
        assert_eq!(set.version, Some(13));
        assert_eq!(
            set.plan,
            Some(Plan {
                first: 1,
                last: 4,
                skip_reason: None,
            })
        );
        assert_eq!(set.comments, vec!["starting".to_owned()]);
        assert!(!set.bailed_out());

        let summary: Vec<_> = set
            .test_results
            .iter()
            .map(|test| (test.number, test.status.as_str(), test.description.as_str()))
            .collect();
        assert_eq!(
            summary,
            vec![
                (Some(1), "ok", "Input file opened"),
                (Some(2), "not ok", "First line of the input valid"),
                (Some(3), "ok", "Read the rest of the file"),
                (Some(4), "not ok", "Summarized correctly"),
            ]
        );
        assert_eq!(
            set.test_results[1].diagnostics,
            vec![
                "message: 'First line invalid'".to_owned(),
                "severity: fail".to_owned(),
            ]
        );
        assert_eq!(
            set.test_results[2].directive,
            Some(Directive {
                kind: DirectiveKind::Skip,
                reason: Some("no file".to_owned()),
            })
        );
        assert_eq!(
            set.test_results[3].directive.as_ref().map(|d| d.kind),
            Some(DirectiveKind::Todo)
        );
    }

    #[test]
    fn parse_bail_out_and_trailing_plan() {
        let input = indoc! {"
            ok
            ok 2 escaped \\# hash
            Bail out! database unreachable
            1..5
        "};

        let set = parse_stream(input).expect("stream parses");
        assert!(set.bailed_out());
        assert_eq!(
            set.bail_outs[0].reason.as_deref(),
            Some("database unreachable")
        );
        assert_eq!(set.plan.as_ref().map(|plan| plan.last), Some(5));
        assert_eq!(set.test_results[0].number, None);
        assert_eq!(set.test_results[0].description, "");
        assert_eq!(set.test_results[1].description, "escaped # hash");
    }

    #[test]
    fn parse_skipped_plan() {
        let set = parse_stream("1..0 # Skipped: no database\n").expect("stream parses");
        assert_eq!(
            set.plan,
            Some(Plan {
                first: 1,
                last: 0,
                skip_reason: Some("no database".to_owned()),
            })
        );
        assert!(set.test_results.is_empty());
    }

    #[test_case("1..x" ; "non-numeric plan")]
    #[test_case("1..2\n1..2" ; "repeated plan")]
    #[test_case("TAP version thirteen\n1..1" ; "bad version")]
    fn reject_malformed(input: &str) {
        let err = parse_stream(input).expect_err("stream is rejected");
        assert!(matches!(err, ParseError::Tap { .. }), "{err:?}");
    }

    #[test_case("" ; "empty")]
    #[test_case("hello world\n# just a comment" ; "no tests")]
    fn reject_empty(input: &str) {
        assert!(matches!(
            parse_stream(input),
            Err(ParseError::EmptyTapStream)
        ));
    }
}
