// Copyright (c) The nextest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

#![warn(missing_docs)]

//! Read JUnit XML, TestNG XML and TAP test reports in Rust.
//!
//! Each format lives in its own module and exposes a plain data model plus a reader that turns the
//! text of one report file into that model. Timings and timestamps are kept as the strings found
//! in the report: different tools write them in different units, and consumers typically only
//! display them.

pub mod errors;
pub mod junit;
pub mod tap;
pub mod testng;
mod xml;

pub use errors::ParseError;

/// Output captured by a test run, with control characters that are not valid in XML 1.0
/// removed.
///
/// Tabs, line feeds and carriage returns are kept.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Output {
    output: Box<str>,
}

impl Output {
    /// Creates a new output, removing any non-printable characters from it.
    pub fn new(output: impl AsRef<str>) -> Self {
        let output = output
            .as_ref()
            .replace(
                |c| matches!(c, '\x00'..='\x08' | '\x0b' | '\x0c' | '\x0e'..='\x1f'),
                "",
            )
            .into_boxed_str();
        Self { output }
    }

    /// Returns the output.
    pub fn as_str(&self) -> &str {
        &self.output
    }

    /// Converts the output into a string.
    pub fn into_string(self) -> String {
        self.output.into_string()
    }
}

impl AsRef<str> for Output {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

impl From<Output> for String {
    fn from(output: Output) -> Self {
        output.into_string()
    }
}
