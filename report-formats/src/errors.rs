// Copyright (c) The nextest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Errors produced while reading reports.

use thiserror::Error;

/// An error that occurs while reading a single report.
///
/// Returned by [`junit::parse_report`](crate::junit::parse_report),
/// [`testng::parse_results`](crate::testng::parse_results) and
/// [`tap::parse_stream`](crate::tap::parse_stream).
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ParseError {
    /// The document is not well-formed XML.
    #[error("malformed XML document")]
    Xml {
        /// The underlying reader error.
        #[from]
        err: quick_xml::Error,
    },

    /// The document ended before the expected root element was seen.
    #[error("no `{expected}` element found")]
    MissingRoot {
        /// The root element (or elements) that were expected.
        expected: &'static str,
    },

    /// The document has a root element that doesn't belong to this format.
    #[error("unexpected root element `{found}` (expected `{expected}`)")]
    UnexpectedRoot {
        /// The root element that was found.
        found: String,

        /// The root element (or elements) that were expected.
        expected: &'static str,
    },

    /// A numeric attribute could not be parsed.
    #[error("attribute `{attr}` on `{element}` is not a valid count: {value:?}")]
    InvalidCount {
        /// The element the attribute is on.
        element: &'static str,

        /// The attribute name.
        attr: &'static str,

        /// The value found.
        value: String,
    },

    /// A line of a TAP stream could not be understood.
    #[error("line {line}: {message}")]
    Tap {
        /// The 1-based line number.
        line: usize,

        /// What went wrong.
        message: String,
    },

    /// A TAP stream contained neither a plan nor any test lines.
    #[error("stream contains no TAP plan or test lines")]
    EmptyTapStream,
}

impl ParseError {
    pub(crate) fn tap(line: usize, message: impl Into<String>) -> Self {
        Self::Tap {
            line,
            message: message.into(),
        }
    }
}
