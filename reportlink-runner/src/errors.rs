// Copyright (c) The nextest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Errors produced by reportlink.

use camino::{Utf8Path, Utf8PathBuf};
use config::ConfigError;
use report_formats::ParseError;
use std::{error::Error as StdError, fmt};
use thiserror::Error;

/// An error that occurred while parsing the config.
#[derive(Debug, Error)]
#[error("failed to parse reportlink config at `{config_file}`")]
#[non_exhaustive]
pub struct ConfigParseError {
    config_file: Utf8PathBuf,
    #[source]
    kind: ConfigParseErrorKind,
}

impl ConfigParseError {
    pub(crate) fn new(config_file: impl Into<Utf8PathBuf>, kind: ConfigParseErrorKind) -> Self {
        Self {
            config_file: config_file.into(),
            kind,
        }
    }

    /// Returns the config file for this error.
    pub fn config_file(&self) -> &Utf8Path {
        &self.config_file
    }

    /// Returns the kind of error that occurred.
    pub fn kind(&self) -> &ConfigParseErrorKind {
        &self.kind
    }
}

/// The kind of a [`ConfigParseError`].
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ConfigParseErrorKind {
    /// An error occurred while building the config.
    #[error(transparent)]
    BuildError(Box<ConfigError>),

    /// An error occurred while deserializing the config.
    #[error(transparent)]
    DeserializeError(Box<serde_path_to_error::Error<ConfigError>>),
}

/// An error that occurred while reading the test case catalog.
#[derive(Debug, Error)]
pub enum CatalogReadError {
    /// The catalog file could not be read.
    #[error("failed to read test case catalog at `{path}`")]
    Read {
        /// The catalog path.
        path: Utf8PathBuf,

        /// The underlying error.
        #[source]
        error: std::io::Error,
    },

    /// The catalog file is not a valid catalog document.
    #[error("failed to parse test case catalog at `{path}`")]
    Parse {
        /// The catalog path.
        path: Utf8PathBuf,

        /// The underlying error.
        #[source]
        error: serde_path_to_error::Error<serde_json::Error>,
    },
}

/// A report file matched by a pattern could not be used.
///
/// This error is recoverable: the seeker logs it and moves on to the next file.
#[derive(Debug, Error)]
pub enum ReadReportError {
    /// The file could not be read.
    #[error("failed to read report `{path}`")]
    Io {
        /// The report path, relative to the scan root.
        path: Utf8PathBuf,

        /// The underlying error.
        #[source]
        error: std::io::Error,
    },

    /// The file could not be parsed in the expected format.
    #[error("failed to parse {format} report `{path}`")]
    Parse {
        /// The report format.
        format: &'static str,

        /// The report path, relative to the scan root.
        path: Utf8PathBuf,

        /// The underlying error.
        #[source]
        error: ParseError,
    },
}

impl ReadReportError {
    /// Returns the path of the report this error is about.
    pub fn path(&self) -> &Utf8Path {
        match self {
            Self::Io { path, .. } | Self::Parse { path, .. } => path,
        }
    }
}

/// A fatal error that aborts a seeker, and with it the whole reconciliation.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum SeekError {
    /// A directory under the scan root could not be read.
    #[error("failed to scan `{root}` for reports matching `{pattern}`")]
    ScanIo {
        /// The include pattern being resolved.
        pattern: String,

        /// The scan root.
        root: Utf8PathBuf,

        /// The underlying error.
        #[source]
        error: walkdir::Error,
    },

    /// The include pattern is not a valid glob.
    #[error("invalid include pattern `{pattern}`")]
    InvalidPattern {
        /// The include pattern.
        pattern: String,

        /// The underlying error.
        #[source]
        error: globset::Error,
    },

    /// An unexpected failure while processing reports.
    #[error("internal error while seeking reports matching `{pattern}`: {message}")]
    Internal {
        /// The include pattern being processed.
        pattern: String,

        /// What went wrong.
        message: String,
    },
}

impl SeekError {
    /// Returns the include pattern this error is about.
    pub fn pattern(&self) -> &str {
        match self {
            Self::ScanIo { pattern, .. }
            | Self::InvalidPattern { pattern, .. }
            | Self::Internal { pattern, .. } => pattern,
        }
    }
}

/// An error that occurred while writing the reconciliation output.
#[derive(Debug, Error)]
pub enum WriteOutputError {
    /// The output document could not be serialized.
    #[error("failed to serialize reconciliation output")]
    Serialize(#[source] serde_json::Error),

    /// The output file could not be written.
    #[error("failed to write reconciliation output to `{path}`")]
    Write {
        /// The output path.
        path: Utf8PathBuf,

        /// The underlying error.
        #[source]
        error: std::io::Error,
    },
}

/// An error that occurred while rendering the effective config.
#[derive(Debug, Error)]
#[error("failed to render config as TOML")]
pub struct ShowConfigError(#[source] pub(crate) toml::ser::Error);

/// Displays an error along with its chain of sources, separated by `: `.
#[derive(Clone, Copy, Debug)]
pub struct DisplayErrorChain<E> {
    error: E,
}

impl<E: StdError> DisplayErrorChain<E> {
    /// Creates a new `DisplayErrorChain`.
    pub fn new(error: E) -> Self {
        Self { error }
    }
}

impl<E: StdError> fmt::Display for DisplayErrorChain<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.error)?;
        let mut source = self.error.source();
        while let Some(error) = source {
            write!(f, ": {error}")?;
            source = error.source();
        }
        Ok(())
    }
}
