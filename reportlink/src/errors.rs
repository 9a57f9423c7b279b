// Copyright (c) The nextest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use crate::output::{NO_HEADING_TARGET, StderrStyles};
use owo_colors::OwoColorize;
use reportlink_runner::errors::{
    CatalogReadError, ConfigParseError, ConfigParseErrorKind, SeekError, ShowConfigError,
    WriteOutputError,
};
use std::error::Error;
use thiserror::Error;
use tracing::error;

pub(crate) type Result<T, E = ExpectedError> = std::result::Result<T, E>;

/// Documented exit codes for `reportlink` runs.
///
/// Unknown or unexpected failures always result in exit code 1.
pub enum ReportlinkExitCode {}

impl ReportlinkExitCode {
    /// Every matched test case passed, or nothing matched.
    pub const OK: i32 = 0;

    /// Some matched test cases failed.
    pub const UNSTABLE: i32 = 4;

    /// Some matched test cases failed, and `failed-tests-mark-failure` is set.
    pub const FAILURE: i32 = 5;

    /// Scanning for reports failed.
    pub const SEEK_FAILED: i32 = 104;

    /// Writing the reconciliation output failed.
    pub const WRITE_OUTPUT_ERROR: i32 = 110;

    /// A user issue happened while setting up a run: bad config, catalog or arguments.
    pub const SETUP_ERROR: i32 = 96;
}

// The #[error()] strings are placeholders: errors are meant to be printed with display_to_stderr,
// which colorizes them.

/// An error that `reportlink` knows how to report.
#[derive(Debug, Error)]
#[doc(hidden)]
pub enum ExpectedError {
    #[error("config parse error")]
    ConfigParseError {
        #[from]
        err: ConfigParseError,
    },
    #[error("key custom field not set")]
    KeyFieldMissing,
    #[error("catalog read error")]
    CatalogReadError {
        #[from]
        err: CatalogReadError,
    },
    #[error("seek error")]
    SeekError {
        #[from]
        err: SeekError,
    },
    #[error("write output error")]
    WriteOutputError {
        #[from]
        err: WriteOutputError,
    },
    #[error("show config error")]
    ShowConfigError {
        #[from]
        err: ShowConfigError,
    },
    #[error("error writing to stdout")]
    StdoutWriteError {
        #[source]
        err: std::io::Error,
    },
}

impl ExpectedError {
    /// Returns the exit code for the process.
    pub fn process_exit_code(&self) -> i32 {
        match self {
            Self::ConfigParseError { .. }
            | Self::KeyFieldMissing
            | Self::CatalogReadError { .. }
            | Self::ShowConfigError { .. } => ReportlinkExitCode::SETUP_ERROR,
            Self::SeekError { .. } => ReportlinkExitCode::SEEK_FAILED,
            Self::WriteOutputError { .. } | Self::StdoutWriteError { .. } => {
                ReportlinkExitCode::WRITE_OUTPUT_ERROR
            }
        }
    }

    /// Displays this error to stderr.
    pub fn display_to_stderr(&self, styles: &StderrStyles) {
        let mut next_error = match self {
            Self::ConfigParseError { err } => {
                error!(
                    "failed to parse config at `{}`",
                    err.config_file().style(styles.bold)
                );
                match err.kind() {
                    ConfigParseErrorKind::BuildError(err) => Some(&**err as &dyn Error),
                    ConfigParseErrorKind::DeserializeError(err) => Some(&**err as &dyn Error),
                    _ => err.source(),
                }
            }
            Self::KeyFieldMissing => {
                error!(
                    "no key custom field set: pass {} or set {} in {}",
                    "--key-field".style(styles.bold),
                    "key-custom-field".style(styles.bold),
                    ".config/reportlink.toml".style(styles.bold),
                );
                None
            }
            Self::CatalogReadError { err } => {
                error!("{err}");
                err.source()
            }
            Self::SeekError { err } => {
                error!("{err}");
                err.source()
            }
            Self::WriteOutputError { err } => {
                error!("{err}");
                err.source()
            }
            Self::ShowConfigError { err } => {
                error!("{err}");
                err.source()
            }
            Self::StdoutWriteError { err } => {
                error!("failed to write to stdout");
                Some(err as &dyn Error)
            }
        };

        while let Some(err) = next_error {
            error!(target: NO_HEADING_TARGET, "\nCaused by:\n  {}", err);
            next_error = err.source();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exit_codes() {
        assert_eq!(
            ExpectedError::KeyFieldMissing.process_exit_code(),
            ReportlinkExitCode::SETUP_ERROR
        );
        let err = ExpectedError::StdoutWriteError {
            err: std::io::Error::new(std::io::ErrorKind::BrokenPipe, "closed"),
        };
        assert_eq!(
            err.process_exit_code(),
            ReportlinkExitCode::WRITE_OUTPUT_ERROR
        );
    }
}
