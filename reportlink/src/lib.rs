// Copyright (c) The nextest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Command-line front end for reportlink.
//!
//! `reportlink run` matches JUnit, TestNG and TAP reports against a test case catalog and writes
//! the merged results as JSON. `reportlink show-config` prints the effective configuration.
//!
//! For the engine itself, see the `reportlink-runner` crate.

#![warn(missing_docs)]

mod dispatch;
mod errors;
mod output;

#[doc(hidden)]
pub use dispatch::*;
#[doc(hidden)]
pub use errors::*;
#[doc(hidden)]
pub use output::{Color, OutputContext, StderrStyles};
