// Copyright (c) The nextest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

#![warn(missing_docs)]

//! Core functionality for reportlink.
//!
//! reportlink reconciles automated test reports (JUnit XML, TestNG XML and TAP) with the test
//! cases of a test-management system. Each test case names, in a designated "key" custom field,
//! the suites, classes, tests or TAP files that provide evidence for it.
//!
//! The flow of a run:
//!
//! 1. [`scan`] resolves an include pattern to a sorted list of report files.
//! 2. A [`seeker::ReportFormat`] parses each file into normalized [`unit::ReportUnit`]s.
//! 3. [`matcher::KeyMatcher`] pairs units with test cases whose key tokens equal the unit name.
//! 4. [`status`] derives the verdict of a unit from its children, and [`notes`] describes it.
//! 5. [`result::ResultMap`] merges everything per test case.
//! 6. [`reconcile::Reconciler`] runs every seeker in a fixed order and merges their maps.

pub mod catalog;
pub mod config;
pub mod errors;
pub mod matcher;
pub mod notes;
pub mod reconcile;
pub mod result;
pub mod scan;
pub mod seeker;
pub mod status;
pub mod unit;
