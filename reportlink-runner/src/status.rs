// Copyright (c) The nextest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Deriving a verdict for a report unit from its children.

use crate::{catalog::ExecutionStatus, unit::ChildOutcome};

/// Returns the first child whose status is set and differs from `pass_marker`.
///
/// Skipped, ignored and errored children count as failures.
pub fn first_failure<'a>(
    children: &'a [ChildOutcome],
    pass_marker: &str,
) -> Option<&'a ChildOutcome> {
    children.iter().find(|child| {
        let status = child.status.trim();
        !status.is_empty() && status != pass_marker
    })
}

/// Resolves a unit to [`ExecutionStatus::Failed`] if any child failed, and to
/// [`ExecutionStatus::Passed`] otherwise.
pub fn resolve_children(children: &[ChildOutcome], pass_marker: &str) -> ExecutionStatus {
    match first_failure(children, pass_marker) {
        Some(_) => ExecutionStatus::Failed,
        None => ExecutionStatus::Passed,
    }
}
