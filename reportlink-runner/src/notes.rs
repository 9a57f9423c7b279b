// Copyright (c) The nextest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Human-readable notes describing the evidence behind a result.

use crate::{
    catalog::ExecutionStatus,
    unit::{ChildOutcome, ReportUnit, UnitTimings},
};
use camino::Utf8Path;
use swrite::{SWrite, swrite};

/// Renders the notes for one matched unit.
///
/// The output is a header describing the unit and its enclosing element, followed by one line
/// per child. It always ends with a newline, so notes from several units can be concatenated.
pub fn render_unit_notes(format_name: &str, unit: &ReportUnit, status: ExecutionStatus) -> String {
    let mut out = String::new();
    swrite!(out, "{format_name} {} {}: {status}\n", unit.kind, unit.name);
    swrite!(out, "  report: {}\n", unit.source);

    let timings = timing_parts(&unit.timings);
    if !timings.is_empty() {
        swrite!(out, "  {}\n", timings.join(", "));
    }

    if let Some(container) = &unit.container {
        swrite!(out, "  in {} {}", container.kind, container.name);
        let timings = timing_parts(&container.timings);
        if !timings.is_empty() {
            swrite!(out, " ({})", timings.join(", "));
        }
        swrite!(out, ", {} {}\n", container.child_count, unit.child_label);
    }

    if let Some(reason) = &unit.bail_out {
        if reason.is_empty() {
            out.push_str("  bailed out\n");
        } else {
            swrite!(out, "  bailed out: {reason}\n");
        }
    }

    if let Some(reason) = &unit.skip_reason {
        if reason.is_empty() {
            out.push_str("  skipped by plan\n");
        } else {
            swrite!(out, "  skipped by plan: {reason}\n");
        }
    }

    swrite!(out, "  {} {}:\n", unit.children.len(), unit.child_label);
    for child in &unit.children {
        render_child(&mut out, child);
    }

    out
}

/// Renders the line recorded in place of an attachment that could not be read.
pub fn attachment_failure_note(path: &Utf8Path, error: &std::io::Error) -> String {
    format!("  could not attach report {path}: {error}\n")
}

fn render_child(out: &mut String, child: &ChildOutcome) {
    let status = child.status.trim();
    let status = if status.is_empty() {
        "(no status)"
    } else {
        status
    };
    swrite!(out, "  - {}: {status}", child.name);

    let mut details = timing_parts(&child.timings);
    if child.is_config == Some(true) {
        details.push("configuration method".to_owned());
    }
    if let Some(signature) = &child.signature {
        details.push(format!("signature: {signature}"));
    }
    if !details.is_empty() {
        swrite!(out, ", {}", details.join(", "));
    }
    if let Some(message) = &child.message {
        // Multi-line messages (stack traces) are cut to their first line.
        let first_line = message.lines().next().unwrap_or_default().trim();
        if !first_line.is_empty() {
            swrite!(out, " ({first_line})");
        }
    }
    out.push('\n');
}

fn timing_parts(timings: &UnitTimings) -> Vec<String> {
    let mut parts = Vec::new();
    if let Some(duration) = &timings.duration {
        parts.push(format!("duration: {duration}"));
    }
    if let Some(started_at) = &timings.started_at {
        parts.push(format!("started: {started_at}"));
    }
    if let Some(finished_at) = &timings.finished_at {
        parts.push(format!("finished: {finished_at}"));
    }
    parts
}
