// Copyright (c) The nextest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Aggregated results per test case.

use crate::catalog::{ExecutionStatus, TestCaseDefinition, TestCaseId};
use camino::{Utf8Path, Utf8PathBuf};
use indexmap::{IndexMap, map::Entry};
use serde::Serialize;
use std::collections::BTreeSet;

/// A report file attached to a result.
#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct Attachment {
    /// The file name, without directories.
    pub file_name: String,

    /// The attachment title.
    pub title: String,

    /// A short description of the attachment.
    pub description: String,

    /// The MIME type of the content.
    pub mime_type: &'static str,

    /// The path of the report, relative to the scan root.
    pub path: Utf8PathBuf,

    /// The size of the content in bytes.
    pub size: usize,

    /// The file content.
    #[serde(skip)]
    pub content: Vec<u8>,
}

impl Attachment {
    /// Reads the report at `root`/`relative` into an attachment.
    pub fn from_report_file(
        root: &Utf8Path,
        relative: &Utf8Path,
        format_name: &str,
        mime_type: &'static str,
    ) -> std::io::Result<Self> {
        let content = std::fs::read(root.join(relative))?;
        let file_name = relative.file_name().unwrap_or(relative.as_str()).to_owned();
        Ok(Self {
            title: file_name.clone(),
            description: format!("{format_name} report {relative}"),
            file_name,
            mime_type,
            path: relative.to_owned(),
            size: content.len(),
            content,
        })
    }
}

/// The accumulated result for one test case.
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct ResultWrapper {
    test_case: TestCaseDefinition,
    key_tokens: Vec<String>,
    statuses: IndexMap<String, ExecutionStatus>,
    notes: String,
    attachments: Vec<Attachment>,
    #[serde(skip_serializing_if = "Option::is_none")]
    platform: Option<String>,
}

impl ResultWrapper {
    /// Creates an empty result for a test case with the given key tokens.
    pub fn new(test_case: TestCaseDefinition, key_tokens: Vec<String>) -> Self {
        Self {
            test_case,
            key_tokens,
            statuses: IndexMap::new(),
            notes: String::new(),
            attachments: Vec::new(),
            platform: None,
        }
    }

    /// Returns the test case id.
    pub fn id(&self) -> TestCaseId {
        self.test_case.id
    }

    /// Returns the test case this result is for.
    pub fn test_case(&self) -> &TestCaseDefinition {
        &self.test_case
    }

    /// Returns the tokens of the test case's key field.
    pub fn key_tokens(&self) -> &[String] {
        &self.key_tokens
    }

    /// Returns the status recorded for each matched token, in the order tokens were first matched.
    pub fn statuses(&self) -> &IndexMap<String, ExecutionStatus> {
        &self.statuses
    }

    /// Returns the status recorded for a token.
    pub fn status_for(&self, token: &str) -> Option<ExecutionStatus> {
        self.statuses.get(token).copied()
    }

    /// Records the status for a token, replacing any earlier status for it.
    pub fn set_status(&mut self, token: impl Into<String>, status: ExecutionStatus) {
        self.statuses.insert(token.into(), status);
    }

    /// Returns the accumulated notes.
    pub fn notes(&self) -> &str {
        &self.notes
    }

    /// Appends text to the notes.
    pub fn append_notes(&mut self, notes: &str) {
        self.notes.push_str(notes);
    }

    /// Returns the accumulated attachments.
    pub fn attachments(&self) -> &[Attachment] {
        &self.attachments
    }

    /// Adds an attachment.
    pub fn add_attachment(&mut self, attachment: Attachment) {
        self.attachments.push(attachment);
    }

    /// Returns the platform the result should be recorded against, if overridden.
    pub fn platform(&self) -> Option<&str> {
        self.platform.as_deref()
    }

    /// Sets the platform the result should be recorded against.
    pub fn set_platform(&mut self, platform: impl Into<String>) {
        self.platform = Some(platform.into());
    }

    /// Returns the overall status of the test case.
    ///
    /// * [`ExecutionStatus::Failed`] if any token failed.
    /// * Otherwise [`ExecutionStatus::Blocked`] if any token is blocked.
    /// * Otherwise [`ExecutionStatus::Passed`] if every distinct key token passed.
    /// * Otherwise [`ExecutionStatus::NotRun`]: some identifiers have no evidence yet.
    pub fn execution_status(&self) -> ExecutionStatus {
        let has = |wanted: ExecutionStatus| {
            self.statuses.values().any(|status| *status == wanted)
        };
        if has(ExecutionStatus::Failed) {
            return ExecutionStatus::Failed;
        }
        if has(ExecutionStatus::Blocked) {
            return ExecutionStatus::Blocked;
        }

        let distinct: BTreeSet<&str> = self.key_tokens.iter().map(String::as_str).collect();
        let all_passed = !distinct.is_empty()
            && distinct
                .iter()
                .all(|token| self.status_for(token) == Some(ExecutionStatus::Passed));
        if all_passed {
            ExecutionStatus::Passed
        } else {
            ExecutionStatus::NotRun
        }
    }

    fn merge_from(&mut self, other: ResultWrapper) {
        self.notes.push_str(&other.notes);
        self.attachments.extend(other.attachments);
        self.statuses.extend(other.statuses);
        if other.platform.is_some() {
            self.platform = other.platform;
        }
    }
}

/// Results keyed by test case id, in the order test cases were first matched.
#[derive(Clone, Debug, Default)]
pub struct ResultMap {
    results: IndexMap<TestCaseId, ResultWrapper>,
}

impl ResultMap {
    /// Creates an empty map.
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a result, or merges it into the existing result for the same test case.
    ///
    /// Merging appends notes and attachments, and overwrites the status of every token the
    /// candidate carries. Tokens only present in the existing result keep their status.
    pub fn add_or_update(&mut self, candidate: ResultWrapper) {
        match self.results.entry(candidate.id()) {
            Entry::Occupied(mut entry) => entry.get_mut().merge_from(candidate),
            Entry::Vacant(entry) => {
                entry.insert(candidate);
            }
        }
    }

    /// Merges every result of `other` into this map, in `other`'s order.
    pub fn merge(&mut self, other: ResultMap) {
        for wrapper in other.results.into_values() {
            self.add_or_update(wrapper);
        }
    }

    /// Sets the platform of every result.
    pub fn set_platform(&mut self, platform: &str) {
        for wrapper in self.results.values_mut() {
            wrapper.set_platform(platform);
        }
    }

    /// Returns the result for a test case.
    pub fn get(&self, id: TestCaseId) -> Option<&ResultWrapper> {
        self.results.get(&id)
    }

    /// Iterates over results in insertion order.
    pub fn iter(&self) -> impl ExactSizeIterator<Item = &ResultWrapper> {
        self.results.values()
    }

    /// Returns the number of results.
    pub fn len(&self) -> usize {
        self.results.len()
    }

    /// Returns true if there are no results.
    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }
}

impl IntoIterator for ResultMap {
    type Item = ResultWrapper;
    type IntoIter = indexmap::map::IntoValues<TestCaseId, ResultWrapper>;

    fn into_iter(self) -> Self::IntoIter {
        self.results.into_values()
    }
}
