// Copyright (c) The nextest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Matching report units to test cases through the key custom field.

use crate::catalog::{ExecutionStatus, TestCaseDefinition};

/// Splits a comma-separated list into trimmed, non-empty tokens, preserving order and repeats.
pub fn split_tokens(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .map(str::to_owned)
        .collect()
}

/// Matches report unit identifiers against the tokens of a designated custom field.
#[derive(Clone, Debug)]
pub struct KeyMatcher {
    key_field: String,
}

impl KeyMatcher {
    /// Creates a matcher for the custom field named `key_field`.
    pub fn new(key_field: impl Into<String>) -> Self {
        Self {
            key_field: key_field.into(),
        }
    }

    /// Returns the name of the key custom field.
    pub fn key_field(&self) -> &str {
        &self.key_field
    }

    /// Returns the identifiers listed in the test case's key field.
    ///
    /// Returns `None` if the field is missing or has no tokens; such a test case never matches.
    /// If several fields share the key name, the first one is used.
    pub fn key_tokens(&self, test_case: &TestCaseDefinition) -> Option<Vec<String>> {
        let field = test_case.custom_field(&self.key_field)?;
        let tokens = split_tokens(&field.value);
        (!tokens.is_empty()).then_some(tokens)
    }

    /// Returns the test cases that can be matched, paired with their key tokens.
    ///
    /// Blocked test cases and test cases without key tokens are left out.
    pub fn candidates<'a>(
        &self,
        test_cases: &'a [TestCaseDefinition],
    ) -> Vec<MatchCandidate<'a>> {
        test_cases
            .iter()
            .filter(|test_case| test_case.execution_status != ExecutionStatus::Blocked)
            .filter_map(|test_case| {
                let key_tokens = self.key_tokens(test_case)?;
                Some(MatchCandidate {
                    test_case,
                    key_tokens,
                })
            })
            .collect()
    }

    /// Returns every token of the test case equal to `identifier`, in order and with repeats.
    ///
    /// A blocked test case never matches.
    pub fn matches(&self, test_case: &TestCaseDefinition, identifier: &str) -> Vec<String> {
        if test_case.execution_status == ExecutionStatus::Blocked {
            return Vec::new();
        }
        self.key_tokens(test_case)
            .map(|tokens| MatchCandidate::matching(&tokens, identifier))
            .unwrap_or_default()
    }
}

/// A test case eligible for matching, along with its key tokens.
#[derive(Clone, Debug)]
pub struct MatchCandidate<'a> {
    /// The test case.
    pub test_case: &'a TestCaseDefinition,

    /// The tokens from its key field.
    pub key_tokens: Vec<String>,
}

impl MatchCandidate<'_> {
    /// Returns the tokens equal to `identifier`, in order and with repeats.
    pub fn matching_tokens(&self, identifier: &str) -> Vec<String> {
        Self::matching(&self.key_tokens, identifier)
    }

    fn matching(tokens: &[String], identifier: &str) -> Vec<String> {
        tokens
            .iter()
            .filter(|token| token.as_str() == identifier)
            .cloned()
            .collect()
    }
}
