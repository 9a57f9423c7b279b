// Copyright (c) The nextest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The catalog of test case definitions that reports are reconciled against.
//!
//! The catalog is owned by an external test-management system. reportlink reads it as a JSON
//! document:
//!
//! ```json
//! {
//!   "test-cases": [
//!     {
//!       "id": 42,
//!       "name": "Checkout works",
//!       "external-id": "shop-7",
//!       "execution-order": 1,
//!       "execution-status": "not-run",
//!       "custom-fields": [{ "name": "class", "value": "com.acme.CartTest" }]
//!     }
//!   ]
//! }
//! ```

use crate::errors::CatalogReadError;
use camino::Utf8Path;
use serde::{Deserialize, Serialize};
use std::{collections::BTreeSet, fmt};

/// The identifier of a test case in the test-management system.
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd, Deserialize, Serialize)]
#[serde(transparent)]
pub struct TestCaseId(pub u64);

impl fmt::Display for TestCaseId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// The execution status of a test case, or of one identifier within it.
#[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum ExecutionStatus {
    /// No evidence has been recorded.
    #[default]
    NotRun,

    /// The test passed.
    Passed,

    /// The test failed.
    Failed,

    /// The test could not run. Test cases already in this state are never matched against
    /// reports.
    Blocked,
}

impl ExecutionStatus {
    /// Returns a human-readable name for this status.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::NotRun => "not run",
            Self::Passed => "passed",
            Self::Failed => "failed",
            Self::Blocked => "blocked",
        }
    }
}

impl fmt::Display for ExecutionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A custom field on a test case.
#[derive(Clone, Debug, Eq, PartialEq, Deserialize, Serialize)]
pub struct CustomField {
    /// The field name.
    pub name: String,

    /// The raw field value.
    #[serde(default)]
    pub value: String,
}

impl CustomField {
    /// Creates a new custom field.
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
}

/// A test case definition from the catalog.
#[derive(Clone, Debug, Eq, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct TestCaseDefinition {
    /// The test case identifier.
    pub id: TestCaseId,

    /// The test case name.
    #[serde(default)]
    pub name: String,

    /// The identifier shown to users of the test-management system, e.g. `shop-7`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub external_id: Option<String>,

    /// The position of this test case in the test plan's execution order.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub execution_order: Option<u32>,

    /// The current execution status.
    #[serde(default)]
    pub execution_status: ExecutionStatus,

    /// Custom fields, in catalog order.
    #[serde(default)]
    pub custom_fields: Vec<CustomField>,
}

impl TestCaseDefinition {
    /// Creates a new, not yet run test case with no custom fields.
    pub fn new(id: u64, name: impl Into<String>) -> Self {
        Self {
            id: TestCaseId(id),
            name: name.into(),
            external_id: None,
            execution_order: None,
            execution_status: ExecutionStatus::NotRun,
            custom_fields: Vec::new(),
        }
    }

    /// Adds a custom field, returning `self` for chaining.
    pub fn with_custom_field(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.custom_fields.push(CustomField::new(name, value));
        self
    }

    /// Sets the execution status, returning `self` for chaining.
    pub fn with_status(mut self, status: ExecutionStatus) -> Self {
        self.execution_status = status;
        self
    }

    /// Returns the first custom field with the given name.
    pub fn custom_field(&self, name: &str) -> Option<&CustomField> {
        self.custom_fields.iter().find(|field| field.name == name)
    }
}

/// The list of test cases to reconcile against.
#[derive(Clone, Debug, Default, Eq, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct Catalog {
    /// The test cases.
    pub test_cases: Vec<TestCaseDefinition>,
}

impl Catalog {
    /// Reads a catalog from a JSON file.
    pub fn from_path(path: &Utf8Path) -> Result<Self, CatalogReadError> {
        let contents = std::fs::read_to_string(path).map_err(|error| CatalogReadError::Read {
            path: path.to_owned(),
            error,
        })?;
        let mut deserializer = serde_json::Deserializer::from_str(&contents);
        serde_path_to_error::deserialize(&mut deserializer).map_err(|error| {
            CatalogReadError::Parse {
                path: path.to_owned(),
                error,
            }
        })
    }

    /// Sorts test cases by execution order. Test cases without an order go last; the sort is
    /// stable.
    pub fn sort_by_execution_order(&mut self) {
        self.test_cases.sort_by_key(|test_case| {
            (
                test_case.execution_order.is_none(),
                test_case.execution_order,
            )
        });
    }

    /// Drops custom fields whose names are not in `names`. An empty list keeps every field.
    pub fn retain_custom_fields<'a>(&mut self, names: impl IntoIterator<Item = &'a str>) {
        let names: BTreeSet<&str> = names.into_iter().collect();
        if names.is_empty() {
            return;
        }
        for test_case in &mut self.test_cases {
            test_case
                .custom_fields
                .retain(|field| names.contains(field.name.as_str()));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use camino_tempfile::tempdir;
    use indoc::indoc;
    use pretty_assertions::assert_eq;

    #[test]
    fn read_catalog() {
        let dir = tempdir().expect("tempdir created");
        let path = dir.path().join("catalog.json");
        std::fs::write(
            &path,
            indoc! {r#"
                {
                  "test-cases": [
                    {
                      "id": 42,
                      "name": "Checkout works",
                      "external-id": "shop-7",
                      "execution-order": 2,
                      "custom-fields": [
                        { "name": "class", "value": "com.acme.CartTest" },
                        { "name": "owner" }
                      ]
                    },
                    { "id": 43, "execution-status": "blocked" }
                  ]
                }
            "#},
        )
        .expect("catalog written");

        let catalog = Catalog::from_path(&path).expect("catalog parses");
        assert_eq!(catalog.test_cases.len(), 2);

        let first = &catalog.test_cases[0];
        assert_eq!(first.id, TestCaseId(42));
        assert_eq!(first.external_id.as_deref(), Some("shop-7"));
        assert_eq!(first.execution_status, ExecutionStatus::NotRun);
        assert_eq!(
            first.custom_field("class").map(|field| field.value.as_str()),
            Some("com.acme.CartTest")
        );
        assert_eq!(
            first.custom_field("owner").map(|field| field.value.as_str()),
            Some("")
        );
        assert_eq!(catalog.test_cases[1].execution_status, ExecutionStatus::Blocked);
    }

    #[test]
    fn catalog_parse_error_has_path() {
        let dir = tempdir().expect("tempdir created");
        let path = dir.path().join("catalog.json");
        std::fs::write(&path, r#"{ "test-cases": [ { "id": "forty-two" } ] }"#)
            .expect("catalog written");

        match Catalog::from_path(&path) {
            Err(CatalogReadError::Parse { error, .. }) => {
                assert_eq!(error.path().to_string(), "test-cases[0].id");
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn sort_by_execution_order_is_stable() {
        let mut catalog = Catalog {
            test_cases: vec![
                TestCaseDefinition::new(1, "unordered-a"),
                TestCaseDefinition {
                    execution_order: Some(3),
                    ..TestCaseDefinition::new(2, "third")
                },
                TestCaseDefinition::new(3, "unordered-b"),
                TestCaseDefinition {
                    execution_order: Some(1),
                    ..TestCaseDefinition::new(4, "first")
                },
                TestCaseDefinition {
                    execution_order: Some(1),
                    ..TestCaseDefinition::new(5, "also-first")
                },
            ],
        };
        catalog.sort_by_execution_order();

        let names: Vec<_> = catalog
            .test_cases
            .iter()
            .map(|test_case| test_case.name.as_str())
            .collect();
        assert_eq!(
            names,
            vec!["first", "also-first", "third", "unordered-a", "unordered-b"]
        );
    }

    #[test]
    fn retain_custom_fields() {
        let mut catalog = Catalog {
            test_cases: vec![
                TestCaseDefinition::new(1, "a")
                    .with_custom_field("class", "Foo")
                    .with_custom_field("owner", "qa")
                    .with_custom_field("time", "5"),
            ],
        };

        catalog.retain_custom_fields(std::iter::empty());
        assert_eq!(catalog.test_cases[0].custom_fields.len(), 3);

        catalog.retain_custom_fields(["class", "time"]);
        let names: Vec<_> = catalog.test_cases[0]
            .custom_fields
            .iter()
            .map(|field| field.name.as_str())
            .collect();
        assert_eq!(names, vec!["class", "time"]);
    }
}
