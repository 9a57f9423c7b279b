// Copyright (c) The nextest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration for reportlink.

use crate::{
    errors::{ConfigParseError, ConfigParseErrorKind, ShowConfigError},
    matcher::split_tokens,
    seeker::SeekerKind,
};
use camino::{Utf8Path, Utf8PathBuf};
use config::{Config, ConfigBuilder, ConfigError, File, FileFormat, builder::DefaultState};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use tracing::warn;

/// Overall configuration for reportlink.
///
/// This is the root data structure for reportlink configuration. Values are read from the
/// embedded default config, then from the config file, then from [`ConfigOverrides`].
#[derive(Clone, Debug)]
pub struct ReportlinkConfig {
    workspace_root: Utf8PathBuf,
    inner: ReportlinkConfigImpl,
}

impl ReportlinkConfig {
    /// The default location of the config within the path: `.config/reportlink.toml`, used to
    /// read the config from the given directory.
    pub const CONFIG_PATH: &'static str = ".config/reportlink.toml";

    /// Contains the default config as a TOML file.
    ///
    /// Repository-specific configuration is layered on top of the default config.
    pub const DEFAULT_CONFIG: &'static str = include_str!("../default-config.toml");

    /// Reads the config from the given file, or if not specified from `.config/reportlink.toml`
    /// in the workspace root.
    ///
    /// If no config file is specified and the workspace root doesn't have
    /// `.config/reportlink.toml`, uses the default config options.
    pub fn from_sources(
        workspace_root: impl Into<Utf8PathBuf>,
        config_file: Option<&Utf8Path>,
    ) -> Result<Self, ConfigParseError> {
        Self::from_sources_impl(workspace_root, config_file, |config_file, unknown| {
            let mut unknown_str = String::new();
            if unknown.len() == 1 {
                // Print this on the same line.
                unknown_str.push(' ');
                unknown_str.extend(unknown.iter().next().map(String::as_str));
            } else {
                for ignored_key in unknown {
                    unknown_str.push_str("\n  - ");
                    unknown_str.push_str(ignored_key);
                }
            }

            warn!("ignoring unknown configuration keys in config file {config_file}:{unknown_str}")
        })
    }

    // A custom unknown_callback can be passed in while testing.
    fn from_sources_impl(
        workspace_root: impl Into<Utf8PathBuf>,
        config_file: Option<&Utf8Path>,
        mut unknown_callback: impl FnMut(&Utf8Path, &BTreeSet<String>),
    ) -> Result<Self, ConfigParseError> {
        let workspace_root = workspace_root.into();

        let (config_file, source) = match config_file {
            Some(file) => (file.to_owned(), File::new(file.as_str(), FileFormat::Toml)),
            None => {
                let config_file = workspace_root.join(Self::CONFIG_PATH);
                let source = File::new(config_file.as_str(), FileFormat::Toml).required(false);
                (config_file, source)
            }
        };

        let builder = Self::make_default_config().add_source(source);
        let (inner, unknown) = Self::build_and_deserialize_config(&builder)
            .map_err(|kind| ConfigParseError::new(config_file.clone(), kind))?;
        if !unknown.is_empty() {
            unknown_callback(&config_file, &unknown);
        }

        Ok(Self {
            workspace_root,
            inner,
        })
    }

    /// Returns the default config.
    pub fn default_config(workspace_root: impl Into<Utf8PathBuf>) -> Self {
        // The embedded default config has no unknown keys, which is verified by a test.
        let inner = Self::build_and_deserialize_config(&Self::make_default_config())
            .map(|(inner, _)| inner)
            .unwrap_or_default();
        Self {
            workspace_root: workspace_root.into(),
            inner,
        }
    }

    /// Returns the workspace root the config was read relative to.
    pub fn workspace_root(&self) -> &Utf8Path {
        &self.workspace_root
    }

    /// Returns the name of the key custom field.
    pub fn key_custom_field(&self) -> &str {
        self.inner.key_custom_field.trim()
    }

    /// Returns the names of the custom fields to keep from the catalog.
    ///
    /// An empty list keeps every field. Otherwise the key custom field is always kept, since
    /// dropping it would leave nothing to match on.
    pub fn custom_field_names(&self) -> Vec<String> {
        let mut names = split_tokens(&self.inner.custom_fields);
        let key_field = self.key_custom_field();
        let listed = names.iter().any(|name| name == key_field);
        if !names.is_empty() && !key_field.is_empty() && !listed {
            warn!(
                "custom-fields does not list the key custom field `{key_field}`, keeping it anyway"
            );
            names.push(key_field.to_owned());
        }
        names
    }

    /// Returns the platform every result should be recorded against, if configured.
    pub fn platform(&self) -> Option<&str> {
        self.inner
            .platform
            .as_deref()
            .map(str::trim)
            .filter(|platform| !platform.is_empty())
    }

    /// Returns true if failed tests should fail the run rather than mark it unstable.
    pub fn failed_tests_mark_failure(&self) -> bool {
        self.inner.failed_tests_mark_failure
    }

    /// Returns the report include patterns.
    pub fn reports(&self) -> &ReportPatterns {
        &self.inner.reports
    }

    /// Applies command-line overrides on top of the values read from files.
    pub fn apply_overrides(&mut self, overrides: &ConfigOverrides) {
        if let Some(key_custom_field) = &overrides.key_custom_field {
            self.inner.key_custom_field.clone_from(key_custom_field);
        }
        if let Some(platform) = &overrides.platform {
            self.inner.platform = Some(platform.clone());
        }
        if overrides.failed_tests_mark_failure {
            self.inner.failed_tests_mark_failure = true;
        }
        if let Some(junit) = &overrides.junit {
            self.inner.reports.junit.clone_from(junit);
        }
        if let Some(testng) = &overrides.testng {
            self.inner.reports.testng.clone_from(testng);
        }
        if let Some(tap) = &overrides.tap {
            self.inner.reports.tap.clone_from(tap);
        }
    }

    /// Renders the effective config as TOML.
    pub fn to_toml_string(&self) -> Result<String, ShowConfigError> {
        toml::to_string_pretty(&self.inner).map_err(ShowConfigError)
    }

    // ---
    // Helper methods
    // ---

    fn make_default_config() -> ConfigBuilder<DefaultState> {
        Config::builder().add_source(File::from_str(Self::DEFAULT_CONFIG, FileFormat::Toml))
    }

    /// This returns a tuple of (config, ignored paths).
    fn build_and_deserialize_config(
        builder: &ConfigBuilder<DefaultState>,
    ) -> Result<(ReportlinkConfigImpl, BTreeSet<String>), ConfigParseErrorKind> {
        let config = builder
            .build_cloned()
            .map_err(|error| ConfigParseErrorKind::BuildError(Box::new(error)))?;

        let mut ignored = BTreeSet::new();
        let mut cb = |path: serde_ignored::Path| {
            ignored.insert(path.to_string());
        };
        let ignored_de = serde_ignored::Deserializer::new(config, &mut cb);
        let config: ReportlinkConfigImpl =
            serde_path_to_error::deserialize(ignored_de).map_err(|error| {
                // Both serde_path_to_error and the config crate report the key. Drop the key
                // from the config error so it isn't printed twice.
                let path = error.path().clone();
                let config_error = error.into_inner();
                let error = match config_error {
                    ConfigError::At { error, .. } => *error,
                    other => other,
                };
                ConfigParseErrorKind::DeserializeError(Box::new(serde_path_to_error::Error::new(
                    path, error,
                )))
            })?;

        Ok((config, ignored))
    }
}

/// Values given on the command line, which take precedence over config files.
#[derive(Clone, Debug, Default)]
pub struct ConfigOverrides {
    /// Overrides `key-custom-field`.
    pub key_custom_field: Option<String>,

    /// Overrides `platform`.
    pub platform: Option<String>,

    /// If true, overrides `failed-tests-mark-failure` to true.
    pub failed_tests_mark_failure: bool,

    /// Overrides `reports.junit`.
    pub junit: Option<String>,

    /// Overrides `reports.testng`.
    pub testng: Option<String>,

    /// Overrides `reports.tap`.
    pub tap: Option<String>,
}

/// Include patterns for each report format.
#[derive(Clone, Debug, Default, Eq, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct ReportPatterns {
    /// The pattern for JUnit XML reports.
    #[serde(default)]
    pub junit: String,

    /// The pattern for TestNG `testng-results.xml` reports.
    #[serde(default)]
    pub testng: String,

    /// The pattern for TAP streams.
    #[serde(default)]
    pub tap: String,
}

impl ReportPatterns {
    /// Returns the pattern used by a seeker.
    pub fn for_kind(&self, kind: SeekerKind) -> &str {
        match kind {
            SeekerKind::JunitSuites | SeekerKind::JunitTests => &self.junit,
            SeekerKind::TestngSuites | SeekerKind::TestngClasses => &self.testng,
            SeekerKind::Tap => &self.tap,
        }
    }
}

#[derive(Clone, Debug, Default, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
struct ReportlinkConfigImpl {
    key_custom_field: String,
    custom_fields: String,
    #[serde(default)]
    platform: Option<String>,
    failed_tests_mark_failure: bool,
    reports: ReportPatterns,
}

#[cfg(test)]
mod tests {
    use super::*;
    use camino_tempfile::tempdir;
    use indoc::indoc;
    use pretty_assertions::assert_eq;

    #[test]
    fn default_config_has_no_unknown_keys() {
        let builder = ReportlinkConfig::make_default_config();
        let (config, unknown) = ReportlinkConfig::build_and_deserialize_config(&builder)
            .expect("default config is always valid");
        assert!(unknown.is_empty(), "unknown keys in default config: {unknown:?}");
        assert_eq!(config.reports.junit, "**/TEST-*.xml");
    }

    #[test]
    fn missing_file_uses_defaults() {
        let dir = tempdir().expect("tempdir created");
        let config = ReportlinkConfig::from_sources_impl(dir.path(), None, |_, unknown| {
            panic!("unexpected unknown keys: {unknown:?}")
        })
        .expect("config is valid");

        assert_eq!(config.key_custom_field(), "");
        assert_eq!(config.platform(), None);
        assert!(!config.failed_tests_mark_failure());
        assert_eq!(
            config.reports(),
            &ReportPatterns {
                junit: "**/TEST-*.xml".to_owned(),
                testng: "**/testng-results.xml".to_owned(),
                tap: "**/*.tap".to_owned(),
            }
        );
    }

    #[test]
    fn file_layers_over_defaults() {
        let dir = tempdir().expect("tempdir created");
        let config_dir = dir.path().join(".config");
        std::fs::create_dir_all(&config_dir).expect("config dir created");
        std::fs::write(
            config_dir.join("reportlink.toml"),
            indoc! {r#"
                key-custom-field = "class"
                custom-fields = "class, time"
                platform = "linux"
                failed-tests-mark-failure = true
                unknown-top-level = 1

                [reports]
                tap = ""
                also-unknown = "x"
            "#},
        )
        .expect("config written");

        let mut unknown_keys = BTreeSet::new();
        let config = ReportlinkConfig::from_sources_impl(dir.path(), None, |_, unknown| {
            unknown_keys.extend(unknown.iter().cloned());
        })
        .expect("config is valid");

        assert_eq!(config.key_custom_field(), "class");
        assert_eq!(
            config.custom_field_names(),
            vec!["class".to_owned(), "time".to_owned()]
        );
        assert_eq!(config.platform(), Some("linux"));
        assert!(config.failed_tests_mark_failure());
        assert_eq!(config.reports().junit, "**/TEST-*.xml");
        assert_eq!(config.reports().for_kind(SeekerKind::Tap), "");
        assert_eq!(
            unknown_keys.into_iter().collect::<Vec<_>>(),
            vec!["reports.also-unknown".to_owned(), "unknown-top-level".to_owned()]
        );
    }

    #[test]
    fn explicit_file_must_exist() {
        let dir = tempdir().expect("tempdir created");
        let missing = dir.path().join("nope.toml");
        let err = ReportlinkConfig::from_sources_impl(dir.path(), Some(&missing), |_, _| {})
            .expect_err("missing explicit config file is an error");
        assert_eq!(err.config_file(), missing.as_path());
        assert!(matches!(err.kind(), ConfigParseErrorKind::BuildError(_)));
    }

    #[test]
    fn invalid_type_reports_path() {
        let dir = tempdir().expect("tempdir created");
        let path = dir.path().join("reportlink.toml");
        std::fs::write(&path, "failed-tests-mark-failure = \"sometimes\"\n")
            .expect("config written");

        let err = ReportlinkConfig::from_sources_impl(dir.path(), Some(&path), |_, _| {})
            .expect_err("invalid type is an error");
        match err.kind() {
            ConfigParseErrorKind::DeserializeError(error) => {
                assert_eq!(error.path().to_string(), "failed-tests-mark-failure");
            }
            other => panic!("unexpected error kind: {other:?}"),
        }
    }

    #[test]
    fn overrides_win() {
        let mut config = ReportlinkConfig::default_config("/ws");
        config.apply_overrides(&ConfigOverrides {
            key_custom_field: Some("suite".to_owned()),
            platform: Some("  ".to_owned()),
            failed_tests_mark_failure: true,
            junit: None,
            testng: Some(String::new()),
            tap: Some("t/**/*.tap".to_owned()),
        });

        assert_eq!(config.key_custom_field(), "suite");
        assert_eq!(config.platform(), None);
        assert!(config.failed_tests_mark_failure());
        assert_eq!(config.reports().junit, "**/TEST-*.xml");
        assert_eq!(config.reports().testng, "");
        assert_eq!(config.reports().tap, "t/**/*.tap");
    }

    #[test]
    fn custom_fields_keep_key_field() {
        let mut config = ReportlinkConfig::default_config("/ws");
        config.inner.custom_fields = "time, owner".to_owned();
        assert_eq!(
            config.custom_field_names(),
            vec!["time".to_owned(), "owner".to_owned()],
            "no key field configured yet"
        );

        config.apply_overrides(&ConfigOverrides {
            key_custom_field: Some("class".to_owned()),
            ..ConfigOverrides::default()
        });
        assert_eq!(
            config.custom_field_names(),
            vec!["time".to_owned(), "owner".to_owned(), "class".to_owned()]
        );

        config.inner.custom_fields = "class, time".to_owned();
        assert_eq!(
            config.custom_field_names(),
            vec!["class".to_owned(), "time".to_owned()]
        );

        config.inner.custom_fields = String::new();
        assert!(config.custom_field_names().is_empty());
    }

    #[test]
    fn show_config_round_trips() {
        let config = ReportlinkConfig::default_config("/ws");
        let rendered = config.to_toml_string().expect("config renders");
        assert!(rendered.contains("key-custom-field = \"\""), "{rendered}");
        assert!(rendered.contains("[reports]"), "{rendered}");
    }
}
