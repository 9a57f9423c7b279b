// Copyright (c) The nextest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use crate::{
    ExpectedError, ReportlinkExitCode, Result,
    output::{OutputContext, OutputOpts},
};
use camino::{Utf8Path, Utf8PathBuf};
use clap::{Args, Parser, Subcommand};
use reportlink_runner::{
    catalog::Catalog,
    config::{ConfigOverrides, ReportlinkConfig},
    reconcile::{Reconciler, RunOutcome, RunReport},
};
use std::io::Write;
use tracing::info;

/// Reconcile automated test reports with the test cases of a test-management system.
///
/// Test cases name, in a key custom field, the JUnit suites and test cases, TestNG suites and
/// classes, or TAP files that provide evidence for them. reportlink finds those reports, decides
/// a status for each test case and writes the merged results as JSON.
#[derive(Debug, Parser)]
#[command(
    name = "reportlink",
    version,
    styles = crate::output::clap_styles::style(),
    max_term_width = 100,
)]
pub struct ReportlinkApp {
    #[clap(flatten)]
    output: OutputOpts,

    #[clap(subcommand)]
    command: Command,
}

impl ReportlinkApp {
    /// Initializes the output context.
    pub fn init_output(&self) -> OutputContext {
        self.output.init()
    }

    /// Executes the app, writing command output to `stdout`.
    pub fn exec(self, stdout: &mut dyn Write) -> Result<i32> {
        match self.command {
            Command::Run(opts) => opts.exec(stdout),
            Command::ShowConfig(opts) => opts.exec(stdout),
        }
    }
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Match reports against a test case catalog and write the results
    Run(RunOpts),

    /// Print the effective configuration as TOML
    ShowConfig(ShowConfigOpts),
}

#[derive(Debug, Args)]
#[command(next_help_heading = "Config options")]
struct ConfigOpts {
    /// Directory reports are searched under
    #[arg(long, value_name = "DIR", default_value = ".")]
    root: Utf8PathBuf,

    /// Config file [default: <root>/.config/reportlink.toml]
    #[arg(long = "config", value_name = "PATH")]
    config_file: Option<Utf8PathBuf>,

    /// Custom field holding the report names for each test case
    #[arg(long, value_name = "NAME")]
    key_field: Option<String>,

    /// Include pattern for JUnit reports (an empty value disables them)
    #[arg(long, value_name = "PATTERN")]
    junit: Option<String>,

    /// Include pattern for TestNG reports (an empty value disables them)
    #[arg(long, value_name = "PATTERN")]
    testng: Option<String>,

    /// Include pattern for TAP streams (an empty value disables them)
    #[arg(long, value_name = "PATTERN")]
    tap: Option<String>,

    /// Platform recorded on every result
    #[arg(long, value_name = "NAME")]
    platform: Option<String>,

    /// Exit with a failure code, not an unstable one, when test cases fail
    #[arg(long)]
    failed_tests_mark_failure: bool,
}

impl ConfigOpts {
    fn make_config(&self) -> Result<ReportlinkConfig> {
        let mut config = ReportlinkConfig::from_sources(&self.root, self.config_file.as_deref())?;
        config.apply_overrides(&ConfigOverrides {
            key_custom_field: self.key_field.clone(),
            platform: self.platform.clone(),
            failed_tests_mark_failure: self.failed_tests_mark_failure,
            junit: self.junit.clone(),
            testng: self.testng.clone(),
            tap: self.tap.clone(),
        });
        Ok(config)
    }
}

#[derive(Debug, Args)]
struct RunOpts {
    /// Test case catalog (JSON)
    #[arg(long, value_name = "PATH")]
    catalog: Utf8PathBuf,

    /// Write results to this file instead of stdout
    #[arg(long, short = 'o', value_name = "PATH")]
    output: Option<Utf8PathBuf>,

    #[clap(flatten)]
    config_opts: ConfigOpts,
}

impl RunOpts {
    fn exec(self, stdout: &mut dyn Write) -> Result<i32> {
        let config = self.config_opts.make_config()?;
        let key_field = config.key_custom_field();
        if key_field.is_empty() {
            return Err(ExpectedError::KeyFieldMissing);
        }

        let mut catalog = Catalog::from_path(&self.catalog)?;
        let field_names = config.custom_field_names();
        catalog.retain_custom_fields(field_names.iter().map(String::as_str));
        catalog.sort_by_execution_order();
        info!(
            "loaded {} test cases from {}",
            catalog.test_cases.len(),
            self.catalog
        );

        let reconciler =
            Reconciler::new(config.workspace_root(), key_field, config.reports().clone())
                .with_platform(config.platform());
        let results = reconciler.run(&catalog.test_cases)?;

        let report = RunReport::new(&results, config.failed_tests_mark_failure());
        write_report(&report, self.output.as_deref(), stdout)?;

        let summary = report.summary();
        info!(
            "{} test cases: {} passed, {} failed, {} blocked, {} not run",
            summary.total, summary.passed, summary.failed, summary.blocked, summary.not_run,
        );

        Ok(match report.outcome() {
            RunOutcome::Success => ReportlinkExitCode::OK,
            RunOutcome::Unstable => ReportlinkExitCode::UNSTABLE,
            RunOutcome::Failure => ReportlinkExitCode::FAILURE,
        })
    }
}

fn write_report(
    report: &RunReport<'_>,
    path: Option<&Utf8Path>,
    stdout: &mut dyn Write,
) -> Result<()> {
    match path {
        Some(path) => {
            report.write_to_path(path)?;
            info!("wrote results to {path}");
        }
        None => {
            let json = report.to_json_string()?;
            writeln!(stdout, "{json}")
                .and_then(|()| stdout.flush())
                .map_err(|err| ExpectedError::StdoutWriteError { err })?;
        }
    }
    Ok(())
}

#[derive(Debug, Args)]
struct ShowConfigOpts {
    #[clap(flatten)]
    config_opts: ConfigOpts,
}

impl ShowConfigOpts {
    fn exec(self, stdout: &mut dyn Write) -> Result<i32> {
        let config = self.config_opts.make_config()?;
        let toml = config.to_toml_string()?;
        write!(stdout, "{toml}")
            .and_then(|()| stdout.flush())
            .map_err(|err| ExpectedError::StdoutWriteError { err })?;
        Ok(ReportlinkExitCode::OK)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use camino_tempfile::{Utf8TempDir, tempdir};
    use indoc::indoc;
    use pretty_assertions::assert_eq;

    static CATALOG: &str = indoc! {r#"
        {
          "test-cases": [
            {
              "id": 2,
              "name": "bar",
              "execution-order": 2,
              "custom-fields": [{ "name": "class", "value": "BarTest" }]
            },
            {
              "id": 1,
              "name": "foo",
              "execution-order": 1,
              "custom-fields": [{ "name": "class", "value": "FooTest" }]
            }
          ]
        }
    "#};

    fn setup() -> Utf8TempDir {
        let dir = tempdir().expect("tempdir created");
        std::fs::create_dir_all(dir.path().join("reports")).expect("reports dir created");
        std::fs::write(
            dir.path().join("reports/TEST-FooTest.xml"),
            r#"<testsuite name="FooTest"><testcase name="a"><failure/></testcase></testsuite>"#,
        )
        .expect("report written");
        std::fs::write(
            dir.path().join("reports/TEST-BarTest.xml"),
            r#"<testsuite name="BarTest"><testcase name="b"/></testsuite>"#,
        )
        .expect("report written");
        std::fs::write(dir.path().join("catalog.json"), CATALOG).expect("catalog written");
        dir
    }

    fn run(args: &[&str]) -> (Result<i32>, String) {
        let app = ReportlinkApp::try_parse_from(args).expect("arguments parse");
        let mut stdout = Vec::new();
        let result = app.exec(&mut stdout);
        (result, String::from_utf8(stdout).expect("stdout is UTF-8"))
    }

    #[test]
    fn run_writes_results() {
        let dir = setup();
        let root = dir.path().as_str();
        let catalog = dir.path().join("catalog.json");

        let (result, stdout) = run(&[
            "reportlink",
            "run",
            "--catalog",
            catalog.as_str(),
            "--root",
            root,
            "--key-field",
            "class",
            "--platform",
            "linux",
        ]);
        assert_eq!(result.expect("run succeeds"), ReportlinkExitCode::UNSTABLE);

        let json: serde_json::Value = serde_json::from_str(&stdout).expect("stdout is JSON");
        assert_eq!(json["outcome"], "unstable");
        assert_eq!(json["summary"]["total"], 2);

        let results = json["results"].as_array().expect("results is an array");
        let status_of = |id: u64| {
            results
                .iter()
                .find(|result| result["id"] == id)
                .map(|result| result["execution-status"].clone())
        };
        assert_eq!(status_of(1), Some("failed".into()));
        assert_eq!(status_of(2), Some("passed".into()));
        assert!(
            results.iter().all(|result| result["platform"] == "linux"),
            "platform applied to every result"
        );
    }

    #[test]
    fn failed_tests_mark_failure() {
        let dir = setup();
        let catalog = dir.path().join("catalog.json");
        let output = dir.path().join("out/results.json");
        std::fs::create_dir_all(dir.path().join("out")).expect("out dir created");

        let (result, stdout) = run(&[
            "reportlink",
            "run",
            "--catalog",
            catalog.as_str(),
            "--root",
            dir.path().as_str(),
            "--key-field",
            "class",
            "--failed-tests-mark-failure",
            "--output",
            output.as_str(),
        ]);
        assert_eq!(result.expect("run succeeds"), ReportlinkExitCode::FAILURE);
        assert_eq!(stdout, "", "results go to the output file");

        let contents = std::fs::read_to_string(&output).expect("output written");
        let json: serde_json::Value = serde_json::from_str(&contents).expect("output is JSON");
        assert_eq!(json["outcome"], "failure");
    }

    #[test]
    fn disabled_patterns_succeed() {
        let dir = setup();
        let catalog = dir.path().join("catalog.json");

        let (result, stdout) = run(&[
            "reportlink",
            "run",
            "--catalog",
            catalog.as_str(),
            "--root",
            dir.path().as_str(),
            "--key-field",
            "class",
            "--junit",
            "",
        ]);
        assert_eq!(result.expect("run succeeds"), ReportlinkExitCode::OK);
        let json: serde_json::Value = serde_json::from_str(&stdout).expect("stdout is JSON");
        assert_eq!(json["summary"]["total"], 0);
    }

    #[test]
    fn missing_key_field() {
        let dir = setup();
        let catalog = dir.path().join("catalog.json");

        let (result, _) = run(&[
            "reportlink",
            "run",
            "--catalog",
            catalog.as_str(),
            "--root",
            dir.path().as_str(),
        ]);
        let err = result.expect_err("key field is required");
        assert!(matches!(err, ExpectedError::KeyFieldMissing), "{err:?}");
        assert_eq!(err.process_exit_code(), ReportlinkExitCode::SETUP_ERROR);
    }

    #[test]
    fn missing_catalog() {
        let dir = setup();
        let catalog = dir.path().join("missing.json");

        let (result, _) = run(&[
            "reportlink",
            "run",
            "--catalog",
            catalog.as_str(),
            "--root",
            dir.path().as_str(),
            "--key-field",
            "class",
        ]);
        let err = result.expect_err("catalog must exist");
        assert!(matches!(err, ExpectedError::CatalogReadError { .. }), "{err:?}");
    }

    #[test]
    fn show_config_applies_overrides() {
        let dir = setup();
        let (result, stdout) = run(&[
            "reportlink",
            "show-config",
            "--root",
            dir.path().as_str(),
            "--key-field",
            "class",
            "--tap",
            "",
        ]);
        assert_eq!(result.expect("show-config succeeds"), ReportlinkExitCode::OK);
        assert!(
            stdout.contains(r#"key-custom-field = "class""#),
            "override shown:\n{stdout}"
        );
        assert!(stdout.contains(r#"tap = """#), "tap disabled:\n{stdout}");
    }
}
