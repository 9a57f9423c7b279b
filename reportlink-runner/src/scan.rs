// Copyright (c) The nextest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Finding report files under a root directory.

use crate::errors::SeekError;
use camino::{Utf8Path, Utf8PathBuf};
use globset::{GlobBuilder, GlobSet, GlobSetBuilder};
use walkdir::WalkDir;

/// An Ant-style include pattern: one or more globs separated by commas.
///
/// `**` matches any number of directories and `*` matches within a single path component. A glob
/// ending in `/` matches everything below that directory. Globs are matched against paths
/// relative to the scan root, with `/` as the separator on every platform.
#[derive(Clone, Debug)]
pub struct IncludePattern {
    pattern: String,
    globs: GlobSet,
}

impl IncludePattern {
    /// Compiles an include pattern.
    ///
    /// Returns `Ok(None)` if the pattern is blank, which disables the corresponding format.
    pub fn new(pattern: &str) -> Result<Option<Self>, SeekError> {
        let parts: Vec<&str> = pattern
            .split(',')
            .map(str::trim)
            .filter(|part| !part.is_empty())
            .collect();
        if parts.is_empty() {
            return Ok(None);
        }

        let mut builder = GlobSetBuilder::new();
        for part in parts {
            let part = part.replace('\\', "/");
            let part = if part.ends_with('/') {
                format!("{part}**")
            } else {
                part
            };
            let glob = GlobBuilder::new(&part)
                .literal_separator(true)
                .backslash_escape(false)
                .build()
                .map_err(|error| SeekError::InvalidPattern {
                    pattern: pattern.to_owned(),
                    error,
                })?;
            builder.add(glob);
        }
        let globs = builder.build().map_err(|error| SeekError::InvalidPattern {
            pattern: pattern.to_owned(),
            error,
        })?;

        Ok(Some(Self {
            pattern: pattern.to_owned(),
            globs,
        }))
    }

    /// Returns the pattern as it was written.
    pub fn as_str(&self) -> &str {
        &self.pattern
    }

    /// Returns true if the relative path matches this pattern.
    pub fn is_match(&self, relative_path: &str) -> bool {
        self.globs.is_match(relative_path)
    }
}

/// Lists the files under `root` that match `pattern`.
///
/// Paths are relative to `root`, use `/` as the separator, and are returned in lexical order
/// without duplicates. Any directory that cannot be read, including a missing root, is an error.
pub fn scan_reports(
    root: &Utf8Path,
    pattern: &IncludePattern,
) -> Result<Vec<Utf8PathBuf>, SeekError> {
    let mut matches = Vec::new();

    for entry in WalkDir::new(root).sort_by_file_name() {
        let entry = entry.map_err(|error| SeekError::ScanIo {
            pattern: pattern.as_str().to_owned(),
            root: root.to_owned(),
            error,
        })?;
        if !entry.file_type().is_file() {
            continue;
        }

        let relative = entry.path().strip_prefix(root).map_err(|_| {
            internal(
                pattern,
                format!("{} is outside the scan root", entry.path().display()),
            )
        })?;
        let relative = Utf8Path::from_path(relative).ok_or_else(|| {
            internal(
                pattern,
                format!("{} is not valid UTF-8", entry.path().display()),
            )
        })?;
        let relative: Utf8PathBuf = relative
            .components()
            .map(|component| component.as_str())
            .collect::<Vec<_>>()
            .join("/")
            .into();

        if pattern.is_match(relative.as_str()) {
            matches.push(relative);
        }
    }

    matches.sort();
    matches.dedup();
    Ok(matches)
}

fn internal(pattern: &IncludePattern, message: String) -> SeekError {
    SeekError::Internal {
        pattern: pattern.as_str().to_owned(),
        message,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use camino_tempfile::tempdir;
    use pretty_assertions::assert_eq;
    use test_case::test_case;

    fn make_tree(root: &Utf8Path, files: &[&str]) {
        for file in files {
            let path = root.join(file);
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent).expect("parent created");
            }
            std::fs::write(&path, "").expect("file written");
        }
    }

    #[test_case("", true ; "empty")]
    #[test_case("   ", true ; "whitespace")]
    #[test_case(" , ,", true ; "only separators")]
    #[test_case("**/*.xml", false ; "glob")]
    fn blank_patterns(pattern: &str, blank: bool) {
        let compiled = IncludePattern::new(pattern).expect("pattern compiles");
        assert_eq!(compiled.is_none(), blank);
    }

    #[test]
    fn invalid_pattern() {
        let err = IncludePattern::new("reports/[a-").expect_err("pattern is invalid");
        assert!(
            matches!(err, SeekError::InvalidPattern { ref pattern, .. } if pattern == "reports/[a-"),
            "{err:?}"
        );
    }

    #[test_case("**/TEST-*.xml", "TEST-a.xml", true ; "double star matches root")]
    #[test_case("**/TEST-*.xml", "target/surefire/TEST-a.xml", true ; "double star matches nested")]
    #[test_case("*.xml", "target/TEST-a.xml", false ; "star does not cross directories")]
    #[test_case("target/", "target/deep/x.tap", true ; "trailing slash matches below")]
    #[test_case("a.tap, b/*.tap", "b/c.tap", true ; "second of several globs")]
    fn pattern_matching(pattern: &str, path: &str, expected: bool) {
        let pattern = IncludePattern::new(pattern)
            .expect("pattern compiles")
            .expect("pattern is not blank");
        assert_eq!(pattern.is_match(path), expected);
    }

    #[test]
    fn scan_is_sorted_and_relative() {
        let dir = tempdir().expect("tempdir created");
        make_tree(
            dir.path(),
            &[
                "z/TEST-late.xml",
                "TEST-root.xml",
                "a/b/TEST-deep.xml",
                "a/other.xml",
                "a/TEST-a.txt",
            ],
        );

        // Overlapping globs must not produce duplicates.
        let pattern = IncludePattern::new("**/TEST-*.xml, a/**/*.xml")
            .expect("pattern compiles")
            .expect("pattern is not blank");
        let found = scan_reports(dir.path(), &pattern).expect("scan succeeds");
        assert_eq!(
            found,
            vec![
                Utf8PathBuf::from("TEST-root.xml"),
                Utf8PathBuf::from("a/b/TEST-deep.xml"),
                Utf8PathBuf::from("a/other.xml"),
                Utf8PathBuf::from("z/TEST-late.xml"),
            ]
        );
    }

    #[test]
    fn missing_root_is_fatal() {
        let dir = tempdir().expect("tempdir created");
        let root = dir.path().join("does-not-exist");
        let pattern = IncludePattern::new("**/*.tap")
            .expect("pattern compiles")
            .expect("pattern is not blank");
        let err = scan_reports(&root, &pattern).expect_err("missing root fails");
        assert!(
            matches!(err, SeekError::ScanIo { .. }),
            "unexpected error: {err:?}"
        );
        assert_eq!(err.pattern(), "**/*.tap");
    }
}
