//! Per-group source tree configuration.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// How test metadata is collected for a group.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TestMode {
    /// Plain API documentation only.
    #[default]
    None,
    /// IGT-style `TEST:`/`SUBTEST:` blocks and `igt_subtest` macros.
    Igt,
}

fn default_extensions() -> Vec<String> {
    vec![".c".to_string(), ".h".to_string()]
}

/// One `[[sources]]` entry.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct SourceConfig {
    /// Directory to scan, relative to the project root.
    pub root: PathBuf,

    /// Group slug. Defaults to the last component of `root`.
    #[serde(default)]
    pub name: String,

    #[serde(default)]
    pub nav_title: String,

    /// Where rendered pages for this group go.
    #[serde(default)]
    pub output_dir: String,

    /// File extensions to parse, with the leading dot.
    #[serde(default = "default_extensions")]
    pub extensions: Vec<String>,

    /// Glob patterns, relative to `root`, of files to skip.
    #[serde(default)]
    pub exclude: Vec<String>,

    #[serde(default)]
    pub test_mode: TestMode,

    /// Metadata field that "By …" catalog pages are grouped by.
    #[serde(default)]
    pub test_group_by: Vec<String>,

    /// Fields rendered in test tables. Falls back to `test_group_by`.
    #[serde(default)]
    pub test_fields: Vec<String>,

    /// Outline each subtest body as readable steps.
    #[serde(default = "default_true")]
    pub test_steps: bool,
}

const fn default_true() -> bool {
    true
}

impl SourceConfig {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            extensions: default_extensions(),
            test_steps: true,
            ..Self::default()
        }
    }

    /// Group slug, derived from `root` when `name` is not set.
    #[must_use]
    pub fn group_name(&self) -> String {
        if !self.name.is_empty() {
            return self.name.clone();
        }
        self.root
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .filter(|n| !n.is_empty())
            .unwrap_or_else(|| "src".to_string())
    }

    #[must_use]
    pub fn title(&self) -> String {
        if self.nav_title.is_empty() {
            self.group_name()
        } else {
            self.nav_title.clone()
        }
    }

    /// Whether `path` carries one of the configured extensions.
    #[must_use]
    pub fn accepts_extension(&self, path: &Path) -> bool {
        let Some(ext) = path.extension().and_then(|e| e.to_str()) else {
            return false;
        };
        self.extensions
            .iter()
            .any(|wanted| wanted.trim_start_matches('.').eq_ignore_ascii_case(ext))
    }

    /// Fields shown in tables: `test_fields`, else `test_group_by`.
    #[must_use]
    pub fn table_fields(&self) -> &[String] {
        if self.test_fields.is_empty() {
            &self.test_group_by
        } else {
            &self.test_fields
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn group_name_defaults_to_root_basename() {
        let source = SourceConfig::new("drivers/uart");
        assert_eq!(source.group_name(), "uart");
        assert_eq!(source.title(), "uart");

        let named = SourceConfig {
            name: "serial".to_string(),
            nav_title: "Serial Drivers".to_string(),
            ..SourceConfig::new("drivers/uart")
        };
        assert_eq!(named.group_name(), "serial");
        assert_eq!(named.title(), "Serial Drivers");
    }

    #[test]
    fn extension_filter_ignores_dot_and_case() {
        let source = SourceConfig::new("src");
        assert!(source.accepts_extension(Path::new("a/engine.c")));
        assert!(source.accepts_extension(Path::new("a/engine.H")));
        assert!(!source.accepts_extension(Path::new("a/engine.cpp")));
        assert!(!source.accepts_extension(Path::new("Makefile")));
    }

    #[test]
    fn table_fields_fall_back_to_group_by() {
        let mut source = SourceConfig::new("tests");
        source.test_group_by = vec!["category".to_string()];
        assert_eq!(source.table_fields(), ["category".to_string()]);
        source.test_fields = vec!["functionality".to_string()];
        assert_eq!(source.table_fields(), ["functionality".to_string()]);
    }
}
