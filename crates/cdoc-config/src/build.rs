//! Build-wide parser and markup settings.

use cdoc_core::Language;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Which parser backend a build asks for.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BackendChoice {
    /// Tree-sitter front-end, falling back to patterns when allowed.
    #[default]
    Accurate,
    /// Regex rules only.
    Pattern,
}

impl fmt::Display for BackendChoice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Accurate => "accurate",
            Self::Pattern => "pattern",
        })
    }
}

const fn default_true() -> bool {
    true
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[allow(clippy::struct_excessive_bools)]
pub struct BuildConfig {
    /// Parser backend to use for every group.
    #[serde(default)]
    pub backend: BackendChoice,

    /// Use the pattern backend when the accurate one is unavailable.
    #[serde(default = "default_true")]
    pub fallback: bool,

    /// Rewrite gtk-doc syntax before resolving references.
    #[serde(default)]
    pub legacy_markup: bool,

    /// Link backticked spans that name a known symbol.
    #[serde(default = "default_true")]
    pub auto_link: bool,

    /// Language mode for headers, which are ambiguous between C and C++.
    #[serde(default)]
    pub language: Language,
}

impl Default for BuildConfig {
    fn default() -> Self {
        Self {
            backend: BackendChoice::default(),
            fallback: default_true(),
            legacy_markup: false,
            auto_link: default_true(),
            language: Language::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_correct() {
        let config = BuildConfig::default();
        assert_eq!(config.backend, BackendChoice::Accurate);
        assert!(config.fallback);
        assert!(!config.legacy_markup);
        assert!(config.auto_link);
        assert_eq!(config.language, Language::C);
    }
}
