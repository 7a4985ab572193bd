use serde::{Deserialize, Serialize};

/// Language mode derived from a file extension.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Language {
    #[default]
    C,
    Cpp,
}

/// Extensions recognized as C or C++ sources, without the dot.
pub const SOURCE_EXTENSIONS: &[&str] = &["c", "h", "cpp", "hpp", "cc", "hh", "cxx", "hxx"];

impl Language {
    /// Detect the language from a path or bare extension.
    ///
    /// Returns `None` for anything that is not a C/C++ source.
    #[must_use]
    pub fn from_path(path: &str) -> Option<Self> {
        let ext = path.rsplit('.').next()?.to_ascii_lowercase();
        match ext.as_str() {
            "c" | "h" => Some(Self::C),
            "cpp" | "hpp" | "cc" | "hh" | "cxx" | "hxx" => Some(Self::Cpp),
            _ => None,
        }
    }
}

/// True when `name` ends in a known C/C++ source extension.
#[must_use]
pub fn has_source_extension(name: &str) -> bool {
    name.rsplit_once('.')
        .is_some_and(|(stem, ext)| !stem.is_empty() && SOURCE_EXTENSIONS.contains(&ext))
}

/// One file handed to the parser by the file-tree scanner.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceFile {
    /// Path relative to the group root, `/`-separated.
    pub rel_path: String,
    pub language: Language,
    pub content: String,
}

impl SourceFile {
    pub fn new(rel_path: impl Into<String>, content: impl Into<String>) -> Self {
        let rel_path = rel_path.into();
        let language = Language::from_path(&rel_path).unwrap_or_default();
        Self {
            rel_path,
            language,
            content: content.into(),
        }
    }

    /// File name without directories or extension.
    #[must_use]
    pub fn stem(&self) -> &str {
        let base = self.rel_path.rsplit('/').next().unwrap_or(&self.rel_path);
        base.rsplit_once('.').map_or(base, |(stem, _)| stem)
    }
}
