//! File-tree scanning for source groups.
//!
//! Walks a group root with the `ignore` crate, so `.gitignore` and a
//! `.cdocignore` file are honored, then applies the group's exclude globs
//! and extension list.

use std::path::Path;

use anyhow::Context;
use cdoc_config::SourceConfig;
use cdoc_core::SourceFile;
use globset::{Glob, GlobSet, GlobSetBuilder};
use ignore::WalkBuilder;

/// Read every source file of `source`, with `root` resolved against `base`.
///
/// Files come back sorted by relative path.
pub fn collect_group(source: &SourceConfig, base: &Path) -> anyhow::Result<Vec<SourceFile>> {
    let root = base.join(&source.root);
    anyhow::ensure!(
        root.is_dir(),
        "source root '{}' is not a directory",
        root.display()
    );
    let excludes = exclude_set(&source.exclude)
        .with_context(|| format!("invalid exclude glob in group '{}'", source.group_name()))?;

    let mut builder = WalkBuilder::new(&root);
    builder.hidden(false);
    builder.add_custom_ignore_filename(".cdocignore");

    let mut files = Vec::new();
    for entry in builder.build() {
        let entry = match entry {
            Ok(entry) => entry,
            Err(error) => {
                tracing::warn!(%error, "skipping unreadable entry");
                continue;
            }
        };
        if !entry.file_type().is_some_and(|ft| ft.is_file()) {
            continue;
        }
        let path = entry.path();
        let Ok(relative) = path.strip_prefix(&root) else {
            continue;
        };
        let rel_path = relative.to_string_lossy().replace('\\', "/");
        if excludes.is_match(&rel_path) || !source.accepts_extension(path) {
            tracing::debug!(file = %rel_path, "excluded");
            continue;
        }
        let file = cdoc_parser::read_source(path, &rel_path)
            .with_context(|| format!("failed to read source for group '{}'", source.group_name()))?;
        files.push(file);
    }

    files.sort_by(|a, b| a.rel_path.cmp(&b.rel_path));
    tracing::debug!(
        group = %source.group_name(),
        files = files.len(),
        "group scanned"
    );
    Ok(files)
}

fn exclude_set(patterns: &[String]) -> Result<GlobSet, globset::Error> {
    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        builder.add(Glob::new(pattern)?);
        // A trailing `/` excludes everything under the directory.
        if let Some(dir) = pattern.strip_suffix('/') {
            builder.add(Glob::new(&format!("{dir}/**"))?);
        }
    }
    builder.build()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::fs;

    fn fixture(dir: &Path) {
        for d in ["src/core", "src/legacy", "docs"] {
            fs::create_dir_all(dir.join(d)).expect("mkdir should succeed");
        }
        let files = [
            ("src/core/engine.c", "int engine_init(void);"),
            ("src/core/engine.h", "int engine_init(void);"),
            ("src/core/engine.cpp", "int engine_init();"),
            ("src/legacy/old.c", "int old(void);"),
            ("src/notes.txt", "not source"),
            ("docs/index.md", "# docs"),
        ];
        for (path, content) in files {
            fs::write(dir.join(path), content).expect("write should succeed");
        }
    }

    fn rel_paths(files: &[SourceFile]) -> Vec<&str> {
        files.iter().map(|f| f.rel_path.as_str()).collect()
    }

    #[test]
    fn filters_extensions_and_excludes() {
        let tmp = tempfile::tempdir().unwrap();
        fixture(tmp.path());

        let mut source = SourceConfig::new("src");
        source.exclude = vec!["legacy/".to_string()];
        let files = collect_group(&source, tmp.path()).unwrap();
        assert_eq!(rel_paths(&files), vec!["core/engine.c", "core/engine.h"]);
    }

    #[test]
    fn configured_extensions_widen_the_scan() {
        let tmp = tempfile::tempdir().unwrap();
        fixture(tmp.path());

        let mut source = SourceConfig::new("src");
        source.extensions = vec![".c".to_string(), ".cpp".to_string()];
        let files = collect_group(&source, tmp.path()).unwrap();
        assert_eq!(
            rel_paths(&files),
            vec!["core/engine.c", "core/engine.cpp", "legacy/old.c"]
        );
    }

    #[test]
    fn cdocignore_is_honored() {
        let tmp = tempfile::tempdir().unwrap();
        fixture(tmp.path());
        fs::write(tmp.path().join("src/.cdocignore"), "core/engine.h\n").unwrap();

        let files = collect_group(&SourceConfig::new("src"), tmp.path()).unwrap();
        assert_eq!(rel_paths(&files), vec!["core/engine.c", "legacy/old.c"]);
    }

    #[test]
    fn missing_root_is_an_error() {
        let tmp = tempfile::tempdir().unwrap();
        let err = collect_group(&SourceConfig::new("nope"), tmp.path()).unwrap_err();
        assert!(err.to_string().contains("is not a directory"), "{err}");
    }
}
