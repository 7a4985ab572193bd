//! Per-group parsing and registry assembly.
//!
//! Each group picks its backend once, parses its files and scans them for
//! test metadata with no shared state, so groups run in parallel on rayon.
//! Registration happens afterwards on one thread, in configured order.

use std::borrow::Cow;

use cdoc_config::{BackendChoice, BuildConfig, SourceConfig, TestMode};
use cdoc_core::{Language, SourceFile, Symbol, Test};
use cdoc_markup::normalize;
use cdoc_parser::{Backend, ParserBackend, PatternBackend, directives, parse_file, scan_tests};
use rayon::prelude::*;
use serde::Serialize;

use crate::error::BuildError;
use crate::registry::{Registry, RegistryBuilder};

/// One source group, already read from disk and filtered.
#[derive(Debug, Clone)]
pub struct SourceGroup {
    pub name: String,
    pub test_mode: TestMode,
    pub test_steps: bool,
    pub files: Vec<SourceFile>,
}

impl SourceGroup {
    pub fn new(name: impl Into<String>, files: Vec<SourceFile>) -> Self {
        Self {
            name: name.into(),
            test_mode: TestMode::None,
            test_steps: true,
            files,
        }
    }

    /// A group carrying the test settings of `source`.
    #[must_use]
    pub fn from_config(source: &SourceConfig, files: Vec<SourceFile>) -> Self {
        Self {
            name: source.group_name(),
            test_mode: source.test_mode,
            test_steps: source.test_steps,
            files,
        }
    }

    #[must_use]
    pub const fn with_test_mode(mut self, mode: TestMode) -> Self {
        self.test_mode = mode;
        self
    }
}

/// Counters for one parsed group.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct GroupStats {
    pub group: String,
    pub backend: &'static str,
    pub files: usize,
    pub symbols: usize,
    pub tests: usize,
    pub skipped: usize,
    pub fallbacks: usize,
}

/// A finished build.
#[derive(Debug)]
pub struct BuildOutput {
    pub registry: Registry,
    /// Non-fatal problems met while parsing, such as malformed test blocks.
    pub warnings: Vec<String>,
    pub stats: Vec<GroupStats>,
}

#[derive(Debug)]
struct ParsedGroup {
    symbols: Vec<Symbol>,
    tests: Vec<Test>,
    warnings: Vec<String>,
    stats: GroupStats,
}

/// Parse every group and register the results.
///
/// # Errors
/// [`BuildError::BackendUnavailable`] when a group needs the accurate
/// backend, it is missing and fallback is off. Duplicate qualified names
/// and duplicate tests are reported as their own variants.
pub fn build(config: &BuildConfig, groups: &[SourceGroup]) -> Result<BuildOutput, BuildError> {
    let parsed = groups
        .par_iter()
        .map(|group| parse_group(config, group))
        .collect::<Result<Vec<_>, _>>()?;

    let mut builder = RegistryBuilder::new();
    let mut warnings = Vec::new();
    let mut stats = Vec::with_capacity(parsed.len());
    for (group, parsed) in groups.iter().zip(parsed) {
        builder.add_group(&group.name);
        for symbol in parsed.symbols {
            builder.register(symbol)?;
        }
        for test in parsed.tests {
            builder.register_test(test)?;
        }
        warnings.extend(parsed.warnings);
        stats.push(parsed.stats);
    }

    Ok(BuildOutput {
        registry: builder.freeze(),
        warnings,
        stats,
    })
}

/// Pick the backend a group parses with, and the per-unit fallback.
///
/// # Errors
/// [`BuildError::BackendUnavailable`] when the accurate backend is asked
/// for, cannot start, and fallback is disabled.
pub fn select_backend(
    config: &BuildConfig,
    group: &str,
) -> Result<(Backend, Option<PatternBackend>), BuildError> {
    match config.backend {
        BackendChoice::Pattern => Ok((Backend::pattern(), None)),
        BackendChoice::Accurate => match Backend::accurate() {
            Ok(backend) => Ok((backend, config.fallback.then(PatternBackend::new))),
            Err(err) if config.fallback => {
                tracing::warn!(group, %err, "accurate backend unavailable, using pattern backend");
                Ok((Backend::pattern(), None))
            }
            Err(err) => Err(BuildError::BackendUnavailable {
                group: group.to_string(),
                reason: err.to_string(),
            }),
        },
    }
}

fn parse_group(config: &BuildConfig, group: &SourceGroup) -> Result<ParsedGroup, BuildError> {
    let (backend, fallback) = select_backend(config, &group.name)?;
    let mut out = ParsedGroup {
        symbols: Vec::new(),
        tests: Vec::new(),
        warnings: Vec::new(),
        stats: GroupStats {
            group: group.name.clone(),
            backend: backend.name(),
            files: group.files.len(),
            ..GroupStats::default()
        },
    };

    for file in &group.files {
        let file = with_header_language(file, config.language);
        tracing::debug!(
            group = %group.name,
            file = %file.rel_path,
            backend = backend.name(),
            "parsing"
        );
        out.symbols.push(Symbol::file(&file.rel_path).in_group(&group.name));

        let parsed = parse_file(&file, &backend, fallback.as_ref());
        out.stats.skipped += parsed.skipped;
        out.stats.fallbacks += parsed.fallbacks;
        for mut symbol in parsed.symbols {
            if group.test_mode == TestMode::Igt && is_test_block(&symbol.description) {
                continue;
            }
            prepare(&mut symbol, config.legacy_markup);
            out.symbols.push(symbol.in_group(&group.name));
        }

        if group.test_mode == TestMode::Igt {
            let scan = scan_tests(&file, group.test_steps);
            out.warnings.extend(scan.warnings);
            if let Some(mut test) = scan.test {
                prepare_test(&mut test, config.legacy_markup);
                test.group.clone_from(&group.name);
                out.tests.push(test);
            }
        }
    }

    out.stats.symbols = out.symbols.len();
    out.stats.tests = out.tests.len();
    tracing::info!(
        group = %group.name,
        backend = out.stats.backend,
        files = out.stats.files,
        symbols = out.stats.symbols,
        tests = out.stats.tests,
        skipped = out.stats.skipped,
        fallbacks = out.stats.fallbacks,
        "group parsed"
    );
    Ok(out)
}

/// `.h` is shared by C and C++; the build decides which it is.
fn with_header_language(file: &SourceFile, language: Language) -> Cow<'_, SourceFile> {
    if file.rel_path.ends_with(".h") && file.language != language {
        let mut file = file.clone();
        file.language = language;
        Cow::Owned(file)
    } else {
        Cow::Borrowed(file)
    }
}

/// Test metadata blocks document tests, not the declaration after them.
fn is_test_block(description: &str) -> bool {
    description.lines().any(|line| {
        let line = line.trim_start();
        line.starts_with("TEST:") || line.starts_with("SUBTEST:")
    })
}

/// Normalize legacy markup, then lift directives onto the symbol.
fn prepare(symbol: &mut Symbol, legacy_markup: bool) {
    if legacy_markup {
        symbol.description = normalize(&symbol.description);
        for member in &mut symbol.members {
            member.description = normalize(&member.description);
        }
    }
    directives::apply(symbol);
}

/// Tests carry no directives; only their markup is normalized.
fn prepare_test(test: &mut Test, legacy_markup: bool) {
    if !legacy_markup {
        return;
    }
    test.description = normalize(&test.description);
    for subtest in &mut test.subtests {
        subtest.description = normalize(&subtest.description);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cdoc_core::SymbolKind;
    use pretty_assertions::assert_eq;

    #[test]
    fn pattern_choice_has_no_fallback() {
        let config = BuildConfig {
            backend: BackendChoice::Pattern,
            ..BuildConfig::default()
        };
        let (backend, fallback) = select_backend(&config, "core").unwrap();
        assert_eq!(backend.name(), "pattern");
        assert!(fallback.is_none());
    }

    #[test]
    fn accurate_choice_resolves_one_way_or_the_other() {
        let strict = BuildConfig {
            fallback: false,
            ..BuildConfig::default()
        };
        match (Backend::accurate(), select_backend(&strict, "core")) {
            (Ok(_), Ok((backend, fallback))) => {
                assert_eq!(backend.name(), "accurate");
                assert!(fallback.is_none());
            }
            (Err(_), Err(BuildError::BackendUnavailable { group, .. })) => {
                assert_eq!(group, "core");
            }
            (probe, selected) => panic!("probe {probe:?} disagrees with {selected:?}"),
        }
    }

    #[test]
    fn headers_follow_the_configured_language() {
        let header = SourceFile::new("engine.h", "");
        assert_eq!(with_header_language(&header, Language::Cpp).language, Language::Cpp);
        let source = SourceFile::new("engine.c", "");
        assert_eq!(with_header_language(&source, Language::Cpp).language, Language::C);
    }

    #[test]
    fn legacy_descriptions_feed_directives() {
        let mut symbol = Symbol::new(
            SymbolKind::Function,
            "engine_run",
            cdoc_core::Location::new("engine.c", 3),
        )
        .with_description("Runs one step, see engine_step().\n@engine: a #Engine\nReturns: %TRUE");
        prepare(&mut symbol, true);
        assert_eq!(symbol.description, "Runs one step, see :func:`engine_step`.");
        assert_eq!(
            symbol.param("engine").and_then(|p| p.description.as_deref()),
            Some("a :type:`Engine`")
        );
        assert_eq!(symbol.returns.as_deref(), Some(":const:`TRUE`"));
    }

    #[test]
    fn legacy_test_descriptions_are_normalized() {
        let mut test = Test::new("kms_flip", "tests/kms_flip.c");
        test.description = "Exercises drmModePageFlip() with %DRM_MODE_PAGE_FLIP_EVENT.".to_string();
        test.push_subtest(cdoc_core::Subtest::new("basic"));
        test.subtests[0].description = "Flips a #drm_fb once.".to_string();

        let mut plain = test.clone();
        prepare_test(&mut plain, false);
        assert_eq!(plain, test);

        prepare_test(&mut test, true);
        assert_eq!(
            test.description,
            "Exercises :func:`drmModePageFlip` with :const:`DRM_MODE_PAGE_FLIP_EVENT`."
        );
        assert_eq!(test.subtests[0].description, "Flips a :type:`drm_fb` once.");
    }
}
