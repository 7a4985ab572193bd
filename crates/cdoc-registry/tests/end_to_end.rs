//! Whole builds over the parser fixtures: parse, register, freeze, resolve.

use cdoc_config::{BackendChoice, BuildConfig, TestMode};
use cdoc_core::{SourceFile, SymbolKind, SymbolLookup};
use cdoc_markup::{Converter, WarningKind};
use cdoc_registry::{BuildError, FieldLevel, SourceGroup, build, group_by, resolve_docs};
use pretty_assertions::assert_eq;

const ENGINE_H: &str = include_str!("../../cdoc-parser/tests/fixtures/engine.h");
const UART_C: &str = include_str!("../../cdoc-parser/tests/fixtures/uart.c");
const KMS_PROPERTIES: &str = include_str!("../../cdoc-parser/tests/fixtures/kms_properties.c");
const KMS_ADDFB: &str = include_str!("../../cdoc-parser/tests/fixtures/kms_addfb.c");

const ENGINE_C: &str = r"
/**
 * engine_run:
 * @engine: a #engine_config_t
 * @flags: %ENGINE_FAST or 0
 *
 * Runs one step, like engine_init() does.
 *
 * Returns: zero on success
 */
int engine_run(struct engine *engine, int flags);
";

fn pattern_config() -> BuildConfig {
    BuildConfig {
        backend: BackendChoice::Pattern,
        legacy_markup: true,
        ..BuildConfig::default()
    }
}

fn core(files: Vec<SourceFile>) -> SourceGroup {
    SourceGroup::new("core", files)
}

fn engine_files() -> Vec<SourceFile> {
    vec![
        SourceFile::new("include/engine.h", ENGINE_H),
        SourceFile::new("src/engine.c", ENGINE_C),
    ]
}

fn igt() -> SourceGroup {
    SourceGroup::new(
        "igt",
        vec![
            SourceFile::new("tests/kms_properties.c", KMS_PROPERTIES),
            SourceFile::new("tests/kms_addfb.c", KMS_ADDFB),
        ],
    )
    .with_test_mode(TestMode::Igt)
}

#[test]
fn index_files_underscore_names_under_the_next_letter() {
    let out = build(&pattern_config(), &[core(engine_files())]).unwrap();
    let index = out.registry.group_index("core");
    let letters: Vec<_> = index
        .iter()
        .map(|b| (b.letter, b.entries.iter().map(|e| e.name.as_str()).collect::<Vec<_>>()))
        .collect();
    assert_eq!(
        letters,
        vec![(
            'E',
            vec![
                "engine_config_t",
                "engine_default_workers",
                "engine_flags",
                "engine_hook_fn",
                "engine_init",
                "__engine_reset",
                "engine_run",
            ]
        )]
    );
}

#[test]
fn func_role_round_trip() {
    let out = build(&pattern_config(), &[core(engine_files())]).unwrap();
    let converted = Converter::new(&out.registry)
        .convert("Use :func:`engine_init` or :func:`engine_teardown`.");
    assert_eq!(
        converted.text,
        "Use [`engine_init`](#func-core-engine_init) or `engine_teardown`."
    );
    assert_eq!(converted.warnings.len(), 1);
    assert_eq!(converted.warnings[0].kind, WarningKind::Unresolved);
    assert_eq!(converted.warnings[0].target, "engine_teardown");
}

#[test]
fn legacy_comment_resolves_after_normalization() {
    let out = build(&pattern_config(), &[core(engine_files())]).unwrap();
    let docs = resolve_docs(&out.registry, true);
    let part = |part: &str| {
        docs.iter()
            .find(|d| d.anchor == "func-core-engine_run" && d.part == part)
            .map(|d| d.text.as_str())
    };
    assert_eq!(
        part("description"),
        Some("Runs one step, like [`engine_init`](#func-core-engine_init) does.")
    );
    assert_eq!(
        part("param engine"),
        Some("a [`engine_config_t`](#type-core-engine_config_t)")
    );
    assert_eq!(
        part("param flags"),
        Some("[`ENGINE_FAST`](#const-core-engine_flags-ENGINE_FAST) or 0")
    );
    assert_eq!(part("returns"), Some("zero on success"));
    assert!(docs.iter().all(|d| d.warnings.is_empty()), "{docs:#?}");
}

#[test]
fn duplicate_qualified_name_names_both_locations() {
    let again = SourceFile::new(
        "src/engine_compat.c",
        "/**\n * Older entry point.\n */\nstruct engine *engine_init(const engine_config_t *cfg);\n",
    );
    let mut files = engine_files();
    files.push(again);
    let err = build(&pattern_config(), &[core(files)]).unwrap_err();
    assert!(matches!(err, BuildError::DuplicateQualifiedName { .. }));
    let message = err.to_string();
    assert!(message.contains("core::engine_init"), "{message}");
    assert!(message.contains("include/engine.h:"), "{message}");
    assert!(message.contains("src/engine_compat.c:4"), "{message}");
}

#[test]
fn same_name_in_two_groups_prefers_the_current_group() {
    let drivers = SourceGroup::new(
        "drivers",
        vec![SourceFile::new(
            "engine.c",
            "/**\n * Driver-side init.\n */\nint engine_init(void);\n",
        )],
    );
    let out = build(&pattern_config(), &[core(engine_files()), drivers]).unwrap();
    assert_eq!(out.registry.lookup_bare("engine_init").len(), 2);

    let text = ":func:`engine_init`";
    let from_drivers = Converter::new(&out.registry).in_group("drivers").convert(text);
    assert_eq!(from_drivers.text, "[`engine_init`](#func-drivers-engine_init)");

    let nowhere = Converter::new(&out.registry).convert(text);
    assert_eq!(nowhere.text, "`engine_init`");
    assert_eq!(nowhere.warnings[0].kind, WarningKind::Ambiguous);

    let qualified = Converter::new(&out.registry).convert(":func:`core::engine_init`");
    assert_eq!(qualified.text, "[`core::engine_init`](#func-core-engine_init)");
}

#[test]
fn test_metadata_precedence_and_format_exclusion() {
    let out = build(&pattern_config(), &[igt()]).unwrap();
    let registry = &out.registry;

    let properties = registry.lookup_test("kms_properties").unwrap();
    let names: Vec<_> = properties.subtests.iter().map(|s| s.name.as_str()).collect();
    assert_eq!(names, vec!["invalid-properties-legacy", "invalid-properties-atomic"]);
    assert!(registry.lookup_subtest(None, "%s-props-%s").is_empty());

    let legacy = properties.subtest("invalid-properties-legacy").unwrap();
    assert!(legacy.description.starts_with("Check that invalid legacy set-property calls"));
    let atomic = properties.subtest("invalid-properties-atomic").unwrap();
    assert_eq!(atomic.description, "Check that invalid atomic properties are rejected.");

    let addfb = registry.lookup_test("kms_addfb").unwrap();
    let pitch = addfb.subtest("bad-pitch").unwrap();
    assert_eq!(pitch.description, "Reject a zero pitch from the standalone block.");

    // Metadata blocks are not symbol docs.
    assert!(registry.lookup_bare("fd").is_empty());
    assert!(registry.lookup_bare("test_invalid_properties").is_empty());
}

#[test]
fn subtest_role_links_to_test_scoped_anchor() {
    let out = build(&pattern_config(), &[igt()]).unwrap();
    let converted = Converter::new(&out.registry)
        .convert("See :subtest:`kms_addfb@basic` and :test:`kms_properties`.");
    assert_eq!(
        converted.text,
        "See [`kms_addfb@basic`](#kms_addfb@basic) and [`kms_properties`](#test-kms_properties)."
    );
    assert!(converted.warnings.is_empty());
}

#[test]
fn catalog_matches_field_aliases() {
    let out = build(&pattern_config(), &[igt()]).unwrap();
    let catalog = group_by(out.registry.tests(), "mega_feature");
    assert_eq!(catalog.level, FieldLevel::Test);
    let buckets: Vec<_> = catalog
        .buckets
        .iter()
        .map(|b| (b.value.as_str(), b.entries.iter().map(|e| e.test.as_str()).collect::<Vec<_>>()))
        .collect();
    assert_eq!(
        buckets,
        vec![("KMS", vec!["kms_properties"]), ("Uncategorized", vec!["kms_addfb"])]
    );

    let by_function = group_by(out.registry.tests(), "Functionality");
    assert_eq!(by_function.level, FieldLevel::Subtest);
    assert!(by_function.buckets.iter().any(|b| b.value == "addfb"));
}

#[test]
fn output_does_not_depend_on_file_order() {
    let forward = vec![
        SourceFile::new("include/engine.h", ENGINE_H),
        SourceFile::new("src/engine.c", ENGINE_C),
        SourceFile::new("drivers/uart.c", UART_C),
    ];
    let mut backward = forward.clone();
    backward.reverse();

    let a = build(&pattern_config(), &[core(forward)]).unwrap();
    let b = build(&pattern_config(), &[core(backward)]).unwrap();

    assert_eq!(a.registry.group_index("core"), b.registry.group_index("core"));
    assert_eq!(a.registry.global_index(), b.registry.global_index());

    let mut docs_a = resolve_docs(&a.registry, true);
    let mut docs_b = resolve_docs(&b.registry, true);
    let key = |d: &cdoc_registry::ResolvedDoc| (d.anchor.clone(), d.part.clone());
    docs_a.sort_by_key(key);
    docs_b.sort_by_key(key);
    assert_eq!(docs_a, docs_b);
}

#[test]
fn file_symbols_are_registered_per_file() {
    let out = build(&pattern_config(), &[core(engine_files())]).unwrap();
    let file = out.registry.lookup_file("engine.h").unwrap();
    assert_eq!(file.kind, SymbolKind::File);
    assert_eq!(file.qualified_name, "core/include/engine.h");
    assert_eq!(out.stats[0].files, 2);
    assert_eq!(out.stats[0].backend, "pattern");
}
