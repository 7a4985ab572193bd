//! Reference resolution and auto-linking.
//!
//! One left-to-right pass over [`tokenize`]d text. Roles are resolved
//! against a [`SymbolLookup`]; plain inline code spans are optionally
//! auto-linked. Output is never rescanned, so each role resolves once.

use cdoc_core::naming::qualify_member;
use cdoc_core::source::has_source_extension;
use cdoc_core::{SymbolKind, SymbolLookup, Target};

use crate::linker::{AnchorLinker, Linker};
use crate::role::Role;
use crate::spans::{Span, tokenize};
use crate::warning::Warning;

/// Kinds a bare backticked name may auto-link to.
const AUTO_KINDS: &[SymbolKind] = &[
    SymbolKind::Typedef,
    SymbolKind::Struct,
    SymbolKind::Union,
    SymbolKind::Class,
    SymbolKind::Enum,
    SymbolKind::Macro,
    SymbolKind::Variable,
    SymbolKind::Constant,
];

const CALLABLE: &[SymbolKind] = &[SymbolKind::Function, SymbolKind::Macro];

/// Outcome of resolving one reference.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution<'a> {
    Found(Target<'a>),
    Missing,
    /// More than one target survived kind and group filtering.
    Ambiguous(Vec<Target<'a>>),
}

/// Converted text plus the references that did not resolve.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Converted {
    pub text: String,
    pub warnings: Vec<Warning>,
}

/// Resolves roles and auto-links against a frozen lookup.
#[derive(Debug)]
pub struct Converter<'a, L: ?Sized, K = AnchorLinker> {
    lookup: &'a L,
    linker: K,
    auto_link: bool,
    group: Option<&'a str>,
}

impl<'a, L: SymbolLookup + ?Sized> Converter<'a, L> {
    /// A converter with auto-linking on and in-page anchors.
    pub const fn new(lookup: &'a L) -> Self {
        Self {
            lookup,
            linker: AnchorLinker,
            auto_link: true,
            group: None,
        }
    }
}

impl<'a, L: SymbolLookup + ?Sized, K: Linker> Converter<'a, L, K> {
    #[must_use]
    pub fn with_linker<K2: Linker>(self, linker: K2) -> Converter<'a, L, K2> {
        Converter {
            lookup: self.lookup,
            linker,
            auto_link: self.auto_link,
            group: self.group,
        }
    }

    #[must_use]
    pub fn auto_link(mut self, enabled: bool) -> Self {
        self.auto_link = enabled;
        self
    }

    /// Prefer targets from `group` when a name is ambiguous.
    #[must_use]
    pub fn in_group(mut self, group: &'a str) -> Self {
        self.group = Some(group);
        self
    }

    /// Resolve every role and, if enabled, auto-link code spans.
    #[must_use]
    pub fn convert(&self, text: &str) -> Converted {
        let mut out = Converted {
            text: String::with_capacity(text.len()),
            warnings: Vec::new(),
        };
        for span in tokenize(text) {
            match span {
                Span::Role { role, target, .. } => self.render_role(role, target, &mut out),
                Span::Code {
                    raw,
                    content,
                    ticks: 1,
                } if self.auto_link => self.render_code(raw, content, &mut out),
                other => out.text.push_str(other.raw()),
            }
        }
        out
    }

    fn render_role(&self, role: Role, target: &str, out: &mut Converted) {
        let display = display_name(target);
        match self.resolve(role, target) {
            Resolution::Found(found) => self.push_link(&display, &found, &mut out.text),
            Resolution::Missing => {
                tracing::debug!(role = role.as_str(), name = target, "unresolved reference");
                out.warnings.push(Warning::unresolved(role.as_str(), target));
                push_literal(&display, &mut out.text);
            }
            Resolution::Ambiguous(candidates) => {
                tracing::debug!(role = role.as_str(), name = target, "ambiguous reference");
                out.warnings.push(Warning::ambiguous(
                    role.as_str(),
                    target,
                    anchors(&candidates),
                ));
                push_literal(&display, &mut out.text);
            }
        }
    }

    fn render_code(&self, raw: &str, content: &str, out: &mut Converted) {
        match self.auto_resolve(content) {
            Resolution::Found(found) => self.push_link(content.trim(), &found, &mut out.text),
            Resolution::Ambiguous(candidates) => {
                out.warnings
                    .push(Warning::ambiguous("auto", content.trim(), anchors(&candidates)));
                out.text.push_str(raw);
            }
            Resolution::Missing => out.text.push_str(raw),
        }
    }

    fn push_link(&self, display: &str, target: &Target<'_>, out: &mut String) {
        out.push_str("[`");
        out.push_str(display);
        out.push_str("`](");
        out.push_str(&self.linker.href(target));
        out.push(')');
    }

    /// Resolve `target` under `role`.
    ///
    /// Qualified names are tried before bare ones. Among several bare
    /// matches of a compatible kind, the one in the current group wins if
    /// it is the only one there.
    #[must_use]
    pub fn resolve(&self, role: Role, target: &str) -> Resolution<'a> {
        let name = target.trim();
        let name = name.strip_suffix("()").unwrap_or(name).trim_end();
        match role {
            Role::File => self
                .lookup
                .lookup_file(name)
                .map_or(Resolution::Missing, |file| Resolution::Found(Target::Symbol(file))),
            Role::Test => self
                .lookup
                .lookup_test(name)
                .map_or(Resolution::Missing, |test| Resolution::Found(Target::Test(test))),
            Role::Subtest => {
                let (test, subtest) = match name.split_once('@') {
                    Some((test, subtest)) => (Some(test), subtest),
                    None => (None, name),
                };
                let hits = self
                    .lookup
                    .lookup_subtest(test, subtest)
                    .into_iter()
                    .map(|(t, s)| Target::Subtest(t, s))
                    .collect();
                self.pick(hits, true)
            }
            Role::Member => match name.split_once('.') {
                Some((owner, field)) => match self.symbol(Role::Type.kinds(), owner, true) {
                    Resolution::Found(Target::Symbol(owner)) => self
                        .lookup
                        .lookup_qualified(&qualify_member(&owner.qualified_name, field))
                        .map_or(Resolution::Missing, |m| Resolution::Found(Target::Symbol(m))),
                    Resolution::Found(_) | Resolution::Missing => Resolution::Missing,
                    ambiguous @ Resolution::Ambiguous(_) => ambiguous,
                },
                None => self.symbol(role.kinds(), name, true),
            },
            _ => self.symbol(role.kinds(), name, true),
        }
    }

    fn symbol(&self, kinds: &[SymbolKind], name: &str, prefer_group: bool) -> Resolution<'a> {
        if let Some(symbol) = self.lookup.lookup_qualified(name)
            && kinds.contains(&symbol.kind)
        {
            return Resolution::Found(Target::Symbol(symbol));
        }
        let hits = self
            .lookup
            .lookup_bare(name)
            .into_iter()
            .filter(|s| kinds.contains(&s.kind))
            .map(Target::Symbol)
            .collect();
        self.pick(hits, prefer_group)
    }

    fn pick(&self, mut hits: Vec<Target<'a>>, prefer_group: bool) -> Resolution<'a> {
        match hits.len() {
            0 => Resolution::Missing,
            1 => Resolution::Found(hits.remove(0)),
            _ => {
                if prefer_group && let Some(group) = self.group {
                    let mut local = hits.iter().filter(|t| t.group() == group);
                    if let (Some(only), None) = (local.next(), local.next()) {
                        return Resolution::Found(*only);
                    }
                }
                Resolution::Ambiguous(hits)
            }
        }
    }

    /// Auto-link candidates for a backticked span. Ambiguity is never
    /// settled by group here.
    fn auto_resolve(&self, content: &str) -> Resolution<'a> {
        let span = content.trim();
        if let Some(stem) = span.strip_suffix("()") {
            if !is_name(stem) {
                return Resolution::Missing;
            }
            return self.symbol(CALLABLE, stem, false);
        }
        if has_source_extension(span) {
            return self
                .lookup
                .lookup_file(span)
                .map_or(Resolution::Missing, |file| Resolution::Found(Target::Symbol(file)));
        }
        if is_name(span) {
            return self.symbol(AUTO_KINDS, span, false);
        }
        Resolution::Missing
    }
}

/// An identifier, optionally `group::`-qualified.
fn is_name(text: &str) -> bool {
    !text.is_empty()
        && text.split("::").all(|part| {
            part.chars().next().is_some_and(|c| c.is_ascii_alphabetic() || c == '_')
                && part.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
        })
}

fn display_name(target: &str) -> String {
    let name = target.trim();
    name.strip_suffix("()").unwrap_or(name).to_string()
}

fn push_literal(display: &str, out: &mut String) {
    out.push('`');
    out.push_str(display);
    out.push('`');
}

fn anchors(targets: &[Target<'_>]) -> Vec<String> {
    targets.iter().map(|t| t.anchor().to_string()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use cdoc_core::{Location, Subtest, Symbol, Test};
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    use crate::warning::WarningKind;

    /// Linear-scan lookup over a handful of symbols.
    struct Fake {
        symbols: Vec<Symbol>,
        tests: Vec<Test>,
    }

    impl Fake {
        fn all(&self) -> impl Iterator<Item = &Symbol> {
            self.symbols
                .iter()
                .flat_map(|s| std::iter::once(s).chain(s.members.iter()))
        }
    }

    impl SymbolLookup for Fake {
        fn lookup_qualified(&self, name: &str) -> Option<&Symbol> {
            self.all().find(|s| s.qualified_name == name)
        }

        fn lookup_bare(&self, name: &str) -> Vec<&Symbol> {
            self.all().filter(|s| s.name == name).collect()
        }

        fn lookup_file(&self, name_or_path: &str) -> Option<&Symbol> {
            let files: Vec<_> = self
                .symbols
                .iter()
                .filter(|s| s.kind == SymbolKind::File)
                .collect();
            files
                .iter()
                .find(|s| s.qualified_name == name_or_path)
                .or_else(|| {
                    let mut named = files.iter().filter(|s| s.name == name_or_path);
                    match (named.next(), named.next()) {
                        (Some(only), None) => Some(only),
                        _ => None,
                    }
                })
                .copied()
        }

        fn lookup_test(&self, name: &str) -> Option<&Test> {
            self.tests.iter().find(|t| t.name == name)
        }

        fn lookup_subtest(&self, test: Option<&str>, subtest: &str) -> Vec<(&Test, &Subtest)> {
            self.tests
                .iter()
                .filter(|t| test.is_none_or(|name| t.name == name))
                .filter_map(|t| t.subtest(subtest).map(|s| (t, s)))
                .collect()
        }
    }

    fn sym(kind: SymbolKind, name: &str, group: &str) -> Symbol {
        Symbol::new(kind, name, Location::new("x.c", 1)).in_group(group)
    }

    fn fake() -> Fake {
        let mut config = Symbol::new(SymbolKind::Struct, "engine_config", Location::new("e.h", 3));
        config
            .members
            .push(Symbol::new(SymbolKind::Member, "name", Location::new("e.h", 4)));

        let mut addfb = Test::new("kms_addfb", "tests/kms_addfb.c");
        addfb.push_subtest(Subtest::new("basic"));
        addfb.push_subtest(Subtest::new("tiling"));
        let mut flip = Test::new("kms_flip", "tests/kms_flip.c");
        flip.push_subtest(Subtest::new("tiling"));

        Fake {
            symbols: vec![
                sym(SymbolKind::Function, "engine_init", "core"),
                config.in_group("core"),
                sym(SymbolKind::Macro, "ENGINE_FAST", "core"),
                sym(SymbolKind::Function, "reset", "core"),
                sym(SymbolKind::Function, "reset", "drivers"),
                sym(SymbolKind::Typedef, "port_t", "drivers"),
                sym(SymbolKind::Variable, "port_t", "core"),
                Symbol::file("src/engine.c").in_group("core"),
            ],
            tests: vec![addfb, flip],
        }
    }

    fn convert(text: &str) -> Converted {
        Converter::new(&fake()).convert(text)
    }

    #[rstest]
    #[case(":func:`engine_init`", "[`engine_init`](#func-core-engine_init)")]
    #[case(":c:func:`engine_init()`", "[`engine_init`](#func-core-engine_init)")]
    #[case(":cpp:function:`engine_init`", "[`engine_init`](#func-core-engine_init)")]
    #[case(":func:`core::reset`", "[`core::reset`](#func-core-reset)")]
    #[case(":type:`engine_config`", "[`engine_config`](#struct-core-engine_config)")]
    #[case(":member:`engine_config.name`", "[`engine_config.name`](#field-core-engine_config-name)")]
    #[case(":const:`ENGINE_FAST`", "[`ENGINE_FAST`](#macro-core-ENGINE_FAST)")]
    #[case(":file:`engine.c`", "[`engine.c`](#file-core-src-engine-c)")]
    #[case(":file:`core/src/engine.c`", "[`core/src/engine.c`](#file-core-src-engine-c)")]
    #[case(":test:`kms_addfb`", "[`kms_addfb`](#test-kms_addfb)")]
    #[case(":subtest:`basic`", "[`basic`](#kms_addfb@basic)")]
    #[case(":subtest:`kms_flip@tiling`", "[`kms_flip@tiling`](#kms_flip@tiling)")]
    fn roles_resolve(#[case] input: &str, #[case] expected: &str) {
        let out = convert(input);
        assert_eq!(out.text, expected);
        assert!(out.warnings.is_empty(), "{:?}", out.warnings);
    }

    #[test]
    fn unknown_name_is_literal_with_one_warning() {
        let out = convert("Call :func:`no_such_fn` first.");
        assert_eq!(out.text, "Call `no_such_fn` first.");
        assert_eq!(out.warnings, vec![Warning::unresolved("func", "no_such_fn")]);
    }

    #[test]
    fn role_kind_must_match() {
        let out = convert(":struct:`engine_init`");
        assert_eq!(out.text, "`engine_init`");
        assert_eq!(out.warnings[0].kind, WarningKind::Unresolved);
    }

    #[test]
    fn ambiguous_names_prefer_current_group() {
        let lookup = fake();
        let out = Converter::new(&lookup).convert(":func:`reset`");
        assert_eq!(out.text, "`reset`");
        assert_eq!(
            out.warnings,
            vec![Warning::ambiguous(
                "func",
                "reset",
                vec!["func-core-reset".to_string(), "func-drivers-reset".to_string()]
            )]
        );

        let out = Converter::new(&lookup).in_group("drivers").convert(":func:`reset`");
        assert_eq!(out.text, "[`reset`](#func-drivers-reset)");
        assert!(out.warnings.is_empty());
    }

    #[test]
    fn subtest_shared_by_two_tests_is_ambiguous() {
        let out = convert(":subtest:`tiling`");
        assert_eq!(out.text, "`tiling`");
        assert_eq!(out.warnings[0].kind, WarningKind::Ambiguous);
    }

    #[rstest]
    #[case("`engine_init()`", "[`engine_init()`](#func-core-engine_init)")]
    #[case("`engine_config`", "[`engine_config`](#struct-core-engine_config)")]
    #[case("`ENGINE_FAST`", "[`ENGINE_FAST`](#macro-core-ENGINE_FAST)")]
    #[case("`engine.c`", "[`engine.c`](#file-core-src-engine-c)")]
    #[case("`NULL`", "`NULL`")]
    #[case("`engine_init`", "`engine_init`")]
    #[case("``engine_config``", "``engine_config``")]
    #[case("`a + b`", "`a + b`")]
    fn auto_links(#[case] input: &str, #[case] expected: &str) {
        let out = convert(input);
        assert_eq!(out.text, expected);
        assert!(out.warnings.is_empty());
    }

    #[test]
    fn auto_link_leaves_ambiguous_names_even_in_group() {
        let lookup = fake();
        let converter = Converter::new(&lookup).in_group("drivers");
        assert_eq!(converter.convert("`reset()`").text, "`reset()`");
        // Typedef in one group, variable in another.
        let out = converter.convert("`port_t`");
        assert_eq!(out.text, "`port_t`");
        assert_eq!(out.warnings[0].kind, WarningKind::Ambiguous);
    }

    #[test]
    fn auto_link_can_be_disabled() {
        let lookup = fake();
        let out = Converter::new(&lookup)
            .auto_link(false)
            .convert("`engine_init()` and :func:`engine_init`");
        assert_eq!(
            out.text,
            "`engine_init()` and [`engine_init`](#func-core-engine_init)"
        );
    }

    #[test]
    fn fences_are_copied_verbatim() {
        let text = "Before :func:`engine_init`.\n```c\n:func:`engine_init` `engine_config`\n```\n";
        assert_eq!(
            convert(text).text,
            "Before [`engine_init`](#func-core-engine_init).\n```c\n:func:`engine_init` `engine_config`\n```\n"
        );
    }

    #[test]
    fn output_is_deterministic() {
        let text = ":func:`reset` `engine_config` :member:`engine_config.name` `port_t`";
        assert_eq!(convert(text), convert(text));
    }
}
