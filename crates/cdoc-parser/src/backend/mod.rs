//! Parser backends.
//!
//! Two implementations share one contract: given a [`CommentUnit`] they
//! produce a [`Symbol`] of the same kind and name, or a [`ParseFailure`].
//! Only signature and type fidelity may differ between them.
//!
//! - [`AccurateBackend`] asks a tree-sitter front-end for kinds, parameter
//!   types and return types.
//! - [`PatternBackend`] applies ordered regex rules and an explicit
//!   bracket-depth member scan.

pub mod accurate;
pub mod pattern;

pub use accurate::AccurateBackend;
pub use pattern::PatternBackend;

use cdoc_core::{Param, Symbol, TypeRef};

use crate::error::ParseFailure;
use crate::extract::{CommentUnit, strip_comments};
use crate::members::body_span;

/// Turns one comment unit into a symbol.
pub trait ParserBackend {
    fn name(&self) -> &'static str;

    /// Parse the unit's declaration.
    ///
    /// # Errors
    /// [`ParseFailure::BackendUnavailable`] when the caller should retry
    /// with another backend, [`ParseFailure::Unclassified`] when the unit
    /// documents nothing this crate models.
    fn parse(&self, unit: &CommentUnit<'_>) -> Result<Symbol, ParseFailure>;
}

/// The closed set of backends a build can select.
#[derive(Debug, Clone)]
pub enum Backend {
    Accurate(AccurateBackend),
    Pattern(PatternBackend),
}

impl Backend {
    /// The accurate backend, if its front-end is present.
    ///
    /// # Errors
    /// [`ParseFailure::BackendUnavailable`] when it is not.
    pub fn accurate() -> Result<Self, ParseFailure> {
        AccurateBackend::new().map(Self::Accurate)
    }

    #[must_use]
    pub fn pattern() -> Self {
        Self::Pattern(PatternBackend::new())
    }
}

impl ParserBackend for Backend {
    fn name(&self) -> &'static str {
        match self {
            Self::Accurate(b) => b.name(),
            Self::Pattern(b) => b.name(),
        }
    }

    fn parse(&self, unit: &CommentUnit<'_>) -> Result<Symbol, ParseFailure> {
        match self {
            Self::Accurate(b) => b.parse(unit),
            Self::Pattern(b) => b.parse(unit),
        }
    }
}

// ── Helpers shared by both backends ─────────────────────────────────

/// Display signature of a declaration.
///
/// Comments are removed, whitespace is collapsed and a trailing `;` is
/// dropped. A brace body is shown as `{ ... }` except in macros, whose
/// line continuations are joined instead.
pub(crate) fn signature_text(declaration: &str) -> String {
    let code = strip_comments(declaration);
    if code.trim_start().starts_with('#') {
        return collapse_ws(&code.replace("\\\r\n", " ").replace("\\\n", " "));
    }
    let code = match body_span(&code) {
        Some((open, end)) => format!("{} {{ ... }} {}", &code[..open], &code[end..]),
        None => code,
    };
    collapse_ws(&code).trim_end_matches(';').trim_end().to_string()
}

pub(crate) fn collapse_ws(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Normalize a type's spelling so both backends agree.
///
/// Whitespace is collapsed and pointer stars are attached as `char **`.
pub(crate) fn normalize_type(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let spaced = text.replace('*', " * ");
    for token in spaced.split_whitespace() {
        if token == "*" {
            if !out.ends_with('*') && !out.is_empty() {
                out.push(' ');
            }
            out.push('*');
        } else {
            if !out.is_empty() {
                out.push(' ');
            }
            out.push_str(token);
        }
    }
    out
}

/// Split on commas that are not nested inside brackets.
pub(crate) fn split_top_level(text: &str, sep: char) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut depth = 0usize;
    let mut start = 0;
    for (i, ch) in text.char_indices() {
        match ch {
            '(' | '[' | '{' => depth += 1,
            ')' | ']' | '}' => depth = depth.saturating_sub(1),
            c if c == sep && depth == 0 => {
                parts.push(&text[start..i]);
                start = i + c.len_utf8();
            }
            _ => {}
        }
    }
    parts.push(&text[start..]);
    parts
}

pub(crate) fn is_ident_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}

/// Byte range of the last identifier in `text`.
pub(crate) fn last_identifier(text: &str) -> Option<(usize, usize)> {
    let end = text.rfind(is_ident_char)? + 1;
    let start = text[..end]
        .rfind(|c: char| !is_ident_char(c))
        .map_or(0, |i| i + 1);
    let word = &text[start..end];
    word.starts_with(|c: char| c.is_ascii_alphabetic() || c == '_')
        .then_some((start, end))
}

/// Parse one parameter from its declaration text.
///
/// `char **argv` gives name `argv` and type `char **`; a lone type such as
/// `int` gives an empty name.
pub(crate) fn param_from_text(text: &str) -> Option<Param> {
    let text = collapse_ws(text);
    if text.is_empty() {
        return None;
    }
    if text == "..." {
        return Some(Param::new("...", None));
    }
    // Function pointer parameter: void (*cb)(int)
    if let Some(open) = text.find("(*") {
        let rest = &text[open + 2..];
        let close = rest.find(')')?;
        let name = rest[..close].trim();
        let ty = format!("{}(*){}", &text[..open], &rest[close + 1..]);
        return Some(Param::new(name, Some(collapse_ws(&ty))));
    }

    let (decl, array) = match text.find('[') {
        Some(i) => (&text[..i], &text[i..]),
        None => (text.as_str(), ""),
    };
    let words = decl
        .split(|c: char| c.is_whitespace() || c == '*')
        .filter(|w| !w.is_empty())
        .count();
    match last_identifier(decl) {
        Some((start, end)) if words >= 2 && !TYPE_WORDS.contains(&&decl[start..end]) => {
            let ty = format!("{}{}", &decl[..start], &decl[end..]);
            let ty = normalize_type(&ty);
            let ty = if array.is_empty() {
                ty
            } else {
                format!("{ty}{array}")
            };
            Some(Param::new(&decl[start..end], Some(ty)))
        }
        _ => Some(Param::new("", Some(normalize_type(&text)))),
    }
}

/// Words that end a type rather than name a declarator.
const TYPE_WORDS: &[&str] = &[
    "void", "char", "short", "int", "long", "float", "double", "signed", "unsigned", "const",
    "volatile", "bool", "_Bool",
];

/// Parameters of a function from the text between its parentheses.
pub(crate) fn params_from_list(list: &str) -> Vec<Param> {
    let trimmed = list.trim();
    if trimmed.is_empty() || trimmed == "void" {
        return Vec::new();
    }
    split_top_level(trimmed, ',')
        .into_iter()
        .filter_map(param_from_text)
        .collect()
}

/// Return type from the text before a function's name.
///
/// `void` without pointers means no return value.
pub(crate) fn return_type(text: &str) -> Option<TypeRef> {
    let text = normalize_type(&strip_storage(text));
    if text.is_empty() || text == "void" {
        return None;
    }
    Some(TypeRef::parse(&text))
}

/// Storage-class words that belong to the declaration, not the type.
pub(crate) const STORAGE_WORDS: &[&str] = &[
    "static",
    "extern",
    "inline",
    "__inline",
    "__inline__",
    "virtual",
    "explicit",
    "constexpr",
    "_Noreturn",
];

/// Remove storage-class words from a return type's text.
pub(crate) fn strip_storage(text: &str) -> String {
    text.split_whitespace()
        .filter(|w| !STORAGE_WORDS.contains(w))
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    #[rstest]
    #[case("char**", "char **")]
    #[case("const char * ", "const char *")]
    #[case("struct  engine_config *", "struct engine_config *")]
    #[case("char * const", "char * const")]
    #[case("unsigned long", "unsigned long")]
    fn types_normalize(#[case] input: &str, #[case] expected: &str) {
        assert_eq!(normalize_type(input), expected);
    }

    #[rstest]
    #[case("int argc", "argc", Some("int"))]
    #[case("char **argv", "argv", Some("char **"))]
    #[case("const char *name", "name", Some("const char *"))]
    #[case("struct engine_config *engine", "engine", Some("struct engine_config *"))]
    #[case("uint8_t buf[16]", "buf", Some("uint8_t[16]"))]
    #[case("void (*cb)(void *ctx)", "cb", Some("void (*)(void *ctx)"))]
    #[case("int", "", Some("int"))]
    #[case("unsigned int", "", Some("unsigned int"))]
    #[case("...", "...", None)]
    fn params_parse(#[case] text: &str, #[case] name: &str, #[case] ty: Option<&str>) {
        let param = param_from_text(text).expect("param");
        assert_eq!(param.name, name);
        assert_eq!(param.type_text.as_deref(), ty);
    }

    #[test]
    fn void_list_has_no_params() {
        assert!(params_from_list("void").is_empty());
        assert!(params_from_list("  ").is_empty());
        assert_eq!(params_from_list("int a, void (*f)(int, int)").len(), 2);
    }

    #[rstest]
    #[case("int engine_run(struct engine *e);", "int engine_run(struct engine *e)")]
    #[case("struct point {\n    int x; /** x */\n    int y;\n};", "struct point { ... }")]
    #[case("typedef struct {\n int a;\n} pair_t;", "typedef struct { ... } pair_t")]
    #[case("#define MAX(a, b) \\\n    ((a) > (b) ? (a) : (b))", "#define MAX(a, b) ((a) > (b) ? (a) : (b))")]
    fn signatures_are_compact(#[case] decl: &str, #[case] expected: &str) {
        assert_eq!(signature_text(decl), expected);
    }

    #[test]
    fn storage_words_are_not_types() {
        assert_eq!(strip_storage("static inline const char *"), "const char *");
    }
}
