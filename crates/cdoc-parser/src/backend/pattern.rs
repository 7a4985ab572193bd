//! Regex-driven backend.
//!
//! Rules are tried in order against the declaration with comments removed:
//! macros, typedefs, aggregates with a body, function-pointer variables,
//! function prototypes, forward declarations, then plain variables. The
//! first rule that matches decides the kind.

use std::sync::LazyLock;

use cdoc_core::{Language, Location, Param, Symbol, SymbolKind, TypeRef};
use regex::Regex;

use super::{
    ParserBackend, collapse_ws, is_ident_char, last_identifier, params_from_list, return_type,
    signature_text, split_top_level, strip_storage,
};
use crate::error::ParseFailure;
use crate::extract::{CommentUnit, remove_attributes, strip_comments};
use crate::members::{body_inner, body_span, enumerators, struct_members};

static DEFINE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^#\s*define\s+([A-Za-z_]\w*)(\()?").unwrap());

static FN_POINTER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\(\s*\*\s*([A-Za-z_]\w*)\s*\)\s*\(").unwrap());

static AGGREGATE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(struct|union|enum|class)(?:\s+(?:class|struct))?\b\s*([A-Za-z_]\w*)?").unwrap()
});

static FORWARD: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(struct|union|enum|class)\s+([A-Za-z_]\w*)\s*;?$").unwrap()
});

static TYPEDEF_AGGREGATE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^typedef\s+(?:const\s+)?(struct|union|enum)\b").unwrap());

#[derive(Debug, Clone, Copy, Default)]
pub struct PatternBackend;

impl PatternBackend {
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl ParserBackend for PatternBackend {
    fn name(&self) -> &'static str {
        "pattern"
    }

    fn parse(&self, unit: &CommentUnit<'_>) -> Result<Symbol, ParseFailure> {
        let decl = unit.declaration;
        let code = remove_attributes(&strip_comments(decl));
        let code = strip_template(code.trim());
        if code.is_empty() {
            return Err(ParseFailure::Unclassified);
        }

        let location = Location::new("", unit.decl_line);
        let signature = signature_text(decl);
        let (kind, name) = classify(code, unit.language)?;
        let mut symbol = Symbol::new(kind, name.clone(), location).with_signature(signature);

        match kind {
            SymbolKind::Macro => symbol.params = macro_params(code),
            SymbolKind::Function => {
                let (params, ret) = function_parts(code);
                symbol.params = params;
                symbol.return_type = ret;
            }
            SymbolKind::Typedef => {
                if let Some(caps) = FN_POINTER.captures(code)
                    && let Some(whole) = caps.get(0)
                    && !code[..whole.start()].contains('{')
                {
                    let ret = code["typedef".len()..whole.start()].trim();
                    symbol.return_type = return_type(ret);
                    symbol.params = params_from_list(paren_inner(code, whole.end() - 1));
                } else if let Some(keyword) = TYPEDEF_AGGREGATE.captures(code).and_then(|c| c.get(1)) {
                    symbol.members = body_members(decl, unit.decl_line, keyword.as_str(), &name);
                }
            }
            SymbolKind::Struct | SymbolKind::Union | SymbolKind::Enum | SymbolKind::Class => {
                symbol.members = body_members(decl, unit.decl_line, kind.as_str(), &name);
            }
            _ => {}
        }
        Ok(symbol)
    }
}

/// Decide kind and name from comment-free declaration text.
fn classify(code: &str, language: Language) -> Result<(SymbolKind, String), ParseFailure> {
    if code.starts_with('#') {
        let caps = DEFINE.captures(code).ok_or(ParseFailure::Unclassified)?;
        return Ok((SymbolKind::Macro, caps[1].to_string()));
    }

    if starts_with_keyword(code, "typedef") {
        if let Some(caps) = FN_POINTER.captures(code)
            && !code[..caps.get(0).map_or(0, |m| m.start())].contains('{')
        {
            return Ok((SymbolKind::Typedef, caps[1].to_string()));
        }
        let outside = remove_groups(code);
        let outside = outside.trim_end().trim_end_matches(';');
        let (start, end) = last_identifier(outside).ok_or(ParseFailure::Unclassified)?;
        return Ok((SymbolKind::Typedef, outside[start..end].to_string()));
    }

    let head_end = code.find(['{', '(', '=', ';']).unwrap_or(code.len());
    if code[head_end..].starts_with('{')
        && let Some(caps) = AGGREGATE.captures(code)
    {
        if let Some(tag) = caps.get(2) {
            return Ok((aggregate_kind(&caps[1]), tag.as_str().to_string()));
        }
        // Anonymous aggregate: documents the variable it declares, if any.
        let tail = body_span(code).map_or("", |(_, end)| &code[end..]);
        let tail = tail.trim().trim_end_matches(';');
        let first = split_top_level(tail, ',').into_iter().next().unwrap_or_default();
        return declarator(first)
            .map(|name| (SymbolKind::Variable, name))
            .ok_or(ParseFailure::Unclassified);
    }

    if let Some(caps) = FN_POINTER.captures(code) {
        return Ok((SymbolKind::Variable, caps[1].to_string()));
    }

    if let Some(open) = top_level_paren(code) {
        let head = &code[..open];
        if !head.contains('=') {
            let (start, end) = last_identifier(head.trim_end()).ok_or(ParseFailure::Unclassified)?;
            let ret = strip_storage(&head[..start]);
            if ret.is_empty() && language == Language::C {
                // Macro invocation such as IGT_TEST_DESCRIPTION("...").
                return Err(ParseFailure::Unclassified);
            }
            return Ok((SymbolKind::Function, head[start..end].to_string()));
        }
    }

    if let Some(caps) = FORWARD.captures(code) {
        return Ok((aggregate_kind(&caps[1]), caps[2].to_string()));
    }

    variable(code)
}

/// `code` opens with `keyword` as a whole token, not as an identifier prefix.
fn starts_with_keyword(code: &str, keyword: &str) -> bool {
    code.strip_prefix(keyword)
        .is_some_and(|rest| rest.starts_with(|c: char| !is_ident_char(c)))
}

fn aggregate_kind(keyword: &str) -> SymbolKind {
    match keyword {
        "union" => SymbolKind::Union,
        "enum" => SymbolKind::Enum,
        "class" => SymbolKind::Class,
        _ => SymbolKind::Struct,
    }
}

fn variable(code: &str) -> Result<(SymbolKind, String), ParseFailure> {
    let code = code.trim_end_matches(';');
    let first = split_top_level(code, ',').into_iter().next().unwrap_or_default();
    let first = first.split('=').next().unwrap_or_default();
    let first = first.split('[').next().unwrap_or_default();
    let first = first.split('{').next().unwrap_or_default();
    let words: Vec<&str> = first
        .split(|c: char| c.is_whitespace() || c == '*')
        .filter(|w| !w.is_empty())
        .collect();
    if words.len() < 2 {
        return Err(ParseFailure::Unclassified);
    }
    let name = declarator(first).ok_or(ParseFailure::Unclassified)?;
    let kind = if words.contains(&"const") && !first.contains('*') {
        SymbolKind::Constant
    } else {
        SymbolKind::Variable
    };
    Ok((kind, name))
}

fn declarator(text: &str) -> Option<String> {
    let text = text.split('=').next().unwrap_or_default();
    let text = text.split('[').next().unwrap_or_default();
    last_identifier(text).map(|(s, e)| text[s..e].to_string())
}

fn function_parts(code: &str) -> (Vec<Param>, Option<TypeRef>) {
    let Some(open) = top_level_paren(code) else {
        return (Vec::new(), None);
    };
    let head = &code[..open];
    let ret = last_identifier(head.trim_end()).map_or("", |(start, _)| &head[..start]);
    (params_from_list(paren_inner(code, open)), return_type(ret))
}

fn macro_params(code: &str) -> Vec<Param> {
    let Some(caps) = DEFINE.captures(code) else {
        return Vec::new();
    };
    let Some(open) = caps.get(2) else {
        return Vec::new();
    };
    let inner = paren_inner(code, open.start());
    if inner.trim().is_empty() {
        return Vec::new();
    }
    inner
        .split(',')
        .map(|p| Param::new(collapse_ws(p), None))
        .collect()
}

fn body_members(decl: &str, decl_line: u32, keyword: &str, owner: &str) -> Vec<Symbol> {
    let Some(span) = body_span(decl) else {
        return Vec::new();
    };
    let line = decl_line + u32::try_from(decl[..span.0].matches('\n').count()).unwrap_or(0);
    let inner = body_inner(decl, span);
    if keyword == "enum" {
        enumerators(inner, line, owner)
    } else {
        struct_members(inner, line, owner)
    }
}

/// The first `(` outside any brackets, skipping a leading attribute list.
fn top_level_paren(code: &str) -> Option<usize> {
    let mut depth = 0usize;
    for (i, ch) in code.char_indices() {
        match ch {
            '(' if depth == 0 => return Some(i),
            '[' | '{' => depth += 1,
            ']' | '}' => depth = depth.saturating_sub(1),
            _ => {}
        }
    }
    None
}

/// Text between the `(` at `open` and its matching `)`.
fn paren_inner(code: &str, open: usize) -> &str {
    let mut depth = 0usize;
    for (i, ch) in code[open..].char_indices() {
        match ch {
            '(' => depth += 1,
            ')' => {
                depth -= 1;
                if depth == 0 {
                    return &code[open + 1..open + i];
                }
            }
            _ => {}
        }
    }
    code.get(open + 1..).unwrap_or_default()
}

/// Text with every `{...}` and `[...]` group removed.
fn remove_groups(code: &str) -> String {
    let mut out = String::with_capacity(code.len());
    let mut depth = 0usize;
    for ch in code.chars() {
        match ch {
            '{' | '[' => depth += 1,
            '}' | ']' => depth = depth.saturating_sub(1),
            _ if depth == 0 => out.push(ch),
            _ => {}
        }
    }
    out
}

fn strip_template(code: &str) -> &str {
    let Some(rest) = code.strip_prefix("template") else {
        return code;
    };
    let rest = rest.trim_start();
    if !rest.starts_with('<') {
        return code;
    }
    let mut depth = 0usize;
    for (i, ch) in rest.char_indices() {
        match ch {
            '<' => depth += 1,
            '>' => {
                depth -= 1;
                if depth == 0 {
                    return rest[i + 1..].trim_start();
                }
            }
            _ => {}
        }
    }
    code
}
