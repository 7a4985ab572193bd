//! Struct, union and enum body scanning.
//!
//! Bodies are split with an explicit bracket-depth scan: struct and union
//! members end at top-level `;`, enumerators at top-level `,`. Separators
//! inside nested braces do not split, so a nested anonymous aggregate stays
//! one segment and its members are scanned recursively.
//!
//! A `/** ... */` before a member documents it. A doc comment on the same
//! line after a member, or any `/**< ... */`, documents the member before it.

use cdoc_core::{Location, Symbol, SymbolKind};

use crate::backend::{collapse_ws, is_ident_char, last_identifier, split_top_level};
use crate::comment::clean_comment;
use crate::extract::{Cursor, strip_comments};

/// One separator-delimited piece of a body.
#[derive(Debug, Clone, PartialEq, Eq)]
struct Segment<'a> {
    raw: &'a str,
    doc: Option<String>,
    start: usize,
}

fn split_segments(body: &str, sep: u8) -> Vec<Segment<'_>> {
    let c = Cursor::new(body);
    let mut segments: Vec<Segment<'_>> = Vec::new();
    let mut cur_start: Option<usize> = None;
    let mut cur_doc: Option<String> = None;
    let mut pending: Option<String> = None;
    let mut last_sep: Option<usize> = None;
    let mut depth = 0usize;
    let mut i = 0;

    while i < c.len() {
        let b = c.bytes[i];
        if c.is_doc_start(i) {
            let end = c.comment_end(i);
            let raw = &body[i..end];
            if depth > 0 {
                // Belongs to a nested body, scanned on recursion.
            } else if cur_start.is_some() {
                cur_doc = Some(clean_comment(raw));
            } else if let Some(prev) = segments.last_mut()
                && (raw.starts_with("/**<")
                    || last_sep.is_some_and(|s| !body[s..i].contains('\n')))
            {
                prev.doc = Some(clean_comment(raw));
            } else {
                pending = Some(clean_comment(raw));
            }
            i = end;
            continue;
        }
        match b {
            b'/' if c.starts_with(i, b"/*") => {
                i = c.comment_end(i);
                continue;
            }
            b'/' if c.starts_with(i, b"//") => {
                i = c.line_end(i);
                continue;
            }
            b'#' if depth == 0 && c.at_line_start(i) => {
                i = c.directive_end(i);
                continue;
            }
            b'"' | b'\'' => {
                cur_start.get_or_insert(i);
                i = c.literal_end(i);
                continue;
            }
            b'{' | b'(' | b'[' => depth += 1,
            b'}' | b')' | b']' => depth = depth.saturating_sub(1),
            _ if b == sep && depth == 0 => {
                if let Some(start) = cur_start.take() {
                    segments.push(Segment {
                        raw: &body[start..i],
                        doc: cur_doc.take().or_else(|| pending.take()),
                        start,
                    });
                }
                last_sep = Some(i);
                i += 1;
                continue;
            }
            _ => {}
        }
        if !b.is_ascii_whitespace() {
            cur_start.get_or_insert(i);
        }
        i += 1;
    }
    if let Some(start) = cur_start {
        segments.push(Segment {
            raw: &body[start..],
            doc: cur_doc.or(pending),
            start,
        });
    }
    segments
}

/// Members of a struct, union or class body.
///
/// `body` is the text between the braces and `body_line` the line its
/// first byte is on.
pub(crate) fn struct_members(body: &str, body_line: u32, owner: &str) -> Vec<Symbol> {
    let mut members = Vec::new();
    for segment in split_segments(body, b';') {
        let line = body_line + newlines(&body[..segment.start]);
        let description = segment.doc.clone().unwrap_or_default();

        if let Some((head, inner, inner_offset, tail)) = split_nested(segment.raw) {
            let declarators = collapse_ws(&strip_comments(tail));
            if declarators.is_empty() {
                // Anonymous struct/union: its members belong to the owner.
                let inner_line = line + newlines(&segment.raw[..inner_offset]);
                members.extend(struct_members(inner, inner_line, owner));
                continue;
            }
            let signature = format!("{} {{ ... }} {declarators}", collapse_ws(&strip_comments(head)));
            for declarator in split_top_level(&declarators, ',') {
                if let Some(name) = declarator_name(declarator) {
                    members.push(member(name, &signature, &description, line, owner, SymbolKind::Member));
                }
            }
            continue;
        }

        let code = collapse_ws(&strip_comments(segment.raw));
        let code = strip_access_label(&code);
        if code.is_empty() {
            continue;
        }
        for name in field_names(code) {
            members.push(member(&name, code, &description, line, owner, SymbolKind::Member));
        }
    }
    members
}

/// Enumerators of an enum body, as constants owned by the enum.
pub(crate) fn enumerators(body: &str, body_line: u32, owner: &str) -> Vec<Symbol> {
    split_segments(body, b',')
        .into_iter()
        .filter_map(|segment| {
            let code = collapse_ws(&strip_comments(segment.raw));
            let name = code.split('=').next().unwrap_or_default().trim();
            if name.is_empty() || !name.chars().all(is_ident_char) {
                return None;
            }
            let line = body_line + newlines(&body[..segment.start]);
            Some(member(
                name,
                &code,
                segment.doc.as_deref().unwrap_or_default(),
                line,
                owner,
                SymbolKind::Constant,
            ))
        })
        .collect()
}

fn member(
    name: &str,
    signature: &str,
    description: &str,
    line: u32,
    owner: &str,
    kind: SymbolKind,
) -> Symbol {
    let mut symbol = Symbol::new(kind, name, Location::new("", line))
        .with_signature(signature)
        .with_description(description);
    symbol.owner = Some(owner.to_string());
    symbol
}

fn newlines(text: &str) -> u32 {
    u32::try_from(text.matches('\n').count()).unwrap_or(u32::MAX)
}

/// Byte range of the first `{ ... }` block in `raw`, from the `{` to just
/// past its matching `}`.
pub(crate) fn body_span(raw: &str) -> Option<(usize, usize)> {
    let c = Cursor::new(raw);
    let mut i = 0;
    while i < c.len() {
        match c.bytes[i] {
            b'/' if c.starts_with(i, b"/*") => i = c.comment_end(i),
            b'/' if c.starts_with(i, b"//") => i = c.line_end(i),
            b'"' | b'\'' => i = c.literal_end(i),
            b'{' => return Some((i, c.block_end(i))),
            _ => i += 1,
        }
    }
    None
}

/// The text between the braces of a span found by [`body_span`].
pub(crate) fn body_inner(raw: &str, (open, end): (usize, usize)) -> &str {
    let inner_end = end.saturating_sub(1).max(open + 1);
    raw.get(open + 1..inner_end).unwrap_or_default()
}

/// Split `head { inner } tail` for a segment that has a nested body.
fn split_nested(raw: &str) -> Option<(&str, &str, usize, &str)> {
    let span @ (open, end) = body_span(raw)?;
    if strip_comments(&raw[..open]).contains('(') {
        return None;
    }
    Some((&raw[..open], body_inner(raw, span), open + 1, &raw[end..]))
}

fn strip_access_label(code: &str) -> &str {
    for label in ["public:", "private:", "protected:"] {
        if let Some(rest) = code.strip_prefix(label) {
            return rest.trim_start();
        }
    }
    code
}

/// Names declared by one member declaration.
fn field_names(code: &str) -> Vec<String> {
    // Function pointer: void (*cb)(void *ctx)
    if let Some(open) = code.find("(*") {
        let rest = &code[open + 2..];
        return rest
            .find(')')
            .map(|close| rest[..close].trim().to_string())
            .filter(|n| !n.is_empty())
            .into_iter()
            .collect();
    }
    // Method declaration in a C++ class body.
    if let Some(open) = code.find('(') {
        return last_identifier(&code[..open])
            .map(|(s, e)| code[s..e].to_string())
            .into_iter()
            .collect();
    }

    let mut parts = split_top_level(code, ',').into_iter();
    let mut names = Vec::new();
    if let Some(first) = parts.next() {
        let first = strip_bitfield(first);
        let words = first
            .split(|c: char| c.is_whitespace() || c == '*')
            .filter(|w| !w.is_empty())
            .count();
        if words >= 2
            && let Some(name) = declarator_name(first)
        {
            names.push(name.to_string());
        }
    }
    names.extend(parts.filter_map(|p| declarator_name(strip_bitfield(p)).map(str::to_string)));
    names
}

fn strip_bitfield(text: &str) -> &str {
    match text.find(':') {
        Some(i) if !text[i..].starts_with("::") => &text[..i],
        _ => text,
    }
}

/// Identifier of a declarator such as `*name`, `name[4]` or `name = 3`.
fn declarator_name(text: &str) -> Option<&str> {
    let text = text.split('=').next().unwrap_or_default();
    let text = text.split('[').next().unwrap_or_default();
    last_identifier(text).map(|(s, e)| &text[s..e])
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn names(members: &[Symbol]) -> Vec<&str> {
        members.iter().map(|m| m.name.as_str()).collect()
    }

    #[test]
    fn splits_on_top_level_semicolons() {
        let body = "\n    int a;\n    char *name;\n    unsigned flags : 3;\n    uint8_t buf[16];\n";
        let members = struct_members(body, 10, "cfg");
        assert_eq!(names(&members), vec!["a", "name", "flags", "buf"]);
        assert_eq!(members[0].location.line, 11);
        assert_eq!(members[3].signature, "uint8_t buf[16]");
        assert_eq!(members[1].owner.as_deref(), Some("cfg"));
    }

    #[test]
    fn leading_and_trailing_docs() {
        let body = "\n    /** The name. */\n    const char *name;\n    int id; /**< Unique id. */\n    int plain;\n    int last /**< Last one. */;\n";
        let members = struct_members(body, 1, "cfg");
        let docs: Vec<_> = members.iter().map(|m| m.description.as_str()).collect();
        assert_eq!(docs, vec!["The name.", "Unique id.", "", "Last one."]);
    }

    #[test]
    fn nested_anonymous_members_are_promoted() {
        let body = "\n    int kind;\n    union {\n        /** As int. */\n        int i;\n        float f;\n    };\n    struct { int x; int y; } pos;\n";
        let members = struct_members(body, 1, "value");
        assert_eq!(names(&members), vec!["kind", "i", "f", "pos"]);
        assert_eq!(members[1].description, "As int.");
        assert_eq!(members[1].location.line, 5);
        assert_eq!(members[3].signature, "struct { ... } pos");
    }

    #[test]
    fn multiple_declarators_and_function_pointers() {
        let body = "int x, *y; void (*on_event)(void *ctx, int code);";
        let members = struct_members(body, 1, "s");
        assert_eq!(names(&members), vec!["x", "y", "on_event"]);
    }

    #[test]
    fn preprocessor_lines_are_ignored() {
        let body = "\n#ifdef DEBUG\n    int trace;\n#endif\n    int level;\n";
        let members = struct_members(body, 1, "s");
        assert_eq!(names(&members), vec!["trace", "level"]);
    }

    #[test]
    fn enumerators_split_on_commas() {
        let body = "\n    ENGINE_OK = 0, /**< Fine. */\n    /** Broken. */\n    ENGINE_ERR = (1 << 2),\n    ENGINE_LAST /**< Sentinel. */\n";
        let values = enumerators(body, 3, "engine_status");
        assert_eq!(names(&values), vec!["ENGINE_OK", "ENGINE_ERR", "ENGINE_LAST"]);
        let docs: Vec<_> = values.iter().map(|v| v.description.as_str()).collect();
        assert_eq!(docs, vec!["Fine.", "Broken.", "Sentinel."]);
        assert_eq!(values[1].signature, "ENGINE_ERR = (1 << 2)");
        assert_eq!(values[1].kind, SymbolKind::Constant);
        assert_eq!(values[1].location.line, 6);
        assert_eq!(values[2].location.line, 7);
    }
}
