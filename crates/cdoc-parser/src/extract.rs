//! Comment extractor.
//!
//! Walks a file's bytes once, yielding each `/** ... */` block together
//! with the declaration that follows it. String literals and ordinary
//! comments are skipped. Bodies of undocumented functions and aggregates
//! are stepped over whole, so comments inside them never become units.
//! `namespace` and `extern "C"` blocks are entered, not skipped.

use cdoc_core::Language;

/// One doc comment and the declaration it documents.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommentUnit<'a> {
    /// The raw comment including `/**` and `*/`.
    pub comment: &'a str,
    /// Declaration text, empty when the comment stands alone.
    ///
    /// Aggregates keep their body. Function definitions keep only the
    /// signature.
    pub declaration: &'a str,
    /// One-based line of the `/**`.
    pub line: u32,
    /// One-based line where the declaration starts.
    pub decl_line: u32,
    pub language: Language,
}

/// A doc comment anywhere in a file, including inside function bodies.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DocBlock<'a> {
    pub text: &'a str,
    pub line: u32,
}

/// Byte cursor helpers shared by the extractor and the member scanner.
#[derive(Debug, Clone)]
pub(crate) struct Cursor<'a> {
    pub(crate) src: &'a str,
    pub(crate) bytes: &'a [u8],
    line_starts: Vec<usize>,
}

impl<'a> Cursor<'a> {
    pub(crate) fn new(src: &'a str) -> Self {
        let line_starts = std::iter::once(0)
            .chain(src.match_indices('\n').map(|(i, _)| i + 1))
            .collect();
        Self {
            src,
            bytes: src.as_bytes(),
            line_starts,
        }
    }

    pub(crate) const fn len(&self) -> usize {
        self.bytes.len()
    }

    /// One-based line containing byte `pos`.
    pub(crate) fn line_of(&self, pos: usize) -> u32 {
        let line = self.line_starts.partition_point(|&start| start <= pos);
        u32::try_from(line).unwrap_or(u32::MAX)
    }

    pub(crate) fn starts_with(&self, pos: usize, needle: &[u8]) -> bool {
        self.bytes.get(pos..).is_some_and(|rest| rest.starts_with(needle))
    }

    /// `/**` that is not the empty comment `/**/`.
    pub(crate) fn is_doc_start(&self, pos: usize) -> bool {
        self.starts_with(pos, b"/**") && !self.starts_with(pos, b"/**/")
    }

    /// Byte after the `*/` closing the comment at `pos`.
    pub(crate) fn comment_end(&self, pos: usize) -> usize {
        self.src
            .get(pos + 2..)
            .and_then(|rest| rest.find("*/"))
            .map_or(self.len(), |i| pos + 2 + i + 2)
    }

    /// Position of the newline ending the line at `pos`.
    pub(crate) fn line_end(&self, pos: usize) -> usize {
        self.src
            .get(pos..)
            .and_then(|rest| rest.find('\n'))
            .map_or(self.len(), |i| pos + i)
    }

    /// Byte after the string or character literal starting at `pos`.
    pub(crate) fn literal_end(&self, pos: usize) -> usize {
        let quote = self.bytes[pos];
        let mut i = pos + 1;
        while i < self.len() {
            match self.bytes[i] {
                b'\\' => i += 2,
                b'\n' => return i,
                b if b == quote => return i + 1,
                _ => i += 1,
            }
        }
        self.len()
    }

    /// Whether only whitespace precedes `pos` on its line.
    pub(crate) fn at_line_start(&self, pos: usize) -> bool {
        self.bytes[..pos]
            .iter()
            .rev()
            .take_while(|&&b| b != b'\n')
            .all(u8::is_ascii_whitespace)
    }

    /// End of a preprocessor line, following `\` continuations.
    pub(crate) fn directive_end(&self, pos: usize) -> usize {
        let mut from = pos;
        loop {
            let end = self.line_end(from);
            let line = self.src[from..end].trim_end_matches('\r');
            if line.ends_with('\\') && end < self.len() {
                from = end + 1;
            } else {
                return end;
            }
        }
    }

    /// Byte after the `}` matching the `{` at `pos`.
    pub(crate) fn block_end(&self, pos: usize) -> usize {
        let mut depth = 0usize;
        let mut i = pos;
        while i < self.len() {
            match self.bytes[i] {
                b'/' if self.starts_with(i, b"/*") => {
                    i = self.comment_end(i);
                    continue;
                }
                b'/' if self.starts_with(i, b"//") => {
                    i = self.line_end(i);
                    continue;
                }
                b'"' | b'\'' => {
                    i = self.literal_end(i);
                    continue;
                }
                b'{' => depth += 1,
                b'}' => {
                    depth = depth.saturating_sub(1);
                    if depth == 0 {
                        return i + 1;
                    }
                }
                _ => {}
            }
            i += 1;
        }
        self.len()
    }

    /// Skip whitespace and ordinary comments, stopping at a doc comment.
    fn skip_trivia(&self, mut pos: usize) -> usize {
        while pos < self.len() {
            let b = self.bytes[pos];
            if b.is_ascii_whitespace() {
                pos += 1;
            } else if self.is_doc_start(pos) {
                break;
            } else if self.starts_with(pos, b"/*") {
                pos = self.comment_end(pos);
            } else if self.starts_with(pos, b"//") {
                pos = self.line_end(pos);
            } else {
                break;
            }
        }
        pos
    }
}

/// Lazy iterator over the comment units of one file.
#[derive(Debug, Clone)]
pub struct CommentUnits<'a> {
    cursor: Cursor<'a>,
    pos: usize,
    stmt_start: usize,
    language: Language,
}

/// Iterate the comment units of `source` in file order.
#[must_use]
pub fn comment_units(source: &str, language: Language) -> CommentUnits<'_> {
    CommentUnits {
        cursor: Cursor::new(source),
        pos: 0,
        stmt_start: 0,
        language,
    }
}

impl<'a> Iterator for CommentUnits<'a> {
    type Item = CommentUnit<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        let c = &self.cursor;
        while self.pos < c.len() {
            let pos = self.pos;
            match c.bytes[pos] {
                b'/' if c.is_doc_start(pos) => {
                    let src = c.src;
                    let end = c.comment_end(pos);
                    let comment = &src[pos..end];
                    let line = c.line_of(pos);
                    let (declaration, decl_start, next) = take_declaration(c, end);
                    self.pos = next;
                    self.stmt_start = next;
                    let decl_line = if declaration.is_empty() {
                        line
                    } else {
                        c.line_of(decl_start)
                    };
                    return Some(CommentUnit {
                        comment,
                        declaration,
                        line,
                        decl_line,
                        language: self.language,
                    });
                }
                b'/' if c.starts_with(pos, b"/*") => self.pos = c.comment_end(pos),
                b'/' if c.starts_with(pos, b"//") => self.pos = c.line_end(pos),
                b'"' | b'\'' => self.pos = c.literal_end(pos),
                b'#' if c.at_line_start(pos) => {
                    self.pos = c.directive_end(pos);
                    self.stmt_start = self.pos;
                }
                b'{' => {
                    let head = &c.src[self.stmt_start..pos];
                    self.pos = if opens_scope(head) {
                        pos + 1
                    } else {
                        c.block_end(pos)
                    };
                    self.stmt_start = self.pos;
                }
                b';' | b'}' => {
                    self.pos = pos + 1;
                    self.stmt_start = self.pos;
                }
                _ => self.pos = pos + 1,
            }
        }
        None
    }
}

/// Capture the declaration following a doc comment that ends at `from`.
///
/// Returns the declaration slice, its start, and where scanning resumes.
fn take_declaration<'a>(c: &Cursor<'a>, from: usize) -> (&'a str, usize, usize) {
    let src = c.src;
    let start = c.skip_trivia(from);
    if start >= c.len() || c.is_doc_start(start) || c.bytes[start] == b'}' {
        return ("", start, start);
    }
    if c.bytes[start] == b'#' {
        let end = c.directive_end(start);
        let directive = &src[start..end];
        if is_define(directive) {
            return (directive.trim_end(), start, end);
        }
        return ("", start, start);
    }

    let mut parens = 0usize;
    let mut braces = 0usize;
    let mut i = start;
    while i < c.len() {
        match c.bytes[i] {
            b'/' if c.starts_with(i, b"/*") => {
                i = c.comment_end(i);
                continue;
            }
            b'/' if c.starts_with(i, b"//") => {
                i = c.line_end(i);
                continue;
            }
            b'"' | b'\'' => {
                i = c.literal_end(i);
                continue;
            }
            b'#' if parens == 0 && braces == 0 && c.at_line_start(i) => {
                return (src[start..i].trim_end(), start, i);
            }
            b'(' => parens += 1,
            b')' => parens = parens.saturating_sub(1),
            b'{' if parens == 0 && braces == 0 => {
                let head = &src[start..i];
                if is_function_head(head) {
                    return (head.trim_end(), start, c.block_end(i));
                }
                if opens_scope(head) {
                    return (head.trim_end(), start, i + 1);
                }
                let continues = has_aggregate_keyword(head) || head.trim_end().ends_with('=');
                i = c.block_end(i);
                if !continues {
                    return (src[start..i].trim_end(), start, i);
                }
                continue;
            }
            b'{' => braces += 1,
            b'}' if braces == 0 => return (src[start..i].trim_end(), start, i),
            b'}' => braces -= 1,
            b';' if parens == 0 && braces == 0 => return (&src[start..=i], start, i + 1),
            _ => {}
        }
        i += 1;
    }
    (src[start..].trim_end(), start, c.len())
}

fn is_define(directive: &str) -> bool {
    directive
        .trim_start_matches('#')
        .trim_start()
        .strip_prefix("define")
        .is_some_and(|rest| rest.starts_with(char::is_whitespace))
}

/// `namespace x {` and `extern "C" {` open a scope rather than a body.
fn opens_scope(head: &str) -> bool {
    let code = strip_comments(head);
    let code = code.trim();
    (code.starts_with("namespace") && !code.contains('='))
        || code.starts_with("extern \"C")
        || code.starts_with("inline namespace")
}

/// Whether `{` after `head` opens a function body.
fn is_function_head(head: &str) -> bool {
    let code = remove_attributes(&strip_comments(head));
    let mut code = code.trim_end();
    loop {
        let trimmed = ["const", "noexcept", "override", "final", "volatile"]
            .iter()
            .find_map(|q| {
                code.strip_suffix(q)
                    .filter(|rest| !rest.ends_with(|c: char| c.is_alphanumeric() || c == '_'))
            });
        match trimmed {
            Some(rest) => code = rest.trim_end(),
            None => break,
        }
    }
    code.ends_with(')')
}

/// `struct foo {` style heads that continue to a declarator and `;`.
fn has_aggregate_keyword(head: &str) -> bool {
    strip_comments(head)
        .split(|c: char| !(c.is_alphanumeric() || c == '_'))
        .any(|word| matches!(word, "struct" | "union" | "enum" | "class"))
}

/// Drop `__attribute__((...))` groups so they do not look like parameter lists.
pub(crate) fn remove_attributes(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut rest = text;
    while let Some(idx) = rest.find("__attribute__") {
        out.push_str(&rest[..idx]);
        let after = &rest[idx + "__attribute__".len()..];
        let trimmed = after.trim_start();
        if trimmed.starts_with('(') {
            let mut depth = 0usize;
            let mut end = trimmed.len();
            for (i, ch) in trimmed.char_indices() {
                match ch {
                    '(' => depth += 1,
                    ')' => {
                        depth -= 1;
                        if depth == 0 {
                            end = i + 1;
                            break;
                        }
                    }
                    _ => {}
                }
            }
            rest = &trimmed[end..];
        } else {
            rest = after;
        }
    }
    out.push_str(rest);
    out
}

/// Replace every comment with a single space, keeping literals intact.
#[must_use]
pub fn strip_comments(text: &str) -> String {
    mask_comments(text, false)
}

/// Replace comments with spaces byte for byte, so offsets and line numbers hold.
#[must_use]
pub fn blank_comments(text: &str) -> String {
    mask_comments(text, true)
}

fn mask_comments(text: &str, keep_lines: bool) -> String {
    let c = Cursor::new(text);
    let mut out = String::with_capacity(text.len());
    let mut i = 0;
    let mut copied = 0;
    while i < c.len() {
        match c.bytes[i] {
            b'/' if c.starts_with(i, b"/*") || c.starts_with(i, b"//") => {
                let end = if c.starts_with(i, b"/*") {
                    c.comment_end(i)
                } else {
                    c.line_end(i)
                };
                out.push_str(&text[copied..i]);
                if keep_lines {
                    out.extend(text[i..end].bytes().map(|b| if b == b'\n' { '\n' } else { ' ' }));
                } else {
                    out.push(' ');
                }
                i = end;
                copied = end;
            }
            b'"' | b'\'' => i = c.literal_end(i),
            _ => i += 1,
        }
    }
    out.push_str(&text[copied..]);
    out
}

/// Every doc comment in `source`, in file order.
pub fn doc_blocks(source: &str) -> impl Iterator<Item = DocBlock<'_>> {
    let c = Cursor::new(source);
    let mut pos = 0;
    std::iter::from_fn(move || {
        while pos < c.len() {
            let at = pos;
            match c.bytes[at] {
                b'/' if c.is_doc_start(at) => {
                    let src = c.src;
                    let end = c.comment_end(at);
                    pos = end;
                    return Some(DocBlock {
                        text: &src[at..end],
                        line: c.line_of(at),
                    });
                }
                b'/' if c.starts_with(at, b"/*") => pos = c.comment_end(at),
                b'/' if c.starts_with(at, b"//") => pos = c.line_end(at),
                b'"' | b'\'' => pos = c.literal_end(at),
                _ => pos = at + 1,
            }
        }
        None
    })
}
