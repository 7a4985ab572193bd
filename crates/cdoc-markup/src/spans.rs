//! Single-pass tokenizer over doc text.
//!
//! Splits text into code fences, inline code spans, reference roles and
//! plain text. Both markup passes work from this split, so code is never
//! rewritten and a role is seen exactly once.

use std::sync::LazyLock;

use regex::Regex;

use crate::role::Role;

static ROLE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^:(?:(c|cpp):)?([a-z]+):`([^`\n]+)`").unwrap()
});

/// One piece of tokenized text. Every variant borrows its raw source, so
/// concatenating `raw()` of all spans gives back the input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Span<'a> {
    Text(&'a str),
    /// A fenced code block, fences included.
    Fence(&'a str),
    /// An inline code span delimited by `ticks` backticks.
    Code {
        raw: &'a str,
        content: &'a str,
        ticks: usize,
    },
    /// ``role:`target` `` with an optional `c:`/`cpp:` domain.
    Role {
        raw: &'a str,
        role: Role,
        target: &'a str,
    },
}

impl<'a> Span<'a> {
    #[must_use]
    pub const fn raw(&self) -> &'a str {
        match self {
            Self::Text(raw) | Self::Fence(raw) => raw,
            Self::Code { raw, .. } | Self::Role { raw, .. } => raw,
        }
    }
}

/// Split `text` into spans in order.
#[must_use]
pub fn tokenize<'a>(text: &'a str) -> Vec<Span<'a>> {
    let bytes = text.as_bytes();
    let mut spans = Vec::new();
    let mut text_start = 0;
    let mut i = 0;

    let flush = |spans: &mut Vec<Span<'a>>, from: usize, to: usize| {
        if from < to {
            spans.push(Span::Text(&text[from..to]));
        }
    };

    while i < bytes.len() {
        let at_line_start = i == 0 || bytes[i - 1] == b'\n';
        let line_indent = if at_line_start {
            bytes[i..]
                .iter()
                .take_while(|&&b| b == b' ' || b == b'\t')
                .count()
        } else {
            0
        };

        if at_line_start && let Some(end) = fence_end(text, i + line_indent) {
            flush(&mut spans, text_start, i);
            spans.push(Span::Fence(&text[i..end]));
            i = end;
            text_start = i;
            continue;
        }

        match bytes[i] {
            b'`' => {
                let ticks = bytes[i..].iter().take_while(|&&b| b == b'`').count();
                if let Some(close) = closing_ticks(text, i + ticks, ticks) {
                    flush(&mut spans, text_start, i);
                    let end = close + ticks;
                    spans.push(Span::Code {
                        raw: &text[i..end],
                        content: &text[i + ticks..close],
                        ticks,
                    });
                    i = end;
                    text_start = i;
                } else {
                    i += ticks;
                }
            }
            b':' => {
                if let Some(caps) = ROLE.captures(&text[i..])
                    && let Some(role) = Role::from_name(&caps[2])
                    && let Some(whole) = caps.get(0)
                    && let Some(target) = caps.get(3)
                {
                    flush(&mut spans, text_start, i);
                    let end = i + whole.end();
                    spans.push(Span::Role {
                        raw: &text[i..end],
                        role,
                        target: &text[i + target.start()..i + target.end()],
                    });
                    i = end;
                    text_start = i;
                } else {
                    i += 1;
                }
            }
            _ => i += 1,
        }
    }
    flush(&mut spans, text_start, bytes.len());
    spans
}

/// End of a fenced block opening at `pos`, through its closing fence line.
fn fence_end(text: &str, pos: usize) -> Option<usize> {
    let rest = &text[pos..];
    let marker = if rest.starts_with("```") {
        "```"
    } else if rest.starts_with("~~~") {
        "~~~"
    } else {
        return None;
    };
    let open_end = rest.find('\n').map_or(text.len(), |n| pos + n + 1);
    let mut line_start = open_end;
    while line_start < text.len() {
        let line_end = text[line_start..]
            .find('\n')
            .map_or(text.len(), |n| line_start + n);
        if text[line_start..line_end].trim_start().starts_with(marker) {
            return Some((line_end + 1).min(text.len()));
        }
        line_start = line_end + 1;
    }
    // Unclosed fence runs to the end.
    Some(text.len())
}

/// Start of a run of exactly `ticks` backticks after `from` on the same
/// paragraph.
fn closing_ticks(text: &str, from: usize, ticks: usize) -> Option<usize> {
    let bytes = text.as_bytes();
    let mut i = from;
    while i < bytes.len() {
        match bytes[i] {
            b'`' => {
                let run = bytes[i..].iter().take_while(|&&b| b == b'`').count();
                if run == ticks {
                    return Some(i);
                }
                i += run;
            }
            b'\n' if bytes.get(i + 1) == Some(&b'\n') => return None,
            _ => i += 1,
        }
    }
    None
}
