//! IGT test metadata.
//!
//! A test file describes its subtests in up to three places:
//!
//! 1. `igt_describe("...")` calls before `igt_subtest("name")` in code
//! 2. standalone doc comments holding `SUBTEST:` blocks
//! 3. the main doc comment holding `TEST:` and embedded `SUBTEST:` blocks
//!
//! The merge takes each subtest's description from the first source that
//! has one, in that order. Other fields are filled key by key in the same
//! order, so a lower source only adds keys the higher ones lack.

use std::collections::HashMap;
use std::sync::LazyLock;

use cdoc_core::naming::field_key;
use cdoc_core::{Metadata, SourceFile, Step, Subtest, Test};
use regex::Regex;

use crate::comment::clean_comment;
use crate::extract::{Cursor, blank_comments, doc_blocks};
use crate::steps::outline;

static KEY_VALUE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^([A-Za-z][\w \t-]*?)\s*:\s*(.*)$").unwrap());

static DESCRIBE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\bigt_describe(?:_f)?\s*\(").unwrap());

static SUBTEST_CALL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"\bigt_subtest(_f|_with_dynamic|_with_dynamic_f)?\s*\(\s*"((?:[^"\\]|\\.)*)""#)
        .unwrap()
});

static STRING: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#""((?:[^"\\]|\\.)*)""#).unwrap());

static FORMAT_SPEC: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"%[-+ #0-9.]*[a-zA-Z]").unwrap());

const MAX_KEY_WORDS: usize = 3;

/// Result of scanning one file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TestScan {
    pub test: Option<Test>,
    /// Malformed blocks that were skipped.
    pub warnings: Vec<String>,
}

/// Whether a subtest name is a `printf` template for a generated family.
#[must_use]
pub fn is_format_name(name: &str) -> bool {
    FORMAT_SPEC.is_match(name)
}

/// Collect and merge the test metadata of `file`.
///
/// With `with_steps`, each subtest found in code also gets an outline of
/// its body.
#[must_use]
pub fn scan_tests(file: &SourceFile, with_steps: bool) -> TestScan {
    let mut warnings = Vec::new();
    let mut main: Option<Block> = None;
    let mut standalone: Vec<Subtest> = Vec::new();

    for doc in doc_blocks(&file.content) {
        let text = clean_comment(doc.text);
        if !text.contains("TEST:") {
            continue;
        }
        let block = parse_block(&text, &file.rel_path, doc.line, &mut warnings);
        if block.test.is_some() && main.is_none() {
            main = Some(block);
        } else {
            standalone.extend(block.subtests);
        }
    }

    let code = code_subtests(&file.content, with_steps);
    let main = main.unwrap_or_default();
    if main.test.is_none() && main.subtests.is_empty() && code.is_empty() && standalone.is_empty()
    {
        return TestScan {
            test: None,
            warnings,
        };
    }

    let name = main
        .test
        .clone()
        .filter(|n| !n.is_empty())
        .unwrap_or_else(|| file.stem().to_string());
    let mut test = Test::new(name, file.rel_path.clone());
    test.description = main.description.clone().unwrap_or_default();
    test.fields = main.fields.clone();

    for subtest in merge(&code, &standalone, &main.subtests) {
        test.push_subtest(subtest);
    }

    TestScan {
        test: Some(test),
        warnings,
    }
}

// ── Doc comment blocks ──────────────────────────────────────────────

#[derive(Debug, Default)]
struct Block {
    test: Option<String>,
    description: Option<String>,
    fields: Metadata,
    subtests: Vec<Subtest>,
}

/// Split cleaned comment text into `Key: value` entries.
///
/// A line indented deeper than its key continues the value, as does any
/// line that is not itself a key. A blank line closes the entry.
fn entries(text: &str) -> Vec<(String, String)> {
    let mut out: Vec<(String, String)> = Vec::new();
    let mut open: Option<usize> = None;
    for line in text.lines() {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            open = None;
            continue;
        }
        let indent = line.len() - line.trim_start().len();
        let continues = open.is_some_and(|key_indent| indent > key_indent);
        if !continues && let Some((key, value)) = key_value(trimmed) {
            out.push((key, value));
            open = Some(indent);
            continue;
        }
        if open.is_some()
            && let Some((_, value)) = out.last_mut()
        {
            if !value.is_empty() {
                value.push(' ');
            }
            value.push_str(trimmed);
        }
    }
    out
}

fn key_value(line: &str) -> Option<(String, String)> {
    let caps = KEY_VALUE.captures(line)?;
    let key = caps[1].trim();
    let value = caps[2].trim();
    if key.split_whitespace().count() > MAX_KEY_WORDS || value.starts_with("//") {
        return None;
    }
    Some((key.to_string(), value.to_string()))
}

fn parse_block(text: &str, file: &str, line: u32, warnings: &mut Vec<String>) -> Block {
    let mut block = Block::default();
    // Subtests the following fields apply to; consecutive SUBTEST lines share.
    let mut group: Vec<usize> = Vec::new();
    let mut in_subtests = false;
    let mut after_subtest = false;

    for (key, value) in entries(text) {
        match field_key(&key).as_str() {
            "test" => {
                block.test = Some(value);
                group.clear();
                in_subtests = false;
                after_subtest = false;
            }
            "subtest" => {
                if !after_subtest {
                    group.clear();
                }
                after_subtest = true;
                in_subtests = true;
                if value.is_empty() {
                    tracing::warn!(file, line, "SUBTEST block without a name skipped");
                    warnings.push(format!("{file}:{line}: SUBTEST block without a name skipped"));
                } else if !is_format_name(&value) {
                    group.push(block.subtests.len());
                    block.subtests.push(Subtest::new(value));
                }
            }
            _ => {
                after_subtest = false;
                if in_subtests {
                    for &i in &group {
                        let subtest = &mut block.subtests[i];
                        set_field(&mut subtest.description, &mut subtest.fields, &key, &value);
                    }
                } else {
                    let mut description = block.description.take().unwrap_or_default();
                    set_field(&mut description, &mut block.fields, &key, &value);
                    block.description = (!description.is_empty()).then_some(description);
                }
            }
        }
    }
    block
}

fn set_field(description: &mut String, fields: &mut Metadata, key: &str, value: &str) {
    if field_key(key) == "description" {
        value.clone_into(description);
    } else {
        fields.insert(key, value);
    }
}

// ── In-code declarations ────────────────────────────────────────────

#[derive(Debug)]
struct CodeSubtest {
    name: String,
    description: String,
    dynamic: bool,
    line: u32,
    steps: Vec<Step>,
}

fn code_subtests(content: &str, with_steps: bool) -> Vec<CodeSubtest> {
    let code = blank_comments(content);
    let cursor = Cursor::new(&code);
    let mut found: Vec<CodeSubtest> = Vec::new();
    let mut pending: Vec<String> = Vec::new();
    let mut offset = 0;
    let mut skip_until = 0;

    for line in code.split_inclusive('\n') {
        let start = offset;
        offset += line.len();
        if offset <= skip_until {
            continue;
        }
        // Scanning resumes after a describe call that closed on this line.
        let mut from = skip_until.saturating_sub(start);
        let mut in_sequence = from > 0;
        let trimmed = line.trim();

        if let Some(m) = DESCRIBE.find(&line[from..]) {
            let open = start + from + m.end() - 1;
            let close = paren_end(&cursor, open);
            pending.push(literal_text(&code[open..close]));
            skip_until = close;
            if close >= offset {
                continue;
            }
            from = close - start;
            in_sequence = true;
        }

        if let Some(caps) = SUBTEST_CALL.captures(&line[from..]) {
            let description = pending.join(" ");
            pending.clear();
            let name = unescape(&caps[2]);
            if is_format_name(&name) || found.iter().any(|s| s.name == name) {
                continue;
            }
            let call = start + from + caps.get(0).map_or(0, |m| m.start());
            let steps = if with_steps {
                body_of(&cursor, content, call)
                    .map(outline)
                    .unwrap_or_default()
            } else {
                Vec::new()
            };
            found.push(CodeSubtest {
                name,
                description,
                dynamic: caps.get(1).is_some_and(|m| m.as_str().contains("dynamic")),
                line: cursor.line_of(call),
                steps,
            });
            continue;
        }

        // Anything but braces, blank lines and igt_ calls breaks the
        // describe -> subtest sequence.
        let neutral =
            trimmed.is_empty() || trimmed.starts_with(['{', '}']) || trimmed.starts_with("igt_");
        if !(in_sequence || neutral) {
            pending.clear();
        }
    }
    found
}

/// Byte after the `)` matching the `(` at `open`.
fn paren_end(c: &Cursor<'_>, open: usize) -> usize {
    let mut depth = 0usize;
    let mut i = open;
    while i < c.len() {
        match c.bytes[i] {
            b'"' | b'\'' => {
                i = c.literal_end(i);
                continue;
            }
            b'(' => depth += 1,
            b')' => {
                depth = depth.saturating_sub(1);
                if depth == 0 {
                    return i + 1;
                }
            }
            _ => {}
        }
        i += 1;
    }
    c.len()
}

/// Body text of the `igt_subtest*(...) { ... }` call starting at `call`.
fn body_of<'a>(c: &Cursor<'_>, content: &'a str, call: usize) -> Option<&'a str> {
    let open_paren = call + c.src[call..].find('(')?;
    let after = paren_end(c, open_paren);
    let brace = after + c.src[after..].find(|ch: char| !ch.is_whitespace())?;
    if c.bytes.get(brace) != Some(&b'{') {
        return None;
    }
    let end = c.block_end(brace);
    content.get(brace + 1..end.saturating_sub(1))
}

/// Concatenated string literals of a call's argument text.
fn literal_text(args: &str) -> String {
    STRING
        .captures_iter(args)
        .map(|caps| unescape(&caps[1]))
        .collect::<String>()
        .trim()
        .to_string()
}

fn unescape(text: &str) -> String {
    text.replace("\\n", " ")
        .replace("\\t", " ")
        .replace("\\\"", "\"")
        .replace("\\\\", "\\")
}

// ── Merge ───────────────────────────────────────────────────────────

/// One subtest per name, in order of first appearance: main block, then
/// code, then standalone blocks.
fn merge(code: &[CodeSubtest], standalone: &[Subtest], main: &[Subtest]) -> Vec<Subtest> {
    let code_by_name: HashMap<&str, &CodeSubtest> =
        code.iter().map(|s| (s.name.as_str(), s)).collect();

    let mut order: Vec<&str> = Vec::new();
    let names = main
        .iter()
        .map(|s| s.name.as_str())
        .chain(code.iter().map(|s| s.name.as_str()))
        .chain(standalone.iter().map(|s| s.name.as_str()));
    for name in names {
        if !order.contains(&name) {
            order.push(name);
        }
    }

    order
        .into_iter()
        .map(|name| {
            let code = code_by_name.get(name).copied();
            let code_fields = code.map(|c| {
                let mut fields = Metadata::new();
                if c.dynamic {
                    fields.insert("dynamic", "true");
                }
                fields
            });

            // Highest priority first.
            let mut sources: Vec<(&str, &Metadata)> = Vec::new();
            if let (Some(c), Some(fields)) = (code, code_fields.as_ref()) {
                sources.push((c.description.as_str(), fields));
            }
            sources.extend(
                standalone
                    .iter()
                    .filter(|s| s.name == name)
                    .map(|s| (s.description.as_str(), &s.fields)),
            );
            sources.extend(
                main.iter()
                    .filter(|s| s.name == name)
                    .map(|s| (s.description.as_str(), &s.fields)),
            );

            let mut subtest = Subtest::new(name);
            subtest.description = sources
                .iter()
                .map(|(description, _)| *description)
                .find(|d| !d.is_empty())
                .unwrap_or_default()
                .to_string();
            for (_, fields) in &sources {
                subtest.fields.fill_from(fields);
            }
            if let Some(c) = code {
                subtest.line = Some(c.line);
                subtest.steps.clone_from(&c.steps);
            }
            subtest
        })
        .collect()
}
