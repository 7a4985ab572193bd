//! Readable outlines of subtest bodies.
//!
//! Works line by line. Comments become steps verbatim, `igt_require`,
//! `igt_assert*` and `igt_skip` become requirement, assertion and skip
//! steps, and other calls become "Call" steps. `if`/`else` blocks nest
//! their steps under the condition.

use std::sync::LazyLock;

use cdoc_core::Step;
use regex::Regex;

static BLOCK_COMMENT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"/\*+\s*(.+?)\s*\*/").unwrap());
static LINE_COMMENT: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^//\s*(.+)").unwrap());
static SKIP: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"igt_skip\s*\(").unwrap());
static REQUIRE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"igt_require\s*\((.+)").unwrap());
static ASSERT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"igt_assert(?:_eq|_neq|_lt|_lte|_f|_fd)?\s*\((.+)").unwrap()
});
static IGT_CALL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(igt_\w+|gem_\w+|kms_\w+|drmIoctl|drm_\w+|do_ioctl\w*)\s*\(").unwrap()
});
static CALL: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^(\w+)\s*\(").unwrap());
static ASSIGN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\w[\w.\->]*)\s*=\s*(.+)").unwrap());
static BRANCH: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(?:else\s+)?if\s*\((.+)\)\s*\{?$").unwrap());
static ELSE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^else\s*\{?$").unwrap());

/// Calls that are housekeeping rather than test steps.
const IGNORED: &[&str] = &[
    "close", "free", "munmap", "memset", "memcpy", "errno", "return", "break", "continue", "for",
    "while", "switch", "do", "sizeof",
];

const MAX_CONDITION: usize = 80;

/// Outline of `body`, the text between a subtest's braces.
#[must_use]
pub fn outline(body: &str) -> Vec<Step> {
    let lines: Vec<&str> = body.lines().map(str::trim).collect();
    collect(&lines)
}

fn collect(lines: &[&str]) -> Vec<Step> {
    let mut steps = Vec::new();
    let mut i = 0;
    let mut carry: Option<String> = None;

    while i < lines.len() || carry.is_some() {
        let line = match carry.take() {
            Some(line) => line,
            None => {
                i += 1;
                lines[i - 1].to_string()
            }
        };
        let line = line.trim_start_matches('}').trim();
        if line.is_empty() || line == "{" {
            continue;
        }

        let condition = if let Some(caps) = BRANCH.captures(line) {
            Some(caps[1].trim().to_string())
        } else if ELSE.is_match(line) {
            Some("otherwise".to_string())
        } else {
            None
        };
        let Some(condition) = condition else {
            if let Some(step) = action(line) {
                steps.push(step);
            }
            continue;
        };

        let arm = block(lines, i, line.ends_with('{'));
        let children = collect(&lines[arm.start..arm.end]);
        if !children.is_empty() {
            steps.push(Step::Branch {
                condition,
                steps: children,
            });
        }
        i = arm.next;
        // `} else {` on the closing line opens the next arm.
        if let Some(rest) = arm.closing.map(|l| l.trim_start_matches('}').trim())
            && rest.starts_with("else")
        {
            carry = Some(rest.to_string());
        }
    }
    dedupe(steps)
}

struct Block<'a> {
    start: usize,
    end: usize,
    next: usize,
    closing: Option<&'a str>,
}

/// Body lines of a branch whose header ends just before `from`.
fn block<'a>(lines: &[&'a str], from: usize, opened: bool) -> Block<'a> {
    let mut start = from;
    if !opened {
        match lines.get(from) {
            Some(&"{") => start = from + 1,
            Some(_) => {
                // Unbraced: a single statement.
                return Block {
                    start: from,
                    end: from + 1,
                    next: from + 1,
                    closing: None,
                };
            }
            None => {
                return Block {
                    start: from,
                    end: from,
                    next: from,
                    closing: None,
                };
            }
        }
    }
    let mut depth = 1i32;
    for (j, line) in lines.iter().enumerate().skip(start) {
        if depth == 1 && line.starts_with('}') {
            return Block {
                start,
                end: j,
                next: j + 1,
                closing: Some(line),
            };
        }
        depth += braces(line);
        if depth <= 0 {
            return Block {
                start,
                end: j,
                next: j + 1,
                closing: Some(line),
            };
        }
    }
    Block {
        start,
        end: lines.len(),
        next: lines.len(),
        closing: None,
    }
}

fn braces(line: &str) -> i32 {
    line.chars().fold(0, |n, c| match c {
        '{' => n + 1,
        '}' => n - 1,
        _ => n,
    })
}

fn action(line: &str) -> Option<Step> {
    if let Some(caps) = BLOCK_COMMENT.captures(line) {
        return sentence(&caps[1]);
    }
    if let Some(caps) = LINE_COMMENT.captures(line) {
        return sentence(&caps[1]);
    }
    if line.starts_with("/*") || line.starts_with('*') {
        return None;
    }
    if SKIP.is_match(line) {
        return Some(Step::Action("Skip if preconditions not met.".to_string()));
    }
    if let Some(caps) = REQUIRE.captures(line) {
        return Some(Step::Action(format!("Require `{}`.", call_args(&caps[1]))));
    }
    if let Some(caps) = ASSERT.captures(line) {
        let mut cond = call_args(&caps[1]);
        if cond.chars().count() > MAX_CONDITION {
            cond = cond.chars().take(MAX_CONDITION - 3).collect::<String>() + "...";
        }
        return Some(Step::Action(format!("Assert `{cond}`.")));
    }
    if let Some(caps) = IGT_CALL.captures(line) {
        return Some(Step::Action(format!("Call `{}()`.", &caps[1])));
    }
    if let Some(caps) = ASSIGN.captures(line)
        && let Some(call) = CALL.captures(caps[2].trim())
        && !IGNORED.contains(&&call[1])
    {
        return Some(Step::Action(format!("Set `{}` from `{}()`.", &caps[1], &call[1])));
    }
    if let Some(caps) = CALL.captures(line)
        && !IGNORED.contains(&&caps[1])
        && !caps[1].starts_with("__")
    {
        return Some(Step::Action(format!("Call `{}()`.", &caps[1])));
    }
    None
}

fn sentence(text: &str) -> Option<Step> {
    let text = text.trim();
    (text.chars().count() > 2)
        .then(|| Step::Action(format!("{}.", text.trim_end_matches('.'))))
}

/// Arguments of a call from the text after its `(`.
fn call_args(rest: &str) -> String {
    let rest = rest.trim();
    let rest = rest.strip_suffix(';').unwrap_or(rest).trim_end();
    rest.strip_suffix(')').unwrap_or(rest).trim().to_string()
}

fn is_code_step(step: &Step) -> bool {
    matches!(step, Step::Action(text)
        if ["Assert ", "Call ", "Set "].iter().any(|p| text.starts_with(p)))
}

fn is_comment_step(step: &Step) -> bool {
    matches!(step, Step::Action(text)
        if !["Assert ", "Call ", "Require ", "Set ", "Skip "].iter().any(|p| text.starts_with(p)))
}

/// A comment followed by the code it describes keeps only the comment.
fn dedupe(steps: Vec<Step>) -> Vec<Step> {
    let mut out: Vec<Step> = Vec::with_capacity(steps.len());
    let mut skip_next = false;
    for (idx, step) in steps.iter().enumerate() {
        if skip_next {
            skip_next = false;
            continue;
        }
        if is_comment_step(step) && steps.get(idx + 1).is_some_and(is_code_step) {
            skip_next = true;
        }
        out.push(step.clone());
    }
    out
}
