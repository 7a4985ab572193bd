//! gtk-doc normalization.
//!
//! Rewrites legacy gtk-doc markup into the role and directive syntax the
//! rest of the pipeline understands:
//!
//! | gtk-doc              | becomes                  |
//! |----------------------|--------------------------|
//! | `foo()`              | ``:func:`foo` ``         |
//! | `#Foo`               | ``:type:`Foo` ``         |
//! | `#Foo.bar`           | ``:member:`Foo.bar` ``   |
//! | `%FOO`               | ``:const:`FOO` ``        |
//! | `@p: text`           | `:param p: text`         |
//! | `Returns: text`      | `:returns: text`         |
//! | `\|[ code ]\|`       | a fenced code block      |
//!
//! `|[ ]|` regions are turned into fences first. Fences, inline code and
//! existing roles are then set aside so no rule touches them, which also
//! makes the pass idempotent. Spans made from `<literal>` are set aside
//! the same way as soon as they exist.

use std::sync::LazyLock;

use regex::{Captures, Regex};

use crate::spans::{Span, tokenize};

static CODE_BLOCK: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?s)\|\[(?:\s*<!--\s*language="(\w+)"\s*-->)?[ \t]*\n?(.*?)\]\|"#).unwrap()
});
static LITERAL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<literal>(.+?)</literal>").unwrap());
static EMPHASIS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<emphasis>(.+?)</emphasis>").unwrap());
static FUNCTION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"([A-Za-z_]\w*)\(\)").unwrap());
static TYPE_REF: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"#([A-Za-z_]\w*)(?:\.([A-Za-z_]\w*))?").unwrap());
static CONSTANT: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"%([A-Z_]\w*)").unwrap());
static PARAM_LINE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^@(\w+):[ \t]*(.+)$").unwrap());
static RETURNS_LINE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^(?:Returns?|Return value):[ \t]*(.+)$").unwrap());
static MENTION: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"@([A-Za-z_]\w*)").unwrap());

const HOLD_OPEN: char = '\u{E000}';
const HOLD_CLOSE: char = '\u{E001}';

/// Rewrite gtk-doc markup in `text`.
#[must_use]
pub fn normalize(text: &str) -> String {
    let text = CODE_BLOCK.replace_all(text, |caps: &Captures<'_>| {
        let language = caps.get(1).map_or("c", |m| m.as_str()).to_lowercase();
        format!("\n```{language}\n{}\n```\n", caps[2].trim_end())
    });

    let (text, mut held) = hold_code(&text);

    let text = LITERAL.replace_all(&text, |caps: &Captures<'_>| {
        hold(&mut held, format!("``{}``", &caps[1]))
    });
    let text = EMPHASIS.replace_all(&text, "*$1*");
    let text = rewrite(&text, &FUNCTION, |caps, before, after| {
        let clear = before.is_none_or(|c| !is_word(c) && !"`\\#@%:".contains(c));
        (clear && after != Some('`')).then(|| format!(":func:`{}`", &caps[1]))
    });
    let text = rewrite(&text, &TYPE_REF, |caps, before, _| {
        if before.is_some_and(|c| is_word(c) || c == '\\' || c == '&') {
            return None;
        }
        Some(match caps.get(2) {
            Some(field) => format!(":member:`{}.{}`", &caps[1], field.as_str()),
            None => format!(":type:`{}`", &caps[1]),
        })
    });
    let text = rewrite(&text, &CONSTANT, |caps, before, _| {
        before
            .is_none_or(|c| !is_word(c) && c != '\\')
            .then(|| format!(":const:`{}`", &caps[1]))
    });
    let text = PARAM_LINE.replace_all(&text, ":param $1: $2");
    let text = RETURNS_LINE.replace_all(&text, ":returns: $1");
    let text = rewrite(&text, &MENTION, |caps, before, _| {
        before
            .is_none_or(|c| !is_word(c) && c != '\\')
            .then(|| format!("``{}``", &caps[1]))
    });

    restore(&text, &held)
}

fn is_word(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

/// Replace fences, code spans and roles with placeholders.
fn hold_code(text: &str) -> (String, Vec<String>) {
    let mut out = String::with_capacity(text.len());
    let mut held = Vec::new();
    for span in tokenize(text) {
        match span {
            Span::Text(raw) => out.push_str(raw),
            other => out.push_str(&hold(&mut held, other.raw().to_string())),
        }
    }
    (out, held)
}

/// Store `raw` and return the placeholder standing in for it.
fn hold(held: &mut Vec<String>, raw: String) -> String {
    let placeholder = format!("{HOLD_OPEN}{}{HOLD_CLOSE}", held.len());
    held.push(raw);
    placeholder
}

fn restore(text: &str, held: &[String]) -> String {
    let mut out = String::with_capacity(text.len());
    let mut rest = text;
    while let Some(open) = rest.find(HOLD_OPEN) {
        out.push_str(&rest[..open]);
        let after = &rest[open + HOLD_OPEN.len_utf8()..];
        let Some(close) = after.find(HOLD_CLOSE) else {
            rest = &rest[open..];
            break;
        };
        match after[..close].parse::<usize>().ok().and_then(|i| held.get(i)) {
            Some(raw) => out.push_str(raw),
            None => out.push_str(&rest[open..open + HOLD_OPEN.len_utf8() + close + HOLD_CLOSE.len_utf8()]),
        }
        rest = &after[close + HOLD_CLOSE.len_utf8()..];
    }
    out.push_str(rest);
    out
}

/// `replace_all` with access to the characters around each match.
///
/// `f` returns `None` to leave a match alone.
fn rewrite(
    text: &str,
    re: &Regex,
    mut f: impl FnMut(&Captures<'_>, Option<char>, Option<char>) -> Option<String>,
) -> String {
    let mut out = String::with_capacity(text.len());
    let mut last = 0;
    for caps in re.captures_iter(text) {
        let Some(m) = caps.get(0) else { continue };
        let before = text[..m.start()].chars().next_back();
        let after = text[m.end()..].chars().next();
        if let Some(replacement) = f(&caps, before, after) {
            out.push_str(&text[last..m.start()]);
            out.push_str(&replacement);
            last = m.end();
        }
    }
    out.push_str(&text[last..]);
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    #[rstest]
    #[case::function("Call foo() first.", "Call :func:`foo` first.")]
    #[case::type_ref("A #Engine handle.", "A :type:`Engine` handle.")]
    #[case::member("Set #Engine.flags now.", "Set :member:`Engine.flags` now.")]
    #[case::constant("Pass %ENGINE_FAST.", "Pass :const:`ENGINE_FAST`.")]
    #[case::param("@engine: the engine", ":param engine: the engine")]
    #[case::returns("Returns: zero on success", ":returns: zero on success")]
    #[case::return_value("Return value: zero", ":returns: zero")]
    #[case::code_block("|[ x = 1; ]|", "\n```c\nx = 1;\n```\n")]
    #[case::code_language(
        "|[<!-- language=\"Python\" -->\nprint(foo())\n]|",
        "\n```python\nprint(foo())\n```\n"
    )]
    #[case::literal("Pass <literal>NULL</literal>.", "Pass ``NULL``.")]
    #[case::literal_keeps_markup(
        "Set <literal>#Foo</literal> to <literal>%BAR</literal>, not #Foo.",
        "Set ``#Foo`` to ``%BAR``, not :type:`Foo`."
    )]
    #[case::emphasis("You <emphasis>must</emphasis>.", "You *must*.")]
    #[case::mention("Uses @flags here.", "Uses ``flags`` here.")]
    #[case::printf("Format with %s and %d.", "Format with %s and %d.")]
    #[case::inline_code("Leave `foo()` alone.", "Leave `foo()` alone.")]
    #[case::email("Mail user@example.com.", "Mail user@example.com.")]
    #[case::param_body(
        "@cb: called from engine_run()",
        ":param cb: called from :func:`engine_run`"
    )]
    #[case::existing_role("See :func:`foo` and bar().", "See :func:`foo` and :func:`bar`.")]
    fn conversion_table(#[case] input: &str, #[case] expected: &str) {
        assert_eq!(normalize(input), expected);
        assert_eq!(normalize(expected), expected, "second pass changed the text");
    }

    #[test]
    fn whole_comment() {
        let input = "engine_run:\n@engine: a #Engine\n@flags: %ENGINE_FAST or 0\n\nRuns one step, like engine_step().\n\nReturns: %TRUE on success";
        assert_eq!(
            normalize(input),
            "engine_run:\n:param engine: a :type:`Engine`\n:param flags: :const:`ENGINE_FAST` or 0\n\nRuns one step, like :func:`engine_step`.\n\n:returns: :const:`TRUE` on success"
        );
    }

    #[test]
    fn fenced_blocks_are_untouched() {
        let input = "Example:\n```c\nfoo(); /* #Engine %FLAG */\n```\n";
        assert_eq!(normalize(input), input);
    }
}
