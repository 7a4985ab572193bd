//! `:param name:` and `:returns:` directives.
//!
//! Directives are lifted out of a description into the symbol's parameter
//! descriptions and returns text. A directive continues on following lines
//! that are indented; a blank or unindented line ends it.

use std::sync::LazyLock;

use cdoc_core::{Param, Symbol};
use regex::Regex;

static PARAM: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^:param\s+(?:[^:]*\s)?([A-Za-z_]\w*|\.\.\.)\s*:\s?(.*)$").unwrap()
});

static RETURNS: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^:returns?:\s?(.*)$").unwrap());

/// A description with its directives split out.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Directives {
    pub description: String,
    pub params: Vec<(String, String)>,
    pub returns: Option<String>,
}

#[derive(Clone, Copy)]
enum Open {
    Text,
    Param(usize),
    Returns,
}

/// Split `text`, dropping a leading `name:` header for `symbol_name`.
#[must_use]
pub fn split(text: &str, symbol_name: &str) -> Directives {
    let mut out = Directives::default();
    let mut lines: Vec<&str> = Vec::new();
    let mut open = Open::Text;

    for line in text.lines() {
        let trimmed = line.trim();
        if let Some(caps) = PARAM.captures(trimmed) {
            out.params.push((caps[1].to_string(), caps[2].trim().to_string()));
            open = Open::Param(out.params.len() - 1);
            continue;
        }
        if let Some(caps) = RETURNS.captures(trimmed) {
            out.returns = Some(caps[1].trim().to_string());
            open = Open::Returns;
            continue;
        }
        let continues = !trimmed.is_empty() && line.starts_with(char::is_whitespace);
        match open {
            Open::Param(i) if continues => append(&mut out.params[i].1, trimmed),
            Open::Returns if continues => {
                if let Some(returns) = &mut out.returns {
                    append(returns, trimmed);
                }
            }
            _ => {
                open = Open::Text;
                lines.push(line);
            }
        }
    }

    let header = format!("{symbol_name}:");
    if let Some(first) = lines.iter().position(|l| !l.trim().is_empty())
        && lines[first].trim() == header
    {
        lines.remove(first);
    }
    out.description = lines.join("\n").trim().to_string();
    out
}

fn append(target: &mut String, text: &str) {
    if !target.is_empty() {
        target.push(' ');
    }
    target.push_str(text);
}

/// Move directives from `symbol.description` onto the symbol.
///
/// A directive naming a parameter the declaration does not have is kept as
/// an untyped parameter so the text is not lost.
pub fn apply(symbol: &mut Symbol) {
    let split = split(&symbol.description, &symbol.name);
    symbol.description = split.description;
    for (name, text) in split.params {
        match symbol.params.iter_mut().find(|p| p.name == name) {
            Some(param) => param.description = Some(text),
            None => {
                let mut param = Param::new(name, None);
                param.description = Some(text);
                symbol.params.push(param);
            }
        }
    }
    if split.returns.is_some() {
        symbol.returns = split.returns;
    }
}
