//! Resolve every doc string of a frozen registry.

use cdoc_core::Symbol;
use cdoc_markup::{Converter, Warning};
use serde::Serialize;

use crate::registry::Registry;

/// One converted doc string.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResolvedDoc {
    /// Anchor of the symbol, test or subtest the text belongs to.
    pub anchor: String,
    /// `description`, `returns` or `param <name>`.
    pub part: String,
    pub text: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<Warning>,
}

/// Convert descriptions, parameter texts and returns of every symbol and
/// test, preferring each owner's own group for ambiguous names.
#[must_use]
pub fn resolve_docs(registry: &Registry, auto_link: bool) -> Vec<ResolvedDoc> {
    let mut out = Vec::new();
    for symbol in registry.symbols() {
        let converter = Converter::new(registry)
            .auto_link(auto_link)
            .in_group(&symbol.group);
        symbol_docs(symbol, &converter, &mut out);
    }
    for test in registry.tests() {
        let converter = Converter::new(registry)
            .auto_link(auto_link)
            .in_group(&test.group);
        push(&converter, &test.anchor, "description", &test.description, &mut out);
        for subtest in &test.subtests {
            push(&converter, &subtest.anchor, "description", &subtest.description, &mut out);
        }
    }
    let warnings: usize = out.iter().map(|d| d.warnings.len()).sum();
    tracing::info!(docs = out.len(), warnings, "doc strings resolved");
    out
}

fn symbol_docs(symbol: &Symbol, converter: &Converter<'_, Registry>, out: &mut Vec<ResolvedDoc>) {
    push(converter, &symbol.anchor, "description", &symbol.description, out);
    for param in &symbol.params {
        if let Some(text) = &param.description {
            push(converter, &symbol.anchor, &format!("param {}", param.name), text, out);
        }
    }
    if let Some(returns) = &symbol.returns {
        push(converter, &symbol.anchor, "returns", returns, out);
    }
    for member in &symbol.members {
        symbol_docs(member, converter, out);
    }
}

fn push(
    converter: &Converter<'_, Registry>,
    anchor: &str,
    part: &str,
    text: &str,
    out: &mut Vec<ResolvedDoc>,
) {
    if text.trim().is_empty() {
        return;
    }
    let converted = converter.convert(text);
    out.push(ResolvedDoc {
        anchor: anchor.to_string(),
        part: part.to_string(),
        text: converted.text,
        warnings: converted.warnings,
    });
}
