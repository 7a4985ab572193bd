//! Anchor, slug, and sort helpers.
//!
//! Everything here is a pure function of its input so anchors and index
//! order stay the same no matter which order files were parsed in.

use crate::SymbolKind;

/// Bucket used for names with no letter after their underscore prefix.
pub const NON_ALPHA_BUCKET: char = '#';

/// Turn a qualified name into an anchor-safe slug.
///
/// Alphanumerics and `_` are kept, every other run of characters becomes a
/// single `-`. `core::engine_config.name` becomes `core-engine_config-name`.
#[must_use]
pub fn slug(qualified: &str) -> String {
    let mut out = String::with_capacity(qualified.len());
    let mut pending_dash = false;
    for ch in qualified.chars() {
        if ch.is_ascii_alphanumeric() || ch == '_' {
            if pending_dash && !out.is_empty() {
                out.push('-');
            }
            pending_dash = false;
            out.push(ch);
        } else {
            pending_dash = true;
        }
    }
    out
}

/// Anchor for a symbol: `{prefix}-{slug}`.
#[must_use]
pub fn symbol_anchor(kind: SymbolKind, qualified: &str) -> String {
    format!("{}-{}", kind.anchor_prefix(), slug(qualified))
}

/// Anchor for a test page entry.
#[must_use]
pub fn test_anchor(test: &str) -> String {
    format!("test-{test}")
}

/// Anchor for a subtest: `test@subtest`.
#[must_use]
pub fn subtest_anchor(test: &str, subtest: &str) -> String {
    format!("{test}@{subtest}")
}

/// Qualified name of a top-level symbol within a group.
#[must_use]
pub fn qualify(group: &str, name: &str) -> String {
    if group.is_empty() {
        name.to_string()
    } else {
        format!("{group}::{name}")
    }
}

/// Qualified name of a member under its owner's qualified name.
#[must_use]
pub fn qualify_member(owner_qualified: &str, member: &str) -> String {
    format!("{owner_qualified}.{member}")
}

/// Qualified name of a file symbol: `group/relative/path.c`.
#[must_use]
pub fn qualify_file(group: &str, rel_path: &str) -> String {
    if group.is_empty() {
        rel_path.to_string()
    } else {
        format!("{group}/{rel_path}")
    }
}

/// Sort key for A–Z indexes.
///
/// Leading underscores are ignored and comparison is case-insensitive; the
/// full original name breaks ties.
#[must_use]
pub fn sort_key(name: &str) -> (String, String) {
    (
        name.trim_start_matches('_').to_lowercase(),
        name.to_string(),
    )
}

/// The A–Z bucket a name is filed under.
#[must_use]
pub fn index_letter(name: &str) -> char {
    name.trim_start_matches('_')
        .chars()
        .next()
        .filter(char::is_ascii_alphabetic)
        .map_or(NON_ALPHA_BUCKET, |c| c.to_ascii_uppercase())
}

/// Normalize a metadata field name.
///
/// Case-insensitive, with `_`, `-` and spaces treated as one separator, so
/// `Sub-category`, `Sub category` and `sub_category` all become
/// `sub_category`.
#[must_use]
pub fn field_key(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for ch in raw.trim().chars() {
        if matches!(ch, '_' | '-') || ch.is_whitespace() {
            if !out.is_empty() && !out.ends_with('_') {
                out.push('_');
            }
        } else {
            out.extend(ch.to_lowercase());
        }
    }
    while out.ends_with('_') {
        out.pop();
    }
    out
}
