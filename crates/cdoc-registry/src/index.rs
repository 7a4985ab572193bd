//! A–Z symbol indexes.

use cdoc_core::naming::{NON_ALPHA_BUCKET, index_letter, sort_key};
use cdoc_core::{Symbol, SymbolKind};
use serde::{Deserialize, Serialize};

/// One row of an index page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexEntry {
    pub name: String,
    pub kind: SymbolKind,
    pub group: String,
    pub anchor: String,
}

/// All entries filed under one letter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexBucket {
    pub letter: char,
    pub entries: Vec<IndexEntry>,
}

/// Build an A–Z index over top-level symbols.
///
/// File symbols and members are left out. Buckets come in letter order
/// with the non-alphabetic bucket last.
pub fn az_index<'a>(symbols: impl IntoIterator<Item = &'a Symbol>) -> Vec<IndexBucket> {
    let mut rows: Vec<(&Symbol, (String, String))> = symbols
        .into_iter()
        .filter(|s| s.kind != SymbolKind::File)
        .map(|s| (s, sort_key(&s.name)))
        .collect();
    rows.sort_by(|(a, ka), (b, kb)| {
        ka.cmp(kb)
            .then_with(|| a.group.cmp(&b.group))
            .then_with(|| a.qualified_name.cmp(&b.qualified_name))
    });

    let mut buckets: Vec<IndexBucket> = Vec::new();
    let mut other = Vec::new();
    for (symbol, _) in rows {
        let entry = IndexEntry {
            name: symbol.name.clone(),
            kind: symbol.kind,
            group: symbol.group.clone(),
            anchor: symbol.anchor.clone(),
        };
        let letter = index_letter(&symbol.name);
        if letter == NON_ALPHA_BUCKET {
            other.push(entry);
            continue;
        }
        match buckets.last_mut() {
            Some(bucket) if bucket.letter == letter => bucket.entries.push(entry),
            _ => buckets.push(IndexBucket {
                letter,
                entries: vec![entry],
            }),
        }
    }
    if !other.is_empty() {
        buckets.push(IndexBucket {
            letter: NON_ALPHA_BUCKET,
            entries: other,
        });
    }
    buckets
}

#[cfg(test)]
mod tests {
    use super::*;
    use cdoc_core::Location;
    use pretty_assertions::assert_eq;

    fn function(name: &str) -> Symbol {
        Symbol::new(SymbolKind::Function, name, Location::new("engine.c", 1)).in_group("core")
    }

    fn letters(index: &[IndexBucket]) -> Vec<(char, Vec<&str>)> {
        index
            .iter()
            .map(|b| (b.letter, b.entries.iter().map(|e| e.name.as_str()).collect()))
            .collect()
    }

    #[test]
    fn underscore_prefixes_sort_under_the_following_letter() {
        let symbols = [function("_zz_helper"), function("__engine_reset"), function("engine_init")];
        assert_eq!(
            letters(&az_index(&symbols)),
            vec![
                ('E', vec!["engine_init", "__engine_reset"]),
                ('Z', vec!["_zz_helper"]),
            ]
        );
    }

    #[test]
    fn case_insensitive_with_full_name_tiebreak() {
        let symbols = [function("Engine"), function("engine"), function("alpha")];
        assert_eq!(
            letters(&az_index(&symbols)),
            vec![('A', vec!["alpha"]), ('E', vec!["Engine", "engine"])]
        );
    }

    #[test]
    fn non_alphabetic_names_go_last() {
        let symbols = [function("__"), function("zeta")];
        let index = az_index(&symbols);
        assert_eq!(letters(&index), vec![('Z', vec!["zeta"]), ('#', vec!["__"])]);
    }

    #[test]
    fn files_are_not_indexed() {
        let symbols = [Symbol::file("src/engine.c").in_group("core"), function("engine_init")];
        let index = az_index(&symbols);
        assert_eq!(index.len(), 1);
        assert_eq!(index[0].entries[0].anchor, "func-core-engine_init");
    }
}
