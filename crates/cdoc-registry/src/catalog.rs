//! Test catalogs grouped by a metadata field, for "By …" pages.

use std::collections::BTreeMap;

use cdoc_core::Test;
use serde::{Deserialize, Serialize};

/// Bucket for entries that do not carry the field.
pub const UNCATEGORIZED: &str = "Uncategorized";

/// Whether a field is read from tests or from their subtests.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldLevel {
    Test,
    Subtest,
}

/// Decide the level of `field` by where it appears more often.
///
/// Ties, including a field that appears nowhere, go to the test level.
pub fn field_level<'a>(tests: impl IntoIterator<Item = &'a Test>, field: &str) -> FieldLevel {
    let (mut test_hits, mut sub_hits) = (0usize, 0usize);
    for test in tests {
        test_hits += usize::from(test.fields.contains(field));
        sub_hits += test.subtests.iter().filter(|s| s.fields.contains(field)).count();
    }
    if sub_hits > test_hits {
        FieldLevel::Subtest
    } else {
        FieldLevel::Test
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogEntry {
    pub test: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subtest: Option<String>,
    pub anchor: String,
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogBucket {
    pub value: String,
    pub entries: Vec<CatalogEntry>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Catalog {
    pub field: String,
    pub level: FieldLevel,
    pub buckets: Vec<CatalogBucket>,
}

/// Group tests, or their subtests, by the value of `field`.
///
/// Subtests without their own value inherit the test's. Buckets sort by
/// value case-insensitively with [`UNCATEGORIZED`] last; entries sort by
/// lowercased name.
pub fn group_by<'a, I>(tests: I, field: &str) -> Catalog
where
    I: IntoIterator<Item = &'a Test>,
    I::IntoIter: Clone,
{
    let tests = tests.into_iter();
    let level = field_level(tests.clone(), field);

    let mut buckets: BTreeMap<(String, String), Vec<CatalogEntry>> = BTreeMap::new();
    let mut uncategorized = Vec::new();
    let mut place = |value: Option<&str>, entry: CatalogEntry| match value
        .map(str::trim)
        .filter(|v| !v.is_empty())
    {
        Some(value) => buckets
            .entry((value.to_lowercase(), value.to_string()))
            .or_default()
            .push(entry),
        None => uncategorized.push(entry),
    };

    for test in tests {
        match level {
            FieldLevel::Test => place(
                test.fields.get(field),
                CatalogEntry {
                    test: test.name.clone(),
                    subtest: None,
                    anchor: test.anchor.clone(),
                    description: test.description.clone(),
                },
            ),
            FieldLevel::Subtest => {
                for subtest in &test.subtests {
                    place(
                        subtest.fields.get(field).or_else(|| test.fields.get(field)),
                        CatalogEntry {
                            test: test.name.clone(),
                            subtest: Some(subtest.name.clone()),
                            anchor: subtest.anchor.clone(),
                            description: subtest.description.clone(),
                        },
                    );
                }
            }
        }
    }

    let mut out: Vec<CatalogBucket> = buckets
        .into_iter()
        .map(|((_, value), entries)| CatalogBucket { value, entries })
        .collect();
    if !uncategorized.is_empty() {
        out.push(CatalogBucket {
            value: UNCATEGORIZED.to_string(),
            entries: uncategorized,
        });
    }
    for bucket in &mut out {
        bucket.entries.sort_by_cached_key(|e| {
            (
                e.test.to_lowercase(),
                e.subtest.as_deref().map(str::to_lowercase),
            )
        });
    }

    Catalog {
        field: field.to_string(),
        level,
        buckets: out,
    }
}
