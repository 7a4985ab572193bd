//! Read-only lookups that reference resolution runs against.

use crate::{Subtest, Symbol, Test};

/// Read access to a frozen set of symbols and tests.
///
/// The registry implements this. Tests of the markup converter use small
/// in-memory fakes.
pub trait SymbolLookup {
    /// Exact match on a group-scoped qualified name.
    fn lookup_qualified(&self, name: &str) -> Option<&Symbol>;

    /// Every symbol whose bare name is `name`, in deterministic order.
    ///
    /// More than one result means the name is ambiguous and the caller
    /// picks a policy.
    fn lookup_bare(&self, name: &str) -> Vec<&Symbol>;

    /// A file by unique basename or by `group/relative/path`.
    fn lookup_file(&self, name_or_path: &str) -> Option<&Symbol>;

    fn lookup_test(&self, name: &str) -> Option<&Test>;

    /// Subtests named `subtest`, restricted to `test` when given.
    fn lookup_subtest(&self, test: Option<&str>, subtest: &str) -> Vec<(&Test, &Subtest)>;
}

/// Anything a reference can resolve to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Target<'a> {
    Symbol(&'a Symbol),
    Test(&'a Test),
    Subtest(&'a Test, &'a Subtest),
}

impl Target<'_> {
    #[must_use]
    pub fn anchor(&self) -> &str {
        match self {
            Self::Symbol(symbol) => &symbol.anchor,
            Self::Test(test) => &test.anchor,
            Self::Subtest(_, subtest) => &subtest.anchor,
        }
    }

    /// Group that owns the target, empty for tests without a group.
    #[must_use]
    pub fn group(&self) -> &str {
        match self {
            Self::Symbol(symbol) => &symbol.group,
            Self::Test(test) | Self::Subtest(test, _) => &test.group,
        }
    }
}
