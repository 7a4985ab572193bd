//! The symbol and test registry.
//!
//! [`RegistryBuilder`] collects symbols group by group and rejects
//! collisions. [`RegistryBuilder::freeze`] builds the lookup indexes once
//! and hands back a read-only [`Registry`].

use std::collections::HashMap;

use cdoc_core::{Subtest, Symbol, SymbolKind, SymbolLookup, Test};

use crate::error::BuildError;
use crate::index::{IndexBucket, az_index};

/// Position of a symbol: a top-level entry, or one of its members.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct SymbolRef {
    top: usize,
    member: Option<usize>,
}

/// Mutable registration phase.
#[derive(Debug, Default)]
pub struct RegistryBuilder {
    groups: Vec<String>,
    symbols: Vec<Symbol>,
    tests: Vec<Test>,
    qualified: HashMap<String, SymbolRef>,
    test_names: HashMap<String, usize>,
}

impl RegistryBuilder {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a group so its order is kept even if it has no symbols.
    pub fn add_group(&mut self, name: &str) {
        if !self.groups.iter().any(|g| g == name) {
            self.groups.push(name.to_string());
        }
    }

    /// Register a symbol that has already been assigned to its group.
    ///
    /// # Errors
    /// [`BuildError::DuplicateQualifiedName`] when the symbol, or one of
    /// its members, reuses a qualified name already registered.
    pub fn register(&mut self, symbol: Symbol) -> Result<(), BuildError> {
        self.add_group(&symbol.group);
        let top = self.symbols.len();

        let mut names = vec![(symbol.qualified_name.as_str(), None, &symbol)];
        names.extend(
            symbol
                .members
                .iter()
                .enumerate()
                .map(|(i, m)| (m.qualified_name.as_str(), Some(i), m)),
        );
        for (i, (name, _, incoming)) in names.iter().enumerate() {
            let earlier = self
                .qualified
                .get(*name)
                .map(|&at| self.get(at))
                .or_else(|| names[..i].iter().find(|(n, _, _)| n == name).map(|(_, _, s)| *s));
            if let Some(first) = earlier {
                return Err(BuildError::DuplicateQualifiedName {
                    group: symbol.group.clone(),
                    name: (*name).to_string(),
                    first: first.location.clone(),
                    second: incoming.location.clone(),
                });
            }
        }

        let refs: Vec<(String, SymbolRef)> = names
            .iter()
            .map(|(name, member, _)| ((*name).to_string(), SymbolRef { top, member: *member }))
            .collect();
        self.qualified.extend(refs);
        self.symbols.push(symbol);
        Ok(())
    }

    /// Register a test.
    ///
    /// # Errors
    /// [`BuildError::DuplicateTest`] when another file already defined a
    /// test with the same name.
    pub fn register_test(&mut self, test: Test) -> Result<(), BuildError> {
        if let Some(&at) = self.test_names.get(&test.name) {
            let first = &self.tests[at];
            return Err(BuildError::DuplicateTest {
                name: test.name.clone(),
                first: format!("{}/{}", first.group, first.file),
                second: format!("{}/{}", test.group, test.file),
            });
        }
        self.add_group(&test.group);
        self.test_names.insert(test.name.clone(), self.tests.len());
        self.tests.push(test);
        Ok(())
    }

    fn get(&self, at: SymbolRef) -> &Symbol {
        resolve(&self.symbols, at)
    }

    /// Build the lookup indexes and end registration.
    #[must_use]
    pub fn freeze(self) -> Registry {
        let group_rank = |group: &str| self.groups.iter().position(|g| g == group);

        let mut bare: HashMap<String, Vec<SymbolRef>> = HashMap::new();
        let mut file_names: HashMap<String, Vec<SymbolRef>> = HashMap::new();
        for &at in self.qualified.values() {
            let symbol = resolve(&self.symbols, at);
            if symbol.kind == SymbolKind::File {
                file_names.entry(symbol.name.clone()).or_default().push(at);
            } else {
                bare.entry(symbol.name.clone()).or_default().push(at);
            }
        }
        // HashMap iteration order is arbitrary; fix it.
        let order = |refs: &mut Vec<SymbolRef>| {
            refs.sort_by(|&a, &b| {
                let (a, b) = (resolve(&self.symbols, a), resolve(&self.symbols, b));
                (group_rank(&a.group), &a.qualified_name).cmp(&(group_rank(&b.group), &b.qualified_name))
            });
        };
        bare.values_mut().for_each(order);
        file_names.values_mut().for_each(order);

        tracing::debug!(
            groups = self.groups.len(),
            symbols = self.qualified.len(),
            tests = self.tests.len(),
            "registry frozen"
        );

        Registry {
            groups: self.groups,
            symbols: self.symbols,
            tests: self.tests,
            qualified: self.qualified,
            bare,
            file_names,
            test_names: self.test_names,
        }
    }
}

fn resolve(symbols: &[Symbol], at: SymbolRef) -> &Symbol {
    let top = &symbols[at.top];
    at.member.map_or(top, |i| &top.members[i])
}

/// Read-only registry of every symbol and test in a build.
#[derive(Debug)]
pub struct Registry {
    groups: Vec<String>,
    symbols: Vec<Symbol>,
    tests: Vec<Test>,
    qualified: HashMap<String, SymbolRef>,
    bare: HashMap<String, Vec<SymbolRef>>,
    file_names: HashMap<String, Vec<SymbolRef>>,
    test_names: HashMap<String, usize>,
}

impl Registry {
    /// Group names in configured order.
    #[must_use]
    pub fn groups(&self) -> &[String] {
        &self.groups
    }

    /// Top-level symbols in registration order. Members are nested.
    #[must_use]
    pub fn symbols(&self) -> &[Symbol] {
        &self.symbols
    }

    pub fn group_symbols<'a>(&'a self, group: &'a str) -> impl Iterator<Item = &'a Symbol> {
        self.symbols.iter().filter(move |s| s.group == group)
    }

    #[must_use]
    pub fn tests(&self) -> &[Test] {
        &self.tests
    }

    pub fn group_tests<'a>(&'a self, group: &'a str) -> impl Iterator<Item = &'a Test> {
        self.tests.iter().filter(move |t| t.group == group)
    }

    /// Number of registered symbols, members included.
    #[must_use]
    pub fn len(&self) -> usize {
        self.qualified.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.qualified.is_empty()
    }

    /// A–Z index of one group.
    #[must_use]
    pub fn group_index(&self, group: &str) -> Vec<IndexBucket> {
        az_index(self.group_symbols(group))
    }

    /// A–Z index across every group.
    #[must_use]
    pub fn global_index(&self) -> Vec<IndexBucket> {
        az_index(&self.symbols)
    }

    fn get(&self, at: SymbolRef) -> &Symbol {
        resolve(&self.symbols, at)
    }
}

impl SymbolLookup for Registry {
    fn lookup_qualified(&self, name: &str) -> Option<&Symbol> {
        self.qualified.get(name).map(|&at| self.get(at))
    }

    fn lookup_bare(&self, name: &str) -> Vec<&Symbol> {
        self.bare
            .get(name)
            .map(|refs| refs.iter().map(|&at| self.get(at)).collect())
            .unwrap_or_default()
    }

    fn lookup_file(&self, name_or_path: &str) -> Option<&Symbol> {
        if let Some(symbol) = self.lookup_qualified(name_or_path)
            && symbol.kind == SymbolKind::File
        {
            return Some(symbol);
        }
        match self.file_names.get(name_or_path).map(Vec::as_slice) {
            Some(&[only]) => Some(self.get(only)),
            _ => None,
        }
    }

    fn lookup_test(&self, name: &str) -> Option<&Test> {
        self.test_names.get(name).map(|&i| &self.tests[i])
    }

    fn lookup_subtest(&self, test: Option<&str>, subtest: &str) -> Vec<(&Test, &Subtest)> {
        match test {
            Some(name) => self
                .lookup_test(name)
                .and_then(|t| t.subtest(subtest).map(|s| (t, s)))
                .into_iter()
                .collect(),
            None => self
                .tests
                .iter()
                .filter_map(|t| t.subtest(subtest).map(|s| (t, s)))
                .collect(),
        }
    }
}
