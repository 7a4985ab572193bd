use serde::{Deserialize, Serialize};
use std::fmt;

use crate::SymbolKind;
use crate::naming::{qualify, qualify_file, qualify_member, symbol_anchor};

/// Defining file and one-based line of a symbol.
#[derive(Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Location {
    pub file: String,
    pub line: u32,
}

impl Location {
    pub fn new(file: impl Into<String>, line: u32) -> Self {
        Self {
            file: file.into(),
            line,
        }
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.file, self.line)
    }
}

/// A function or function-like macro parameter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Param {
    pub name: String,
    /// Absent for macro parameters and K&R-style lists.
    pub type_text: Option<String>,
    pub description: Option<String>,
}

impl Param {
    pub fn new(name: impl Into<String>, type_text: Option<String>) -> Self {
        Self {
            name: name.into(),
            type_text,
            description: None,
        }
    }
}

/// A C type split into its base and pointer depth.
///
/// `const char *` is stored as base `const char` with one pointer so it can
/// be presented as "Pointer to `const char`".
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TypeRef {
    pub base: String,
    pub pointers: u8,
}

impl TypeRef {
    /// Split trailing `*` tokens off a type's text.
    #[must_use]
    pub fn parse(text: &str) -> Self {
        let mut base = text.trim();
        let mut pointers = 0u8;
        while let Some(rest) = base.strip_suffix('*') {
            pointers = pointers.saturating_add(1);
            base = rest.trim_end();
        }
        Self {
            base: base.split_whitespace().collect::<Vec<_>>().join(" "),
            pointers,
        }
    }

    #[must_use]
    pub const fn is_pointer(&self) -> bool {
        self.pointers > 0
    }

    /// Human-readable description for rendering return types.
    #[must_use]
    pub fn describe(&self) -> String {
        let mut out = String::new();
        for i in 0..self.pointers {
            out.push_str(if i == 0 { "Pointer to " } else { "pointer to " });
        }
        out.push('`');
        out.push_str(&self.base);
        out.push('`');
        out
    }
}

impl fmt::Display for TypeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.base)?;
        if self.pointers > 0 {
            f.write_str(" ")?;
            for _ in 0..self.pointers {
                f.write_str("*")?;
            }
        }
        Ok(())
    }
}

/// One documented C/C++ entity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Symbol {
    pub kind: SymbolKind,
    pub name: String,
    /// Group-scoped name, unique within the owning group.
    pub qualified_name: String,
    pub group: String,
    pub location: Location,
    /// Declaration text as written, whitespace-collapsed.
    pub signature: String,
    pub params: Vec<Param>,
    pub return_type: Option<TypeRef>,
    pub returns: Option<String>,
    pub description: String,
    pub anchor: String,
    /// Bare name of the owning aggregate for members and enumerators.
    pub owner: Option<String>,
    pub members: Vec<Self>,
}

impl Symbol {
    /// A symbol that has not been assigned to a group yet.
    pub fn new(kind: SymbolKind, name: impl Into<String>, location: Location) -> Self {
        let name = name.into();
        Self {
            kind,
            qualified_name: name.clone(),
            anchor: symbol_anchor(kind, &name),
            name,
            group: String::new(),
            location,
            signature: String::new(),
            params: Vec::new(),
            return_type: None,
            returns: None,
            description: String::new(),
            owner: None,
            members: Vec::new(),
        }
    }

    /// A file symbol for `rel_path`, named after its basename.
    pub fn file(rel_path: &str) -> Self {
        let basename = rel_path.rsplit(['/', '\\']).next().unwrap_or(rel_path);
        let mut symbol = Self::new(SymbolKind::File, basename, Location::new(rel_path, 1));
        symbol.signature = rel_path.to_string();
        symbol
    }

    #[must_use]
    pub fn with_signature(mut self, signature: impl Into<String>) -> Self {
        self.signature = signature.into();
        self
    }

    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Assign this symbol, and its members, to `group`.
    ///
    /// Recomputes qualified names and anchors from the group, the owner and
    /// the bare name.
    #[must_use]
    pub fn in_group(mut self, group: &str) -> Self {
        self.qualified_name = if self.kind == SymbolKind::File {
            qualify_file(group, &self.location.file)
        } else {
            qualify(group, &self.name)
        };
        self.group = group.to_string();
        self.anchor = symbol_anchor(self.kind, &self.qualified_name);
        let owner_qualified = self.qualified_name.clone();
        self.members = std::mem::take(&mut self.members)
            .into_iter()
            .map(|member| member.under_owner(group, &owner_qualified))
            .collect();
        self
    }

    fn under_owner(mut self, group: &str, owner_qualified: &str) -> Self {
        self.qualified_name = qualify_member(owner_qualified, &self.name);
        self.group = group.to_string();
        self.anchor = symbol_anchor(self.kind, &self.qualified_name);
        self
    }

    /// Look up a direct member by name.
    #[must_use]
    pub fn member(&self, name: &str) -> Option<&Self> {
        self.members.iter().find(|m| m.name == name)
    }

    #[must_use]
    pub fn param(&self, name: &str) -> Option<&Param> {
        self.params.iter().find(|p| p.name == name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    #[rstest]
    #[case("int", "int", 0, "`int`")]
    #[case("const char *", "const char", 1, "Pointer to `const char`")]
    #[case("char**", "char", 2, "Pointer to pointer to `char`")]
    #[case("struct  engine_config * *", "struct engine_config", 2, "Pointer to pointer to `struct engine_config`")]
    fn type_ref_parsing(
        #[case] text: &str,
        #[case] base: &str,
        #[case] pointers: u8,
        #[case] described: &str,
    ) {
        let ty = TypeRef::parse(text);
        assert_eq!(ty.base, base);
        assert_eq!(ty.pointers, pointers);
        assert_eq!(ty.describe(), described);
    }

    #[test]
    fn type_ref_display_round_trips_spacing() {
        assert_eq!(TypeRef::parse("const char*").to_string(), "const char *");
        assert_eq!(TypeRef::parse("void").to_string(), "void");
    }

    #[test]
    fn grouping_qualifies_members() {
        let mut config = Symbol::new(
            SymbolKind::Struct,
            "engine_config",
            Location::new("src/engine.h", 12),
        );
        let mut name = Symbol::new(SymbolKind::Member, "name", Location::new("src/engine.h", 14));
        name.owner = Some("engine_config".to_string());
        config.members.push(name);

        let config = config.in_group("core");

        assert_eq!(config.qualified_name, "core::engine_config");
        assert_eq!(config.anchor, "struct-core-engine_config");
        let member = config.member("name").expect("member present");
        assert_eq!(member.qualified_name, "core::engine_config.name");
        assert_eq!(member.group, "core");
        assert_eq!(member.anchor, "field-core-engine_config-name");
    }

    #[test]
    fn file_symbols_use_relative_path() {
        let file = Symbol::file("src/uart.c").in_group("drivers");
        assert_eq!(file.name, "uart.c");
        assert_eq!(file.qualified_name, "drivers/src/uart.c");
        assert_eq!(file.anchor, "file-drivers-src-uart-c");
    }
}
