//! Reference roles and the symbol kinds each accepts.

use cdoc_core::SymbolKind;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Function,
    Struct,
    Union,
    Enum,
    Macro,
    Type,
    Variable,
    Constant,
    Member,
    Class,
    File,
    Test,
    Subtest,
}

impl Role {
    /// Parse a role name, accepting the short Sphinx spellings.
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        Some(match name {
            "func" | "function" => Self::Function,
            "struct" => Self::Struct,
            "union" => Self::Union,
            "enum" => Self::Enum,
            "macro" => Self::Macro,
            "type" => Self::Type,
            "var" | "variable" | "data" => Self::Variable,
            "const" | "constant" | "enumerator" => Self::Constant,
            "member" | "field" => Self::Member,
            "class" => Self::Class,
            "file" => Self::File,
            "test" => Self::Test,
            "subtest" => Self::Subtest,
            _ => return None,
        })
    }

    /// Name used when writing the role back out.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Function => "func",
            Self::Struct => "struct",
            Self::Union => "union",
            Self::Enum => "enum",
            Self::Macro => "macro",
            Self::Type => "type",
            Self::Variable => "var",
            Self::Constant => "const",
            Self::Member => "member",
            Self::Class => "class",
            Self::File => "file",
            Self::Test => "test",
            Self::Subtest => "subtest",
        }
    }

    /// Symbol kinds a target of this role may have.
    ///
    /// Empty for roles that do not resolve to symbols by name.
    #[must_use]
    pub const fn kinds(self) -> &'static [SymbolKind] {
        use SymbolKind as K;
        match self {
            // gtk-doc writes `foo()` for function-like macros too.
            Self::Function => &[K::Function, K::Macro],
            Self::Struct => &[K::Struct, K::Typedef],
            Self::Union => &[K::Union, K::Typedef],
            Self::Enum => &[K::Enum, K::Typedef],
            Self::Macro => &[K::Macro],
            Self::Type => &[K::Typedef, K::Struct, K::Union, K::Enum, K::Class],
            Self::Variable => &[K::Variable, K::Constant],
            Self::Constant => &[K::Constant, K::Macro, K::Variable],
            Self::Member => &[K::Member, K::Constant],
            Self::Class => &[K::Class, K::Struct],
            Self::File => &[K::File],
            Self::Test | Self::Subtest => &[],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("func", Role::Function)]
    #[case("function", Role::Function)]
    #[case("data", Role::Variable)]
    #[case("const", Role::Constant)]
    #[case("subtest", Role::Subtest)]
    fn parses_spellings(#[case] name: &str, #[case] role: Role) {
        assert_eq!(Role::from_name(name), Some(role));
    }

    #[test]
    fn written_names_parse_back() {
        for name in ["func", "struct", "type", "var", "const", "member", "file", "test"] {
            let role = Role::from_name(name).unwrap();
            assert_eq!(role.as_str(), name);
        }
        assert_eq!(Role::from_name("bogus"), None);
    }
}
