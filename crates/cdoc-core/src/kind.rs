use serde::{Deserialize, Serialize};
use std::fmt;

/// The kind of a documented entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SymbolKind {
    Function,
    Struct,
    Union,
    Enum,
    /// C++ only.
    Class,
    Macro,
    Typedef,
    Variable,
    Constant,
    Member,
    File,
}

impl SymbolKind {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Function => "function",
            Self::Struct => "struct",
            Self::Union => "union",
            Self::Enum => "enum",
            Self::Class => "class",
            Self::Macro => "macro",
            Self::Typedef => "typedef",
            Self::Variable => "variable",
            Self::Constant => "constant",
            Self::Member => "member",
            Self::File => "file",
        }
    }

    /// Prefix used when building anchors, e.g. `func-core-engine_init`.
    #[must_use]
    pub const fn anchor_prefix(self) -> &'static str {
        match self {
            Self::Function => "func",
            Self::Struct => "struct",
            Self::Union => "union",
            Self::Enum => "enum",
            Self::Class => "class",
            Self::Macro => "macro",
            Self::Typedef => "type",
            Self::Variable => "var",
            Self::Constant => "const",
            Self::Member => "field",
            Self::File => "file",
        }
    }

    /// Kinds that name a type: typedefs and tagged aggregates.
    #[must_use]
    pub const fn is_type(self) -> bool {
        matches!(
            self,
            Self::Typedef | Self::Struct | Self::Union | Self::Enum | Self::Class
        )
    }

    /// Kinds whose body carries members.
    #[must_use]
    pub const fn has_members(self) -> bool {
        matches!(self, Self::Struct | Self::Union | Self::Enum | Self::Class)
    }
}

impl fmt::Display for SymbolKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const KINDS: &[SymbolKind] = &[
        SymbolKind::Function,
        SymbolKind::Struct,
        SymbolKind::Union,
        SymbolKind::Enum,
        SymbolKind::Class,
        SymbolKind::Macro,
        SymbolKind::Typedef,
        SymbolKind::Variable,
        SymbolKind::Constant,
        SymbolKind::Member,
        SymbolKind::File,
    ];

    #[test]
    fn serializes_in_snake_case_matching_display() {
        for kind in KINDS {
            let value = serde_json::to_value(kind).expect("serialize kind");
            assert_eq!(value.as_str(), Some(kind.as_str()));
            assert_eq!(kind.to_string(), kind.as_str());
        }
    }

    #[test]
    fn type_kinds() {
        assert!(SymbolKind::Typedef.is_type());
        assert!(SymbolKind::Class.is_type());
        assert!(!SymbolKind::Macro.is_type());
        assert!(!SymbolKind::Member.is_type());
    }
}
