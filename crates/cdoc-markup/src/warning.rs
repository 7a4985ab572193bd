use std::fmt;

use serde::Serialize;

/// A reference that rendered as plain text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Warning {
    pub kind: WarningKind,
    /// Role name as written, or `auto` for auto-linked spans.
    pub role: String,
    pub target: String,
    /// Anchors of the competing targets for [`WarningKind::Ambiguous`].
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub candidates: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum WarningKind {
    Unresolved,
    Ambiguous,
}

impl Warning {
    pub fn unresolved(role: &str, target: &str) -> Self {
        Self {
            kind: WarningKind::Unresolved,
            role: role.to_string(),
            target: target.to_string(),
            candidates: Vec::new(),
        }
    }

    pub fn ambiguous(role: &str, target: &str, candidates: Vec<String>) -> Self {
        Self {
            kind: WarningKind::Ambiguous,
            role: role.to_string(),
            target: target.to_string(),
            candidates,
        }
    }
}

impl fmt::Display for Warning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            WarningKind::Unresolved => {
                write!(f, "unresolved reference :{}:`{}`", self.role, self.target)
            }
            WarningKind::Ambiguous => write!(
                f,
                "ambiguous reference :{}:`{}` (candidates: {})",
                self.role,
                self.target,
                self.candidates.join(", ")
            ),
        }
    }
}
