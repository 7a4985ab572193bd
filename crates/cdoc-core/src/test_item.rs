use serde::{Deserialize, Serialize};

use crate::Metadata;
use crate::naming::{subtest_anchor, test_anchor};

/// A test program assembled from comment blocks and declaration macros.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Test {
    pub name: String,
    pub group: String,
    /// Path of the defining file relative to its group root.
    pub file: String,
    pub description: String,
    pub fields: Metadata,
    pub subtests: Vec<Subtest>,
    pub anchor: String,
}

impl Test {
    pub fn new(name: impl Into<String>, file: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            anchor: test_anchor(&name),
            name,
            group: String::new(),
            file: file.into(),
            description: String::new(),
            fields: Metadata::new(),
            subtests: Vec::new(),
        }
    }

    #[must_use]
    pub fn subtest(&self, name: &str) -> Option<&Subtest> {
        self.subtests.iter().find(|s| s.name == name)
    }

    /// Append a subtest and give it an anchor under this test.
    pub fn push_subtest(&mut self, mut subtest: Subtest) {
        subtest.anchor = subtest_anchor(&self.name, &subtest.name);
        self.subtests.push(subtest);
    }
}

/// One concrete subtest of a [`Test`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Subtest {
    pub name: String,
    pub description: String,
    pub fields: Metadata,
    /// Line of the declaring macro when one was found in code.
    pub line: Option<u32>,
    pub anchor: String,
    /// Readable outline of the subtest body.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub steps: Vec<Step>,
}

/// One entry of a subtest outline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Step {
    Action(String),
    /// Steps that only run under `condition` (`otherwise` for an else arm).
    Branch { condition: String, steps: Vec<Self> },
}

impl Subtest {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: String::new(),
            fields: Metadata::new(),
            line: None,
            anchor: String::new(),
            steps: Vec::new(),
        }
    }
}
