use crate::Fragment;
use derive_more::{Display, From};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// A statement's id within its owning script. Unique within that script only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, From, Display)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[display("#{_0}")]
pub struct StatementId(pub u32);

/// Line/column the parser recorded for a statement, kept only for diagnostics
/// surfaced by the engine's error collection.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct SourceLocation {
    pub line: u32,
    pub column: u32,
}

/// An addressable node produced by the (external) parser. `children` groups
/// statement ids that must compile and execute together as one unit — this is
/// the canonical `int[][]` shape; a flat `int[]` producer must be wrapped by
/// its caller before reaching the engine.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Statement {
    pub id: StatementId,
    pub fragments: Vec<Fragment>,
    pub children: Vec<Vec<StatementId>>,
    pub meta: SourceLocation,
}

impl Statement {
    pub fn new(id: impl Into<StatementId>, fragments: Vec<Fragment>) -> Self {
        Statement { id: id.into(), fragments, children: Vec::new(), meta: SourceLocation::default() }
    }

    pub fn with_children(mut self, children: Vec<Vec<StatementId>>) -> Self {
        self.children = children;
        self
    }

    pub fn with_location(mut self, line: u32, column: u32) -> Self {
        self.meta = SourceLocation { line, column };
        self
    }

    pub fn has_children(&self) -> bool {
        !self.children.is_empty()
    }
}
