//! Column type

use super::ids::ColumnId;
use serde::{Deserialize, Serialize};

/// A column is a positioned stage in a board's pipeline.
///
/// Adjacency between two columns is defined purely by position difference:
/// `from` is adjacent-before `to` iff `to.position - from.position == 1`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Column {
    pub id: ColumnId,
    pub name: String,
    pub position: usize,
}

impl Column {
    /// Create a new column at the given position
    pub fn new(id: impl Into<ColumnId>, name: impl Into<String>, position: usize) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            position,
        }
    }

    /// True when `from` sits exactly one position before this column
    pub fn is_adjacent_after(&self, from: &Column) -> bool {
        self.position == from.position + 1
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_adjacency_is_exact() {
        let a = Column::new("lead", "Lead", 0);
        let b = Column::new("visita", "Visita", 1);
        let c = Column::new("proposta", "Proposta", 2);

        assert!(b.is_adjacent_after(&a));
        assert!(c.is_adjacent_after(&b));
        assert!(!c.is_adjacent_after(&a));
        // Moving backwards is never adjacent
        assert!(!a.is_adjacent_after(&b));
    }
}
