//! Origin gating shared by validations and actions

use super::column::Column;
use super::ids::ColumnId;
use serde::{Deserialize, Serialize};

/// Restricts a rule to moves departing a particular origin column,
/// optionally only when that origin sits exactly one position before
/// the destination.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct OriginGate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub from_column_id: Option<ColumnId>,
    #[serde(default)]
    pub require_adjacent: bool,
}

impl OriginGate {
    /// An ungated rule: applies to every move
    pub fn open() -> Self {
        Self::default()
    }

    /// Gate on a specific origin column
    pub fn from_column(id: impl Into<ColumnId>) -> Self {
        Self {
            from_column_id: Some(id.into()),
            require_adjacent: false,
        }
    }

    /// Additionally require the origin to be adjacent-before the destination
    pub fn adjacent(mut self) -> Self {
        self.require_adjacent = true;
        self
    }

    /// Whether a gated rule participates in this move at all.
    ///
    /// A move with no declared origin cannot be checked against an origin
    /// gate, so gated rules are skipped (absent from results), never failed.
    pub fn applies(&self, origin: Option<&Column>, destination: &Column) -> bool {
        if self.from_column_id.is_none() && !self.require_adjacent {
            return true;
        }

        let Some(origin) = origin else {
            return false;
        };

        if let Some(ref want) = self.from_column_id {
            if origin.id != *want {
                return false;
            }
        }

        if self.require_adjacent && !destination.is_adjacent_after(origin) {
            return false;
        }

        true
    }
}
