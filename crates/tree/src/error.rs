use derive_more::Display;

use crate::column::{Operator, Value};
use crate::item::ItemId;

/// Result type used throughout the tree crates
pub type Result<T> = std::result::Result<T, TreeError>;

/// Errors produced by providers and storage backends
#[derive(Debug, Display)]
pub enum TreeError {
    /// The backend failed to run a composed query
    #[display(fmt = "Storage error: {}", _0)]
    Storage(anyhow::Error),

    /// The stored data violates a forest invariant
    #[display(fmt = "Inconsistent tree: {}", _0)]
    Inconsistent(Inconsistency),

    /// A relationship was requested for an item that was never saved
    #[display(fmt = "Item has not been saved yet")]
    Unsaved,

    /// The operator cannot be applied to the value
    #[display(fmt = "Invalid condition: {} cannot be applied to {}", operator, value)]
    InvalidCondition { operator: Operator, value: Value },

    #[display(fmt = "Unknown column '{}'", _0)]
    UnknownColumn(String),

    #[display(fmt = "Unknown operator '{}'", _0)]
    UnknownOperator(String),

    #[display(fmt = "Unknown sort direction '{}'", _0)]
    UnknownDirection(String),
}

/// A violated forest invariant
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum Inconsistency {
    /// A parent reference points at an item that does not exist
    #[display(fmt = "parent {} does not exist", parent)]
    DanglingParent { parent: ItemId },

    /// Following parent (or child) links returned to an item already seen
    #[display(fmt = "cycle through {}", at)]
    Cycle { at: ItemId },
}

impl std::error::Error for TreeError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            TreeError::Storage(err) => Some(&**err),
            _ => None,
        }
    }
}

impl From<anyhow::Error> for TreeError {
    fn from(err: anyhow::Error) -> Self {
        TreeError::Storage(err)
    }
}

impl From<Inconsistency> for TreeError {
    fn from(inconsistency: Inconsistency) -> Self {
        TreeError::Inconsistent(inconsistency)
    }
}
