//! Core item types for the adjacency-list tree

use derive_more::{Display, From};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::column::Column;
use crate::error::{Result, TreeError};

/// Unique identifier for an item, assigned by storage on first save
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Display, From)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[display(fmt = "#{}", _0)]
pub struct ItemId(pub i64);

impl ItemId {
    /// Create a new ItemId from an i64
    pub const fn new(id: i64) -> Self {
        ItemId(id)
    }

    /// Get the inner i64 value
    pub const fn get(self) -> i64 {
        self.0
    }
}

impl From<ItemId> for i64 {
    fn from(id: ItemId) -> Self {
        id.0
    }
}

/// A single item in the forest
///
/// Items are plain records. The provider owns the meaning of `parent`,
/// `weight` and `depth`; storage owns `id`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Item {
    /// The item's identity, `None` until storage has saved it
    pub id: Option<ItemId>,
    /// The parent item, `None` for roots
    pub parent: Option<ItemId>,
    /// Ordering key among siblings
    pub weight: i64,
    /// Distance from the root, `None` until computed by `pre_save`
    pub depth: Option<u32>,
}

impl Item {
    /// Create a new unsaved root item
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a new unsaved item under `parent`
    pub fn child_of(parent: ItemId) -> Self {
        Self {
            parent: Some(parent),
            ..Self::default()
        }
    }

    /// Set the sibling weight
    pub fn with_weight(mut self, weight: i64) -> Self {
        self.weight = weight;
        self
    }

    /// Set the depth explicitly
    pub fn with_depth(mut self, depth: u32) -> Self {
        self.depth = Some(depth);
        self
    }

    /// Returns true if this item has no parent
    pub fn is_root(&self) -> bool {
        self.parent.is_none()
    }

    /// Returns true once storage has assigned an id
    pub fn is_saved(&self) -> bool {
        self.id.is_some()
    }

    /// Get the id, failing fast for items that were never saved
    pub fn require_id(&self) -> Result<ItemId> {
        self.id.ok_or(TreeError::Unsaved)
    }

    /// Read a column as a nullable integer, the way a backend row would expose it
    pub fn column_value(&self, column: Column) -> Option<i64> {
        match column {
            Column::Id => self.id.map(ItemId::get),
            Column::Parent => self.parent.map(ItemId::get),
            Column::Weight => Some(self.weight),
            Column::Depth => self.depth.map(i64::from),
        }
    }
}
