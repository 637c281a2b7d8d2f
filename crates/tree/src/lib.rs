//! Storage-agnostic tree relationships
//!
//! Models a forest stored as an adjacency list (id, parent, weight, depth) in
//! any backend, and answers relationship queries (parent, ancestors,
//! children, siblings, descendants, root) using nothing but a small query
//! builder contract.
//!
//! # Core Concepts
//!
//! - **Item**: a plain record in the forest
//! - **Query**: a composable predicate/ordering builder, executed once
//! - **Storage**: the backend; hands out fresh queries
//! - **Provider**: relationship algorithms and lifecycle hooks on top of storage
//!
//! # Example
//!
//! ```ignore
//! use tree::prelude::*;
//!
//! let provider = SimpleProvider::new(storage);
//!
//! // Children of an item, by ascending weight
//! let children = provider.children_of(&item, None)?.execute()?;
//!
//! // Compose: descendants at depth 2 only
//! let mut query = provider.storage().query();
//! query.condition(Condition::eq(Column::Depth, 2));
//! let grandchildren = provider.descendants_of(&item, Some(query))?.execute()?;
//! ```

pub mod column;
mod error;
mod item;
mod options;
pub mod order;
pub mod provider;
pub mod query;
mod storage;

pub use column::{Column, Condition, Direction, Operator, Value};
pub use error::{Inconsistency, Result, TreeError};
pub use item::{Item, ItemId};
pub use options::{CyclePolicy, ProviderOptions};
pub use order::tree_order;
pub use provider::{execute_in_tree_order, OrderableProvider, Provider, QueryOf, SimpleProvider};
pub use query::{Criteria, Filter, Query};
pub use storage::{Storage, WritableStorage};

/// Re-export commonly used types
pub mod prelude {
    pub use crate::{
        Column, Condition, Direction, Item, ItemId, Provider, ProviderOptions, Query,
        SimpleProvider, Storage, TreeError, WritableStorage,
    };
}
