//! Tree providers
//!
//! A provider turns relationship questions ("children of X", "root of Y")
//! into queries against a [`Storage`], and keeps derived fields such as
//! `depth` correct through the lifecycle hooks storage invokes around
//! mutations.

mod simple;

pub use simple::SimpleProvider;

use log::debug;

use crate::error::Result;
use crate::item::{Item, ItemId};
use crate::order::tree_order;
use crate::query::Query;
use crate::storage::Storage;

/// The query type produced by a provider's storage
pub type QueryOf<P> = <<P as Provider>::Storage as Storage>::Query;

/// Relationship queries and lifecycle hooks for a tree stored in `Storage`
///
/// Every relationship method accepts an optional pre-built query to add its
/// constraints to, so callers can compose ("children of X with weight > 3").
/// With `None` a fresh query is taken from storage. The returned query has
/// not been executed.
///
/// All hooks default to doing nothing; implementors override what they need.
///
/// # Example
///
/// ```ignore
/// fn print_children<P: Provider>(provider: &P, item: &Item) -> Result<()> {
///     for child in provider.children_of(item, None)?.execute()? {
///         println!("{:?} (weight {})", child.id, child.weight);
///     }
///     Ok(())
/// }
/// ```
pub trait Provider {
    type Storage: Storage;

    /// The storage this provider queries
    fn storage(&self) -> &Self::Storage;

    /// The item's parent; empty for roots
    fn parent_of(&self, item: &Item, query: Option<QueryOf<Self>>) -> Result<QueryOf<Self>>;

    /// Every item on the path from the item's parent up to its root
    fn ancestors_of(&self, item: &Item, query: Option<QueryOf<Self>>) -> Result<QueryOf<Self>>;

    /// The item's direct children, by weight
    fn children_of(&self, item: &Item, query: Option<QueryOf<Self>>) -> Result<QueryOf<Self>>;

    /// The items sharing the item's parent, the item itself included
    fn siblings_of(&self, item: &Item, query: Option<QueryOf<Self>>) -> Result<QueryOf<Self>>;

    /// Every item below the item, at any depth
    fn descendants_of(&self, item: &Item, query: Option<QueryOf<Self>>) -> Result<QueryOf<Self>>;

    /// The root of the item's tree; a root is its own root
    fn root_of(&self, item: &Item, query: Option<QueryOf<Self>>) -> Result<QueryOf<Self>>;

    /// Every root of the forest
    fn roots(&self, query: Option<QueryOf<Self>>) -> Result<QueryOf<Self>>;

    /// Called before an item is inserted or updated
    fn pre_save(&self, _item: &mut Item) -> Result<()> {
        Ok(())
    }

    /// Called after an item was inserted
    fn post_insert(&self, _item: &Item) -> Result<()> {
        Ok(())
    }

    /// Called after an item was updated
    fn post_update(&self, _item: &Item) -> Result<()> {
        Ok(())
    }

    /// Called after an item was deleted; only the id is left at that point
    fn post_delete(&self, _id: ItemId) -> Result<()> {
        Ok(())
    }

    /// Called after an item was loaded
    fn post_load(&self, _item: &mut Item) -> Result<()> {
        Ok(())
    }

    /// Capability probe for native tree ordering
    ///
    /// Providers implementing [`OrderableProvider`] return `Some(self)`.
    fn as_orderable(&self) -> Option<&dyn OrderableProvider<Storage = Self::Storage>> {
        None
    }
}

/// A provider whose backend can sort a query in tree order by itself
///
/// Meant for representations that make tree order a plain sort (materialized
/// paths, nested sets). Callers probe with [`Provider::as_orderable`].
pub trait OrderableProvider: Provider {
    /// Add an ordering clause yielding items depth-first, siblings by weight
    fn order_by_tree(&self, query: &mut QueryOf<Self>) -> Result<()>;
}

/// Run a query and return its items in tree order
///
/// Uses the provider's native tree ordering when it has one, otherwise sorts
/// the results client-side with [`tree_order`].
pub fn execute_in_tree_order<P>(provider: &P, mut query: QueryOf<P>) -> Result<Vec<Item>>
where
    P: Provider + ?Sized,
{
    match provider.as_orderable() {
        Some(orderable) => {
            debug!("Ordering query natively");
            orderable.order_by_tree(&mut query)?;
            query.execute()
        }
        None => {
            debug!("Ordering query client-side");
            Ok(tree_order(query.execute()?))
        }
    }
}
