//! Storage backends
//!
//! A backend only has to hand out fresh queries. Backends that can also
//! persist items implement [`WritableStorage`], which is where the provider's
//! lifecycle hooks get invoked.

use crate::error::Result;
use crate::item::{Item, ItemId};
use crate::provider::Provider;
use crate::query::Query;

/// A backend able to build queries over its item set
///
/// Storage is the one component shared between callers, so it must be safe
/// to use from several threads at once. Any synchronization the backend needs
/// lives behind this trait.
pub trait Storage: Send + Sync {
    type Query: Query;

    /// Build a new, unconstrained query bound to this backend
    fn query(&self) -> Self::Query;
}

/// A backend that persists items and drives the provider's lifecycle hooks
///
/// Implementations must call, in order:
/// - `pre_save` before persisting a new or changed item
/// - `post_insert` or `post_update` after it was persisted
/// - `post_delete` with the removed id after a delete
/// - `post_load` after an item was read back
///
/// Between `pre_save` and the write landing, no other write may run;
/// otherwise two saves can each pass validation and together store a cycle.
pub trait WritableStorage: Storage {
    /// Create an unsaved in-memory item
    fn create(&self) -> Item {
        Item::new()
    }

    /// Insert (when `item.id` is `None`) or update an item
    ///
    /// Assigns the id on insert and returns it.
    fn save<P>(&self, provider: &P, item: &mut Item) -> Result<ItemId>
    where
        P: Provider + ?Sized;

    /// Remove an item
    fn delete<P>(&self, provider: &P, id: ItemId) -> Result<()>
    where
        P: Provider + ?Sized;

    /// Read an item back, `None` if it does not exist
    fn load<P>(&self, provider: &P, id: ItemId) -> Result<Option<Item>>
    where
        P: Provider + ?Sized;
}
