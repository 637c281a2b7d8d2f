//! Reference provider working on top of any storage
//!
//! Only needs the four primitive query operations: conditions, null tests,
//! ordering and execution. Relationships deeper than one level are resolved
//! with one round trip per level (ancestors) or per visited item
//! (descendants).

use std::collections::HashSet;

use log::{debug, trace, warn};

use super::{Provider, QueryOf};
use crate::column::{Column, Condition, Direction};
use crate::error::{Inconsistency, Result};
use crate::item::{Item, ItemId};
use crate::options::{CyclePolicy, ProviderOptions};
use crate::query::Query;
use crate::storage::Storage;

/// A provider for adjacency-list trees that works with any [`Storage`]
#[derive(Debug, Clone)]
pub struct SimpleProvider<S> {
    storage: S,
    options: ProviderOptions,
}

impl<S: Storage> SimpleProvider<S> {
    /// Create a provider with default options
    pub fn new(storage: S) -> Self {
        Self::with_options(storage, ProviderOptions::default())
    }

    pub fn with_options(storage: S, options: ProviderOptions) -> Self {
        Self { storage, options }
    }

    pub fn options(&self) -> &ProviderOptions {
        &self.options
    }

    fn query_or_new(&self, query: Option<S::Query>) -> S::Query {
        query.unwrap_or_else(|| self.storage.query())
    }

    fn fetch(&self, id: ItemId) -> Result<Option<Item>> {
        trace!("Fetching {}", id);
        let mut query = self.storage.query();
        query.condition(Condition::eq(Column::Id, id));
        query.first()
    }

    /// Report corrupt data according to the configured cycle policy
    ///
    /// Returns `Ok(())` when the caller should stop its walk and carry on.
    fn tolerate(&self, inconsistency: Inconsistency) -> Result<()> {
        tolerate(self.options.cycle_policy, inconsistency)
    }

    /// Ids of every ancestor, nearest first
    fn ancestor_ids(&self, item: &Item) -> Result<Vec<ItemId>> {
        self.walk_ancestors(item, self.options.cycle_policy)
    }

    /// Walk parent links from `item` up to its root
    ///
    /// Writes pass `CyclePolicy::Strict` so a truncated walk never ends up in
    /// stored data.
    fn walk_ancestors(&self, item: &Item, policy: CyclePolicy) -> Result<Vec<ItemId>> {
        let Some(first) = item.parent else {
            return Ok(Vec::new());
        };

        let mut seen = HashSet::from([first]);
        let mut ancestors = vec![first];
        let mut next = first;

        loop {
            let Some(current) = self.fetch(next)? else {
                tolerate(policy, Inconsistency::DanglingParent { parent: next })?;
                break;
            };

            match current.parent {
                None => break,
                Some(parent) if seen.insert(parent) => {
                    ancestors.push(parent);
                    next = parent;
                }
                Some(parent) => {
                    tolerate(policy, Inconsistency::Cycle { at: parent })?;
                    break;
                }
            }
        }

        Ok(ancestors)
    }

    /// Ids of every descendant, collected with an explicit stack
    fn descendant_ids(&self, item: &Item) -> Result<Vec<ItemId>> {
        let mut seen = HashSet::from([item.require_id()?]);
        let mut descendants = Vec::new();
        let mut stack = vec![item.clone()];

        while let Some(current) = stack.pop() {
            for child in self.children_of(&current, None)?.execute()? {
                let id = child.require_id()?;
                if !seen.insert(id) {
                    self.tolerate(Inconsistency::Cycle { at: id })?;
                    continue;
                }
                descendants.push(id);
                stack.push(child);
            }
        }

        Ok(descendants)
    }

    /// Fail if saving `item` under its parent would close a loop
    ///
    /// Costs one fetch when the stored parent is unchanged, otherwise one
    /// fetch per level above the new parent.
    fn check_reparent(&self, item: &Item, parent: ItemId) -> Result<()> {
        let Some(id) = item.id else {
            return Ok(());
        };
        if parent == id {
            return Err(Inconsistency::Cycle { at: id }.into());
        }

        if self.fetch(id)?.is_some_and(|stored| stored.parent == Some(parent)) {
            trace!("Parent of {} unchanged", id);
            return Ok(());
        }

        if self.walk_ancestors(item, CyclePolicy::Strict)?.contains(&id) {
            return Err(Inconsistency::Cycle { at: id }.into());
        }
        Ok(())
    }

    fn compute_depth(&self, item: &Item) -> Result<u32> {
        let Some(parent_id) = item.parent else {
            return Ok(0);
        };

        let parent = self
            .fetch(parent_id)?
            .ok_or(Inconsistency::DanglingParent { parent: parent_id })?;

        match parent.depth {
            Some(depth) => Ok(depth + 1),
            None => {
                // Parent saved without a depth; count the levels instead.
                debug!("Parent {} has no depth, counting ancestors", parent_id);
                Ok(self.walk_ancestors(item, CyclePolicy::Strict)?.len() as u32)
            }
        }
    }
}

fn tolerate(policy: CyclePolicy, inconsistency: Inconsistency) -> Result<()> {
    if policy.is_strict() {
        return Err(inconsistency.into());
    }
    warn!("Ignoring corrupt tree data: {}", inconsistency);
    Ok(())
}

impl<S: Storage> Provider for SimpleProvider<S> {
    type Storage = S;

    fn storage(&self) -> &S {
        &self.storage
    }

    fn parent_of(&self, item: &Item, query: Option<QueryOf<Self>>) -> Result<QueryOf<Self>> {
        item.require_id()?;
        let mut query = self.query_or_new(query);

        match item.parent {
            Some(parent) => query.condition(Condition::eq(Column::Id, parent)),
            // Roots have no parent
            None => query.always_false(),
        };

        Ok(query)
    }

    fn ancestors_of(&self, item: &Item, query: Option<QueryOf<Self>>) -> Result<QueryOf<Self>> {
        let id = item.require_id()?;
        let mut query = self.query_or_new(query);

        if item.is_root() {
            query.always_false();
            return Ok(query);
        }

        debug!("Collecting ancestors of {}", id);
        let ancestors = self.ancestor_ids(item)?;
        query
            .condition(Condition::any_of(Column::Id, ancestors))
            .order_by(Column::Depth, Direction::Desc);

        Ok(query)
    }

    fn children_of(&self, item: &Item, query: Option<QueryOf<Self>>) -> Result<QueryOf<Self>> {
        let id = item.require_id()?;
        let mut query = self.query_or_new(query);

        query
            .condition(Condition::eq(Column::Parent, id))
            .order_by(Column::Weight, Direction::Asc);

        Ok(query)
    }

    fn siblings_of(&self, item: &Item, query: Option<QueryOf<Self>>) -> Result<QueryOf<Self>> {
        item.require_id()?;
        let query = self.query_or_new(query);

        let Some(parent_id) = item.parent else {
            // The siblings of a root are all the roots
            return self.roots(Some(query));
        };

        match self.parent_of(item, None)?.first()? {
            Some(parent) => self.children_of(&parent, Some(query)),
            None => {
                self.tolerate(Inconsistency::DanglingParent { parent: parent_id })?;
                let mut query = query;
                query
                    .condition(Condition::eq(Column::Parent, parent_id))
                    .order_by(Column::Weight, Direction::Asc);
                Ok(query)
            }
        }
    }

    fn descendants_of(&self, item: &Item, query: Option<QueryOf<Self>>) -> Result<QueryOf<Self>> {
        let id = item.require_id()?;
        let mut query = self.query_or_new(query);

        debug!("Collecting descendants of {}", id);
        let descendants = self.descendant_ids(item)?;
        if descendants.is_empty() {
            query.always_false();
        } else {
            query.condition(Condition::any_of(Column::Id, descendants));
        }

        Ok(query)
    }

    fn root_of(&self, item: &Item, query: Option<QueryOf<Self>>) -> Result<QueryOf<Self>> {
        let id = item.require_id()?;
        let mut query = self.query_or_new(query);

        let root = if item.is_root() {
            id
        } else {
            let ancestors = self.ancestors_of(item, None)?.execute()?;
            match ancestors.iter().find(|ancestor| ancestor.is_root()) {
                Some(root) => root.require_id()?,
                None => {
                    warn!("No root above {}, treating it as its own root", id);
                    id
                }
            }
        };

        query.condition(Condition::eq(Column::Id, root));
        Ok(query)
    }

    fn roots(&self, query: Option<QueryOf<Self>>) -> Result<QueryOf<Self>> {
        let mut query = self.query_or_new(query);
        query.is_null(Column::Parent);
        Ok(query)
    }

    fn pre_save(&self, item: &mut Item) -> Result<()> {
        if let Some(parent) = item.parent {
            self.check_reparent(item, parent)?;
        }

        if item.depth.is_none() || self.options.recompute_depth {
            let depth = self.compute_depth(item)?;
            trace!("Depth of {:?} is {}", item.id, depth);
            item.depth = Some(depth);
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::TreeError;
    use crate::query::{Criteria, Filter};
    use pretty_assertions::assert_eq;
    use std::sync::Arc;

    // Simple test storage over a fixed item list
    struct VecStorage {
        items: Arc<Vec<Item>>,
    }

    struct VecQuery {
        items: Arc<Vec<Item>>,
        criteria: Criteria,
    }

    impl Storage for VecStorage {
        type Query = VecQuery;

        fn query(&self) -> VecQuery {
            VecQuery {
                items: Arc::clone(&self.items),
                criteria: Criteria::new(),
            }
        }
    }

    impl Query for VecQuery {
        fn condition(&mut self, condition: Condition) -> &mut Self {
            self.criteria.push(Filter::Condition(condition));
            self
        }

        fn is_null(&mut self, column: Column) -> &mut Self {
            self.criteria.push(Filter::IsNull(column));
            self
        }

        fn is_not_null(&mut self, column: Column) -> &mut Self {
            self.criteria.push(Filter::IsNotNull(column));
            self
        }

        fn always_false(&mut self) -> &mut Self {
            self.criteria.set_always_false();
            self
        }

        fn order_by(&mut self, column: Column, direction: Direction) -> &mut Self {
            self.criteria.push_order(column, direction);
            self
        }

        fn execute(self) -> Result<Vec<Item>> {
            Ok(self.criteria.apply(self.items.iter().cloned()))
        }
    }

    fn item(id: i64, parent: Option<i64>, weight: i64, depth: u32) -> Item {
        Item {
            id: Some(ItemId(id)),
            parent: parent.map(ItemId),
            weight,
            depth: Some(depth),
        }
    }

    // A(1) ── B(2) ── D(4)
    //     └── C(3)
    fn scenario() -> Vec<Item> {
        vec![
            item(1, None, 0, 0),
            item(2, Some(1), 0, 1),
            item(3, Some(1), 1, 1),
            item(4, Some(2), 0, 2),
        ]
    }

    fn provider(items: Vec<Item>) -> SimpleProvider<VecStorage> {
        SimpleProvider::new(VecStorage {
            items: Arc::new(items),
        })
    }

    fn ids(items: Vec<Item>) -> Vec<i64> {
        items.into_iter().filter_map(|item| item.id).map(ItemId::get).collect()
    }

    #[test]
    fn test_children_query_shape() {
        let provider = provider(scenario());
        let query = provider.children_of(&scenario()[0], None).unwrap();

        assert_eq!(
            query.criteria.filters(),
            &[Filter::Condition(Condition::eq(Column::Parent, 1))]
        );
        assert_eq!(query.criteria.ordering(), &[(Column::Weight, Direction::Asc)]);
    }

    #[test]
    fn test_relationships() {
        let provider = provider(scenario());
        let [a, b, c, d] = <[Item; 4]>::try_from(scenario()).unwrap();

        let run = |query: Result<VecQuery>| ids(query.unwrap().execute().unwrap());

        assert_eq!(run(provider.children_of(&a, None)), vec![2, 3]);
        assert_eq!(run(provider.parent_of(&d, None)), vec![2]);
        assert_eq!(run(provider.parent_of(&a, None)), Vec::<i64>::new());
        assert_eq!(run(provider.ancestors_of(&d, None)), vec![2, 1]);
        assert_eq!(run(provider.ancestors_of(&a, None)), Vec::<i64>::new());
        assert_eq!(run(provider.siblings_of(&b, None)), vec![2, 3]);
        assert_eq!(run(provider.siblings_of(&a, None)), vec![1]);
        assert_eq!(run(provider.descendants_of(&a, None)), vec![2, 3, 4]);
        assert_eq!(run(provider.descendants_of(&c, None)), Vec::<i64>::new());
        assert_eq!(run(provider.root_of(&d, None)), vec![1]);
        assert_eq!(run(provider.root_of(&a, None)), vec![1]);
        assert_eq!(run(provider.roots(None)), vec![1]);
    }

    #[test]
    fn test_caller_query_is_extended() {
        let provider = provider(scenario());
        let mut query = provider.storage().query();
        query.condition(Condition::new(Column::Weight, 1i64, None).unwrap());

        let query = provider.children_of(&scenario()[0], Some(query)).unwrap();
        assert_eq!(ids(query.execute().unwrap()), vec![3]);
    }

    #[test]
    fn test_unsaved_items_fail_fast() {
        let provider = provider(scenario());
        let unsaved = Item::child_of(ItemId(1));

        assert!(matches!(provider.parent_of(&unsaved, None), Err(TreeError::Unsaved)));
        assert!(matches!(provider.children_of(&unsaved, None), Err(TreeError::Unsaved)));
        assert!(matches!(provider.descendants_of(&unsaved, None), Err(TreeError::Unsaved)));
        assert!(matches!(provider.root_of(&unsaved, None), Err(TreeError::Unsaved)));
    }

    #[test]
    fn test_pre_save_depth() {
        let provider = provider(scenario());

        let mut root = Item::new();
        provider.pre_save(&mut root).unwrap();
        assert_eq!(root.depth, Some(0));

        let mut child = Item::child_of(ItemId(4));
        provider.pre_save(&mut child).unwrap();
        assert_eq!(child.depth, Some(3));

        // An explicit depth is left alone unless recomputation is enabled
        let mut stale = item(3, Some(2), 0, 1);
        provider.pre_save(&mut stale).unwrap();
        assert_eq!(stale.depth, Some(1));

        let recompute = SimpleProvider::with_options(
            VecStorage {
                items: Arc::new(scenario()),
            },
            ProviderOptions::new().recompute_depth(true),
        );
        recompute.pre_save(&mut stale).unwrap();
        assert_eq!(stale.depth, Some(2));
    }

    #[test]
    fn test_pre_save_rejects_missing_parent() {
        let provider = provider(scenario());
        let mut orphan = Item::child_of(ItemId(99));

        assert!(matches!(
            provider.pre_save(&mut orphan),
            Err(TreeError::Inconsistent(Inconsistency::DanglingParent { parent: ItemId(99) }))
        ));
    }

    #[test]
    fn test_pre_save_rejects_cycles() {
        let provider = provider(scenario());

        let mut own_parent = item(2, Some(2), 0, 1);
        assert!(matches!(
            provider.pre_save(&mut own_parent),
            Err(TreeError::Inconsistent(Inconsistency::Cycle { at: ItemId(2) }))
        ));

        // Moving A under its grandchild D
        let mut moved = item(1, Some(4), 0, 0);
        assert!(matches!(
            provider.pre_save(&mut moved),
            Err(TreeError::Inconsistent(Inconsistency::Cycle { at: ItemId(1) }))
        ));
    }

    #[test]
    fn test_pre_save_counts_levels_without_parent_depth() {
        let undepthed = |id: i64, parent: Option<i64>| Item {
            id: Some(ItemId(id)),
            parent: parent.map(ItemId),
            ..Item::new()
        };

        let healthy = provider(vec![undepthed(1, None), undepthed(2, Some(1))]);
        let mut child = Item::child_of(ItemId(2));
        healthy.pre_save(&mut child).unwrap();
        assert_eq!(child.depth, Some(2));

        // The walk must not be truncated into a made-up depth, even when
        // reads tolerate corrupt data
        let corrupt = provider(vec![undepthed(1, Some(2)), undepthed(2, Some(1))]);
        assert_eq!(corrupt.options().cycle_policy, CyclePolicy::Truncate);
        let mut child = Item::child_of(ItemId(1));
        assert!(matches!(
            corrupt.pre_save(&mut child),
            Err(TreeError::Inconsistent(Inconsistency::Cycle { .. }))
        ));
        assert_eq!(child.depth, None);

        let dangling = provider(vec![undepthed(1, Some(9))]);
        let mut child = Item::child_of(ItemId(1));
        assert!(matches!(
            dangling.pre_save(&mut child),
            Err(TreeError::Inconsistent(Inconsistency::DanglingParent { parent: ItemId(9) }))
        ));
    }

    #[test]
    fn test_pre_save_skips_walk_for_unchanged_parent() {
        // 4 sits under a corrupt chain; a weight-only edit must not walk it
        let corrupt = vec![item(2, Some(3), 0, 1), item(3, Some(2), 0, 1), item(4, Some(2), 0, 2)];
        let provider = provider(corrupt);

        let mut edited = item(4, Some(2), 5, 2);
        provider.pre_save(&mut edited).unwrap();
        assert_eq!(edited.depth, Some(2));

        // Moving it does walk, strictly
        let mut moved = item(4, Some(3), 5, 2);
        assert!(matches!(
            provider.pre_save(&mut moved),
            Err(TreeError::Inconsistent(Inconsistency::Cycle { .. }))
        ));
    }

    #[test]
    fn test_cycle_policy() {
        // 1 -> 2 -> 3 -> 2: corrupt data
        let corrupt = vec![item(1, Some(2), 0, 2), item(2, Some(3), 0, 1), item(3, Some(2), 0, 0)];

        let lenient = provider(corrupt.clone());
        assert_eq!(lenient.options().cycle_policy, CyclePolicy::Truncate);
        let query = lenient.ancestors_of(&corrupt[0], None).unwrap();
        let mut found = ids(query.execute().unwrap());
        found.sort();
        assert_eq!(found, vec![2, 3]);

        let strict = SimpleProvider::with_options(
            VecStorage {
                items: Arc::new(corrupt.clone()),
            },
            ProviderOptions::new().strict(),
        );
        assert!(matches!(
            strict.ancestors_of(&corrupt[0], None),
            Err(TreeError::Inconsistent(Inconsistency::Cycle { at: ItemId(2) }))
        ));
        assert!(matches!(
            strict.descendants_of(&corrupt[1], None),
            Err(TreeError::Inconsistent(Inconsistency::Cycle { .. }))
        ));
    }

    #[test]
    fn test_root_of_falls_back_to_item() {
        let corrupt = vec![item(1, Some(2), 0, 1), item(2, Some(1), 0, 0)];
        let provider = provider(corrupt.clone());

        let query = provider.root_of(&corrupt[0], None).unwrap();
        assert_eq!(ids(query.execute().unwrap()), vec![1]);
    }
}
