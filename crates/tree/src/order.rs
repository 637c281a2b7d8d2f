//! Client-side tree ordering
//!
//! Used when the provider cannot ask the backend for tree order natively.

use std::collections::{HashMap, HashSet};

use crate::item::{Item, ItemId};

/// Arrange items depth-first (pre-order), siblings by weight then id
///
/// Items whose parent is not part of the set act as roots of their own
/// subtree, so any subset (descendants, siblings, a page of results) can be
/// ordered. Items unreachable from such a root, which only happens with
/// cyclic data, are appended at the end in sibling order.
pub fn tree_order(items: Vec<Item>) -> Vec<Item> {
    let present: HashSet<ItemId> = items.iter().filter_map(|item| item.id).collect();

    let mut children: HashMap<Option<ItemId>, Vec<usize>> = HashMap::new();
    for (index, item) in items.iter().enumerate() {
        let parent = item.parent.filter(|parent| present.contains(parent));
        children.entry(parent).or_default().push(index);
    }
    for siblings in children.values_mut() {
        siblings.sort_by_key(|&index| (items[index].weight, items[index].id));
    }

    let mut visited = vec![false; items.len()];
    let mut order = Vec::with_capacity(items.len());

    // Push in reverse so the lightest sibling is popped first
    let mut stack: Vec<usize> = children
        .get(&None)
        .map(|roots| roots.iter().rev().copied().collect())
        .unwrap_or_default();

    while let Some(index) = stack.pop() {
        if std::mem::replace(&mut visited[index], true) {
            continue;
        }
        order.push(index);

        if let Some(kids) = items[index].id.and_then(|id| children.get(&Some(id))) {
            stack.extend(kids.iter().rev().copied());
        }
    }

    let mut leftovers: Vec<usize> = (0..items.len()).filter(|&index| !visited[index]).collect();
    leftovers.sort_by_key(|&index| (items[index].weight, items[index].id));
    order.extend(leftovers);

    let mut slots: Vec<Option<Item>> = items.into_iter().map(Some).collect();
    order
        .into_iter()
        .filter_map(|index| slots[index].take())
        .collect()
}
