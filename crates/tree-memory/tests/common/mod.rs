#![allow(dead_code)]

use tree::{Item, ItemId, Query, Result, SimpleProvider, WritableStorage};
use tree_memory::{MemoryQuery, MemoryStorage};

pub type MemoryProvider = SimpleProvider<MemoryStorage>;

pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

pub fn setup() -> (MemoryStorage, MemoryProvider) {
    init_logging();
    let storage = MemoryStorage::new();
    let provider = SimpleProvider::new(storage.clone());
    (storage, provider)
}

/// Save a forest described as `(parent index, weight)` pairs, parents first
pub fn build(storage: &MemoryStorage, provider: &MemoryProvider, shape: &[(Option<usize>, i64)]) -> Vec<Item> {
    let mut items: Vec<Item> = Vec::with_capacity(shape.len());
    for &(parent, weight) in shape {
        let mut item = match parent {
            Some(index) => Item::child_of(items[index].id.expect("parent saved")),
            None => storage.create(),
        }
        .with_weight(weight);
        storage.save(provider, &mut item).expect("save");
        items.push(item);
    }
    items
}

/// A(root,w=0) ── B(w=0) ── D(w=0)
///            └── C(w=1)
pub fn scenario(storage: &MemoryStorage, provider: &MemoryProvider) -> [Item; 4] {
    let items = build(storage, provider, &[(None, 0), (Some(0), 0), (Some(0), 1), (Some(1), 0)]);
    <[Item; 4]>::try_from(items).expect("four items")
}

pub fn ids(query: Result<MemoryQuery>) -> Vec<ItemId> {
    query
        .expect("query built")
        .execute()
        .expect("query executed")
        .into_iter()
        .filter_map(|item| item.id)
        .collect()
}

pub fn sorted_ids(query: Result<MemoryQuery>) -> Vec<ItemId> {
    let mut found = ids(query);
    found.sort();
    found
}

pub fn id(item: &Item) -> ItemId {
    item.id.expect("item saved")
}
