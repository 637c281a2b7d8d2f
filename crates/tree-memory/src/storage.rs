use anyhow::anyhow;
use log::debug;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, AtomicI64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, RwLock, RwLockReadGuard, RwLockWriteGuard};

use tree::{Inconsistency, Item, ItemId, Provider, Result, Storage, WritableStorage};

use crate::query::MemoryQuery;

/// State shared between a storage and the queries it handed out
#[derive(Debug, Default)]
pub(crate) struct Shared {
    items: RwLock<BTreeMap<ItemId, Item>>,
    // Held by one save or delete from pre_save until the write lands
    writer: Mutex<()>,
    last_id: AtomicI64,
    executed: AtomicUsize,
    offline: AtomicBool,
}

impl Shared {
    pub(crate) fn read(&self) -> Result<RwLockReadGuard<'_, BTreeMap<ItemId, Item>>> {
        self.items
            .read()
            .map_err(|_| anyhow!("Memory storage lock poisoned").into())
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, BTreeMap<ItemId, Item>>> {
        self.items
            .write()
            .map_err(|_| anyhow!("Memory storage lock poisoned").into())
    }

    fn lock_writer(&self) -> Result<MutexGuard<'_, ()>> {
        self.writer
            .lock()
            .map_err(|_| anyhow!("Memory storage writer lock poisoned").into())
    }

    pub(crate) fn ensure_online(&self) -> Result<()> {
        if self.offline.load(Ordering::SeqCst) {
            return Err(anyhow!("Memory storage is offline").into());
        }
        Ok(())
    }

    pub(crate) fn count_execution(&self) {
        self.executed.fetch_add(1, Ordering::SeqCst);
    }

    fn next_id(&self) -> ItemId {
        ItemId(self.last_id.fetch_add(1, Ordering::SeqCst) + 1)
    }
}

/// An in-memory tree storage
///
/// Cloning is cheap and every clone shares the same items, so one storage can
/// back several providers. Items live in a `BTreeMap` behind an `RwLock`;
/// queries take a read lock only while they execute.
///
/// The storage enforces what an external database would: ids are unique,
/// parents must exist, and items with children cannot be deleted. Writes are
/// serialized, so `pre_save` always validates against the data its write
/// lands on.
#[derive(Debug, Clone, Default)]
pub struct MemoryStorage {
    shared: Arc<Shared>,
}

impl MemoryStorage {
    /// Create an empty storage
    pub fn new() -> Self {
        Self::default()
    }

    /// Load items as-is, without hooks or validation
    ///
    /// Meant for restoring a dump, including one holding corrupt data. Items
    /// without an id get a fresh one. Returns the ids in input order.
    pub fn import<I>(&self, items: I) -> Result<Vec<ItemId>>
    where
        I: IntoIterator<Item = Item>,
    {
        let items: Vec<Item> = items.into_iter().collect();
        if let Some(max) = items.iter().filter_map(|item| item.id).max() {
            self.shared.last_id.fetch_max(max.get(), Ordering::SeqCst);
        }

        let _writer = self.shared.lock_writer()?;
        let mut stored = self.shared.write()?;
        let mut ids = Vec::with_capacity(items.len());

        for mut item in items {
            let id = item.id.unwrap_or_else(|| self.shared.next_id());
            item.id = Some(id);
            stored.insert(id, item);
            ids.push(id);
        }

        debug!("Imported {} items", ids.len());
        Ok(ids)
    }

    /// Get a snapshot of every stored item, by id
    pub fn items(&self) -> Result<Vec<Item>> {
        Ok(self.shared.read()?.values().cloned().collect())
    }

    pub fn len(&self) -> Result<usize> {
        Ok(self.shared.read()?.len())
    }

    pub fn is_empty(&self) -> Result<bool> {
        Ok(self.len()? == 0)
    }

    /// Number of queries executed so far
    pub fn executed_queries(&self) -> usize {
        self.shared.executed.load(Ordering::SeqCst)
    }

    /// Take the storage offline: every read and write fails until it is
    /// brought back
    pub fn set_offline(&self, offline: bool) {
        self.shared.offline.store(offline, Ordering::SeqCst);
    }
}

impl Storage for MemoryStorage {
    type Query = MemoryQuery;

    fn query(&self) -> MemoryQuery {
        MemoryQuery::new(Arc::clone(&self.shared))
    }
}

impl WritableStorage for MemoryStorage {
    fn save<P>(&self, provider: &P, item: &mut Item) -> Result<ItemId>
    where
        P: Provider + ?Sized,
    {
        self.shared.ensure_online()?;
        let writer = self.shared.lock_writer()?;
        provider.pre_save(item)?;

        let mut stored = self.shared.write()?;
        if let Some(parent) = item.parent {
            if !stored.contains_key(&parent) {
                return Err(Inconsistency::DanglingParent { parent }.into());
            }
        }

        match item.id {
            None => {
                let id = self.shared.next_id();
                item.id = Some(id);
                stored.insert(id, item.clone());
                drop((stored, writer));

                debug!("Inserted {} under {:?} at depth {:?}", id, item.parent, item.depth);
                provider.post_insert(item)?;
                Ok(id)
            }
            Some(id) => {
                if !stored.contains_key(&id) {
                    return Err(anyhow!("Item {} does not exist", id).into());
                }
                stored.insert(id, item.clone());
                drop((stored, writer));

                debug!("Updated {} under {:?} at depth {:?}", id, item.parent, item.depth);
                provider.post_update(item)?;
                Ok(id)
            }
        }
    }

    fn delete<P>(&self, provider: &P, id: ItemId) -> Result<()>
    where
        P: Provider + ?Sized,
    {
        self.shared.ensure_online()?;
        let writer = self.shared.lock_writer()?;

        let mut stored = self.shared.write()?;
        if stored.values().any(|item| item.parent == Some(id)) {
            return Err(anyhow!("Item {} still has children", id).into());
        }
        if stored.remove(&id).is_none() {
            return Err(anyhow!("Item {} does not exist", id).into());
        }
        drop((stored, writer));

        debug!("Deleted {}", id);
        provider.post_delete(id)
    }

    fn load<P>(&self, provider: &P, id: ItemId) -> Result<Option<Item>>
    where
        P: Provider + ?Sized,
    {
        self.shared.ensure_online()?;

        let item = self.shared.read()?.get(&id).cloned();
        match item {
            Some(mut item) => {
                provider.post_load(&mut item)?;
                Ok(Some(item))
            }
            None => Ok(None),
        }
    }
}
