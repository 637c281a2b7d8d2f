use std::sync::Arc;

use tree::{Column, Condition, Criteria, Direction, Filter, Item, Query, Result};

use crate::storage::Shared;

/// A query over a [`MemoryStorage`](crate::MemoryStorage)
///
/// Evaluated against a snapshot of the items taken when it executes.
#[derive(Debug)]
pub struct MemoryQuery {
    shared: Arc<Shared>,
    criteria: Criteria,
}

impl MemoryQuery {
    pub(crate) fn new(shared: Arc<Shared>) -> Self {
        Self {
            shared,
            criteria: Criteria::new(),
        }
    }

    /// The accumulated predicates and ordering
    pub fn criteria(&self) -> &Criteria {
        &self.criteria
    }
}

impl Query for MemoryQuery {
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
        self.shared.ensure_online()?;
        self.shared.count_execution();

        if self.criteria.is_always_false() {
            return Ok(Vec::new());
        }

        let items = self.shared.read()?;
        Ok(self.criteria.apply(items.values().cloned()))
    }
}
