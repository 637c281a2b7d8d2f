//! Composable queries over the item set

use std::cmp::Ordering;

use crate::column::{Column, Condition, Direction};
use crate::error::Result;
use crate::item::Item;

/// A mutable, composable query bound to one storage backend
///
/// Builder methods accumulate predicates and sort keys and return `&mut Self`
/// so they can be chained. `execute` consumes the query, so a query runs at
/// most once.
///
/// # Example
///
/// ```ignore
/// let mut query = storage.query();
/// query
///     .condition(Condition::eq(Column::Parent, parent_id))
///     .order_by(Column::Weight, Direction::Asc);
/// let children = query.execute()?;
/// ```
pub trait Query: Sized {
    /// Restrict results to items where the condition holds
    fn condition(&mut self, condition: Condition) -> &mut Self;

    /// Restrict results to items where `column` is NULL
    fn is_null(&mut self, column: Column) -> &mut Self;

    /// Restrict results to items where `column` is not NULL
    fn is_not_null(&mut self, column: Column) -> &mut Self;

    /// Force an empty result set
    fn always_false(&mut self) -> &mut Self;

    /// Append a sort key; repeated calls sort by each key in call order
    fn order_by(&mut self, column: Column, direction: Direction) -> &mut Self;

    /// Run the query against its backend
    ///
    /// Fails with [`TreeError::Storage`](crate::TreeError::Storage) when the
    /// backend cannot run it.
    fn execute(self) -> Result<Vec<Item>>;

    /// Run the query and keep only the first result
    fn first(self) -> Result<Option<Item>> {
        Ok(self.execute()?.into_iter().next())
    }
}

/// A single accumulated predicate
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Filter {
    Condition(Condition),
    IsNull(Column),
    IsNotNull(Column),
}

impl Filter {
    pub fn matches(&self, item: &Item) -> bool {
        match self {
            Filter::Condition(condition) => condition.matches(item.column_value(condition.column())),
            Filter::IsNull(column) => item.column_value(*column).is_none(),
            Filter::IsNotNull(column) => item.column_value(*column).is_some(),
        }
    }
}

/// The accumulated state of a query as plain data
///
/// Backends can embed a `Criteria` to implement [`Query`]: translate it to
/// their native query language, or evaluate it directly with [`matches`] and
/// [`sort`] as the in-memory backend does.
///
/// [`matches`]: Criteria::matches
/// [`sort`]: Criteria::sort
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Criteria {
    filters: Vec<Filter>,
    ordering: Vec<(Column, Direction)>,
    always_false: bool,
}

impl Criteria {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, filter: Filter) {
        self.filters.push(filter);
    }

    pub fn push_order(&mut self, column: Column, direction: Direction) {
        self.ordering.push((column, direction));
    }

    pub fn set_always_false(&mut self) {
        self.always_false = true;
    }

    pub fn filters(&self) -> &[Filter] {
        &self.filters
    }

    pub fn ordering(&self) -> &[(Column, Direction)] {
        &self.ordering
    }

    pub fn is_always_false(&self) -> bool {
        self.always_false
    }

    /// Returns true if the item satisfies every accumulated predicate
    pub fn matches(&self, item: &Item) -> bool {
        !self.always_false && self.filters.iter().all(|filter| filter.matches(item))
    }

    /// Compare two items by the accumulated sort keys
    ///
    /// NULLs sort first in ascending order. Ties fall back to ascending id so
    /// the order is stable across executions.
    pub fn compare(&self, a: &Item, b: &Item) -> Ordering {
        self.ordering
            .iter()
            .map(|&(column, direction)| {
                let ordering = a.column_value(column).cmp(&b.column_value(column));
                match direction {
                    Direction::Asc => ordering,
                    Direction::Desc => ordering.reverse(),
                }
            })
            .find(|ordering| ordering.is_ne())
            .unwrap_or_else(|| a.id.cmp(&b.id))
    }

    pub fn sort(&self, items: &mut [Item]) {
        items.sort_by(|a, b| self.compare(a, b));
    }

    /// Filter and sort a candidate set
    pub fn apply<I>(&self, items: I) -> Vec<Item>
    where
        I: IntoIterator<Item = Item>,
    {
        if self.always_false {
            return Vec::new();
        }

        let mut matched: Vec<Item> = items.into_iter().filter(|item| self.matches(item)).collect();
        self.sort(&mut matched);
        matched
    }
}
