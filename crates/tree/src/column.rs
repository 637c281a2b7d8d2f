//! The closed query vocabulary shared by every backend
//!
//! Columns, operators and sort directions are fixed enums so that an invalid
//! combination is rejected when a [`Condition`] is built, never when a backend
//! executes it. Adapters map [`Column::name`] to their native field names.

use derive_more::Display;
use std::fmt;
use std::str::FromStr;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::error::{Result, TreeError};

/// A tree column
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Column {
    Id,
    Parent,
    Weight,
    Depth,
}

impl Column {
    /// All columns, in declaration order
    pub const ALL: [Column; 4] = [Column::Id, Column::Parent, Column::Weight, Column::Depth];

    /// The storage-agnostic column name
    pub const fn name(self) -> &'static str {
        match self {
            Column::Id => "id",
            Column::Parent => "parent",
            Column::Weight => "weight",
            Column::Depth => "depth",
        }
    }
}

impl fmt::Display for Column {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Column {
    type Err = TreeError;

    fn from_str(s: &str) -> Result<Self> {
        Column::ALL
            .into_iter()
            .find(|column| column.name() == s)
            .ok_or_else(|| TreeError::UnknownColumn(s.to_string()))
    }
}

/// A comparison operator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Operator {
    #[display(fmt = "=")]
    Eq,
    #[display(fmt = "IN")]
    In,
    #[display(fmt = "<")]
    Lt,
    #[display(fmt = ">")]
    Gt,
    #[display(fmt = "<=")]
    Le,
    #[display(fmt = ">=")]
    Ge,
    #[display(fmt = "LIKE")]
    Like,
    #[display(fmt = "BETWEEN")]
    Between,
}

impl FromStr for Operator {
    type Err = TreeError;

    fn from_str(s: &str) -> Result<Self> {
        let operator = match s.trim().to_ascii_uppercase().as_str() {
            "=" | "==" => Operator::Eq,
            "IN" => Operator::In,
            "<" => Operator::Lt,
            ">" => Operator::Gt,
            "<=" => Operator::Le,
            ">=" => Operator::Ge,
            "LIKE" => Operator::Like,
            "BETWEEN" => Operator::Between,
            _ => return Err(TreeError::UnknownOperator(s.to_string())),
        };
        Ok(operator)
    }
}

/// Sort direction for `order_by`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Display)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Direction {
    #[default]
    #[display(fmt = "ASC")]
    Asc,
    #[display(fmt = "DESC")]
    Desc,
}

impl FromStr for Direction {
    type Err = TreeError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_uppercase().as_str() {
            "ASC" => Ok(Direction::Asc),
            "DESC" => Ok(Direction::Desc),
            _ => Err(TreeError::UnknownDirection(s.to_string())),
        }
    }
}

/// The right-hand side of a condition
#[derive(Debug, Clone, PartialEq, Eq, Display)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Value {
    #[display(fmt = "{}", _0)]
    Int(i64),
    #[display(fmt = "{:?}", _0)]
    List(Vec<i64>),
    #[display(fmt = "{} AND {}", _0, _1)]
    Range(i64, i64),
    #[display(fmt = "'{}'", _0)]
    Pattern(String),
}

impl Value {
    /// The operator used when a condition does not name one
    pub fn default_operator(&self) -> Operator {
        match self {
            Value::Int(_) => Operator::Eq,
            Value::List(_) => Operator::In,
            Value::Range(..) => Operator::Between,
            Value::Pattern(_) => Operator::Like,
        }
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Value::Int(value)
    }
}

impl From<crate::ItemId> for Value {
    fn from(id: crate::ItemId) -> Self {
        Value::Int(id.get())
    }
}

impl From<Vec<i64>> for Value {
    fn from(values: Vec<i64>) -> Self {
        Value::List(values)
    }
}

impl From<Vec<crate::ItemId>> for Value {
    fn from(ids: Vec<crate::ItemId>) -> Self {
        Value::List(ids.into_iter().map(crate::ItemId::get).collect())
    }
}

impl From<&str> for Value {
    fn from(pattern: &str) -> Self {
        Value::Pattern(pattern.to_string())
    }
}

/// A validated `column operator value` predicate
#[derive(Debug, Clone, PartialEq, Eq, Display)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[display(fmt = "{} {} {}", column, operator, value)]
pub struct Condition {
    column: Column,
    operator: Operator,
    value: Value,
}

impl Condition {
    /// Build a condition, defaulting the operator from the value's shape
    ///
    /// Returns [`TreeError::InvalidCondition`] when the operator cannot take
    /// the given value (e.g. `=` with a list, or a reversed `BETWEEN` range).
    pub fn new(column: Column, value: impl Into<Value>, operator: Option<Operator>) -> Result<Self> {
        let value = value.into();
        let operator = operator.unwrap_or_else(|| value.default_operator());

        let valid = match (&value, operator) {
            (
                Value::Int(_),
                Operator::Eq | Operator::Lt | Operator::Gt | Operator::Le | Operator::Ge,
            ) => true,
            (Value::List(_), Operator::In) => true,
            (Value::Range(low, high), Operator::Between) => low <= high,
            (Value::Pattern(_), Operator::Like) => true,
            _ => false,
        };

        if !valid {
            return Err(TreeError::InvalidCondition { operator, value });
        }

        Ok(Self {
            column,
            operator,
            value,
        })
    }

    /// `column = value`
    pub fn eq(column: Column, value: impl Into<i64>) -> Self {
        Self {
            column,
            operator: Operator::Eq,
            value: Value::Int(value.into()),
        }
    }

    /// `column IN (values)`
    pub fn any_of<I, V>(column: Column, values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<i64>,
    {
        Self {
            column,
            operator: Operator::In,
            value: Value::List(values.into_iter().map(Into::into).collect()),
        }
    }

    pub fn column(&self) -> Column {
        self.column
    }

    pub fn operator(&self) -> Operator {
        self.operator
    }

    pub fn value(&self) -> &Value {
        &self.value
    }

    /// Evaluate against a nullable column value; NULL never matches
    pub fn matches(&self, actual: Option<i64>) -> bool {
        let Some(actual) = actual else {
            return false;
        };

        match (&self.value, self.operator) {
            (Value::Int(v), Operator::Eq) => actual == *v,
            (Value::Int(v), Operator::Lt) => actual < *v,
            (Value::Int(v), Operator::Gt) => actual > *v,
            (Value::Int(v), Operator::Le) => actual <= *v,
            (Value::Int(v), Operator::Ge) => actual >= *v,
            (Value::List(values), Operator::In) => values.contains(&actual),
            (Value::Range(low, high), Operator::Between) => (*low..=*high).contains(&actual),
            (Value::Pattern(pattern), Operator::Like) => like(pattern, &actual.to_string()),
            // Unreachable for conditions built through the constructors.
            _ => false,
        }
    }
}

/// SQL `LIKE` with `%` and `_` wildcards
fn like(pattern: &str, text: &str) -> bool {
    let pattern: Vec<char> = pattern.chars().collect();
    let text: Vec<char> = text.chars().collect();

    let (mut p, mut t) = (0, 0);
    // Position of the last `%` and the text index it was tried at
    let mut backtrack: Option<(usize, usize)> = None;

    while t < text.len() {
        match pattern.get(p) {
            Some(&'%') => {
                backtrack = Some((p, t));
                p += 1;
            }
            Some(&c) if c == '_' || c == text[t] => {
                p += 1;
                t += 1;
            }
            _ => match backtrack {
                Some((star, matched)) => {
                    p = star + 1;
                    t = matched + 1;
                    backtrack = Some((star, matched + 1));
                }
                None => return false,
            },
        }
    }

    pattern[p..].iter().all(|&c| c == '%')
}
