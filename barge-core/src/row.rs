use crate::{DbFields, Fields, TableRef, Value};
use std::{collections::BTreeMap, sync::Arc};

/// Metadata about modify operations (INSERT/UPDATE/DELETE).
#[derive(Default, Debug, Clone, Copy, PartialEq, Eq)]
pub struct RowsAffected {
    /// Total number of rows impacted.
    pub rows_affected: u64,
    /// Backend-specific last inserted / affected identifier when available.
    pub last_affected_id: Option<i64>,
}

impl RowsAffected {
    pub fn new(rows_affected: u64) -> Self {
        Self {
            rows_affected,
            last_affected_id: None,
        }
    }
}

impl Extend<RowsAffected> for RowsAffected {
    fn extend<T: IntoIterator<Item = RowsAffected>>(&mut self, iter: T) {
        for elem in iter {
            self.rows_affected += elem.rows_affected;
            if elem.last_affected_id.is_some() {
                self.last_affected_id = elem.last_affected_id;
            }
        }
    }
}

/// Shared reference-counted column name list.
pub type RowNames = Arc<[String]>;
/// Owned row value slice matching `RowNames` length.
pub type Row = Box<[Value]>;

/// A result row with its corresponding column labels.
///
/// It doubles as the dynamic row shape accepted by write operations.
#[derive(Default, Debug, Clone, PartialEq)]
pub struct RowLabeled {
    /// Column names.
    pub labels: RowNames,
    /// Data values (aligned by index with `labels`).
    pub values: Row,
}

impl RowLabeled {
    pub fn new(labels: RowNames, values: Row) -> Self {
        Self { labels, values }
    }
    pub fn names(&self) -> &[String] {
        &self.labels
    }
    pub fn values(&self) -> &[Value] {
        &self.values
    }
    pub fn get_column(&self, name: &str) -> Option<&Value> {
        self.labels
            .iter()
            .position(|v| v.eq_ignore_ascii_case(name))
            .and_then(|i| self.values.get(i))
    }
    /// Move the value out of the row, leaving `Value::Null` in its place.
    pub fn take(&mut self, name: &str) -> Option<Value> {
        let i = self
            .labels
            .iter()
            .position(|v| v.eq_ignore_ascii_case(name))?;
        self.values.get_mut(i).map(std::mem::take)
    }
}

impl<S: Into<String>, const N: usize> From<[(S, Value); N]> for RowLabeled {
    fn from(value: [(S, Value); N]) -> Self {
        let (labels, values): (Vec<String>, Vec<Value>) =
            value.into_iter().map(|(k, v)| (k.into(), v)).unzip();
        Self::new(labels.into(), values.into())
    }
}

/// Heterogeneous items emitted by `Executor::run` combining rows and modify results.
#[derive(Debug)]
pub enum QueryResult {
    /// A labeled row.
    Row(RowLabeled),
    /// A modify effect aggregation.
    Affected(RowsAffected),
}

impl From<RowLabeled> for QueryResult {
    fn from(value: RowLabeled) -> Self {
        QueryResult::Row(value)
    }
}

impl From<RowsAffected> for QueryResult {
    fn from(value: RowsAffected) -> Self {
        QueryResult::Affected(value)
    }
}

/// The persistable members of a row, resolved once per call from its first row.
#[derive(Debug, Clone)]
pub enum RowShape {
    /// A type deriving `Entity`, its metadata is static.
    Entity {
        type_name: &'static str,
        table: TableRef,
        db_fields: &'static DbFields,
    },
    /// A labeled row, fields in label order.
    Dynamic { fields: Fields },
    /// A raw map, fields in key order.
    Dictionary { fields: Fields },
}

impl RowShape {
    pub fn fields(&self) -> Fields {
        match self {
            RowShape::Entity { db_fields, .. } => db_fields.fields(),
            RowShape::Dynamic { fields } | RowShape::Dictionary { fields } => fields.clone(),
        }
    }
    pub fn type_name(&self) -> &'static str {
        match self {
            RowShape::Entity { type_name, .. } => type_name,
            RowShape::Dynamic { .. } => "dynamic",
            RowShape::Dictionary { .. } => "dictionary",
        }
    }
    pub fn table(&self) -> Option<&TableRef> {
        match self {
            RowShape::Entity { table, .. } => Some(table),
            _ => None,
        }
    }
    /// Column metadata declared by the row type itself.
    pub fn declared(&self) -> Option<&'static DbFields> {
        match self {
            RowShape::Entity { db_fields, .. } => Some(db_fields),
            _ => None,
        }
    }
}

/// Something that can be bound as one row of a write operation.
pub trait RowLike {
    fn row_shape(&self) -> RowShape;
    /// Value of the member at `index` in the shape fields, named `name`.
    ///
    /// Rows of the same call are expected to share the shape of the first one, when they
    /// don't (dynamic rows with different labels) the value is looked up by name.
    fn value_at(&self, index: usize, name: &str) -> Option<Value>;
}

impl RowLike for RowLabeled {
    fn row_shape(&self) -> RowShape {
        RowShape::Dynamic {
            fields: self.labels.iter().map(|v| v.as_str()).collect(),
        }
    }
    fn value_at(&self, index: usize, name: &str) -> Option<Value> {
        match self.labels.get(index) {
            Some(label) if label.eq_ignore_ascii_case(name) => self.values.get(index).cloned(),
            _ => self.get_column(name).cloned(),
        }
    }
}

impl RowLike for BTreeMap<String, Value> {
    fn row_shape(&self) -> RowShape {
        RowShape::Dictionary {
            fields: self.keys().map(|v| v.as_str()).collect(),
        }
    }
    fn value_at(&self, _index: usize, name: &str) -> Option<Value> {
        self.get(name).cloned().or_else(|| {
            self.iter()
                .find(|(k, _)| k.eq_ignore_ascii_case(name))
                .map(|(_, v)| v.clone())
        })
    }
}

impl<T: RowLike + ?Sized> RowLike for &T {
    fn row_shape(&self) -> RowShape {
        (**self).row_shape()
    }
    fn value_at(&self, index: usize, name: &str) -> Option<Value> {
        (**self).value_at(index, name)
    }
}
