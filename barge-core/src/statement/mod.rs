mod builder;
mod parameter;

pub use builder::*;
pub use parameter::*;

use crate::{Field, TableRef};

/// Sort direction of a query column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Order {
    Asc,
    Desc,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct OrderField {
    pub field: Field,
    pub order: Order,
}

impl OrderField {
    pub fn asc(field: impl Into<Field>) -> Self {
        Self {
            field: field.into(),
            order: Order::Asc,
        }
    }
    pub fn desc(field: impl Into<Field>) -> Self {
        Self {
            field: field.into(),
            order: Order::Desc,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AggregateFunction {
    Count,
    Max,
    Min,
    Sum,
    Average,
}

impl AggregateFunction {
    /// Alias of the aggregated column in the result row.
    pub fn result_name(&self) -> &'static str {
        match self {
            AggregateFunction::Count => "CountValue",
            AggregateFunction::Max => "MaxValue",
            AggregateFunction::Min => "MinValue",
            AggregateFunction::Sum => "SumValue",
            AggregateFunction::Average => "AverageValue",
        }
    }
}

/// Multi-row insert.
///
/// Every row lists its parameters in column order. When `ordered` is set each row ends with
/// an order column parameter and the rows are inserted through a derived table sorted on it.
#[derive(Debug, Clone, PartialEq)]
pub struct InsertStatement {
    pub table: TableRef,
    pub hints: Option<String>,
    pub columns: Vec<Field>,
    pub rows: Vec<Vec<Parameter>>,
    pub ordered: bool,
    pub returning: Option<Field>,
}

/// Single-row update, `set` and `qualifiers` parameters are written to the column of the same name.
#[derive(Debug, Clone, PartialEq)]
pub struct UpdateStatement {
    pub table: TableRef,
    pub hints: Option<String>,
    pub set: Vec<Parameter>,
    pub qualifiers: Vec<Parameter>,
}

/// Single-row upsert matching existing rows on `qualifiers`.
#[derive(Debug, Clone, PartialEq)]
pub struct MergeStatement {
    pub table: TableRef,
    pub hints: Option<String>,
    /// One parameter per field of the source row.
    pub source: Vec<Parameter>,
    pub qualifiers: Vec<Field>,
    pub insert: Vec<Field>,
    pub update: Vec<Field>,
    pub returning: Option<Field>,
}

/// Delete, every row of the table when `qualifiers` is empty.
#[derive(Debug, Clone, PartialEq)]
pub struct DeleteStatement {
    pub table: TableRef,
    pub hints: Option<String>,
    pub qualifiers: Vec<Parameter>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct QueryStatement {
    pub table: TableRef,
    pub hints: Option<String>,
    pub fields: Vec<Field>,
    pub qualifiers: Vec<Parameter>,
    pub order_by: Vec<OrderField>,
    pub top: Option<u32>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AggregateStatement {
    pub table: TableRef,
    pub hints: Option<String>,
    pub function: AggregateFunction,
    /// `None` only for `Count`.
    pub field: Option<Field>,
    pub qualifiers: Vec<Parameter>,
}

/// Dialect independent representation of a statement, rendered by a [`crate::SqlWriter`].
#[derive(Debug, Clone, PartialEq)]
pub enum Statement {
    Insert(InsertStatement),
    Update(UpdateStatement),
    Merge(MergeStatement),
    Delete(DeleteStatement),
    Query(QueryStatement),
    Aggregate(AggregateStatement),
    /// Statements executed as one command.
    Batch(Vec<Statement>),
}

impl Statement {
    /// Every placeholder, in the order the text references them first.
    pub fn parameters(&self) -> Vec<Parameter> {
        let mut result = Vec::new();
        self.collect_parameters(&mut result);
        result
    }

    fn collect_parameters(&self, out: &mut Vec<Parameter>) {
        match self {
            Statement::Insert(v) => out.extend(v.rows.iter().flatten().cloned()),
            Statement::Update(v) => {
                out.extend(v.set.iter().cloned());
                out.extend(v.qualifiers.iter().cloned());
            }
            Statement::Merge(v) => out.extend(v.source.iter().cloned()),
            Statement::Delete(DeleteStatement { qualifiers, .. })
            | Statement::Query(QueryStatement { qualifiers, .. })
            | Statement::Aggregate(AggregateStatement { qualifiers, .. }) => {
                out.extend(qualifiers.iter().cloned())
            }
            Statement::Batch(statements) => {
                for statement in statements {
                    statement.collect_parameters(out);
                }
            }
        }
    }

    /// The column whose generated value is returned, one row per inserted row.
    pub fn returning(&self) -> Option<&Field> {
        match self {
            Statement::Insert(v) => v.returning.as_ref(),
            Statement::Merge(v) => v.returning.as_ref(),
            Statement::Batch(v) => v.first().and_then(Statement::returning),
            _ => None,
        }
    }

    /// Number of row-slots the statement binds.
    pub fn slots(&self) -> usize {
        match self {
            Statement::Insert(v) => v.rows.len(),
            Statement::Batch(v) => v.iter().map(Statement::slots).sum(),
            _ => 1,
        }
    }
}
