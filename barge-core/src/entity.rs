use crate::{DbFields, Result, Row, RowLabeled, RowLike, TableRef, Value};

/// A statically typed row mapped to a table, usually implemented with `#[derive(Entity)]`.
///
/// The derive also implements [`RowLike`] so that entities can be written by every
/// operation of a [`crate::Session`].
pub trait Entity: RowLike {
    fn table_ref() -> &'static TableRef;
    /// Declared columns, in declaration order.
    fn db_fields() -> &'static DbFields;
    /// Value of the column at `index` in [`Entity::db_fields`].
    fn field_value(&self, index: usize) -> Option<Value>;
    fn from_row(row: RowLabeled) -> Result<Self>
    where
        Self: Sized;

    fn row_full(&self) -> Row {
        (0..Self::db_fields().len())
            .map(|i| self.field_value(i).unwrap_or_default())
            .collect()
    }
    /// Value of the declared primary key, if any.
    fn primary_key(&self) -> Option<Value> {
        let db_fields = Self::db_fields();
        let index = db_fields.iter().position(|v| v.is_primary)?;
        self.field_value(index)
    }
}
