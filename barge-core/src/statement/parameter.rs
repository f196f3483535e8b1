use crate::{Field, Value};

/// Name of the auxiliary column correlating batched insert rows with their input position.
pub const ORDER_COLUMN: &str = "__RepoDb_OrderColumn";

/// Name of the parameter bound to `name` in the row-slot `slot`.
///
/// Slot `0` keeps the plain name, every other slot gets the `_{slot}` suffix. Both the
/// statement builder and the parameter binder go through this function.
pub fn parameter_name(name: &str, slot: usize) -> String {
    if slot == 0 {
        name.to_string()
    } else {
        let mut buffer = itoa::Buffer::new();
        let suffix = buffer.format(slot);
        let mut result = String::with_capacity(name.len() + suffix.len() + 1);
        result.push_str(name);
        result.push('_');
        result.push_str(suffix);
        result
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ParameterKind {
    /// Bound to the value of the field in the row.
    Column,
    /// Bound to the row-slot index.
    OrderColumn,
}

/// Placeholder of a statement, one per field per row-slot.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Parameter {
    pub field: Field,
    pub slot: usize,
    pub kind: ParameterKind,
}

impl Parameter {
    pub fn column(field: Field, slot: usize) -> Self {
        Self {
            field,
            slot,
            kind: ParameterKind::Column,
        }
    }
    pub fn order_column(slot: usize) -> Self {
        Self {
            field: Field::new(ORDER_COLUMN),
            slot,
            kind: ParameterKind::OrderColumn,
        }
    }
    /// Parameter name, without the dialect prefix.
    pub fn name(&self) -> String {
        match self.kind {
            ParameterKind::Column => parameter_name(&self.field.name, self.slot),
            // Always suffixed, also in the first slot
            ParameterKind::OrderColumn => format!("{}_{}", ORDER_COLUMN, self.slot),
        }
    }
    /// The same placeholder moved to another row-slot.
    pub fn at_slot(&self, slot: usize) -> Self {
        Self {
            field: self.field.clone(),
            slot,
            kind: self.kind,
        }
    }
    /// Column the parameter is written to.
    pub fn column_name(&self) -> &str {
        &self.field.name
    }
}

/// A parameter name with the value bound to it.
#[derive(Debug, Clone, PartialEq)]
pub struct ParameterValue {
    pub name: String,
    pub value: Value,
}

impl ParameterValue {
    pub fn new(name: impl Into<String>, value: Value) -> Self {
        Self {
            name: name.into(),
            value,
        }
    }
}
