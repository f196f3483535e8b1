use crate::{Field, Result, StatementError, Value};
use std::{
    borrow::Cow,
    hash::{Hash, Hasher},
    ops::Deref,
};

/// Metadata of one physical table column.
#[derive(Default, Debug, Clone, PartialEq)]
pub struct DbField {
    pub name: Cow<'static, str>,
    pub is_primary: bool,
    pub is_identity: bool,
    pub is_nullable: bool,
    /// Value computed by the database (default expression, computed column).
    pub is_generated: bool,
    /// Column type expressed as a typed `NULL`, `Value::Null` when unknown.
    pub value: Value,
    pub size: Option<u32>,
    pub precision: Option<u8>,
    pub scale: Option<u8>,
}

impl DbField {
    pub fn new(name: impl Into<Cow<'static, str>>) -> Self {
        Self {
            name: name.into(),
            is_nullable: true,
            ..Default::default()
        }
    }
    pub fn primary(mut self) -> Self {
        self.is_primary = true;
        self.is_nullable = false;
        self
    }
    pub fn identity(mut self) -> Self {
        self.is_identity = true;
        self.is_nullable = false;
        self
    }
    pub fn generated(mut self) -> Self {
        self.is_generated = true;
        self
    }
    pub fn not_null(mut self) -> Self {
        self.is_nullable = false;
        self
    }
    pub fn with_type(mut self, value: Value) -> Self {
        self.value = value.as_null();
        self
    }
    pub fn with_size(mut self, size: u32) -> Self {
        self.size = Some(size);
        self
    }
    pub fn with_precision(mut self, precision: u8, scale: u8) -> Self {
        self.precision = Some(precision);
        self.scale = Some(scale);
        self
    }
    pub fn is(&self, name: &str) -> bool {
        self.name.eq_ignore_ascii_case(name)
    }
    /// The field view of this column, carrying the declared type when known.
    pub fn as_field(&self) -> Field {
        Field {
            name: self.name.clone(),
            value: (!matches!(self.value, Value::Null)).then(|| self.value.clone()),
        }
    }
    /// Primary keys generated by the database are excluded from inserts like identities.
    pub fn is_database_generated(&self) -> bool {
        self.is_identity || self.is_generated
    }
}

impl Hash for DbField {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.name.hash(state);
        self.is_primary.hash(state);
        self.is_identity.hash(state);
        self.is_nullable.hash(state);
        self.is_generated.hash(state);
        self.value.type_name().hash(state);
        if let Value::Decimal(_, precision, scale) = &self.value {
            (precision, scale).hash(state);
        }
        self.size.hash(state);
        self.precision.hash(state);
        self.scale.hash(state);
    }
}

/// Ordered column metadata of one table.
#[derive(Default, Debug, Clone, PartialEq, Hash)]
pub struct DbFields(Vec<DbField>);

impl DbFields {
    pub fn new(fields: Vec<DbField>) -> Self {
        Self(fields)
    }
    pub fn get(&self, name: &str) -> Option<&DbField> {
        self.0.iter().find(|v| v.is(name))
    }
    /// The primary column, failing when more than one column is flagged.
    pub fn primary(&self) -> Result<Option<&DbField>> {
        let mut primaries = self.0.iter().filter(|v| v.is_primary);
        let result = primaries.next();
        if let Some(other) = primaries.next() {
            return Err(StatementError::InvalidOperation(format!(
                "Composite primary keys are not supported, found at least `{}` and `{}`",
                result.map(|v| v.name.as_ref()).unwrap_or_default(),
                other.name
            ))
            .into());
        }
        Ok(result)
    }
    pub fn identity(&self) -> Option<&DbField> {
        self.0.iter().find(|v| v.is_identity)
    }
    pub fn fields(&self) -> crate::Fields {
        self.0.iter().map(DbField::as_field).collect()
    }
}

impl Deref for DbFields {
    type Target = [DbField];
    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl FromIterator<DbField> for DbFields {
    fn from_iter<T: IntoIterator<Item = DbField>>(iter: T) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl From<Vec<DbField>> for DbFields {
    fn from(value: Vec<DbField>) -> Self {
        Self(value)
    }
}
