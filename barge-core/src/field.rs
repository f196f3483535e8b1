use crate::Value;
use std::{
    borrow::Cow,
    fmt::{self, Display},
    hash::{Hash, Hasher},
    ops::Deref,
};

/// A named persistable member of a row shape.
///
/// Two fields are equal when their names match ignoring ASCII case, the declared type
/// does not take part in the comparison.
#[derive(Debug, Clone)]
pub struct Field {
    pub name: Cow<'static, str>,
    /// Declared type as a typed `NULL` value, `None` when unknown.
    pub value: Option<Value>,
}

impl Field {
    pub const fn new(name: &'static str) -> Self {
        Self {
            name: Cow::Borrowed(name),
            value: None,
        }
    }
    pub fn with_type(mut self, value: Value) -> Self {
        self.value = Some(value.as_null());
        self
    }
    pub fn name(&self) -> &str {
        &self.name
    }
    pub fn is(&self, name: &str) -> bool {
        self.name.eq_ignore_ascii_case(name)
    }
}

impl PartialEq for Field {
    fn eq(&self, other: &Self) -> bool {
        self.is(&other.name)
    }
}

impl Eq for Field {}

impl Hash for Field {
    fn hash<H: Hasher>(&self, state: &mut H) {
        for b in self.name.bytes() {
            state.write_u8(b.to_ascii_lowercase());
        }
        state.write_u8(0xff);
    }
}

impl Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

impl From<&'static str> for Field {
    fn from(value: &'static str) -> Self {
        Field::new(value)
    }
}

impl From<String> for Field {
    fn from(value: String) -> Self {
        Self {
            name: value.into(),
            value: None,
        }
    }
}

/// Ordered, duplicate free list of fields.
///
/// The order is the declaration (or insertion) order and is significant: batched statements
/// rely on the positional correspondence between this list and the rendered columns.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct Fields(Vec<Field>);

impl Fields {
    pub fn new() -> Self {
        Self(Vec::new())
    }
    /// Appends the field unless another one with the same name is already present.
    pub fn push(&mut self, field: Field) -> bool {
        if self.contains(&field.name) {
            return false;
        }
        self.0.push(field);
        true
    }
    pub fn contains(&self, name: &str) -> bool {
        self.position(name).is_some()
    }
    pub fn position(&self, name: &str) -> Option<usize> {
        self.0.iter().position(|f| f.is(name))
    }
    pub fn get(&self, name: &str) -> Option<&Field> {
        self.0.iter().find(|f| f.is(name))
    }
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(Field::name)
    }
    /// Fields of `self` that are not contained in `other`, order preserved.
    pub fn except<'a>(&'a self, other: &'a Fields) -> impl Iterator<Item = &'a Field> {
        self.0.iter().filter(|f| !other.contains(&f.name))
    }
}

impl Deref for Fields {
    type Target = [Field];
    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl FromIterator<Field> for Fields {
    fn from_iter<T: IntoIterator<Item = Field>>(iter: T) -> Self {
        let mut result = Fields::new();
        for field in iter {
            result.push(field);
        }
        result
    }
}

impl<'a> FromIterator<&'a str> for Fields {
    fn from_iter<T: IntoIterator<Item = &'a str>>(iter: T) -> Self {
        iter.into_iter()
            .map(|v| Field::from(v.to_owned()))
            .collect()
    }
}

impl<const N: usize> From<[&'static str; N]> for Fields {
    fn from(value: [&'static str; N]) -> Self {
        value.into_iter().map(Field::new).collect()
    }
}

impl From<Vec<Field>> for Fields {
    fn from(value: Vec<Field>) -> Self {
        value.into_iter().collect()
    }
}

impl IntoIterator for Fields {
    type Item = Field;
    type IntoIter = std::vec::IntoIter<Field>;
    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl<'a> IntoIterator for &'a Fields {
    type Item = &'a Field;
    type IntoIter = std::slice::Iter<'a, Field>;
    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}
