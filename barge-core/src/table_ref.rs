use crate::{Result, StatementError};
use std::{
    borrow::Cow,
    fmt::{self, Display},
};

/// Resolved target table, optionally schema qualified.
#[derive(Default, Debug, Clone, PartialEq, Eq, Hash)]
pub struct TableRef {
    pub schema: Cow<'static, str>,
    pub name: Cow<'static, str>,
}

impl TableRef {
    pub const fn new(name: &'static str) -> Self {
        Self {
            schema: Cow::Borrowed(""),
            name: Cow::Borrowed(name),
        }
    }
    pub const fn with_schema(schema: &'static str, name: &'static str) -> Self {
        Self {
            schema: Cow::Borrowed(schema),
            name: Cow::Borrowed(name),
        }
    }

    /// Parse a possibly quoted `schema.table` name.
    ///
    /// Existing `[..]`, `".."` or `` `..` `` quoting is removed so that the writer can apply
    /// the dialect's own. A blank name is an `ArgumentNull("table")` error.
    pub fn parse(name: &str) -> Result<Self> {
        let name = name.trim();
        if name.is_empty() {
            return Err(StatementError::ArgumentNull("table").into());
        }
        let mut parts = split_quoted(name);
        let table = parts.pop().unwrap_or_default();
        if table.trim().is_empty() {
            return Err(StatementError::ArgumentNull("table").into());
        }
        Ok(Self {
            schema: parts.join(".").into(),
            name: table.into(),
        })
    }

    pub fn full_name(&self) -> String {
        let mut result = String::new();
        if !self.schema.is_empty() {
            result.push_str(&self.schema);
            result.push('.');
        }
        result.push_str(&self.name);
        result
    }

    /// The name in a form that [`TableRef::parse`] reads back unchanged, parts containing a dot
    /// are quoted.
    pub fn qualified_name(&self) -> String {
        let part = |v: &str| {
            if v.contains('.') {
                format!("\"{}\"", v)
            } else {
                v.to_string()
            }
        };
        if self.schema.is_empty() {
            part(&self.name)
        } else {
            format!("{}.{}", part(&self.schema), part(&self.name))
        }
    }
}

fn split_quoted(input: &str) -> Vec<String> {
    let mut result = Vec::new();
    let mut current = String::new();
    let mut closing: Option<char> = None;
    for c in input.chars() {
        match closing {
            Some(close) if c == close => closing = None,
            Some(..) => current.push(c),
            None => match c {
                '[' => closing = Some(']'),
                '"' | '`' => closing = Some(c),
                '.' => result.push(std::mem::take(&mut current)),
                _ => current.push(c),
            },
        }
    }
    result.push(current);
    result
        .into_iter()
        .map(|v| v.trim().to_string())
        .collect()
}

impl Display for TableRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.full_name())
    }
}

impl TryFrom<&str> for TableRef {
    type Error = crate::Error;
    fn try_from(value: &str) -> Result<Self> {
        TableRef::parse(value)
    }
}
