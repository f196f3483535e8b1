use crate::{
    DbFields, Driver, ParameterValue, QueryResult, Result, RowLabeled, RowsAffected, TableRef,
    stream::{Stream, StreamExt, TryStreamExt},
    truncate_long,
};
use std::{
    fmt::{self, Display},
    future::{self, Future},
    sync::Arc,
    time::Duration,
};

/// Parameterized SQL text ready to be sent to the database.
#[derive(Debug, Clone, PartialEq)]
pub struct Command {
    pub sql: Arc<str>,
    pub parameters: Vec<ParameterValue>,
    /// Driver enforced deadline, `None` for the driver default.
    pub timeout: Option<Duration>,
}

impl Command {
    pub fn new(sql: impl Into<Arc<str>>) -> Self {
        Self {
            sql: sql.into(),
            parameters: Vec::new(),
            timeout: None,
        }
    }
    pub fn parameter(&self, name: &str) -> Option<&ParameterValue> {
        self.parameters.iter().find(|v| v.name == name)
    }
}

impl Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", truncate_long!(self.sql))
    }
}

/// Connection to a database, the only place where the core suspends.
pub trait Executor: Send + Sized {
    type Driver: Driver;

    fn driver(&self) -> &Self::Driver;

    /// General method to send any command and return any result type (either row or count)
    fn run(&mut self, command: Command) -> impl Stream<Item = Result<QueryResult>> + Send;

    /// Execute the command and returns the rows.
    fn fetch(&mut self, command: Command) -> impl Stream<Item = Result<RowLabeled>> + Send {
        self.run(command).filter_map(|v| async move {
            match v {
                Ok(QueryResult::Row(v)) => Some(Ok(v)),
                Err(e) => Some(Err(e)),
                _ => None,
            }
        })
    }

    /// Execute the command and return the total number of rows affected.
    fn execute(&mut self, command: Command) -> impl Future<Output = Result<RowsAffected>> + Send {
        self.run(command)
            .filter_map(|v| async move {
                match v {
                    Ok(QueryResult::Affected(v)) => Some(Ok(v)),
                    Err(e) => Some(Err(e)),
                    _ => None,
                }
            })
            .try_collect()
    }

    /// Column metadata of a table, `None` when the driver cannot introspect the schema.
    fn db_fields(
        &mut self,
        _table: &TableRef,
    ) -> impl Future<Output = Result<Option<DbFields>>> + Send {
        future::ready(Ok(None))
    }
}
