#![allow(dead_code)]
use barge::{
    Command, DbFields, Driver, Executor, QueryResult, Result, RowLabeled, RowsAffected,
    SqlWriter, TableRef, Value,
    future::{self, Future},
    stream::{self, Stream},
};
use log::LevelFilter;
use std::{collections::HashMap, env, marker::PhantomData};

pub fn init_logs() {
    let mut logger = env_logger::builder();
    logger
        .is_test(true)
        .format_file(true)
        .format_line_number(true);
    if env::var("RUST_LOG").is_err() {
        logger.filter_level(LevelFilter::Warn);
    }
    let _ = logger.try_init();
}

#[derive(Debug, Clone, Copy, Default)]
pub struct MockDriver<W>(PhantomData<W>);

impl<W: SqlWriter + Default> Driver for MockDriver<W> {
    type SqlWriter = W;
    const NAME: &'static str = "mock";
    fn sql_writer(&self) -> W {
        W::default()
    }
}

type Handler = Box<dyn FnMut(&Command) -> Result<Vec<QueryResult>> + Send>;

/// In memory executor recording every command, its answers come from a handler.
pub struct MockConnection<W> {
    driver: MockDriver<W>,
    handler: Handler,
    pub commands: Vec<Command>,
    pub tables: HashMap<String, DbFields>,
    pub introspections: usize,
}

impl<W: SqlWriter + Default> MockConnection<W> {
    /// Every command affects one row per row-slot, statements with a generated column return
    /// sequential values starting at 1.
    pub fn new() -> Self {
        let mut next = 0;
        Self::with_handler(move |command| {
            let returning = command.sql.contains("RETURNING") || command.sql.contains("OUTPUT");
            Ok((0..slots(command))
                .map(|_| {
                    if returning {
                        next += 1;
                        generated_row(Value::Int64(Some(next)))
                    } else {
                        RowsAffected::new(1).into()
                    }
                })
                .collect())
        })
    }

    pub fn with_handler(
        handler: impl FnMut(&Command) -> Result<Vec<QueryResult>> + Send + 'static,
    ) -> Self {
        Self {
            driver: MockDriver(PhantomData),
            handler: Box::new(handler),
            commands: Vec::new(),
            tables: HashMap::new(),
            introspections: 0,
        }
    }

    /// Columns reported by the schema introspection of `table`.
    pub fn with_table(mut self, table: &str, db_fields: DbFields) -> Self {
        self.tables.insert(table.to_lowercase(), db_fields);
        self
    }

    pub fn sql(&self) -> Vec<&str> {
        self.commands.iter().map(|v| &*v.sql).collect()
    }
}

impl<W: SqlWriter + Default> Executor for MockConnection<W> {
    type Driver = MockDriver<W>;

    fn driver(&self) -> &Self::Driver {
        &self.driver
    }

    fn run(&mut self, command: Command) -> impl Stream<Item = Result<QueryResult>> + Send {
        let result = (self.handler)(&command);
        log::debug!("Mock command: {}", command);
        self.commands.push(command);
        stream::iter(match result {
            Ok(rows) => rows.into_iter().map(Ok).collect::<Vec<_>>(),
            Err(e) => vec![Err(e)],
        })
    }

    fn db_fields(
        &mut self,
        table: &TableRef,
    ) -> impl Future<Output = Result<Option<DbFields>>> + Send {
        self.introspections += 1;
        future::ready(Ok(self.tables.get(&table.full_name().to_lowercase()).cloned()))
    }
}

/// Number of row-slots bound by the command, from the `_N` suffix of its parameters.
pub fn slots(command: &Command) -> usize {
    command
        .parameters
        .iter()
        .map(|v| {
            v.name
                .rsplit_once('_')
                .and_then(|(_, slot)| slot.parse::<usize>().ok())
                .unwrap_or_default()
        })
        .max()
        .map_or(1, |v| v + 1)
}

pub fn generated_row(value: Value) -> QueryResult {
    RowLabeled::from([("Result", value)]).into()
}
