use crate::{AggregateFunction, Capabilities, SqlWriter, writer::Context};

/// SQLite dialect.
#[derive(Default, Debug, Clone, Copy)]
pub struct SqliteSqlWriter {}

impl SqliteSqlWriter {
    pub const NAME: &'static str = "sqlite";
    pub const CAPABILITIES: Capabilities = Capabilities {
        multiple_statements: true,
        hints: false,
        ordered_returning: true,
    };
}

impl SqlWriter for SqliteSqlWriter {
    fn as_dyn(&self) -> &dyn SqlWriter {
        self
    }

    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn capabilities(&self) -> Capabilities {
        Self::CAPABILITIES
    }

    fn write_aggregate_function(
        &self,
        _context: &mut Context,
        out: &mut String,
        function: AggregateFunction,
    ) {
        // SUM over an empty set is NULL, TOTAL is 0.0
        out.push_str(match function {
            AggregateFunction::Count => "COUNT",
            AggregateFunction::Max => "MAX",
            AggregateFunction::Min => "MIN",
            AggregateFunction::Sum => "TOTAL",
            AggregateFunction::Average => "AVG",
        });
    }
}
