use crate::{
    AggregateFunction, Capabilities, Field, Fragment, MergeStatement, SqlWriter, separated_by,
    writer::Context,
};
use std::fmt::Write;

/// SQL Server dialect: bracket quoting, table hints, `OUTPUT INSERTED`, `MERGE` and `TOP`.
///
/// Generated values of a multi-row insert are not returned in input order, batched inserts
/// go through the order column.
#[derive(Default, Debug, Clone, Copy)]
pub struct SqlServerSqlWriter {}

impl SqlServerSqlWriter {
    pub const NAME: &'static str = "sqlserver";
    pub const CAPABILITIES: Capabilities = Capabilities {
        multiple_statements: true,
        hints: true,
        ordered_returning: false,
    };
}

impl SqlWriter for SqlServerSqlWriter {
    fn as_dyn(&self) -> &dyn SqlWriter {
        self
    }

    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn capabilities(&self) -> Capabilities {
        Self::CAPABILITIES
    }

    fn write_identifier_quoted(&self, context: &mut Context, out: &mut String, value: &str) {
        out.push('[');
        self.write_escaped(context, out, value, ']', "]]");
        out.push(']');
    }

    fn write_insert_output(
        &self,
        context: &mut Context,
        out: &mut String,
        returning: Option<&Field>,
    ) {
        if let Some(returning) = returning {
            out.push_str(" OUTPUT ");
            self.write_column(context, out, returning);
            out.push_str(" AS ");
            self.write_identifier_quoted(context, out, "Result");
        }
    }

    fn write_returning(&self, _context: &mut Context, _out: &mut String, _returning: Option<&Field>) {}

    fn write_top(&self, _context: &mut Context, out: &mut String, top: Option<u32>) {
        if let Some(top) = top {
            let _ = write!(out, "TOP ({}) ", top);
        }
    }

    fn write_limit(&self, _context: &mut Context, _out: &mut String, _top: Option<u32>) {}

    fn write_aggregate_function(
        &self,
        _context: &mut Context,
        out: &mut String,
        function: AggregateFunction,
    ) {
        out.push_str(match function {
            AggregateFunction::Count => "COUNT_BIG",
            AggregateFunction::Max => "MAX",
            AggregateFunction::Min => "MIN",
            AggregateFunction::Sum => "SUM",
            AggregateFunction::Average => "AVG",
        });
    }

    fn write_merge(&self, context: &mut Context, out: &mut String, value: &MergeStatement) {
        out.push_str("MERGE ");
        self.write_table_ref(context, out, &value.table);
        self.write_hints(context, out, value.hints.as_deref());
        out.push_str(" AS T USING ( SELECT ");
        separated_by(
            out,
            &value.source,
            |out, v| {
                self.write_parameter(context, out, v);
                out.push_str(" AS ");
                self.write_identifier_quoted(context, out, &v.field.name);
            },
            ", ",
        );
        out.push_str(" ) AS S ON ( ");
        separated_by(
            out,
            &value.qualifiers,
            |out, v| {
                self.write_column(
                    &mut context.switch_fragment(Fragment::SqlMergeSource).current,
                    out,
                    v,
                );
                out.push_str(" = ");
                self.write_column(
                    &mut context.switch_fragment(Fragment::SqlMergeTarget).current,
                    out,
                    v,
                );
            },
            " AND ",
        );
        out.push_str(" ) WHEN NOT MATCHED THEN INSERT ( ");
        self.write_columns(context, out, &value.insert);
        out.push_str(" ) VALUES ( ");
        self.write_columns(
            &mut context.switch_fragment(Fragment::SqlMergeSource).current,
            out,
            &value.insert,
        );
        out.push_str(" )");
        if !value.update.is_empty() {
            out.push_str(" WHEN MATCHED THEN UPDATE SET ");
            separated_by(
                out,
                &value.update,
                |out, v| {
                    self.write_column(
                        &mut context.switch_fragment(Fragment::SqlMergeTarget).current,
                        out,
                        v,
                    );
                    out.push_str(" = ");
                    self.write_column(
                        &mut context.switch_fragment(Fragment::SqlMergeSource).current,
                        out,
                        v,
                    );
                },
                ", ",
            );
        }
        self.write_insert_output(
            &mut context.switch_fragment(Fragment::SqlInsertIntoOutput).current,
            out,
            value.returning.as_ref(),
        );
        out.push_str(" ;");
    }
}
