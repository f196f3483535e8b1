use crate::{
    AggregateFunction, AggregateStatement, Capabilities, DeleteStatement, Field, Fragment,
    InsertStatement, MergeStatement, ORDER_COLUMN, Order, Parameter, QueryStatement, RequestKind,
    Result, Statement, StatementArgs, StatementBuilder, TableRef, UpdateStatement, separated_by,
    writer::Context,
};
use std::fmt::Write;

/// Dialect printer converting a [`Statement`] into SQL text.
///
/// The default implementation renders ANSI SQL with double quoted identifiers, `RETURNING`
/// for generated values and `INSERT ... ON CONFLICT` for merges. Tokens are separated by
/// single spaces and every statement ends with ` ;`.
pub trait SqlWriter: Send + Sync {
    fn as_dyn(&self) -> &dyn SqlWriter;

    /// Dialect name, part of the execution context cache key.
    fn name(&self) -> &'static str;

    fn capabilities(&self) -> Capabilities;

    fn builder(&self) -> StatementBuilder {
        StatementBuilder::new(self.capabilities())
    }

    /// Build the statement of `kind` and render it.
    fn create(&self, kind: RequestKind, args: &StatementArgs) -> Result<String> {
        let statement = self.builder().build(kind, args)?;
        let mut out = String::with_capacity(128);
        self.write_statement(&mut out, &statement);
        Ok(out)
    }

    /// Escape occurrences of `search` char with `replace` while copying into buffer.
    fn write_escaped(
        &self,
        _context: &mut Context,
        out: &mut String,
        value: &str,
        search: char,
        replace: &str,
    ) {
        let mut position = 0;
        for (i, c) in value.char_indices() {
            if c == search {
                out.push_str(&value[position..i]);
                out.push_str(replace);
                position = i + c.len_utf8();
            }
        }
        out.push_str(&value[position..]);
    }

    /// Quote identifiers ("name") doubling inner quotes.
    fn write_identifier_quoted(&self, context: &mut Context, out: &mut String, value: &str) {
        out.push('"');
        self.write_escaped(context, out, value, '"', "\"\"");
        out.push('"');
    }

    fn write_table_ref(&self, context: &mut Context, out: &mut String, value: &TableRef) {
        if !value.schema.is_empty() {
            self.write_identifier_quoted(context, out, &value.schema);
            out.push('.');
        }
        self.write_identifier_quoted(context, out, &value.name);
    }

    /// Column name, prefixed by the alias of the current fragment.
    fn write_column(&self, context: &mut Context, out: &mut String, value: &Field) {
        if let Some(alias) = context.fragment.column_alias() {
            out.push_str(alias);
            out.push('.');
        }
        self.write_identifier_quoted(context, out, &value.name);
    }

    fn write_parameter(&self, context: &mut Context, out: &mut String, value: &Parameter) {
        out.push('@');
        out.push_str(&value.name());
        context.counter += 1;
    }

    /// Table hints, written right after the table name.
    fn write_hints(&self, _context: &mut Context, out: &mut String, hints: Option<&str>) {
        if let Some(hints) = hints {
            out.push(' ');
            out.push_str(hints);
        }
    }

    /// `( [A] = @A AND [B] = @B )`
    fn write_condition(&self, context: &mut Context, out: &mut String, qualifiers: &[Parameter]) {
        out.push_str("( ");
        separated_by(
            out,
            qualifiers,
            |out, v| {
                self.write_column(context, out, &v.field);
                out.push_str(" = ");
                self.write_parameter(context, out, v);
            },
            " AND ",
        );
        out.push_str(" )");
    }

    fn write_where(&self, context: &mut Context, out: &mut String, qualifiers: &[Parameter]) {
        if qualifiers.is_empty() {
            return;
        }
        out.push_str(" WHERE ");
        self.write_condition(context, out, qualifiers);
    }

    fn write_statement(&self, out: &mut String, value: &Statement) {
        let mut context = Context::default();
        self.write_statement_fragment(&mut context, out, value);
    }

    fn write_statement_fragment(&self, context: &mut Context, out: &mut String, value: &Statement) {
        match value {
            Statement::Insert(v) => self.write_insert(context, out, v),
            Statement::Update(v) => self.write_update(context, out, v),
            Statement::Merge(v) => self.write_merge(context, out, v),
            Statement::Delete(v) => self.write_delete(context, out, v),
            Statement::Query(v) => self.write_query(context, out, v),
            Statement::Aggregate(v) => self.write_aggregate(context, out, v),
            Statement::Batch(statements) => separated_by(
                out,
                statements,
                |out, v| self.write_statement_fragment(context, out, v),
                " ",
            ),
        }
    }

    /// Generated values projection placed before the values (`OUTPUT`-like dialects).
    fn write_insert_output(
        &self,
        _context: &mut Context,
        _out: &mut String,
        _returning: Option<&Field>,
    ) {
    }

    /// Generated values projection placed at the end of the statement.
    fn write_returning(&self, context: &mut Context, out: &mut String, returning: Option<&Field>) {
        if let Some(returning) = returning {
            out.push_str(" RETURNING ");
            self.write_column(context, out, returning);
        }
    }

    fn write_columns(&self, context: &mut Context, out: &mut String, columns: &[Field]) {
        separated_by(
            out,
            columns,
            |out, v| self.write_column(context, out, v),
            ", ",
        );
    }

    fn write_values_rows(&self, context: &mut Context, out: &mut String, rows: &[Vec<Parameter>]) {
        separated_by(
            out,
            rows,
            |out, row| {
                out.push_str("( ");
                separated_by(
                    out,
                    row,
                    |out, v| self.write_parameter(context, out, v),
                    ", ",
                );
                out.push_str(" )");
            },
            ", ",
        );
    }

    fn write_insert(&self, context: &mut Context, out: &mut String, value: &InsertStatement) {
        out.reserve(64 + value.rows.len() * value.columns.len() * 24);
        let mut context = context.switch_fragment(Fragment::SqlInsertInto);
        out.push_str("INSERT INTO ");
        self.write_table_ref(&mut context.current, out, &value.table);
        self.write_hints(&mut context.current, out, value.hints.as_deref());
        out.push_str(" ( ");
        self.write_columns(&mut context.current, out, &value.columns);
        out.push_str(" )");
        self.write_insert_output(
            &mut context.current.switch_fragment(Fragment::SqlInsertIntoOutput).current,
            out,
            value.returning.as_ref(),
        );
        let mut values = context.current.switch_fragment(Fragment::SqlInsertIntoValues);
        if value.ordered {
            let order_column = Field::new(ORDER_COLUMN);
            out.push_str(" SELECT ");
            self.write_columns(&mut values.current, out, &value.columns);
            out.push_str(" FROM ( VALUES ");
            self.write_values_rows(&mut values.current, out, &value.rows);
            out.push_str(" ) AS T ( ");
            self.write_columns(&mut values.current, out, &value.columns);
            out.push_str(", ");
            self.write_column(&mut values.current, out, &order_column);
            out.push_str(" ) ORDER BY ");
            self.write_column(&mut values.current, out, &order_column);
        } else {
            out.push_str(" VALUES ");
            self.write_values_rows(&mut values.current, out, &value.rows);
        }
        drop(values);
        self.write_returning(&mut context.current, out, value.returning.as_ref());
        out.push_str(" ;");
    }

    fn write_update(&self, context: &mut Context, out: &mut String, value: &UpdateStatement) {
        let mut context = context.switch_fragment(Fragment::SqlUpdateSet);
        out.push_str("UPDATE ");
        self.write_table_ref(&mut context.current, out, &value.table);
        self.write_hints(&mut context.current, out, value.hints.as_deref());
        out.push_str(" SET ");
        separated_by(
            out,
            &value.set,
            |out, v| {
                self.write_column(&mut context.current, out, &v.field);
                out.push_str(" = ");
                self.write_parameter(&mut context.current, out, v);
            },
            ", ",
        );
        self.write_where(
            &mut context.current.switch_fragment(Fragment::SqlUpdateWhere).current,
            out,
            &value.qualifiers,
        );
        out.push_str(" ;");
    }

    /// Upsert through `INSERT ... ON CONFLICT`.
    fn write_merge(&self, context: &mut Context, out: &mut String, value: &MergeStatement) {
        let mut context = context.switch_fragment(Fragment::SqlInsertInto);
        out.push_str("INSERT INTO ");
        self.write_table_ref(&mut context.current, out, &value.table);
        self.write_hints(&mut context.current, out, value.hints.as_deref());
        out.push_str(" ( ");
        self.write_columns(&mut context.current, out, &value.insert);
        out.push_str(" ) VALUES ( ");
        separated_by(
            out,
            value
                .source
                .iter()
                .filter(|v| value.insert.iter().any(|f| f == &v.field)),
            |out, v| self.write_parameter(&mut context.current, out, v),
            ", ",
        );
        out.push_str(" ) ON CONFLICT ( ");
        self.write_columns(&mut context.current, out, &value.qualifiers);
        out.push_str(" ) ");
        if value.update.is_empty() {
            out.push_str("DO NOTHING");
        } else {
            out.push_str("DO UPDATE SET ");
            separated_by(
                out,
                &value.update,
                |out, v| {
                    self.write_column(&mut context.current, out, v);
                    out.push_str(" = EXCLUDED.");
                    self.write_column(&mut context.current, out, v);
                },
                ", ",
            );
        }
        self.write_returning(&mut context.current, out, value.returning.as_ref());
        out.push_str(" ;");
    }

    fn write_delete(&self, context: &mut Context, out: &mut String, value: &DeleteStatement) {
        let mut context = context.switch_fragment(Fragment::SqlDeleteFrom);
        out.push_str("DELETE FROM ");
        self.write_table_ref(&mut context.current, out, &value.table);
        self.write_hints(&mut context.current, out, value.hints.as_deref());
        self.write_where(
            &mut context
                .current
                .switch_fragment(Fragment::SqlDeleteFromWhere)
                .current,
            out,
            &value.qualifiers,
        );
        out.push_str(" ;");
    }

    /// Row limit placed right after `SELECT`.
    fn write_top(&self, _context: &mut Context, _out: &mut String, _top: Option<u32>) {}

    /// Row limit placed at the end of the query.
    fn write_limit(&self, _context: &mut Context, out: &mut String, top: Option<u32>) {
        if let Some(top) = top {
            let _ = write!(out, " LIMIT {}", top);
        }
    }

    fn write_query(&self, context: &mut Context, out: &mut String, value: &QueryStatement) {
        let mut context = context.switch_fragment(Fragment::SqlSelect);
        out.push_str("SELECT ");
        self.write_top(&mut context.current, out, value.top);
        self.write_columns(&mut context.current, out, &value.fields);
        out.push_str(" FROM ");
        self.write_table_ref(
            &mut context.current.switch_fragment(Fragment::SqlSelectFrom).current,
            out,
            &value.table,
        );
        self.write_hints(&mut context.current, out, value.hints.as_deref());
        self.write_where(
            &mut context.current.switch_fragment(Fragment::SqlSelectWhere).current,
            out,
            &value.qualifiers,
        );
        if !value.order_by.is_empty() {
            out.push_str(" ORDER BY ");
            let mut order_context = context.current.switch_fragment(Fragment::SqlSelectOrderBy);
            separated_by(
                out,
                &value.order_by,
                |out, v| {
                    self.write_column(&mut order_context.current, out, &v.field);
                    out.push_str(match v.order {
                        Order::Asc => " ASC",
                        Order::Desc => " DESC",
                    });
                },
                ", ",
            );
        }
        self.write_limit(&mut context.current, out, value.top);
        out.push_str(" ;");
    }

    fn write_aggregate_function(
        &self,
        _context: &mut Context,
        out: &mut String,
        function: AggregateFunction,
    ) {
        out.push_str(match function {
            AggregateFunction::Count => "COUNT",
            AggregateFunction::Max => "MAX",
            AggregateFunction::Min => "MIN",
            AggregateFunction::Sum => "SUM",
            AggregateFunction::Average => "AVG",
        });
    }

    fn write_aggregate(&self, context: &mut Context, out: &mut String, value: &AggregateStatement) {
        let mut context = context.switch_fragment(Fragment::SqlAggregate);
        out.push_str("SELECT ");
        self.write_aggregate_function(&mut context.current, out, value.function);
        out.push_str(" (");
        match &value.field {
            Some(field) => self.write_column(&mut context.current, out, field),
            None => out.push('*'),
        }
        out.push_str(") AS ");
        self.write_identifier_quoted(&mut context.current, out, value.function.result_name());
        out.push_str(" FROM ");
        self.write_table_ref(
            &mut context.current.switch_fragment(Fragment::SqlSelectFrom).current,
            out,
            &value.table,
        );
        self.write_hints(&mut context.current, out, value.hints.as_deref());
        self.write_where(
            &mut context.current.switch_fragment(Fragment::SqlSelectWhere).current,
            out,
            &value.qualifiers,
        );
        out.push_str(" ;");
    }
}

/// ANSI SQL dialect.
#[derive(Default, Debug, Clone, Copy)]
pub struct GenericSqlWriter {}

impl GenericSqlWriter {
    pub const NAME: &'static str = "generic";
    pub const CAPABILITIES: Capabilities = Capabilities {
        multiple_statements: true,
        hints: false,
        ordered_returning: true,
    };
}

impl SqlWriter for GenericSqlWriter {
    fn as_dyn(&self) -> &dyn SqlWriter {
        self
    }

    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn capabilities(&self) -> Capabilities {
        Self::CAPABILITIES
    }
}
