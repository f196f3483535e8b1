use crate::{
    Field, Fields, Parameter, ParameterKind, ParameterValue, Result, RowLike, SqlWriter,
    Statement, StatementError, Value,
};
use std::sync::Arc;

/// One placeholder of the first row-slot and where its value comes from.
#[derive(Debug, Clone)]
struct Binding {
    parameter: Parameter,
    /// Position of the field in the row shape, `None` for the order column.
    index: Option<usize>,
}

/// Maps the members of a row to the parameters of one row-slot.
///
/// The field positions are resolved once when the context is compiled, binding a row is a
/// positional lookup. Parameter names of the other slots are derived with the same suffix
/// rule the statement was rendered with.
#[derive(Debug, Clone, Default)]
pub struct ParameterBinder {
    bindings: Vec<Binding>,
}

impl ParameterBinder {
    pub fn compile(parameters: &[Parameter], shape: &Fields) -> Result<Self> {
        let mut bindings: Vec<Binding> = Vec::new();
        for parameter in parameters.iter().filter(|v| v.slot == 0) {
            if bindings.iter().any(|v| &v.parameter == parameter) {
                continue;
            }
            let index = match parameter.kind {
                ParameterKind::Column => Some(shape.position(&parameter.field.name).ok_or_else(
                    || {
                        StatementError::InvalidOperation(format!(
                            "The field `{}` is not a member of the row",
                            parameter.field
                        ))
                    },
                )?),
                ParameterKind::OrderColumn => None,
            };
            bindings.push(Binding {
                parameter: parameter.clone(),
                index,
            });
        }
        Ok(Self { bindings })
    }

    /// Number of parameters bound per row.
    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }

    /// Append the parameters of `row` in the row-slot `slot`.
    ///
    /// Members missing from the row are bound to `NULL`.
    pub fn bind(&self, row: &impl RowLike, slot: usize, out: &mut Vec<ParameterValue>) {
        for binding in &self.bindings {
            let parameter = binding.parameter.at_slot(slot);
            let value = match (parameter.kind, binding.index) {
                (ParameterKind::OrderColumn, ..) => Value::Int32(Some(slot as i32)),
                (ParameterKind::Column, Some(index)) => row
                    .value_at(index, &parameter.field.name)
                    .unwrap_or_default(),
                (ParameterKind::Column, None) => Value::Null,
            };
            out.push(ParameterValue::new(parameter.name(), value));
        }
    }
}

/// Compiled artifact of one operation shape: the SQL text and how rows are bound to it.
#[derive(Debug)]
pub struct ExecutionContext {
    pub sql: Arc<str>,
    /// Every placeholder of the text, all row-slots included.
    pub parameters: Vec<Parameter>,
    /// Row-slots of the statement.
    pub batch_size: usize,
    /// Column whose generated value every inserted row returns.
    pub returning: Option<Field>,
    pub binder: ParameterBinder,
}

impl ExecutionContext {
    /// Render the statement and resolve its parameters against the row shape.
    pub fn compile(statement: &Statement, writer: &dyn SqlWriter, shape: &Fields) -> Result<Self> {
        let mut sql = String::with_capacity(128);
        writer.write_statement(&mut sql, statement);
        let parameters = statement.parameters();
        let binder = ParameterBinder::compile(&parameters, shape)?;
        Ok(Self {
            sql: sql.into(),
            parameters,
            batch_size: statement.slots(),
            returning: statement.returning().cloned(),
            binder,
        })
    }

    /// Parameters of `rows`, the i-th row bound to the i-th slot.
    pub fn bind<R: RowLike>(&self, rows: &[R]) -> Vec<ParameterValue> {
        let mut result = Vec::with_capacity(rows.len() * self.binder.len());
        for (slot, row) in rows.iter().enumerate() {
            self.binder.bind(row, slot, &mut result);
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{RowLabeled, SqlServerSqlWriter, StatementArgs, StatementBuilder, DbField};

    #[test]
    fn binds_rows_with_slot_suffixes() {
        let writer = SqlServerSqlWriter::default();
        let fields: Fields = ["Id", "Name", "Age"].into();
        let identity = DbField::new("Id").identity();
        let statement = StatementBuilder::new(writer.capabilities())
            .build_insert_all(&StatementArgs {
                table: "People",
                fields: &fields,
                batch_size: 2,
                identity: Some(&identity),
                ..Default::default()
            })
            .unwrap();
        let shape: Fields = ["Id", "Age", "Name"].into();
        let context = ExecutionContext::compile(&statement, &writer, &shape).unwrap();
        assert_eq!(context.batch_size, 2);
        assert_eq!(context.returning.as_ref().map(Field::name), Some("Id"));
        let rows = [
            RowLabeled::from([
                ("Id", Value::Null),
                ("Age", Value::Int32(Some(30))),
                ("Name", "Ann".into()),
            ]),
            RowLabeled::from([
                ("Id", Value::Null),
                ("Age", Value::Int32(Some(41))),
                ("Name", "Bob".into()),
            ]),
        ];
        let bound = context.bind(&rows);
        let names: Vec<&str> = bound.iter().map(|v| v.name.as_str()).collect();
        assert_eq!(
            names,
            [
                "Name",
                "Age",
                "__RepoDb_OrderColumn_0",
                "Name_1",
                "Age_1",
                "__RepoDb_OrderColumn_1"
            ]
        );
        assert_eq!(bound[3].value, Value::Varchar(Some("Bob".into())));
        assert_eq!(bound[4].value, Value::Int32(Some(41)));
        assert_eq!(bound[5].value, Value::Int32(Some(1)));
        for name in names {
            assert!(context.sql.contains(&format!("@{name}")), "{name}");
        }
    }

    #[test]
    fn fields_outside_the_shape_are_rejected() {
        let writer = SqlServerSqlWriter::default();
        let statement = writer
            .builder()
            .build_update(&StatementArgs {
                table: "T",
                fields: &Fields::from(["A", "B"]),
                qualifiers: &Fields::from(["A"]),
                ..Default::default()
            })
            .unwrap();
        let error = ExecutionContext::compile(&statement, &writer, &Fields::from(["A"]))
            .unwrap_err();
        assert!(matches!(
            error.downcast_ref::<StatementError>(),
            Some(StatementError::InvalidOperation(..))
        ));
    }
}
