use crate::{
    AggregateFunction, AggregateStatement, DbField, DbFields, DeleteStatement, Field, Fields,
    InsertStatement, MergeStatement, OrderField, Parameter, QueryStatement, RequestKind, Result,
    Statement, StatementError, TableRef, UpdateStatement, Value,
};

/// What a dialect is able to execute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Capabilities {
    /// More than one row-slot (or statement) in a single command.
    pub multiple_statements: bool,
    /// Table hints such as `WITH (TABLOCK)`.
    pub hints: bool,
    /// Generated values of a multi-row insert are returned in input order.
    pub ordered_returning: bool,
}

/// Inputs of the statement builder.
///
/// `db_fields` is the authoritative column metadata: when present, requested fields are
/// restricted to the existing columns and caller supplied `primary`/`identity` are checked
/// against it.
#[derive(Default, Debug, Clone, Copy)]
pub struct StatementArgs<'a> {
    pub table: &'a str,
    pub fields: &'a [Field],
    pub qualifiers: &'a [Field],
    pub batch_size: usize,
    pub primary: Option<&'a DbField>,
    pub identity: Option<&'a DbField>,
    pub db_fields: Option<&'a DbFields>,
    pub hints: Option<&'a str>,
    pub order_by: &'a [OrderField],
    pub top: Option<u32>,
    pub field: Option<&'a Field>,
}

/// Validates the arguments of an operation and produces its [`Statement`].
///
/// It is dialect agnostic, the only thing it knows about the target database are its
/// [`Capabilities`].
#[derive(Debug, Clone, Copy)]
pub struct StatementBuilder {
    capabilities: Capabilities,
}

struct Keys {
    primary: Option<DbField>,
    identity: Option<DbField>,
}

impl Keys {
    fn is_identity(&self, name: &str) -> bool {
        self.identity.as_ref().is_some_and(|v| v.is(name))
    }
    fn is_primary(&self, name: &str) -> bool {
        self.primary.as_ref().is_some_and(|v| v.is(name))
    }
    /// Primary first, identity otherwise.
    fn key(&self) -> Option<&DbField> {
        self.primary.as_ref().or(self.identity.as_ref())
    }
}

impl StatementBuilder {
    pub fn new(capabilities: Capabilities) -> Self {
        Self { capabilities }
    }

    pub fn capabilities(&self) -> Capabilities {
        self.capabilities
    }

    pub fn build(&self, kind: RequestKind, args: &StatementArgs) -> Result<Statement> {
        match kind {
            RequestKind::Insert => self.build_insert(args),
            RequestKind::InsertAll => self.build_insert_all(args),
            RequestKind::Update => self.build_update(args),
            RequestKind::UpdateAll => self.build_update_all(args),
            RequestKind::Merge => self.build_merge(args),
            RequestKind::MergeAll => self.build_merge_all(args),
            RequestKind::Delete => self.build_delete(args),
            RequestKind::DeleteAll => self.build_delete_all(args),
            RequestKind::Query => self.build_query(args),
            RequestKind::QueryAll => self.build_query_all(args),
            RequestKind::Count => self.build_aggregate(AggregateFunction::Count, args),
            RequestKind::Max => self.build_aggregate(AggregateFunction::Max, args),
            RequestKind::Min => self.build_aggregate(AggregateFunction::Min, args),
            RequestKind::Sum => self.build_aggregate(AggregateFunction::Sum, args),
            RequestKind::Average => self.build_aggregate(AggregateFunction::Average, args),
            RequestKind::CountAll => self.build_aggregate_all(AggregateFunction::Count, args),
            RequestKind::MaxAll => self.build_aggregate_all(AggregateFunction::Max, args),
            RequestKind::MinAll => self.build_aggregate_all(AggregateFunction::Min, args),
            RequestKind::SumAll => self.build_aggregate_all(AggregateFunction::Sum, args),
            RequestKind::AverageAll => self.build_aggregate_all(AggregateFunction::Average, args),
        }
    }

    pub fn build_insert(&self, args: &StatementArgs) -> Result<Statement> {
        self.insert(args, 1, false)
    }

    pub fn build_insert_all(&self, args: &StatementArgs) -> Result<Statement> {
        self.insert(args, args.batch_size.max(1), true)
    }

    pub fn build_update(&self, args: &StatementArgs) -> Result<Statement> {
        self.update(args, 1, false)
    }

    pub fn build_update_all(&self, args: &StatementArgs) -> Result<Statement> {
        self.update(args, args.batch_size.max(1), true)
    }

    pub fn build_merge(&self, args: &StatementArgs) -> Result<Statement> {
        self.merge(args, 1, false)
    }

    pub fn build_merge_all(&self, args: &StatementArgs) -> Result<Statement> {
        self.merge(args, args.batch_size.max(1), true)
    }

    pub fn build_delete(&self, args: &StatementArgs) -> Result<Statement> {
        let table = TableRef::parse(args.table)?;
        let hints = self.hints(args)?;
        let keys = Self::keys(args)?;
        let qualifiers = Self::qualifiers(args, &keys, || {
            StatementError::KeyFieldNotFound(table.full_name())
        })?;
        let fields = Self::target_fields(args);
        Self::check_coverage(args, &fields, &qualifiers)?;
        Ok(Statement::Delete(DeleteStatement {
            table,
            hints,
            qualifiers: Self::parameters(&qualifiers, 0),
        }))
    }

    pub fn build_delete_all(&self, args: &StatementArgs) -> Result<Statement> {
        let table = TableRef::parse(args.table)?;
        let hints = self.hints(args)?;
        Ok(Statement::Delete(DeleteStatement {
            table,
            hints,
            qualifiers: Vec::new(),
        }))
    }

    pub fn build_query(&self, args: &StatementArgs) -> Result<Statement> {
        self.query(args, true)
    }

    pub fn build_query_all(&self, args: &StatementArgs) -> Result<Statement> {
        self.query(args, false)
    }

    pub fn build_aggregate(
        &self,
        function: AggregateFunction,
        args: &StatementArgs,
    ) -> Result<Statement> {
        self.aggregate(function, args, true)
    }

    pub fn build_aggregate_all(
        &self,
        function: AggregateFunction,
        args: &StatementArgs,
    ) -> Result<Statement> {
        self.aggregate(function, args, false)
    }

    fn insert(&self, args: &StatementArgs, slots: usize, all: bool) -> Result<Statement> {
        let table = TableRef::parse(args.table)?;
        let hints = self.hints(args)?;
        let fields = Self::non_empty(Self::target_fields(args))?;
        self.check_batch(slots)?;
        let keys = Self::keys(args)?;
        let columns: Vec<Field> = fields
            .iter()
            .filter(|f| !Self::is_insert_excluded(args, &keys, &f.name))
            .cloned()
            .collect();
        if columns.is_empty() {
            return Err(StatementError::EmptyFields.into());
        }
        let returning = keys.identity.as_ref().map(DbField::as_field).or_else(|| {
            keys.primary
                .as_ref()
                .filter(|v| v.is_database_generated())
                .map(DbField::as_field)
        });
        let ordered = all && returning.is_some() && !self.capabilities.ordered_returning;
        let rows = (0..slots)
            .map(|slot| {
                columns
                    .iter()
                    .map(|c| Parameter::column(c.clone(), slot))
                    .chain(ordered.then(|| Parameter::order_column(slot)))
                    .collect()
            })
            .collect();
        Ok(Statement::Insert(InsertStatement {
            table,
            hints,
            columns,
            rows,
            ordered,
            returning,
        }))
    }

    fn update(&self, args: &StatementArgs, slots: usize, all: bool) -> Result<Statement> {
        let table = TableRef::parse(args.table)?;
        let hints = self.hints(args)?;
        let fields = Self::non_empty(Self::target_fields(args))?;
        self.check_batch(slots)?;
        let keys = Self::keys(args)?;
        let qualifiers =
            Self::qualifiers(args, &keys, || StatementError::ArgumentNull("qualifiers"))?;
        Self::check_coverage(args, &fields, &qualifiers)?;
        let set: Vec<Field> = fields
            .except(&qualifiers)
            .filter(|f| !Self::is_update_excluded(args, &keys, &f.name))
            .cloned()
            .collect();
        if set.is_empty() {
            return Err(StatementError::EmptyFields.into());
        }
        let statements = (0..slots).map(|slot| {
            Statement::Update(UpdateStatement {
                table: table.clone(),
                hints: hints.clone(),
                set: Self::parameters(&set, slot),
                qualifiers: Self::parameters(&qualifiers, slot),
            })
        });
        Ok(Self::wrap(statements, all))
    }

    fn merge(&self, args: &StatementArgs, slots: usize, all: bool) -> Result<Statement> {
        let table = TableRef::parse(args.table)?;
        let hints = self.hints(args)?;
        let fields = Self::non_empty(Self::target_fields(args))?;
        self.check_batch(slots)?;
        let keys = Self::keys(args)?;
        let qualifiers = Self::qualifiers(args, &keys, || {
            StatementError::KeyFieldNotFound(table.full_name())
        })?;
        Self::check_coverage(args, &fields, &qualifiers)?;
        let insert: Vec<Field> = fields
            .iter()
            .filter(|f| !Self::is_insert_excluded(args, &keys, &f.name))
            .cloned()
            .collect();
        if insert.is_empty() {
            return Err(StatementError::EmptyFields.into());
        }
        let update: Vec<Field> = fields
            .except(&qualifiers)
            .filter(|f| !Self::is_update_excluded(args, &keys, &f.name))
            .cloned()
            .collect();
        let returning = keys.identity.as_ref().or(keys.primary.as_ref()).map(DbField::as_field);
        let statements = (0..slots).map(|slot| {
            Statement::Merge(MergeStatement {
                table: table.clone(),
                hints: hints.clone(),
                source: Self::parameters(&fields, slot),
                qualifiers: qualifiers.to_vec(),
                insert: insert.clone(),
                update: update.clone(),
                returning: returning.clone(),
            })
        });
        Ok(Self::wrap(statements, all))
    }

    fn query(&self, args: &StatementArgs, filtered: bool) -> Result<Statement> {
        let table = TableRef::parse(args.table)?;
        let hints = self.hints(args)?;
        let mut fields = Self::target_fields(args);
        if fields.is_empty() {
            fields = args.db_fields.map(DbFields::fields).unwrap_or_default();
        }
        let fields = Self::non_empty(fields)?;
        let qualifiers = self.filter(args, filtered)?;
        Ok(Statement::Query(QueryStatement {
            table,
            hints,
            fields: fields.to_vec(),
            qualifiers: Self::parameters(&qualifiers, 0),
            order_by: args.order_by.to_vec(),
            top: args.top,
        }))
    }

    fn aggregate(
        &self,
        function: AggregateFunction,
        args: &StatementArgs,
        filtered: bool,
    ) -> Result<Statement> {
        let table = TableRef::parse(args.table)?;
        let field = match (function, args.field) {
            (AggregateFunction::Count, field) => field.cloned(),
            (_, Some(field)) if !field.name.trim().is_empty() => Some(field.clone()),
            _ => return Err(StatementError::ArgumentNull("field").into()),
        };
        let hints = self.hints(args)?;
        let qualifiers = self.filter(args, filtered)?;
        Ok(Statement::Aggregate(AggregateStatement {
            table,
            hints,
            function,
            field,
            qualifiers: Self::parameters(&qualifiers, 0),
        }))
    }

    fn hints(&self, args: &StatementArgs) -> Result<Option<String>> {
        let hints = args.hints.map(str::trim).filter(|v| !v.is_empty());
        if hints.is_some() && !self.capabilities.hints {
            return Err(StatementError::NotSupported(
                "The statement builder does not support hints".into(),
            )
            .into());
        }
        Ok(hints.map(ToString::to_string))
    }

    fn check_batch(&self, slots: usize) -> Result<()> {
        if slots > 1 && !self.capabilities.multiple_statements {
            return Err(StatementError::NotSupported(format!(
                "The database does not support multiple statements, a batch size of {} cannot be used",
                slots
            ))
            .into());
        }
        Ok(())
    }

    /// Optional WHERE fields of queries and aggregates, checked against the table columns.
    fn filter(&self, args: &StatementArgs, filtered: bool) -> Result<Fields> {
        if !filtered {
            return Ok(Fields::new());
        }
        let qualifiers: Fields = args.qualifiers.iter().cloned().collect();
        if let Some(db_fields) = args.db_fields {
            Self::check_covered_by(&qualifiers, |name| db_fields.get(name).is_some())?;
        }
        Ok(qualifiers)
    }

    /// Requested fields, restricted to the existing columns when these are known.
    fn target_fields(args: &StatementArgs) -> Fields {
        match args.db_fields {
            Some(db_fields) => args
                .fields
                .iter()
                .filter_map(|f| {
                    let column = db_fields.get(&f.name)?;
                    let mut field = f.clone();
                    if field.value.is_none() {
                        field.value = column.as_field().value;
                    }
                    Some(field)
                })
                .collect(),
            None => args.fields.iter().cloned().collect(),
        }
    }

    fn non_empty(fields: Fields) -> Result<Fields> {
        if fields.is_empty() {
            return Err(StatementError::EmptyFields.into());
        }
        Ok(fields)
    }

    /// Caller supplied keys confirmed by the authoritative metadata, or the keys found in it.
    fn keys(args: &StatementArgs) -> Result<Keys> {
        let authoritative = |field: &DbField| -> Option<DbField> {
            match args.db_fields {
                Some(db_fields) => db_fields.get(&field.name).cloned(),
                None => Some(field.clone()),
            }
        };
        let primary = match args.primary {
            Some(primary) => match authoritative(primary) {
                Some(actual) if actual.is_primary => Some(actual),
                _ => {
                    return Err(StatementError::InvalidOperation(format!(
                        "The field `{}` is not a primary field",
                        primary.name
                    ))
                    .into());
                }
            },
            None => args
                .db_fields
                .map(DbFields::primary)
                .transpose()?
                .flatten()
                .cloned(),
        };
        let identity = match args.identity {
            Some(identity) => match authoritative(identity) {
                Some(actual) if actual.is_identity => Some(actual),
                _ => {
                    return Err(StatementError::InvalidOperation(format!(
                        "The field `{}` is not an identity field",
                        identity.name
                    ))
                    .into());
                }
            },
            None => args.db_fields.and_then(DbFields::identity).cloned(),
        };
        if let Some(identity) = &identity {
            let known = !matches!(identity.value, Value::Null);
            if known && !identity.value.is_integer() {
                return Err(StatementError::InvalidOperation(format!(
                    "The identity field `{}` must have an integer type, found {}",
                    identity.name,
                    identity.value.type_name()
                ))
                .into());
            }
        }
        Ok(Keys { primary, identity })
    }

    /// Explicit qualifiers, the key field otherwise.
    fn qualifiers(
        args: &StatementArgs,
        keys: &Keys,
        missing: impl FnOnce() -> StatementError,
    ) -> Result<Fields> {
        if !args.qualifiers.is_empty() {
            return Ok(args.qualifiers.iter().cloned().collect());
        }
        match keys.key() {
            Some(key) => Ok([key.as_field()].into_iter().collect()),
            None => Err(missing().into()),
        }
    }

    fn check_coverage(args: &StatementArgs, fields: &Fields, qualifiers: &Fields) -> Result<()> {
        if !fields.is_empty() {
            Self::check_covered_by(qualifiers, |name| fields.contains(name))
        } else if let Some(db_fields) = args.db_fields {
            Self::check_covered_by(qualifiers, |name| db_fields.get(name).is_some())
        } else {
            Ok(())
        }
    }

    fn check_covered_by(qualifiers: &Fields, contains: impl Fn(&str) -> bool) -> Result<()> {
        let invalid: Vec<String> = qualifiers
            .names()
            .filter(|name| !contains(name))
            .map(ToString::to_string)
            .collect();
        if !invalid.is_empty() {
            return Err(StatementError::InvalidQualifiers(invalid).into());
        }
        Ok(())
    }

    fn is_generated(args: &StatementArgs, name: &str) -> bool {
        args.db_fields
            .and_then(|v| v.get(name))
            .is_some_and(|v| v.is_generated)
    }

    fn is_insert_excluded(args: &StatementArgs, keys: &Keys, name: &str) -> bool {
        keys.is_identity(name)
            || keys
                .primary
                .as_ref()
                .is_some_and(|v| v.is(name) && v.is_database_generated())
            || Self::is_generated(args, name)
    }

    fn is_update_excluded(args: &StatementArgs, keys: &Keys, name: &str) -> bool {
        keys.is_identity(name) || keys.is_primary(name) || Self::is_generated(args, name)
    }

    fn parameters(fields: &[Field], slot: usize) -> Vec<Parameter> {
        fields
            .iter()
            .map(|f| Parameter::column(f.clone(), slot))
            .collect()
    }

    fn wrap(statements: impl Iterator<Item = Statement>, all: bool) -> Statement {
        let mut statements: Vec<Statement> = statements.collect();
        if !all && statements.len() == 1 {
            if let Some(statement) = statements.pop() {
                return statement;
            }
        }
        Statement::Batch(statements)
    }
}
