use crate::{
    BlockingSession, Command, Configuration, DbField, DbFields, Entity, ExecutionContext,
    ExecutionContextCache, Executor, Field, Fields, Inserted, OrderField, Request, RequestKind,
    Result, RowLabeled, RowLike, RowShape, RowsAffected, SqlWriter, StatementArgs,
    StatementError, TableRef, Value, batch, driver::Driver, stream::TryStreamExt,
};
use anyhow::Context;
use std::{slice, sync::Arc, time::Duration};

/// Per call overrides, every member falls back to what the rows or the session provide.
#[derive(Default, Clone, Copy)]
pub struct Options<'a> {
    pub table: Option<&'a str>,
    pub fields: Option<&'a [Field]>,
    pub qualifiers: Option<&'a [Field]>,
    pub batch_size: Option<usize>,
    pub hints: Option<&'a str>,
    /// Statement writer used instead of the driver's one.
    pub writer: Option<&'a dyn SqlWriter>,
    /// Authoritative column metadata, skips schema introspection.
    pub db_fields: Option<&'a DbFields>,
    pub timeout: Option<Duration>,
    pub order_by: &'a [OrderField],
    pub top: Option<u32>,
}

impl<'a> Options<'a> {
    pub fn table(table: &'a str) -> Self {
        Self {
            table: Some(table),
            ..Default::default()
        }
    }
}

/// Everything a call resolves once, before binding any row.
struct Plan {
    kind: RequestKind,
    type_name: &'static str,
    table: TableRef,
    fields: Fields,
    qualifiers: Fields,
    field: Option<Field>,
    primary: Option<DbField>,
    identity: Option<DbField>,
    db_fields: Option<Arc<DbFields>>,
    shape: Fields,
}

impl Plan {
    fn request(&self, options: &Options, writer: &dyn SqlWriter, batch_size: usize) -> Request {
        Request::with_table(self.kind, self.table.clone())
            .type_name(self.type_name)
            .fields(self.fields.clone())
            .qualifiers(self.qualifiers.clone())
            .field(self.field.clone())
            .batch_size(batch_size)
            .hints(options.hints.map(ToString::to_string))
            .order_by(options.order_by.to_vec())
            .top(options.top)
            .dialect(writer.name())
            .primary(self.primary.clone())
            .identity(self.identity.clone())
            .db_fields(self.db_fields.clone())
            .shape(self.shape.clone())
    }

    fn build(
        &self,
        request: &Request,
        options: &Options,
        writer: &dyn SqlWriter,
    ) -> Result<ExecutionContext> {
        let table = self.table.qualified_name();
        let args = StatementArgs {
            table: &table,
            fields: &self.fields,
            qualifiers: &self.qualifiers,
            batch_size: request.get_batch_size(),
            primary: request.get_primary(),
            identity: request.get_identity(),
            db_fields: request.get_db_fields(),
            hints: options.hints,
            order_by: options.order_by,
            top: options.top,
            field: self.field.as_ref(),
        };
        let statement = writer.builder().build(self.kind, &args)?;
        ExecutionContext::compile(&statement, writer, request.get_shape())
    }
}

/// Entry point of every operation: an executor, the context caches and the defaults.
///
/// All the rows of one call are expected to share the shape of the first one, it is resolved
/// once and reused for every row of every batch.
pub struct Session<'c, E: Executor> {
    executor: &'c mut E,
    caches: &'c ExecutionContextCache,
    configuration: Configuration,
}

impl<'c, E: Executor> Session<'c, E> {
    pub fn new(executor: &'c mut E, caches: &'c ExecutionContextCache) -> Self {
        Self {
            executor,
            caches,
            configuration: Configuration::default(),
        }
    }

    pub fn with_configuration(mut self, configuration: Configuration) -> Self {
        self.configuration = configuration;
        self
    }

    pub fn configuration(&self) -> &Configuration {
        &self.configuration
    }

    pub fn executor(&mut self) -> &mut E {
        self.executor
    }

    pub fn caches(&self) -> &ExecutionContextCache {
        self.caches
    }

    /// The synchronous version of this session.
    pub fn blocking(&mut self) -> BlockingSession<'_, 'c, E> {
        BlockingSession::new(self)
    }

    /// Insert one row, returns the generated value when the table has one.
    pub async fn insert<R: RowLike>(&mut self, row: &R, options: &Options<'_>) -> Result<Option<Value>> {
        let result = self
            .write(RequestKind::Insert, slice::from_ref(row), options)
            .await?;
        Ok(result.generated.into_iter().next())
    }

    /// Insert the rows in batches, generated values are returned in input order.
    pub async fn insert_all<R: RowLike>(&mut self, rows: &[R], options: &Options<'_>) -> Result<Inserted> {
        self.write(RequestKind::InsertAll, rows, options).await
    }

    pub async fn update<R: RowLike>(&mut self, row: &R, options: &Options<'_>) -> Result<RowsAffected> {
        let result = self
            .write(RequestKind::Update, slice::from_ref(row), options)
            .await?;
        Ok(RowsAffected::new(result.rows_affected))
    }

    pub async fn update_all<R: RowLike>(&mut self, rows: &[R], options: &Options<'_>) -> Result<RowsAffected> {
        let result = self.write(RequestKind::UpdateAll, rows, options).await?;
        Ok(RowsAffected::new(result.rows_affected))
    }

    /// Insert or update one row, returns its key when the dialect reports it.
    pub async fn merge<R: RowLike>(&mut self, row: &R, options: &Options<'_>) -> Result<Option<Value>> {
        let result = self
            .write(RequestKind::Merge, slice::from_ref(row), options)
            .await?;
        Ok(result.generated.into_iter().next())
    }

    pub async fn merge_all<R: RowLike>(&mut self, rows: &[R], options: &Options<'_>) -> Result<Inserted> {
        self.write(RequestKind::MergeAll, rows, options).await
    }

    /// Delete the rows matching the qualifiers (the key by default) of `row`.
    pub async fn delete<R: RowLike>(&mut self, row: &R, options: &Options<'_>) -> Result<RowsAffected> {
        let result = self
            .write(RequestKind::Delete, slice::from_ref(row), options)
            .await?;
        Ok(RowsAffected::new(result.rows_affected))
    }

    /// Delete every row of `options.table`.
    pub async fn delete_all(&mut self, options: &Options<'_>) -> Result<RowsAffected> {
        let plan = self
            .plan(RequestKind::DeleteAll, None, None, options)
            .await?;
        let context = self.context(&plan, options, 1)?;
        self.executor
            .execute(Command {
                sql: context.sql.clone(),
                parameters: Vec::new(),
                timeout: self.timeout(options),
            })
            .await
    }

    /// Rows matching the members of `filter` (or `options.qualifiers`).
    pub async fn query<R: RowLike>(&mut self, filter: &R, options: &Options<'_>) -> Result<Vec<RowLabeled>> {
        let shape = filter.row_shape();
        let plan = self
            .plan(RequestKind::Query, Some(&shape), None, options)
            .await?;
        self.fetch(&plan, filter, options).await
    }

    /// Every row of `options.table`.
    pub async fn query_all(&mut self, options: &Options<'_>) -> Result<Vec<RowLabeled>> {
        let plan = self.plan(RequestKind::QueryAll, None, None, options).await?;
        self.fetch(&plan, &RowLabeled::default(), options).await
    }

    pub async fn query_entities<T: Entity, R: RowLike>(
        &mut self,
        filter: &R,
        options: &Options<'_>,
    ) -> Result<Vec<T>> {
        let table = T::table_ref().full_name();
        let fields = T::db_fields().fields();
        let options = Self::entity_options(options, &table, &fields);
        self.query(filter, &options)
            .await?
            .into_iter()
            .map(T::from_row)
            .collect()
    }

    pub async fn query_all_entities<T: Entity>(&mut self, options: &Options<'_>) -> Result<Vec<T>> {
        let table = T::table_ref().full_name();
        let fields = T::db_fields().fields();
        let options = Self::entity_options(options, &table, &fields);
        self.query_all(&options)
            .await?
            .into_iter()
            .map(T::from_row)
            .collect()
    }

    pub async fn count<R: RowLike>(&mut self, filter: &R, options: &Options<'_>) -> Result<Value> {
        self.aggregate(RequestKind::Count, None, Some(filter), options)
            .await
    }

    pub async fn count_all(&mut self, options: &Options<'_>) -> Result<Value> {
        self.aggregate(RequestKind::CountAll, None, None::<&RowLabeled>, options)
            .await
    }

    pub async fn max<R: RowLike>(
        &mut self,
        field: impl Into<Field>,
        filter: &R,
        options: &Options<'_>,
    ) -> Result<Value> {
        self.aggregate(RequestKind::Max, Some(field.into()), Some(filter), options)
            .await
    }

    pub async fn max_all(&mut self, field: impl Into<Field>, options: &Options<'_>) -> Result<Value> {
        self.aggregate(RequestKind::MaxAll, Some(field.into()), None::<&RowLabeled>, options)
            .await
    }

    pub async fn min<R: RowLike>(
        &mut self,
        field: impl Into<Field>,
        filter: &R,
        options: &Options<'_>,
    ) -> Result<Value> {
        self.aggregate(RequestKind::Min, Some(field.into()), Some(filter), options)
            .await
    }

    pub async fn min_all(&mut self, field: impl Into<Field>, options: &Options<'_>) -> Result<Value> {
        self.aggregate(RequestKind::MinAll, Some(field.into()), None::<&RowLabeled>, options)
            .await
    }

    pub async fn sum<R: RowLike>(
        &mut self,
        field: impl Into<Field>,
        filter: &R,
        options: &Options<'_>,
    ) -> Result<Value> {
        self.aggregate(RequestKind::Sum, Some(field.into()), Some(filter), options)
            .await
    }

    pub async fn sum_all(&mut self, field: impl Into<Field>, options: &Options<'_>) -> Result<Value> {
        self.aggregate(RequestKind::SumAll, Some(field.into()), None::<&RowLabeled>, options)
            .await
    }

    pub async fn average<R: RowLike>(
        &mut self,
        field: impl Into<Field>,
        filter: &R,
        options: &Options<'_>,
    ) -> Result<Value> {
        self.aggregate(RequestKind::Average, Some(field.into()), Some(filter), options)
            .await
    }

    pub async fn average_all(&mut self, field: impl Into<Field>, options: &Options<'_>) -> Result<Value> {
        self.aggregate(
            RequestKind::AverageAll,
            Some(field.into()),
            None::<&RowLabeled>,
            options,
        )
        .await
    }

    async fn write<R: RowLike>(
        &mut self,
        kind: RequestKind,
        rows: &[R],
        options: &Options<'_>,
    ) -> Result<Inserted> {
        let Some(first) = rows.first() else {
            return Ok(Inserted::default());
        };
        let shape = first.row_shape();
        let plan = self.plan(kind, Some(&shape), None, options).await?;
        let batch_size = if kind.is_batched() {
            options
                .batch_size
                .unwrap_or(self.configuration.batch_size)
                .max(1)
        } else {
            1
        };
        let timeout = self.timeout(options);
        let default_writer = self.executor.driver().sql_writer();
        let writer = options.writer.unwrap_or(&default_writer);
        let caches = self.caches;
        batch::execute_batches(self.executor, rows, batch_size, timeout, |size| {
            let request = plan.request(options, writer, size);
            caches.get_or_build(request, |request| plan.build(request, options, writer))
        })
        .await
    }

    async fn fetch<R: RowLike>(
        &mut self,
        plan: &Plan,
        filter: &R,
        options: &Options<'_>,
    ) -> Result<Vec<RowLabeled>> {
        let context = self.context(plan, options, 1)?;
        let command = Command {
            sql: context.sql.clone(),
            parameters: context.bind(slice::from_ref(filter)),
            timeout: self.timeout(options),
        };
        log::trace!("Query: {}", command);
        self.executor.fetch(command).try_collect().await
    }

    async fn aggregate<R: RowLike>(
        &mut self,
        kind: RequestKind,
        field: Option<Field>,
        filter: Option<&R>,
        options: &Options<'_>,
    ) -> Result<Value> {
        let shape = filter.map(RowLike::row_shape);
        let plan = self.plan(kind, shape.as_ref(), field, options).await?;
        let rows = match filter {
            Some(filter) => self.fetch(&plan, filter, options).await?,
            None => self.fetch(&plan, &RowLabeled::default(), options).await?,
        };
        Ok(rows
            .into_iter()
            .next()
            .and_then(|v| v.values.into_vec().into_iter().next())
            .unwrap_or_default())
    }

    fn context(
        &self,
        plan: &Plan,
        options: &Options<'_>,
        batch_size: usize,
    ) -> Result<Arc<ExecutionContext>> {
        let default_writer = self.executor.driver().sql_writer();
        let writer = options.writer.unwrap_or(&default_writer);
        let request = plan.request(options, writer, batch_size);
        self.caches
            .get_or_build(request, |request| plan.build(request, options, writer))
    }

    fn timeout(&self, options: &Options<'_>) -> Option<Duration> {
        options.timeout.or(self.configuration.command_timeout)
    }

    /// Entity queries select the declared columns of the entity table.
    fn entity_options<'a>(options: &Options<'a>, table: &'a str, fields: &'a [Field]) -> Options<'a> {
        Options {
            table: options.table.or(Some(table)),
            fields: options.fields.or(Some(fields)),
            ..*options
        }
    }

    /// Resolve table, fields, qualifiers and column metadata of a call.
    async fn plan(
        &mut self,
        kind: RequestKind,
        shape: Option<&RowShape>,
        field: Option<Field>,
        options: &Options<'_>,
    ) -> Result<Plan> {
        let table = match (options.table, shape.and_then(RowShape::table)) {
            (Some(table), _) => TableRef::parse(table)?,
            (None, Some(table)) => table.clone(),
            (None, None) => return Err(StatementError::ArgumentNull("table").into()),
        };
        let db_fields = self.db_fields(&table, shape, options).await?;
        let declared = shape.and_then(RowShape::declared);
        let shape_fields = shape.map(RowShape::fields).unwrap_or_default();
        let is_write = matches!(
            kind,
            RequestKind::Insert
                | RequestKind::InsertAll
                | RequestKind::Update
                | RequestKind::UpdateAll
                | RequestKind::Merge
                | RequestKind::MergeAll
        );
        let fields: Fields = match options.fields {
            Some(fields) => fields.iter().cloned().collect(),
            None if is_write => shape_fields.clone(),
            None => Fields::new(),
        };
        let qualifiers: Fields = match options.qualifiers {
            Some(qualifiers) => qualifiers.iter().cloned().collect(),
            None => match (kind, shape) {
                (
                    RequestKind::Query
                    | RequestKind::Count
                    | RequestKind::Max
                    | RequestKind::Min
                    | RequestKind::Sum
                    | RequestKind::Average,
                    Some(shape),
                ) => Self::filter_fields(shape)?,
                _ => Fields::new(),
            },
        };
        let primary = declared
            .map(DbFields::primary)
            .transpose()?
            .flatten()
            .cloned();
        let identity = declared.and_then(DbFields::identity).cloned();
        Ok(Plan {
            kind,
            type_name: shape.map(RowShape::type_name).unwrap_or_default(),
            table,
            fields,
            qualifiers,
            field,
            primary,
            identity,
            db_fields,
            shape: shape_fields,
        })
    }

    /// Members of a filter row used as WHERE fields, the key of an entity.
    fn filter_fields(shape: &RowShape) -> Result<Fields> {
        if let Some(declared) = shape.declared() {
            let key = declared.primary()?.or_else(|| declared.identity());
            if let Some(key) = key {
                return Ok([key.as_field()].into_iter().collect());
            }
        }
        Ok(shape.fields())
    }

    /// Options first, then the cached schema introspection, then the entity declaration.
    async fn db_fields(
        &mut self,
        table: &TableRef,
        shape: Option<&RowShape>,
        options: &Options<'_>,
    ) -> Result<Option<Arc<DbFields>>> {
        if let Some(db_fields) = options.db_fields {
            return Ok(Some(Arc::new(db_fields.clone())));
        }
        let key = format!(
            "{}:{}",
            <E::Driver as Driver>::NAME,
            table.full_name().to_lowercase()
        );
        let introspected = match self.caches.db_fields().get(&key) {
            Some(cached) => cached,
            None => {
                let db_fields = self
                    .executor
                    .db_fields(table)
                    .await
                    .with_context(|| format!("While reading the columns of `{}`", table))?;
                log::debug!(
                    "Columns of `{}`: {}",
                    table,
                    db_fields
                        .as_ref()
                        .map(|v| v.fields().names().collect::<Vec<_>>().join(", "))
                        .unwrap_or_else(|| "not available".into())
                );
                self.caches.db_fields().add(key, db_fields)
            }
        };
        Ok(introspected.or_else(|| {
            shape
                .and_then(RowShape::declared)
                .map(|v| Arc::new(v.clone()))
        }))
    }
}
