use crate::{DbField, DbFields, Entity, Field, Fields, OrderField, Result, TableRef};
use std::{
    borrow::Cow,
    collections::hash_map::DefaultHasher,
    fmt::{self, Display},
    hash::{Hash, Hasher},
    sync::{Arc, OnceLock},
};

/// Operation a [`Request`] describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum RequestKind {
    Insert,
    InsertAll,
    Update,
    UpdateAll,
    Merge,
    MergeAll,
    Delete,
    DeleteAll,
    Query,
    QueryAll,
    Count,
    CountAll,
    Max,
    MaxAll,
    Min,
    MinAll,
    Sum,
    SumAll,
    Average,
    AverageAll,
}

impl RequestKind {
    pub const ALL: [RequestKind; 20] = [
        RequestKind::Insert,
        RequestKind::InsertAll,
        RequestKind::Update,
        RequestKind::UpdateAll,
        RequestKind::Merge,
        RequestKind::MergeAll,
        RequestKind::Delete,
        RequestKind::DeleteAll,
        RequestKind::Query,
        RequestKind::QueryAll,
        RequestKind::Count,
        RequestKind::CountAll,
        RequestKind::Max,
        RequestKind::MaxAll,
        RequestKind::Min,
        RequestKind::MinAll,
        RequestKind::Sum,
        RequestKind::SumAll,
        RequestKind::Average,
        RequestKind::AverageAll,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            RequestKind::Insert => "Insert",
            RequestKind::InsertAll => "InsertAll",
            RequestKind::Update => "Update",
            RequestKind::UpdateAll => "UpdateAll",
            RequestKind::Merge => "Merge",
            RequestKind::MergeAll => "MergeAll",
            RequestKind::Delete => "Delete",
            RequestKind::DeleteAll => "DeleteAll",
            RequestKind::Query => "Query",
            RequestKind::QueryAll => "QueryAll",
            RequestKind::Count => "Count",
            RequestKind::CountAll => "CountAll",
            RequestKind::Max => "Max",
            RequestKind::MaxAll => "MaxAll",
            RequestKind::Min => "Min",
            RequestKind::MinAll => "MinAll",
            RequestKind::Sum => "Sum",
            RequestKind::SumAll => "SumAll",
            RequestKind::Average => "Average",
            RequestKind::AverageAll => "AverageAll",
        }
    }

    /// Position in [`RequestKind::ALL`].
    pub fn index(&self) -> usize {
        *self as usize
    }

    /// Operations whose statement text depends on the batch size.
    pub fn is_batched(&self) -> bool {
        matches!(
            self,
            RequestKind::InsertAll | RequestKind::UpdateAll | RequestKind::MergeAll
        )
    }
}

impl Display for RequestKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Immutable descriptor of one operation shape, also the execution context cache key.
///
/// Two requests that would render the same statement text compare equal and hash equally.
/// The hash is computed on first use and memoized; equality compares hashes first and only
/// falls back to the structural comparison when they match.
#[derive(Debug, Clone)]
pub struct Request {
    kind: RequestKind,
    type_name: Cow<'static, str>,
    table: TableRef,
    fields: Fields,
    qualifiers: Fields,
    field: Option<Field>,
    batch_size: usize,
    hints: Option<String>,
    order_by: Vec<OrderField>,
    top: Option<u32>,
    dialect: &'static str,
    primary: Option<DbField>,
    identity: Option<DbField>,
    /// Authoritative column metadata the statement was validated against.
    db_fields: Option<Arc<DbFields>>,
    /// Members of the bound row shape, in shape order.
    shape: Fields,
    hash: OnceLock<u64>,
}

impl Request {
    /// Request on a table name, a blank name is an `ArgumentNull("table")` error.
    pub fn new(kind: RequestKind, table: &str) -> Result<Self> {
        Ok(Self::with_table(kind, TableRef::parse(table)?))
    }

    pub fn with_table(kind: RequestKind, table: TableRef) -> Self {
        Self {
            kind,
            type_name: Cow::Borrowed(""),
            table,
            fields: Fields::new(),
            qualifiers: Fields::new(),
            field: None,
            batch_size: 1,
            hints: None,
            order_by: Vec::new(),
            top: None,
            dialect: "",
            primary: None,
            identity: None,
            db_fields: None,
            shape: Fields::new(),
            hash: OnceLock::new(),
        }
    }

    /// Request on the table of an entity, its declared columns become the fields.
    pub fn from_type<E: Entity>(kind: RequestKind) -> Self {
        Self::with_table(kind, E::table_ref().clone())
            .type_name(std::any::type_name::<E>())
            .fields(E::db_fields().fields())
    }

    pub fn type_name(mut self, type_name: impl Into<Cow<'static, str>>) -> Self {
        self.type_name = type_name.into();
        self.reset()
    }
    pub fn fields(mut self, fields: impl Into<Fields>) -> Self {
        self.fields = fields.into();
        self.reset()
    }
    pub fn qualifiers(mut self, qualifiers: impl Into<Fields>) -> Self {
        self.qualifiers = qualifiers.into();
        self.reset()
    }
    pub fn field(mut self, field: Option<Field>) -> Self {
        self.field = field;
        self.reset()
    }
    pub fn batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size;
        self.reset()
    }
    pub fn hints(mut self, hints: Option<String>) -> Self {
        self.hints = hints.filter(|v| !v.trim().is_empty());
        self.reset()
    }
    pub fn order_by(mut self, order_by: Vec<OrderField>) -> Self {
        self.order_by = order_by;
        self.reset()
    }
    pub fn top(mut self, top: Option<u32>) -> Self {
        self.top = top;
        self.reset()
    }
    pub fn dialect(mut self, dialect: &'static str) -> Self {
        self.dialect = dialect;
        self.reset()
    }
    pub fn primary(mut self, primary: Option<DbField>) -> Self {
        self.primary = primary;
        self.reset()
    }
    pub fn identity(mut self, identity: Option<DbField>) -> Self {
        self.identity = identity;
        self.reset()
    }
    pub fn db_fields(mut self, db_fields: Option<Arc<DbFields>>) -> Self {
        self.db_fields = db_fields;
        self.reset()
    }
    pub fn shape(mut self, shape: impl Into<Fields>) -> Self {
        self.shape = shape.into();
        self.reset()
    }
    fn reset(mut self) -> Self {
        self.hash = OnceLock::new();
        self
    }

    pub fn kind(&self) -> RequestKind {
        self.kind
    }
    pub fn get_type_name(&self) -> &str {
        &self.type_name
    }
    pub fn table(&self) -> &TableRef {
        &self.table
    }
    pub fn get_fields(&self) -> &Fields {
        &self.fields
    }
    pub fn get_qualifiers(&self) -> &Fields {
        &self.qualifiers
    }
    pub fn get_field(&self) -> Option<&Field> {
        self.field.as_ref()
    }
    pub fn get_batch_size(&self) -> usize {
        self.batch_size
    }
    pub fn get_hints(&self) -> Option<&str> {
        self.hints.as_deref()
    }
    pub fn get_order_by(&self) -> &[OrderField] {
        &self.order_by
    }
    pub fn get_top(&self) -> Option<u32> {
        self.top
    }
    pub fn get_dialect(&self) -> &'static str {
        self.dialect
    }
    pub fn get_primary(&self) -> Option<&DbField> {
        self.primary.as_ref()
    }
    pub fn get_identity(&self) -> Option<&DbField> {
        self.identity.as_ref()
    }
    pub fn get_db_fields(&self) -> Option<&DbFields> {
        self.db_fields.as_deref()
    }
    pub fn get_shape(&self) -> &Fields {
        &self.shape
    }

    /// Combined hash of every member that affects the statement text.
    pub fn hash_code(&self) -> u64 {
        *self.hash.get_or_init(|| {
            let mut hasher = DefaultHasher::new();
            self.kind.hash(&mut hasher);
            self.type_name.hash(&mut hasher);
            self.table.hash(&mut hasher);
            self.fields.hash(&mut hasher);
            self.qualifiers.hash(&mut hasher);
            self.field.hash(&mut hasher);
            self.batch_size.hash(&mut hasher);
            self.hints.hash(&mut hasher);
            self.order_by.hash(&mut hasher);
            self.top.hash(&mut hasher);
            self.dialect.hash(&mut hasher);
            self.primary.hash(&mut hasher);
            self.identity.hash(&mut hasher);
            self.db_fields.hash(&mut hasher);
            self.shape.hash(&mut hasher);
            hasher.finish()
        })
    }

    /// Member by member comparison, ignoring the memoized hash.
    pub fn strict_equals(&self, other: &Self) -> bool {
        self.kind == other.kind
            && self.type_name == other.type_name
            && self.table == other.table
            && self.fields == other.fields
            && self.qualifiers == other.qualifiers
            && self.field == other.field
            && self.batch_size == other.batch_size
            && self.hints == other.hints
            && self.order_by == other.order_by
            && self.top == other.top
            && self.dialect == other.dialect
            && self.primary == other.primary
            && self.identity == other.identity
            && self.db_fields == other.db_fields
            && self.shape == other.shape
    }

    /// Stable textual key, used in logs.
    pub fn cache_key(&self) -> String {
        format!("{}:{:016x}", self.kind, self.hash_code())
    }
}

impl PartialEq for Request {
    fn eq(&self, other: &Self) -> bool {
        self.hash_code() == other.hash_code() && self.strict_equals(other)
    }
}

impl Eq for Request {}

impl Hash for Request {
    fn hash<H: Hasher>(&self, state: &mut H) {
        state.write_u64(self.hash_code());
    }
}

impl Display for Request {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} on {}", self.cache_key(), self.table)
    }
}
