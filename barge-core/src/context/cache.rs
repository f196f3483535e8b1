use crate::{DbFields, ExecutionContext, Request, RequestKind, Result};
use dashmap::DashMap;
use std::sync::Arc;

/// Concurrent map from request to compiled context, for one operation kind.
///
/// A miss is a normal outcome: the caller builds the context and adds it. When two callers
/// race on the same request the first one to add wins and both end up using its context.
#[derive(Debug)]
pub struct ContextCache {
    kind: RequestKind,
    contexts: DashMap<Request, Arc<ExecutionContext>>,
}

impl ContextCache {
    pub fn new(kind: RequestKind) -> Self {
        Self {
            kind,
            contexts: DashMap::new(),
        }
    }

    pub fn kind(&self) -> RequestKind {
        self.kind
    }

    pub fn get(&self, request: &Request) -> Option<Arc<ExecutionContext>> {
        self.contexts.get(request).map(|v| v.value().clone())
    }

    /// Insert unless present, returns the context that ended up in the cache.
    pub fn add(&self, request: Request, context: Arc<ExecutionContext>) -> Arc<ExecutionContext> {
        self.contexts.entry(request).or_insert(context).value().clone()
    }

    pub fn flush(&self) {
        self.contexts.clear();
    }

    pub fn len(&self) -> usize {
        self.contexts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.contexts.is_empty()
    }
}

/// Introspected column metadata, per driver and table.
#[derive(Debug, Default)]
pub struct DbFieldCache {
    tables: DashMap<String, Option<Arc<DbFields>>>,
}

impl DbFieldCache {
    /// `Some(None)` when the table was already looked up without result.
    pub fn get(&self, key: &str) -> Option<Option<Arc<DbFields>>> {
        self.tables.get(key).map(|v| v.value().clone())
    }

    pub fn add(&self, key: String, db_fields: Option<DbFields>) -> Option<Arc<DbFields>> {
        self.tables
            .entry(key)
            .or_insert(db_fields.map(Arc::new))
            .value()
            .clone()
    }

    pub fn flush(&self) {
        self.tables.clear();
    }

    pub fn len(&self) -> usize {
        self.tables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }
}

/// The execution context caches of every operation kind plus the column metadata cache.
///
/// It is created explicitly and shared by reference, independent instances never see each
/// other's entries.
#[derive(Debug)]
pub struct ExecutionContextCache {
    caches: [ContextCache; RequestKind::ALL.len()],
    db_fields: DbFieldCache,
}

impl Default for ExecutionContextCache {
    fn default() -> Self {
        Self::new()
    }
}

impl ExecutionContextCache {
    pub fn new() -> Self {
        Self {
            caches: RequestKind::ALL.map(ContextCache::new),
            db_fields: DbFieldCache::default(),
        }
    }

    pub fn for_kind(&self, kind: RequestKind) -> &ContextCache {
        &self.caches[kind.index()]
    }

    pub fn db_fields(&self) -> &DbFieldCache {
        &self.db_fields
    }

    /// Cached context of the request, built and published on a miss.
    ///
    /// `build` runs outside of any lock, a concurrent caller may build the same context, only
    /// one of them is kept.
    pub fn get_or_build(
        &self,
        request: Request,
        build: impl FnOnce(&Request) -> Result<ExecutionContext>,
    ) -> Result<Arc<ExecutionContext>> {
        let cache = self.for_kind(request.kind());
        if let Some(context) = cache.get(&request) {
            return Ok(context);
        }
        log::debug!("Execution context cache miss: {}", request);
        let context = Arc::new(build(&request)?);
        log::debug!(
            "Built the execution context {}: {}",
            request.cache_key(),
            crate::truncate_long!(context.sql)
        );
        Ok(cache.add(request, context))
    }

    /// Total number of cached contexts.
    pub fn len(&self) -> usize {
        self.caches.iter().map(ContextCache::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.caches.iter().all(ContextCache::is_empty)
    }

    pub fn flush(&self) {
        for cache in &self.caches {
            cache.flush();
        }
        self.db_fields.flush();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{GenericSqlWriter, SqlWriter, StatementArgs};
    use std::{
        sync::atomic::{AtomicUsize, Ordering},
        thread,
    };

    fn request(batch_size: usize) -> Request {
        Request::new(RequestKind::InsertAll, "Table")
            .unwrap()
            .fields(["A", "B"])
            .batch_size(batch_size)
            .dialect(GenericSqlWriter::NAME)
    }

    fn build(request: &Request) -> Result<ExecutionContext> {
        let writer = GenericSqlWriter::default();
        let statement = writer.builder().build(
            request.kind(),
            &StatementArgs {
                table: "Table",
                fields: request.get_fields(),
                batch_size: request.get_batch_size(),
                ..Default::default()
            },
        )?;
        ExecutionContext::compile(&statement, &writer, request.get_fields())
    }

    #[test]
    fn second_lookup_returns_the_same_context() {
        let cache = ExecutionContextCache::new();
        let first = cache.get_or_build(request(2), build).unwrap();
        let second = cache
            .get_or_build(request(2), |_| panic!("Expected a cache hit"))
            .unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(cache.for_kind(RequestKind::InsertAll).len(), 1);
        assert!(cache.for_kind(RequestKind::Insert).is_empty());

        let other = cache.get_or_build(request(3), build).unwrap();
        assert!(!Arc::ptr_eq(&first, &other));
        assert_eq!(cache.len(), 2);

        cache.flush();
        assert!(cache.is_empty());
        assert!(cache.for_kind(RequestKind::InsertAll).get(&request(2)).is_none());
    }

    #[test]
    fn first_writer_wins() {
        let cache = ContextCache::new(RequestKind::InsertAll);
        let a = Arc::new(build(&request(1)).unwrap());
        let b = Arc::new(build(&request(1)).unwrap());
        let winner = cache.add(request(1), a.clone());
        assert!(Arc::ptr_eq(&winner, &a));
        let loser = cache.add(request(1), b);
        assert!(Arc::ptr_eq(&loser, &a));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn concurrent_builders_share_one_context() {
        let cache = ExecutionContextCache::new();
        let builds = AtomicUsize::new(0);
        let contexts: Vec<Arc<ExecutionContext>> = thread::scope(|s| {
            let handles: Vec<_> = (0..8)
                .map(|_| {
                    s.spawn(|| {
                        cache
                            .get_or_build(request(4), |r| {
                                builds.fetch_add(1, Ordering::Relaxed);
                                build(r)
                            })
                            .unwrap()
                    })
                })
                .collect();
            handles.into_iter().map(|h| h.join().unwrap()).collect()
        });
        assert!(builds.load(Ordering::Relaxed) >= 1);
        assert!(contexts.windows(2).all(|w| Arc::ptr_eq(&w[0], &w[1])));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn db_fields_cache_remembers_misses() {
        let cache = DbFieldCache::default();
        assert!(cache.get("generic:users").is_none());
        assert!(cache.add("generic:users".into(), None).is_none());
        assert_eq!(cache.get("generic:users"), Some(None));
    }
}
