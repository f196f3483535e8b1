use crate::{
    Command, ExecutionContext, Executor, QueryResult, Result, RowLike, Value, stream::TryStreamExt,
    truncate_long,
};
use std::{ops::Range, pin::pin, sync::Arc, time::Duration};

/// Consecutive ranges of at most `batch_size` elements covering `0..len`.
///
/// Every range but the last has exactly `batch_size` elements.
pub fn partition(len: usize, batch_size: usize) -> impl Iterator<Item = Range<usize>> {
    let batch_size = batch_size.max(1);
    (0..len.div_ceil(batch_size)).map(move |i| {
        let start = i * batch_size;
        start..(start + batch_size).min(len)
    })
}

/// How the statements of one call are generated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BatchStrategy {
    /// Every row fits in one statement.
    Single,
    /// Full batches followed by a shorter one when the rows don't divide evenly, each size has
    /// its own statement.
    Modular,
}

impl BatchStrategy {
    pub fn of(len: usize, batch_size: usize) -> Self {
        if len <= batch_size.max(1) {
            BatchStrategy::Single
        } else {
            BatchStrategy::Modular
        }
    }
}

/// Outcome of a batched write.
#[derive(Default, Debug, Clone, PartialEq)]
pub struct Inserted {
    pub rows_affected: u64,
    /// Values returned by the database, in input order.
    pub generated: Vec<Value>,
}

impl Extend<Inserted> for Inserted {
    fn extend<T: IntoIterator<Item = Inserted>>(&mut self, iter: T) {
        for elem in iter {
            self.rows_affected += elem.rows_affected;
            self.generated.extend(elem.generated);
        }
    }
}

/// Execute `rows` in consecutive batches, strictly in input order.
///
/// `context_for` returns the execution context for a batch of the given size. Execution stops
/// at the first failing batch and its error is returned unchanged, batches already executed
/// are not rolled back.
pub async fn execute_batches<E, R, F>(
    executor: &mut E,
    rows: &[R],
    batch_size: usize,
    timeout: Option<Duration>,
    mut context_for: F,
) -> Result<Inserted>
where
    E: Executor,
    R: RowLike,
    F: FnMut(usize) -> Result<Arc<ExecutionContext>>,
{
    let mut result = Inserted::default();
    let batches = rows.len().div_ceil(batch_size.max(1));
    let strategy = BatchStrategy::of(rows.len(), batch_size);
    for (i, range) in partition(rows.len(), batch_size).enumerate() {
        let batch = &rows[range];
        let context = context_for(batch.len())?;
        let command = Command {
            sql: context.sql.clone(),
            parameters: context.bind(batch),
            timeout,
        };
        log::trace!(
            "Batch {}/{} ({:?}, {} rows): {}",
            i + 1,
            batches,
            strategy,
            batch.len(),
            truncate_long!(command.sql)
        );
        match execute_batch(executor, command, context.returning.is_some()).await {
            Ok(v) => result.extend([v]),
            Err(e) => {
                log::error!(
                    "Batch {}/{} failed after {} rows affected: {:#}",
                    i + 1,
                    batches,
                    result.rows_affected,
                    e
                );
                return Err(e);
            }
        }
    }
    Ok(result)
}

/// Run one command collecting either the returned rows or the affected counts.
///
/// When the statement returns generated values the number of returned rows is the number of
/// rows affected.
pub async fn execute_batch<E: Executor>(
    executor: &mut E,
    command: Command,
    returning: bool,
) -> Result<Inserted> {
    let mut affected = 0;
    let mut generated = Vec::new();
    let mut stream = pin!(executor.run(command));
    while let Some(item) = stream.try_next().await? {
        match item {
            QueryResult::Row(row) if returning => {
                generated.push(row.values.into_vec().into_iter().next().unwrap_or_default());
            }
            QueryResult::Row(..) => {}
            QueryResult::Affected(v) => affected += v.rows_affected,
        }
    }
    Ok(Inserted {
        rows_affected: if returning {
            generated.len() as u64
        } else {
            affected
        },
        generated,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partition_sizes() {
        for (len, batch_size) in [(0, 3), (1, 3), (3, 3), (7, 3), (10, 1), (5, 10), (1000, 7)] {
            let batches: Vec<_> = partition(len, batch_size).collect();
            assert_eq!(batches.len(), len.div_ceil(batch_size));
            assert_eq!(batches.iter().map(|v| v.len()).sum::<usize>(), len);
            if let Some((last, full)) = batches.split_last() {
                assert!(full.iter().all(|v| v.len() == batch_size));
                assert!(last.len() >= 1 && last.len() <= batch_size);
            }
            let mut expected = 0;
            for range in batches {
                assert_eq!(range.start, expected);
                expected = range.end;
            }
        }
    }

    #[test]
    fn strategy() {
        assert_eq!(BatchStrategy::of(0, 10), BatchStrategy::Single);
        assert_eq!(BatchStrategy::of(10, 10), BatchStrategy::Single);
        assert_eq!(BatchStrategy::of(11, 10), BatchStrategy::Modular);
    }
}
