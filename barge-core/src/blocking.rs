use crate::{
    Entity, Executor, Field, Inserted, Options, Result, RowLabeled, RowLike, RowsAffected,
    Session, Value,
};
use futures::executor::block_on;

macro_rules! blocking {
    ($($(#[$attr:meta])* fn $name:ident $(<$($g:ident: $bound:path),+>)? ($($arg:ident: $ty:ty),*) -> $ret:ty;)*) => {
        $(
            $(#[$attr])*
            pub fn $name $(<$($g: $bound),+>)? (&mut self, $($arg: $ty),*) -> Result<$ret> {
                block_on(self.session.$name $(::<$($g),+>)? ($($arg),*))
            }
        )*
    };
}

/// Synchronous mirror of a [`Session`], every call runs the async version to completion on the
/// current thread.
///
/// The executor must not depend on a runtime driven by this same thread.
pub struct BlockingSession<'s, 'c, E: Executor> {
    session: &'s mut Session<'c, E>,
}

impl<'s, 'c, E: Executor> BlockingSession<'s, 'c, E> {
    pub fn new(session: &'s mut Session<'c, E>) -> Self {
        Self { session }
    }

    blocking! {
        /// See [`Session::insert`].
        fn insert<R: RowLike>(row: &R, options: &Options<'_>) -> Option<Value>;
        fn insert_all<R: RowLike>(rows: &[R], options: &Options<'_>) -> Inserted;
        fn update<R: RowLike>(row: &R, options: &Options<'_>) -> RowsAffected;
        fn update_all<R: RowLike>(rows: &[R], options: &Options<'_>) -> RowsAffected;
        /// See [`Session::merge`].
        fn merge<R: RowLike>(row: &R, options: &Options<'_>) -> Option<Value>;
        fn merge_all<R: RowLike>(rows: &[R], options: &Options<'_>) -> Inserted;
        fn delete<R: RowLike>(row: &R, options: &Options<'_>) -> RowsAffected;
        fn delete_all(options: &Options<'_>) -> RowsAffected;
        fn query<R: RowLike>(filter: &R, options: &Options<'_>) -> Vec<RowLabeled>;
        fn query_all(options: &Options<'_>) -> Vec<RowLabeled>;
        fn query_entities<T: Entity, R: RowLike>(filter: &R, options: &Options<'_>) -> Vec<T>;
        fn query_all_entities<T: Entity>(options: &Options<'_>) -> Vec<T>;
        fn count<R: RowLike>(filter: &R, options: &Options<'_>) -> Value;
        fn count_all(options: &Options<'_>) -> Value;
        fn max<R: RowLike>(field: Field, filter: &R, options: &Options<'_>) -> Value;
        fn max_all(field: Field, options: &Options<'_>) -> Value;
        fn min<R: RowLike>(field: Field, filter: &R, options: &Options<'_>) -> Value;
        fn min_all(field: Field, options: &Options<'_>) -> Value;
        fn sum<R: RowLike>(field: Field, filter: &R, options: &Options<'_>) -> Value;
        fn sum_all(field: Field, options: &Options<'_>) -> Value;
        fn average<R: RowLike>(field: Field, filter: &R, options: &Options<'_>) -> Value;
        fn average_all(field: Field, options: &Options<'_>) -> Value;
    }
}
