use crate::{Capabilities, SqlWriter};

/// PostgreSQL dialect.
///
/// One statement per command and no table hints, `RETURNING` yields the generated values in
/// input order.
///
/// Every batched operation (`insert_all`, `update_all`, `merge_all`) is one statement per row
/// here, callers must pass `batch_size: Some(1)` in the options or set a batch size of 1 in the
/// session configuration. Larger batches fail with `StatementError::NotSupported`.
#[derive(Default, Debug, Clone, Copy)]
pub struct PostgresSqlWriter {}

impl PostgresSqlWriter {
    pub const NAME: &'static str = "postgres";
    pub const CAPABILITIES: Capabilities = Capabilities {
        multiple_statements: false,
        hints: false,
        ordered_returning: true,
    };
}

impl SqlWriter for PostgresSqlWriter {
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
