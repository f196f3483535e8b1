use crate::SqlWriter;

/// A database backend: its name and the dialect its statements are written in.
pub trait Driver {
    type SqlWriter: SqlWriter;

    const NAME: &'static str;

    fn sql_writer(&self) -> Self::SqlWriter;
}
