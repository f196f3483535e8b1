mod context;
mod postgres;
mod sql_writer;
mod sqlite;
mod sqlserver;

pub use context::*;
pub use postgres::*;
pub use sql_writer::*;
pub use sqlite::*;
pub use sqlserver::*;
