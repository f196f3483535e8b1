mod as_value;
pub mod batch;
mod blocking;
mod config;
mod context;
mod db_field;
mod driver;
mod entity;
mod error;
mod executor;
mod field;
mod request;
mod row;
mod session;
mod statement;
mod table_ref;
mod util;
mod value;
pub mod writer;

pub use ::anyhow::Context;
pub use as_value::*;
pub use batch::*;
pub use blocking::*;
pub use config::*;
pub use context::*;
pub use db_field::*;
pub use driver::*;
pub use entity::*;
pub use error::*;
pub use executor::*;
pub use field::*;
pub use request::*;
pub use row::*;
pub use session::*;
pub use statement::*;
pub use table_ref::*;
pub use util::*;
pub use value::*;
pub use writer::*;
pub mod stream {
    pub use ::futures::stream::*;
}
pub use ::futures::future;

pub type Result<T> = anyhow::Result<T>;
pub type Error = anyhow::Error;
