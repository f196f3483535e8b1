mod cache;
mod execution_context;

pub use cache::*;
pub use execution_context::*;
