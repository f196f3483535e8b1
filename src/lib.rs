pub use barge_core::*;
pub use barge_macros::*;
