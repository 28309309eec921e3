//! Statement builder

pub mod common;
pub mod predicate;
mod render;
pub mod statement;

pub use common::{IntoColumns, Operation};
pub use predicate::{ConditionBuilder, InList, Operand, Predicate};
pub use statement::Statement;
