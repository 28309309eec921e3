//! rdb - fluent builder for parameterized MySQL statements
//!
//! Statements are built from a factory, refined with chained calls and
//! rendered once into SQL with uniquely named `:markers`. Rendering and
//! binding are synchronous; only execution goes through the async
//! [`Driver`] seam.

pub mod builder;
pub mod config;
pub mod driver;
pub mod error;
pub mod executor;
pub mod hooks;
pub mod operator;
pub mod util;
pub mod value;

#[cfg(feature = "mysql")]
pub mod mysql;

// Re-export main types
pub use builder::{ConditionBuilder, InList, IntoColumns, Operation, Predicate, Statement};
pub use config::ConnectionConfig;
pub use driver::{Bind, Binding, Bindings, Driver, PreparedStatement, Row};
pub use error::{Error, Result};
pub use executor::{Cursor, Outcome};
pub use hooks::{ExecutionSummary, HookAction, Hooks, QueryContext, QueryHook, TracingHook};
pub use operator::{
    Comparator, Connective, IntoComparator, IntoSortDirection, JoinType, SortDirection, UnionKind,
};
pub use value::{BindKind, Value};

#[cfg(feature = "mysql")]
pub use mysql::{MySqlDriver, MySqlStatement};

/// Start a SELECT on `table`
pub fn select<C: IntoColumns>(table: &str, columns: C) -> Result<Statement> {
    Statement::select(table, columns)
}

/// Start an INSERT of a column-major batch into `table`
pub fn insert<C, V>(table: &str, columns: C, rows: Vec<Vec<V>>) -> Result<Statement>
where
    C: IntoColumns,
    V: Into<Value>,
{
    Statement::insert(table, columns, rows)
}

/// Start an UPDATE of `table`
pub fn update<C, V>(table: &str, columns: C, row: Vec<V>) -> Result<Statement>
where
    C: IntoColumns,
    V: Into<Value>,
{
    Statement::update(table, columns, row)
}

/// Start a DELETE from `table`
pub fn delete(table: &str) -> Result<Statement> {
    Statement::delete(table)
}
