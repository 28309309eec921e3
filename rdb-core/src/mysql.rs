//! MySQL driver backed by a sqlx pool

use std::collections::VecDeque;

use futures::TryStreamExt;
use sqlx::mysql::{MySqlArguments, MySqlPool, MySqlPoolOptions, MySqlRow};
use sqlx::query::Query;
use sqlx::{Column, Either, MySql, Row as _, TypeInfo, ValueRef};
use tracing::debug;

use crate::config::ConnectionConfig;
use crate::driver::{positional, Bind, Bindings, Driver, PreparedStatement, Row};
use crate::value::BindKind;
use crate::{Result, Value};

/// MySQL connection pool wrapper
#[derive(Debug, Clone)]
pub struct MySqlDriver {
    pool: MySqlPool,
}

impl MySqlDriver {
    /// Open a pool for `config`
    pub async fn connect(config: &ConnectionConfig) -> Result<Self> {
        config.validate()?;
        debug!(target: "rdb", host = %config.host, port = config.port, dbname = %config.dbname, "connecting");
        let pool = MySqlPoolOptions::new().connect(&config.url()).await?;
        Ok(Self { pool })
    }

    /// Create from an existing pool
    pub fn from_pool(pool: MySqlPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &MySqlPool {
        &self.pool
    }
}

impl Driver for MySqlDriver {
    type Statement = MySqlStatement;

    async fn prepare(&self, sql: &str) -> Result<MySqlStatement> {
        Ok(MySqlStatement {
            pool: self.pool.clone(),
            sql: sql.to_string(),
            bindings: Bindings::new(),
            rows: VecDeque::new(),
            row_count: 0,
            last_insert_id: None,
        })
    }
}

/// A statement with `:name` markers, sent to MySQL with positional `?`
/// markers on every execution. The result set is buffered by `execute`.
#[derive(Debug)]
pub struct MySqlStatement {
    pool: MySqlPool,
    sql: String,
    bindings: Bindings,
    rows: VecDeque<Row>,
    row_count: u64,
    last_insert_id: Option<u64>,
}

impl Bind for MySqlStatement {
    fn bind(&mut self, name: &str, value: &Value, kind: BindKind) -> Result<()> {
        self.bindings.replace(name, value, kind);
        Ok(())
    }
}

impl PreparedStatement for MySqlStatement {
    async fn execute(&mut self) -> Result<bool> {
        let (sql, values) = positional(&self.sql, &self.bindings)?;
        let mut query = sqlx::query(&sql);
        for value in &values {
            query = bind_value(query, value);
        }

        self.rows.clear();
        self.last_insert_id = None;
        let mut affected = 0;
        let mut stream = query.fetch_many(&self.pool);
        while let Some(step) = stream.try_next().await? {
            match step {
                Either::Left(done) => {
                    affected += done.rows_affected();
                    self.last_insert_id = Some(done.last_insert_id());
                }
                Either::Right(row) => self.rows.push_back(decode_row(&row)?),
            }
        }

        self.row_count = if self.rows.is_empty() {
            affected
        } else {
            self.rows.len() as u64
        };
        Ok(true)
    }

    async fn fetch_row(&mut self) -> Result<Option<Row>> {
        Ok(self.rows.pop_front())
    }

    fn last_insert_id(&self) -> Option<u64> {
        self.last_insert_id
    }

    fn row_count(&self) -> u64 {
        self.row_count
    }
}

fn bind_value<'q>(
    query: Query<'q, MySql, MySqlArguments>,
    value: &'q Value,
) -> Query<'q, MySql, MySqlArguments> {
    match value {
        Value::Null => query.bind(None::<String>),
        Value::Bool(b) => query.bind(*b),
        Value::I32(i) => query.bind(*i),
        Value::I64(i) => query.bind(*i),
        Value::F64(f) => query.bind(*f),
        Value::String(s) => query.bind(s.as_str()),
        Value::Bytes(b) => query.bind(b.as_slice()),
    }
}

/// How a column of a given MySQL type is read back
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ColumnKind {
    Bool,
    Signed,
    Unsigned,
    Float,
    Double,
    Text,
    #[cfg(feature = "datetime-support")]
    Date,
    #[cfg(feature = "datetime-support")]
    DateTime,
    Binary,
}

fn column_kind(type_name: &str) -> ColumnKind {
    let unsigned = type_name.ends_with("UNSIGNED");
    match type_name.split_whitespace().next().unwrap_or_default() {
        "BOOLEAN" => ColumnKind::Bool,
        "TINYINT" | "SMALLINT" | "MEDIUMINT" | "INT" | "BIGINT" | "YEAR" if unsigned => {
            ColumnKind::Unsigned
        }
        "TINYINT" | "SMALLINT" | "MEDIUMINT" | "INT" | "BIGINT" | "YEAR" => ColumnKind::Signed,
        "FLOAT" => ColumnKind::Float,
        "DOUBLE" => ColumnKind::Double,
        "CHAR" | "VARCHAR" | "TINYTEXT" | "TEXT" | "MEDIUMTEXT" | "LONGTEXT" | "ENUM" | "SET"
        | "JSON" | "DECIMAL" => ColumnKind::Text,
        #[cfg(feature = "datetime-support")]
        "DATE" => ColumnKind::Date,
        #[cfg(feature = "datetime-support")]
        "DATETIME" | "TIMESTAMP" => ColumnKind::DateTime,
        _ => ColumnKind::Binary,
    }
}

fn decode_row(row: &MySqlRow) -> Result<Row> {
    let mut columns = Vec::with_capacity(row.len());
    let mut values = Vec::with_capacity(row.len());
    for (index, column) in row.columns().iter().enumerate() {
        columns.push(column.name().to_string());
        if row.try_get_raw(index)?.is_null() {
            values.push(Value::Null);
            continue;
        }
        let value = match column_kind(column.type_info().name()) {
            ColumnKind::Bool => Value::Bool(row.try_get(index)?),
            ColumnKind::Signed => Value::I64(row.try_get(index)?),
            ColumnKind::Unsigned => {
                let raw: u64 = row.try_get(index)?;
                i64::try_from(raw)
                    .map(Value::I64)
                    .unwrap_or_else(|_| Value::String(raw.to_string()))
            }
            ColumnKind::Float => Value::F64(f64::from(row.try_get::<f32, _>(index)?)),
            ColumnKind::Double => Value::F64(row.try_get(index)?),
            ColumnKind::Text => Value::String(row.try_get_unchecked(index)?),
            #[cfg(feature = "datetime-support")]
            ColumnKind::Date => row.try_get::<chrono::NaiveDate, _>(index)?.into(),
            #[cfg(feature = "datetime-support")]
            ColumnKind::DateTime => row.try_get::<chrono::NaiveDateTime, _>(index)?.into(),
            ColumnKind::Binary => Value::Bytes(row.try_get_unchecked(index)?),
        };
        values.push(value);
    }
    Ok(Row::new(columns, values))
}
