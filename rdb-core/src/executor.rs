//! Running statements through a driver

use std::time::Instant;

use serde::de::DeserializeOwned;
use tracing::{debug, trace};

use crate::builder::Operation;
use crate::driver::{Bindings, Driver, PreparedStatement, Row};
use crate::hooks::{ExecutionSummary, Hooks, QueryContext};
use crate::{Error, Result, Statement};

/// What an execution produced, by operation
#[derive(Debug)]
pub enum Outcome<S> {
    /// Generated ids of an insert, in row order
    Inserted(Vec<u64>),
    /// Update, delete, drop, truncate and check
    Done(bool),
    /// Show: whether the table exists
    Exists(bool),
    /// Select: rows fetched lazily from the prepared statement
    Rows(Cursor<S>),
}

impl<S> Outcome<S> {
    pub fn is_success(&self) -> bool {
        match self {
            Outcome::Inserted(_) | Outcome::Rows(_) => true,
            Outcome::Done(ok) | Outcome::Exists(ok) => *ok,
        }
    }

    pub fn into_ids(self) -> Result<Vec<u64>> {
        match self {
            Outcome::Inserted(ids) => Ok(ids),
            other => Err(Error::usage(format!("expected inserted ids, got {}", other.kind()))),
        }
    }

    pub fn into_cursor(self) -> Result<Cursor<S>> {
        match self {
            Outcome::Rows(cursor) => Ok(cursor),
            other => Err(Error::usage(format!("expected rows, got {}", other.kind()))),
        }
    }

    fn kind(&self) -> &'static str {
        match self {
            Outcome::Inserted(_) => "inserted ids",
            Outcome::Done(_) => "a completion flag",
            Outcome::Exists(_) => "an existence flag",
            Outcome::Rows(_) => "rows",
        }
    }
}

/// Rows of an executed select, pulled one at a time
#[derive(Debug)]
pub struct Cursor<S> {
    statement: S,
}

impl<S: PreparedStatement> Cursor<S> {
    fn new(statement: S) -> Self {
        Self { statement }
    }

    /// Rows the driver reported for the select
    pub fn row_count(&self) -> u64 {
        self.statement.row_count()
    }

    #[allow(clippy::should_implement_trait)]
    pub async fn next(&mut self) -> Result<Option<Row>> {
        self.statement.fetch_row().await
    }

    /// The next row deserialized through its JSON form
    pub async fn next_as<T: DeserializeOwned>(&mut self) -> Result<Option<T>> {
        match self.next().await? {
            Some(row) => Ok(Some(serde_json::from_value(row.to_json())?)),
            None => Ok(None),
        }
    }

    pub async fn collect(mut self) -> Result<Vec<Row>> {
        let mut rows = Vec::new();
        while let Some(row) = self.next().await? {
            rows.push(row);
        }
        Ok(rows)
    }

    pub async fn collect_as<T: DeserializeOwned>(mut self) -> Result<Vec<T>> {
        let mut items = Vec::new();
        while let Some(item) = self.next_as().await? {
            items.push(item);
        }
        Ok(items)
    }
}

impl Statement {
    /// Materialize, prepare, bind and run the statement.
    ///
    /// An insert runs its template once per row and returns the generated
    /// ids; a check probes the table with `SHOW TABLES` first and only
    /// creates it when missing.
    pub async fn execute<D: Driver>(&self, driver: &D) -> Result<Outcome<D::Statement>> {
        self.execute_with(driver, &Hooks::new()).await
    }

    /// [`Statement::execute`], running `hooks` around every SQL statement
    /// sent to the driver
    pub async fn execute_with<D: Driver>(
        &self,
        driver: &D,
        hooks: &Hooks,
    ) -> Result<Outcome<D::Statement>> {
        if self.operation == Operation::Check {
            let probe = Statement::show(&self.table)?;
            if let Outcome::Exists(true) = probe.run(driver, hooks).await? {
                debug!(target: "rdb", table = %self.table, "table exists, nothing to create");
                return Ok(Outcome::Done(true));
            }
        }
        self.run(driver, hooks).await
    }

    async fn run<D: Driver>(&self, driver: &D, hooks: &Hooks) -> Result<Outcome<D::Statement>> {
        let batch = match self.operation {
            Operation::Insert => self.batch_bindings()?,
            _ => vec![self.bindings()?],
        };
        let sql = self.statement()?;
        let ctx = QueryContext {
            operation: self.operation,
            table: &self.table,
            sql,
        };
        hooks.before_execute(&ctx)?;

        let started = Instant::now();
        let mut prepared = driver.prepare(sql).await?;
        let mut summary = ExecutionSummary::default();

        let outcome = match self.operation {
            Operation::Insert => {
                let mut ids = Vec::with_capacity(batch.len());
                for bindings in &batch {
                    bind_all(&mut prepared, bindings)?;
                    prepared.execute().await?;
                    let id = prepared.last_insert_id().ok_or_else(|| {
                        Error::driver(format!("no id reported for insert into {}", self.table))
                    })?;
                    ids.push(id);
                }
                summary.row_count = ids.len() as u64;
                summary.inserted_ids = ids.clone();
                Outcome::Inserted(ids)
            }
            operation => {
                for bindings in &batch {
                    bind_all(&mut prepared, bindings)?;
                }
                let ok = prepared.execute().await?;
                summary.row_count = prepared.row_count();
                match operation {
                    Operation::Show => Outcome::Exists(ok && summary.row_count > 0),
                    Operation::Select => Outcome::Rows(Cursor::new(prepared)),
                    _ => Outcome::Done(ok),
                }
            }
        };

        summary.elapsed = started.elapsed();
        debug!(
            target: "rdb",
            operation = %self.operation,
            table = %self.table,
            rows = summary.row_count,
            ids = ?summary.inserted_ids,
            "statement executed"
        );
        hooks.after_execute(&ctx, &summary)?;
        Ok(outcome)
    }
}

fn bind_all<S: PreparedStatement>(prepared: &mut S, bindings: &Bindings) -> Result<()> {
    for binding in bindings {
        trace!(target: "rdb", name = %binding.name, kind = %binding.kind, "binding parameter");
        prepared.bind(&binding.name, &binding.value, binding.kind)?;
    }
    Ok(())
}


#[cfg(test)]
mod tests {
    use super::mock::MockDriver;
    use super::*;
    use crate::hooks::{HookAction, QueryHook};
    use crate::Value;
    use serde::Deserialize;

    #[derive(Debug, PartialEq, Deserialize)]
    struct User {
        id: i32,
        name: String,
    }

    fn user_rows() -> Vec<Row> {
        let columns = || vec!["id".to_string(), "name".to_string()];
        vec![
            Row::new(columns(), vec![Value::from(1), Value::from("john")]),
            Row::new(columns(), vec![Value::from(2), Value::from("marie")]),
        ]
    }

    #[tokio::test]
    async fn test_insert_runs_the_template_per_row() {
        let driver = MockDriver::new();
        let insert = Statement::insert(
            "users",
            ("name", "gender", "age"),
            vec![
                vec![Value::from("john"), Value::from("marie"), Value::from("isac")],
                vec![Value::from(false), Value::from(true), Value::from(false)],
                vec![Value::from(31), Value::from(27), Value::from(45)],
            ],
        )
        .unwrap();

        let ids = insert.execute(&driver).await.unwrap().into_ids().unwrap();
        assert_eq!(ids, vec![1, 2, 3]);
        assert_eq!(driver.prepared().len(), 1);

        let executed = driver.executed();
        assert_eq!(executed.len(), 3);
        assert_eq!(
            executed[0].sql,
            "INSERT INTO users (name, gender, age) VALUES (:name, :gender, :age)"
        );
        assert_eq!(executed[2].bindings.get("name"), Some(&Value::from("isac")));
        assert_eq!(executed[1].bindings.get("gender"), Some(&Value::from(true)));
    }

    #[tokio::test]
    async fn test_ragged_insert_never_reaches_the_driver() {
        let driver = MockDriver::new();
        let insert = Statement::insert(
            "users",
            ("name", "age"),
            vec![vec![Value::from("john"), Value::from("marie")], vec![Value::from(31)]],
        )
        .unwrap();
        let err = insert.execute(&driver).await.unwrap_err();
        assert!(matches!(err, Error::ContractViolation { .. }));
        assert!(driver.prepared().is_empty());
    }

    #[tokio::test]
    async fn test_delete_binds_every_marker() {
        let driver = MockDriver::new().with_row_count(4);
        let delete = Statement::delete("users")
            .unwrap()
            .begin_condition("age")
            .between(10, 20)
            .unwrap()
            .begin_condition("name")
            .start_with("j")
            .unwrap();

        let outcome = delete.execute(&driver).await.unwrap();
        assert!(matches!(outcome, Outcome::Done(true)));

        let executed = driver.executed();
        assert_eq!(executed.len(), 1);
        assert_eq!(
            executed[0].sql,
            "DELETE FROM users WHERE (age BETWEEN :age_0_0 AND :age_0_1 AND name LIKE :name_1_0)"
        );
        let bound = &executed[0].bindings;
        assert_eq!(bound.get("age_0_0"), Some(&Value::from(10)));
        assert_eq!(bound.get("age_0_1"), Some(&Value::from(20)));
        assert_eq!(bound.get("name_1_0"), Some(&Value::from("j%")));
        assert!(delete.is_materialized());
    }

    #[tokio::test]
    async fn test_select_returns_a_cursor() {
        let driver = MockDriver::new().with_rows(user_rows());
        let select = Statement::select("users", ("id", "name"))
            .unwrap()
            .limit(2)
            .unwrap();

        let cursor = select.execute(&driver).await.unwrap().into_cursor().unwrap();
        assert_eq!(cursor.row_count(), 2);
        let users: Vec<User> = cursor.collect_as().await.unwrap();
        assert_eq!(
            users,
            vec![
                User { id: 1, name: "john".into() },
                User { id: 2, name: "marie".into() }
            ]
        );
        assert_eq!(driver.executed()[0].bindings.get("limit"), Some(&Value::I64(2)));
    }

    #[tokio::test]
    async fn test_cursor_yields_rows_lazily() {
        let driver = MockDriver::new().with_rows(user_rows());
        let select = Statement::select("users", "*").unwrap();
        let mut cursor = select.execute(&driver).await.unwrap().into_cursor().unwrap();
        let first = cursor.next().await.unwrap().unwrap();
        assert_eq!(first.get("name"), Some(&Value::from("john")));
        let second: User = cursor.next_as().await.unwrap().unwrap();
        assert_eq!(second.id, 2);
        assert!(cursor.next().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_show_reports_existence() {
        let driver = MockDriver::new().with_rows(user_rows());
        let outcome = Statement::show("users").unwrap().execute(&driver).await.unwrap();
        assert!(matches!(outcome, Outcome::Exists(true)));

        let driver = MockDriver::new();
        let outcome = Statement::show("users").unwrap().execute(&driver).await.unwrap();
        assert!(matches!(outcome, Outcome::Exists(false)));
        assert!(!outcome.is_success());
    }

    #[tokio::test]
    async fn test_check_skips_existing_tables() {
        let driver = MockDriver::new().with_row_count(1);
        let check = Statement::check("users", ["id INT"]).unwrap();
        let outcome = check.execute(&driver).await.unwrap();
        assert!(matches!(outcome, Outcome::Done(true)));
        assert_eq!(driver.prepared(), vec!["SHOW TABLES LIKE 'users'"]);
    }

    #[tokio::test]
    async fn test_check_creates_missing_tables() {
        let driver = MockDriver::new();
        let check = Statement::check("users", ["id INT", "name VARCHAR(255)"]).unwrap();
        let outcome = check.execute(&driver).await.unwrap();
        assert!(outcome.is_success());
        assert_eq!(
            driver.prepared(),
            vec![
                "SHOW TABLES LIKE 'users'",
                "CREATE TABLE users (id INT, name VARCHAR(255))"
            ]
        );
    }

    #[tokio::test]
    async fn test_drop_and_truncate() {
        let driver = MockDriver::new();
        assert!(Statement::drop("users").unwrap().execute(&driver).await.unwrap().is_success());
        assert!(Statement::truncate("users").unwrap().execute(&driver).await.unwrap().is_success());
        assert_eq!(driver.prepared(), vec!["DROP TABLE users", "TRUNCATE TABLE users"]);
    }

    #[tokio::test]
    async fn test_driver_failure_is_propagated() {
        let driver = MockDriver::new().failing_on("UPDATE");
        let update = Statement::update("users", "name", vec!["paul"])
            .unwrap()
            .add_condition("id", "=", 3)
            .unwrap();
        let err = update.execute(&driver).await.unwrap_err();
        assert!(err.is_driver_failure());
        assert!(err.to_string().contains("mock failure"));
        assert!(driver.executed().is_empty());
    }

    #[tokio::test]
    async fn test_same_statement_runs_twice_with_the_same_text() {
        let driver = MockDriver::new();
        let delete = Statement::delete("users")
            .unwrap()
            .add_condition("id", "=", 3)
            .unwrap();
        delete.execute(&driver).await.unwrap();
        delete.execute(&driver).await.unwrap();
        let executed = driver.executed();
        assert_eq!(executed[0], executed[1]);
    }

    struct ReadOnly;

    impl QueryHook for ReadOnly {
        fn before_execute(&self, ctx: &QueryContext<'_>) -> HookAction {
            if ctx.operation == Operation::Select {
                HookAction::Continue
            } else {
                HookAction::Abort("read only".into())
            }
        }
    }

    #[tokio::test]
    async fn test_hook_abort_stops_before_the_driver() {
        let driver = MockDriver::new();
        let hooks = Hooks::new().register(ReadOnly);
        let err = Statement::drop("users")
            .unwrap()
            .execute_with(&driver, &hooks)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::UsageState { .. }));
        assert!(driver.prepared().is_empty());

        let outcome = Statement::select("users", "*")
            .unwrap()
            .execute_with(&driver, &hooks)
            .await
            .unwrap();
        assert!(outcome.is_success());
    }

    #[test]
    fn test_outcome_accessors() {
        let outcome: Outcome<super::mock::MockStatement> = Outcome::Done(true);
        let err = outcome.into_ids().unwrap_err();
        assert!(err.to_string().contains("expected inserted ids, got a completion flag"));
        let outcome: Outcome<super::mock::MockStatement> = Outcome::Inserted(vec![4]);
        assert_eq!(outcome.into_ids().unwrap(), vec![4]);
    }

    #[test]
    fn test_execute_from_sync_code() {
        let driver = MockDriver::new();
        let statement = Statement::truncate("logs").unwrap();
        let outcome = tokio_test::block_on(statement.execute(&driver)).unwrap();
        assert!(matches!(outcome, Outcome::Done(true)));
    }
}
