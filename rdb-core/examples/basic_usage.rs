//! Creates a `users` table, fills it and queries it back.
//!
//! Connection settings come from `RDB_HOST`, `RDB_DBNAME`, `RDB_USER`,
//! `RDB_PASSWORD` (and optionally `RDB_PORT`, `RDB_TABLE_PREFIX`).
//!
//! ```sh
//! RUST_LOG=rdb=debug cargo run --example basic_usage --features mysql
//! ```

use rdb_core::{ConnectionConfig, Hooks, MySqlDriver, Statement, Value};
use serde::Deserialize;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Deserialize)]
struct User {
    id: i64,
    name: String,
    age: i64,
}

#[tokio::main]
async fn main() -> rdb_core::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let config = ConnectionConfig::from_env()?;
    let driver = MySqlDriver::connect(&config).await?;
    let hooks = Hooks::new().register(config.tracing_hook());
    let users = config.table("users");

    Statement::check(
        &users,
        [
            "id BIGINT UNSIGNED NOT NULL AUTO_INCREMENT PRIMARY KEY",
            "name VARCHAR(255)",
            "gender BOOLEAN",
            "age INT",
        ],
    )?
    .execute_with(&driver, &hooks)
    .await?;

    let ids = Statement::insert(
        &users,
        ("name", "gender", "age"),
        vec![
            vec![Value::from("john"), "marie".into(), "isac".into()],
            vec![Value::from(false), true.into(), false.into()],
            vec![Value::from(31), 27.into(), 45.into()],
        ],
    )?
    .execute_with(&driver, &hooks)
    .await?
    .into_ids()?;
    println!("inserted ids: {:?}", ids);

    Statement::update(&users, "age", vec![32])?
        .begin_condition("name")
        .start_with("jo")?
        .execute_with(&driver, &hooks)
        .await?;

    let adults = Statement::select(&users, ("id", "name", "age"))?
        .begin_condition("age")
        .between(18, 40)?
        .or()
        .add_condition("name", "=", "isac")?
        .order_by("age", "DESC")?
        .limit(10)?;
    println!("{}", adults.statement()?);

    let rows: Vec<User> = adults
        .execute_with(&driver, &hooks)
        .await?
        .into_cursor()?
        .collect_as()
        .await?;
    for user in rows {
        println!("{:>3} {:<10} {}", user.id, user.name, user.age);
    }

    Statement::drop(&users)?.execute_with(&driver, &hooks).await?;
    Ok(())
}
