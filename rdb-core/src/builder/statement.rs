//! The statement builder: factories, fluent modifiers and inspection

use std::sync::OnceLock;

use tracing::debug;

use super::common::{IntoColumns, Operation};
use super::predicate::{ConditionBuilder, Operand, Predicate};
use crate::driver::Bindings;
use crate::operator::{
    IntoComparator, IntoSortDirection, JoinType, SortDirection, UnionKind,
};
use crate::util::{concat, is_blank};
use crate::{Error, Result, Value};

/// Operation specific payload handed to a factory
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Payload {
    None,
    /// Column-major insert batch: one inner list per column
    Batch(Vec<Vec<Value>>),
    /// One replacement value per updated column
    Row(Vec<Value>),
    /// Raw column definitions for CREATE TABLE
    Structure(Vec<String>),
}

/// One logical SQL operation bound to a table.
///
/// Built from a factory, refined with chained calls, then materialized once:
/// the first call to [`Statement::statement`] (or an execution) renders and
/// caches the SQL text. Any later modifier fails with
/// [`Error::UsageState`] and the cached text is kept.
#[derive(Debug, Clone)]
pub struct Statement {
    pub(crate) operation: Operation,
    pub(crate) table: String,
    pub(crate) columns: Vec<String>,
    pub(crate) payload: Payload,
    /// Groups are ORed together, predicates inside a group are ANDed
    pub(crate) groups: Vec<Vec<Predicate>>,
    pub(crate) group_pointer: usize,
    pub(crate) joins: Vec<String>,
    pub(crate) unions: Vec<(UnionKind, Statement)>,
    pub(crate) order_by: Option<String>,
    pub(crate) limit: Option<u64>,
    pub(crate) offset: Option<u64>,
    pub(crate) next_sequence: usize,
    pub(crate) cached: OnceLock<String>,
}

impl Statement {
    fn new(operation: Operation, table: &str, columns: Vec<String>, payload: Payload) -> Self {
        Self {
            operation,
            table: table.to_string(),
            columns,
            payload,
            groups: Vec::new(),
            group_pointer: 0,
            joins: Vec::new(),
            unions: Vec::new(),
            order_by: None,
            limit: None,
            offset: None,
            next_sequence: 0,
            cached: OnceLock::new(),
        }
    }

    /// `SELECT columns FROM table`
    ///
    /// # Examples
    /// ```
    /// use rdb_core::Statement;
    ///
    /// let query = Statement::select("users", ("id", "name"))?
    ///     .add_condition("age", ">", 18)?;
    /// assert_eq!(query.statement()?, "SELECT id, name FROM users WHERE age > :age_0_0");
    /// # Ok::<(), rdb_core::Error>(())
    /// ```
    pub fn select<C: IntoColumns>(table: &str, columns: C) -> Result<Self> {
        require_table(table)?;
        let columns = columns.into_columns();
        if columns.is_empty() || columns.iter().any(|c| is_blank(c)) {
            return Err(Error::contract_violation(
                "SELECT requires at least one non-blank column",
            ));
        }
        Ok(Self::new(Operation::Select, table, columns, Payload::None))
    }

    /// `INSERT INTO table (columns) VALUES (...)` for a column-major batch:
    /// `rows[i]` holds every value of `columns[i]`.
    ///
    /// Whether every column holds the same number of values is checked when
    /// the statement runs.
    pub fn insert<C, V>(table: &str, columns: C, rows: Vec<Vec<V>>) -> Result<Self>
    where
        C: IntoColumns,
        V: Into<Value>,
    {
        require_table(table)?;
        let columns = columns.into_columns();
        if columns.is_empty() || rows.is_empty() || columns.len() != rows.len() {
            return Err(Error::contract_violation(format!(
                "INSERT requires one value list per column, got {} columns and {} lists",
                columns.len(),
                rows.len()
            )));
        }
        let rows = rows
            .into_iter()
            .map(|column| column.into_iter().map(Into::into).collect())
            .collect();
        Ok(Self::new(Operation::Insert, table, columns, Payload::Batch(rows)))
    }

    /// `UPDATE table SET column = value, ...` with one value per column
    pub fn update<C, V>(table: &str, columns: C, row: Vec<V>) -> Result<Self>
    where
        C: IntoColumns,
        V: Into<Value>,
    {
        require_table(table)?;
        let columns = columns.into_columns();
        if columns.is_empty() || row.is_empty() || columns.len() != row.len() {
            return Err(Error::contract_violation(format!(
                "UPDATE requires one value per column, got {} columns and {} values",
                columns.len(),
                row.len()
            )));
        }
        let row = row.into_iter().map(Into::into).collect();
        Ok(Self::new(Operation::Update, table, columns, Payload::Row(row)))
    }

    /// `DELETE FROM table`
    pub fn delete(table: &str) -> Result<Self> {
        require_table(table)?;
        Ok(Self::new(Operation::Delete, table, Vec::new(), Payload::None))
    }

    /// Create `table` with the given column definitions unless it exists
    pub fn check<I, S>(table: &str, structure: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        require_table(table)?;
        let structure: Vec<String> = structure.into_iter().map(Into::into).collect();
        if structure.iter().all(|fragment| is_blank(fragment)) {
            return Err(Error::contract_violation(
                "CHECK requires at least one column definition",
            ));
        }
        Ok(Self::new(
            Operation::Check,
            table,
            Vec::new(),
            Payload::Structure(structure),
        ))
    }

    /// `DROP TABLE table`
    pub fn drop(table: &str) -> Result<Self> {
        require_table(table)?;
        Ok(Self::new(Operation::Drop, table, Vec::new(), Payload::None))
    }

    /// `TRUNCATE TABLE table`
    pub fn truncate(table: &str) -> Result<Self> {
        require_table(table)?;
        Ok(Self::new(Operation::Truncate, table, Vec::new(), Payload::None))
    }

    /// `SHOW TABLES LIKE 'table'`
    pub fn show(table: &str) -> Result<Self> {
        require_table(table)?;
        Ok(Self::new(Operation::Show, table, Vec::new(), Payload::None))
    }

    /// Add `column <comparator> value` to the current AND group
    pub fn add_condition<C, V>(mut self, column: &str, comparator: C, value: V) -> Result<Self>
    where
        C: IntoComparator,
        V: Into<Value>,
    {
        let mut predicate = Predicate::compare(column, comparator, value)?;
        self.ensure_mutable()?;
        predicate.sequence = self.take_sequence();
        self.push_predicate(predicate)?;
        Ok(self)
    }

    /// Start a condition on `column`; one of the returned builder's
    /// finalizers completes it and gives the statement back
    ///
    /// # Examples
    /// ```
    /// use rdb_core::Statement;
    ///
    /// let query = Statement::delete("users")?
    ///     .begin_condition("age").between(10, 20)?
    ///     .begin_condition("name").start_with("j")?;
    /// assert_eq!(
    ///     query.statement()?,
    ///     "DELETE FROM users WHERE (age BETWEEN :age_0_0 AND :age_0_1 AND name LIKE :name_1_0)"
    /// );
    /// # Ok::<(), rdb_core::Error>(())
    /// ```
    pub fn begin_condition(mut self, column: &str) -> ConditionBuilder {
        let sequence = self.take_sequence();
        ConditionBuilder::new(self, column, sequence)
    }

    /// Register a standalone predicate (possibly a chain) in the current
    /// AND group
    pub fn add_predicate(mut self, mut predicate: Predicate) -> Result<Self> {
        self.ensure_mutable()?;
        predicate.assign_sequence(&mut self.next_sequence);
        self.push_predicate(predicate)?;
        Ok(self)
    }

    /// Make the next condition start a new group, ORed with the previous ones
    pub fn or(mut self) -> Self {
        if self.current_group_len() > 0 {
            self.group_pointer += 1;
        }
        self
    }

    /// `ORDER BY column direction`; `RAND()` ignores the column
    pub fn order_by<D: IntoSortDirection>(mut self, column: &str, direction: D) -> Result<Self> {
        let direction = direction.into_sort_direction()?;
        self.ensure_select("ORDER BY")?;
        self.ensure_mutable()?;
        self.order_by = Some(match direction {
            SortDirection::Random => direction.as_str().to_string(),
            _ => concat(" ", [column, direction.as_str()]),
        });
        Ok(self)
    }

    /// `LIMIT :limit`
    pub fn limit(mut self, count: u64) -> Result<Self> {
        self.ensure_select("LIMIT")?;
        self.ensure_mutable()?;
        self.limit = Some(count);
        Ok(self)
    }

    /// `LIMIT :limit, :offset`
    pub fn limit_offset(mut self, count: u64, offset: u64) -> Result<Self> {
        self.ensure_select("LIMIT")?;
        self.ensure_mutable()?;
        self.limit = Some(count);
        self.offset = Some(offset);
        Ok(self)
    }

    pub fn inner_join(self, table: &str, on: &str) -> Result<Self> {
        self.join(JoinType::Inner, table, on)
    }

    pub fn left_join(self, table: &str, on: &str) -> Result<Self> {
        self.join(JoinType::Left, table, on)
    }

    pub fn right_join(self, table: &str, on: &str) -> Result<Self> {
        self.join(JoinType::Right, table, on)
    }

    pub fn full_join(self, table: &str, on: &str) -> Result<Self> {
        self.join(JoinType::Full, table, on)
    }

    fn join(mut self, join_type: JoinType, table: &str, on: &str) -> Result<Self> {
        self.ensure_select("JOIN")?;
        self.ensure_mutable()?;
        if is_blank(table) || is_blank(on) {
            return Err(Error::contract_violation(
                "JOIN requires a table and an ON condition",
            ));
        }
        let fragment = concat(" ", [join_type.to_string().as_str(), table, "ON", on]);
        self.joins.push(fragment);
        Ok(self)
    }

    /// Append `UNION <other>`; the nested statement loses its ORDER BY and
    /// LIMIT when rendered
    pub fn union(self, other: Statement) -> Result<Self> {
        self.append_union(UnionKind::Distinct, other)
    }

    /// Append `UNION ALL <other>`
    pub fn union_all(self, other: Statement) -> Result<Self> {
        self.append_union(UnionKind::All, other)
    }

    fn append_union(mut self, kind: UnionKind, other: Statement) -> Result<Self> {
        self.ensure_select(&kind.to_string())?;
        if other.operation != Operation::Select {
            return Err(Error::contract_violation(format!(
                "{} requires a SELECT on both sides, got {}",
                kind, other.operation
            )));
        }
        self.ensure_mutable()?;
        self.unions.push((kind, other));
        Ok(self)
    }

    /// The SQL text with its `:name` markers, rendered on first access and
    /// cached afterwards
    pub fn statement(&self) -> Result<&str> {
        if let Some(sql) = self.cached.get() {
            return Ok(sql);
        }
        let sql = self.render()?;
        debug!(target: "rdb", operation = %self.operation, table = %self.table, sql = %sql, "statement materialized");
        Ok(self.cached.get_or_init(|| sql))
    }

    /// Every name → value pair bound when this statement runs. For an insert
    /// these are the markers of the first row; see
    /// [`Statement::batch_bindings`].
    pub fn bindings(&self) -> Result<Bindings> {
        match &self.payload {
            Payload::Batch(_) => self
                .batch_bindings()?
                .into_iter()
                .next()
                .ok_or_else(|| Error::contract_violation("INSERT batch is empty")),
            _ => self.bind_values(),
        }
    }

    /// One set of bindings per inserted row; fails when the batch is not
    /// square
    pub fn batch_bindings(&self) -> Result<Vec<Bindings>> {
        let Payload::Batch(rows) = &self.payload else {
            return Err(Error::usage(format!(
                "batch bindings only exist for INSERT, not {}",
                self.operation
            )));
        };
        let amount = crate::util::square_len(rows)
            .filter(|amount| *amount > 0)
            .ok_or_else(|| {
                Error::contract_violation(format!(
                    "INSERT into {} needs the same, non-zero number of values for every column",
                    self.table
                ))
            })?;
        (0..amount)
            .map(|index| {
                let mut bindings = Bindings::new();
                for (column, values) in self.columns.iter().zip(rows) {
                    let value = &values[index];
                    crate::driver::Bind::bind(
                        &mut bindings,
                        &crate::util::marker_fragment(column),
                        value,
                        value.bind_kind(),
                    )?;
                }
                Ok(bindings)
            })
            .collect()
    }

    pub fn operation(&self) -> Operation {
        self.operation
    }

    pub fn table(&self) -> &str {
        &self.table
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Number of predicates registered across every group (chains count once)
    pub fn predicate_count(&self) -> usize {
        self.groups.iter().map(Vec::len).sum()
    }

    pub fn is_materialized(&self) -> bool {
        self.cached.get().is_some()
    }

    pub(crate) fn take_sequence(&mut self) -> usize {
        let sequence = self.next_sequence;
        self.next_sequence += 1;
        sequence
    }

    pub(crate) fn push_predicate(&mut self, predicate: Predicate) -> Result<()> {
        self.ensure_mutable()?;
        if matches!(self.operation, Operation::Insert | Operation::Check | Operation::Drop | Operation::Truncate | Operation::Show) {
            return Err(Error::contract_violation(format!(
                "WHERE is not supported on {}",
                self.operation
            )));
        }
        if let Some(Operand::SubQuery(query)) = predicate.operands.first() {
            debug!(target: "rdb", column = %predicate.column, nested = %query.table, "subquery condition registered");
        }
        while self.groups.len() <= self.group_pointer {
            self.groups.push(Vec::new());
        }
        self.groups[self.group_pointer].push(predicate);
        Ok(())
    }

    pub(crate) fn ensure_mutable(&self) -> Result<()> {
        if self.is_materialized() {
            return Err(Error::usage(format!(
                "{} on {} was already materialized and can no longer change",
                self.operation, self.table
            )));
        }
        Ok(())
    }

    fn ensure_select(&self, clause: &str) -> Result<()> {
        if self.operation != Operation::Select {
            return Err(Error::contract_violation(format!(
                "{} is only valid on select, not {}",
                clause, self.operation
            )));
        }
        Ok(())
    }

    fn current_group_len(&self) -> usize {
        self.groups.get(self.group_pointer).map_or(0, Vec::len)
    }
}

fn require_table(table: &str) -> Result<()> {
    if is_blank(table) {
        return Err(Error::contract_violation("a table name is required"));
    }
    Ok(())
}
