//! SQL text generation and the matching bind traversal

use super::common::Operation;
use super::predicate::{Operand, Predicate, SLOT};
use super::statement::{Payload, Statement};
use crate::driver::{Bind, Bindings};
use crate::util::{concat, marker_fragment, prefix};
use crate::{Result, Value};

/// Walks a statement tree once, producing the SQL text and recording every
/// bound marker in the same order
struct Compiler {
    /// Nested statements seen so far; the k-th one gets the `sq<k>_` prefix
    scopes: usize,
    bindings: Bindings,
}

impl Compiler {
    fn new() -> Self {
        Self {
            scopes: 0,
            bindings: Bindings::new(),
        }
    }

    fn statement(&mut self, statement: &Statement, scope: &str, outermost: bool) -> Result<String> {
        let table = statement.table.as_str();
        let sql = match statement.operation {
            Operation::Show => format!("SHOW TABLES LIKE '{}'", table),
            Operation::Drop => format!("DROP TABLE {}", table),
            Operation::Truncate => format!("TRUNCATE TABLE {}", table),
            Operation::Check => {
                let structure = match &statement.payload {
                    Payload::Structure(fragments) => concat(", ", fragments),
                    _ => String::new(),
                };
                format!("CREATE TABLE {} ({})", table, structure)
            }
            Operation::Insert => {
                let markers = prefix(":", statement.columns.iter().map(|c| marker_fragment(c)));
                format!(
                    "INSERT INTO {} ({}) VALUES ({})",
                    table,
                    concat(", ", &statement.columns),
                    concat(", ", markers)
                )
            }
            Operation::Update => {
                let values: &[Value] = match &statement.payload {
                    Payload::Row(values) => values,
                    _ => &[],
                };
                let mut assignments = Vec::with_capacity(values.len());
                for (column, value) in statement.columns.iter().zip(values) {
                    let marker = marker_fragment(column);
                    self.bind(&marker, value)?;
                    assignments.push(format!("{} = :{}", column, marker));
                }
                let filter = self.filter(statement, scope)?;
                concat(
                    " ",
                    [format!("UPDATE {} SET", table), concat(", ", assignments), filter],
                )
            }
            Operation::Delete => {
                let filter = self.filter(statement, scope)?;
                concat(" ", [format!("DELETE FROM {}", table), filter])
            }
            Operation::Select => self.select(statement, scope, outermost)?,
        };
        Ok(sql)
    }

    fn select(&mut self, statement: &Statement, scope: &str, outermost: bool) -> Result<String> {
        let mut parts = vec![
            "SELECT".to_string(),
            concat(", ", &statement.columns),
            "FROM".to_string(),
            statement.table.clone(),
        ];
        parts.extend(statement.joins.iter().cloned());
        parts.push(self.filter(statement, scope)?);
        for (kind, other) in &statement.unions {
            let nested = self.nested(other)?;
            parts.push(format!("{} {}", kind, nested));
        }
        if outermost {
            if let Some(order) = &statement.order_by {
                parts.push(format!("ORDER BY {}", order));
            }
            match (statement.limit, statement.offset) {
                (Some(limit), Some(offset)) => {
                    self.bind("limit", &Value::from(clamp(limit)))?;
                    self.bind("offset", &Value::from(clamp(offset)))?;
                    parts.push("LIMIT :limit, :offset".to_string());
                }
                (Some(limit), None) => {
                    self.bind("limit", &Value::from(clamp(limit)))?;
                    parts.push("LIMIT :limit".to_string());
                }
                _ => {}
            }
        }
        Ok(concat(" ", parts))
    }

    /// Render a statement embedded in another one under a fresh scope
    fn nested(&mut self, statement: &Statement) -> Result<String> {
        self.scopes += 1;
        let scope = format!("sq{}_", self.scopes);
        self.statement(statement, &scope, false)
    }

    /// `WHERE ...`, or nothing when every group is empty
    fn filter(&mut self, statement: &Statement, scope: &str) -> Result<String> {
        let mut groups = Vec::new();
        for group in statement.groups.iter().filter(|group| !group.is_empty()) {
            let mut rendered = Vec::with_capacity(group.len());
            for predicate in group {
                rendered.push(self.chain(predicate, scope)?);
            }
            let joined = rendered.join(" AND ");
            groups.push(if rendered.len() > 1 {
                format!("({})", joined)
            } else {
                joined
            });
        }
        if groups.is_empty() {
            return Ok(String::new());
        }
        Ok(format!("WHERE {}", groups.join(" OR ")))
    }

    fn chain(&mut self, predicate: &Predicate, scope: &str) -> Result<String> {
        let Some(connective) = predicate.connective() else {
            return self.predicate(predicate, scope);
        };
        let mut links = Vec::new();
        let mut current = Some(predicate);
        while let Some(link) = current {
            links.push(self.predicate(link, scope)?);
            current = link.chain.as_ref().map(|(_, next)| next.as_ref());
        }
        Ok(format!("({})", links.join(&format!(" {} ", connective))))
    }

    fn predicate(&mut self, predicate: &Predicate, scope: &str) -> Result<String> {
        let base = format!(
            "{}{}_{}",
            scope,
            marker_fragment(&predicate.column),
            predicate.sequence
        );
        let mut pieces = predicate.template.split(SLOT);
        let mut body = pieces.next().unwrap_or_default().to_string();
        for (position, operand) in predicate.operands.iter().enumerate() {
            match operand {
                Operand::Scalar(value) => {
                    let name = format!("{}_{}", base, position);
                    self.bind(&name, value)?;
                    body.push(':');
                    body.push_str(&name);
                }
                Operand::SubQuery(query) => body.push_str(&self.nested(query)?),
            }
            body.push_str(pieces.next().unwrap_or_default());
        }
        Ok(format!("{} {}", predicate.column, body))
    }

    fn bind(&mut self, name: &str, value: &Value) -> Result<()> {
        self.bindings.bind(name, value, value.bind_kind())
    }
}

fn clamp(count: u64) -> i64 {
    i64::try_from(count).unwrap_or(i64::MAX)
}

impl Statement {
    /// Render the full SQL text; markers are checked for uniqueness on the way
    pub(crate) fn render(&self) -> Result<String> {
        Compiler::new().statement(self, "", true)
    }

    /// Every marker of the WHERE tree, the SET list and the outer LIMIT, in
    /// the order they appear in the text
    pub(crate) fn bind_values(&self) -> Result<Bindings> {
        let mut compiler = Compiler::new();
        compiler.statement(self, "", true)?;
        Ok(compiler.bindings)
    }
}
