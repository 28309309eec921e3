//! The contract a database driver fulfils, and the bind containers shared by
//! the builder and the drivers

use std::future::Future;

use crate::value::BindKind;
use crate::{Error, Result, Value};

/// Something named values can be bound to
pub trait Bind {
    fn bind(&mut self, name: &str, value: &Value, kind: BindKind) -> Result<()>;
}

/// A database handle able to prepare statements.
///
/// The handle is owned by the caller and passed to
/// [`Statement::execute`](crate::Statement::execute) explicitly.
pub trait Driver: Send + Sync {
    type Statement: PreparedStatement;

    fn prepare(&self, sql: &str) -> impl Future<Output = Result<Self::Statement>> + Send;
}

/// A prepared statement using `:name` markers.
///
/// Binding a name a second time replaces its value, so one statement can be
/// executed again with a new set of values.
pub trait PreparedStatement: Bind + Send {
    /// Run the statement with the values bound so far
    fn execute(&mut self) -> impl Future<Output = Result<bool>> + Send;

    /// The next row of the last execution, `None` once exhausted
    fn fetch_row(&mut self) -> impl Future<Output = Result<Option<Row>>> + Send;

    /// Id generated by the last executed insert
    fn last_insert_id(&self) -> Option<u64>;

    /// Rows returned or affected by the last execution
    fn row_count(&self) -> u64;
}

/// One named marker and the value bound to it
#[derive(Debug, Clone, PartialEq)]
pub struct Binding {
    pub name: String,
    pub value: Value,
    pub kind: BindKind,
}

/// Ordered name → value map of a statement's markers
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Bindings {
    entries: Vec<Binding>,
}

impl Bindings {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.find(name).map(|binding| &binding.value)
    }

    pub fn kind(&self, name: &str) -> Option<BindKind> {
        self.find(name).map(|binding| binding.kind)
    }

    /// Marker names in binding order
    pub fn names(&self) -> Vec<&str> {
        self.entries.iter().map(|binding| binding.name.as_str()).collect()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Binding> {
        self.entries.iter()
    }

    /// Bind `name`, overwriting any previous value
    pub fn replace(&mut self, name: &str, value: &Value, kind: BindKind) {
        let binding = Binding {
            name: name.to_string(),
            value: value.clone(),
            kind,
        };
        match self.entries.iter_mut().find(|existing| existing.name == name) {
            Some(existing) => *existing = binding,
            None => self.entries.push(binding),
        }
    }

    fn find(&self, name: &str) -> Option<&Binding> {
        self.entries.iter().find(|binding| binding.name == name)
    }
}

/// Collecting a statement's markers: every name may only appear once
impl Bind for Bindings {
    fn bind(&mut self, name: &str, value: &Value, kind: BindKind) -> Result<()> {
        if self.find(name).is_some() {
            return Err(Error::duplicate_parameter(name));
        }
        self.replace(name, value, kind);
        Ok(())
    }
}

impl<'a> IntoIterator for &'a Bindings {
    type Item = &'a Binding;
    type IntoIter = std::slice::Iter<'a, Binding>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

/// Rewrite `:name` markers into `?` and return the values in marker order.
///
/// Text inside single quotes is copied untouched. A marker with no bound
/// value is a usage error.
pub fn positional(sql: &str, bindings: &Bindings) -> Result<(String, Vec<Value>)> {
    let mut out = String::with_capacity(sql.len());
    let mut values = Vec::new();
    let mut quoted = false;
    let mut chars = sql.char_indices().peekable();

    while let Some((start, c)) = chars.next() {
        if c == '\'' {
            quoted = !quoted;
            out.push(c);
            continue;
        }
        let starts_marker = !quoted
            && c == ':'
            && chars
                .peek()
                .is_some_and(|(_, next)| next.is_ascii_alphanumeric() || *next == '_');
        if !starts_marker {
            out.push(c);
            continue;
        }

        let mut end = start + 1;
        while let Some((index, next)) = chars.peek() {
            if next.is_ascii_alphanumeric() || *next == '_' {
                end = index + next.len_utf8();
                chars.next();
            } else {
                break;
            }
        }
        let name = &sql[start + 1..end];
        let value = bindings
            .get(name)
            .ok_or_else(|| Error::usage(format!("no value bound for ':{}'", name)))?;
        out.push('?');
        values.push(value.clone());
    }

    Ok((out, values))
}

/// A fetched row: column names and their values, in select order
#[derive(Debug, Clone, PartialEq)]
pub struct Row {
    columns: Vec<String>,
    values: Vec<Value>,
}

impl Row {
    pub fn new(columns: Vec<String>, values: Vec<Value>) -> Self {
        Self { columns, values }
    }

    pub fn get(&self, column: &str) -> Option<&Value> {
        self.columns
            .iter()
            .position(|name| name == column)
            .and_then(|index| self.values.get(index))
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn values(&self) -> &[Value] {
        &self.values
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// The row as a JSON object keyed by column name
    pub fn to_json(&self) -> serde_json::Value {
        let object = self
            .columns
            .iter()
            .zip(&self.values)
            .map(|(column, value)| (column.clone(), value.to_json()))
            .collect();
        serde_json::Value::Object(object)
    }
}
