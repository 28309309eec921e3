//! Types shared by the statement builder and its predicates

use std::fmt;

/// The SQL operation a statement performs; fixed at construction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    Select,
    Insert,
    Update,
    Delete,
    /// Create the table unless it already exists
    Check,
    Drop,
    Truncate,
    /// Probe whether the table exists
    Show,
}

impl Operation {
    pub fn as_str(&self) -> &'static str {
        match self {
            Operation::Select => "select",
            Operation::Insert => "insert",
            Operation::Update => "update",
            Operation::Delete => "delete",
            Operation::Check => "check",
            Operation::Drop => "drop",
            Operation::Truncate => "truncate",
            Operation::Show => "show",
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Trait to convert various types into columns
pub trait IntoColumns {
    fn into_columns(self) -> Vec<String>;
}

impl IntoColumns for &str {
    fn into_columns(self) -> Vec<String> {
        vec![self.to_string()]
    }
}

impl IntoColumns for String {
    fn into_columns(self) -> Vec<String> {
        vec![self]
    }
}

impl IntoColumns for Vec<String> {
    fn into_columns(self) -> Vec<String> {
        self
    }
}

impl IntoColumns for Vec<&str> {
    fn into_columns(self) -> Vec<String> {
        self.into_iter().map(|s| s.to_string()).collect()
    }
}

impl IntoColumns for &[&str] {
    fn into_columns(self) -> Vec<String> {
        self.iter().map(|s| s.to_string()).collect()
    }
}

impl<const N: usize> IntoColumns for [&str; N] {
    fn into_columns(self) -> Vec<String> {
        self.iter().map(|s| s.to_string()).collect()
    }
}

// For tuples
impl IntoColumns for (&str, &str) {
    fn into_columns(self) -> Vec<String> {
        vec![self.0.to_string(), self.1.to_string()]
    }
}

impl IntoColumns for (&str, &str, &str) {
    fn into_columns(self) -> Vec<String> {
        vec![self.0.to_string(), self.1.to_string(), self.2.to_string()]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_into_columns_implementations() {
        assert_eq!("name".into_columns(), vec!["name"]);
        assert_eq!(("name", "age").into_columns(), vec!["name", "age"]);
        assert_eq!(vec!["name", "age"].into_columns(), vec!["name", "age"]);
        assert_eq!(["id", "name", "age"].into_columns(), vec!["id", "name", "age"]);
        let empty: [&str; 0] = [];
        assert!(empty.into_columns().is_empty());
    }

    #[test]
    fn test_operation_names() {
        assert_eq!(Operation::Select.to_string(), "select");
        assert_eq!(Operation::Truncate.as_str(), "truncate");
    }
}
