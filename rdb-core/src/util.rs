//! Small string and slice helpers used while assembling statements

use crate::{Error, Result};

/// Whether a string is empty once surrounding whitespace is removed
pub fn is_blank(value: &str) -> bool {
    value.trim().is_empty()
}

/// Join the non-blank parts with `separator`
pub fn concat<I, S>(separator: &str, parts: I) -> String
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut out = String::new();
    for part in parts {
        let part = part.as_ref();
        if is_blank(part) {
            continue;
        }
        if !out.is_empty() {
            out.push_str(separator);
        }
        out.push_str(part);
    }
    out
}

/// Return `value` if it is one of `allowed`, else `default`, else fail
pub fn whitelist<T>(value: T, allowed: &[T], default: Option<T>) -> Result<T>
where
    T: PartialEq + Copy + std::fmt::Debug,
{
    if allowed.contains(&value) {
        return Ok(value);
    }
    default.ok_or_else(|| {
        Error::contract_violation(format!("{:?} is not allowed here", value))
    })
}

/// Prepend `prefix` to every item
pub fn prefix<I, S>(prefix: &str, items: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    items
        .into_iter()
        .map(|item| format!("{}{}", prefix, item.as_ref()))
        .collect()
}

/// Length shared by every inner list, or `None` when the lists are ragged
/// or there are none
pub fn square_len<T>(rows: &[Vec<T>]) -> Option<usize> {
    let first = rows.first()?.len();
    rows.iter().all(|row| row.len() == first).then_some(first)
}

/// Reduce a column expression to characters legal in a bind marker name
pub fn marker_fragment(column: &str) -> String {
    column
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '_' { c } else { '_' })
        .collect()
}
