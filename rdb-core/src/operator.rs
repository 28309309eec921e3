//! Comparators, connectives and the other small vocabularies of a statement

use std::fmt::{self, Display};
use std::str::FromStr;

use crate::util::whitelist;
use crate::{Error, Result};

/// Comparators accepted by an inline condition
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Comparator {
    Eq,
    NotEq,
    Lt,
    /// `<>`, kept distinct from `!=` so the rendered text matches the input
    LtGt,
    Gt,
    LtEq,
    GtEq,
}

impl Comparator {
    /// Every comparator, in the order their symbols are whitelisted
    pub const ALL: [Comparator; 7] = [
        Comparator::Eq,
        Comparator::NotEq,
        Comparator::Lt,
        Comparator::LtGt,
        Comparator::Gt,
        Comparator::LtEq,
        Comparator::GtEq,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Comparator::Eq => "=",
            Comparator::NotEq => "!=",
            Comparator::Lt => "<",
            Comparator::LtGt => "<>",
            Comparator::Gt => ">",
            Comparator::LtEq => "<=",
            Comparator::GtEq => ">=",
        }
    }
}

impl Display for Comparator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Comparator {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let symbols = Comparator::ALL.map(|c| c.as_str());
        let symbol = whitelist(s.trim(), &symbols, None).map_err(|_| {
            Error::contract_violation(format!(
                "unknown comparator '{}', expected one of {}",
                s,
                symbols.join(" ")
            ))
        })?;
        Ok(Comparator::ALL[symbols.iter().position(|x| *x == symbol).unwrap_or(0)])
    }
}

/// Trait for values that can name a comparator
pub trait IntoComparator {
    fn into_comparator(self) -> Result<Comparator>;
}

impl IntoComparator for Comparator {
    fn into_comparator(self) -> Result<Comparator> {
        Ok(self)
    }
}

impl IntoComparator for &str {
    fn into_comparator(self) -> Result<Comparator> {
        self.parse()
    }
}

impl IntoComparator for String {
    fn into_comparator(self) -> Result<Comparator> {
        self.parse()
    }
}

/// Sort direction for ORDER BY clauses
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
    Asc,
    Desc,
    /// `RAND()`, replaces the whole ORDER BY expression
    Random,
}

impl SortDirection {
    pub fn as_str(&self) -> &'static str {
        match self {
            SortDirection::Asc => "ASC",
            SortDirection::Desc => "DESC",
            SortDirection::Random => "RAND()",
        }
    }
}

impl Display for SortDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for SortDirection {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim() {
            "ASC" => Ok(SortDirection::Asc),
            "DESC" => Ok(SortDirection::Desc),
            "RAND()" => Ok(SortDirection::Random),
            other => Err(Error::contract_violation(format!(
                "unknown sort direction '{}', expected ASC, DESC or RAND()",
                other
            ))),
        }
    }
}

/// Trait for values that can name a sort direction
pub trait IntoSortDirection {
    fn into_sort_direction(self) -> Result<SortDirection>;
}

impl IntoSortDirection for SortDirection {
    fn into_sort_direction(self) -> Result<SortDirection> {
        Ok(self)
    }
}

impl IntoSortDirection for &str {
    fn into_sort_direction(self) -> Result<SortDirection> {
        self.parse()
    }
}

/// JOIN types
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoinType {
    Inner,
    Left,
    Right,
    Full,
}

impl Display for JoinType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            JoinType::Inner => write!(f, "INNER JOIN"),
            JoinType::Left => write!(f, "LEFT JOIN"),
            JoinType::Right => write!(f, "RIGHT JOIN"),
            JoinType::Full => write!(f, "FULL JOIN"),
        }
    }
}

/// Boolean connective between two predicates of a chain
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Connective {
    And,
    Or,
}

impl Display for Connective {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Connective::And => write!(f, "AND"),
            Connective::Or => write!(f, "OR"),
        }
    }
}

/// How a nested SELECT is appended to the outer one
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnionKind {
    Distinct,
    All,
}

impl Display for UnionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UnionKind::Distinct => write!(f, "UNION"),
            UnionKind::All => write!(f, "UNION ALL"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_comparator_symbols() {
        assert_eq!(Comparator::Eq.as_str(), "=");
        assert_eq!(Comparator::NotEq.as_str(), "!=");
        assert_eq!(Comparator::LtGt.as_str(), "<>");
        assert_eq!(Comparator::GtEq.as_str(), ">=");
    }

    #[test]
    fn test_string_conversion() {
        assert_eq!(">".into_comparator().unwrap(), Comparator::Gt);
        assert_eq!("<>".into_comparator().unwrap(), Comparator::LtGt);
        assert_eq!(" <= ".into_comparator().unwrap(), Comparator::LtEq);
        assert_eq!(String::from("!=").into_comparator().unwrap(), Comparator::NotEq);
    }

    #[test]
    fn test_every_comparator_round_trips_through_its_symbol() {
        for comparator in Comparator::ALL {
            assert_eq!(comparator.as_str().parse::<Comparator>().unwrap(), comparator);
        }
    }

    #[test]
    fn test_unknown_comparator_is_rejected() {
        let err = "LIKE".into_comparator().unwrap_err();
        assert!(matches!(err, Error::ContractViolation { .. }));
        assert!(err.to_string().contains("unknown comparator 'LIKE'"));
        assert!("==".into_comparator().is_err());
        assert!("".into_comparator().is_err());
    }

    #[test]
    fn test_sort_directions() {
        assert_eq!("ASC".into_sort_direction().unwrap(), SortDirection::Asc);
        assert_eq!("RAND()".into_sort_direction().unwrap(), SortDirection::Random);
        assert_eq!(SortDirection::Desc.to_string(), "DESC");
        assert!("asc".into_sort_direction().is_err());
        assert!("SIDEWAYS".into_sort_direction().is_err());
    }

    #[test]
    fn test_join_and_union_keywords() {
        assert_eq!(JoinType::Inner.to_string(), "INNER JOIN");
        assert_eq!(JoinType::Full.to_string(), "FULL JOIN");
        assert_eq!(UnionKind::Distinct.to_string(), "UNION");
        assert_eq!(UnionKind::All.to_string(), "UNION ALL");
        assert_eq!(Connective::Or.to_string(), "OR");
    }
}
