//! WHERE predicates and the pending condition returned by `begin_condition`

use std::cmp::Ordering;

use tracing::warn;

use super::common::Operation;
use super::statement::Statement;
use crate::operator::{Connective, IntoComparator};
use crate::util::is_blank;
use crate::{Error, Result, Value};

/// Marker substituted by a placeholder or a nested statement when rendering
pub(crate) const SLOT: &str = "%s";

/// What fills one slot of a predicate template
#[derive(Debug, Clone)]
pub enum Operand {
    Scalar(Value),
    SubQuery(Box<Statement>),
}

/// One `column <template>` condition, optionally chained to further
/// conditions through a single connective
#[derive(Debug, Clone)]
pub struct Predicate {
    pub(crate) column: String,
    pub(crate) sequence: usize,
    pub(crate) template: String,
    pub(crate) operands: Vec<Operand>,
    pub(crate) chain: Option<(Connective, Box<Predicate>)>,
}

impl Predicate {
    pub(crate) fn new(column: &str, template: String, operands: Vec<Operand>) -> Self {
        Self {
            column: column.to_string(),
            sequence: 0,
            template,
            operands,
            chain: None,
        }
    }

    /// Build a standalone `column <comparator> value` predicate, to be chained
    /// with [`Predicate::and`] / [`Predicate::or`] and registered with
    /// [`Statement::add_predicate`]
    pub fn compare<C, V>(column: &str, comparator: C, value: V) -> Result<Self>
    where
        C: IntoComparator,
        V: Into<Value>,
    {
        let comparator = comparator.into_comparator()?;
        Ok(Self::new(
            column,
            format!("{} {}", comparator, SLOT),
            vec![Operand::Scalar(value.into())],
        ))
    }

    /// Chain `next` with AND
    pub fn and(self, next: Predicate) -> Result<Self> {
        self.link(Connective::And, next)
    }

    /// Chain `next` with OR
    pub fn or(self, next: Predicate) -> Result<Self> {
        self.link(Connective::Or, next)
    }

    pub fn column(&self) -> &str {
        &self.column
    }

    /// Index handed out by the owning statement; 0 until registered
    pub fn sequence(&self) -> usize {
        self.sequence
    }

    pub fn template(&self) -> &str {
        &self.template
    }

    pub fn operands(&self) -> &[Operand] {
        &self.operands
    }

    /// The connective shared by the whole chain, if there is one
    pub fn connective(&self) -> Option<Connective> {
        self.chain.as_ref().map(|(connective, _)| *connective)
    }

    pub fn is_chained(&self) -> bool {
        self.chain.is_some()
    }

    fn link(self, connective: Connective, next: Predicate) -> Result<Self> {
        for existing in [self.connective(), next.connective()].into_iter().flatten() {
            if existing != connective {
                return Err(Error::contract_violation(format!(
                    "cannot chain with {} a predicate already chained with {}",
                    connective, existing
                )));
            }
        }
        Ok(self.append(connective, next))
    }

    fn append(self, connective: Connective, next: Predicate) -> Self {
        let Predicate {
            column,
            sequence,
            template,
            operands,
            chain,
        } = self;
        let chain = match chain {
            Some((existing, tail)) => Some((existing, Box::new(tail.append(connective, next)))),
            None => Some((connective, Box::new(next))),
        };
        Predicate {
            column,
            sequence,
            template,
            operands,
            chain,
        }
    }

    /// Give every link of the chain its own index from `counter`
    pub(crate) fn assign_sequence(&mut self, counter: &mut usize) {
        self.sequence = *counter;
        *counter += 1;
        if let Some((_, next)) = &mut self.chain {
            next.assign_sequence(counter);
        }
    }
}

/// Values accepted by `in_` / `not_in`: a literal list or a nested SELECT
#[derive(Debug, Clone)]
pub enum InList {
    Values(Vec<Value>),
    Query(Box<Statement>),
}

impl<T: Into<Value>> From<Vec<T>> for InList {
    fn from(values: Vec<T>) -> Self {
        InList::Values(values.into_iter().map(Into::into).collect())
    }
}

impl<T: Into<Value> + Clone> From<&[T]> for InList {
    fn from(values: &[T]) -> Self {
        InList::Values(values.iter().cloned().map(Into::into).collect())
    }
}

impl<T: Into<Value>, const N: usize> From<[T; N]> for InList {
    fn from(values: [T; N]) -> Self {
        InList::Values(values.into_iter().map(Into::into).collect())
    }
}

impl From<Statement> for InList {
    fn from(query: Statement) -> Self {
        InList::Query(Box::new(query))
    }
}

/// A condition that has a column but no comparison yet.
///
/// It owns the statement it was started from; exactly one finalizer consumes
/// it and hands the statement back. Finalizers given a blank value, an empty
/// list or an invalid range register nothing and return the statement as it
/// was.
#[must_use = "a pending condition is only registered once a finalizer is called"]
#[derive(Debug)]
pub struct ConditionBuilder {
    statement: Statement,
    column: String,
    sequence: usize,
}

impl ConditionBuilder {
    pub(crate) fn new(statement: Statement, column: &str, sequence: usize) -> Self {
        Self {
            statement,
            column: column.to_string(),
            sequence,
        }
    }

    /// `column LIKE 'value%'`
    pub fn start_with(self, value: &str) -> Result<Statement> {
        self.like(value, format!("{}%", value))
    }

    /// `column LIKE '%value%'`
    pub fn contains(self, value: &str) -> Result<Statement> {
        self.like(value, format!("%{}%", value))
    }

    /// `column LIKE '%value'`
    pub fn end_with(self, value: &str) -> Result<Statement> {
        self.like(value, format!("%{}", value))
    }

    /// `column IN (...)` over a list or a nested SELECT
    pub fn in_<L: Into<InList>>(self, list: L) -> Result<Statement> {
        self.membership("IN", list.into())
    }

    /// `column NOT IN (...)` over a list or a nested SELECT
    pub fn not_in<L: Into<InList>>(self, list: L) -> Result<Statement> {
        self.membership("NOT IN", list.into())
    }

    /// `column BETWEEN min AND max`, only applied when `max > min`
    pub fn between<A, B>(self, min: A, max: B) -> Result<Statement>
    where
        A: Into<Value>,
        B: Into<Value>,
    {
        self.range("BETWEEN", min.into(), max.into())
    }

    /// `column NOT BETWEEN min AND max`, only applied when `max > min`
    pub fn not_between<A, B>(self, min: A, max: B) -> Result<Statement>
    where
        A: Into<Value>,
        B: Into<Value>,
    {
        self.range("NOT BETWEEN", min.into(), max.into())
    }

    fn like(self, raw: &str, pattern: String) -> Result<Statement> {
        if is_blank(raw) {
            return self.skip("blank LIKE value");
        }
        self.finish(
            format!("LIKE {}", SLOT),
            vec![Operand::Scalar(Value::String(pattern))],
        )
    }

    fn membership(self, keyword: &str, list: InList) -> Result<Statement> {
        match list {
            InList::Values(values) if values.is_empty() => self.skip("empty IN list"),
            InList::Values(values) => {
                let slots = vec![SLOT; values.len()].join(", ");
                self.finish(
                    format!("{} ({})", keyword, slots),
                    values.into_iter().map(Operand::Scalar).collect(),
                )
            }
            InList::Query(query) => {
                if query.operation() != Operation::Select {
                    return Err(Error::contract_violation(format!(
                        "{} subquery must be a SELECT, got {}",
                        keyword,
                        query.operation()
                    )));
                }
                self.finish(
                    format!("{} ({})", keyword, SLOT),
                    vec![Operand::SubQuery(query)],
                )
            }
        }
    }

    fn range(self, keyword: &str, min: Value, max: Value) -> Result<Statement> {
        let ordered = matches!(max.partial_cmp(&min), Some(Ordering::Greater));
        if min.is_blank() || max.is_blank() || !ordered {
            return self.skip("blank or empty range");
        }
        self.finish(
            format!("{} {} AND {}", keyword, SLOT, SLOT),
            vec![Operand::Scalar(min), Operand::Scalar(max)],
        )
    }

    fn finish(self, template: String, operands: Vec<Operand>) -> Result<Statement> {
        let ConditionBuilder {
            mut statement,
            column,
            sequence,
        } = self;
        let mut predicate = Predicate::new(&column, template, operands);
        predicate.sequence = sequence;
        statement.push_predicate(predicate)?;
        Ok(statement)
    }

    fn skip(self, reason: &str) -> Result<Statement> {
        self.statement.ensure_mutable()?;
        warn!(target: "rdb", column = %self.column, reason, "condition dropped");
        Ok(self.statement)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::operator::Comparator;

    #[test]
    fn test_compare_builds_a_single_slot_template() {
        let predicate = Predicate::compare("age", ">", 10).unwrap();
        assert_eq!(predicate.column(), "age");
        assert_eq!(predicate.template(), "> %s");
        assert_eq!(predicate.operands().len(), 1);
        assert!(!predicate.is_chained());
    }

    #[test]
    fn test_compare_rejects_unknown_comparators() {
        let err = Predicate::compare("age", "LIKE", 10).unwrap_err();
        assert!(matches!(err, Error::ContractViolation { .. }));
    }

    #[test]
    fn test_chain_keeps_a_single_connective() {
        let chained = Predicate::compare("name", Comparator::Eq, "john")
            .unwrap()
            .or(Predicate::compare("name", Comparator::Eq, "marie").unwrap())
            .unwrap()
            .or(Predicate::compare("name", Comparator::Eq, "isac").unwrap())
            .unwrap();
        assert_eq!(chained.connective(), Some(Connective::Or));

        let err = chained
            .and(Predicate::compare("age", ">", 3).unwrap())
            .unwrap_err();
        assert!(err.to_string().contains("cannot chain with AND"));
    }

    #[test]
    fn test_chain_rejects_a_differently_chained_tail() {
        let tail = Predicate::compare("a", "=", 1)
            .unwrap()
            .and(Predicate::compare("b", "=", 2).unwrap())
            .unwrap();
        let err = Predicate::compare("c", "=", 3).unwrap().or(tail).unwrap_err();
        assert!(matches!(err, Error::ContractViolation { .. }));
    }

    #[test]
    fn test_assign_sequence_numbers_every_link() {
        let mut chained = Predicate::compare("a", "=", 1)
            .unwrap()
            .and(Predicate::compare("b", "=", 2).unwrap())
            .unwrap()
            .and(Predicate::compare("c", "=", 3).unwrap())
            .unwrap();
        let mut counter = 4;
        chained.assign_sequence(&mut counter);
        assert_eq!(counter, 7);
        assert_eq!(chained.sequence(), 4);
        let (_, second) = chained.chain.as_ref().unwrap();
        assert_eq!(second.sequence(), 5);
        let (_, third) = second.chain.as_ref().unwrap();
        assert_eq!(third.sequence(), 6);
    }

    #[test]
    fn test_in_list_conversions() {
        assert!(matches!(InList::from(vec![1, 2]), InList::Values(v) if v.len() == 2));
        assert!(matches!(InList::from(["a", "b", "c"]), InList::Values(v) if v.len() == 3));
        let slice: &[i64] = &[7];
        assert!(matches!(InList::from(slice), InList::Values(v) if v == vec![Value::I64(7)]));
    }
}
