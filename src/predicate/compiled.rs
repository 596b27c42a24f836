//! Runtime predicates produced by the compiler.

use crate::expression::Joiner;
use crate::filter::{Operand, Subject};
use serde::Serialize;
use std::fmt;
use std::sync::Arc;

/// Operator constant carried by a compiled predicate.
///
/// The negated forms of `=`, `LIKE`, `IN` and `BETWEEN` are constants of
/// their own; ordering comparisons and NULL checks are negated through
/// `Predicate::negate`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum PredicateOperator {
    Eq,
    NotEq,
    Gt,
    Ge,
    Lt,
    Le,
    Like,
    NotLike,
    In,
    NotIn,
    Between,
    NotBetween,
    IsNull,
    IsNotNull,
}

impl PredicateOperator {
    pub const ALL: [PredicateOperator; 14] = [
        PredicateOperator::Eq,
        PredicateOperator::NotEq,
        PredicateOperator::Gt,
        PredicateOperator::Ge,
        PredicateOperator::Lt,
        PredicateOperator::Le,
        PredicateOperator::Like,
        PredicateOperator::NotLike,
        PredicateOperator::In,
        PredicateOperator::NotIn,
        PredicateOperator::Between,
        PredicateOperator::NotBetween,
        PredicateOperator::IsNull,
        PredicateOperator::IsNotNull,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            PredicateOperator::Eq => "=",
            PredicateOperator::NotEq => "<>",
            PredicateOperator::Gt => ">",
            PredicateOperator::Ge => ">=",
            PredicateOperator::Lt => "<",
            PredicateOperator::Le => "<=",
            PredicateOperator::Like => "LIKE",
            PredicateOperator::NotLike => "NOT LIKE",
            PredicateOperator::In => "IN",
            PredicateOperator::NotIn => "NOT IN",
            PredicateOperator::Between => "BETWEEN",
            PredicateOperator::NotBetween => "NOT BETWEEN",
            PredicateOperator::IsNull => "IS NULL",
            PredicateOperator::IsNotNull => "IS NOT NULL",
        }
    }
}

impl fmt::Display for PredicateOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

type TestFn<K> = Arc<dyn Fn(&K) -> bool + Send + Sync>;

/// Boolean test over values of `K`
pub struct Predicate<K> {
    operator: PredicateOperator,
    subject: Subject,
    values: Vec<Operand>,
    negated: bool,
    test: TestFn<K>,
}

impl<K> Predicate<K> {
    pub fn new<F>(operator: PredicateOperator, subject: Subject, values: Vec<Operand>, test: F) -> Self
    where
        F: Fn(&K) -> bool + Send + Sync + 'static,
    {
        Self {
            operator,
            subject,
            values,
            negated: false,
            test: Arc::new(test),
        }
    }

    pub fn operator(&self) -> PredicateOperator {
        self.operator
    }

    pub fn subject(&self) -> &Subject {
        &self.subject
    }

    pub fn values(&self) -> &[Operand] {
        &self.values
    }

    /// Whether the predicate is wrapped in a negation
    pub fn is_negated(&self) -> bool {
        self.negated
    }

    /// Wrap the predicate so that it returns the opposite result
    pub fn negate(mut self) -> Self {
        self.negated = !self.negated;
        self
    }

    pub fn test(&self, item: &K) -> bool {
        (self.test)(item) != self.negated
    }
}

impl<K> Clone for Predicate<K> {
    fn clone(&self) -> Self {
        Self {
            operator: self.operator,
            subject: self.subject.clone(),
            values: self.values.clone(),
            negated: self.negated,
            test: Arc::clone(&self.test),
        }
    }
}

impl<K> fmt::Debug for Predicate<K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Predicate")
            .field("operator", &self.operator)
            .field("subject", &self.subject)
            .field("values", &self.values)
            .field("negated", &self.negated)
            .finish()
    }
}

impl<K> fmt::Display for Predicate<K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.negated {
            f.write_str("NOT ")?;
        }
        write!(f, "{} {}", self.subject, self.operator)?;
        for (i, value) in self.values.iter().enumerate() {
            let sep = match (self.operator, i) {
                (PredicateOperator::Between | PredicateOperator::NotBetween, 1) => " AND ",
                (_, 0) => " ",
                _ => ", ",
            };
            write!(f, "{}{}", sep, value)?;
        }
        Ok(())
    }
}

/// A whole filter: predicates joined left to right by AND/OR
pub struct CompiledFilter<K> {
    clauses: Vec<(Joiner, Predicate<K>)>,
}

impl<K> CompiledFilter<K> {
    pub fn new(clauses: Vec<(Joiner, Predicate<K>)>) -> Self {
        Self { clauses }
    }

    pub fn clauses(&self) -> &[(Joiner, Predicate<K>)] {
        &self.clauses
    }

    pub fn len(&self) -> usize {
        self.clauses.len()
    }

    pub fn is_empty(&self) -> bool {
        self.clauses.is_empty()
    }

    /// Evaluate the left-associative chain; an empty filter matches everything
    pub fn matches(&self, item: &K) -> bool {
        let mut clauses = self.clauses.iter();
        let mut result = match clauses.next() {
            Some((_, predicate)) => predicate.test(item),
            None => return true,
        };
        for (joiner, predicate) in clauses {
            result = match joiner {
                Joiner::Or => result || predicate.test(item),
                Joiner::And | Joiner::None => result && predicate.test(item),
            };
        }
        result
    }

    /// Items that satisfy the filter, in input order
    pub fn filter<'a, I>(&self, items: I) -> Vec<&'a K>
    where
        I: IntoIterator<Item = &'a K>,
        K: 'a,
    {
        items.into_iter().filter(|item| self.matches(item)).collect()
    }
}

impl<K> Clone for CompiledFilter<K> {
    fn clone(&self) -> Self {
        Self {
            clauses: self.clauses.clone(),
        }
    }
}

impl<K> fmt::Debug for CompiledFilter<K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.clauses.iter()).finish()
    }
}
