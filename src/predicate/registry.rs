//! Strategy table mapping operator constants to predicate constructors.

use crate::config::FilterConfig;
use crate::expression::{FilterError, FilterResult, Literal};
use crate::filter::{Operand, Subject};
use crate::predicate::compare::{compare_literals, literal_text, literals_equal};
use crate::predicate::compiled::{Predicate, PredicateOperator};
use crate::predicate::record::Record;
use log::trace;
use regex::{Regex, RegexBuilder};
use std::cmp::Ordering;
use std::collections::HashMap;
use std::sync::Arc;

/// Builds a predicate from a subject and its object values
pub type Strategy<K> =
    Box<dyn Fn(&Subject, &[Operand]) -> FilterResult<Predicate<K>> + Send + Sync>;

/// Predicate constructors keyed by operator constant
pub struct PredicateRegistry<K> {
    strategies: HashMap<PredicateOperator, Strategy<K>>,
}

impl<K> PredicateRegistry<K> {
    /// A registry with no strategies
    pub fn empty() -> Self {
        Self {
            strategies: HashMap::new(),
        }
    }

    /// Register (or replace) the strategy for an operator constant
    pub fn register<F>(&mut self, operator: PredicateOperator, strategy: F)
    where
        F: Fn(&Subject, &[Operand]) -> FilterResult<Predicate<K>> + Send + Sync + 'static,
    {
        self.strategies.insert(operator, Box::new(strategy));
    }

    pub fn contains(&self, operator: PredicateOperator) -> bool {
        self.strategies.contains_key(&operator)
    }

    /// Construct the predicate for `operator`
    pub fn create(
        &self,
        operator: PredicateOperator,
        subject: &Subject,
        values: &[Operand],
    ) -> FilterResult<Predicate<K>> {
        let strategy = self.strategies.get(&operator).ok_or_else(|| {
            FilterError::unsupported(format!("no predicate strategy registered for {}", operator))
        })?;
        strategy(subject, values)
    }
}

impl<K: Record + 'static> PredicateRegistry<K> {
    /// Registry with a strategy for every operator constant
    pub fn standard(config: &FilterConfig) -> Self {
        let formats: Arc<[String]> = config.date_formats.clone().into();
        let case_insensitive = config.case_insensitive_like;
        let mut registry = Self::empty();

        let orderings: [(PredicateOperator, fn(Ordering) -> bool); 6] = [
            (PredicateOperator::Eq, |o| o == Ordering::Equal),
            (PredicateOperator::NotEq, |o| o != Ordering::Equal),
            (PredicateOperator::Gt, |o| o == Ordering::Greater),
            (PredicateOperator::Ge, |o| o != Ordering::Less),
            (PredicateOperator::Lt, |o| o == Ordering::Less),
            (PredicateOperator::Le, |o| o != Ordering::Greater),
        ];
        for (operator, accept) in orderings {
            let formats = Arc::clone(&formats);
            registry.register(operator, move |subject, values| {
                comparison(operator, subject, values, Arc::clone(&formats), accept)
            });
        }

        for operator in [PredicateOperator::Like, PredicateOperator::NotLike] {
            registry.register(operator, move |subject, values| {
                like(operator, subject, values, case_insensitive)
            });
        }

        for operator in [PredicateOperator::In, PredicateOperator::NotIn] {
            let formats = Arc::clone(&formats);
            registry.register(operator, move |subject, values| {
                membership(operator, subject, values, Arc::clone(&formats))
            });
        }

        for operator in [PredicateOperator::Between, PredicateOperator::NotBetween] {
            let formats = Arc::clone(&formats);
            registry.register(operator, move |subject, values| {
                range(operator, subject, values, Arc::clone(&formats))
            });
        }

        for operator in [PredicateOperator::IsNull, PredicateOperator::IsNotNull] {
            registry.register(operator, move |subject, values| {
                null_check(operator, subject, values)
            });
        }

        registry
    }
}

/// Check that every column the predicate reads is declared by `K`
fn resolve_fields<K: Record>(subject: &Subject, values: &[Operand]) -> FilterResult<()> {
    let subject_column = match subject {
        Subject::Column(col) => Some(col),
        _ => None,
    };
    let value_columns = values.iter().filter_map(|value| match value {
        Operand::Column(col) => Some(col),
        Operand::Literal(_) => None,
    });

    for col in subject_column.into_iter().chain(value_columns) {
        if !K::has_field(&col.name) {
            return Err(FilterError::UnresolvedField {
                field: col.qualified_name(),
                target: K::type_name().to_string(),
            });
        }
    }
    Ok(())
}

fn subject_value<K: Record>(subject: &Subject, item: &K) -> Literal {
    let value = match subject {
        Subject::Column(col) => item.field(&col.name),
        Subject::Function { name, argument } => item.accessor(name, argument.as_ref()),
        Subject::Value(lit) => Some(lit.clone()),
    };
    value.unwrap_or(Literal::Null)
}

fn operand_value<K: Record>(operand: &Operand, item: &K) -> Literal {
    match operand {
        Operand::Literal(lit) => lit.clone(),
        Operand::Column(col) => item.field(&col.name).unwrap_or(Literal::Null),
    }
}

fn expect_values(
    operator: PredicateOperator,
    values: &[Operand],
    expected: usize,
) -> FilterResult<()> {
    if values.len() != expected {
        return Err(FilterError::unsupported(format!(
            "{} expects {} value(s), got {}",
            operator,
            expected,
            values.len()
        )));
    }
    Ok(())
}

fn comparison<K: Record + 'static>(
    operator: PredicateOperator,
    subject: &Subject,
    values: &[Operand],
    formats: Arc<[String]>,
    accept: fn(Ordering) -> bool,
) -> FilterResult<Predicate<K>> {
    resolve_fields::<K>(subject, values)?;
    expect_values(operator, values, 1)?;

    let lhs = subject.clone();
    let rhs = values[0].clone();
    Ok(Predicate::new(
        operator,
        subject.clone(),
        values.to_vec(),
        move |item: &K| {
            let left = subject_value(&lhs, item);
            let right = operand_value(&rhs, item);
            compare_literals(&left, &right, &formats).is_some_and(accept)
        },
    ))
}

/// Translate a SQL LIKE pattern into an anchored regular expression
pub fn like_to_regex(pattern: &str) -> String {
    let mut out = String::from("^");
    let mut literal = String::new();
    for c in pattern.chars() {
        match c {
            '%' | '_' => {
                out.push_str(&regex::escape(&literal));
                literal.clear();
                out.push_str(if c == '%' { ".*" } else { "." });
            }
            _ => literal.push(c),
        }
    }
    out.push_str(&regex::escape(&literal));
    out.push('$');
    out
}

fn like<K: Record + 'static>(
    operator: PredicateOperator,
    subject: &Subject,
    values: &[Operand],
    case_insensitive: bool,
) -> FilterResult<Predicate<K>> {
    resolve_fields::<K>(subject, values)?;
    expect_values(operator, values, 1)?;

    let pattern = match &values[0] {
        Operand::Literal(Literal::String(pattern)) => pattern,
        other => {
            return Err(FilterError::unsupported(format!(
                "LIKE pattern must be a string literal, found {}",
                other
            )))
        }
    };
    let regex: Regex = RegexBuilder::new(&like_to_regex(pattern))
        .case_insensitive(case_insensitive)
        .dot_matches_new_line(true)
        .build()
        .map_err(|e| FilterError::unsupported(format!("invalid LIKE pattern '{}': {}", pattern, e)))?;
    trace!("LIKE '{}' compiled to /{}/", pattern, regex.as_str());

    let expect_match = operator == PredicateOperator::Like;
    let lhs = subject.clone();
    Ok(Predicate::new(
        operator,
        subject.clone(),
        values.to_vec(),
        move |item: &K| {
            literal_text(&subject_value(&lhs, item))
                .is_some_and(|text| regex.is_match(&text) == expect_match)
        },
    ))
}

fn membership<K: Record + 'static>(
    operator: PredicateOperator,
    subject: &Subject,
    values: &[Operand],
    formats: Arc<[String]>,
) -> FilterResult<Predicate<K>> {
    resolve_fields::<K>(subject, values)?;
    if values.is_empty() {
        return Err(FilterError::unsupported(format!(
            "{} expects at least one value",
            operator
        )));
    }

    let expect_member = operator == PredicateOperator::In;
    let lhs = subject.clone();
    let list = values.to_vec();
    Ok(Predicate::new(
        operator,
        subject.clone(),
        values.to_vec(),
        move |item: &K| {
            let value = subject_value(&lhs, item);
            if value.is_null() {
                return false;
            }
            let found = list
                .iter()
                .any(|candidate| literals_equal(&value, &operand_value(candidate, item), &formats));
            found == expect_member
        },
    ))
}

fn range<K: Record + 'static>(
    operator: PredicateOperator,
    subject: &Subject,
    values: &[Operand],
    formats: Arc<[String]>,
) -> FilterResult<Predicate<K>> {
    resolve_fields::<K>(subject, values)?;
    expect_values(operator, values, 2)?;

    let inside = operator == PredicateOperator::Between;
    let lhs = subject.clone();
    let low = values[0].clone();
    let high = values[1].clone();
    Ok(Predicate::new(
        operator,
        subject.clone(),
        values.to_vec(),
        move |item: &K| {
            let value = subject_value(&lhs, item);
            let above_low = compare_literals(&value, &operand_value(&low, item), &formats);
            let below_high = compare_literals(&value, &operand_value(&high, item), &formats);
            match (above_low, below_high) {
                (Some(lo), Some(hi)) => {
                    (lo != Ordering::Less && hi != Ordering::Greater) == inside
                }
                _ => false,
            }
        },
    ))
}

fn null_check<K: Record + 'static>(
    operator: PredicateOperator,
    subject: &Subject,
    values: &[Operand],
) -> FilterResult<Predicate<K>> {
    resolve_fields::<K>(subject, values)?;
    expect_values(operator, values, 0)?;

    let expect_null = operator == PredicateOperator::IsNull;
    let lhs = subject.clone();
    Ok(Predicate::new(
        operator,
        subject.clone(),
        Vec::new(),
        move |item: &K| subject_value(&lhs, item).is_null() == expect_null,
    ))
}
