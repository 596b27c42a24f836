use crate::config::FilterConfig;
use crate::expression::{FilterResult, OperatorKind};
use crate::filter::{FlattenedGroup, Term};
use crate::predicate::compiled::{CompiledFilter, Predicate, PredicateOperator};
use crate::predicate::record::Record;
use crate::predicate::registry::PredicateRegistry;
use log::debug;

/// Map a term's operator and negation flag to the predicate operator constant
/// and whether the constructed predicate must be wrapped in `negate()`.
///
/// `=`, `<>`, `LIKE`, `IN` and `BETWEEN` switch to their opposite constant;
/// ordering comparisons and NULL checks keep the positive constant and are
/// wrapped instead.
pub fn resolve_operator(kind: OperatorKind, negated: bool) -> (PredicateOperator, bool) {
    match (kind, negated) {
        (OperatorKind::Eq, false) | (OperatorKind::Ne, true) => (PredicateOperator::Eq, false),
        (OperatorKind::Eq, true) | (OperatorKind::Ne, false) => (PredicateOperator::NotEq, false),
        (OperatorKind::Like, false) => (PredicateOperator::Like, false),
        (OperatorKind::Like, true) => (PredicateOperator::NotLike, false),
        (OperatorKind::In, false) => (PredicateOperator::In, false),
        (OperatorKind::In, true) => (PredicateOperator::NotIn, false),
        (OperatorKind::Between, false) => (PredicateOperator::Between, false),
        (OperatorKind::Between, true) => (PredicateOperator::NotBetween, false),
        (OperatorKind::Gt, wrap) => (PredicateOperator::Gt, wrap),
        (OperatorKind::Ge, wrap) => (PredicateOperator::Ge, wrap),
        (OperatorKind::Lt, wrap) => (PredicateOperator::Lt, wrap),
        (OperatorKind::Le, wrap) => (PredicateOperator::Le, wrap),
        (OperatorKind::IsNull, wrap) => (PredicateOperator::IsNull, wrap),
        (OperatorKind::IsNotNull, wrap) => (PredicateOperator::IsNotNull, wrap),
    }
}

/// Turns extracted terms into predicates over `K`
pub struct PredicateCompiler<K> {
    registry: PredicateRegistry<K>,
}

impl<K: Record + 'static> PredicateCompiler<K> {
    pub fn new() -> Self {
        Self::with_config(&FilterConfig::default())
    }

    pub fn with_config(config: &FilterConfig) -> Self {
        Self {
            registry: PredicateRegistry::standard(config),
        }
    }
}

impl<K: Record + 'static> Default for PredicateCompiler<K> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K> PredicateCompiler<K> {
    pub fn with_registry(registry: PredicateRegistry<K>) -> Self {
        Self { registry }
    }

    pub fn registry_mut(&mut self) -> &mut PredicateRegistry<K> {
        &mut self.registry
    }

    pub fn compile(&self, term: &Term) -> FilterResult<Predicate<K>> {
        let (operator, wrap) = resolve_operator(term.operator, term.negated);
        let predicate = self.registry.create(operator, &term.subject, &term.values)?;
        debug!(
            "compiled '{}' to {}{}",
            term,
            operator,
            if wrap { " (negated)" } else { "" }
        );
        Ok(if wrap { predicate.negate() } else { predicate })
    }

    pub fn compile_groups(&self, groups: &[FlattenedGroup]) -> FilterResult<CompiledFilter<K>> {
        let clauses = groups
            .iter()
            .map(|group| Ok((group.joiner, self.compile(&group.term)?)))
            .collect::<FilterResult<Vec<_>>>()?;
        Ok(CompiledFilter::new(clauses))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expression::{ExpressionNode, Literal};
    use crate::filter::{extract_term, flatten};

    #[derive(Debug, PartialEq)]
    struct Order {
        id: i64,
        status: Option<String>,
        total: f64,
    }

    impl Record for Order {
        fn field_names() -> &'static [&'static str] {
            &["id", "status", "total"]
        }

        fn field(&self, name: &str) -> Option<Literal> {
            match name {
                "id" => Some(Literal::Long(self.id)),
                "status" => Some(match &self.status {
                    Some(s) => Literal::String(s.clone()),
                    None => Literal::Null,
                }),
                "total" => Some(Literal::Double(self.total)),
                _ => None,
            }
        }
    }

    fn orders() -> Vec<Order> {
        vec![
            Order {
                id: 1,
                status: Some("open".to_string()),
                total: 10.0,
            },
            Order {
                id: 2,
                status: Some("closed".to_string()),
                total: 99.5,
            },
            Order {
                id: 3,
                status: None,
                total: 42.0,
            },
        ]
    }

    #[test]
    fn test_resolve_operator() {
        assert_eq!(
            resolve_operator(OperatorKind::Eq, true),
            (PredicateOperator::NotEq, false)
        );
        assert_eq!(
            resolve_operator(OperatorKind::Ne, true),
            (PredicateOperator::Eq, false)
        );
        assert_eq!(
            resolve_operator(OperatorKind::Between, true),
            (PredicateOperator::NotBetween, false)
        );
        assert_eq!(
            resolve_operator(OperatorKind::Gt, true),
            (PredicateOperator::Gt, true)
        );
        assert_eq!(
            resolve_operator(OperatorKind::IsNotNull, true),
            (PredicateOperator::IsNotNull, true)
        );
        assert_eq!(
            resolve_operator(OperatorKind::Le, false),
            (PredicateOperator::Le, false)
        );
    }

    #[test]
    fn test_not_equals_flips_constant() -> FilterResult<()> {
        let term = extract_term(&ExpressionNode::not_expr(ExpressionNode::eq(
            ExpressionNode::column("id"),
            ExpressionNode::Long(1),
        )))?;
        let predicate = PredicateCompiler::<Order>::new().compile(&term)?;
        assert_eq!(predicate.operator(), PredicateOperator::NotEq);
        assert!(!predicate.is_negated());

        let matched: Vec<i64> = orders()
            .iter()
            .filter(|o| predicate.test(o))
            .map(|o| o.id)
            .collect();
        assert_eq!(matched, vec![2, 3]);
        Ok(())
    }

    #[test]
    fn test_not_greater_than_wraps() -> FilterResult<()> {
        let term = extract_term(&ExpressionNode::not_expr(ExpressionNode::gt(
            ExpressionNode::column("total"),
            ExpressionNode::Long(40),
        )))?;
        let predicate = PredicateCompiler::<Order>::new().compile(&term)?;
        assert_eq!(predicate.operator(), PredicateOperator::Gt);
        assert!(predicate.is_negated());

        let matched: Vec<i64> = orders()
            .iter()
            .filter(|o| predicate.test(o))
            .map(|o| o.id)
            .collect();
        assert_eq!(matched, vec![1]);
        Ok(())
    }

    #[test]
    fn test_null_semantics_differ_between_policies() -> FilterResult<()> {
        let compiler = PredicateCompiler::<Order>::new();
        // NOT status = 'open' uses NotEq, which never matches NULL
        let not_eq = compiler.compile(&extract_term(&ExpressionNode::not_expr(
            ExpressionNode::eq(ExpressionNode::column("status"), ExpressionNode::string("open")),
        ))?)?;
        let data = orders();
        assert!(!not_eq.test(&data[2]));

        // NOT status > 'a' wraps Gt, so NULL matches
        let not_gt = compiler.compile(&extract_term(&ExpressionNode::not_expr(
            ExpressionNode::gt(ExpressionNode::column("status"), ExpressionNode::string("a")),
        ))?)?;
        assert!(not_gt.test(&data[2]));
        Ok(())
    }

    #[test]
    fn test_compile_groups() -> FilterResult<()> {
        let tree = ExpressionNode::or(
            ExpressionNode::and(
                ExpressionNode::is_not_null(ExpressionNode::column("status")),
                ExpressionNode::lt(ExpressionNode::column("total"), ExpressionNode::Long(50)),
            ),
            ExpressionNode::eq(ExpressionNode::column("id"), ExpressionNode::Long(2)),
        );
        let compiled = PredicateCompiler::<Order>::new().compile_groups(&flatten(&tree)?)?;
        assert_eq!(compiled.len(), 3);

        let data = orders();
        let ids: Vec<i64> = compiled.filter(&data).iter().map(|o| o.id).collect();
        assert_eq!(ids, vec![1, 2]);
        Ok(())
    }

    #[test]
    fn test_unknown_field_fails_compilation() -> FilterResult<()> {
        let term = extract_term(&ExpressionNode::eq(
            ExpressionNode::column("customer"),
            ExpressionNode::Long(1),
        ))?;
        let err = PredicateCompiler::<Order>::new().compile(&term).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Field 'customer' cannot be resolved on Order"
        );
        Ok(())
    }

    #[test]
    fn test_registry_override() -> FilterResult<()> {
        let mut compiler = PredicateCompiler::<Order>::new();
        compiler
            .registry_mut()
            .register(PredicateOperator::NotEq, |subject, values| {
                Ok(Predicate::new(
                    PredicateOperator::NotEq,
                    subject.clone(),
                    values.to_vec(),
                    |_: &Order| false,
                ))
            });
        let term = extract_term(&ExpressionNode::ne(
            ExpressionNode::column("id"),
            ExpressionNode::Long(1),
        ))?;
        let predicate = compiler.compile(&term)?;
        assert!(orders().iter().all(|o| !predicate.test(o)));
        Ok(())
    }
}
