//! Flattening of a left-deep AND/OR tree into an ordered term sequence.

use crate::config::FilterConfig;
use crate::expression::{ExpressionNode, FilterError, FilterResult, Joiner, OperatorKind};
use crate::filter::term::{Operand, Subject, Term, TermExtractor};
use log::debug;
use serde::Serialize;
use std::fmt;

/// A term together with the keyword joining it to the terms before it
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FlattenedGroup {
    pub joiner: Joiner,
    pub term: Term,
}

impl fmt::Display for FlattenedGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.joiner {
            Joiner::None => write!(f, "{}", self.term),
            joiner => write!(f, "{} {}", joiner, self.term),
        }
    }
}

/// Walks the left spine of an AND/OR tree.
///
/// Each combinator contributes its right child (which must be a leaf) under
/// its own joiner; the leaf at the bottom of the spine gets `Joiner::None`.
/// Groups are discovered right to left and reversed before returning.
pub struct Flattener<'a> {
    extractor: TermExtractor<'a>,
}

impl<'a> Flattener<'a> {
    pub fn new(config: &'a FilterConfig) -> Self {
        Self {
            extractor: TermExtractor::new(config),
        }
    }

    pub fn flatten(&self, root: &ExpressionNode) -> FilterResult<Vec<FlattenedGroup>> {
        let mut groups = Vec::new();
        self.descend(root, Joiner::None, &mut groups)?;
        groups.reverse();
        debug!("flattened '{}' into {} group(s)", root, groups.len());
        Ok(groups)
    }

    fn descend(
        &self,
        node: &ExpressionNode,
        joiner: Joiner,
        groups: &mut Vec<FlattenedGroup>,
    ) -> FilterResult<()> {
        let (pending, left, right) = match node {
            ExpressionNode::And(left, right) => (Joiner::And, left, right),
            ExpressionNode::Or(left, right) => (Joiner::Or, left, right),
            leaf => {
                groups.push(FlattenedGroup {
                    joiner,
                    term: self.extractor.extract(leaf)?,
                });
                return Ok(());
            }
        };

        if right.is_combinator() {
            return Err(FilterError::unsupported(format!(
                "nested {} on the right-hand side of {} is not supported",
                right.describe(),
                pending
            )));
        }

        groups.push(FlattenedGroup {
            joiner: pending,
            term: self.extractor.extract(right)?,
        });
        self.descend(left, joiner, groups)
    }
}

/// Flatten a filter expression with the default configuration
pub fn flatten(root: &ExpressionNode) -> FilterResult<Vec<FlattenedGroup>> {
    Flattener::new(&FilterConfig::default()).flatten(root)
}

/// Rebuild the leaf node a term was extracted from.
///
/// Arithmetic and function values come back as their reduced literals, so
/// extracting the rebuilt node yields the same term.
pub fn term_to_node(term: &Term) -> ExpressionNode {
    let subject = match &term.subject {
        Subject::Column(col) => ExpressionNode::Column(col.clone()),
        Subject::Function { name, argument } => ExpressionNode::Function {
            name: name.clone(),
            args: argument.iter().map(ExpressionNode::from_literal).collect(),
        },
        Subject::Value(lit) => ExpressionNode::from_literal(lit),
    };

    let mut values: Vec<ExpressionNode> = term
        .values
        .iter()
        .map(|value| match value {
            Operand::Literal(lit) => ExpressionNode::from_literal(lit),
            Operand::Column(col) => ExpressionNode::Column(col.clone()),
        })
        .collect();

    let single = |values: &mut Vec<ExpressionNode>| values.pop().unwrap_or(ExpressionNode::Null);

    let leaf = match term.operator {
        OperatorKind::Eq => ExpressionNode::eq(subject, single(&mut values)),
        OperatorKind::Ne => ExpressionNode::ne(subject, single(&mut values)),
        OperatorKind::Gt => ExpressionNode::gt(subject, single(&mut values)),
        OperatorKind::Ge => ExpressionNode::ge(subject, single(&mut values)),
        OperatorKind::Lt => ExpressionNode::lt(subject, single(&mut values)),
        OperatorKind::Le => ExpressionNode::le(subject, single(&mut values)),
        OperatorKind::Like => ExpressionNode::like(subject, single(&mut values)),
        OperatorKind::In => ExpressionNode::in_list(subject, values),
        OperatorKind::Between => {
            let high = single(&mut values);
            let low = single(&mut values);
            ExpressionNode::between(subject, low, high)
        }
        OperatorKind::IsNull => ExpressionNode::is_null(subject),
        OperatorKind::IsNotNull => ExpressionNode::is_not_null(subject),
    };

    if term.negated {
        ExpressionNode::not_expr(leaf)
    } else {
        leaf
    }
}

/// Rebuild a left-deep AND/OR tree from flattened groups
pub fn rebuild(groups: &[FlattenedGroup]) -> FilterResult<ExpressionNode> {
    let (first, rest) = groups
        .split_first()
        .ok_or_else(|| FilterError::unsupported("cannot rebuild an empty filter"))?;

    let mut root = term_to_node(&first.term);
    for group in rest {
        let node = term_to_node(&group.term);
        root = match group.joiner {
            Joiner::And => ExpressionNode::and(root, node),
            Joiner::Or => ExpressionNode::or(root, node),
            Joiner::None => {
                return Err(FilterError::unsupported(format!(
                    "term '{}' has no joiner",
                    group.term
                )))
            }
        };
    }
    Ok(root)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expression::Literal;

    fn leaf(name: &str, value: i64) -> ExpressionNode {
        ExpressionNode::eq(ExpressionNode::column(name), ExpressionNode::Long(value))
    }

    fn joiners(groups: &[FlattenedGroup]) -> Vec<Joiner> {
        groups.iter().map(|g| g.joiner).collect()
    }

    #[test]
    fn test_single_leaf() -> FilterResult<()> {
        let groups = flatten(&leaf("a", 1))?;
        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].joiner, Joiner::None);
        Ok(())
    }

    #[test]
    fn test_left_deep_chain_order() -> FilterResult<()> {
        // ((a = 1 AND b = 2) OR c = 3) AND d = 4
        let root = ExpressionNode::and(
            ExpressionNode::or(
                ExpressionNode::and(leaf("a", 1), leaf("b", 2)),
                leaf("c", 3),
            ),
            leaf("d", 4),
        );
        let groups = flatten(&root)?;

        assert_eq!(
            joiners(&groups),
            vec![Joiner::None, Joiner::And, Joiner::Or, Joiner::And]
        );
        let names: Vec<_> = groups
            .iter()
            .map(|g| g.term.subject.name().unwrap_or_default().to_string())
            .collect();
        assert_eq!(names, vec!["a", "b", "c", "d"]);
        assert_eq!(
            groups[2].term.literals().next(),
            Some(&Literal::Long(3))
        );
        Ok(())
    }

    #[test]
    fn test_right_deep_rejected() {
        let root = ExpressionNode::and(
            leaf("a", 1),
            ExpressionNode::or(leaf("b", 2), leaf("c", 3)),
        );
        let err = flatten(&root).unwrap_err();
        assert!(err.to_string().contains("right-hand side of AND"));
    }

    #[test]
    fn test_leaf_errors_propagate() {
        let root = ExpressionNode::and(
            leaf("a", 1),
            ExpressionNode::eq(
                ExpressionNode::column("b"),
                ExpressionNode::SubSelect("SELECT 1".into()),
            ),
        );
        assert!(flatten(&root).is_err());
    }

    #[test]
    fn test_group_display() -> FilterResult<()> {
        let groups = flatten(&ExpressionNode::or(leaf("a", 1), leaf("b", 2)))?;
        assert_eq!(groups[0].to_string(), "a = 1");
        assert_eq!(groups[1].to_string(), "OR b = 2");
        Ok(())
    }

    #[test]
    fn test_rebuild_round_trip() -> FilterResult<()> {
        let root = ExpressionNode::or(
            ExpressionNode::and(
                ExpressionNode::not_expr(leaf("a", 1)),
                ExpressionNode::between(
                    ExpressionNode::column("b"),
                    ExpressionNode::Long(1),
                    ExpressionNode::add(ExpressionNode::Long(2), ExpressionNode::Long(3)),
                ),
            ),
            ExpressionNode::is_not_null(ExpressionNode::column("c")),
        );
        let groups = flatten(&root)?;
        let rebuilt = rebuild(&groups)?;
        assert_eq!(flatten(&rebuilt)?, groups);
        assert_eq!(
            rebuilt.to_string(),
            "NOT a = 1 AND b BETWEEN 1 AND 5 OR c IS NOT NULL"
        );
        Ok(())
    }

    #[test]
    fn test_rebuild_empty() {
        assert!(rebuild(&[]).is_err());
    }
}
