//! Operator definitions for filter expressions.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Binary operators over scalar operands.
///
/// Only the arithmetic subset (`+ - * / DIV`) is accepted by the filter
/// pipeline; the remaining operators exist so that the parser can represent
/// them and the pipeline can reject them by name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BinaryOperator {
    // Arithmetic
    Add,
    Sub,
    Mul,
    Div,
    IntegerDiv,

    // Rejected
    Modulo,
    Concat,
    BitwiseAnd,
    BitwiseOr,
    BitwiseXor,
    RegexMatch,
    JsonAccess,
}

impl BinaryOperator {
    /// Whether this operator can be reduced by the arithmetic evaluator
    pub fn is_arithmetic(&self) -> bool {
        matches!(
            self,
            BinaryOperator::Add
                | BinaryOperator::Sub
                | BinaryOperator::Mul
                | BinaryOperator::Div
                | BinaryOperator::IntegerDiv
        )
    }

    /// Get the display string for this operator
    pub fn as_str(&self) -> &'static str {
        match self {
            BinaryOperator::Add => "+",
            BinaryOperator::Sub => "-",
            BinaryOperator::Mul => "*",
            BinaryOperator::Div => "/",
            BinaryOperator::IntegerDiv => "DIV",
            BinaryOperator::Modulo => "%",
            BinaryOperator::Concat => "||",
            BinaryOperator::BitwiseAnd => "&",
            BinaryOperator::BitwiseOr => "|",
            BinaryOperator::BitwiseXor => "^",
            BinaryOperator::RegexMatch => "~",
            BinaryOperator::JsonAccess => "->",
        }
    }

    /// Human readable name used in error messages
    pub fn describe(&self) -> &'static str {
        match self {
            BinaryOperator::Add => "addition",
            BinaryOperator::Sub => "subtraction",
            BinaryOperator::Mul => "multiplication",
            BinaryOperator::Div => "division",
            BinaryOperator::IntegerDiv => "integer division",
            BinaryOperator::Modulo => "modulo operator",
            BinaryOperator::Concat => "string concatenation",
            BinaryOperator::BitwiseAnd => "bitwise AND",
            BinaryOperator::BitwiseOr => "bitwise OR",
            BinaryOperator::BitwiseXor => "bitwise XOR",
            BinaryOperator::RegexMatch => "regular expression match",
            BinaryOperator::JsonAccess => "JSON operator",
        }
    }
}

/// Comparison operators of a leaf condition
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ComparisonOp {
    Eq,
    Ne,
    Gt,
    Ge,
    Lt,
    Le,
}

impl ComparisonOp {
    pub fn as_str(&self) -> &'static str {
        match self {
            ComparisonOp::Eq => "=",
            ComparisonOp::Ne => "<>",
            ComparisonOp::Gt => ">",
            ComparisonOp::Ge => ">=",
            ComparisonOp::Lt => "<",
            ComparisonOp::Le => "<=",
        }
    }
}

/// Keyword joining a flattened term to the terms before it
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Joiner {
    /// First term of a flattened sequence
    None,
    And,
    Or,
}

impl Joiner {
    pub fn as_str(&self) -> &'static str {
        match self {
            Joiner::None => "",
            Joiner::And => "AND",
            Joiner::Or => "OR",
        }
    }
}

impl fmt::Display for Joiner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Operator recorded on an extracted term
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OperatorKind {
    Eq,
    Ne,
    Gt,
    Ge,
    Lt,
    Le,
    Like,
    In,
    Between,
    IsNull,
    IsNotNull,
}

/// How many object values an operator takes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueArity {
    Exactly(usize),
    AtLeast(usize),
}

impl ValueArity {
    pub fn accepts(&self, count: usize) -> bool {
        match *self {
            ValueArity::Exactly(n) => count == n,
            ValueArity::AtLeast(n) => count >= n,
        }
    }
}

impl fmt::Display for ValueArity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValueArity::Exactly(n) => write!(f, "exactly {}", n),
            ValueArity::AtLeast(n) => write!(f, "at least {}", n),
        }
    }
}

impl OperatorKind {
    /// Get the display string for this operator
    pub fn as_str(&self) -> &'static str {
        match self {
            OperatorKind::Eq => "=",
            OperatorKind::Ne => "<>",
            OperatorKind::Gt => ">",
            OperatorKind::Ge => ">=",
            OperatorKind::Lt => "<",
            OperatorKind::Le => "<=",
            OperatorKind::Like => "LIKE",
            OperatorKind::In => "IN",
            OperatorKind::Between => "BETWEEN",
            OperatorKind::IsNull => "IS NULL",
            OperatorKind::IsNotNull => "IS NOT NULL",
        }
    }

    /// Number of object values a term with this operator must carry
    pub fn arity(&self) -> ValueArity {
        match self {
            OperatorKind::IsNull | OperatorKind::IsNotNull => ValueArity::Exactly(0),
            OperatorKind::Between => ValueArity::Exactly(2),
            OperatorKind::In => ValueArity::AtLeast(1),
            _ => ValueArity::Exactly(1),
        }
    }
}

impl From<ComparisonOp> for OperatorKind {
    fn from(op: ComparisonOp) -> Self {
        match op {
            ComparisonOp::Eq => OperatorKind::Eq,
            ComparisonOp::Ne => OperatorKind::Ne,
            ComparisonOp::Gt => OperatorKind::Gt,
            ComparisonOp::Ge => OperatorKind::Ge,
            ComparisonOp::Lt => OperatorKind::Lt,
            ComparisonOp::Le => OperatorKind::Le,
        }
    }
}

impl fmt::Display for OperatorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
