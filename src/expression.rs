//! Expression model shared by the parser, the filter pipeline and the
//! predicate compiler.
//!
//! This module provides:
//! - The closed `ExpressionNode` AST
//! - Literal values and column references
//! - Operator enums for terms and joiners
//! - The `FilterError` type

pub mod error;
pub mod literal;
pub mod node;
pub mod operator;

pub use error::{FilterError, FilterResult};
pub use literal::{ColumnRef, Literal};
pub use node::{ExpressionNode, InItems};
pub use operator::{BinaryOperator, ComparisonOp, Joiner, OperatorKind, ValueArity};
