//! Filter-expression compiler.
//!
//! Filter text is parsed into an `ExpressionNode` tree, flattened into
//! `(joiner, term)` groups and compiled into predicates over any type that
//! implements `Record`.

pub mod config;
pub mod expression;
pub mod filter;
pub mod predicate;
pub mod sql;

pub use config::FilterConfig;
pub use expression::{
    ColumnRef, ExpressionNode, FilterError, FilterResult, Joiner, Literal, OperatorKind,
};
pub use filter::{FlattenedGroup, Flattener, Operand, Subject, Term, TermExtractor};
pub use predicate::{CompiledFilter, Predicate, PredicateCompiler, PredicateOperator, Record};

use anyhow::Result;

/// Parse filter text and flatten it with the default configuration
pub fn parse_filter(text: &str) -> Result<Vec<FlattenedGroup>> {
    parse_filter_with(text, &FilterConfig::default())
}

pub fn parse_filter_with(text: &str, config: &FilterConfig) -> Result<Vec<FlattenedGroup>> {
    let expr = sql::parse_expression(text)?;
    Ok(Flattener::new(config).flatten(&expr)?)
}

/// Parse filter text and compile it into a filter over `K`
pub fn compile_filter<K: Record + 'static>(text: &str) -> Result<CompiledFilter<K>> {
    compile_filter_with(text, &FilterConfig::default())
}

pub fn compile_filter_with<K: Record + 'static>(
    text: &str,
    config: &FilterConfig,
) -> Result<CompiledFilter<K>> {
    let groups = parse_filter_with(text, config)?;
    Ok(PredicateCompiler::with_config(config).compile_groups(&groups)?)
}
