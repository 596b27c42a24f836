//! Filter-expression pipeline.
//!
//! A whole filter is flattened into `(joiner, term)` groups; each leaf
//! condition is reduced to a `Term` whose object values have been through
//! arithmetic evaluation, function-parameter extraction and date parsing.

pub mod date;
pub mod evaluator;
pub mod flatten;
pub mod function;
pub mod term;

pub use date::parse_date_millis;
pub use evaluator::{calendar_unit_millis, evaluate_arithmetic, ArithmeticEvaluator};
pub use flatten::{flatten, rebuild, term_to_node, FlattenedGroup, Flattener};
pub use function::FunctionParameterExtractor;
pub use term::{extract_term, Operand, Subject, Term, TermExtractor};
