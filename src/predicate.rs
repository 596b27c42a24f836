pub mod compare;
pub mod compiled;
pub mod compiler;
pub mod record;
pub mod registry;

pub use compare::{compare_literals, literal_text, literals_equal};
pub use compiled::{CompiledFilter, Predicate, PredicateOperator};
pub use compiler::{resolve_operator, PredicateCompiler};
pub use record::Record;
pub use registry::{like_to_regex, PredicateRegistry, Strategy};
