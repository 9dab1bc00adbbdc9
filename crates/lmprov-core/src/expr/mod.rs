//! Expression language used throughout the configuration.
//!
//! Every configurable string (names, conditions, field values) is an
//! expression evaluated against the current [`VariableScope`]. Input
//! that does not parse as an expression is treated as a `{name}` text
//! template.
//!
//! [`VariableScope`]: crate::scope::VariableScope

mod eval;
mod parser;
mod value;

pub use eval::{Evaluated, evaluate, evaluate_as, evaluate_outcome, try_evaluate_field};
pub use parser::{Expr, parse, parse_expression};
pub use value::{FromValue, Value};
