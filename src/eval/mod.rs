pub mod builtins;
pub mod context;
pub mod evaluator;

pub use context::Environment;
pub use evaluator::{EvalError, EvalResult, Evaluator};
