pub mod ast;
pub mod parser;

pub use ast::{Assignment, BinaryOperator, Expr};
pub use parser::parse_assignment;
