/// AST for the template expression language.
///
/// The language is deliberately closed: literals, identifiers, arithmetic,
/// nested list literals, and calls to a fixed set of array builtins. There
/// is no control flow of its own.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Integer(i64),
    Float(f64),
    Ident(String),
    List(Vec<Expr>),
    Call { function: String, args: Vec<Expr> },
    UnaryNeg(Box<Expr>),
    BinaryOp {
        op: BinaryOperator,
        left: Box<Expr>,
        right: Box<Expr>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display)]
pub enum BinaryOperator {
    #[strum(serialize = "+")]
    Add,
    #[strum(serialize = "-")]
    Sub,
    #[strum(serialize = "*")]
    Mul,
    #[strum(serialize = "/")]
    Div,
}

/// One `name = expr` statement, as written in a `/*py` block line or in
/// the `=` form of an inline marker.
#[derive(Debug, Clone, PartialEq)]
pub struct Assignment {
    pub name: String,
    pub value: Expr,
}
