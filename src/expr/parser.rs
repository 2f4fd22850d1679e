use nom::{
    branch::alt,
    bytes::complete::take_while,
    character::complete::{char, digit1, multispace0, one_of},
    combinator::{all_consuming, map, map_res, opt, recognize},
    error::{context, convert_error, VerboseError},
    multi::{many0, separated_list0},
    sequence::{delimited, pair, preceded, tuple},
    Finish, IResult,
};

use super::ast::{Assignment, BinaryOperator, Expr};

pub type ParserResult<'a, T> = IResult<&'a str, T, VerboseError<&'a str>>;

fn ws<'a, T>(
    inner: impl FnMut(&'a str) -> ParserResult<'a, T>,
) -> impl FnMut(&'a str) -> ParserResult<'a, T> {
    delimited(multispace0, inner, multispace0)
}

#[tracing::instrument(level = "debug", skip(input))]
fn parse_float(input: &str) -> ParserResult<Expr> {
    context(
        "float literal",
        map_res(
            recognize(tuple((digit1, char('.'), digit1))),
            |s: &str| s.parse::<f64>().map(Expr::Float),
        ),
    )(input)
}

#[tracing::instrument(level = "debug", skip(input))]
fn parse_integer(input: &str) -> ParserResult<Expr> {
    context(
        "integer literal",
        map_res(digit1, |s: &str| s.parse::<i64>().map(Expr::Integer)),
    )(input)
}

fn identifier(input: &str) -> ParserResult<&str> {
    recognize(pair(
        nom::bytes::complete::take_while1(|c: char| c.is_alphabetic() || c == '_'),
        take_while(|c: char| c.is_alphanumeric() || c == '_'),
    ))(input)
}

#[tracing::instrument(level = "debug", skip(input))]
fn parse_list(input: &str) -> ParserResult<Expr> {
    context(
        "list literal",
        map(
            delimited(
                char('['),
                separated_list0(ws(char(',')), parse_expr),
                ws(char(']')),
            ),
            Expr::List,
        ),
    )(input)
}

#[tracing::instrument(level = "debug", skip(input))]
fn parse_call_or_ident(input: &str) -> ParserResult<Expr> {
    let (input, name) = identifier(input)?;
    let (input, args) = opt(delimited(
        ws(char('(')),
        separated_list0(ws(char(',')), parse_expr),
        ws(char(')')),
    ))(input)?;
    let expr = match args {
        Some(args) => Expr::Call {
            function: name.to_string(),
            args,
        },
        None => Expr::Ident(name.to_string()),
    };
    Ok((input, expr))
}

fn parse_primary(input: &str) -> ParserResult<Expr> {
    preceded(
        multispace0,
        alt((
            map(
                preceded(char('-'), parse_primary),
                |e| Expr::UnaryNeg(Box::new(e)),
            ),
            delimited(char('('), parse_expr, ws(char(')'))),
            parse_list,
            parse_float,
            parse_integer,
            parse_call_or_ident,
        )),
    )(input)
}

fn parse_term(input: &str) -> ParserResult<Expr> {
    let (input, first) = parse_primary(input)?;
    let (input, rest) = many0(pair(ws(one_of("*/")), parse_primary))(input)?;
    Ok((input, fold_ops(first, rest)))
}

pub fn parse_expr(input: &str) -> ParserResult<Expr> {
    let (input, first) = parse_term(input)?;
    let (input, rest) = many0(pair(ws(one_of("+-")), parse_term))(input)?;
    Ok((input, fold_ops(first, rest)))
}

fn fold_ops(first: Expr, rest: Vec<(char, Expr)>) -> Expr {
    rest.into_iter().fold(first, |left, (op, right)| {
        let op = match op {
            '+' => BinaryOperator::Add,
            '-' => BinaryOperator::Sub,
            '*' => BinaryOperator::Mul,
            _ => BinaryOperator::Div,
        };
        Expr::BinaryOp {
            op,
            left: Box::new(left),
            right: Box::new(right),
        }
    })
}

fn parse_assignment_inner(input: &str) -> ParserResult<Assignment> {
    context(
        "assignment",
        map(
            tuple((ws(identifier), char('='), ws(parse_expr))),
            |(name, _, value)| Assignment {
                name: name.to_string(),
                value,
            },
        ),
    )(input)
}

/// Parse a complete `name = expr` statement. The whole input must be
/// consumed; trailing garbage is a parse error.
pub fn parse_assignment(input: &str) -> Result<Assignment, String> {
    all_consuming(parse_assignment_inner)(input)
        .finish()
        .map(|(_, assignment)| assignment)
        .map_err(|e| convert_error(input, e))
}
