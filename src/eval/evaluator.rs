use std::str::FromStr;

use rand::rngs::StdRng;
use thiserror::Error;
use tracing::debug;

use crate::expr::{parse_assignment, BinaryOperator, Expr};
use crate::value::{ArrayValue, Element, ElementKind, Value};

use super::builtins::{self, Arg};
use super::context::Environment;

#[derive(Error, Debug)]
pub enum EvalError {
    #[error("unbound identifier: {0}")]
    UnboundIdentifier(String),
    #[error("parse error: {0}")]
    Parse(String),
    #[error("unknown function: {0}")]
    UnknownFunction(String),
    #[error("{function}: expected {expected} argument(s), got {got}")]
    Arity {
        function: String,
        expected: String,
        got: usize,
    },
    #[error("unknown element kind: {0}")]
    UnknownKind(String),
    #[error("shape error: {0}")]
    Shape(String),
    #[error("numeric error: {0}")]
    Numeric(String),
}

pub type EvalResult<T> = Result<T, EvalError>;

/// Evaluates expression-language statements against an [`Environment`].
///
/// The RNG is threaded through every call rather than held as ambient
/// state, so a template's pass owns its seed state exclusively.
#[derive(Debug, Default)]
pub struct Evaluator;

impl Evaluator {
    pub fn new() -> Self {
        Self
    }

    /// Evaluate the inner lines of a `/*py` block, in order. Empty lines
    /// are skipped; every other line must be a `name = expr` statement.
    pub fn eval_block<'a>(
        &self,
        lines: impl IntoIterator<Item = &'a str>,
        env: &mut Environment,
        rng: &mut StdRng,
    ) -> EvalResult<()> {
        for line in lines {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            self.eval_assignment(line, env, rng)?;
        }
        Ok(())
    }

    /// Evaluate a single `name = expr` statement and bind the result.
    pub fn eval_assignment(
        &self,
        source: &str,
        env: &mut Environment,
        rng: &mut StdRng,
    ) -> EvalResult<()> {
        let assignment = parse_assignment(source).map_err(EvalError::Parse)?;
        let value = self
            .eval_expression(&assignment.value, env, rng)?
            .normalized();
        debug!(name = %assignment.name, value = %value, "bound variable");
        env.insert(assignment.name, value);
        Ok(())
    }

    pub fn eval_expression(
        &self,
        expr: &Expr,
        env: &Environment,
        rng: &mut StdRng,
    ) -> EvalResult<Value> {
        match expr {
            Expr::Integer(i) => Ok(Value::Integer(*i)),
            Expr::Float(f) => Ok(Value::Float(*f)),
            Expr::Ident(name) => env.lookup(name).cloned(),
            Expr::List(items) => self.eval_list(items, env, rng),
            Expr::UnaryNeg(inner) => self.eval_neg(self.eval_expression(inner, env, rng)?),
            Expr::BinaryOp { op, left, right } => {
                let left = self.eval_expression(left, env, rng)?;
                let right = self.eval_expression(right, env, rng)?;
                eval_binary_op(*op, left, right)
            }
            Expr::Call { function, args } => {
                let args = self.eval_args(function, args, env, rng)?;
                builtins::call(function, args, rng)
            }
        }
    }

    /// Arguments that name an element kind (`float32`, `complex128`, ...)
    /// are passed through as kind markers instead of variable lookups,
    /// unless a template variable shadows the kind name. A bad kind name
    /// in a dtype position is reported as such, not as a missing
    /// variable.
    fn eval_args(
        &self,
        function: &str,
        args: &[Expr],
        env: &Environment,
        rng: &mut StdRng,
    ) -> EvalResult<Vec<Arg>> {
        const KIND_FUNCTIONS: [&str; 5] = ["array", "zeros", "ones", "full", "astype"];

        let mut out = Vec::with_capacity(args.len());
        for (i, arg) in args.iter().enumerate() {
            let arg = match arg {
                Expr::Ident(name) if !env.contains(name) => match ElementKind::from_str(name) {
                    Ok(kind) => Arg::Kind(kind),
                    Err(_) => {
                        let dtype_position =
                            i + 1 == args.len() && KIND_FUNCTIONS.contains(&function);
                        return Err(if dtype_position {
                            EvalError::UnknownKind(name.clone())
                        } else {
                            EvalError::UnboundIdentifier(name.clone())
                        });
                    }
                },
                other => Arg::Value(self.eval_expression(other, env, rng)?),
            };
            out.push(arg);
        }
        debug!(function, args = out.len(), "evaluated call arguments");
        Ok(out)
    }

    fn eval_list(
        &self,
        items: &[Expr],
        env: &Environment,
        rng: &mut StdRng,
    ) -> EvalResult<Value> {
        let mut values = Vec::with_capacity(items.len());
        for item in items {
            values.push(self.eval_expression(item, env, rng)?);
        }
        builtins::stack(values)
    }

    fn eval_neg(&self, value: Value) -> EvalResult<Value> {
        match value {
            Value::Integer(i) => Ok(Value::Integer(-i)),
            Value::Float(f) => Ok(Value::Float(-f)),
            Value::Array(arr) => {
                let data = arr
                    .data
                    .iter()
                    .map(|e| match e {
                        Element::Int(i) => Ok(Element::Int(-i)),
                        Element::Float(f) => Ok(Element::Float(-f)),
                        Element::Complex(re, im) => Ok(Element::Complex(-re, -im)),
                        Element::UInt(_) | Element::Bool(_) => Err(EvalError::Numeric(format!(
                            "cannot negate {} array",
                            arr.kind
                        ))),
                    })
                    .collect::<EvalResult<Vec<_>>>()?;
                Ok(Value::Array(ArrayValue::new(arr.kind, arr.shape, data)))
            }
        }
    }
}

fn eval_binary_op(op: BinaryOperator, left: Value, right: Value) -> EvalResult<Value> {
    match (left, right) {
        (Value::Integer(a), Value::Integer(b)) => scalar_int_op(op, a, b),
        (Value::Array(a), Value::Array(b)) => zip_arrays(op, a, b),
        (Value::Array(arr), scalar) => map_array(op, arr, &scalar, false),
        (scalar, Value::Array(arr)) => map_array(op, arr, &scalar, true),
        (a, b) => Ok(Value::Float(float_op(op, as_f64(&a), as_f64(&b))?)),
    }
}

fn scalar_int_op(op: BinaryOperator, a: i64, b: i64) -> EvalResult<Value> {
    let result = match op {
        BinaryOperator::Add => a.checked_add(b),
        BinaryOperator::Sub => a.checked_sub(b),
        BinaryOperator::Mul => a.checked_mul(b),
        // division always promotes, as the authoring language did
        BinaryOperator::Div => return Ok(Value::Float(float_op(op, a as f64, b as f64)?)),
    };
    result.map(Value::Integer).ok_or_else(|| {
        EvalError::Numeric(format!("integer overflow in {} {} {}", a, op, b))
    })
}

fn float_op(op: BinaryOperator, a: f64, b: f64) -> EvalResult<f64> {
    match op {
        BinaryOperator::Add => Ok(a + b),
        BinaryOperator::Sub => Ok(a - b),
        BinaryOperator::Mul => Ok(a * b),
        BinaryOperator::Div => {
            if b == 0.0 {
                Err(EvalError::Numeric("division by zero".to_string()))
            } else {
                Ok(a / b)
            }
        }
    }
}

fn as_f64(value: &Value) -> f64 {
    match value {
        Value::Integer(i) => *i as f64,
        Value::Float(f) => *f,
        Value::Array(_) => unreachable!("scalar expected"),
    }
}

fn element_f64(kind: ElementKind, element: &Element) -> EvalResult<f64> {
    match element {
        Element::Int(i) => Ok(*i as f64),
        Element::UInt(u) => Ok(*u as f64),
        Element::Float(f) => Ok(*f),
        Element::Bool(_) | Element::Complex(..) => Err(EvalError::Numeric(format!(
            "arithmetic is not defined on {} arrays",
            kind
        ))),
    }
}

fn result_kind(op: BinaryOperator, a: ElementKind, b: ElementKind) -> ElementKind {
    if op == BinaryOperator::Div || a.is_float() || b.is_float() {
        ElementKind::Float64
    } else {
        ElementKind::Int64
    }
}

fn pack(kind: ElementKind, v: f64) -> Element {
    match kind {
        ElementKind::Float64 => Element::Float(v),
        _ => Element::Int(v as i64),
    }
}

fn map_array(op: BinaryOperator, arr: ArrayValue, scalar: &Value, flipped: bool) -> EvalResult<Value> {
    let scalar_kind = match scalar {
        Value::Integer(_) => ElementKind::Int64,
        _ => ElementKind::Float64,
    };
    let kind = result_kind(op, arr.kind, scalar_kind);
    let s = as_f64(scalar);
    let data = arr
        .data
        .iter()
        .map(|e| {
            let v = element_f64(arr.kind, e)?;
            let (a, b) = if flipped { (s, v) } else { (v, s) };
            Ok(pack(kind, float_op(op, a, b)?))
        })
        .collect::<EvalResult<Vec<_>>>()?;
    Ok(Value::Array(ArrayValue::new(kind, arr.shape, data)))
}

fn zip_arrays(op: BinaryOperator, a: ArrayValue, b: ArrayValue) -> EvalResult<Value> {
    if a.shape != b.shape {
        return Err(EvalError::Shape(format!(
            "operand shapes differ: {:?} vs {:?}",
            a.shape, b.shape
        )));
    }
    let kind = result_kind(op, a.kind, b.kind);
    let data = a
        .data
        .iter()
        .zip(b.data.iter())
        .map(|(x, y)| {
            let x = element_f64(a.kind, x)?;
            let y = element_f64(b.kind, y)?;
            Ok(pack(kind, float_op(op, x, y)?))
        })
        .collect::<EvalResult<Vec<_>>>()?;
    Ok(Value::Array(ArrayValue::new(kind, a.shape, data)))
}
