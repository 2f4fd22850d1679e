//! The fixed builtin table of the expression language. Each builtin
//! mirrors the numpy constructor the original `.cppy` fixtures called.

use rand::rngs::StdRng;
use rand::Rng;

use crate::value::{ArrayValue, Element, ElementKind, Value};

use super::evaluator::{EvalError, EvalResult};

/// A resolved call argument: either an evaluated value or an element-kind
/// name used as a dtype marker.
#[derive(Debug, Clone)]
pub enum Arg {
    Value(Value),
    Kind(ElementKind),
}

pub fn call(function: &str, args: Vec<Arg>, rng: &mut StdRng) -> EvalResult<Value> {
    let result = match function {
        "array" => array(function, args)?,
        "zeros" => filled(function, args, 0.0)?,
        "ones" => filled(function, args, 1.0)?,
        "full" => full(function, args)?,
        "arange" => arange(function, args)?,
        "linspace" => linspace(function, args)?,
        "rand" => rand_uniform(function, args, rng)?,
        "randint" => randint(function, args, rng)?,
        "astype" => astype(function, args)?,
        "reshape" => reshape(function, args)?,
        "complex" => complex(function, args)?,
        other => return Err(EvalError::UnknownFunction(other.to_string())),
    };
    Ok(result.normalized())
}

/// Stack list-literal entries into one array. All entries must be scalars,
/// or arrays sharing one shape.
pub fn stack(values: Vec<Value>) -> EvalResult<Value> {
    if values.is_empty() {
        return Err(EvalError::Shape("empty list literal".to_string()));
    }
    if values.iter().all(Value::is_scalar) {
        let kind = if values.iter().any(|v| matches!(v, Value::Float(_))) {
            ElementKind::Float64
        } else {
            ElementKind::Int64
        };
        let data = values
            .iter()
            .map(|v| scalar_element(kind, v))
            .collect::<EvalResult<Vec<_>>>()?;
        return Ok(Value::Array(ArrayValue::new(kind, vec![values.len()], data)));
    }

    let arrays = values
        .into_iter()
        .map(|v| match v {
            Value::Array(arr) => Ok(arr),
            scalar => Err(EvalError::Shape(format!(
                "cannot mix scalars and arrays in a list literal (got {})",
                scalar
            ))),
        })
        .collect::<EvalResult<Vec<_>>>()?;

    let inner_shape = arrays[0].shape.clone();
    if let Some(bad) = arrays.iter().find(|a| a.shape != inner_shape) {
        return Err(EvalError::Shape(format!(
            "list entries have differing shapes: {:?} vs {:?}",
            inner_shape, bad.shape
        )));
    }

    let kind = arrays
        .iter()
        .map(|a| a.kind)
        .reduce(unify_kinds)
        .unwrap_or(ElementKind::Float64);
    let mut shape = vec![arrays.len()];
    shape.extend_from_slice(&inner_shape);
    let mut data = Vec::with_capacity(arrays.iter().map(ArrayValue::len).sum());
    for arr in arrays {
        for element in &arr.data {
            data.push(cast_element(kind, arr.kind, element)?);
        }
    }
    Ok(Value::Array(ArrayValue::new(kind, shape, data)))
}

fn unify_kinds(a: ElementKind, b: ElementKind) -> ElementKind {
    if a == b {
        a
    } else if a.is_complex() || b.is_complex() {
        ElementKind::Complex128
    } else if a.is_float() || b.is_float() {
        ElementKind::Float64
    } else {
        ElementKind::Int64
    }
}

fn array(function: &str, args: Vec<Arg>) -> EvalResult<Value> {
    let (values, kind) = split_trailing_kind(function, args)?;
    let [value] = take_values::<1>(function, values)?;
    match kind {
        Some(kind) => cast_value(value, kind),
        None => Ok(value),
    }
}

fn filled(function: &str, args: Vec<Arg>, fill: f64) -> EvalResult<Value> {
    let (values, kind) = split_trailing_kind(function, args)?;
    let [shape] = take_values::<1>(function, values)?;
    let shape = as_shape(&shape)?;
    let kind = kind.unwrap_or(ElementKind::Float64);
    let element = cast_element(kind, ElementKind::Float64, &Element::Float(fill))?;
    let len = shape.iter().product();
    Ok(Value::Array(ArrayValue::new(kind, shape, vec![element; len])))
}

fn full(function: &str, args: Vec<Arg>) -> EvalResult<Value> {
    let (values, kind) = split_trailing_kind(function, args)?;
    let [shape, fill] = take_values::<2>(function, values)?;
    let shape = as_shape(&shape)?;
    let kind = kind.unwrap_or(match fill {
        Value::Integer(_) => ElementKind::Int64,
        _ => ElementKind::Float64,
    });
    let element = scalar_element(kind, &fill)?;
    let len = shape.iter().product();
    Ok(Value::Array(ArrayValue::new(kind, shape, vec![element; len])))
}

fn arange(function: &str, args: Vec<Arg>) -> EvalResult<Value> {
    let values = take_all_values(function, args)?;
    let integral = values.iter().all(|v| matches!(v, Value::Integer(_)));
    let (start, stop, step) = match values.len() {
        1 => (0.0, as_f64(function, &values[0])?, 1.0),
        2 => (
            as_f64(function, &values[0])?,
            as_f64(function, &values[1])?,
            1.0,
        ),
        3 => (
            as_f64(function, &values[0])?,
            as_f64(function, &values[1])?,
            as_f64(function, &values[2])?,
        ),
        got => {
            return Err(EvalError::Arity {
                function: function.to_string(),
                expected: "1 to 3".to_string(),
                got,
            })
        }
    };
    if step == 0.0 {
        return Err(EvalError::Numeric("arange: step must be nonzero".to_string()));
    }
    let count = ((stop - start) / step).ceil().max(0.0) as usize;
    let kind = if integral {
        ElementKind::Int64
    } else {
        ElementKind::Float64
    };
    let data = (0..count)
        .map(|i| {
            let v = start + step * i as f64;
            if integral {
                Element::Int(v as i64)
            } else {
                Element::Float(v)
            }
        })
        .collect();
    Ok(Value::Array(ArrayValue::new(kind, vec![count], data)))
}

fn linspace(function: &str, args: Vec<Arg>) -> EvalResult<Value> {
    let [start, stop, num] = take_values::<3>(function, take_all_values(function, args)?)?;
    let start = as_f64(function, &start)?;
    let stop = as_f64(function, &stop)?;
    let num = as_usize(function, &num)?;
    let data: Vec<Element> = match num {
        0 => Vec::new(),
        1 => vec![Element::Float(start)],
        _ => {
            let step = (stop - start) / (num - 1) as f64;
            (0..num)
                .map(|i| Element::Float(start + step * i as f64))
                .collect()
        }
    };
    Ok(Value::Array(ArrayValue::new(
        ElementKind::Float64,
        vec![num],
        data,
    )))
}

fn rand_uniform(function: &str, args: Vec<Arg>, rng: &mut StdRng) -> EvalResult<Value> {
    let [shape] = take_values::<1>(function, take_all_values(function, args)?)?;
    let shape = as_shape(&shape)?;
    let len = shape.iter().product();
    let data = (0..len).map(|_| Element::Float(rng.gen::<f64>())).collect();
    Ok(Value::Array(ArrayValue::new(
        ElementKind::Float64,
        shape,
        data,
    )))
}

fn randint(function: &str, args: Vec<Arg>, rng: &mut StdRng) -> EvalResult<Value> {
    let [low, high, shape] = take_values::<3>(function, take_all_values(function, args)?)?;
    let low = as_i64(function, &low)?;
    let high = as_i64(function, &high)?;
    if low >= high {
        return Err(EvalError::Numeric(format!(
            "randint: empty range {}..{}",
            low, high
        )));
    }
    let shape = as_shape(&shape)?;
    let len = shape.iter().product();
    let data = (0..len)
        .map(|_| Element::Int(rng.gen_range(low..high)))
        .collect();
    Ok(Value::Array(ArrayValue::new(ElementKind::Int64, shape, data)))
}

fn astype(function: &str, args: Vec<Arg>) -> EvalResult<Value> {
    let (values, kind) = split_trailing_kind(function, args)?;
    let kind = kind.ok_or_else(|| EvalError::Arity {
        function: function.to_string(),
        expected: "a value and an element kind".to_string(),
        got: values.len(),
    })?;
    let [value] = take_values::<1>(function, values)?;
    cast_value(value, kind)
}

fn reshape(function: &str, args: Vec<Arg>) -> EvalResult<Value> {
    let [value, shape] = take_values::<2>(function, take_all_values(function, args)?)?;
    let shape = as_shape(&shape)?;
    let len: usize = shape.iter().product();
    match value {
        Value::Array(arr) => {
            if arr.len() != len {
                return Err(EvalError::Shape(format!(
                    "cannot reshape {} element(s) into {:?}",
                    arr.len(),
                    shape
                )));
            }
            Ok(Value::Array(ArrayValue::new(arr.kind, shape, arr.data)))
        }
        scalar => {
            if len != 1 {
                return Err(EvalError::Shape(format!(
                    "cannot reshape a scalar into {:?}",
                    shape
                )));
            }
            let (kind, element) = match scalar {
                Value::Integer(i) => (ElementKind::Int64, Element::Int(i)),
                Value::Float(f) => (ElementKind::Float64, Element::Float(f)),
                Value::Array(_) => unreachable!(),
            };
            Ok(Value::Array(ArrayValue::new(kind, shape, vec![element])))
        }
    }
}

/// Combine real and imaginary parts into a complex128 array. At least one
/// side must be an array; scalars broadcast.
fn complex(function: &str, args: Vec<Arg>) -> EvalResult<Value> {
    let [re, im] = take_values::<2>(function, take_all_values(function, args)?)?;
    let shape = match (&re, &im) {
        (Value::Array(a), Value::Array(b)) => {
            if a.shape != b.shape {
                return Err(EvalError::Shape(format!(
                    "complex: part shapes differ: {:?} vs {:?}",
                    a.shape, b.shape
                )));
            }
            a.shape.clone()
        }
        (Value::Array(a), _) => a.shape.clone(),
        (_, Value::Array(b)) => b.shape.clone(),
        _ => {
            return Err(EvalError::Shape(
                "complex: at least one part must be an array".to_string(),
            ))
        }
    };
    let len = shape.iter().product();
    let re = part_values(function, re, len)?;
    let im = part_values(function, im, len)?;
    let data = re
        .into_iter()
        .zip(im)
        .map(|(r, i)| Element::Complex(r, i))
        .collect();
    Ok(Value::Array(ArrayValue::new(
        ElementKind::Complex128,
        shape,
        data,
    )))
}

fn part_values(function: &str, value: Value, len: usize) -> EvalResult<Vec<f64>> {
    match value {
        Value::Array(arr) => arr
            .data
            .iter()
            .map(|e| real_component(arr.kind, e))
            .collect(),
        scalar => Ok(vec![as_f64(function, &scalar)?; len]),
    }
}

fn cast_value(value: Value, kind: ElementKind) -> EvalResult<Value> {
    match value {
        Value::Array(arr) => {
            let data = arr
                .data
                .iter()
                .map(|e| cast_element(kind, arr.kind, e))
                .collect::<EvalResult<Vec<_>>>()?;
            Ok(Value::Array(ArrayValue::new(kind, arr.shape, data)))
        }
        Value::Integer(i) => match kind {
            k if k.is_float() => Ok(Value::Float(i as f64)),
            k if k.is_integer() || k == ElementKind::Bool => Ok(Value::Integer(i)),
            k => Err(EvalError::Numeric(format!(
                "cannot cast a scalar to {}",
                k
            ))),
        },
        Value::Float(f) => match kind {
            k if k.is_float() => Ok(Value::Float(f)),
            k if k.is_integer() => Ok(Value::Integer(f as i64)),
            k => Err(EvalError::Numeric(format!(
                "cannot cast a scalar to {}",
                k
            ))),
        },
    }
}

fn cast_element(to: ElementKind, from: ElementKind, element: &Element) -> EvalResult<Element> {
    if to.is_complex() {
        let (re, im) = match element {
            Element::Complex(re, im) => (*re, *im),
            other => (real_component(from, other)?, 0.0),
        };
        return Ok(Element::Complex(re, im));
    }
    let v = real_component(from, element)?;
    match to {
        ElementKind::Bool => Ok(Element::Bool(v != 0.0)),
        ElementKind::Int32 | ElementKind::Int64 => Ok(Element::Int(v as i64)),
        ElementKind::Uint32 | ElementKind::Uint64 => {
            if v < 0.0 {
                Err(EvalError::Numeric(format!(
                    "cannot cast negative value {} to {}",
                    v, to
                )))
            } else {
                Ok(Element::UInt(v as u64))
            }
        }
        ElementKind::Float32 | ElementKind::Float64 => Ok(Element::Float(v)),
        ElementKind::Complex64 | ElementKind::Complex128 => unreachable!(),
    }
}

fn real_component(kind: ElementKind, element: &Element) -> EvalResult<f64> {
    match element {
        Element::Bool(b) => Ok(*b as i64 as f64),
        Element::Int(i) => Ok(*i as f64),
        Element::UInt(u) => Ok(*u as f64),
        Element::Float(f) => Ok(*f),
        Element::Complex(..) => Err(EvalError::Numeric(format!(
            "cannot narrow {} elements to a real kind",
            kind
        ))),
    }
}

fn scalar_element(kind: ElementKind, value: &Value) -> EvalResult<Element> {
    let element = match value {
        Value::Integer(i) => Element::Int(*i),
        Value::Float(f) => Element::Float(*f),
        Value::Array(_) => {
            return Err(EvalError::Shape("expected a scalar".to_string()));
        }
    };
    let from = match value {
        Value::Integer(_) => ElementKind::Int64,
        _ => ElementKind::Float64,
    };
    cast_element(kind, from, &element)
}

fn as_shape(value: &Value) -> EvalResult<Vec<usize>> {
    match value {
        Value::Integer(i) if *i >= 0 => Ok(vec![*i as usize]),
        Value::Integer(i) => Err(EvalError::Shape(format!("negative dimension: {}", i))),
        Value::Array(arr) if arr.rank() == 1 && arr.kind.is_integer() => arr
            .data
            .iter()
            .map(|e| match e {
                Element::Int(i) if *i >= 0 => Ok(*i as usize),
                Element::Int(i) => Err(EvalError::Shape(format!("negative dimension: {}", i))),
                Element::UInt(u) => Ok(*u as usize),
                other => Err(EvalError::Shape(format!(
                    "shape entries must be integers, got {:?}",
                    other
                ))),
            })
            .collect(),
        other => Err(EvalError::Shape(format!(
            "expected a shape (integer or integer list), got {}",
            other
        ))),
    }
}

fn as_f64(function: &str, value: &Value) -> EvalResult<f64> {
    match value {
        Value::Integer(i) => Ok(*i as f64),
        Value::Float(f) => Ok(*f),
        Value::Array(_) => Err(EvalError::Numeric(format!(
            "{}: expected a scalar argument",
            function
        ))),
    }
}

fn as_i64(function: &str, value: &Value) -> EvalResult<i64> {
    match value {
        Value::Integer(i) => Ok(*i),
        _ => Err(EvalError::Numeric(format!(
            "{}: expected an integer argument",
            function
        ))),
    }
}

fn as_usize(function: &str, value: &Value) -> EvalResult<usize> {
    let v = as_i64(function, value)?;
    if v < 0 {
        return Err(EvalError::Numeric(format!(
            "{}: expected a non-negative count",
            function
        )));
    }
    Ok(v as usize)
}

/// Pop a trailing dtype marker, leaving the positional values. A kind
/// name anywhere but last is an error.
fn split_trailing_kind(
    function: &str,
    mut args: Vec<Arg>,
) -> EvalResult<(Vec<Value>, Option<ElementKind>)> {
    let kind = match args.last() {
        Some(Arg::Kind(kind)) => {
            let kind = *kind;
            args.pop();
            Some(kind)
        }
        _ => None,
    };
    let values = take_all_values(function, args)?;
    Ok((values, kind))
}

fn take_all_values(function: &str, args: Vec<Arg>) -> EvalResult<Vec<Value>> {
    args.into_iter()
        .map(|a| match a {
            Arg::Value(v) => Ok(v),
            Arg::Kind(kind) => Err(EvalError::Numeric(format!(
                "{}: unexpected element kind argument {}",
                function, kind
            ))),
        })
        .collect()
}

fn take_values<const N: usize>(function: &str, values: Vec<Value>) -> EvalResult<[Value; N]> {
    let got = values.len();
    values.try_into().map_err(|_| EvalError::Arity {
        function: function.to_string(),
        expected: N.to_string(),
        got,
    })
}

#[cfg(test)]
mod tests {
    use rand::SeedableRng;

    use super::*;

    fn rng() -> StdRng {
        StdRng::seed_from_u64(42)
    }

    fn shape_of(value: &Value) -> Vec<usize> {
        match value {
            Value::Array(arr) => arr.shape.clone(),
            _ => panic!("expected array, got {:?}", value),
        }
    }

    #[test]
    fn test_zeros_defaults_to_float64() {
        let value = call(
            "zeros",
            vec![Arg::Value(Value::Integer(3))],
            &mut rng(),
        )
        .unwrap();
        match value {
            Value::Array(arr) => {
                assert_eq!(arr.kind, ElementKind::Float64);
                assert_eq!(arr.data, vec![Element::Float(0.0); 3]);
            }
            other => panic!("expected array, got {:?}", other),
        }
    }

    #[test]
    fn test_ones_with_dtype() {
        let value = call(
            "ones",
            vec![Arg::Value(Value::Integer(2)), Arg::Kind(ElementKind::Uint32)],
            &mut rng(),
        )
        .unwrap();
        match value {
            Value::Array(arr) => {
                assert_eq!(arr.kind, ElementKind::Uint32);
                assert_eq!(arr.data, vec![Element::UInt(1); 2]);
            }
            other => panic!("expected array, got {:?}", other),
        }
    }

    #[test]
    fn test_arange_integer() {
        let value = call("arange", vec![Arg::Value(Value::Integer(4))], &mut rng()).unwrap();
        match value {
            Value::Array(arr) => {
                assert_eq!(arr.kind, ElementKind::Int64);
                assert_eq!(
                    arr.data,
                    vec![
                        Element::Int(0),
                        Element::Int(1),
                        Element::Int(2),
                        Element::Int(3)
                    ]
                );
            }
            other => panic!("expected array, got {:?}", other),
        }
    }

    #[test]
    fn test_linspace_endpoints() {
        let value = call(
            "linspace",
            vec![
                Arg::Value(Value::Integer(0)),
                Arg::Value(Value::Integer(1)),
                Arg::Value(Value::Integer(5)),
            ],
            &mut rng(),
        )
        .unwrap();
        match value {
            Value::Array(arr) => {
                assert_eq!(arr.data.first(), Some(&Element::Float(0.0)));
                assert_eq!(arr.data.last(), Some(&Element::Float(1.0)));
                assert_eq!(arr.shape, vec![5]);
            }
            other => panic!("expected array, got {:?}", other),
        }
    }

    #[test]
    fn test_linspace_zero_count_is_empty() {
        let value = call(
            "linspace",
            vec![
                Arg::Value(Value::Integer(0)),
                Arg::Value(Value::Integer(1)),
                Arg::Value(Value::Integer(0)),
            ],
            &mut rng(),
        )
        .unwrap();
        match value {
            Value::Array(arr) => {
                assert_eq!(arr.shape, vec![0]);
                assert!(arr.data.is_empty());
            }
            other => panic!("expected array, got {:?}", other),
        }
    }

    #[test]
    fn test_rand_is_deterministic_for_a_seed() {
        let shape = Value::Array(ArrayValue::new(
            ElementKind::Int64,
            vec![2],
            vec![Element::Int(2), Element::Int(3)],
        ));
        let a = call("rand", vec![Arg::Value(shape.clone())], &mut rng()).unwrap();
        let b = call("rand", vec![Arg::Value(shape)], &mut rng()).unwrap();
        assert_eq!(a, b);
        assert_eq!(shape_of(&a), vec![2, 3]);
    }

    #[test]
    fn test_randint_respects_bounds() {
        let value = call(
            "randint",
            vec![
                Arg::Value(Value::Integer(5)),
                Arg::Value(Value::Integer(10)),
                Arg::Value(Value::Integer(100)),
            ],
            &mut rng(),
        )
        .unwrap();
        match value {
            Value::Array(arr) => {
                assert!(arr.data.iter().all(|e| match e {
                    Element::Int(i) => (5..10).contains(i),
                    _ => false,
                }));
            }
            other => panic!("expected array, got {:?}", other),
        }
    }

    #[test]
    fn test_astype_to_complex() {
        let ones = call("ones", vec![Arg::Value(Value::Integer(2))], &mut rng()).unwrap();
        let value = call(
            "astype",
            vec![Arg::Value(ones), Arg::Kind(ElementKind::Complex128)],
            &mut rng(),
        )
        .unwrap();
        match value {
            Value::Array(arr) => {
                assert_eq!(arr.kind, ElementKind::Complex128);
                assert_eq!(arr.data, vec![Element::Complex(1.0, 0.0); 2]);
            }
            other => panic!("expected array, got {:?}", other),
        }
    }

    #[test]
    fn test_reshape_checks_element_count() {
        let flat = call("arange", vec![Arg::Value(Value::Integer(6))], &mut rng()).unwrap();
        let shape = stack(vec![Value::Integer(2), Value::Integer(3)]).unwrap();
        let reshaped = call(
            "reshape",
            vec![Arg::Value(flat.clone()), Arg::Value(shape)],
            &mut rng(),
        )
        .unwrap();
        assert_eq!(shape_of(&reshaped), vec![2, 3]);

        let bad_shape = stack(vec![Value::Integer(4), Value::Integer(4)]).unwrap();
        let err = call(
            "reshape",
            vec![Arg::Value(flat), Arg::Value(bad_shape)],
            &mut rng(),
        )
        .unwrap_err();
        assert!(matches!(err, EvalError::Shape(_)));
    }

    #[test]
    fn test_unknown_function() {
        let err = call("randn", vec![], &mut rng()).unwrap_err();
        assert!(matches!(err, EvalError::UnknownFunction(name) if name == "randn"));
    }

    #[test]
    fn test_stack_promotes_mixed_scalars_to_float() {
        let value = stack(vec![Value::Integer(1), Value::Float(2.5)]).unwrap();
        match value {
            Value::Array(arr) => {
                assert_eq!(arr.kind, ElementKind::Float64);
                assert_eq!(arr.data, vec![Element::Float(1.0), Element::Float(2.5)]);
            }
            other => panic!("expected array, got {:?}", other),
        }
    }

    #[test]
    fn test_stack_rejects_ragged_rows() {
        let row1 = stack(vec![Value::Integer(1), Value::Integer(2)]).unwrap();
        let row2 = stack(vec![Value::Integer(3)]).unwrap();
        let err = stack(vec![row1, row2]).unwrap_err();
        assert!(matches!(err, EvalError::Shape(_)));
    }
}
