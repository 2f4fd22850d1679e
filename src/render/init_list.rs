use crate::value::{Element, ElementKind, Value};

use super::type_map;

/// Rendering knobs. `precision` is the number of decimal digits kept for
/// floating-point and complex elements; `fixed_rank` selects the
/// `xtensor<T, N>` container spelling over `xarray<T>`.
#[derive(Debug, Clone)]
pub struct RenderOptions {
    pub precision: usize,
    pub fixed_rank: bool,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            precision: 16,
            fixed_rank: false,
        }
    }
}

/// Render one `(name, value)` pair as a complete declaration statement.
///
/// Scalars come out as `int py_x = 5;`. Arrays come out as nested brace
/// initializer lists; for rank >= 2 each sub-list sits on its own line,
/// and every continuation line is indented past the `<type> <name> = `
/// prefix so the nesting stays visually aligned. Pure: the same value
/// always renders to the same text.
pub fn declaration(name: &str, value: &Value, opts: &RenderOptions) -> String {
    let ty = type_map::value_type(value, opts.fixed_rank);
    match value {
        Value::Integer(i) => format!("{} {} = {};", ty, name, i),
        Value::Float(f) => format!("{} {} = {};", ty, name, format_float(*f, opts.precision)),
        Value::Array(arr) => {
            let prefix = format!("{} {} = ", ty, name);
            let body = render_slice(&arr.data, &arr.shape, arr.kind, opts.precision, 0);
            let continuation = format!("\n{}", " ".repeat(prefix.len()));
            format!("{}{};", prefix, body.replace('\n', &continuation))
        }
    }
}

/// Recursive nested-brace formatting, lowest rank innermost. `depth` is
/// the nesting level, used to indent sub-lists under their opening brace.
fn render_slice(
    data: &[Element],
    shape: &[usize],
    kind: ElementKind,
    precision: usize,
    depth: usize,
) -> String {
    match shape {
        [] => data
            .first()
            .map(|e| format_element(e, precision))
            .unwrap_or_default(),
        [_] => {
            let items: Vec<String> = data.iter().map(|e| format_element(e, precision)).collect();
            format!("{{{}}}", items.join(","))
        }
        [n, rest @ ..] => {
            let chunk = rest.iter().product::<usize>().max(1);
            let separator = format!(",\n{}", " ".repeat(depth + 1));
            let inner: Vec<String> = (0..*n)
                .map(|i| {
                    render_slice(
                        &data[i * chunk..(i + 1) * chunk],
                        rest,
                        kind,
                        precision,
                        depth + 1,
                    )
                })
                .collect();
            format!("{{{}}}", inner.join(&separator))
        }
    }
}

fn format_element(element: &Element, precision: usize) -> String {
    match element {
        Element::Bool(b) => b.to_string(),
        Element::Int(i) => i.to_string(),
        Element::UInt(u) => u.to_string(),
        Element::Float(f) => format_float(*f, precision),
        // C++ complex literal: imaginary part carries the `i` suffix
        Element::Complex(re, im) => {
            if im.is_sign_negative() {
                format!("{}-{}i", format_float(*re, precision), format_float(-im, precision))
            } else {
                format!("{}+{}i", format_float(*re, precision), format_float(*im, precision))
            }
        }
    }
}

/// Fixed-precision decimal form with trailing zeros trimmed, keeping at
/// least one fractional digit so the literal stays a floating literal.
fn format_float(v: f64, precision: usize) -> String {
    let mut s = format!("{:.*}", precision, v);
    if s.contains('.') {
        let trimmed = s.trim_end_matches('0');
        let keep = if trimmed.ends_with('.') {
            trimmed.len() + 1
        } else {
            trimmed.len()
        };
        s.truncate(keep.min(s.len()));
    }
    s
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use proptest::prelude::*;

    use crate::value::ArrayValue;

    use super::*;

    fn long_array(values: &[i64], shape: &[usize]) -> Value {
        Value::Array(ArrayValue::new(
            ElementKind::Int64,
            shape.to_vec(),
            values.iter().map(|v| Element::Int(*v)).collect(),
        ))
    }

    #[test]
    fn test_integer_scalar() {
        let opts = RenderOptions::default();
        assert_eq!(declaration("py_x", &Value::Integer(5), &opts), "int py_x = 5;");
    }

    #[test]
    fn test_float_scalar() {
        let opts = RenderOptions::default();
        assert_eq!(
            declaration("py_x", &Value::Float(2.5), &opts),
            "double py_x = 2.5;"
        );
    }

    #[test]
    fn test_rank_one_long_array() {
        let opts = RenderOptions::default();
        assert_eq!(
            declaration("py_x", &long_array(&[1, 2, 3], &[3]), &opts),
            "xarray<long> py_x = {1,2,3};"
        );
    }

    #[test]
    fn test_rank_two_continuation_alignment() {
        let opts = RenderOptions::default();
        let rendered = declaration("py_m", &long_array(&[1, 2, 3, 4, 5, 6], &[2, 3]), &opts);
        assert_eq!(
            rendered,
            "xarray<long> py_m = {{1,2,3},\n                     {4,5,6}};"
        );
    }

    #[test]
    fn test_rank_three_nesting() {
        let opts = RenderOptions::default();
        let rendered = declaration(
            "py_t",
            &long_array(&[1, 2, 3, 4, 5, 6, 7, 8], &[2, 2, 2]),
            &opts,
        );
        let lines: Vec<&str> = rendered.split('\n').collect();
        assert_eq!(lines.len(), 4);
        assert!(lines[0].ends_with("{{{1,2},"));
        // inner rows sit one column deeper than outer rows
        assert!(lines[1].trim_start().starts_with("{3,4}}"));
        assert!(lines[2].trim_start().starts_with("{{5,6},"));
        assert!(rendered.ends_with("{7,8}}};"));
    }

    #[test]
    fn test_float_precision_sixteen_digits() {
        let opts = RenderOptions::default();
        let value = Value::Array(ArrayValue::new(
            ElementKind::Float64,
            vec![1],
            vec![Element::Float(0.374_540_118_847_362_5)],
        ));
        assert_eq!(
            declaration("py_f", &value, &opts),
            "xarray<double> py_f = {0.3745401188473625};"
        );
    }

    #[test]
    fn test_whole_floats_keep_one_fractional_digit() {
        assert_eq!(format_float(1.0, 16), "1.0");
        assert_eq!(format_float(0.5, 16), "0.5");
        assert_eq!(format_float(-2.0, 16), "-2.0");
    }

    #[test]
    fn test_complex_imaginary_suffix() {
        let opts = RenderOptions::default();
        let value = Value::Array(ArrayValue::new(
            ElementKind::Complex128,
            vec![2],
            vec![Element::Complex(1.0, 2.0), Element::Complex(0.5, -1.5)],
        ));
        assert_eq!(
            declaration("py_c", &value, &opts),
            "xarray<std::complex<double>> py_c = {1.0+2.0i,0.5-1.5i};"
        );
    }

    #[test]
    fn test_fixed_rank_spelling() {
        let opts = RenderOptions {
            fixed_rank: true,
            ..Default::default()
        };
        assert_eq!(
            declaration("py_x", &long_array(&[1, 2], &[2]), &opts),
            "xtensor<long, 1> py_x = {1,2};"
        );
    }

    proptest! {
        // rendering is pure: the same value always yields the same text
        #[test]
        fn prop_rendering_is_idempotent(values in proptest::collection::vec(-1.0e6..1.0e6f64, 1..32)) {
            let opts = RenderOptions::default();
            let value = Value::Array(ArrayValue::new(
                ElementKind::Float64,
                vec![values.len()],
                values.iter().map(|v| Element::Float(*v)).collect(),
            ));
            let first = declaration("py_p", &value, &opts);
            let second = declaration("py_p", &value, &opts);
            prop_assert_eq!(first, second);
        }
    }
}
