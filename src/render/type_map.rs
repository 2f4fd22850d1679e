use crate::value::{ElementKind, Value};

/// C++ spelling for a logical element kind. The table is closed; adding a
/// kind to [`ElementKind`] forces a spelling to be chosen here.
pub fn element_type(kind: ElementKind) -> &'static str {
    match kind {
        ElementKind::Bool => "bool",
        ElementKind::Int32 => "int",
        ElementKind::Int64 => "long",
        ElementKind::Uint32 => "unsigned int",
        ElementKind::Uint64 => "unsigned long",
        ElementKind::Float32 => "float",
        ElementKind::Float64 => "double",
        ElementKind::Complex64 => "std::complex<float>",
        ElementKind::Complex128 => "std::complex<double>",
    }
}

/// C++ type for a bound value. Scalar classification precedes array
/// classification: a plain integer is `int`, never a rank-0 container.
/// Arrays pick the fixed-rank `xtensor` spelling or the dynamic-rank
/// `xarray` spelling from the caller-supplied flag.
pub fn value_type(value: &Value, fixed_rank: bool) -> String {
    match value {
        Value::Integer(_) => "int".to_string(),
        Value::Float(_) => "double".to_string(),
        Value::Array(arr) => {
            if fixed_rank {
                format!("xtensor<{}, {}>", element_type(arr.kind), arr.rank())
            } else {
                format!("xarray<{}>", element_type(arr.kind))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use strum::IntoEnumIterator;

    use crate::value::{ArrayValue, Element};

    use super::*;

    fn zero_element(kind: ElementKind) -> Element {
        match kind {
            ElementKind::Bool => Element::Bool(false),
            ElementKind::Int32 | ElementKind::Int64 => Element::Int(0),
            ElementKind::Uint32 | ElementKind::Uint64 => Element::UInt(0),
            ElementKind::Float32 | ElementKind::Float64 => Element::Float(0.0),
            ElementKind::Complex64 | ElementKind::Complex128 => Element::Complex(0.0, 0.0),
        }
    }

    // every kind and every small rank must resolve to a spelling
    #[test]
    fn test_type_mapping_totality() {
        for kind in ElementKind::iter() {
            for rank in 0..4 {
                let shape = vec![1; rank];
                let arr = ArrayValue::new(kind, shape, vec![zero_element(kind)]);
                let dynamic = value_type(&Value::Array(arr.clone()), false);
                assert!(dynamic.starts_with("xarray<"), "{}", dynamic);
                let fixed = value_type(&Value::Array(arr), true);
                assert!(fixed.ends_with(&format!(", {}>", rank)), "{}", fixed);
            }
        }
    }

    #[test]
    fn test_scalar_precedence_over_array_classification() {
        assert_eq!(value_type(&Value::Integer(5), false), "int");
        assert_eq!(value_type(&Value::Integer(5), true), "int");
        assert_eq!(value_type(&Value::Float(2.5), false), "double");
    }

    #[test]
    fn test_complex_spelling() {
        let arr = ArrayValue::new(
            ElementKind::Complex128,
            vec![1],
            vec![Element::Complex(0.0, 0.0)],
        );
        assert_eq!(
            value_type(&Value::Array(arr), false),
            "xarray<std::complex<double>>"
        );
    }
}
