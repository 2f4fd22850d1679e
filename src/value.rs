use std::fmt;

/// Logical element type of an array's entries.
///
/// The string forms (`"float64"`, `"complex128"`, ...) are the spellings
/// accepted as dtype arguments in template expressions.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, strum::EnumString, strum::Display, strum::EnumIter,
)]
#[strum(serialize_all = "lowercase")]
pub enum ElementKind {
    Bool,
    Int32,
    Int64,
    Uint32,
    Uint64,
    Float32,
    Float64,
    Complex64,
    Complex128,
}

impl ElementKind {
    pub fn is_float(&self) -> bool {
        matches!(self, ElementKind::Float32 | ElementKind::Float64)
    }

    pub fn is_complex(&self) -> bool {
        matches!(self, ElementKind::Complex64 | ElementKind::Complex128)
    }

    pub fn is_integer(&self) -> bool {
        matches!(
            self,
            ElementKind::Int32 | ElementKind::Int64 | ElementKind::Uint32 | ElementKind::Uint64
        )
    }
}

/// One stored array entry. The logical dtype lives on the containing
/// [`ArrayValue`]; `Element` only carries the machine representation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Element {
    Bool(bool),
    Int(i64),
    UInt(u64),
    Float(f64),
    Complex(f64, f64),
}

/// A multi-dimensional numeric array: element kind, shape, and data in
/// row-major order. `data.len()` always equals the product of `shape`.
#[derive(Debug, Clone, PartialEq)]
pub struct ArrayValue {
    pub kind: ElementKind,
    pub shape: Vec<usize>,
    pub data: Vec<Element>,
}

impl ArrayValue {
    pub fn new(kind: ElementKind, shape: Vec<usize>, data: Vec<Element>) -> Self {
        debug_assert_eq!(shape.iter().product::<usize>(), data.len());
        Self { kind, shape, data }
    }

    pub fn rank(&self) -> usize {
        self.shape.len()
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

/// A value bound in the per-template variable environment.
///
/// Scalar classification takes priority over array classification: an
/// expression that yields a rank-0 array is collapsed to the matching
/// scalar variant before it is ever stored or rendered.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Integer(i64),
    Float(f64),
    Array(ArrayValue),
}

impl Value {
    /// Collapse rank-0 arrays to plain scalars. Integer dispatch is
    /// checked before float dispatch.
    pub fn normalized(self) -> Value {
        match self {
            Value::Array(arr) if arr.rank() == 0 => match arr.data[0] {
                Element::Bool(b) => Value::Integer(b as i64),
                Element::Int(i) => Value::Integer(i),
                Element::UInt(u) => Value::Integer(u as i64),
                Element::Float(f) => Value::Float(f),
                Element::Complex(re, _) => Value::Float(re),
            },
            other => other,
        }
    }

    pub fn is_scalar(&self) -> bool {
        !matches!(self, Value::Array(_))
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Value::Integer(i) => write!(f, "{}", i),
            Value::Float(v) => write!(f, "{:?}", v),
            Value::Array(arr) => write!(f, "array({}, shape {:?})", arr.kind, arr.shape),
        }
    }
}
