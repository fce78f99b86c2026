use crate::heap::Handle;
use std::fmt;

/// A runtime value. Scalars are stored inline; anything heap-allocated
/// is a `Handle` into the `Heap` owned by the `Engine`.
#[derive(Debug, Clone, Copy)]
pub enum Value {
    Nil,
    Bool(bool),
    Number(f64),
    Obj(Handle),
}

impl Value {
    /// Falsy values are `nil` and `false`; everything else is truthy.
    pub fn is_falsy(&self) -> bool {
        matches!(self, Value::Nil | Value::Bool(false))
    }

    pub fn is_number(&self) -> bool {
        matches!(self, Value::Number(_))
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            Value::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_obj(&self) -> Option<Handle> {
        match self {
            Value::Obj(h) => Some(*h),
            _ => None,
        }
    }

    /// Value equality: `Nil == Nil`, `Bool` by value, `Number` by
    /// IEEE-754 `==` (so `NaN != NaN`), `Obj` by handle identity (sound
    /// because every `String` is interned), and cross-type comparisons
    /// are always false.
    pub fn values_equal(a: Value, b: Value) -> bool {
        match (a, b) {
            (Value::Nil, Value::Nil) => true,
            (Value::Bool(x), Value::Bool(y)) => x == y,
            (Value::Number(x), Value::Number(y)) => x == y,
            (Value::Obj(x), Value::Obj(y)) => x == y,
            _ => false,
        }
    }
}

impl fmt::Display for Value {
    /// Only used for scalar values; `Obj` values are formatted by the
    /// caller once it has access to the `Heap` (see `vm::print_value`).
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Nil => write!(f, "nil"),
            Value::Bool(b) => write!(f, "{}", b),
            Value::Number(n) => write!(f, "{}", format_number(*n)),
            Value::Obj(h) => write!(f, "<obj {:?}>", h),
        }
    }
}

/// Formats a number the way `printf("%g", ...)` would: the shortest
/// representation that round-trips, with no trailing `.0` for integral
/// values printed as floats.
pub fn format_number(n: f64) -> String {
    if n.is_nan() {
        return "NaN".to_string();
    }
    if n.is_infinite() {
        return if n > 0.0 { "inf".to_string() } else { "-inf".to_string() };
    }
    if n == 0.0 && n.is_sign_negative() {
        return "-0".to_string();
    }
    format!("{}", n)
}
