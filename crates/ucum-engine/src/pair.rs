//! Quantities: a decimal value with a unit code.

use std::fmt;

use ucum_model::Decimal;

/// A measured value in some unit, e.g. `2 m`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Pair {
    /// The numeric value.
    pub value: Decimal,
    /// The unit expression the value is measured in.
    pub code: String,
}

impl Pair {
    /// Creates a new quantity.
    pub fn new(value: Decimal, code: impl Into<String>) -> Self {
        Self {
            value,
            code: code.into(),
        }
    }
}

impl fmt::Display for Pair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.value, self.code)
    }
}
