//! Error types for canonicalization and conversion.

use thiserror::Error;
use ucum_expr::ExprError;
use ucum_model::{DecimalError, ModelError};

/// Errors that can occur in the UCUM engine.
#[derive(Error, Debug)]
pub enum UcumError {
    /// Unit expression could not be parsed.
    #[error("unit parse error: {0}")]
    Parse(#[from] ExprError),

    /// A code that was expected to name a single unit does not.
    #[error("unknown unit code: {0}")]
    UnknownUnitCode(String),

    /// The two units measure different kinds of quantity.
    #[error("unable to convert between units {from} and {to}: base units {from_units} and {to_units} differ")]
    IncomparableUnits {
        /// Source unit code.
        from: String,
        /// Target unit code.
        to: String,
        /// Canonical base units of the source.
        from_units: String,
        /// Canonical base units of the target.
        to_units: String,
    },

    /// A non-linear unit without a usable conversion function.
    #[error("unsupported special unit conversion from {from} to {to}")]
    UnsupportedSpecialConversion {
        /// Source unit code.
        from: String,
        /// Target unit code.
        to: String,
    },

    /// A unit is defined, directly or indirectly, in terms of itself.
    #[error("cyclic unit definition: {}", chain.join(" -> "))]
    CyclicDefinition {
        /// Unit codes from the outermost definition back to the repeated one.
        chain: Vec<String>,
    },

    /// A base-unit power left the `i32` range.
    #[error("exponent of base unit {unit} out of range")]
    ExponentOverflow {
        /// Code of the base unit.
        unit: String,
    },

    /// Decimal arithmetic failed.
    #[error("arithmetic error: {0}")]
    Decimal(#[from] DecimalError),

    /// Terminology query failed.
    #[error("terminology error: {0}")]
    Model(#[from] ModelError),
}

/// Result type for engine operations.
pub type UcumResult<T> = std::result::Result<T, UcumError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display_incomparable() {
        let err = UcumError::IncomparableUnits {
            from: "mm".to_string(),
            to: "rad".to_string(),
            from_units: "m".to_string(),
            to_units: "rad".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "unable to convert between units mm and rad: base units m and rad differ"
        );
    }

    #[test]
    fn test_error_display_cycle() {
        let err = UcumError::CyclicDefinition {
            chain: vec!["a".to_string(), "b".to_string(), "a".to_string()],
        };
        assert_eq!(err.to_string(), "cyclic unit definition: a -> b -> a");
    }

    #[test]
    fn test_error_from_expr_error() {
        let err: UcumError = ExprError::EmptyExpression.into();
        assert!(matches!(err, UcumError::Parse(_)));
        assert_eq!(err.to_string(), "unit parse error: empty unit expression");
    }

    #[test]
    fn test_error_from_decimal_error() {
        let err: UcumError = DecimalError::DivisionByZero.into();
        assert!(matches!(err, UcumError::Decimal(_)));
    }
}
