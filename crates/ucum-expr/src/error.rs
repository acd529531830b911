//! Error types for unit expression parsing.

use thiserror::Error;

/// Errors that can occur while parsing a unit expression.
///
/// Every positional variant carries the byte offset into the parsed text.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ExprError {
    /// Malformed input at a specific position.
    #[error("parse error at position {position}: {message}")]
    ParseError {
        /// Position in the input where the error occurred.
        position: usize,
        /// Description of the error.
        message: String,
    },

    /// Empty input provided.
    #[error("empty unit expression")]
    EmptyExpression,

    /// An atom that is neither a unit nor a prefixed unit.
    #[error("unknown unit '{code}' at position {position}")]
    UnknownUnit {
        /// Position of the atom.
        position: usize,
        /// The unresolved atom.
        code: String,
    },

    /// A prefix attached to a unit that does not accept prefixes.
    #[error("prefix '{prefix}' is not allowed on unit '{unit}' at position {position}")]
    PrefixNotAllowed {
        /// Position of the atom.
        position: usize,
        /// The prefix code.
        prefix: String,
        /// The non-metric unit code.
        unit: String,
    },

    /// A `[` or `(` without its closing counterpart.
    #[error("unterminated bracket at position {position}")]
    UnterminatedBracket {
        /// Position of the opening bracket.
        position: usize,
    },

    /// A `{` without its closing `}`.
    #[error("unterminated annotation at position {position}")]
    UnterminatedAnnotation {
        /// Position of the opening brace.
        position: usize,
    },

    /// A disallowed character inside an annotation, or an annotation not
    /// followed by an operator.
    #[error("invalid annotation at position {position}")]
    InvalidAnnotation {
        /// Position of the offending character.
        position: usize,
    },

    /// An operator with nothing after it.
    #[error("operator without operand at position {position}")]
    DanglingOperator {
        /// Position where the operand was expected.
        position: usize,
    },
}

impl ExprError {
    /// Byte offset of the error, when the error has one.
    pub fn position(&self) -> Option<usize> {
        match self {
            ExprError::EmptyExpression => None,
            ExprError::ParseError { position, .. }
            | ExprError::UnknownUnit { position, .. }
            | ExprError::PrefixNotAllowed { position, .. }
            | ExprError::UnterminatedBracket { position }
            | ExprError::UnterminatedAnnotation { position }
            | ExprError::InvalidAnnotation { position }
            | ExprError::DanglingOperator { position } => Some(*position),
        }
    }
}

/// Result type for expression parsing.
pub type ExprResult<T> = std::result::Result<T, ExprError>;
