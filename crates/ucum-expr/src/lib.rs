//! # ucum-expr
//!
//! Parser for unit expressions written in the Unified Code for Units of
//! Measure (UCUM), such as `mg/dL`, `cm[H2O]` or `10*3/ul`.
//!
//! This crate provides:
//! - **Parser**: a nom-based parser that resolves every atom against a
//!   [`TerminologyLookup`](ucum_model::TerminologyLookup) while parsing
//! - **AST**: [`Term`], [`Component`], [`Symbol`] and [`Factor`]
//! - **Formatter**: unit-code recomposition and long display names
//!
//! ## Usage
//!
//! ```rust
//! use ucum_expr::{parse, Format, Formatter};
//! use ucum_model::Terminology;
//!
//! let terminology = Terminology::from_json_str(r#"{
//!     "version": "test",
//!     "prefixes": [{ "code": "m", "names": ["milli"], "value": "0.001" }],
//!     "baseUnits": [
//!         { "code": "m", "names": ["meter"], "property": "length", "dimension": "L" },
//!         { "code": "s", "names": ["second"], "property": "time", "dimension": "T" }
//!     ]
//! }"#).unwrap();
//!
//! let term = parse(&terminology, "mm/s2").unwrap();
//! assert_eq!(
//!     Formatter::format_term(&term, Format::Display),
//!     "(millimeter) / (second ^ 2)"
//! );
//! ```
//!
//! ## Syntax Quick Reference
//!
//! | Element | Meaning | Example |
//! |---------|---------|---------|
//! | `.` | Multiplication | `N.m` |
//! | `/` | Division | `m/s` |
//! | leading `/` | Reciprocal | `/min` |
//! | suffix digits | Exponent | `m2`, `s-1` |
//! | `10*n`, `10^n` | Power of ten | `10*3/ul` |
//! | `[...]` | Bracketed atom | `[in_i]` |
//! | `{...}` | Annotation | `kg{body_wt}` |
//! | `(...)` | Grouping | `g/(kg.h)` |

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

mod ast;
mod error;
mod formatter;
mod parser;

pub use ast::{Component, Factor, Operator, Symbol, Term};
pub use error::{ExprError, ExprResult};
pub use formatter::{Format, Formatter};
pub use parser::{parse, ExpressionParser};
