//! Term formatter for unit codes and display names.
//!
//! [`Format::Code`] recomposes a normalized unit code that parses back to
//! the same term. [`Format::Display`] renders the long names used by
//! `analyse`, e.g. `(kilogram) / (meter ^ 2)`; it is for people only and is
//! not meant to be parsed again.

use std::fmt::{self, Write};

use ucum_model::{Concept, Decimal};

use crate::ast::{Component, Factor, Operator, Symbol, Term};

/// Output format for terms.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Format {
    /// Unit code: `kg/m2`.
    #[default]
    Code,
    /// Long names: `(kilogram) / (meter ^ 2)`.
    Display,
}

/// Term formatter.
#[derive(Debug, Clone, Default)]
pub struct Formatter {
    _private: (),
}

impl Formatter {
    /// Create a new formatter.
    pub fn new() -> Self {
        Self::default()
    }

    /// Format a term in the specified style.
    pub fn format(&self, term: &Term<'_>, format: Format) -> String {
        Self::format_term(term, format)
    }

    /// Format a term (static method).
    pub fn format_term(term: &Term<'_>, format: Format) -> String {
        let mut out = String::new();
        match format {
            Format::Code => write_code(&mut out, term),
            Format::Display => write_display(&mut out, term),
        }
        out
    }
}

impl fmt::Display for Term<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&Formatter::format_term(self, Format::Code))
    }
}

// =========================================================================
// Code format
// =========================================================================

fn write_code(out: &mut String, term: &Term<'_>) {
    match term {
        Term::Single(component) => write_component_code(out, component),
        Term::Binary { left, op, right } => {
            write_code(out, left);
            out.push(op.symbol());
            write_component_code(out, right);
        }
    }
}

fn write_component_code(out: &mut String, component: &Component<'_>) {
    match component {
        Component::Factor(factor) => write_factor_code(out, factor),
        Component::Symbol(symbol) => write_symbol_code(out, symbol),
        Component::Term(inner) => {
            out.push('(');
            write_code(out, inner);
            out.push(')');
        }
    }
}

fn write_factor_code(out: &mut String, factor: &Factor) {
    let annotation_only = factor.is_unity() && factor.annotation.is_some();
    if !annotation_only {
        if factor.value == Decimal::TEN && factor.exponent != 1 {
            let _ = write!(out, "10*{}", factor.exponent);
        } else {
            let _ = write!(out, "{}", factor.value);
        }
    }
    write_annotation(out, factor.annotation.as_deref());
}

fn write_symbol_code(out: &mut String, symbol: &Symbol<'_>) {
    if let Some(prefix) = symbol.prefix {
        out.push_str(&prefix.code);
    }
    out.push_str(symbol.unit.code());
    if symbol.exponent != 1 {
        let _ = write!(out, "{}", symbol.exponent);
    }
    write_annotation(out, symbol.annotation.as_deref());
}

fn write_annotation(out: &mut String, annotation: Option<&str>) {
    if let Some(text) = annotation {
        let _ = write!(out, "{{{}}}", text);
    }
}

// =========================================================================
// Display format
// =========================================================================

fn write_display(out: &mut String, term: &Term<'_>) {
    match term {
        Term::Single(component) => write_component_display(out, component),
        Term::Binary { left, op, right } => {
            write_display(out, left);
            out.push_str(match op {
                Operator::Multiply => " * ",
                Operator::Divide => " / ",
            });
            write_component_display(out, right);
        }
    }
}

fn write_component_display(out: &mut String, component: &Component<'_>) {
    match component {
        Component::Factor(factor) => {
            let annotation_only = factor.is_unity() && factor.annotation.is_some();
            if !annotation_only {
                if factor.value == Decimal::TEN && factor.exponent != 1 {
                    let _ = write!(out, "10^{}", factor.exponent);
                } else {
                    let _ = write!(out, "{}", factor.value);
                }
            }
            write_annotation(out, factor.annotation.as_deref());
        }
        Component::Symbol(symbol) => {
            out.push('(');
            if let Some(prefix) = symbol.prefix {
                out.push_str(prefix.display_name());
            }
            out.push_str(symbol.unit.display_name());
            if symbol.exponent != 1 {
                let _ = write!(out, " ^ {}", symbol.exponent);
            }
            out.push(')');
            write_annotation(out, symbol.annotation.as_deref());
        }
        Component::Term(inner) => {
            out.push('(');
            write_display(out, inner);
            out.push(')');
        }
    }
}
