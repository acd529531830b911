//! Abstract Syntax Tree types for unit expressions.
//!
//! Symbols borrow their prefix and unit from the terminology the expression
//! was parsed against, so a [`Term`] lives no longer than that terminology.

use ucum_model::{Decimal, Prefix, UnitRef};

/// Binary operator between two components.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operator {
    /// Multiplication: `.`
    Multiply,
    /// Division: `/`
    Divide,
}

impl Operator {
    /// The operator as written in a unit code.
    pub fn symbol(&self) -> char {
        match self {
            Operator::Multiply => '.',
            Operator::Divide => '/',
        }
    }
}

impl std::fmt::Display for Operator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.symbol())
    }
}

/// A numeric component: `value ^ exponent`.
///
/// Plain integers such as `4` have exponent 1; `10*3` and `10^-7` are
/// powers of ten. An annotation without a unit (`{cells}`) is the factor one
/// carrying the annotation.
#[derive(Debug, Clone, PartialEq)]
pub struct Factor {
    /// The base.
    pub value: Decimal,
    /// Power the base is raised to.
    pub exponent: i32,
    /// Trailing annotation text, without braces.
    pub annotation: Option<String>,
}

impl Factor {
    /// A plain integer factor.
    pub fn new(value: Decimal) -> Self {
        Self {
            value,
            exponent: 1,
            annotation: None,
        }
    }

    /// The factor `10^exponent`.
    pub fn power_of_ten(exponent: i32) -> Self {
        Self {
            value: Decimal::TEN,
            exponent,
            annotation: None,
        }
    }

    /// The factor one.
    pub fn unity() -> Self {
        Self::new(Decimal::ONE)
    }

    /// True for the implicit one of `/m` or of an annotation-only component.
    pub fn is_unity(&self) -> bool {
        self.value.is_one()
    }
}

/// A unit atom with an optional prefix, an exponent and an annotation.
#[derive(Debug, Clone, PartialEq)]
pub struct Symbol<'t> {
    /// Metric prefix, if one was attached.
    pub prefix: Option<&'t Prefix>,
    /// The resolved unit.
    pub unit: UnitRef<'t>,
    /// Power of the unit; 1 unless a suffix was written.
    pub exponent: i32,
    /// Trailing annotation text, without braces.
    pub annotation: Option<String>,
}

/// One operand of a term.
#[derive(Debug, Clone, PartialEq)]
pub enum Component<'t> {
    /// A number or power of ten.
    Factor(Factor),
    /// A unit atom.
    Symbol(Symbol<'t>),
    /// A parenthesized term.
    Term(Box<Term<'t>>),
}

impl<'t> Component<'t> {
    /// Trailing annotation of a factor or symbol.
    pub fn annotation(&self) -> Option<&str> {
        match self {
            Component::Factor(factor) => factor.annotation.as_deref(),
            Component::Symbol(symbol) => symbol.annotation.as_deref(),
            Component::Term(_) => None,
        }
    }
}

/// A parsed unit expression.
///
/// Operators associate to the left with equal precedence, so `a/b.c` is
/// `(a/b).c` and `a/b/c` is `(a/b)/c`.
#[derive(Debug, Clone, PartialEq)]
pub enum Term<'t> {
    /// A single component.
    Single(Component<'t>),
    /// `left op right`.
    Binary {
        /// Everything to the left of the last operator.
        left: Box<Term<'t>>,
        /// The operator.
        op: Operator,
        /// The last component.
        right: Component<'t>,
    },
}

impl<'t> Term<'t> {
    /// Combines a term with one more component.
    pub fn binary(left: Term<'t>, op: Operator, right: Component<'t>) -> Self {
        Term::Binary {
            left: Box::new(left),
            op,
            right,
        }
    }

    /// The symbol, if the whole expression is one symbol.
    pub fn as_symbol(&self) -> Option<&Symbol<'t>> {
        match self {
            Term::Single(Component::Symbol(symbol)) => Some(symbol),
            Term::Single(Component::Term(inner)) => inner.as_symbol(),
            _ => None,
        }
    }

    /// Visits every symbol in written order, descending into parentheses.
    pub fn for_each_symbol<'s>(&'s self, visit: &mut impl FnMut(&'s Symbol<'t>)) {
        match self {
            Term::Single(component) => visit_component(component, visit),
            Term::Binary { left, right, .. } => {
                left.for_each_symbol(visit);
                visit_component(right, visit);
            }
        }
    }
}

fn visit_component<'s, 't>(component: &'s Component<'t>, visit: &mut impl FnMut(&'s Symbol<'t>)) {
    match component {
        Component::Factor(_) => {}
        Component::Symbol(symbol) => visit(symbol),
        Component::Term(inner) => inner.for_each_symbol(visit),
    }
}
