//! Terminology records: prefixes, base units and defined units.
//!
//! Every record is plain data owned by a [`Terminology`](crate::Terminology)
//! and never mutated after the terminology is built. Shared behaviour
//! (code and name lookup) is exposed through the [`Concept`] trait, and the
//! borrowed sum types [`UnitRef`] and [`ConceptRef`] let callers work with
//! "any unit" or "any concept" without boxing.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::decimal::Decimal;

// =============================================================================
// Concept Kind
// =============================================================================

/// The table a concept belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ConceptKind {
    /// A metric prefix such as `k` (kilo).
    Prefix,
    /// One of the seven dimensional base units.
    BaseUnit,
    /// A unit defined in terms of other units.
    Unit,
}

impl ConceptKind {
    /// Lower-case label used in messages.
    pub fn label(&self) -> &'static str {
        match self {
            ConceptKind::Prefix => "prefix",
            ConceptKind::BaseUnit => "base unit",
            ConceptKind::Unit => "unit",
        }
    }
}

impl fmt::Display for ConceptKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

// =============================================================================
// Concept Trait
// =============================================================================

/// Capability shared by every terminology entry.
pub trait Concept {
    /// Case-sensitive code, e.g. `mm[Hg]`.
    fn code(&self) -> &str;

    /// Case-insensitive code, e.g. `MM[HG]`.
    fn code_upper(&self) -> &str;

    /// Which table the concept comes from.
    fn kind(&self) -> ConceptKind;

    /// Display names, canonical name first.
    fn names(&self) -> &[String];

    /// Symbol used when printing the unit, if any.
    fn print_symbol(&self) -> Option<&str>;

    /// The canonical display name.
    fn display_name(&self) -> &str {
        self.names().first().map(String::as_str).unwrap_or("")
    }

    /// One-line human description, e.g. `unit l ('liter')`.
    fn description(&self) -> String {
        format!("{} {} ('{}')", self.kind(), self.code(), self.display_name())
    }
}

macro_rules! impl_concept {
    ($record:ty, $kind:expr) => {
        impl Concept for $record {
            fn code(&self) -> &str {
                &self.code
            }

            fn code_upper(&self) -> &str {
                &self.code_upper
            }

            fn kind(&self) -> ConceptKind {
                $kind
            }

            fn names(&self) -> &[String] {
                &self.names
            }

            fn print_symbol(&self) -> Option<&str> {
                self.print_symbol.as_deref()
            }
        }
    };
}

// =============================================================================
// Records
// =============================================================================

/// A metric prefix with its exact multiplier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Prefix {
    /// Case-sensitive code (`m`, `da`, `Ki`).
    pub code: String,
    /// Case-insensitive code; derived from `code` when empty.
    #[serde(default)]
    pub code_upper: String,
    /// Display names (`milli`).
    pub names: Vec<String>,
    /// Print symbol (`μ` for micro).
    #[serde(default)]
    pub print_symbol: Option<String>,
    /// Exact multiplier (`0.001` for milli).
    pub value: Decimal,
}

impl_concept!(Prefix, ConceptKind::Prefix);

/// A base unit: the terminal node of canonicalization.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BaseUnit {
    /// Case-sensitive code (`m`, `g`, `cd`).
    pub code: String,
    /// Case-insensitive code; derived from `code` when empty.
    #[serde(default)]
    pub code_upper: String,
    /// Display names (`meter`).
    pub names: Vec<String>,
    /// Print symbol.
    #[serde(default)]
    pub print_symbol: Option<String>,
    /// Kind of quantity (`length`).
    pub property: String,
    /// Single-letter dimension tag (`L`, `T`, `M`).
    pub dimension: char,
}

impl_concept!(BaseUnit, ConceptKind::BaseUnit);

/// Right-hand side of a unit definition: `value × unit`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Value {
    /// Unit expression the definition refers to (may be compound).
    pub unit: String,
    /// Case-insensitive form of `unit`; derived when empty.
    #[serde(default)]
    pub unit_upper: String,
    /// Exact magnitude.
    pub value: Decimal,
    /// Original text of the definition, if it differs from the value.
    #[serde(default)]
    pub text: String,
}

impl Value {
    /// Creates a definition `value × unit`.
    pub fn new(value: Decimal, unit: impl Into<String>) -> Self {
        let unit = unit.into();
        Self {
            unit_upper: unit.to_uppercase(),
            text: value.to_string(),
            unit,
            value,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.value, self.unit)
    }
}

/// A unit defined in terms of other units.
///
/// For special units `value` holds the reference quantity of the non-linear
/// function named by `function` (for `Cel` the reference is `1 K`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DefinedUnit {
    /// Case-sensitive code (`[in_i]`).
    pub code: String,
    /// Case-insensitive code; derived from `code` when empty.
    #[serde(default)]
    pub code_upper: String,
    /// Display names (`inch`).
    pub names: Vec<String>,
    /// Print symbol.
    #[serde(default)]
    pub print_symbol: Option<String>,
    /// Kind of quantity (`length`).
    pub property: String,
    /// Classification tag (`si`, `intcust`, `clinical`).
    #[serde(default)]
    pub class: String,
    /// Whether prefixes may be attached.
    #[serde(default)]
    pub is_metric: bool,
    /// Whether conversion needs a non-linear function.
    #[serde(default)]
    pub is_special: bool,
    /// Whether the unit is procedure-defined (`[iU]`, `[CFU]`).
    #[serde(default)]
    pub is_arbitrary: bool,
    /// The definition.
    pub value: Value,
    /// Name of the conversion function of a special unit (`Cel`, `pH`, `lg`).
    #[serde(default)]
    pub function: Option<String>,
}

impl_concept!(DefinedUnit, ConceptKind::Unit);

// =============================================================================
// Borrowed Sum Types
// =============================================================================

/// A borrowed unit of either table.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum UnitRef<'a> {
    /// A base unit.
    Base(&'a BaseUnit),
    /// A defined unit.
    Defined(&'a DefinedUnit),
}

impl<'a> UnitRef<'a> {
    /// The unit's kind of quantity.
    pub fn property(&self) -> &'a str {
        match *self {
            UnitRef::Base(unit) => &unit.property,
            UnitRef::Defined(unit) => &unit.property,
        }
    }

    /// Base units are always metric.
    pub fn is_metric(&self) -> bool {
        match *self {
            UnitRef::Base(_) => true,
            UnitRef::Defined(unit) => unit.is_metric,
        }
    }

    /// Whether conversion through this unit needs a non-linear function.
    pub fn is_special(&self) -> bool {
        matches!(*self, UnitRef::Defined(unit) if unit.is_special)
    }

    /// The defined unit, if this is one.
    pub fn as_defined(&self) -> Option<&'a DefinedUnit> {
        match *self {
            UnitRef::Base(_) => None,
            UnitRef::Defined(unit) => Some(unit),
        }
    }

    fn concept(&self) -> &'a dyn Concept {
        match *self {
            UnitRef::Base(unit) => unit,
            UnitRef::Defined(unit) => unit,
        }
    }
}

impl Concept for UnitRef<'_> {
    fn code(&self) -> &str {
        self.concept().code()
    }

    fn code_upper(&self) -> &str {
        self.concept().code_upper()
    }

    fn kind(&self) -> ConceptKind {
        self.concept().kind()
    }

    fn names(&self) -> &[String] {
        self.concept().names()
    }

    fn print_symbol(&self) -> Option<&str> {
        self.concept().print_symbol()
    }
}

/// A borrowed concept of any table, as returned by search.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ConceptRef<'a> {
    /// A prefix.
    Prefix(&'a Prefix),
    /// A base unit.
    Base(&'a BaseUnit),
    /// A defined unit.
    Defined(&'a DefinedUnit),
}

impl<'a> ConceptRef<'a> {
    /// The unit, if this concept is one.
    pub fn as_unit(&self) -> Option<UnitRef<'a>> {
        match *self {
            ConceptRef::Prefix(_) => None,
            ConceptRef::Base(unit) => Some(UnitRef::Base(unit)),
            ConceptRef::Defined(unit) => Some(UnitRef::Defined(unit)),
        }
    }

    fn concept(&self) -> &'a dyn Concept {
        match *self {
            ConceptRef::Prefix(prefix) => prefix,
            ConceptRef::Base(unit) => unit,
            ConceptRef::Defined(unit) => unit,
        }
    }
}

impl<'a> From<UnitRef<'a>> for ConceptRef<'a> {
    fn from(unit: UnitRef<'a>) -> Self {
        match unit {
            UnitRef::Base(unit) => ConceptRef::Base(unit),
            UnitRef::Defined(unit) => ConceptRef::Defined(unit),
        }
    }
}

impl Concept for ConceptRef<'_> {
    fn code(&self) -> &str {
        self.concept().code()
    }

    fn code_upper(&self) -> &str {
        self.concept().code_upper()
    }

    fn kind(&self) -> ConceptKind {
        self.concept().kind()
    }

    fn names(&self) -> &[String] {
        self.concept().names()
    }

    fn print_symbol(&self) -> Option<&str> {
        self.concept().print_symbol()
    }
}
