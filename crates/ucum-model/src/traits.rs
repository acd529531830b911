//! The lookup contract consumed by the parser and the engine.
//!
//! [`TerminologyLookup`] abstracts over the store holding prefixes and units.
//! [`Terminology`](crate::Terminology) is the in-memory implementation; other
//! stores (a database-backed one, a test double) only need to provide the
//! required methods.
//!
//! # Example
//!
//! ```rust
//! use ucum_model::{Terminology, TerminologyLookup};
//!
//! let json = r#"{
//!     "version": "2.1",
//!     "baseUnits": [
//!         { "code": "m", "names": ["meter"], "property": "length", "dimension": "L" }
//!     ]
//! }"#;
//! let terminology = Terminology::from_json_str(json).unwrap();
//! let lookup: &dyn TerminologyLookup = &terminology;
//! assert!(lookup.unit("m").is_some());
//! assert!(lookup.unit("M").is_none());
//! ```

use crate::concept::{BaseUnit, DefinedUnit, Prefix, UnitRef};
use crate::terminology::Identification;

/// Read-only access to a loaded UCUM terminology.
///
/// Implementations must be immutable once handed out: every method is
/// called concurrently from many threads without locking.
pub trait TerminologyLookup: Send + Sync {
    /// Looks up a base or defined unit by its case-sensitive code.
    fn unit(&self, code: &str) -> Option<UnitRef<'_>>;

    /// Looks up a prefix by its case-sensitive code.
    fn prefix(&self, code: &str) -> Option<&Prefix>;

    /// All prefixes, longest code first.
    ///
    /// Atom resolution tries prefixes in this order so that `da` wins over
    /// `d` when both would leave a known unit.
    fn prefixes(&self) -> &[Prefix];

    /// All base units in load order.
    fn base_units(&self) -> &[BaseUnit];

    /// All defined units in load order.
    fn defined_units(&self) -> &[DefinedUnit];

    /// Version information of the loaded terminology.
    fn identification(&self) -> &Identification;

    /// Looks up a base unit by code.
    fn base_unit(&self, code: &str) -> Option<&BaseUnit> {
        match self.unit(code)? {
            UnitRef::Base(unit) => Some(unit),
            UnitRef::Defined(_) => None,
        }
    }

    /// Looks up a defined unit by code.
    fn defined_unit(&self, code: &str) -> Option<&DefinedUnit> {
        self.unit(code)?.as_defined()
    }

    /// Returns true if `code` names a base or defined unit.
    fn has_unit(&self, code: &str) -> bool {
        self.unit(code).is_some()
    }
}
