//! # ucum-model
//!
//! Exact decimals and the in-memory terminology model for the Unified Code
//! for Units of Measure (UCUM).
//!
//! This crate provides:
//! - **Decimal**: exact decimal arithmetic for unit magnitudes
//! - **Concept records**: prefixes, base units and defined units
//! - **Terminology**: an immutable, indexed store loaded from JSON or built
//!   programmatically, plus concept search
//! - **TerminologyLookup**: the query contract used by the parser and engine
//!
//! ## Usage
//!
//! ```rust
//! use ucum_model::{ConceptKind, Terminology, TerminologyLookup};
//!
//! let terminology = Terminology::from_json_str(r#"{
//!     "version": "2.1",
//!     "prefixes": [
//!         { "code": "c", "names": ["centi"], "printSymbol": "c", "value": "0.01" }
//!     ],
//!     "baseUnits": [
//!         { "code": "m", "names": ["meter"], "printSymbol": "m",
//!           "property": "length", "dimension": "L" }
//!     ],
//!     "units": [
//!         { "code": "[in_i]", "names": ["inch"], "printSymbol": "in",
//!           "property": "length", "class": "intcust",
//!           "value": { "unit": "cm", "value": "2.54" } }
//!     ]
//! }"#).unwrap();
//!
//! let inch = terminology.defined_unit("[in_i]").unwrap();
//! assert_eq!(inch.value.to_string(), "2.54 cm");
//!
//! let found = terminology.search(Some(ConceptKind::Unit), "inch", false).unwrap();
//! assert_eq!(found.len(), 1);
//! ```
//!
//! ## Terminology Document
//!
//! | Field | Content |
//! |-------|---------|
//! | `version`, `revision`, `revisionDate` | release identification |
//! | `prefixes` | `code`, `names`, `printSymbol`, `value` |
//! | `baseUnits` | `code`, `names`, `printSymbol`, `property`, `dimension` |
//! | `units` | `code`, `names`, `printSymbol`, `property`, `class`, `isMetric`, `isSpecial`, `isArbitrary`, `value { unit, value }`, `function` |
//!
//! Decimal values may be written as strings (`"1e-3"`) or JSON numbers;
//! strings keep every digit.

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

mod concept;
mod decimal;
mod error;
pub mod search;
mod terminology;
mod traits;

pub use concept::{BaseUnit, Concept, ConceptKind, ConceptRef, DefinedUnit, Prefix, UnitRef, Value};
pub use decimal::{Decimal, WORKING_PRECISION};
pub use error::{DecimalError, DecimalResult, ModelError, ModelResult};
pub use terminology::{Identification, Terminology, TerminologyBuilder};
pub use traits::TerminologyLookup;
