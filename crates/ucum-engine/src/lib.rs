//! # ucum-engine
//!
//! Canonicalization, conversion and validation of UCUM unit expressions.
//!
//! This crate ties the [`ucum-expr`](ucum_expr) parser to a loaded
//! [`ucum-model`](ucum_model) terminology. Every unit expression reduces to a
//! [`Canonical`] form: an exact decimal magnitude times a product of base-unit
//! powers. Comparison, conversion and validation all work on that form.
//!
//! ## Quick Start
//!
//! ```rust
//! use ucum_engine::{Pair, UcumEngine};
//! use ucum_model::Terminology;
//!
//! let terminology = Terminology::from_json_str(r#"{
//!     "version": "2.1",
//!     "prefixes": [{ "code": "m", "names": ["milli"], "value": "0.001" }],
//!     "baseUnits": [
//!         { "code": "m", "names": ["meter"], "property": "length", "dimension": "L" },
//!         { "code": "s", "names": ["second"], "property": "time", "dimension": "T" }
//!     ],
//!     "units": [
//!         { "code": "[in_i]", "names": ["inch"], "property": "length",
//!           "value": { "unit": "m", "value": "0.0254" } }
//!     ]
//! }"#).unwrap();
//!
//! let engine = UcumEngine::new(&terminology);
//!
//! assert!(engine.is_valid("mm/s"));
//! assert_eq!(engine.get_canonical_units("[in_i]/s").unwrap(), "m.s-1");
//! assert_eq!(engine.analyse("mm/s").unwrap(), "(millimeter) / (second)");
//!
//! let mm = engine.convert(&"2".parse().unwrap(), "[in_i]", "mm").unwrap();
//! assert_eq!(mm.to_string(), "50.8");
//!
//! let product = engine.multiply(
//!     &Pair::new("2".parse().unwrap(), "m"),
//!     &Pair::new("3".parse().unwrap(), "s"),
//! ).unwrap();
//! assert_eq!(product.to_string(), "6 m.s");
//! ```
//!
//! ## With Configuration
//!
//! ```rust
//! use ucum_engine::{CacheConfig, EngineConfig};
//!
//! let config = EngineConfig::builder()
//!     .with_definition_cache(CacheConfig { max_entries: 1024 })
//!     .with_precision(15)
//!     .build();
//! # let _ = config;
//! ```
//!
//! ## Operations
//!
//! | Operation | Result |
//! |-----------|--------|
//! | `validate` | first parse or canonicalization error |
//! | `analyse` | long display name |
//! | `get_canonical_units` | base units as a unit code |
//! | `is_comparable` | same base units? |
//! | `convert` | value in another unit, special units included |
//! | `multiply` | product of two quantities |
//! | `get_defined_forms` | defined units reducing to one base unit |
//! | `validate_in_property` | mismatch message, if any |
//! | `validate_canonical_units` | mismatch message, if any |
//! | `validate_ucum` | self-check diagnostics of the terminology |
//! | `search`, `properties`, `identification` | terminology queries |
//!
//! ## Feature Flags
//!
//! - `parallel` - Runs `validate_ucum` on a rayon pool when
//!   [`EngineConfig::parallel`] is set
//!
//! ## Numbers
//!
//! Magnitudes are exact [`Decimal`](ucum_model::Decimal)s. Only quotients
//! that do not terminate within 28 significant digits are rounded, and only
//! the logarithmic and trigonometric special units pass through `f64`.

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

pub mod cache;
mod canonical;
mod canonicalizer;
mod config;
mod engine;
mod error;
mod pair;
mod special;

pub use cache::{CacheStats, DefinitionCache};
pub use canonical::{Canonical, CanonicalUnit};
pub use config::{CacheConfig, EngineConfig, EngineConfigBuilder};
pub use engine::UcumEngine;
pub use error::{UcumError, UcumResult};
pub use pair::Pair;
pub use special::SpecialFunction;
