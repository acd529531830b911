//! UCUM engine implementation.

use tracing::{debug, warn};
use ucum_expr::{Format, Formatter, Term};
use ucum_model::{
    search, ConceptKind, ConceptRef, Decimal, DecimalError, DecimalResult, DefinedUnit,
    Identification, TerminologyLookup, UnitRef, WORKING_PRECISION,
};

use crate::cache::DefinitionCache;
use crate::canonical::Canonical;
use crate::canonicalizer::Canonicalizer;
use crate::config::EngineConfig;
use crate::error::{UcumError, UcumResult};
use crate::pair::Pair;
use crate::special::SpecialFunction;

/// Main entry point for working with unit expressions.
///
/// The engine borrows a loaded terminology and answers every question about
/// unit codes: are they valid, what do they mean, do two of them measure the
/// same thing, and how does a value convert between them. It holds no
/// per-call state and can be shared across threads.
///
/// # Example
///
/// ```rust
/// use ucum_engine::UcumEngine;
/// use ucum_model::Terminology;
///
/// let terminology = Terminology::from_json_str(r#"{
///     "version": "test",
///     "prefixes": [
///         { "code": "k", "names": ["kilo"], "value": "1000" },
///         { "code": "m", "names": ["milli"], "value": "0.001" }
///     ],
///     "baseUnits": [
///         { "code": "m", "names": ["meter"], "property": "length", "dimension": "L" }
///     ]
/// }"#).unwrap();
///
/// let engine = UcumEngine::new(&terminology);
/// assert!(engine.is_comparable("km", "mm").unwrap());
/// let meters = engine.convert(&"2.5".parse().unwrap(), "km", "m").unwrap();
/// assert_eq!(meters.to_string(), "2500");
/// ```
pub struct UcumEngine<'t> {
    /// The terminology every code is resolved against.
    lookup: &'t dyn TerminologyLookup,
    /// Engine configuration.
    config: EngineConfig,
    /// Memoized defined-unit forms (optional).
    cache: Option<DefinitionCache<'t>>,
}

/// Significant digits a result keeps once its rounding noise is dropped.
const SETTLED_DIGITS: u32 = 20;

/// Units in the last working digit that still count as rounding noise, as a
/// power of ten.
const NOISE_DIGITS: i64 = 2;

/// Drops the noise a non-terminating quotient leaves in the last working
/// digits.
///
/// A value within `10^NOISE_DIGITS` units of the last working digit of a
/// number with at most [`SETTLED_DIGITS`] significant digits becomes that
/// number, so `0.7300000000000000000000000002` settles to `0.73`. Any other
/// value is returned unchanged.
fn settle(value: Decimal) -> DecimalResult<Decimal> {
    let short = value.round_significant(SETTLED_DIGITS);
    if short == value {
        return Ok(value);
    }
    let (_, exponent) = value.to_parts();
    let last_digit = i64::from(exponent) + i64::from(value.significant_digits())
        - i64::from(WORKING_PRECISION);
    let tolerance = i32::try_from(last_digit + NOISE_DIGITS)
        .map(Decimal::power_of_ten)
        .map_err(|_| DecimalError::Overflow)?;
    if value.subtract(&short)?.abs() <= tolerance {
        Ok(short)
    } else {
        Ok(value)
    }
}

/// A bare special unit on one side of a conversion.
struct SpecialSymbol<'t> {
    unit: &'t DefinedUnit,
    function: SpecialFunction,
    prefix: Decimal,
}

impl<'t> UcumEngine<'t> {
    /// Creates an engine with default configuration.
    pub fn new(lookup: &'t dyn TerminologyLookup) -> Self {
        Self::with_config(lookup, EngineConfig::default())
    }

    /// Creates an engine with custom configuration.
    pub fn with_config(lookup: &'t dyn TerminologyLookup, config: EngineConfig) -> Self {
        let cache = config.definition_cache.clone().map(DefinitionCache::new);
        Self {
            lookup,
            config,
            cache,
        }
    }

    /// Returns a reference to the definition cache if enabled.
    pub fn cache(&self) -> Option<&DefinitionCache<'t>> {
        self.cache.as_ref()
    }

    /// Returns a reference to the engine configuration.
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Returns the terminology the engine resolves codes against.
    pub fn terminology(&self) -> &'t dyn TerminologyLookup {
        self.lookup
    }

    fn canonicalizer(&self) -> Canonicalizer<'_, 't> {
        Canonicalizer::new(self.lookup, self.cache.as_ref())
    }

    fn round(&self, value: Decimal) -> UcumResult<Decimal> {
        match self.config.precision {
            Some(digits) => Ok(value.round_significant(digits)),
            None => Ok(settle(value)?),
        }
    }

    // ========================================================================
    // Parsing and canonical forms
    // ========================================================================

    /// Parses a unit expression against the terminology.
    pub fn parse(&self, code: &str) -> UcumResult<Term<'t>> {
        Ok(ucum_expr::parse(self.lookup, code)?)
    }

    /// Reduces a parsed term to canonical form.
    pub fn canonicalize(&self, term: &Term<'t>) -> UcumResult<Canonical<'t>> {
        self.canonicalizer().canonicalize(term)
    }

    /// Parses and reduces a unit expression.
    pub fn canonical_form(&self, code: &str) -> UcumResult<Canonical<'t>> {
        let term = self.parse(code)?;
        self.canonicalize(&term)
    }

    /// Canonical base units of a unit expression as a unit code, e.g.
    /// `mm` gives `m` and `N` gives `g.m.s-2`.
    pub fn get_canonical_units(&self, code: &str) -> UcumResult<String> {
        Ok(self.canonical_form(code)?.unit_code())
    }

    // ========================================================================
    // Validation
    // ========================================================================

    /// Checks that a unit expression parses and canonicalizes.
    ///
    /// The error carries the first problem found, with its position for
    /// syntax errors.
    pub fn validate(&self, code: &str) -> UcumResult<()> {
        self.canonical_form(code).map(|_| ())
    }

    /// Returns true if [`validate`](Self::validate) succeeds.
    pub fn is_valid(&self, code: &str) -> bool {
        self.validate(code).is_ok()
    }

    /// Checks that a unit has the declared property `property`.
    ///
    /// Only an expression consisting of a single unit has a declared
    /// property; compound expressions always pass. Returns a message
    /// describing the mismatch, or `None`.
    pub fn validate_in_property(&self, code: &str, property: &str) -> Option<String> {
        let term = match self.parse(code) {
            Ok(term) => term,
            Err(e) => return Some(format!("unit {code} is not valid: {e}")),
        };
        let canonical = match self.canonicalize(&term) {
            Ok(canonical) => canonical.unit_code(),
            Err(e) => return Some(format!("unit {code} is not valid: {e}")),
        };
        let actual = term.as_symbol()?.unit.property();
        (actual != property).then(|| {
            format!(
                "unit {code} is of the property type {actual} ({canonical}), not {property} as required."
            )
        })
    }

    /// Checks that a unit reduces to the base units `units`, written as a
    /// canonical unit code. Returns a message describing the mismatch, or
    /// `None`.
    pub fn validate_canonical_units(&self, code: &str, units: &str) -> Option<String> {
        match self.get_canonical_units(code) {
            Ok(actual) if actual == units => None,
            Ok(actual) => Some(format!(
                "unit {code} has the base units {actual}, not {units} as required."
            )),
            Err(e) => Some(format!("unit {code} is not valid: {e}")),
        }
    }

    /// Re-checks every defined unit of the terminology.
    ///
    /// Each definition must canonicalize, and each special unit must name a
    /// known conversion function. Unlike every other operation this one does
    /// not stop at the first failure; it returns one diagnostic per broken
    /// unit, in terminology order.
    pub fn validate_ucum(&self) -> Vec<String> {
        let units = self.lookup.defined_units();

        #[cfg(feature = "parallel")]
        let diagnostics: Vec<String> = if self.config.parallel {
            use rayon::prelude::*;
            units
                .par_iter()
                .filter_map(|unit| self.check_definition(unit))
                .collect()
        } else {
            units
                .iter()
                .filter_map(|unit| self.check_definition(unit))
                .collect()
        };

        #[cfg(not(feature = "parallel"))]
        let diagnostics: Vec<String> = units
            .iter()
            .filter_map(|unit| self.check_definition(unit))
            .collect();

        for diagnostic in &diagnostics {
            warn!(%diagnostic, "terminology self-check failed");
        }
        debug!(
            units = units.len(),
            failures = diagnostics.len(),
            "terminology self-check finished"
        );
        diagnostics
    }

    fn check_definition(&self, unit: &'t DefinedUnit) -> Option<String> {
        if unit.is_special {
            match unit.function.as_deref() {
                None => {
                    return Some(format!(
                        "unit {}: special unit has no conversion function",
                        unit.code
                    ))
                }
                Some(name) if SpecialFunction::from_name(name).is_none() => {
                    return Some(format!(
                        "unit {}: unknown special function '{}'",
                        unit.code, name
                    ))
                }
                Some(_) => {}
            }
        }
        self.canonicalizer()
            .defined_unit(unit)
            .err()
            .map(|e| format!("unit {}: {}", unit.code, e))
    }

    // ========================================================================
    // Analysis and comparison
    // ========================================================================

    /// Renders a unit expression with long names, e.g. `mg/dL` gives
    /// `(milligram) / (deciliter)`.
    ///
    /// The expression must also canonicalize; the rendering is for display
    /// only and does not parse back.
    pub fn analyse(&self, code: &str) -> UcumResult<String> {
        let term = self.parse(code)?;
        self.canonicalize(&term)?;
        Ok(Formatter::format_term(&term, Format::Display))
    }

    /// Returns true if both expressions reduce to the same base units.
    pub fn is_comparable(&self, a: &str, b: &str) -> UcumResult<bool> {
        let a = self.canonical_form(a)?;
        let b = self.canonical_form(b)?;
        Ok(a.same_units(&b))
    }

    /// Every non-special defined unit that reduces to exactly the base unit
    /// `code`. Empty when `code` is not a base unit.
    pub fn get_defined_forms(&self, code: &str) -> Vec<&'t DefinedUnit> {
        if self.lookup.base_unit(code).is_none() {
            return Vec::new();
        }
        let mut canonicalizer = self.canonicalizer();
        self.lookup
            .defined_units()
            .iter()
            .filter(|unit| !unit.is_special)
            .filter(|unit| match canonicalizer.defined_unit(*unit) {
                Ok(form) => form.unit_code() == code,
                Err(e) => {
                    debug!(unit = %unit.code, error = %e, "skipping broken definition");
                    false
                }
            })
            .collect()
    }

    // ========================================================================
    // Conversion and arithmetic
    // ========================================================================

    /// Converts `value` measured in `from` into `to`.
    ///
    /// Linear units convert by the ratio of their canonical magnitudes. A
    /// bare special unit (`Cel`, `[degF]`, `[pH]`, ...) on either side goes
    /// through its conversion function instead.
    ///
    /// # Errors
    ///
    /// - [`UcumError::IncomparableUnits`] if the base units differ
    /// - [`UcumError::UnsupportedSpecialConversion`] if a special unit has no
    ///   known conversion function
    pub fn convert(&self, value: &Decimal, from: &str, to: &str) -> UcumResult<Decimal> {
        let from_term = self.parse(from)?;
        let to_term = self.parse(to)?;
        let mut canonicalizer = self.canonicalizer();
        let source = canonicalizer.canonicalize(&from_term)?;
        let target = canonicalizer.canonicalize(&to_term)?;

        if !source.same_units(&target) {
            return Err(UcumError::IncomparableUnits {
                from: from.to_string(),
                to: to.to_string(),
                from_units: source.unit_code(),
                to_units: target.unit_code(),
            });
        }

        let from_special = special_symbol(&from_term, from, to)?;
        let to_special = special_symbol(&to_term, from, to)?;
        debug!(
            from,
            to,
            special = from_special.is_some() || to_special.is_some(),
            "converting"
        );

        // value expressed in the canonical base units
        let base_value = match &from_special {
            Some(special) => {
                let measured = value.multiply(&special.prefix)?;
                let reference = special.function.to_reference(&measured)?;
                let scale = canonicalizer.defined_unit(special.unit)?.magnitude;
                reference.multiply(&scale)?
            }
            None => value.multiply(&source.magnitude)?,
        };

        let result = match &to_special {
            Some(special) => {
                let scale = canonicalizer.defined_unit(special.unit)?.magnitude;
                let reference = base_value.divide(&scale)?;
                special
                    .function
                    .from_reference(&reference)?
                    .divide(&special.prefix)?
            }
            None => base_value.divide(&target.magnitude)?,
        };

        self.round(result)
    }

    /// Multiplies two quantities.
    ///
    /// The value is the product of the values and the unit is the product
    /// expression `a.b`; no unit simplification takes place. Both unit codes
    /// must be valid.
    pub fn multiply(&self, a: &Pair, b: &Pair) -> UcumResult<Pair> {
        self.canonical_form(&a.code)?;
        self.canonical_form(&b.code)?;

        let value = self.round(a.value.multiply(&b.value)?)?;
        let code = if b.code.starts_with('/') {
            format!("{}{}", a.code, b.code)
        } else {
            format!("{}.{}", a.code, b.code)
        };
        Ok(Pair::new(value, code))
    }

    // ========================================================================
    // Terminology queries
    // ========================================================================

    /// Looks up a unit atom by its exact code, without prefixes or
    /// exponents.
    pub fn unit(&self, code: &str) -> UcumResult<UnitRef<'t>> {
        self.lookup
            .unit(code)
            .ok_or_else(|| UcumError::UnknownUnitCode(code.to_string()))
    }

    /// Searches concepts by name, code, print symbol or property.
    pub fn search(
        &self,
        kind: Option<ConceptKind>,
        text: &str,
        is_regex: bool,
    ) -> UcumResult<Vec<ConceptRef<'t>>> {
        Ok(search::search(self.lookup, kind, text, is_regex)?)
    }

    /// Sorted distinct property names of all units.
    pub fn properties(&self) -> Vec<String> {
        search::properties(self.lookup)
    }

    /// Version information of the terminology.
    pub fn identification(&self) -> &'t Identification {
        self.lookup.identification()
    }
}

impl std::fmt::Debug for UcumEngine<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UcumEngine")
            .field("version", &self.lookup.identification().version)
            .field("config", &self.config)
            .field("cache", &self.cache)
            .finish()
    }
}

/// The special unit of a conversion side, if the side is one bare special
/// unit with exponent one.
fn special_symbol<'t>(
    term: &Term<'t>,
    from: &str,
    to: &str,
) -> UcumResult<Option<SpecialSymbol<'t>>> {
    let Some(symbol) = term.as_symbol() else {
        return Ok(None);
    };
    let Some(unit) = symbol.unit.as_defined() else {
        return Ok(None);
    };
    if !unit.is_special || symbol.exponent != 1 {
        return Ok(None);
    }

    let function = unit
        .function
        .as_deref()
        .and_then(SpecialFunction::from_name)
        .ok_or_else(|| UcumError::UnsupportedSpecialConversion {
            from: from.to_string(),
            to: to.to_string(),
        })?;
    Ok(Some(SpecialSymbol {
        unit,
        function,
        prefix: symbol.prefix.map_or(Decimal::ONE, |prefix| prefix.value),
    }))
}
