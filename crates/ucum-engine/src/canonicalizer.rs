//! Reduction of parsed terms to canonical form.

use tracing::trace;
use ucum_expr::{Component, Factor, Operator, Symbol, Term};
use ucum_model::{DefinedUnit, TerminologyLookup, UnitRef};

use crate::cache::DefinitionCache;
use crate::canonical::Canonical;
use crate::error::{UcumError, UcumResult};

/// Walks a term and every definition it refers to.
///
/// One canonicalizer serves one top-level call. It tracks the defined units
/// currently being expanded so that a definition referring back to itself
/// fails with [`UcumError::CyclicDefinition`] instead of recursing forever.
pub(crate) struct Canonicalizer<'e, 't> {
    lookup: &'t dyn TerminologyLookup,
    cache: Option<&'e DefinitionCache<'t>>,
    in_progress: Vec<&'t str>,
}

impl<'e, 't> Canonicalizer<'e, 't> {
    pub(crate) fn new(
        lookup: &'t dyn TerminologyLookup,
        cache: Option<&'e DefinitionCache<'t>>,
    ) -> Self {
        Self {
            lookup,
            cache,
            in_progress: Vec::new(),
        }
    }

    /// Canonical form of a whole term.
    pub(crate) fn canonicalize(&mut self, term: &Term<'t>) -> UcumResult<Canonical<'t>> {
        match term {
            Term::Single(component) => self.component(component),
            Term::Binary { left, op, right } => {
                let left = self.canonicalize(left)?;
                let right = self.component(right)?;
                match op {
                    Operator::Multiply => left.multiply(&right),
                    Operator::Divide => left.divide(&right),
                }
            }
        }
    }

    fn component(&mut self, component: &Component<'t>) -> UcumResult<Canonical<'t>> {
        match component {
            Component::Factor(factor) => factor_form(factor),
            Component::Symbol(symbol) => self.symbol(symbol),
            Component::Term(inner) => self.canonicalize(inner),
        }
    }

    fn symbol(&mut self, symbol: &Symbol<'t>) -> UcumResult<Canonical<'t>> {
        let form = match symbol.unit {
            UnitRef::Base(unit) => Canonical::base(unit),
            UnitRef::Defined(unit) => self.defined_unit(unit)?,
        };
        let form = match symbol.prefix {
            Some(prefix) => form.scale(&prefix.value)?,
            None => form,
        };
        form.powi(symbol.exponent)
    }

    /// Canonical form of a defined unit: its definition's value times the
    /// canonical form of its definition's unit.
    ///
    /// Special units reduce to their reference this way, which is what they
    /// contribute inside compound expressions.
    pub(crate) fn defined_unit(&mut self, unit: &'t DefinedUnit) -> UcumResult<Canonical<'t>> {
        if let Some(cached) = self.cache.and_then(|cache| cache.get(&unit.code)) {
            return Ok(cached);
        }

        if self.in_progress.contains(&unit.code.as_str()) {
            let mut chain: Vec<String> = self.in_progress.iter().map(|c| c.to_string()).collect();
            chain.push(unit.code.clone());
            return Err(UcumError::CyclicDefinition { chain });
        }

        trace!(
            unit = %unit.code,
            definition = %unit.value,
            depth = self.in_progress.len(),
            "canonicalizing definition"
        );
        self.in_progress.push(&unit.code);
        let expanded = self.expand(unit);
        self.in_progress.pop();
        let form = expanded?;

        Ok(match self.cache {
            Some(cache) => cache.insert(&unit.code, form),
            None => form,
        })
    }

    fn expand(&mut self, unit: &'t DefinedUnit) -> UcumResult<Canonical<'t>> {
        let definition = ucum_expr::parse(self.lookup, &unit.value.unit)?;
        self.canonicalize(&definition)?.scale(&unit.value.value)
    }
}

fn factor_form<'t>(factor: &Factor) -> UcumResult<Canonical<'t>> {
    Ok(Canonical::dimensionless(factor.value.powi(factor.exponent)?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use ucum_model::{Decimal, Terminology};

    fn terminology() -> Terminology {
        Terminology::from_json_str(
            r#"{
                "version": "test",
                "prefixes": [
                    { "code": "k", "names": ["kilo"], "value": "1e3" },
                    { "code": "d", "names": ["deci"], "value": "1e-1" },
                    { "code": "c", "names": ["centi"], "value": "1e-2" },
                    { "code": "m", "names": ["milli"], "value": "1e-3" }
                ],
                "baseUnits": [
                    { "code": "m", "names": ["meter"], "property": "length", "dimension": "L" },
                    { "code": "g", "names": ["gram"], "property": "mass", "dimension": "M" },
                    { "code": "s", "names": ["second"], "property": "time", "dimension": "T" },
                    { "code": "K", "names": ["kelvin"], "property": "temperature", "dimension": "C" }
                ],
                "units": [
                    { "code": "N", "names": ["newton"], "property": "force", "isMetric": true,
                      "value": { "unit": "kg.m/s2", "value": "1" } },
                    { "code": "l", "names": ["liter"], "property": "volume", "isMetric": true,
                      "value": { "unit": "dm3", "value": "1" } },
                    { "code": "[in_i]", "names": ["inch"], "property": "length",
                      "value": { "unit": "cm", "value": "2.54" } },
                    { "code": "[ft_i]", "names": ["foot"], "property": "length",
                      "value": { "unit": "[in_i]", "value": "12" } },
                    { "code": "Cel", "names": ["degree Celsius"], "property": "temperature",
                      "isMetric": true, "isSpecial": true, "function": "Cel",
                      "value": { "unit": "K", "value": "1" } },
                    { "code": "[loop_a]", "names": ["loop a"], "property": "test",
                      "value": { "unit": "[loop_b]", "value": "1" } },
                    { "code": "[loop_b]", "names": ["loop b"], "property": "test",
                      "value": { "unit": "[loop_a].m", "value": "2" } }
                ]
            }"#,
        )
        .unwrap()
    }

    fn canonical<'t>(t: &'t Terminology, text: &str) -> UcumResult<Canonical<'t>> {
        let term = ucum_expr::parse(t, text)?;
        Canonicalizer::new(t, None).canonicalize(&term)
    }

    fn dec(text: &str) -> Decimal {
        text.parse().unwrap()
    }

    mod base_units {
        use super::*;

        #[test]
        fn test_base_unit_is_its_own_form() {
            let t = terminology();
            for code in ["m", "g", "s", "K"] {
                let form = canonical(&t, code).unwrap();
                assert_eq!(form.magnitude, Decimal::ONE);
                assert_eq!(form.unit_code(), code);
            }
        }

        #[test]
        fn test_prefix_raised_with_exponent() {
            let t = terminology();
            let form = canonical(&t, "cm2").unwrap();
            assert_eq!(form.magnitude, dec("0.0001"));
            assert_eq!(form.unit_code(), "m2");

            let form = canonical(&t, "mm-1").unwrap();
            assert_eq!(form.magnitude, dec("1000"));
            assert_eq!(form.unit_code(), "m-1");
        }

        #[test]
        fn test_factors() {
            let t = terminology();
            let form = canonical(&t, "10*3/m").unwrap();
            assert_eq!(form.magnitude, dec("1000"));
            assert_eq!(form.unit_code(), "m-1");

            let form = canonical(&t, "4.m").unwrap();
            assert_eq!(form.magnitude, dec("4"));
        }

        #[test]
        fn test_annotations_ignored() {
            let t = terminology();
            let plain = canonical(&t, "kg/m2").unwrap();
            let annotated = canonical(&t, "kg{body}/m2{surface}").unwrap();
            assert_eq!(plain, annotated);
            assert!(canonical(&t, "{cells}").unwrap().is_dimensionless());
        }
    }

    mod defined_units {
        use super::*;

        #[test]
        fn test_nested_definitions() {
            let t = terminology();
            let form = canonical(&t, "[ft_i]").unwrap();
            assert_eq!(form.magnitude, dec("0.3048"));
            assert_eq!(form.unit_code(), "m");
        }

        #[test]
        fn test_compound_definition() {
            let t = terminology();
            let form = canonical(&t, "N").unwrap();
            assert_eq!(form.magnitude, dec("1000"));
            assert_eq!(form.unit_code(), "g.m.s-2");
        }

        #[test]
        fn test_prefixed_defined_unit_with_exponent() {
            let t = terminology();
            let form = canonical(&t, "ml").unwrap();
            assert_eq!(form.magnitude, dec("1e-6"));
            assert_eq!(form.unit_code(), "m3");

            let form = canonical(&t, "[in_i]2").unwrap();
            assert_eq!(form.magnitude, dec("0.00064516"));
            assert_eq!(form.unit_code(), "m2");
        }

        #[test]
        fn test_left_to_right_division() {
            let t = terminology();
            let form = canonical(&t, "m/s/g").unwrap();
            assert_eq!(form.unit_code(), "g-1.m.s-1");
        }

        #[test]
        fn test_special_unit_reduces_to_reference() {
            let t = terminology();
            let form = canonical(&t, "Cel").unwrap();
            assert_eq!(form.magnitude, Decimal::ONE);
            assert_eq!(form.unit_code(), "K");
        }

        #[test]
        fn test_cyclic_definition_detected() {
            let t = terminology();
            match canonical(&t, "[loop_a]") {
                Err(UcumError::CyclicDefinition { chain }) => {
                    assert_eq!(chain, vec!["[loop_a]", "[loop_b]", "[loop_a]"]);
                }
                other => panic!("expected a cycle, got {other:?}"),
            }
        }
    }

    mod caching {
        use super::*;
        use crate::config::CacheConfig;

        #[test]
        fn test_definitions_memoized() {
            let t = terminology();
            let cache = DefinitionCache::new(CacheConfig::default());
            let term = ucum_expr::parse(&t, "[ft_i]").unwrap();

            let first = Canonicalizer::new(&t, Some(&cache)).canonicalize(&term).unwrap();
            assert_eq!(cache.len(), 2);
            let second = Canonicalizer::new(&t, Some(&cache)).canonicalize(&term).unwrap();
            assert_eq!(first, second);
            assert!(cache.stats().hits >= 1);
        }

        #[test]
        fn test_failed_definitions_not_memoized() {
            let t = terminology();
            let cache = DefinitionCache::new(CacheConfig::default());
            let term = ucum_expr::parse(&t, "[loop_a]").unwrap();
            assert!(Canonicalizer::new(&t, Some(&cache)).canonicalize(&term).is_err());
            assert!(cache.is_empty());
        }
    }
}
