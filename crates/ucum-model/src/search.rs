//! Concept search and property listing over any [`TerminologyLookup`].

use std::collections::BTreeSet;

use regex::Regex;

use crate::concept::{Concept, ConceptKind, ConceptRef, UnitRef};
use crate::error::ModelResult;
use crate::traits::TerminologyLookup;

enum Matcher {
    Pattern(Regex),
    Substring(String),
}

impl Matcher {
    fn new(text: &str, is_regex: bool) -> ModelResult<Self> {
        if is_regex {
            Ok(Matcher::Pattern(Regex::new(text)?))
        } else {
            Ok(Matcher::Substring(text.to_lowercase()))
        }
    }

    fn matches(&self, value: &str) -> bool {
        match self {
            Matcher::Pattern(regex) => regex.is_match(value),
            Matcher::Substring(needle) => value.to_lowercase().contains(needle.as_str()),
        }
    }

    fn matches_concept(&self, concept: &dyn Concept) -> bool {
        concept.names().iter().any(|name| self.matches(name))
            || self.matches(concept.code())
            || self.matches(concept.code_upper())
            || concept.print_symbol().is_some_and(|symbol| self.matches(symbol))
    }

    fn matches_unit(&self, unit: UnitRef<'_>) -> bool {
        self.matches(unit.property()) || self.matches_concept(&unit)
    }
}

/// Finds concepts whose names, codes, print symbol or (for units) property
/// match `text`.
///
/// Results come in table order: prefixes, base units, defined units.
pub fn search<'a, L>(
    lookup: &'a L,
    kind: Option<ConceptKind>,
    text: &str,
    is_regex: bool,
) -> ModelResult<Vec<ConceptRef<'a>>>
where
    L: TerminologyLookup + ?Sized,
{
    let matcher = Matcher::new(text, is_regex)?;
    let wanted = |candidate: ConceptKind| kind.map_or(true, |kind| kind == candidate);
    let mut found = Vec::new();

    if wanted(ConceptKind::Prefix) {
        found.extend(
            lookup
                .prefixes()
                .iter()
                .filter(|prefix| matcher.matches_concept(*prefix))
                .map(ConceptRef::Prefix),
        );
    }
    if wanted(ConceptKind::BaseUnit) {
        found.extend(
            lookup
                .base_units()
                .iter()
                .filter(|unit| matcher.matches_unit(UnitRef::Base(unit)))
                .map(ConceptRef::Base),
        );
    }
    if wanted(ConceptKind::Unit) {
        found.extend(
            lookup
                .defined_units()
                .iter()
                .filter(|unit| matcher.matches_unit(UnitRef::Defined(unit)))
                .map(ConceptRef::Defined),
        );
    }

    Ok(found)
}

/// Sorted distinct property names of every base and defined unit.
pub fn properties<L>(lookup: &L) -> Vec<String>
where
    L: TerminologyLookup + ?Sized,
{
    let base = lookup.base_units().iter().map(|unit| unit.property.as_str());
    let defined = lookup.defined_units().iter().map(|unit| unit.property.as_str());
    base.chain(defined)
        .collect::<BTreeSet<_>>()
        .into_iter()
        .map(str::to_string)
        .collect()
}
