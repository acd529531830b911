//! In-memory terminology and its builder.
//!
//! A [`Terminology`] is built once, either programmatically through
//! [`TerminologyBuilder`] or from a JSON document, and is read-only from
//! then on. Lookups by code are hash-indexed; prefixes are kept longest code
//! first so atom resolution can try them in order.

use std::collections::HashMap;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::concept::{BaseUnit, Concept, ConceptKind, ConceptRef, DefinedUnit, Prefix, UnitRef};
use crate::error::{ModelError, ModelResult};
use crate::search;
use crate::traits::TerminologyLookup;

// =============================================================================
// Identification
// =============================================================================

/// Version information of a terminology release.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Identification {
    /// Release version, e.g. `2.1`.
    pub version: String,
    /// Source-control revision of the release.
    #[serde(default)]
    pub revision: String,
    /// Date of the release.
    #[serde(default)]
    pub revision_date: Option<NaiveDate>,
}

/// On-disk shape of a terminology document.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TerminologyDocument {
    #[serde(flatten)]
    identification: Identification,
    #[serde(default)]
    prefixes: Vec<Prefix>,
    #[serde(default)]
    base_units: Vec<BaseUnit>,
    #[serde(default)]
    units: Vec<DefinedUnit>,
}

// =============================================================================
// Terminology
// =============================================================================

#[derive(Debug, Clone, Copy)]
enum UnitSlot {
    Base(usize),
    Defined(usize),
}

/// An immutable, indexed UCUM terminology.
///
/// # Example
///
/// ```rust
/// use ucum_model::{BaseUnit, Prefix, Terminology, TerminologyLookup};
///
/// let terminology = Terminology::builder()
///     .with_prefix(Prefix {
///         code: "k".into(),
///         code_upper: String::new(),
///         names: vec!["kilo".into()],
///         print_symbol: Some("k".into()),
///         value: "1000".parse().unwrap(),
///     })
///     .with_base_unit(BaseUnit {
///         code: "g".into(),
///         code_upper: String::new(),
///         names: vec!["gram".into()],
///         print_symbol: Some("g".into()),
///         property: "mass".into(),
///         dimension: 'M',
///     })
///     .build()
///     .unwrap();
///
/// assert_eq!(terminology.prefixes()[0].code_upper, "K");
/// ```
#[derive(Debug, Clone)]
pub struct Terminology {
    identification: Identification,
    prefixes: Vec<Prefix>,
    base_units: Vec<BaseUnit>,
    defined_units: Vec<DefinedUnit>,
    prefix_index: HashMap<String, usize>,
    unit_index: HashMap<String, UnitSlot>,
}

impl Terminology {
    /// Creates a new builder.
    pub fn builder() -> TerminologyBuilder {
        TerminologyBuilder::default()
    }

    /// Parses a terminology from a JSON document.
    pub fn from_json_str(json: &str) -> ModelResult<Self> {
        let document: TerminologyDocument = serde_json::from_str(json)?;
        Self::from_document(document)
    }

    /// Reads a terminology JSON document from a reader.
    pub fn from_reader<R: Read>(reader: R) -> ModelResult<Self> {
        let document: TerminologyDocument = serde_json::from_reader(reader)?;
        Self::from_document(document)
    }

    /// Reads a terminology JSON document from a file.
    pub fn from_path(path: impl AsRef<Path>) -> ModelResult<Self> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|source| ModelError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        debug!(path = %path.display(), "loading terminology");
        Self::from_reader(BufReader::new(file))
    }

    fn from_document(document: TerminologyDocument) -> ModelResult<Self> {
        TerminologyBuilder {
            identification: document.identification,
            prefixes: document.prefixes,
            base_units: document.base_units,
            defined_units: document.units,
        }
        .build()
    }

    /// Searches concepts by name, code, print symbol or property.
    ///
    /// `kind = None` searches every table. Plain text matches as a
    /// case-insensitive substring; with `is_regex` the text is a regular
    /// expression matched anywhere in the field.
    pub fn search(
        &self,
        kind: Option<ConceptKind>,
        text: &str,
        is_regex: bool,
    ) -> ModelResult<Vec<ConceptRef<'_>>> {
        search::search(self, kind, text, is_regex)
    }

    /// Sorted distinct property names of all units.
    pub fn properties(&self) -> Vec<String> {
        search::properties(self)
    }

    /// Number of prefixes, base units and defined units.
    pub fn len(&self) -> usize {
        self.prefixes.len() + self.base_units.len() + self.defined_units.len()
    }

    /// Returns true if no concept is loaded.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl TerminologyLookup for Terminology {
    fn unit(&self, code: &str) -> Option<UnitRef<'_>> {
        match *self.unit_index.get(code)? {
            UnitSlot::Base(index) => Some(UnitRef::Base(&self.base_units[index])),
            UnitSlot::Defined(index) => Some(UnitRef::Defined(&self.defined_units[index])),
        }
    }

    fn prefix(&self, code: &str) -> Option<&Prefix> {
        self.prefix_index.get(code).map(|&index| &self.prefixes[index])
    }

    fn prefixes(&self) -> &[Prefix] {
        &self.prefixes
    }

    fn base_units(&self) -> &[BaseUnit] {
        &self.base_units
    }

    fn defined_units(&self) -> &[DefinedUnit] {
        &self.defined_units
    }

    fn identification(&self) -> &Identification {
        &self.identification
    }
}

// =============================================================================
// Builder
// =============================================================================

/// Builder for [`Terminology`].
#[derive(Debug, Clone, Default)]
pub struct TerminologyBuilder {
    identification: Identification,
    prefixes: Vec<Prefix>,
    base_units: Vec<BaseUnit>,
    defined_units: Vec<DefinedUnit>,
}

impl TerminologyBuilder {
    /// Sets the release identification.
    pub fn with_identification(mut self, identification: Identification) -> Self {
        self.identification = identification;
        self
    }

    /// Adds a prefix.
    pub fn with_prefix(mut self, prefix: Prefix) -> Self {
        self.prefixes.push(prefix);
        self
    }

    /// Adds a base unit.
    pub fn with_base_unit(mut self, unit: BaseUnit) -> Self {
        self.base_units.push(unit);
        self
    }

    /// Adds a defined unit.
    pub fn with_unit(mut self, unit: DefinedUnit) -> Self {
        self.defined_units.push(unit);
        self
    }

    /// Validates the records and builds the indexes.
    ///
    /// Fails on duplicate codes within the prefix table or across the two
    /// unit tables, on concepts without names, on zero-valued prefixes and
    /// on special units without a conversion function.
    pub fn build(self) -> ModelResult<Terminology> {
        let TerminologyBuilder {
            identification,
            mut prefixes,
            mut base_units,
            mut defined_units,
        } = self;

        for prefix in &mut prefixes {
            check_names(&*prefix)?;
            if prefix.value.is_zero() {
                return Err(invalid(&prefix.code, "prefix value is zero"));
            }
            fill_upper(&prefix.code, &mut prefix.code_upper);
        }
        for unit in &mut base_units {
            check_names(&*unit)?;
            fill_upper(&unit.code, &mut unit.code_upper);
        }
        for unit in &mut defined_units {
            check_names(&*unit)?;
            if unit.is_special && unit.function.is_none() {
                return Err(invalid(&unit.code, "special unit without a conversion function"));
            }
            fill_upper(&unit.code, &mut unit.code_upper);
            fill_upper(&unit.value.unit, &mut unit.value.unit_upper);
            if unit.value.text.is_empty() {
                unit.value.text = unit.value.value.to_string();
            }
        }

        // longest first; stable so equal lengths keep load order
        prefixes.sort_by(|a, b| b.code.len().cmp(&a.code.len()));

        let mut prefix_index = HashMap::with_capacity(prefixes.len());
        for (index, prefix) in prefixes.iter().enumerate() {
            if prefix_index.insert(prefix.code.clone(), index).is_some() {
                return Err(duplicate(ConceptKind::Prefix, &prefix.code));
            }
        }

        let mut unit_index = HashMap::with_capacity(base_units.len() + defined_units.len());
        for (index, unit) in base_units.iter().enumerate() {
            if unit_index.insert(unit.code.clone(), UnitSlot::Base(index)).is_some() {
                return Err(duplicate(ConceptKind::BaseUnit, &unit.code));
            }
        }
        for (index, unit) in defined_units.iter().enumerate() {
            if unit_index.insert(unit.code.clone(), UnitSlot::Defined(index)).is_some() {
                return Err(duplicate(ConceptKind::Unit, &unit.code));
            }
        }

        debug!(
            version = %identification.version,
            prefixes = prefixes.len(),
            base_units = base_units.len(),
            units = defined_units.len(),
            "terminology built"
        );

        Ok(Terminology {
            identification,
            prefixes,
            base_units,
            defined_units,
            prefix_index,
            unit_index,
        })
    }
}

fn check_names(concept: &impl Concept) -> ModelResult<()> {
    if concept.names().is_empty() {
        return Err(ModelError::MissingName(concept.code().to_string()));
    }
    Ok(())
}

fn fill_upper(code: &str, upper: &mut String) {
    if upper.is_empty() {
        *upper = code.to_uppercase();
    }
}

fn invalid(code: &str, message: &str) -> ModelError {
    ModelError::InvalidConcept {
        code: code.to_string(),
        message: message.to_string(),
    }
}

fn duplicate(kind: ConceptKind, code: &str) -> ModelError {
    ModelError::DuplicateCode {
        kind: kind.label(),
        code: code.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::concept::Value;
    use crate::decimal::Decimal;

    fn prefix(code: &str, name: &str, value: &str) -> Prefix {
        Prefix {
            code: code.to_string(),
            code_upper: String::new(),
            names: vec![name.to_string()],
            print_symbol: Some(code.to_string()),
            value: value.parse().unwrap(),
        }
    }

    fn meter() -> BaseUnit {
        BaseUnit {
            code: "m".to_string(),
            code_upper: String::new(),
            names: vec!["meter".to_string()],
            print_symbol: Some("m".to_string()),
            property: "length".to_string(),
            dimension: 'L',
        }
    }

    fn unit(code: &str, value: &str, of: &str) -> DefinedUnit {
        DefinedUnit {
            code: code.to_string(),
            code_upper: String::new(),
            names: vec![code.to_string()],
            print_symbol: None,
            property: "length".to_string(),
            class: "test".to_string(),
            is_metric: false,
            is_special: false,
            is_arbitrary: false,
            value: Value::new(value.parse().unwrap(), of),
            function: None,
        }
    }

    #[test]
    fn test_build_indexes_units() {
        let terminology = Terminology::builder()
            .with_base_unit(meter())
            .with_unit(unit("[ft_i]", "0.3048", "m"))
            .build()
            .unwrap();

        assert!(matches!(terminology.unit("m"), Some(UnitRef::Base(_))));
        assert!(matches!(terminology.unit("[ft_i]"), Some(UnitRef::Defined(_))));
        assert!(terminology.unit("ft").is_none());
        assert_eq!(terminology.base_unit("m").unwrap().code_upper, "M");
        assert!(terminology.base_unit("[ft_i]").is_none());
        assert_eq!(
            terminology.defined_unit("[ft_i]").unwrap().value.value,
            "0.3048".parse::<Decimal>().unwrap()
        );
        assert_eq!(terminology.len(), 2);
    }

    #[test]
    fn test_prefixes_sorted_longest_first() {
        let terminology = Terminology::builder()
            .with_prefix(prefix("d", "deci", "0.1"))
            .with_prefix(prefix("da", "deka", "10"))
            .with_prefix(prefix("c", "centi", "0.01"))
            .build()
            .unwrap();

        let codes: Vec<&str> = terminology.prefixes().iter().map(|p| p.code.as_str()).collect();
        assert_eq!(codes, vec!["da", "d", "c"]);
        assert_eq!(terminology.prefix("c").unwrap().names[0], "centi");
    }

    #[test]
    fn test_duplicate_unit_code_rejected() {
        let result = Terminology::builder()
            .with_base_unit(meter())
            .with_unit(unit("m", "1", "m"))
            .build();

        match result {
            Err(ModelError::DuplicateCode { kind, code }) => {
                assert_eq!(kind, "unit");
                assert_eq!(code, "m");
            }
            other => panic!("expected duplicate code, got {:?}", other),
        }
    }

    #[test]
    fn test_duplicate_prefix_rejected() {
        let result = Terminology::builder()
            .with_prefix(prefix("k", "kilo", "1000"))
            .with_prefix(prefix("k", "kilo", "1000"))
            .build();
        assert!(matches!(result, Err(ModelError::DuplicateCode { kind: "prefix", .. })));
    }

    #[test]
    fn test_missing_names_rejected() {
        let mut nameless = meter();
        nameless.names.clear();
        let result = Terminology::builder().with_base_unit(nameless).build();
        assert!(matches!(result, Err(ModelError::MissingName(code)) if code == "m"));
    }

    #[test]
    fn test_special_unit_requires_function() {
        let mut celsius = unit("Cel", "1", "K");
        celsius.is_special = true;
        let result = Terminology::builder().with_unit(celsius).build();
        assert!(matches!(result, Err(ModelError::InvalidConcept { .. })));
    }

    #[test]
    fn test_from_json_str() {
        let json = r#"{
            "version": "2.1",
            "revision": "N/A",
            "revisionDate": "2017-11-21",
            "prefixes": [
                { "code": "m", "names": ["milli"], "printSymbol": "m", "value": "1e-3" }
            ],
            "baseUnits": [
                { "code": "m", "names": ["meter"], "property": "length", "dimension": "L" }
            ],
            "units": [
                { "code": "[in_i]", "names": ["inch"], "property": "length",
                  "value": { "unit": "cm", "value": "2.54" } }
            ]
        }"#;
        let terminology = Terminology::from_json_str(json).unwrap();

        let identification = terminology.identification();
        assert_eq!(identification.version, "2.1");
        assert_eq!(
            identification.revision_date,
            NaiveDate::from_ymd_opt(2017, 11, 21)
        );
        assert_eq!(
            terminology.prefix("m").unwrap().value,
            "0.001".parse::<Decimal>().unwrap()
        );
        let inch = terminology.defined_unit("[in_i]").unwrap();
        assert_eq!(inch.code_upper, "[IN_I]");
        assert_eq!(inch.value.unit_upper, "CM");
        assert_eq!(inch.value.text, "2.54");
    }

    #[test]
    fn test_from_json_str_malformed() {
        let result = Terminology::from_json_str(r#"{ "version": 2.1 "#);
        assert!(matches!(result, Err(ModelError::Document(_))));
    }
}
