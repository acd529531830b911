//! Canonical forms: an exact magnitude times a product of base-unit powers.

use std::cmp::Ordering;
use std::fmt;

use ucum_model::{BaseUnit, Decimal};

use crate::error::{UcumError, UcumResult};

/// One base unit raised to a non-zero power.
#[derive(Debug, Clone, Copy)]
pub struct CanonicalUnit<'t> {
    /// The base unit.
    pub base: &'t BaseUnit,
    /// Its power, never zero.
    pub exponent: i32,
}

impl PartialEq for CanonicalUnit<'_> {
    fn eq(&self, other: &Self) -> bool {
        self.base.code == other.base.code && self.exponent == other.exponent
    }
}

impl Eq for CanonicalUnit<'_> {}

/// A unit expression reduced to `magnitude × Π baseᵉ`.
///
/// Units are kept sorted by base-unit code with at most one entry per base
/// unit, so two canonical forms measure the same kind of quantity exactly
/// when their unit lists are equal.
#[derive(Debug, Clone, PartialEq)]
pub struct Canonical<'t> {
    /// Exact multiplier relative to the base units.
    pub magnitude: Decimal,
    units: Vec<CanonicalUnit<'t>>,
}

impl<'t> Canonical<'t> {
    /// A dimensionless canonical form.
    pub fn dimensionless(magnitude: Decimal) -> Self {
        Self {
            magnitude,
            units: Vec::new(),
        }
    }

    /// A single base unit with magnitude one.
    pub fn base(unit: &'t BaseUnit) -> Self {
        Self {
            magnitude: Decimal::ONE,
            units: vec![CanonicalUnit {
                base: unit,
                exponent: 1,
            }],
        }
    }

    /// The sorted base-unit powers.
    pub fn units(&self) -> &[CanonicalUnit<'t>] {
        &self.units
    }

    /// True if no base unit remains.
    pub fn is_dimensionless(&self) -> bool {
        self.units.is_empty()
    }

    /// True if both forms have the same base-unit signature.
    pub fn same_units(&self, other: &Canonical<'_>) -> bool {
        self.units.len() == other.units.len()
            && self
                .units
                .iter()
                .zip(&other.units)
                .all(|(a, b)| a.base.code == b.base.code && a.exponent == b.exponent)
    }

    /// Multiplies the magnitude by `factor`.
    pub fn scale(mut self, factor: &Decimal) -> UcumResult<Self> {
        self.magnitude = self.magnitude.multiply(factor)?;
        Ok(self)
    }

    /// Product of two canonical forms.
    pub fn multiply(&self, other: &Canonical<'t>) -> UcumResult<Self> {
        let mut result = Self {
            magnitude: self.magnitude.multiply(&other.magnitude)?,
            units: self.units.clone(),
        };
        for unit in &other.units {
            result.add_power(unit.base, Some(unit.exponent))?;
        }
        Ok(result)
    }

    /// Quotient of two canonical forms.
    pub fn divide(&self, other: &Canonical<'t>) -> UcumResult<Self> {
        let mut result = Self {
            magnitude: self.magnitude.divide(&other.magnitude)?,
            units: self.units.clone(),
        };
        for unit in &other.units {
            result.add_power(unit.base, unit.exponent.checked_neg())?;
        }
        Ok(result)
    }

    /// Raises magnitude and every base-unit power to `exponent`.
    pub fn powi(mut self, exponent: i32) -> UcumResult<Self> {
        if exponent == 1 {
            return Ok(self);
        }
        self.magnitude = self.magnitude.powi(exponent)?;
        if exponent == 0 {
            self.units.clear();
        }
        for unit in &mut self.units {
            unit.exponent = unit
                .exponent
                .checked_mul(exponent)
                .ok_or_else(|| overflow(unit.base))?;
        }
        Ok(self)
    }

    /// Adds `base^exponent`; `None` is an exponent that already overflowed.
    fn add_power(&mut self, base: &'t BaseUnit, exponent: Option<i32>) -> UcumResult<()> {
        let exponent = exponent.ok_or_else(|| overflow(base))?;
        let position = self
            .units
            .binary_search_by(|unit| unit.base.code.as_str().cmp(base.code.as_str()));
        match position {
            Ok(index) => {
                let total = self.units[index]
                    .exponent
                    .checked_add(exponent)
                    .ok_or_else(|| overflow(base))?;
                if total == 0 {
                    self.units.remove(index);
                } else {
                    self.units[index].exponent = total;
                }
            }
            Err(index) if exponent != 0 => {
                self.units.insert(index, CanonicalUnit { base, exponent });
            }
            Err(_) => {}
        }
        Ok(())
    }

    /// The base-unit signature as a unit code, e.g. `g.m.s-2`, or `1` when
    /// dimensionless.
    pub fn unit_code(&self) -> String {
        if self.units.is_empty() {
            return "1".to_string();
        }
        self.units
            .iter()
            .map(|unit| match unit.exponent {
                1 => unit.base.code.clone(),
                exponent => format!("{}{}", unit.base.code, exponent),
            })
            .collect::<Vec<_>>()
            .join(".")
    }

    /// Orders canonical forms with the same signature by magnitude.
    pub fn compare_magnitude(&self, other: &Canonical<'_>) -> Option<Ordering> {
        self.same_units(other)
            .then(|| self.magnitude.cmp(&other.magnitude))
    }
}

fn overflow(base: &BaseUnit) -> UcumError {
    UcumError::ExponentOverflow {
        unit: base.code.clone(),
    }
}

impl fmt::Display for Canonical<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.magnitude, self.unit_code())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base(code: &str) -> BaseUnit {
        BaseUnit {
            code: code.to_string(),
            code_upper: code.to_uppercase(),
            names: vec![code.to_string()],
            print_symbol: None,
            property: "test".to_string(),
            dimension: 'X',
        }
    }

    #[test]
    fn test_units_sorted_and_merged() {
        let (m, s, g) = (base("m"), base("s"), base("g"));
        let product = Canonical::base(&s)
            .multiply(&Canonical::base(&m))
            .unwrap()
            .multiply(&Canonical::base(&g))
            .unwrap()
            .multiply(&Canonical::base(&m))
            .unwrap();
        assert_eq!(product.unit_code(), "g.m2.s");
    }

    #[test]
    fn test_zero_exponent_removed() {
        let m = base("m");
        let ratio = Canonical::base(&m).divide(&Canonical::base(&m)).unwrap();
        assert!(ratio.is_dimensionless());
        assert_eq!(ratio.unit_code(), "1");
        assert_eq!(ratio.magnitude, Decimal::ONE);
    }

    #[test]
    fn test_powi_scales_magnitude_and_exponents() {
        let m = base("m");
        let centimeter = Canonical::base(&m).scale(&"0.01".parse().unwrap()).unwrap();
        let squared = centimeter.clone().powi(2).unwrap();
        assert_eq!(squared.magnitude.to_string(), "0.0001");
        assert_eq!(squared.unit_code(), "m2");

        let inverse = centimeter.powi(-1).unwrap();
        assert_eq!(inverse.magnitude.to_string(), "100");
        assert_eq!(inverse.unit_code(), "m-1");
    }

    #[test]
    fn test_powi_zero_is_dimensionless_one() {
        let m = base("m");
        let none = Canonical::base(&m).scale(&Decimal::TEN).unwrap().powi(0).unwrap();
        assert!(none.is_dimensionless());
        assert_eq!(none.magnitude, Decimal::ONE);
    }

    #[test]
    fn test_same_units_ignores_magnitude() {
        let m = base("m");
        let meter = Canonical::base(&m);
        let kilometer = Canonical::base(&m).scale(&"1000".parse().unwrap()).unwrap();
        assert!(meter.same_units(&kilometer));
        assert_eq!(meter.compare_magnitude(&kilometer), Some(Ordering::Less));

        let s = base("s");
        assert!(!meter.same_units(&Canonical::base(&s)));
        assert_eq!(meter.compare_magnitude(&Canonical::base(&s)), None);
    }

    #[test]
    fn test_exponent_overflow_is_an_error() {
        let s = base("s");
        let big = Canonical::base(&s).powi(i32::MAX).unwrap();
        assert!(matches!(
            big.multiply(&Canonical::base(&s)),
            Err(UcumError::ExponentOverflow { unit }) if unit == "s"
        ));

        let m = base("m");
        let small = Canonical::base(&m).powi(i32::MIN).unwrap();
        let one = Canonical::dimensionless(Decimal::ONE);
        assert!(matches!(
            one.divide(&small),
            Err(UcumError::ExponentOverflow { .. })
        ));
        assert!(matches!(
            Canonical::base(&m).powi(2).unwrap().powi(i32::MAX),
            Err(UcumError::ExponentOverflow { .. })
        ));
    }

    #[test]
    fn test_display() {
        let m = base("m");
        let s = base("s");
        let speed = Canonical::base(&m)
            .divide(&Canonical::base(&s))
            .unwrap()
            .scale(&"2.5".parse().unwrap())
            .unwrap();
        assert_eq!(speed.to_string(), "2.5 m.s-1");
    }
}
