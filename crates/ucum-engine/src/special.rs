//! Non-linear conversion functions of special units.
//!
//! A special unit such as `Cel` or `[pH]` is not a scalar multiple of its
//! reference unit. Each one names a function that maps a measured value to
//! a value in the unit of its definition (`to_reference`) and back
//! (`from_reference`). Offsets stay in exact decimal arithmetic; logarithmic
//! and trigonometric functions go through `f64`, which is the only place the
//! engine accepts floating-point rounding.

use std::fmt;

use ucum_model::Decimal;

use crate::error::UcumResult;

/// A conversion function named by a special unit's definition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SpecialFunction {
    /// `Cel`: degree Celsius to kelvin.
    Celsius,
    /// `degF`: degree Fahrenheit to degree Rankine.
    Fahrenheit,
    /// `degRe`: degree Réaumur to its absolute scale.
    Reaumur,
    /// `pH`: acidity to molar concentration, `10^-x`.
    Ph,
    /// `ln`: neper, `e^x`.
    NaturalLog,
    /// `lg`: bel, `10^x`.
    Log10,
    /// `2lg`: bel of a field quantity, `10^(x/2)`.
    Log10Twice,
    /// `ld`: bit, `2^x`.
    Log2,
    /// `tanTimes100`: prism diopter to radians.
    TanTimes100,
    /// `100tan`: percent slope to degrees.
    HundredTan,
    /// `hpX`: decimal homeopathic potency, `10^-x`.
    HomeopathicX,
    /// `hpC`: centesimal homeopathic potency, `100^-x`.
    HomeopathicC,
    /// `hpM`: millesimal homeopathic potency, `1000^-x`.
    HomeopathicM,
    /// `hpQ`: quinquagintamillesimal homeopathic potency, `50000^-x`.
    HomeopathicQ,
    /// `sqrt`: square root of a power spectral density.
    SquareRoot,
}

impl SpecialFunction {
    /// Every known function.
    pub const ALL: [SpecialFunction; 15] = [
        SpecialFunction::Celsius,
        SpecialFunction::Fahrenheit,
        SpecialFunction::Reaumur,
        SpecialFunction::Ph,
        SpecialFunction::NaturalLog,
        SpecialFunction::Log10,
        SpecialFunction::Log10Twice,
        SpecialFunction::Log2,
        SpecialFunction::TanTimes100,
        SpecialFunction::HundredTan,
        SpecialFunction::HomeopathicX,
        SpecialFunction::HomeopathicC,
        SpecialFunction::HomeopathicM,
        SpecialFunction::HomeopathicQ,
        SpecialFunction::SquareRoot,
    ];

    /// Looks up a function by the name used in unit definitions.
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|function| function.name() == name)
    }

    /// The name used in unit definitions.
    pub fn name(&self) -> &'static str {
        match self {
            SpecialFunction::Celsius => "Cel",
            SpecialFunction::Fahrenheit => "degF",
            SpecialFunction::Reaumur => "degRe",
            SpecialFunction::Ph => "pH",
            SpecialFunction::NaturalLog => "ln",
            SpecialFunction::Log10 => "lg",
            SpecialFunction::Log10Twice => "2lg",
            SpecialFunction::Log2 => "ld",
            SpecialFunction::TanTimes100 => "tanTimes100",
            SpecialFunction::HundredTan => "100tan",
            SpecialFunction::HomeopathicX => "hpX",
            SpecialFunction::HomeopathicC => "hpC",
            SpecialFunction::HomeopathicM => "hpM",
            SpecialFunction::HomeopathicQ => "hpQ",
            SpecialFunction::SquareRoot => "sqrt",
        }
    }

    /// Maps a value of the special unit onto its reference unit.
    pub fn to_reference(&self, value: &Decimal) -> UcumResult<Decimal> {
        let x = value.to_f64();
        let y = match self {
            SpecialFunction::Celsius => return shifted(value, CELSIUS_ZERO),
            SpecialFunction::Fahrenheit => return shifted(value, FAHRENHEIT_ZERO),
            SpecialFunction::Reaumur => return shifted(value, REAUMUR_ZERO),
            SpecialFunction::SquareRoot => return Ok(value.multiply(value)?),
            SpecialFunction::Ph => 10f64.powf(-x),
            SpecialFunction::NaturalLog => x.exp(),
            SpecialFunction::Log10 => 10f64.powf(x),
            SpecialFunction::Log10Twice => 10f64.powf(x / 2.0),
            SpecialFunction::Log2 => 2f64.powf(x),
            SpecialFunction::TanTimes100 => (x / 100.0).atan(),
            SpecialFunction::HundredTan => (x / 100.0).atan().to_degrees(),
            SpecialFunction::HomeopathicX => 10f64.powf(-x),
            SpecialFunction::HomeopathicC => 100f64.powf(-x),
            SpecialFunction::HomeopathicM => 1000f64.powf(-x),
            SpecialFunction::HomeopathicQ => 50000f64.powf(-x),
        };
        Ok(Decimal::from_f64(y)?)
    }

    /// Maps a value of the reference unit back onto the special unit.
    pub fn from_reference(&self, value: &Decimal) -> UcumResult<Decimal> {
        let y = value.to_f64();
        let x = match self {
            SpecialFunction::Celsius => return shifted(value, -CELSIUS_ZERO),
            SpecialFunction::Fahrenheit => return shifted(value, -FAHRENHEIT_ZERO),
            SpecialFunction::Reaumur => return shifted(value, -REAUMUR_ZERO),
            SpecialFunction::SquareRoot => y.sqrt(),
            SpecialFunction::Ph => -y.log10(),
            SpecialFunction::NaturalLog => y.ln(),
            SpecialFunction::Log10 => y.log10(),
            SpecialFunction::Log10Twice => 2.0 * y.log10(),
            SpecialFunction::Log2 => y.log2(),
            SpecialFunction::TanTimes100 => 100.0 * y.tan(),
            SpecialFunction::HundredTan => 100.0 * y.to_radians().tan(),
            SpecialFunction::HomeopathicX => -y.log10(),
            SpecialFunction::HomeopathicC => -y.log(100.0),
            SpecialFunction::HomeopathicM => -y.log(1000.0),
            SpecialFunction::HomeopathicQ => -y.log(50000.0),
        };
        Ok(Decimal::from_f64(x)?)
    }
}

// zero points of the offset scales, in hundredths of the reference unit
const CELSIUS_ZERO: i128 = 27315;
const FAHRENHEIT_ZERO: i128 = 45967;
const REAUMUR_ZERO: i128 = 21852;

fn shifted(value: &Decimal, hundredths: i128) -> UcumResult<Decimal> {
    Ok(value.add(&Decimal::new(hundredths, -2)?)?)
}

impl fmt::Display for SpecialFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
