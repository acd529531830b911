//! Exact decimal numbers for unit magnitudes.
//!
//! A [`Decimal`] is an `i128` coefficient of at most [`WORKING_PRECISION`]
//! significant digits and a power-of-ten exponent. Terminating results of
//! addition, subtraction, multiplication and division are exact; a result
//! that needs more digits is rounded half-to-even at the last working digit.
//! The wide multiply/divide steps run on `rust_decimal` with both significands
//! scaled into `[1, 10)`.

use std::cmp::Ordering;
use std::fmt;
use std::ops::Neg;
use std::str::FromStr;

use rust_decimal::Decimal as WideDecimal;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::{DecimalError, DecimalResult};

/// Number of significant digits carried by every [`Decimal`].
pub const WORKING_PRECISION: u32 = 28;

/// Exclusive upper bound of a normalized coefficient.
const COEFFICIENT_LIMIT: u128 = 10_u128.pow(WORKING_PRECISION);

/// Widest coefficient used while aligning operands for addition.
const ALIGN_DIGITS: i64 = 37;

/// An exact decimal number: `coefficient × 10^exponent`.
///
/// The representation is unique per value (trailing zeros are stripped from
/// the coefficient and zero is always `0 × 10^0`), so equality and hashing
/// are numeric.
///
/// # Example
///
/// ```rust
/// use ucum_model::Decimal;
///
/// let milli: Decimal = "0.001".parse().unwrap();
/// let kilo: Decimal = "1e3".parse().unwrap();
/// assert_eq!(milli.multiply(&kilo).unwrap(), Decimal::ONE);
/// assert_eq!(Decimal::ONE.divide(&kilo).unwrap(), milli);
/// ```
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Decimal {
    coefficient: i128,
    exponent: i32,
}

impl Decimal {
    /// The value zero.
    pub const ZERO: Decimal = Decimal {
        coefficient: 0,
        exponent: 0,
    };

    /// The value one.
    pub const ONE: Decimal = Decimal {
        coefficient: 1,
        exponent: 0,
    };

    /// The value ten.
    pub const TEN: Decimal = Decimal {
        coefficient: 1,
        exponent: 1,
    };

    /// Creates `coefficient × 10^exponent`, rounding to the working precision.
    ///
    /// Fails with [`DecimalError::Overflow`] when rounding or stripping
    /// trailing zeros pushes the exponent past `i32::MAX`.
    pub fn new(coefficient: i128, exponent: i32) -> DecimalResult<Self> {
        normalized(coefficient, i64::from(exponent))
    }

    fn integer(value: i128) -> Self {
        let mut coefficient = value;
        let mut exponent = 0;
        while coefficient != 0 && coefficient % 10 == 0 {
            coefficient /= 10;
            exponent += 1;
        }
        Self {
            coefficient,
            exponent,
        }
    }

    /// Returns the power of ten `10^exponent`.
    pub fn power_of_ten(exponent: i32) -> Self {
        Self {
            coefficient: 1,
            exponent,
        }
    }

    /// Returns the coefficient and exponent of the normalized representation.
    pub fn to_parts(&self) -> (i128, i32) {
        (self.coefficient, self.exponent)
    }

    /// Returns true if the value is zero.
    pub fn is_zero(&self) -> bool {
        self.coefficient == 0
    }

    /// Returns true if the value is strictly below zero.
    pub fn is_negative(&self) -> bool {
        self.coefficient < 0
    }

    /// Returns true if the value has no fractional part.
    pub fn is_integer(&self) -> bool {
        self.exponent >= 0 || self.is_zero()
    }

    /// Returns true if the value is exactly one.
    pub fn is_one(&self) -> bool {
        *self == Self::ONE
    }

    /// Absolute value.
    pub fn abs(&self) -> Self {
        Self {
            coefficient: self.coefficient.abs(),
            exponent: self.exponent,
        }
    }

    /// Additive inverse.
    pub fn negate(&self) -> Self {
        Self {
            coefficient: -self.coefficient,
            exponent: self.exponent,
        }
    }

    /// Number of significant digits in the coefficient.
    pub fn significant_digits(&self) -> u32 {
        digit_count(self.coefficient)
    }

    /// Sum of two decimals.
    ///
    /// Exact unless the operands lie more than 37 decades apart, in which
    /// case the smaller one is rounded first.
    pub fn add(&self, other: &Decimal) -> DecimalResult<Decimal> {
        sum(self, other)
    }

    /// Difference of two decimals.
    pub fn subtract(&self, other: &Decimal) -> DecimalResult<Decimal> {
        sum(self, &other.negate())
    }

    /// Product of two decimals.
    ///
    /// Fails only when the exponent leaves the `i32` range.
    pub fn multiply(&self, other: &Decimal) -> DecimalResult<Decimal> {
        if self.is_zero() || other.is_zero() {
            return Ok(Self::ZERO);
        }
        let (a, ea) = self.significand()?;
        let (b, eb) = other.significand()?;
        from_wide(a * b, ea + eb)
    }

    /// Quotient of two decimals.
    ///
    /// Non-terminating quotients are rounded half-to-even at the last
    /// working digit.
    pub fn divide(&self, divisor: &Decimal) -> DecimalResult<Decimal> {
        if divisor.is_zero() {
            return Err(DecimalError::DivisionByZero);
        }
        if self.is_zero() {
            return Ok(Self::ZERO);
        }
        let (a, ea) = self.significand()?;
        let (b, eb) = divisor.significand()?;
        let quotient = a.checked_div(b).ok_or(DecimalError::Overflow)?;
        from_wide(quotient, ea - eb)
    }

    /// Raises the value to an integer power by repeated squaring.
    ///
    /// Negative powers divide one by the positive power; `0^n` with `n < 0`
    /// is a division by zero.
    pub fn powi(&self, exponent: i32) -> DecimalResult<Decimal> {
        if exponent < 0 {
            let positive = self.powi_unsigned(exponent.unsigned_abs())?;
            return Self::ONE.divide(&positive);
        }
        self.powi_unsigned(exponent.unsigned_abs())
    }

    fn powi_unsigned(&self, mut exponent: u32) -> DecimalResult<Decimal> {
        let mut result = Self::ONE;
        let mut base = *self;
        while exponent > 0 {
            if exponent & 1 == 1 {
                result = result.multiply(&base)?;
            }
            exponent >>= 1;
            if exponent > 0 {
                base = base.multiply(&base)?;
            }
        }
        Ok(result)
    }

    /// Rounds half-to-even to the given number of significant digits.
    pub fn round_significant(&self, digits: u32) -> Decimal {
        let current = digit_count(self.coefficient);
        if digits == 0 || current <= digits {
            return *self;
        }
        let dropped = current - digits;
        let coefficient = round_half_even(self.coefficient, dropped);
        normalized(coefficient, i64::from(self.exponent) + i64::from(dropped))
            .unwrap_or(*self)
    }

    /// Converts an integral value to `i64`.
    pub fn to_i64(&self) -> Option<i64> {
        if !self.is_integer() {
            return None;
        }
        let scale = 10_i128.checked_pow(u32::try_from(self.exponent).ok()?)?;
        i64::try_from(self.coefficient.checked_mul(scale)?).ok()
    }

    /// Nearest `f64`. Loses precision beyond 17 digits.
    pub fn to_f64(&self) -> f64 {
        format!("{}e{}", self.coefficient, self.exponent)
            .parse::<f64>()
            .unwrap_or(f64::NAN)
    }

    /// Converts a finite `f64` through its shortest round-trip representation.
    pub fn from_f64(value: f64) -> DecimalResult<Decimal> {
        if !value.is_finite() {
            return Err(DecimalError::NotFinite(value.to_string()));
        }
        format!("{:e}", value).parse()
    }

    /// Returns the value as `significand × 10^exponent` with `1 <= |significand| < 10`.
    fn significand(&self) -> DecimalResult<(WideDecimal, i64)> {
        let digits = digit_count(self.coefficient);
        let wide = WideDecimal::try_from_i128_with_scale(self.coefficient, digits - 1)
            .map_err(|_| DecimalError::Overflow)?;
        Ok((wide, i64::from(self.exponent) + i64::from(digits) - 1))
    }

    /// Power of ten just above the most significant digit.
    fn top(&self) -> i64 {
        i64::from(self.exponent) + i64::from(digit_count(self.coefficient))
    }
}

/// Number of decimal digits of `value`, counting zero as one digit.
fn digit_count(value: i128) -> u32 {
    value
        .unsigned_abs()
        .checked_ilog10()
        .map_or(1, |log| log + 1)
}

/// Divides by `10^places`, rounding half to even.
fn round_half_even(value: i128, places: u32) -> i128 {
    if places == 0 {
        return value;
    }
    if places > 38 {
        return 0;
    }
    let divisor = 10_i128.pow(places);
    let quotient = value / divisor;
    let remainder = (value % divisor).abs();
    let half = divisor / 2;
    let round_away = remainder > half || (remainder == half && quotient % 2 != 0);
    if round_away {
        quotient + value.signum()
    } else {
        quotient
    }
}

/// Sum of two decimals, aligned on a shared power of ten.
fn sum(a: &Decimal, b: &Decimal) -> DecimalResult<Decimal> {
    if a.is_zero() {
        return Ok(*b);
    }
    if b.is_zero() {
        return Ok(*a);
    }

    let top = a.top().max(b.top());
    let base = i64::from(a.exponent.min(b.exponent)).max(top - ALIGN_DIGITS);
    let total = align(a, base) + align(b, base);
    normalized(total, base)
}

/// Expresses the coefficient of `value` against the power of ten `base`.
fn align(value: &Decimal, base: i64) -> i128 {
    let shift = i64::from(value.exponent) - base;
    if shift >= 0 {
        value.coefficient * 10_i128.pow(shift as u32)
    } else {
        round_half_even(value.coefficient, u32::try_from(-shift).unwrap_or(u32::MAX))
    }
}

/// Builds the unique representation of `coefficient × 10^exponent`.
fn normalized(coefficient: i128, exponent: i64) -> DecimalResult<Decimal> {
    if coefficient == 0 {
        return Ok(Decimal::ZERO);
    }

    let mut coefficient = coefficient;
    let mut exponent = exponent;

    let digits = digit_count(coefficient);
    if digits > WORKING_PRECISION {
        let excess = digits - WORKING_PRECISION;
        coefficient = round_half_even(coefficient, excess);
        exponent += i64::from(excess);
        // 9.99..95 rounds up to 10.00..0
        if coefficient.unsigned_abs() >= COEFFICIENT_LIMIT {
            coefficient /= 10;
            exponent += 1;
        }
    }

    while coefficient % 10 == 0 {
        coefficient /= 10;
        exponent += 1;
    }

    let exponent = i32::try_from(exponent).map_err(|_| DecimalError::Overflow)?;
    Ok(Decimal {
        coefficient,
        exponent,
    })
}

/// Converts a `rust_decimal` result scaled by `10^exponent`.
fn from_wide(value: WideDecimal, exponent: i64) -> DecimalResult<Decimal> {
    normalized(value.mantissa(), exponent - i64::from(value.scale()))
}

impl Ord for Decimal {
    fn cmp(&self, other: &Self) -> Ordering {
        let (sa, sb) = (self.coefficient.signum(), other.coefficient.signum());
        if sa != sb {
            return sa.cmp(&sb);
        }
        if sa == 0 {
            return Ordering::Equal;
        }
        let magnitude = compare_magnitude(self, other);
        if sa > 0 {
            magnitude
        } else {
            magnitude.reverse()
        }
    }
}

impl PartialOrd for Decimal {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

fn compare_magnitude(a: &Decimal, b: &Decimal) -> Ordering {
    match a.top().cmp(&b.top()) {
        Ordering::Equal => {}
        decided => return decided,
    }
    let (da, db) = (digit_count(a.coefficient), digit_count(b.coefficient));
    let (x, y) = (a.coefficient.unsigned_abs(), b.coefficient.unsigned_abs());
    if da >= db {
        x.cmp(&(y * 10_u128.pow(da - db)))
    } else {
        (x * 10_u128.pow(db - da)).cmp(&y)
    }
}

impl FromStr for Decimal {
    type Err = DecimalError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || DecimalError::Invalid(s.to_string());
        let text = s.trim();

        let (body, exponent) = match text.find(|c: char| c == 'e' || c == 'E') {
            Some(at) => {
                let exponent = text[at + 1..].parse::<i32>().map_err(|_| invalid())?;
                (&text[..at], i64::from(exponent))
            }
            None => (text, 0),
        };

        let (negative, body) = match body.strip_prefix('-') {
            Some(rest) => (true, rest),
            None => (false, body.strip_prefix('+').unwrap_or(body)),
        };

        let (whole, fraction) = body.split_once('.').unwrap_or((body, ""));
        if whole.is_empty() && fraction.is_empty() {
            return Err(invalid());
        }
        if !whole.bytes().chain(fraction.bytes()).all(|b| b.is_ascii_digit()) {
            return Err(invalid());
        }

        let digits = format!("{whole}{fraction}");
        let digits = digits.trim_start_matches('0');
        if digits.is_empty() {
            return Ok(Self::ZERO);
        }

        // anything past 38 digits sits far below the working precision
        let kept = &digits[..digits.len().min(38)];
        let dropped = (digits.len() - kept.len()) as i64;
        let coefficient: i128 = kept.parse().map_err(|_| invalid())?;
        let coefficient = if negative { -coefficient } else { coefficient };

        normalized(coefficient, exponent - fraction.len() as i64 + dropped)
    }
}

impl fmt::Display for Decimal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.coefficient == 0 {
            return f.write_str("0");
        }
        if self.coefficient < 0 {
            f.write_str("-")?;
        }

        let digits = self.coefficient.unsigned_abs().to_string();
        let len = digits.len() as i64;
        let point = len + i64::from(self.exponent);

        if self.exponent >= 0 && point <= 40 {
            write!(f, "{}{}", digits, "0".repeat(self.exponent as usize))
        } else if self.exponent < 0 && point > 0 {
            let (whole, fraction) = digits.split_at(point as usize);
            write!(f, "{}.{}", whole, fraction)
        } else if point <= 0 && point > -30 {
            write!(f, "0.{}{}", "0".repeat((-point) as usize), digits)
        } else {
            let (lead, rest) = digits.split_at(1);
            if rest.is_empty() {
                write!(f, "{}e{}", lead, point - 1)
            } else {
                write!(f, "{}.{}e{}", lead, rest, point - 1)
            }
        }
    }
}

impl fmt::Debug for Decimal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Decimal({})", self)
    }
}

impl Default for Decimal {
    fn default() -> Self {
        Self::ZERO
    }
}

impl From<i64> for Decimal {
    fn from(value: i64) -> Self {
        Self::integer(i128::from(value))
    }
}

impl From<i32> for Decimal {
    fn from(value: i32) -> Self {
        Self::integer(i128::from(value))
    }
}

impl From<u64> for Decimal {
    fn from(value: u64) -> Self {
        Self::integer(i128::from(value))
    }
}

impl Neg for Decimal {
    type Output = Decimal;

    fn neg(self) -> Decimal {
        self.negate()
    }
}

impl Serialize for Decimal {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Decimal {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Repr {
            Text(String),
            Integer(i64),
            Float(f64),
        }

        match Repr::deserialize(deserializer)? {
            Repr::Text(text) => text.parse().map_err(serde::de::Error::custom),
            Repr::Integer(value) => Ok(Decimal::from(value)),
            Repr::Float(value) => Decimal::from_f64(value).map_err(serde::de::Error::custom),
        }
    }
}
