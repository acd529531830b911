//! Unit expression parser implementation using nom.
//!
//! Grammar (operators have equal precedence and associate to the left):
//!
//! ```text
//! term       := '/' component (op component)* | component (op component)*
//! op         := '.' | '/'
//! component  := '(' term ')' | annotation | factor [annotation] | symbol
//! factor     := '10*' [exponent] | '10^' [exponent] | digits
//! symbol     := atom [exponent] [annotation]
//! atom       := (plain-chars | '[' any-but-']' ']')+
//! exponent   := ['+' | '-'] digits
//! annotation := '{' printable-but-braces* '}'
//! ```
//!
//! Atoms are resolved while parsing: an exact unit code wins, otherwise the
//! longest prefix whose remainder is a metric unit.

use nom::{
    branch::alt,
    bytes::complete::take_while1,
    character::complete::{char, digit1, one_of},
    combinator::{all_consuming, opt, recognize},
    error::{ErrorKind, ParseError},
    multi::many1,
    sequence::pair,
    IResult,
};
use ucum_model::{Decimal, Prefix, TerminologyLookup, UnitRef, WORKING_PRECISION};

use crate::ast::{Component, Factor, Operator, Symbol, Term};
use crate::error::{ExprError, ExprResult};

/// Parses a unit expression against a terminology.
///
/// # Examples
///
/// ```rust
/// use ucum_expr::{parse, Component, Term};
/// use ucum_model::Terminology;
///
/// let terminology = Terminology::from_json_str(r#"{
///     "version": "test",
///     "prefixes": [{ "code": "k", "names": ["kilo"], "value": "1000" }],
///     "baseUnits": [
///         { "code": "g", "names": ["gram"], "property": "mass", "dimension": "M" },
///         { "code": "m", "names": ["meter"], "property": "length", "dimension": "L" }
///     ]
/// }"#).unwrap();
///
/// let term = parse(&terminology, "kg/m2").unwrap();
/// assert!(matches!(term, Term::Binary { .. }));
/// assert_eq!(term.to_string(), "kg/m2");
///
/// assert!(parse(&terminology, "kx").is_err());
/// ```
pub fn parse<'t>(lookup: &'t dyn TerminologyLookup, text: &str) -> ExprResult<Term<'t>> {
    ExpressionParser::new(lookup).parse(text)
}

/// Parser bound to one terminology.
#[derive(Clone, Copy)]
pub struct ExpressionParser<'t> {
    lookup: &'t dyn TerminologyLookup,
}

impl std::fmt::Debug for ExpressionParser<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExpressionParser").finish_non_exhaustive()
    }
}

// ============================================================================
// Parser errors
// ============================================================================

/// What went wrong, before it is placed in the original text.
#[derive(Debug, Clone, PartialEq)]
enum FailureKind {
    Nom(ErrorKind),
    Syntax(&'static str),
    UnknownUnit(String),
    PrefixNotAllowed { prefix: String, unit: String },
    UnterminatedBracket,
    UnterminatedAnnotation,
    InvalidAnnotation,
    DanglingOperator,
}

#[derive(Debug, Clone, PartialEq)]
struct Failure<'a> {
    input: &'a str,
    kind: FailureKind,
}

impl<'a> ParseError<&'a str> for Failure<'a> {
    fn from_error_kind(input: &'a str, kind: ErrorKind) -> Self {
        Failure {
            input,
            kind: FailureKind::Nom(kind),
        }
    }

    fn append(_input: &'a str, _kind: ErrorKind, other: Self) -> Self {
        other
    }
}

type PResult<'a, T> = IResult<&'a str, T, Failure<'a>>;

/// Unrecoverable error at `input`.
fn fail<'a, T>(input: &'a str, kind: FailureKind) -> PResult<'a, T> {
    Err(nom::Err::Failure(Failure { input, kind }))
}

impl Failure<'_> {
    fn into_expr_error(self, text: &str) -> ExprError {
        let position = text.len() - self.input.len();
        match self.kind {
            FailureKind::Nom(_) => ExprError::ParseError {
                position,
                message: format!("unexpected input at: '{}'", truncate(self.input, 20)),
            },
            FailureKind::Syntax(what) => ExprError::ParseError {
                position,
                message: format!("{} at: '{}'", what, truncate(self.input, 20)),
            },
            FailureKind::UnknownUnit(code) => ExprError::UnknownUnit { position, code },
            FailureKind::PrefixNotAllowed { prefix, unit } => ExprError::PrefixNotAllowed {
                position,
                prefix,
                unit,
            },
            FailureKind::UnterminatedBracket => ExprError::UnterminatedBracket { position },
            FailureKind::UnterminatedAnnotation => ExprError::UnterminatedAnnotation { position },
            FailureKind::InvalidAnnotation => ExprError::InvalidAnnotation { position },
            FailureKind::DanglingOperator => ExprError::DanglingOperator { position },
        }
    }
}

fn truncate(s: &str, max_len: usize) -> &str {
    match s.char_indices().nth(max_len) {
        Some((end, _)) => &s[..end],
        None => s,
    }
}

impl<'t> ExpressionParser<'t> {
    /// Creates a parser resolving atoms against `lookup`.
    pub fn new(lookup: &'t dyn TerminologyLookup) -> Self {
        Self { lookup }
    }

    /// Parses a complete unit expression.
    pub fn parse(&self, text: &str) -> ExprResult<Term<'t>> {
        if text.is_empty() {
            return Err(ExprError::EmptyExpression);
        }

        match all_consuming(|input| self.term(input))(text) {
            Ok((_, term)) => Ok(term),
            Err(nom::Err::Error(e)) | Err(nom::Err::Failure(e)) => Err(e.into_expr_error(text)),
            Err(nom::Err::Incomplete(_)) => Err(ExprError::ParseError {
                position: text.len(),
                message: "incomplete expression".to_string(),
            }),
        }
    }

    // ========================================================================
    // Terms
    // ========================================================================

    fn term<'a>(&self, input: &'a str) -> PResult<'a, Term<'t>> {
        // a leading '/' divides an implicit one
        let (mut input, mut term) = match char::<_, Failure>('/')(input) {
            Ok((rest, _)) => {
                let (rest, right) = self.operand(rest)?;
                let one = Term::Single(Component::Factor(Factor::unity()));
                (rest, Term::binary(one, Operator::Divide, right))
            }
            Err(_) => {
                let (rest, first) = self.bounded_component(input)?;
                (rest, Term::Single(first))
            }
        };

        loop {
            match operator(input) {
                Ok((rest, op)) => {
                    let (rest, right) = self.operand(rest)?;
                    term = Term::binary(term, op, right);
                    input = rest;
                }
                Err(nom::Err::Error(_)) => return Ok((input, term)),
                Err(e) => return Err(e),
            }
        }
    }

    /// A component required after an operator.
    fn operand<'a>(&self, input: &'a str) -> PResult<'a, Component<'t>> {
        match self.bounded_component(input) {
            Err(nom::Err::Error(_)) => fail(input, FailureKind::DanglingOperator),
            other => other,
        }
    }

    /// A component that must be followed by an operator, `)` or the end.
    fn bounded_component<'a>(&self, input: &'a str) -> PResult<'a, Component<'t>> {
        let (rest, component) = self.component(input)?;
        match rest.chars().next() {
            None | Some('.') | Some('/') | Some(')') => Ok((rest, component)),
            Some(_) if component.annotation().is_some() => {
                fail(rest, FailureKind::InvalidAnnotation)
            }
            Some(_) => fail(rest, FailureKind::Syntax("expected an operator")),
        }
    }

    // ========================================================================
    // Components
    // ========================================================================

    fn component<'a>(&self, input: &'a str) -> PResult<'a, Component<'t>> {
        if let Some(inner) = input.strip_prefix('(') {
            let (rest, term) = self.term(inner)?;
            return match rest.strip_prefix(')') {
                Some(rest) => Ok((rest, Component::Term(Box::new(term)))),
                None if rest.is_empty() => fail(input, FailureKind::UnterminatedBracket),
                None => fail(rest, FailureKind::Syntax("expected ')'")),
            };
        }

        if input.starts_with('{') {
            let (rest, text) = annotation(input)?;
            let factor = Factor {
                annotation: Some(text.to_string()),
                ..Factor::unity()
            };
            return Ok((rest, Component::Factor(factor)));
        }

        if input.starts_with(|c: char| c.is_ascii_digit()) {
            let (rest, mut factor) = factor(input)?;
            let (rest, text) = opt(annotation)(rest)?;
            factor.annotation = text.map(str::to_string);
            return Ok((rest, Component::Factor(factor)));
        }

        let (rest, symbol) = self.symbol(input)?;
        Ok((rest, Component::Symbol(symbol)))
    }

    fn symbol<'a>(&self, input: &'a str) -> PResult<'a, Symbol<'t>> {
        let (rest, code) = atom(input)?;
        let (prefix, unit) = match self.resolve(code) {
            Ok(resolved) => resolved,
            Err(kind) => return fail(input, kind),
        };
        let (rest, exponent) = opt(exponent)(rest)?;
        let (rest, text) = opt(annotation)(rest)?;

        Ok((
            rest,
            Symbol {
                prefix,
                unit,
                exponent: exponent.unwrap_or(1),
                annotation: text.map(str::to_string),
            },
        ))
    }

    /// Resolves an atom to an optional prefix and a unit.
    fn resolve(&self, code: &str) -> Result<(Option<&'t Prefix>, UnitRef<'t>), FailureKind> {
        let lookup: &'t dyn TerminologyLookup = self.lookup;
        if let Some(unit) = lookup.unit(code) {
            return Ok((None, unit));
        }

        let mut rejected = None;
        for prefix in lookup.prefixes() {
            let Some(remainder) = code.strip_prefix(prefix.code.as_str()) else {
                continue;
            };
            match lookup.unit(remainder) {
                Some(unit) if unit.is_metric() => return Ok((Some(prefix), unit)),
                Some(_) if rejected.is_none() => {
                    rejected = Some(FailureKind::PrefixNotAllowed {
                        prefix: prefix.code.clone(),
                        unit: remainder.to_string(),
                    });
                }
                _ => {}
            }
        }

        Err(rejected.unwrap_or_else(|| FailureKind::UnknownUnit(code.to_string())))
    }
}

// ============================================================================
// Tokens
// ============================================================================

fn operator(input: &str) -> PResult<'_, Operator> {
    let (rest, op) = one_of("./")(input)?;
    let op = if op == '.' {
        Operator::Multiply
    } else {
        Operator::Divide
    };
    Ok((rest, op))
}

fn factor(input: &str) -> PResult<'_, Factor> {
    let (rest, digits) = digit1(input)?;
    if digits == "10" {
        if let Ok((after, _)) = one_of::<_, _, Failure>("*^")(rest) {
            let (after, power) = opt(exponent)(after)?;
            return Ok((after, Factor::power_of_ten(power.unwrap_or(1))));
        }
    }
    let significant = digits.trim_start_matches('0').trim_end_matches('0');
    if significant.len() > WORKING_PRECISION as usize {
        return fail(input, FailureKind::Syntax("number has too many significant digits"));
    }
    match digits.parse::<Decimal>() {
        Ok(value) => Ok((rest, Factor::new(value))),
        Err(_) => fail(input, FailureKind::Syntax("invalid number")),
    }
}

fn exponent(input: &str) -> PResult<'_, i32> {
    let (rest, text) = recognize(pair(opt(one_of("+-")), digit1))(input)?;
    match text.parse::<i32>() {
        Ok(value) => Ok((rest, value)),
        Err(_) => fail(input, FailureKind::Syntax("exponent out of range")),
    }
}

/// Characters allowed in an atom outside square brackets.
fn is_symbol_char(c: char) -> bool {
    matches!(c, '!'..='~')
        && !c.is_ascii_digit()
        && !matches!(c, '.' | '/' | '(' | ')' | '{' | '}' | '[' | ']' | '+' | '-' | '*' | '^')
}

fn atom(input: &str) -> PResult<'_, &str> {
    recognize(many1(alt((bracketed, take_while1(is_symbol_char)))))(input)
}

fn bracketed(input: &str) -> PResult<'_, &str> {
    let (rest, _) = char('[')(input)?;
    match rest.find(']') {
        Some(end) => Ok((&rest[end + 1..], &input[..end + 2])),
        None => fail(input, FailureKind::UnterminatedBracket),
    }
}

/// Parses `{text}` and returns the text between the braces.
fn annotation(input: &str) -> PResult<'_, &str> {
    let (rest, _) = char('{')(input)?;
    let stop = rest.find(|c: char| c == '{' || c == '}' || !matches!(c, '!'..='~'));
    match stop {
        None => fail(input, FailureKind::UnterminatedAnnotation),
        Some(end) if rest[end..].starts_with('}') => Ok((&rest[end + 1..], &rest[..end])),
        Some(end) => fail(&rest[end..], FailureKind::InvalidAnnotation),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ucum_model::{Concept, Terminology};

    fn terminology() -> Terminology {
        Terminology::from_json_str(
            r#"{
                "version": "test",
                "prefixes": [
                    { "code": "k", "names": ["kilo"], "value": "1e3" },
                    { "code": "m", "names": ["milli"], "value": "1e-3" },
                    { "code": "u", "names": ["micro"], "value": "1e-6" },
                    { "code": "d", "names": ["deci"], "value": "1e-1" },
                    { "code": "da", "names": ["deka"], "value": "1e1" }
                ],
                "baseUnits": [
                    { "code": "m", "names": ["meter"], "property": "length", "dimension": "L" },
                    { "code": "s", "names": ["second"], "property": "time", "dimension": "T" },
                    { "code": "g", "names": ["gram"], "property": "mass", "dimension": "M" },
                    { "code": "rad", "names": ["radian"], "property": "plane angle", "dimension": "A" }
                ],
                "units": [
                    { "code": "l", "names": ["liter"], "property": "volume", "isMetric": true,
                      "value": { "unit": "dm3", "value": "1" } },
                    { "code": "mol", "names": ["mole"], "property": "amount of substance", "isMetric": true,
                      "value": { "unit": "10*23", "value": "6.0221367" } },
                    { "code": "min", "names": ["minute"], "property": "time",
                      "value": { "unit": "s", "value": "60" } },
                    { "code": "[in_i]", "names": ["inch"], "property": "length",
                      "value": { "unit": "cm", "value": "2.54" } },
                    { "code": "m[H2O]", "names": ["meter of water column"], "property": "pressure",
                      "isMetric": true, "value": { "unit": "kPa", "value": "9.80665" } },
                    { "code": "[pi]", "names": ["the number pi"], "property": "number",
                      "value": { "unit": "1", "value": "3.14159" } }
                ]
            }"#,
        )
        .unwrap()
    }

    fn symbol<'a, 't>(term: &'a Term<'t>) -> &'a Symbol<'t> {
        term.as_symbol().expect("expected a single symbol")
    }

    // ========================================================================
    // Symbols and prefixes
    // ========================================================================

    mod symbols {
        use super::*;

        #[test]
        fn test_base_unit() {
            let t = terminology();
            let term = parse(&t, "m").unwrap();
            let s = symbol(&term);
            assert!(s.prefix.is_none());
            assert_eq!(s.unit.code(), "m");
            assert_eq!(s.exponent, 1);
        }

        #[test]
        fn test_exact_code_wins_over_prefix() {
            let t = terminology();
            let term = parse(&t, "mol").unwrap();
            let s = symbol(&term);
            assert!(s.prefix.is_none());
            assert_eq!(s.unit.code(), "mol");

            let term = parse(&t, "min").unwrap();
            assert_eq!(symbol(&term).unit.code(), "min");
        }

        #[test]
        fn test_prefixed_unit() {
            let t = terminology();
            let term = parse(&t, "mmol").unwrap();
            let s = symbol(&term);
            assert_eq!(s.prefix.map(|p| p.code.as_str()), Some("m"));
            assert_eq!(s.unit.code(), "mol");
        }

        #[test]
        fn test_longest_prefix_first() {
            let t = terminology();
            let term = parse(&t, "dam").unwrap();
            let s = symbol(&term);
            assert_eq!(s.prefix.map(|p| p.code.as_str()), Some("da"));
            assert_eq!(s.unit.code(), "m");
        }

        #[test]
        fn test_bracketed_atom_with_digits() {
            let t = terminology();
            let term = parse(&t, "cm[H2O]").unwrap_err();
            assert!(matches!(term, ExprError::UnknownUnit { .. }));

            let term = parse(&t, "mm[H2O]").unwrap();
            let s = symbol(&term);
            assert_eq!(s.unit.code(), "m[H2O]");
            assert_eq!(s.prefix.map(|p| p.code.as_str()), Some("m"));
        }

        #[test]
        fn test_exponents() {
            let t = terminology();
            assert_eq!(symbol(&parse(&t, "m2").unwrap()).exponent, 2);
            assert_eq!(symbol(&parse(&t, "s-1").unwrap()).exponent, -1);
            assert_eq!(symbol(&parse(&t, "m+3").unwrap()).exponent, 3);
        }

        #[test]
        fn test_annotation_on_symbol() {
            let t = terminology();
            let term = parse(&t, "rad2{a}").unwrap();
            let s = symbol(&term);
            assert_eq!(s.exponent, 2);
            assert_eq!(s.annotation.as_deref(), Some("a"));
        }

        #[test]
        fn test_prefix_not_allowed() {
            let t = terminology();
            let err = parse(&t, "k[in_i]").unwrap_err();
            assert_eq!(
                err,
                ExprError::PrefixNotAllowed {
                    position: 0,
                    prefix: "k".to_string(),
                    unit: "[in_i]".to_string(),
                }
            );
        }

        #[test]
        fn test_unknown_unit_position() {
            let t = terminology();
            let err = parse(&t, "g/molv").unwrap_err();
            assert_eq!(
                err,
                ExprError::UnknownUnit {
                    position: 2,
                    code: "molv".to_string(),
                }
            );
        }
    }

    // ========================================================================
    // Factors
    // ========================================================================

    mod factors {
        use super::*;

        #[test]
        fn test_power_of_ten() {
            let t = terminology();
            for (text, exponent) in [("10*3", 3), ("10^3", 3), ("10*-7", -7), ("10*+3", 3), ("10*", 1)] {
                match parse(&t, text).unwrap() {
                    Term::Single(Component::Factor(f)) => {
                        assert_eq!(f.value, Decimal::TEN, "{text}");
                        assert_eq!(f.exponent, exponent, "{text}");
                    }
                    other => panic!("expected factor for {text}, got {other:?}"),
                }
            }
        }

        #[test]
        fn test_plain_integer() {
            let t = terminology();
            match parse(&t, "4").unwrap() {
                Term::Single(Component::Factor(f)) => {
                    assert_eq!(f.value, Decimal::from(4));
                    assert_eq!(f.exponent, 1);
                }
                other => panic!("expected factor, got {other:?}"),
            }
        }

        #[test]
        fn test_long_integer_rejected() {
            let t = terminology();
            let exact = format!("m.{}", "9".repeat(28));
            assert!(parse(&t, &exact).is_ok());
            assert!(parse(&t, &format!("1{}", "0".repeat(40))).is_ok());

            let long = format!("m.{}", "9".repeat(29));
            match parse(&t, &long).unwrap_err() {
                ExprError::ParseError { position, .. } => assert_eq!(position, 2),
                other => panic!("expected a parse error, got {other:?}"),
            }
        }

        #[test]
        fn test_annotation_only_is_unity() {
            let t = terminology();
            match parse(&t, "{e}").unwrap() {
                Term::Single(Component::Factor(f)) => {
                    assert!(f.is_unity());
                    assert_eq!(f.annotation.as_deref(), Some("e"));
                }
                other => panic!("expected factor, got {other:?}"),
            }
        }

        #[test]
        fn test_annotated_factor() {
            let t = terminology();
            let term = parse(&t, "10*3{rbc}").unwrap();
            match term {
                Term::Single(Component::Factor(f)) => {
                    assert_eq!(f.exponent, 3);
                    assert_eq!(f.annotation.as_deref(), Some("rbc"));
                }
                other => panic!("expected factor, got {other:?}"),
            }
        }
    }

    // ========================================================================
    // Operators and nesting
    // ========================================================================

    mod operators {
        use super::*;

        #[test]
        fn test_left_associative() {
            let t = terminology();
            let term = parse(&t, "s/m/g").unwrap();
            match term {
                Term::Binary { left, op, right } => {
                    assert_eq!(op, Operator::Divide);
                    assert!(matches!(right, Component::Symbol(ref s) if s.unit.code() == "g"));
                    assert!(matches!(*left, Term::Binary { op: Operator::Divide, .. }));
                }
                other => panic!("expected binary, got {other:?}"),
            }
        }

        #[test]
        fn test_leading_slash() {
            let t = terminology();
            match parse(&t, "/m").unwrap() {
                Term::Binary { left, op, right } => {
                    assert_eq!(op, Operator::Divide);
                    assert!(matches!(*left, Term::Single(Component::Factor(ref f)) if f.is_unity()));
                    assert!(matches!(right, Component::Symbol(_)));
                }
                other => panic!("expected binary, got {other:?}"),
            }
        }

        #[test]
        fn test_nested_term() {
            let t = terminology();
            let term = parse(&t, "g/(kg.min)").unwrap();
            match term {
                Term::Binary { right: Component::Term(inner), .. } => {
                    assert!(matches!(*inner, Term::Binary { op: Operator::Multiply, .. }));
                }
                other => panic!("expected nested term, got {other:?}"),
            }
        }

        #[test]
        fn test_leading_slash_inside_parentheses() {
            let t = terminology();
            assert!(parse(&t, "g.(/min)").is_ok());
        }

        #[test]
        fn test_single_symbol_through_parentheses() {
            let t = terminology();
            let term = parse(&t, "(m)").unwrap();
            assert_eq!(term.as_symbol().map(|s| s.unit.code()), Some("m"));
        }
    }

    // ========================================================================
    // Rejected input
    // ========================================================================

    mod errors {
        use super::*;

        #[test]
        fn test_empty_expression() {
            let t = terminology();
            assert_eq!(parse(&t, "").unwrap_err(), ExprError::EmptyExpression);
        }

        #[test]
        fn test_dangling_operator() {
            let t = terminology();
            assert_eq!(
                parse(&t, "m/").unwrap_err(),
                ExprError::DanglingOperator { position: 2 }
            );
            assert!(matches!(
                parse(&t, "m./s").unwrap_err(),
                ExprError::DanglingOperator { position: 2 }
            ));
        }

        #[test]
        fn test_unterminated_bracket() {
            let t = terminology();
            assert_eq!(
                parse(&t, "m[H2O").unwrap_err(),
                ExprError::UnterminatedBracket { position: 1 }
            );
            assert_eq!(
                parse(&t, "g/(m.s").unwrap_err(),
                ExprError::UnterminatedBracket { position: 2 }
            );
        }

        #[test]
        fn test_unterminated_annotation() {
            let t = terminology();
            assert_eq!(
                parse(&t, "g{abc").unwrap_err(),
                ExprError::UnterminatedAnnotation { position: 1 }
            );
        }

        #[test]
        fn test_annotation_must_end_component() {
            let t = terminology();
            for text in ["{a}rad2{b}", "{|}1", "g.m/{hb}m2"] {
                assert!(
                    matches!(parse(&t, text), Err(ExprError::InvalidAnnotation { .. })),
                    "{text}"
                );
            }
        }

        #[test]
        fn test_nested_brace_in_annotation() {
            let t = terminology();
            assert_eq!(
                parse(&t, "g{a{b}}").unwrap_err(),
                ExprError::InvalidAnnotation { position: 3 }
            );
        }

        #[test]
        fn test_factor_followed_by_unit() {
            let t = terminology();
            for text in ["g/12h", "10+3/ul", "ug(8.h)"] {
                assert!(
                    matches!(parse(&t, text), Err(ExprError::ParseError { .. })),
                    "{text}"
                );
            }
        }

        #[test]
        fn test_whitespace_rejected() {
            let t = terminology();
            assert!(parse(&t, "m s").is_err());
            assert!(parse(&t, " ").is_err());
        }
    }
}
